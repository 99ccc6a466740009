use super::*;

fn gradient(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

#[test]
fn slice_yields_rows_times_cols_in_row_major_order() {
    let src = gradient(90, 60);
    let cells = slice_grid(&src, 2, 3).unwrap();
    assert_eq!(cells.len(), 6);
    for c in &cells {
        assert_eq!(c.dimensions(), (30, 30));
    }
    // Cell 4 is row 1, col 1.
    assert_eq!(cells[4].get_pixel(0, 0), src.get_pixel(30, 30));
    assert_eq!(cells[2].get_pixel(5, 7), src.get_pixel(65, 7));
}

#[test]
fn divisible_sizes_reassemble_byte_for_byte() {
    let src = gradient(96, 64);
    let cells = slice_grid(&src, 4, 3).unwrap();
    let back = reassemble_grid(&cells, 3).unwrap();
    assert_eq!(back.dimensions(), src.dimensions());
    assert_eq!(back.as_raw(), src.as_raw());
}

#[test]
fn non_divisible_sizes_truncate_by_under_one_pixel_per_cell() {
    let src = gradient(100, 50);
    let cells = slice_grid(&src, 3, 3).unwrap();
    assert_eq!(cells.len(), 9);
    for c in &cells {
        assert_eq!(c.dimensions(), (33, 16));
    }
    let back = reassemble_grid(&cells, 3).unwrap();
    assert_eq!(back.dimensions(), (99, 48));

    // Column 2 starts at round(2 * 100 / 3) = 67, row 1 at round(50 / 3) = 17.
    let geom = GridGeometry::new(100, 50, 3, 3).unwrap();
    assert_eq!(geom.cell_origin(1, 2), (67, 17));
    assert_eq!(cells[5].get_pixel(0, 0), src.get_pixel(67, 17));
}

#[test]
fn single_cell_grid_is_identity() {
    let src = gradient(17, 9);
    let cells = slice_grid(&src, 1, 1).unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].as_raw(), src.as_raw());
}

#[test]
fn degenerate_grids_are_rejected() {
    let src = gradient(4, 4);
    assert!(matches!(
        slice_grid(&src, 0, 2),
        Err(StudioError::Validation(_))
    ));
    assert!(matches!(
        slice_grid(&src, 2, 0),
        Err(StudioError::Validation(_))
    ));
}

#[test]
fn grid_finer_than_source_yields_empty_cells() {
    let cells = slice_grid(&RgbaImage::new(2, 2), 3, 3).unwrap();
    assert_eq!(cells.len(), 9);
    assert!(cells.iter().all(|c| c.dimensions() == (0, 0)));

    let cells = slice_grid(&gradient(4, 4), 5, 1).unwrap();
    assert_eq!(cells.len(), 5);
    assert!(cells.iter().all(|c| c.dimensions() == (4, 0)));
}

#[test]
fn corrupt_reference_is_a_decode_error() {
    let bad = ImageRef::new("data:image/png;base64,AAAA");
    assert!(matches!(
        slice_image_ref(&bad, 3, 3),
        Err(StudioError::Decode(_))
    ));
}

#[test]
fn slice_image_ref_returns_png_data_urls() {
    let src = png_data_url(&gradient(30, 30)).unwrap();
    let cells = slice_image_ref(&src, 3, 3).unwrap();
    assert_eq!(cells.len(), 9);
    assert!(cells.iter().all(|c| c.as_str().starts_with("data:image/png;base64,")));
    let first = load_image(&cells[0]).unwrap();
    assert_eq!(first.dimensions(), (10, 10));
}

#[test]
fn reassemble_rejects_mixed_cell_sizes() {
    let cells = vec![gradient(4, 4), gradient(5, 4)];
    assert!(reassemble_grid(&cells, 2).is_err());
    assert!(reassemble_grid(&[], 2).is_err());
}

#[test]
fn contact_sheet_layout_follows_first_image() {
    let images: Vec<_> = (0..7).map(|_| gradient(160, 90)).collect();
    let sheet = compose_contact_sheet(&images, &ContactSheetOpts::default()).unwrap();

    assert_eq!(sheet.cell_width, 320);
    assert_eq!(sheet.cell_height, 180);
    assert_eq!(sheet.columns, 5);
    assert_eq!(sheet.rows, 2);
    assert_eq!(sheet.image.dimensions(), (1600, 360));
    assert_eq!(sheet.cells.len(), 7);
    for (i, cell) in sheet.cells.iter().enumerate() {
        assert_eq!(cell.index, i);
        assert_eq!(cell.label, format!("#{i}"));
    }
    assert_eq!((sheet.cells[6].x, sheet.cells[6].y), (320, 180));
}

#[test]
fn contact_sheet_paints_background_border_and_image() {
    let images = vec![RgbaImage::from_pixel(100, 50, image::Rgba([200, 10, 10, 255]))];
    let opts = ContactSheetOpts {
        columns: 2,
        ..ContactSheetOpts::default()
    };
    let sheet = compose_contact_sheet(&images, &opts).unwrap();
    assert_eq!(sheet.cell_height, 160);

    // Second column is empty background.
    assert_eq!(sheet.image.get_pixel(480, 80).0, [0x0f, 0x17, 0x2a, 255]);
    // Border on the first cell's edge.
    assert_eq!(sheet.image.get_pixel(319, 80).0, [0x33, 0x41, 0x55, 255]);
    // Interior shows the resized input.
    assert_eq!(sheet.image.get_pixel(200, 120).0, [200, 10, 10, 255]);
}

#[test]
fn contact_sheet_index_lookup_maps_positions_to_inputs() {
    let images: Vec<_> = (0..3).map(|_| gradient(64, 64)).collect();
    let opts = ContactSheetOpts {
        columns: 2,
        cell_width: 64,
        ..ContactSheetOpts::default()
    };
    let sheet = compose_contact_sheet(&images, &opts).unwrap();
    assert_eq!(sheet.index_at(10, 10), Some(0));
    assert_eq!(sheet.index_at(70, 10), Some(1));
    assert_eq!(sheet.index_at(10, 70), Some(2));
    assert_eq!(sheet.index_at(70, 70), None);
    assert_eq!(sheet.index_at(500, 0), None);
}

#[test]
fn contact_sheet_requires_input_and_encodes_jpeg() {
    assert!(matches!(
        compose_contact_sheet(&[], &ContactSheetOpts::default()),
        Err(StudioError::Validation(_))
    ));

    let sheet = compose_contact_sheet(&[gradient(40, 40)], &ContactSheetOpts::default()).unwrap();
    let jpeg = sheet.to_jpeg(85).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
}
