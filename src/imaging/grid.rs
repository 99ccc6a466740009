//! Grid slicing of sprite sheets and contact-sheet composition.
//!
//! Slicing partitions a source into `rows * cols` equally sized cells in row-major order. Cell
//! size is the truncated quotient of the source size; each cell is copied from the nearest
//! integer offset of its fractional origin, so non-divisible sources lose up to one pixel of
//! coverage per cell rather than accumulating seam drift.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::assets::decode::{encode_jpeg, load_image, png_data_url};
use crate::foundation::core::{ImageRef, Rgb8};
use crate::foundation::error::{StudioError, StudioResult};
use crate::foundation::math::over_opaque;
use crate::imaging::badge::{BadgePainter, BadgeStyle, badge_label};

/// Per-cell geometry of an `rows x cols` slice over a `width x height` source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridGeometry {
    /// Number of rows.
    pub rows: u32,
    /// Number of columns.
    pub cols: u32,
    /// Output cell width (`floor(width / cols)`).
    pub cell_width: u32,
    /// Output cell height (`floor(height / rows)`).
    pub cell_height: u32,
    src_width: u32,
    src_height: u32,
}

impl GridGeometry {
    /// Validate and compute the geometry.
    ///
    /// A grid finer than the source yields zero-sized cells rather than an error.
    pub fn new(width: u32, height: u32, rows: u32, cols: u32) -> StudioResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(StudioError::validation("grid rows and cols must be >= 1"));
        }
        Ok(Self {
            rows,
            cols,
            cell_width: width / cols,
            cell_height: height / rows,
            src_width: width,
            src_height: height,
        })
    }

    /// Source pixel origin of cell `(row, col)`.
    pub fn cell_origin(&self, row: u32, col: u32) -> (u32, u32) {
        let fx = f64::from(self.src_width) / f64::from(self.cols);
        let fy = f64::from(self.src_height) / f64::from(self.rows);
        let x = (f64::from(col) * fx).round() as u32;
        let y = (f64::from(row) * fy).round() as u32;
        (
            x.min(self.src_width - self.cell_width),
            y.min(self.src_height - self.cell_height),
        )
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        (self.rows as usize) * (self.cols as usize)
    }

    /// Always `false`; a validated grid has at least one cell.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Slice `src` into `rows * cols` cells in row-major order.
#[tracing::instrument(skip(src), fields(width = src.width(), height = src.height()))]
pub fn slice_grid(src: &RgbaImage, rows: u32, cols: u32) -> StudioResult<Vec<RgbaImage>> {
    let geom = GridGeometry::new(src.width(), src.height(), rows, cols)?;
    let mut cells = Vec::with_capacity(geom.len());
    for row in 0..rows {
        for col in 0..cols {
            let (x, y) = geom.cell_origin(row, col);
            cells.push(imageops::crop_imm(src, x, y, geom.cell_width, geom.cell_height).to_image());
        }
    }
    tracing::debug!(
        cells = cells.len(),
        cell_width = geom.cell_width,
        cell_height = geom.cell_height,
        "sliced grid"
    );
    Ok(cells)
}

/// Decode `src`, slice it, and re-encode each cell as a PNG data URL.
pub fn slice_image_ref(src: &ImageRef, rows: u32, cols: u32) -> StudioResult<Vec<ImageRef>> {
    let img = load_image(src)?;
    slice_grid(&img, rows, cols)?
        .iter()
        .map(png_data_url)
        .collect()
}

/// Place equally sized cells back into a grid with `cols` columns, row-major.
pub fn reassemble_grid(cells: &[RgbaImage], cols: u32) -> StudioResult<RgbaImage> {
    let first = cells
        .first()
        .ok_or_else(|| StudioError::validation("cannot reassemble an empty grid"))?;
    if cols == 0 {
        return Err(StudioError::validation("grid cols must be >= 1"));
    }
    let (cw, ch) = first.dimensions();
    if cells.iter().any(|c| c.dimensions() != (cw, ch)) {
        return Err(StudioError::validation("grid cells must share one size"));
    }

    let rows = cells.len().div_ceil(cols as usize) as u32;
    let mut out = RgbaImage::new(cw * cols, ch * rows);
    for (i, cell) in cells.iter().enumerate() {
        let col = (i as u32) % cols;
        let row = (i as u32) / cols;
        imageops::replace(&mut out, cell, i64::from(col * cw), i64::from(row * ch));
    }
    Ok(out)
}

/// Layout and styling of a contact sheet.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ContactSheetOpts {
    /// Cells per row.
    pub columns: u32,
    /// Canonical cell width; the cell height follows the first input's aspect ratio.
    pub cell_width: u32,
    /// Sheet background.
    pub background: Rgb8,
    /// Cell border color (1 px).
    pub border: Rgb8,
    /// Index badge styling.
    pub badge: BadgeStyle,
    /// JPEG quality used when the sheet is encoded for transport.
    pub jpeg_quality: u8,
}

impl Default for ContactSheetOpts {
    fn default() -> Self {
        Self {
            columns: 5,
            cell_width: 320,
            background: Rgb8::new(0x0f, 0x17, 0x2a),
            border: Rgb8::new(0x33, 0x41, 0x55),
            badge: BadgeStyle::default(),
            jpeg_quality: 85,
        }
    }
}

/// Placement of one input on a contact sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetCell {
    /// Input position; equals the number printed on the badge.
    pub index: usize,
    /// Left edge in sheet pixels.
    pub x: u32,
    /// Top edge in sheet pixels.
    pub y: u32,
    /// Badge label text.
    pub label: String,
}

/// A composed contact sheet.
#[derive(Clone, Debug)]
pub struct ContactSheet {
    /// Opaque RGBA8 sheet pixels.
    pub image: RgbaImage,
    /// Cells per row.
    pub columns: u32,
    /// Number of rows (`ceil(count / columns)`).
    pub rows: u32,
    /// Cell width in pixels.
    pub cell_width: u32,
    /// Cell height in pixels.
    pub cell_height: u32,
    /// One entry per input, in input order.
    pub cells: Vec<SheetCell>,
}

impl ContactSheet {
    /// Input index of the cell covering sheet pixel `(x, y)`, if any.
    pub fn index_at(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.image.width() || y >= self.image.height() {
            return None;
        }
        let i = (y / self.cell_height) as usize * self.columns as usize
            + (x / self.cell_width) as usize;
        (i < self.cells.len()).then_some(i)
    }

    /// Encode the sheet as JPEG bytes.
    pub fn to_jpeg(&self, quality: u8) -> StudioResult<Vec<u8>> {
        encode_jpeg(&self.image, quality)
    }
}

/// Tile `images` row-major into one sheet with an index badge and border on every cell.
///
/// Every input is forced to the single cell size derived from the first image.
#[tracing::instrument(skip(images, opts), fields(count = images.len()))]
pub fn compose_contact_sheet(
    images: &[RgbaImage],
    opts: &ContactSheetOpts,
) -> StudioResult<ContactSheet> {
    let sample = images
        .first()
        .ok_or_else(|| StudioError::validation("contact sheet needs at least one image"))?;
    if opts.columns == 0 || opts.cell_width == 0 {
        return Err(StudioError::validation(
            "contact sheet columns and cell width must be >= 1",
        ));
    }
    if sample.width() == 0 || sample.height() == 0 {
        return Err(StudioError::decode("first contact sheet image is empty"));
    }

    let cell_width = opts.cell_width;
    let scale = f64::from(cell_width) / f64::from(sample.width());
    let cell_height = ((f64::from(sample.height()) * scale).floor() as u32).max(1);
    let columns = opts.columns;
    let rows = images.len().div_ceil(columns as usize) as u32;

    let mut sheet = RgbaImage::from_pixel(
        cell_width * columns,
        cell_height * rows,
        image::Rgba(opts.background.opaque()),
    );
    let painter = BadgePainter::new(opts.badge.clone());
    let mut cells = Vec::with_capacity(images.len());

    for (i, img) in images.iter().enumerate() {
        let x = (i as u32 % columns) * cell_width;
        let y = (i as u32 / columns) * cell_height;

        let resized = imageops::resize(img, cell_width, cell_height, FilterType::Triangle);
        for (px, py, p) in resized.enumerate_pixels() {
            let dst = sheet.get_pixel_mut(x + px, y + py);
            dst.0 = over_opaque(dst.0, p.0);
        }

        let label = badge_label(i);
        painter.paint(&mut sheet, x, y, &label)?;
        stroke_cell(&mut sheet, x, y, cell_width, cell_height, opts.border);

        cells.push(SheetCell { index: i, x, y, label });
    }

    Ok(ContactSheet {
        image: sheet,
        columns,
        rows,
        cell_width,
        cell_height,
        cells,
    })
}

/// Decode every reference in order and compose a contact sheet.
pub fn compose_contact_sheet_refs(
    refs: &[ImageRef],
    opts: &ContactSheetOpts,
) -> StudioResult<ContactSheet> {
    let images = refs
        .iter()
        .map(load_image)
        .collect::<StudioResult<Vec<_>>>()?;
    compose_contact_sheet(&images, opts)
}

fn stroke_cell(sheet: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgb8) {
    let px = image::Rgba(color.opaque());
    let (right, bottom) = (x + w - 1, y + h - 1);
    for cx in x..=right {
        sheet.put_pixel(cx, y, px);
        sheet.put_pixel(cx, bottom, px);
    }
    for cy in y..=bottom {
        sheet.put_pixel(x, cy, px);
        sheet.put_pixel(right, cy, px);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/grid.rs"]
mod tests;
