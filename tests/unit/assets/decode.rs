use super::*;

fn checker(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([100, 50, 200, 128])
        } else {
            image::Rgba([0, 0, 0, 255])
        }
    })
}

#[test]
fn png_roundtrip_preserves_straight_alpha() {
    let img = checker(3, 2);
    let bytes = encode_png(&img).unwrap();
    let back = decode_image(&bytes).unwrap();
    assert_eq!(back.dimensions(), (3, 2));
    assert_eq!(back.as_raw(), img.as_raw());
}

#[test]
fn load_image_resolves_data_urls() {
    let img = checker(2, 2);
    let r = png_data_url(&img).unwrap();
    assert!(r.is_data_url());
    assert_eq!(load_image(&r).unwrap().as_raw(), img.as_raw());
}

#[test]
fn corrupt_payloads_are_decode_errors() {
    assert!(matches!(
        decode_image(b"definitely not an image"),
        Err(StudioError::Decode(_))
    ));
    let bogus = ImageRef::new(crate::assets::data_url::encode_data_url("image/png", b"xx"));
    assert!(matches!(load_image(&bogus), Err(StudioError::Decode(_))));
    assert!(matches!(
        load_image(&ImageRef::new("https://example.com/a.png")),
        Err(StudioError::Decode(_))
    ));
    assert!(matches!(
        load_image(&ImageRef::new("target/does/not/exist.png")),
        Err(StudioError::Decode(_))
    ));
}

#[test]
fn jpeg_encoding_drops_alpha() {
    let img = checker(8, 8);
    let bytes = encode_jpeg(&img, 85).unwrap();
    let back = decode_image(&bytes).unwrap();
    assert_eq!(back.dimensions(), (8, 8));
    assert!(back.pixels().all(|p| p.0[3] == 255));
}
