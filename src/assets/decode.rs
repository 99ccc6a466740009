use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use image::{ImageEncoder as _, RgbaImage};

use crate::assets::data_url::{encode_data_url, parse_data_url};
use crate::foundation::core::ImageRef;
use crate::foundation::error::{StudioError, StudioResult};

/// Decode encoded image bytes (PNG, JPEG, ...) into straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8]) -> StudioResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| StudioError::decode(format!("failed to decode image: {e}")))?;
    Ok(dyn_img.to_rgba8())
}

/// Resolve an [`ImageRef`] and decode it.
///
/// Data URLs are decoded inline and anything else is treated as a filesystem path. Remote URLs
/// must be fetched by the caller first.
pub fn load_image(r: &ImageRef) -> StudioResult<RgbaImage> {
    if r.is_data_url() {
        let data = parse_data_url(r.as_str())?;
        return decode_image(&data.bytes);
    }
    if r.is_remote() {
        return Err(StudioError::decode(format!(
            "remote image '{r}' must be downloaded before decoding"
        )));
    }
    load_image_file(Path::new(r.as_str()))
}

/// Read and decode an image file.
pub fn load_image_file(path: &Path) -> StudioResult<RgbaImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| StudioError::decode(format!("failed to read '{}': {e}", path.display())))?;
    decode_image(&bytes)
}

/// Encode RGBA8 pixels as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> StudioResult<Vec<u8>> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(Cursor::new(&mut buf))
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .context("encode png")?;
    Ok(buf)
}

/// Encode RGBA8 pixels as JPEG bytes, dropping alpha.
pub fn encode_jpeg(img: &RgbaImage, quality: u8) -> StudioResult<Vec<u8>> {
    let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality.clamp(1, 100))
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .context("encode jpeg")?;
    Ok(buf)
}

/// Encode as a PNG data URL reference.
pub fn png_data_url(img: &RgbaImage) -> StudioResult<ImageRef> {
    Ok(ImageRef::new(encode_data_url("image/png", &encode_png(img)?)))
}

/// Write RGBA8 pixels to `path`; the format follows the file extension.
pub fn save_image(img: &RgbaImage, path: &Path) -> StudioResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
    let bytes = if is_jpeg {
        encode_jpeg(img, 90)?
    } else {
        encode_png(img)?
    };
    std::fs::write(path, bytes).with_context(|| format!("write image '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
