use image::RgbaImage;
use image::imageops;

use crate::assets::decode::{load_image, png_data_url};
use crate::foundation::core::ImageRef;
use crate::foundation::error::{StudioError, StudioResult};

/// Integer translation applied to one frame.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameOffset {
    /// Horizontal shift in pixels, positive to the right.
    pub dx: i32,
    /// Vertical shift in pixels, positive downward.
    pub dy: i32,
}

impl FrameOffset {
    /// `true` when the offset leaves the frame where it is.
    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Per-frame alignment offsets, one per frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stabilizer {
    offsets: Vec<FrameOffset>,
}

impl Stabilizer {
    /// All-zero offsets for `frame_count` frames.
    pub fn new(frame_count: usize) -> Self {
        Self {
            offsets: vec![FrameOffset::default(); frame_count],
        }
    }

    /// Current offsets.
    pub fn offsets(&self) -> &[FrameOffset] {
        &self.offsets
    }

    /// Shift frame `index` by `(dx, dy)` on top of its current offset.
    pub fn nudge(&mut self, index: usize, dx: i32, dy: i32) -> StudioResult<FrameOffset> {
        let len = self.offsets.len();
        let off = self
            .offsets
            .get_mut(index)
            .ok_or_else(|| StudioError::validation(format!("frame {index} out of range 0..{len}")))?;
        off.dx += dx;
        off.dy += dy;
        Ok(*off)
    }

    /// Reset every offset to zero.
    pub fn reset(&mut self) {
        self.offsets.fill(FrameOffset::default());
    }

    /// Apply the offsets to decoded frames.
    pub fn apply(&self, frames: &[RgbaImage]) -> StudioResult<Vec<RgbaImage>> {
        apply_offsets(frames, &self.offsets)
    }

    /// Apply the offsets to frame references; zero-offset frames are returned as-is.
    pub fn apply_refs(&self, frames: &[ImageRef]) -> StudioResult<Vec<ImageRef>> {
        check_len(frames.len(), self.offsets.len())?;
        frames
            .iter()
            .zip(&self.offsets)
            .map(|(f, off)| {
                if off.is_zero() {
                    Ok(f.clone())
                } else {
                    png_data_url(&shift(&load_image(f)?, *off))
                }
            })
            .collect()
    }
}

/// Redraw each frame translated by its offset onto a transparent canvas of the same size.
pub fn apply_offsets(frames: &[RgbaImage], offsets: &[FrameOffset]) -> StudioResult<Vec<RgbaImage>> {
    check_len(frames.len(), offsets.len())?;
    Ok(frames
        .iter()
        .zip(offsets)
        .map(|(f, off)| if off.is_zero() { f.clone() } else { shift(f, *off) })
        .collect())
}

fn shift(src: &RgbaImage, off: FrameOffset) -> RgbaImage {
    let mut out = RgbaImage::new(src.width(), src.height());
    imageops::overlay(&mut out, src, i64::from(off.dx), i64::from(off.dy));
    out
}

fn check_len(frames: usize, offsets: usize) -> StudioResult<()> {
    if frames != offsets {
        return Err(StudioError::validation(format!(
            "{frames} frames but {offsets} offsets"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/stabilize.rs"]
mod tests;
