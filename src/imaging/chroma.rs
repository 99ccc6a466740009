use image::RgbaImage;
use rayon::prelude::*;

use crate::assets::decode::{load_image, png_data_url};
use crate::foundation::core::{ImageRef, Rgb8};
use crate::foundation::error::StudioResult;
use crate::project::pack::{Character, CharacterAction};

/// Background keying parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ChromaKey {
    /// Maximum per-channel distance from `target` that is keyed out.
    pub tolerance: u8,
    /// Background color to remove.
    pub target: Rgb8,
}

impl Default for ChromaKey {
    fn default() -> Self {
        Self {
            tolerance: 20,
            target: Rgb8::WHITE,
        }
    }
}

impl ChromaKey {
    /// White keying with the given tolerance.
    pub fn white(tolerance: u8) -> Self {
        Self {
            tolerance,
            target: Rgb8::WHITE,
        }
    }

    /// `true` if an RGB triple is within tolerance of the target on every channel.
    #[inline]
    pub fn matches(&self, r: u8, g: u8, b: u8) -> bool {
        let t = self.tolerance;
        r.abs_diff(self.target.r) <= t
            && g.abs_diff(self.target.g) <= t
            && b.abs_diff(self.target.b) <= t
    }

    /// Zero the alpha of every matching pixel of a raw RGBA8 buffer in place.
    ///
    /// Color channels are never modified. Returns the number of keyed pixels.
    pub fn apply_rgba8(&self, rgba: &mut [u8]) -> usize {
        let mut keyed = 0;
        for px in rgba.chunks_exact_mut(4) {
            if self.matches(px[0], px[1], px[2]) {
                px[3] = 0;
                keyed += 1;
            }
        }
        keyed
    }
}

/// Return a copy of `src` with every pixel near `key.target` made fully transparent.
pub fn remove_color(src: &RgbaImage, key: &ChromaKey) -> RgbaImage {
    let mut out = src.clone();
    let keyed = key.apply_rgba8(&mut out);
    tracing::trace!(keyed, tolerance = key.tolerance, "keyed background");
    out
}

/// Decode a reference, key it, and re-encode as a PNG data URL.
pub fn remove_color_ref(src: &ImageRef, key: &ChromaKey) -> StudioResult<ImageRef> {
    let img = load_image(src)?;
    png_data_url(&remove_color(&img, key))
}

/// Key every frame of every action of `character`.
///
/// Frames are processed in parallel; the first failure aborts the whole batch and the input is
/// left as it was.
#[tracing::instrument(skip(character, key), fields(character = %character.name))]
pub fn key_character(character: &Character, key: &ChromaKey) -> StudioResult<Character> {
    let actions = character
        .actions
        .iter()
        .map(|action| {
            let frames = action
                .frames
                .par_iter()
                .map(|f| remove_color_ref(f, key))
                .collect::<StudioResult<Vec<_>>>()?;
            Ok(CharacterAction {
                name: action.name.clone(),
                frames,
            })
        })
        .collect::<StudioResult<Vec<_>>>()?;

    tracing::info!(actions = actions.len(), "removed character background");
    Ok(Character {
        actions,
        ..character.clone()
    })
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/chroma.rs"]
mod tests;
