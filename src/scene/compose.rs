use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::foundation::core::Rgb8;
use crate::foundation::error::{StudioError, StudioResult};
use crate::project::pack::SceneConfig;

/// Stage geometry for composed output.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SceneRenderOpts {
    /// Stage width in pixels.
    pub width: u32,
    /// Stage height in pixels.
    pub height: u32,
    /// Stage fill behind the background image.
    pub backdrop: Rgb8,
    /// Character frames are fit into this height before `char_scale` applies.
    pub character_max_height: u32,
}

impl Default for SceneRenderOpts {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            backdrop: Rgb8::new(0x02, 0x06, 0x17),
            character_max_height: 300,
        }
    }
}

/// Largest layer size accepted by [`compose_stage`], as a multiple of the stage size.
pub const MAX_LAYER_STAGE_MULTIPLE: u32 = 8;

/// Layer placement on the stage, in stage pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Left edge; may be negative or past the stage.
    pub x: i64,
    /// Top edge; may be negative or past the stage.
    pub y: i64,
    /// Scaled layer width.
    pub width: u32,
    /// Scaled layer height.
    pub height: u32,
}

impl SceneRenderOpts {
    /// Background placement: cover the stage, scale by `bg_scale` about the center, then offset
    /// by `bg_position`.
    pub fn background_placement(&self, scene: &SceneConfig, w: u32, h: u32) -> Option<Placement> {
        if w == 0 || h == 0 {
            return None;
        }
        let cover = (f64::from(self.width) / f64::from(w)).max(f64::from(self.height) / f64::from(h));
        let s = cover * scene.bg_scale;
        self.centered(w, h, s, scene.bg_position.x, scene.bg_position.y)
    }

    /// Character placement: fit into `character_max_height` (never enlarged), scale by
    /// `char_scale`, center on the stage, then offset by `char_position`.
    pub fn character_placement(&self, scene: &SceneConfig, w: u32, h: u32) -> Option<Placement> {
        if w == 0 || h == 0 {
            return None;
        }
        let fit = (f64::from(self.character_max_height) / f64::from(h)).min(1.0);
        let s = fit * scene.char_scale;
        self.centered(w, h, s, scene.char_position.x, scene.char_position.y)
    }

    fn check_layer(&self, p: Placement, layer: &str) -> StudioResult<Placement> {
        let max_w = u64::from(self.width) * u64::from(MAX_LAYER_STAGE_MULTIPLE);
        let max_h = u64::from(self.height) * u64::from(MAX_LAYER_STAGE_MULTIPLE);
        if u64::from(p.width) > max_w || u64::from(p.height) > max_h {
            return Err(StudioError::validation(format!(
                "{layer} scaled to {}x{} exceeds {MAX_LAYER_STAGE_MULTIPLE}x the {}x{} stage",
                p.width, p.height, self.width, self.height
            )));
        }
        Ok(p)
    }

    fn centered(&self, w: u32, h: u32, s: f64, dx: f64, dy: f64) -> Option<Placement> {
        if !(s.is_finite() && s > 0.0) {
            return None;
        }
        let width = (f64::from(w) * s).round().max(1.0);
        let height = (f64::from(h) * s).round().max(1.0);
        let cx = f64::from(self.width) / 2.0 + dx;
        let cy = f64::from(self.height) / 2.0 + dy;
        Some(Placement {
            x: (cx - width / 2.0).round() as i64,
            y: (cy - height / 2.0).round() as i64,
            width: width as u32,
            height: height as u32,
        })
    }
}

/// Compose one stage frame: backdrop, optional background image, optional character frame.
///
/// A layer scaled past [`MAX_LAYER_STAGE_MULTIPLE`] times the stage is a validation error.
pub fn compose_stage(
    opts: &SceneRenderOpts,
    scene: &SceneConfig,
    background: Option<&RgbaImage>,
    character: Option<&RgbaImage>,
) -> StudioResult<RgbaImage> {
    if opts.width == 0 || opts.height == 0 {
        return Err(StudioError::validation("stage size must be non-zero"));
    }
    let mut stage = RgbaImage::from_pixel(opts.width, opts.height, image::Rgba(opts.backdrop.opaque()));

    if let Some(bg) = background
        && let Some(p) = opts.background_placement(scene, bg.width(), bg.height())
    {
        let p = opts.check_layer(p, "background")?;
        draw_layer(&mut stage, bg, p);
    }
    if let Some(ch) = character
        && let Some(p) = opts.character_placement(scene, ch.width(), ch.height())
    {
        let p = opts.check_layer(p, "character")?;
        draw_layer(&mut stage, ch, p);
    }
    Ok(stage)
}

fn draw_layer(stage: &mut RgbaImage, src: &RgbaImage, p: Placement) {
    if (p.width, p.height) == src.dimensions() {
        imageops::overlay(stage, src, p.x, p.y);
    } else {
        let scaled = imageops::resize(src, p.width, p.height, FilterType::Triangle);
        imageops::overlay(stage, &scaled, p.x, p.y);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/compose.rs"]
mod tests;
