use std::sync::{Arc, OnceLock};

use image::RgbaImage;

use crate::foundation::core::Rgb8;
use crate::foundation::error::{StudioError, StudioResult};
use crate::foundation::math::premul_over_opaque;

/// Visual parameters of a contact-sheet index badge.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BadgeStyle {
    /// Badge box width in pixels.
    pub width: u32,
    /// Badge box height in pixels.
    pub height: u32,
    /// Box fill, straight RGBA8.
    pub fill: [u8; 4],
    /// Label color.
    pub text: Rgb8,
    /// Label font size in pixels.
    pub font_size: f32,
    /// Label left inset inside the box.
    pub text_x: f32,
    /// Label top inset inside the box.
    pub text_y: f32,
}

impl Default for BadgeStyle {
    fn default() -> Self {
        Self {
            width: 70,
            height: 35,
            fill: [0, 0, 0, 179],
            text: Rgb8::new(0xfa, 0xcc, 0x15),
            font_size: 24.0,
            text_x: 8.0,
            text_y: 6.0,
        }
    }
}

/// Label drawn on the badge of the cell holding input `index`.
pub fn badge_label(index: usize) -> String {
    format!("#{index}")
}

/// Rasterizes index badges through `usvg`/`resvg` and blends them onto opaque canvases.
pub(crate) struct BadgePainter {
    style: BadgeStyle,
    opts: usvg::Options<'static>,
}

impl BadgePainter {
    pub(crate) fn new(style: BadgeStyle) -> Self {
        let opts = usvg::Options {
            fontdb: shared_fontdb(),
            ..Default::default()
        };
        Self { style, opts }
    }

    /// Render the badge into a premultiplied RGBA8 buffer of `style.width x style.height`.
    pub(crate) fn render(&self, label: &str) -> StudioResult<Vec<u8>> {
        let svg = badge_svg(&self.style, label);
        let tree = usvg::Tree::from_str(&svg, &self.opts)
            .map_err(|e| StudioError::validation(format!("badge svg rejected: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(self.style.width, self.style.height)
            .ok_or_else(|| StudioError::validation("badge size must be non-zero"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );
        Ok(pixmap.data().to_vec())
    }

    /// Paint the badge with its top-left corner at `(x, y)`, clipped to the canvas.
    pub(crate) fn paint(
        &self,
        canvas: &mut RgbaImage,
        x: u32,
        y: u32,
        label: &str,
    ) -> StudioResult<()> {
        let premul = self.render(label)?;
        let bw = self.style.width;
        for by in 0..self.style.height {
            for bx in 0..bw {
                let (cx, cy) = (x + bx, y + by);
                if cx >= canvas.width() || cy >= canvas.height() {
                    continue;
                }
                let i = ((by * bw + bx) * 4) as usize;
                let src = [premul[i], premul[i + 1], premul[i + 2], premul[i + 3]];
                let dst = canvas.get_pixel_mut(cx, cy);
                dst.0 = premul_over_opaque(dst.0, src);
            }
        }
        Ok(())
    }
}

fn badge_svg(style: &BadgeStyle, label: &str) -> String {
    let [r, g, b, a] = style.fill;
    let fill_opacity = f32::from(a) / 255.0;
    // SVG positions text by baseline; approximate a top baseline from the font size.
    let baseline = style.text_y + style.font_size * 0.8;
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}">"#,
            r#"<rect width="{w}" height="{h}" fill="rgb({r},{g},{b})" fill-opacity="{fo:.3}"/>"#,
            r#"<text x="{tx}" y="{ty}" font-family="Arial, Helvetica, sans-serif" "#,
            r#"font-weight="bold" font-size="{fs}" fill="rgb({lr},{lg},{lb})">{label}</text>"#,
            r#"</svg>"#
        ),
        w = style.width,
        h = style.height,
        r = r,
        g = g,
        b = b,
        fo = fill_opacity,
        tx = style.text_x,
        ty = baseline,
        fs = style.font_size,
        lr = style.text.r,
        lg = style.text.g,
        lb = style.text.b,
        label = xml_escape(label),
    )
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn shared_fontdb() -> Arc<usvg::fontdb::Database> {
    static FONTDB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTDB
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system fonts for badges");
            Arc::new(db)
        })
        .clone()
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/badge.rs"]
mod tests;
