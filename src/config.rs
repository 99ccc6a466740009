use std::path::Path;

use crate::foundation::error::{StudioError, StudioResult};
use crate::imaging::chroma::ChromaKey;
use crate::imaging::grid::ContactSheetOpts;
use crate::media::analyser::AnalyserOpts;
use crate::media::sampler::SamplerOpts;
use crate::playback::engine::PlaybackOpts;
use crate::render::lipsync::LipSyncRenderOpts;
use crate::service::gemini::ServiceOpts;

/// All tunables of the studio, grouped per component.
///
/// Every section is optional in the JSON file and falls back to its defaults.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Contact sheet layout and JPEG quality.
    pub sheet: ContactSheetOpts,
    /// Background keying.
    pub chroma: ChromaKey,
    /// Still extraction.
    pub sampler: SamplerOpts,
    /// Lip-sync engine timing and thresholds.
    pub playback: PlaybackOpts,
    /// Speech spectrum analysis.
    pub analyser: AnalyserOpts,
    /// Offline render output.
    pub render: LipSyncRenderOpts,
    /// Generative service models and endpoint.
    pub service: ServiceOpts,
}

impl StudioConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(text: &str) -> StudioResult<Self> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|e| StudioError::serde(format!("invalid config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read a JSON config file.
    pub fn load(path: &Path) -> StudioResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StudioError::validation(format!("failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Check cross-field constraints the types cannot express.
    pub fn validate(&self) -> StudioResult<()> {
        self.playback.validate()?;
        if self.sheet.columns == 0 || self.sheet.cell_width == 0 {
            return Err(StudioError::validation(
                "sheet.columns and sheet.cell_width must be >= 1",
            ));
        }
        if self.sampler.frame_count == 0 {
            return Err(StudioError::validation("sampler.frame_count must be >= 1"));
        }
        if !self.analyser.fft_size.is_power_of_two() || self.analyser.fft_size < 32 {
            return Err(StudioError::validation(
                "analyser.fft_size must be a power of two >= 32",
            ));
        }
        if self.render.fps.num == 0 || self.render.fps.den == 0 {
            return Err(StudioError::validation("render.fps must be positive"));
        }
        let stage = &self.render.stage;
        if stage.width == 0 || stage.height == 0 {
            return Err(StudioError::validation("render.stage size must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
