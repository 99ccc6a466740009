use image::RgbaImage;

use crate::foundation::error::{StudioError, StudioResult};
use crate::media::video::VideoSurface;

/// Frame sampling defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SamplerOpts {
    /// Number of stills extracted per video (the segment's density).
    pub frame_count: u32,
}

impl Default for SamplerOpts {
    fn default() -> Self {
        Self { frame_count: 60 }
    }
}

/// Seek times for `frame_count` evenly spaced stills over `duration_sec`.
///
/// Time `i` is `i * duration / frame_count`; the last still sits one interval before the end.
pub fn sample_times(duration_sec: f64, frame_count: u32) -> StudioResult<Vec<f64>> {
    if frame_count == 0 {
        return Err(StudioError::validation("frame count must be >= 1"));
    }
    if !duration_sec.is_finite() || duration_sec <= 0.0 {
        return Err(StudioError::decode(format!(
            "video duration {duration_sec} is unusable"
        )));
    }
    let interval = duration_sec / f64::from(frame_count);
    Ok((0..frame_count).map(|i| f64::from(i) * interval).collect())
}

/// Progress percentage reported after capturing still `i` of `n`.
pub fn progress_percent(i: u32, n: u32) -> u8 {
    ((f64::from(i + 1) / f64::from(n)) * 100.0).round() as u8
}

/// Extract `frame_count` evenly spaced stills from `video`, in temporal order.
///
/// Each still is a strict seek-then-capture pair. `on_progress` receives the completed
/// percentage after every capture and reaches 100 on success.
#[tracing::instrument(skip(video, on_progress))]
pub fn extract_frames<V, F>(
    video: &mut V,
    frame_count: u32,
    mut on_progress: F,
) -> StudioResult<Vec<RgbaImage>>
where
    V: VideoSurface + ?Sized,
    F: FnMut(u8),
{
    let times = sample_times(video.duration_sec(), frame_count)?;
    let mut frames = Vec::with_capacity(times.len());
    for (i, t) in times.into_iter().enumerate() {
        video
            .seek(t)
            .map_err(|e| StudioError::decode(format!("seek to {t:.3}s failed: {e}")))?;
        let frame = video
            .capture()
            .map_err(|e| StudioError::decode(format!("capture at {t:.3}s failed: {e}")))?;
        frames.push(frame);
        on_progress(progress_percent(i as u32, frame_count));
    }
    tracing::info!(frames = frames.len(), "extracted video frames");
    Ok(frames)
}

#[cfg(test)]
#[path = "../../tests/unit/media/sampler.rs"]
mod tests;
