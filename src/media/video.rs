use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::foundation::error::{StudioError, StudioResult};

/// Stream facts reported by `ffprobe`.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    /// Probed file.
    pub source_path: PathBuf,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame rate numerator.
    pub fps_num: u32,
    /// Frame rate denominator.
    pub fps_den: u32,
    /// Container duration; `NaN` when ffprobe reports none.
    pub duration_sec: f64,
    /// `true` when the file has an audio stream.
    pub has_audio: bool,
}

impl VideoInfo {
    /// Frame rate as a float, 0 when unknown.
    pub fn source_fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }
}

/// A seekable video the frame sampler can read stills from.
///
/// `seek` returns once the requested position is ready to capture; `capture` then returns the
/// frame at that position.
pub trait VideoSurface {
    /// Total duration in seconds. May be non-finite or zero for unusable media.
    fn duration_sec(&self) -> f64;

    /// Natural frame size.
    fn dimensions(&self) -> (u32, u32);

    /// Move the read position to `time_sec`.
    fn seek(&mut self, time_sec: f64) -> StudioResult<()>;

    /// Grab the frame at the current position as straight-alpha RGBA8.
    fn capture(&mut self) -> StudioResult<RgbaImage>;
}

/// [`VideoSurface`] backed by the `ffprobe`/`ffmpeg` command-line tools.
#[derive(Clone, Debug)]
pub struct FfmpegVideo {
    info: VideoInfo,
    position_sec: f64,
}

impl FfmpegVideo {
    /// Probe `path` and open it at position zero.
    pub fn open(path: &Path) -> StudioResult<Self> {
        let info = probe_video(path)?;
        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            duration_sec = info.duration_sec,
            "opened video"
        );
        Ok(Self {
            info,
            position_sec: 0.0,
        })
    }

    /// Probe results.
    pub fn info(&self) -> &VideoInfo {
        &self.info
    }
}

impl VideoSurface for FfmpegVideo {
    fn duration_sec(&self) -> f64 {
        self.info.duration_sec
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn seek(&mut self, time_sec: f64) -> StudioResult<()> {
        if !time_sec.is_finite() || time_sec < 0.0 {
            return Err(StudioError::decode(format!(
                "cannot seek to {time_sec} s in '{}'",
                self.info.source_path.display()
            )));
        }
        self.position_sec = time_sec;
        Ok(())
    }

    fn capture(&mut self) -> StudioResult<RgbaImage> {
        let rgba = decode_video_frame_rgba8(&self.info, self.position_sec)?;
        RgbaImage::from_raw(self.info.width, self.info.height, rgba)
            .ok_or_else(|| StudioError::decode("decoded frame does not match probed dimensions"))
    }
}

/// Probe `source_path` with `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> StudioResult<VideoInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| StudioError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(StudioError::decode(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| StudioError::decode(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| StudioError::decode("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| StudioError::decode("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| StudioError::decode("missing video height from ffprobe"))?;

    let (fps_num, fps_den) =
        parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1")).unwrap_or((0, 1));
    // Missing duration stays NaN so the sampler rejects it.
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(f64::NAN);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
        has_audio,
    })
}

/// Probe `source_path` with `ffprobe`.
#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_source_path: &Path) -> StudioResult<VideoInfo> {
    Err(StudioError::media(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

/// Decode the frame at `time_sec` as straight-alpha RGBA8 with `ffmpeg`.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_video_frame_rgba8(source: &VideoInfo, time_sec: f64) -> StudioResult<Vec<u8>> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{time_sec:.9}")])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            "1",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| StudioError::media(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(StudioError::decode(format!(
            "ffmpeg frame decode failed for '{}' at {time_sec:.3}s: {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = source.width as usize * source.height as usize * 4;
    if expected_len == 0 {
        return Err(StudioError::decode(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    // Seeking at or past the last frame yields nothing.
    if out.stdout.len() < expected_len {
        return Err(StudioError::decode(format!(
            "ffmpeg returned no frame for '{}' at {time_sec:.3}s",
            source.source_path.display()
        )));
    }
    let mut frame = out.stdout;
    frame.truncate(expected_len);
    Ok(frame)
}

/// Decode the frame at `time_sec` as straight-alpha RGBA8 with `ffmpeg`.
#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_video_frame_rgba8(_source: &VideoInfo, _time_sec: f64) -> StudioResult<Vec<u8>> {
    Err(StudioError::media(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
#[path = "../../tests/unit/media/video.rs"]
mod tests;
