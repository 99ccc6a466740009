//! Offline lip-sync rendering.
//!
//! The engine is stepped on a virtual clock at the output frame rate; every tick composes the
//! engine's current frame onto the stage and pushes it to a [`FrameSink`]. Speech starts after a
//! short lead-in so the idle loop is visible first, and an idle tail follows it.

use std::collections::HashMap;
use std::ops::ControlFlow;

use image::RgbaImage;
use rand::Rng;

use crate::assets::decode::load_image;
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex, ImageRef};
use crate::foundation::error::StudioResult;
use crate::media::analyser::AmplitudeSource;
use crate::media::audio::SpeechClip;
use crate::playback::engine::{ActionFrames, LipSyncEngine, PlaybackMode};
use crate::playback::ticker::{AnimationLoop, OfflineClock};
use crate::project::pack::SceneConfig;
use crate::scene::compose::{SceneRenderOpts, compose_stage};

/// Output timing and stage settings for [`render_lipsync`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LipSyncRenderOpts {
    /// Output frame rate; also the engine tick rate.
    pub fps: Fps,
    /// Idle time before speech starts.
    pub lead_in_sec: f64,
    /// Idle time after speech ends.
    pub tail_sec: f64,
    /// Stage geometry.
    pub stage: SceneRenderOpts,
}

impl Default for LipSyncRenderOpts {
    fn default() -> Self {
        Self {
            fps: Fps { num: 30, den: 1 },
            lead_in_sec: 0.5,
            tail_sec: 0.5,
            stage: SceneRenderOpts::default(),
        }
    }
}

/// Per-mode frame counts of a finished render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames pushed to the sink.
    pub frames: u64,
    /// Frames rendered while idle.
    pub idle_frames: u64,
    /// Frames rendered while blinking.
    pub blink_frames: u64,
    /// Frames rendered while talking.
    pub talking_frames: u64,
}

/// Decoded images keyed by reference, so each distinct frame is decoded once.
#[derive(Default)]
struct FrameCache {
    images: HashMap<ImageRef, RgbaImage>,
}

impl FrameCache {
    fn get(&mut self, r: &ImageRef) -> StudioResult<&RgbaImage> {
        if !self.images.contains_key(r) {
            let img = load_image(r)?;
            self.images.insert(r.clone(), img);
        }
        self.images
            .get(r)
            .ok_or_else(|| anyhow::anyhow!("frame cache lost '{r}'").into())
    }
}

/// Render `speech` lip-synced with `actions` into `sink`.
///
/// `audio` is handed to the sink unchanged; it should already contain `lead_in_sec` of leading
/// silence (see [`SpeechClip::with_leading_silence`]).
#[tracing::instrument(skip_all, fields(speech_sec = speech.duration_sec()))]
pub fn render_lipsync<A, R, S>(
    engine: &mut LipSyncEngine<A, R>,
    actions: ActionFrames,
    scene: &SceneConfig,
    speech: SpeechClip,
    opts: &LipSyncRenderOpts,
    audio: Option<AudioInputConfig>,
    sink: &mut S,
) -> StudioResult<RenderStats>
where
    A: AmplitudeSource,
    R: Rng,
    S: FrameSink + ?Sized,
{
    let fps = Fps::new(opts.fps.num, opts.fps.den)?;
    let total_sec = opts.lead_in_sec.max(0.0) + speech.duration_sec() + opts.tail_sec.max(0.0);
    let total_frames = (total_sec * fps.as_f64()).ceil().max(1.0) as u64;

    let background = scene
        .background_image
        .as_ref()
        .map(load_image)
        .transpose()?;
    let mut cache = FrameCache::default();

    sink.begin(SinkConfig {
        width: opts.stage.width,
        height: opts.stage.height,
        fps,
        audio,
    })?;

    engine.set_actions(actions, 0.0);
    let mut pending = Some(speech);
    let mut stats = RenderStats::default();
    let mut frame = 0u64;

    let mut ticker = AnimationLoop::new(OfflineClock::new(fps));
    ticker.run(|now| {
        if now >= opts.lead_in_sec
            && let Some(clip) = pending.take()
        {
            engine.speak(clip, now);
        }
        let mode = engine.tick(now);
        match mode {
            PlaybackMode::Idle => stats.idle_frames += 1,
            PlaybackMode::Blinking => stats.blink_frames += 1,
            PlaybackMode::Talking => stats.talking_frames += 1,
        }

        let character = match engine.current_frame() {
            Some(r) => Some(cache.get(r)?),
            None => None,
        };
        let stage = compose_stage(&opts.stage, scene, background.as_ref(), character)?;
        sink.push_frame(FrameIndex(frame), &stage)?;
        frame += 1;

        Ok(if frame >= total_frames {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        })
    })?;

    sink.end()?;
    stats.frames = frame;
    tracing::info!(
        frames = stats.frames,
        talking = stats.talking_frames,
        blinks = stats.blink_frames,
        "rendered lip-sync"
    );
    Ok(stats)
}

#[cfg(test)]
#[path = "../../tests/unit/render/lipsync.rs"]
mod tests;
