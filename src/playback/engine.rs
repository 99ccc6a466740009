//! Idle / blink / talking frame selection driven by a refresh tick and live speech amplitude.
//!
//! One [`LipSyncEngine::tick`] runs per display refresh. Transition checks precede frame
//! selection and each tick performs at most one of: a blink trigger, a cadence frame advance,
//! or an amplitude sample. Speech preempts a blink immediately and is itself only ended by the
//! amplitude source reporting completion.

use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::foundation::core::ImageRef;
use crate::foundation::error::{StudioError, StudioResult};
use crate::media::analyser::AmplitudeSource;
use crate::media::audio::SpeechClip;
use crate::project::pack::Character;

/// Timing and amplitude-mapping parameters of the engine.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlaybackOpts {
    /// Idle loop cadence in frames per second.
    pub idle_fps: f64,
    /// Blink cadence in frames per second.
    pub blink_fps: f64,
    /// Fixed part of the first blink delay after an action selection.
    pub first_blink_delay_sec: f64,
    /// Random extra first blink delay, drawn from `[0, first_blink_jitter_sec)`.
    pub first_blink_jitter_sec: f64,
    /// Lower bound of the re-arm interval after a blink.
    pub blink_min_interval_sec: f64,
    /// Upper bound of the re-arm interval after a blink.
    pub blink_max_interval_sec: f64,
    /// Smoothing weight applied when the level rises.
    pub attack: f64,
    /// Smoothing weight applied when the level falls.
    pub decay: f64,
    /// Smoothed levels below this (byte scale) show the closed-mouth frame.
    pub dead_zone: f64,
    /// Smoothed level (byte scale) that maps to the widest mouth frame.
    pub full_scale: f64,
    /// Analyser bins averaged for the speech level.
    pub speech_bins: Range<usize>,
}

impl Default for PlaybackOpts {
    fn default() -> Self {
        Self {
            idle_fps: 4.0,
            blink_fps: 12.0,
            first_blink_delay_sec: 3.0,
            first_blink_jitter_sec: 5.0,
            blink_min_interval_sec: 2.0,
            blink_max_interval_sec: 6.0,
            attack: 0.6,
            decay: 0.2,
            dead_zone: 10.0,
            full_scale: 120.0,
            speech_bins: 2..32,
        }
    }
}

impl PlaybackOpts {
    /// Reject cadences, bounds and coefficients the engine cannot run with.
    pub fn validate(&self) -> StudioResult<()> {
        if !(self.idle_fps > 0.0 && self.blink_fps > 0.0) {
            return Err(StudioError::validation("playback cadences must be > 0"));
        }
        if self.blink_min_interval_sec < 0.0
            || self.blink_max_interval_sec < self.blink_min_interval_sec
        {
            return Err(StudioError::validation(
                "blink interval bounds must satisfy 0 <= min <= max",
            ));
        }
        if !(0.0..=1.0).contains(&self.attack) || !(0.0..=1.0).contains(&self.decay) {
            return Err(StudioError::validation("attack and decay must lie in [0, 1]"));
        }
        if self.full_scale <= self.dead_zone {
            return Err(StudioError::validation("full_scale must exceed dead_zone"));
        }
        Ok(())
    }
}

/// What the engine is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Looping the idle action.
    Idle,
    /// Playing the blink action once.
    Blinking,
    /// Mapping speech level to talking frames.
    Talking,
}

/// Runtime state; reset whenever the action selection changes.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    /// Current mode.
    pub mode: PlaybackMode,
    /// Index into the current mode's frames.
    pub frame_index: usize,
    /// Clock time at or after which the next blink starts.
    pub blink_deadline: f64,
    /// Smoothed speech level, byte scale.
    pub volume: f64,
    /// Clock time of the last cadence frame change.
    pub last_advance: f64,
}

impl PlaybackState {
    fn reset(now: f64) -> Self {
        Self {
            mode: PlaybackMode::Idle,
            frame_index: 0,
            blink_deadline: f64::INFINITY,
            volume: 0.0,
            last_advance: now,
        }
    }
}

/// The frame lists the engine draws from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionFrames {
    /// Looped at the idle cadence.
    pub idle: Vec<ImageRef>,
    /// One-shot blink; empty disables blinking.
    pub blink: Vec<ImageRef>,
    /// Mouth frames ordered closed to widest open.
    pub talking: Vec<ImageRef>,
}

impl ActionFrames {
    /// Pick actions of `character` by name. `None` names fall back to the character defaults.
    pub fn from_character(
        character: &Character,
        idle: Option<&str>,
        talking: Option<&str>,
        blink: Option<&str>,
    ) -> StudioResult<Self> {
        let lookup = |name: Option<&str>, role: &str| -> StudioResult<Vec<ImageRef>> {
            let name = name.ok_or_else(|| {
                StudioError::validation(format!("character has no {role} action"))
            })?;
            character
                .action(name)
                .map(|a| a.frames.clone())
                .ok_or_else(|| StudioError::validation(format!("unknown action '{name}'")))
        };
        Ok(Self {
            idle: lookup(idle.or(character.idle_action_name()), "idle")?,
            talking: lookup(talking.or(character.talking_action_name()), "talking")?,
            blink: match blink {
                Some(name) => lookup(Some(name), "blink")?,
                None => Vec::new(),
            },
        })
    }

    fn for_mode(&self, mode: PlaybackMode) -> &[ImageRef] {
        match mode {
            PlaybackMode::Idle => &self.idle,
            PlaybackMode::Blinking => &self.blink,
            PlaybackMode::Talking => &self.talking,
        }
    }
}

/// Audio-reactive character animation state machine.
pub struct LipSyncEngine<A: AmplitudeSource, R: Rng = StdRng> {
    opts: PlaybackOpts,
    amp: A,
    rng: R,
    frames: ActionFrames,
    state: PlaybackState,
}

impl<A: AmplitudeSource> LipSyncEngine<A, StdRng> {
    /// Engine with an OS-seeded random source for blink jitter.
    pub fn new(opts: PlaybackOpts, amp: A) -> StudioResult<Self> {
        Self::with_rng(opts, amp, StdRng::from_os_rng())
    }
}

impl<A: AmplitudeSource, R: Rng> LipSyncEngine<A, R> {
    /// Engine with an explicit random source for blink timing.
    pub fn with_rng(opts: PlaybackOpts, amp: A, rng: R) -> StudioResult<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            amp,
            rng,
            frames: ActionFrames::default(),
            state: PlaybackState::reset(0.0),
        })
    }

    /// Validated options.
    pub fn opts(&self) -> &PlaybackOpts {
        &self.opts
    }

    /// Current runtime state.
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Current mode.
    pub fn mode(&self) -> PlaybackMode {
        self.state.mode
    }

    /// Current action selection.
    pub fn frames(&self) -> &ActionFrames {
        &self.frames
    }

    /// Replace the action selection, stop any speech, and arm the first blink.
    pub fn set_actions(&mut self, frames: ActionFrames, now: f64) {
        self.amp.stop();
        self.frames = frames;
        self.state = PlaybackState::reset(now);
        let jitter = self.uniform(0.0, self.opts.first_blink_jitter_sec);
        self.state.blink_deadline = now + self.opts.first_blink_delay_sec + jitter;
        tracing::debug!(deadline = self.state.blink_deadline, "actions selected");
    }

    /// Start speaking `clip` now. Any blink in progress is cancelled immediately.
    pub fn speak(&mut self, clip: SpeechClip, now: f64) {
        self.amp.start(clip, now);
        self.state.mode = PlaybackMode::Talking;
        self.state.frame_index = 0;
        self.state.volume = 0.0;
        self.state.last_advance = now;
    }

    /// Stop speech; the next tick returns to idle.
    pub fn stop_speaking(&mut self) {
        self.amp.stop();
    }

    /// Advance the state machine to clock time `now` (seconds).
    pub fn tick(&mut self, now: f64) -> PlaybackMode {
        match self.state.mode {
            PlaybackMode::Talking => {
                if self.amp.has_ended(now) {
                    self.enter_idle(now);
                } else {
                    self.sample_speech(now);
                }
            }
            PlaybackMode::Blinking => {
                if now - self.state.last_advance >= 1.0 / self.opts.blink_fps {
                    if self.state.frame_index + 1 < self.frames.blink.len() {
                        self.state.frame_index += 1;
                        self.state.last_advance = now;
                    } else {
                        self.enter_idle(now);
                    }
                }
            }
            PlaybackMode::Idle => {
                if !self.frames.blink.is_empty() && now >= self.state.blink_deadline {
                    self.state.mode = PlaybackMode::Blinking;
                    self.state.frame_index = 0;
                    self.state.last_advance = now;
                } else if now - self.state.last_advance >= 1.0 / self.opts.idle_fps {
                    let n = self.frames.idle.len().max(1);
                    self.state.frame_index = (self.state.frame_index + 1) % n;
                    self.state.last_advance = now;
                }
            }
        }
        self.state.mode
    }

    /// Frame to display for the current state, if the active list has any.
    pub fn current_frame(&self) -> Option<&ImageRef> {
        let list = self.frames.for_mode(self.state.mode);
        list.get(self.state.frame_index).or_else(|| list.first())
    }

    /// Map a smoothed byte-scale level to a mouth frame index for `n` talking frames.
    pub fn mouth_index(&self, volume: f64, n: usize) -> usize {
        if n <= 1 || volume < self.opts.dead_zone {
            return 0;
        }
        let span = self.opts.full_scale - self.opts.dead_zone;
        let intensity = ((volume - self.opts.dead_zone) / span).clamp(0.0, 1.0);
        let top = n - 1;
        ((intensity * top as f64).ceil() as usize).clamp(1, top)
    }

    fn sample_speech(&mut self, now: f64) {
        let level = self.amp.band_level(now, self.opts.speech_bins.clone());
        let vol = self.state.volume;
        let k = if level > vol {
            self.opts.attack
        } else {
            self.opts.decay
        };
        self.state.volume = vol + (level - vol) * k;
        self.state.frame_index = self.mouth_index(self.state.volume, self.frames.talking.len());
    }

    fn enter_idle(&mut self, now: f64) {
        let from = self.state.mode;
        self.state.mode = PlaybackMode::Idle;
        self.state.frame_index = 0;
        self.state.volume = 0.0;
        self.state.last_advance = now;
        let wait = self.uniform(self.opts.blink_min_interval_sec, self.opts.blink_max_interval_sec);
        self.state.blink_deadline = now + wait;
        tracing::trace!(?from, deadline = self.state.blink_deadline, "back to idle");
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo {
            self.rng.random_range(lo..hi)
        } else {
            lo
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/engine.rs"]
mod tests;
