use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::foundation::core::Fps;
use crate::foundation::error::StudioResult;

/// Shared cancellation flag for a running [`AnimationLoop`].
///
/// Clones observe the same flag; cancelling any clone stops the loop before its next tick.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Token in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop every loop holding a clone of this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// `true` once [`CancelToken::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A source of display refresh instants, in seconds since the clock started.
pub trait RefreshClock {
    /// Block until the next refresh and return its time.
    fn next_tick(&mut self) -> f64;
}

/// Wall-clock refresh at a fixed rate.
#[derive(Debug)]
pub struct RealtimeClock {
    origin: Instant,
    period: Duration,
    ticks: u32,
}

impl RealtimeClock {
    /// Clock starting now, ticking `refresh` times per second.
    pub fn new(refresh: Fps) -> Self {
        Self {
            origin: Instant::now(),
            period: Duration::from_secs_f64(refresh.frame_duration_secs()),
            ticks: 0,
        }
    }
}

impl RefreshClock for RealtimeClock {
    fn next_tick(&mut self) -> f64 {
        let due = self.origin + self.period * self.ticks;
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }
        self.ticks = self.ticks.saturating_add(1);
        self.origin.elapsed().as_secs_f64()
    }
}

/// Virtual refresh that advances by exactly one frame per tick without sleeping.
#[derive(Clone, Copy, Debug)]
pub struct OfflineClock {
    fps: Fps,
    frame: u64,
}

impl OfflineClock {
    /// Clock at frame 0.
    pub fn new(fps: Fps) -> Self {
        Self { fps, frame: 0 }
    }

    /// Number of ticks handed out so far.
    pub fn frames(&self) -> u64 {
        self.frame
    }
}

impl RefreshClock for OfflineClock {
    fn next_tick(&mut self) -> f64 {
        let t = self.fps.frames_to_secs(self.frame);
        self.frame += 1;
        t
    }
}

/// Cooperative per-refresh loop.
pub struct AnimationLoop<C: RefreshClock> {
    clock: C,
    token: CancelToken,
}

impl<C: RefreshClock> AnimationLoop<C> {
    /// Loop over `clock` with a fresh token.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            token: CancelToken::new(),
        }
    }

    /// Token that stops this loop.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Underlying clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Call `on_tick` with each refresh time until it breaks, errors, or the token is cancelled.
    ///
    /// Returns the number of completed ticks.
    pub fn run<F>(&mut self, mut on_tick: F) -> StudioResult<u64>
    where
        F: FnMut(f64) -> StudioResult<ControlFlow<()>>,
    {
        let mut ticks = 0u64;
        while !self.token.is_cancelled() {
            let now = self.clock.next_tick();
            let flow = on_tick(now)?;
            ticks += 1;
            if flow.is_break() {
                break;
            }
        }
        tracing::debug!(ticks, cancelled = self.token.is_cancelled(), "animation loop ended");
        Ok(ticks)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/ticker.rs"]
mod tests;
