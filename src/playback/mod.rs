//! Audio-reactive character playback.

/// Idle/blink/talking state machine.
pub mod engine;
/// Refresh clocks and the cancelable animation loop.
pub mod ticker;
