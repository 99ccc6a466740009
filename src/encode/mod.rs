//! Encoding sinks.
//!
//! Sinks consume composed stage frames in timeline order and are driven by the lip-sync renderer.

/// `ffmpeg`-based MP4 sink.
pub mod ffmpeg;
/// Generic frame sink trait and the in-memory sink.
pub mod sink;
