//! Video sampling and speech audio.

/// Spectrum analysis of playing speech.
pub mod analyser;
/// Speech clip decoding and WAV output.
pub mod audio;
/// Evenly spaced still extraction.
pub mod sampler;
/// Seekable video surfaces and the `ffmpeg` implementation.
pub mod video;
