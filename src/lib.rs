//! frame-studio turns generated character art and reference video into animated, lip-synced
//! characters.
//!
//! The crate is a set of media-processing building blocks plus a small command-line tool:
//!
//! - Slice sprite sheets into frames and tile frames into numbered contact sheets
//!   ([`imaging::grid`])
//! - Key out flat backgrounds ([`imaging::chroma`])
//! - Sample evenly spaced stills from a video ([`media::sampler`])
//! - Tag frames with a vision model ([`curation::bridge`]) and organise them into segments and
//!   action packs ([`project`])
//! - Drive idle, blink and talking animation from speech amplitude ([`playback::engine`]) and
//!   render the result into a [`FrameSink`] ([`render::lipsync`])
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Image references, data URLs and codecs.
pub mod assets;
/// Studio-wide configuration file.
pub mod config;
/// AI-assisted frame tagging.
pub mod curation;
/// Output sinks for rendered frames.
pub mod encode;
/// Core types and errors.
pub mod foundation;
/// Raster operations on frames.
pub mod imaging;
/// Video sampling and speech audio.
pub mod media;
/// Audio-reactive playback state machine.
pub mod playback;
/// Segments, packs and the segment store.
pub mod project;
/// Offline lip-sync rendering.
pub mod render;
/// Stage composition.
pub mod scene;
/// Generative service client.
pub mod service;

pub use crate::config::StudioConfig;
pub use crate::foundation::core::{Fps, FrameIndex, ImageRef, Point, Rgb8, Vec2};
pub use crate::foundation::error::{API_KEY_EXPIRED_OR_INVALID, StudioError, StudioResult};

pub use crate::curation::bridge::{FrameClassifier, TagSuggestion, curate};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::imaging::chroma::{ChromaKey, remove_color};
pub use crate::imaging::grid::{ContactSheet, ContactSheetOpts, compose_contact_sheet, slice_grid};
pub use crate::media::analyser::{AmplitudeSource, SpectrumAnalyser};
pub use crate::media::audio::SpeechClip;
pub use crate::media::sampler::extract_frames;
pub use crate::media::video::{FfmpegVideo, VideoSurface};
pub use crate::playback::engine::{ActionFrames, LipSyncEngine, PlaybackMode, PlaybackOpts};
pub use crate::project::pack::{Character, SceneConfig};
pub use crate::project::segment::{ActionRole, Frame, FrameTag, Segment};
pub use crate::project::store::SegmentStore;
pub use crate::render::lipsync::{LipSyncRenderOpts, RenderStats, render_lipsync};
pub use crate::service::gemini::{GeminiClient, ServiceOpts};
