//! Segments, action packs and the segment store.

/// Action pack and character JSON model.
pub mod pack;
/// Frames, tags and segments.
pub mod segment;
/// Ordered segment collection with import and export.
pub mod store;
