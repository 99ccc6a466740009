//! Raster operations on frames.

/// Contact-sheet index badges.
pub mod badge;
/// Background color keying.
pub mod chroma;
/// Grid slicing, reassembly and contact sheets.
pub mod grid;
/// Per-frame offset correction.
pub mod stabilize;
