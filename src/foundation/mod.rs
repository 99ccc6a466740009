//! Core value types, the error taxonomy and pixel math shared by every other module.

/// Frame timing, colors and image references.
pub mod core;
/// Error taxonomy and result alias.
pub mod error;
pub(crate) mod math;
