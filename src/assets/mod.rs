//! Image references: data URLs and codecs.

/// `data:` URL and base64 helpers.
pub mod data_url;
/// Loading, decoding and encoding of raster images.
pub mod decode;
