/// Convenience result type used across the studio.
pub type StudioResult<T> = Result<T, StudioError>;

/// Message carried by [`StudioError::Auth`] when the external service rejects the API key.
///
/// Callers compare against this to prompt for re-authentication instead of showing a generic
/// failure.
pub const API_KEY_EXPIRED_OR_INVALID: &str = "API_KEY_EXPIRED_OR_INVALID";

/// Top-level error taxonomy used by studio APIs.
#[derive(thiserror::Error, Debug)]
pub enum StudioError {
    /// An image, video or audio payload could not be loaded or decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The generative service rejected the credentials.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The frame classification call failed or returned an unusable payload.
    #[error("classification failure: {0}")]
    Classification(String),

    /// Imported JSON matches none of the known asset shapes.
    #[error("invalid asset format: {0}")]
    InvalidAssetFormat(String),

    /// An export was requested but no segment has tagged frames.
    #[error("nothing to export: {0}")]
    NothingToExport(String),

    /// Invalid user-provided arguments or state.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors from external media tooling (`ffmpeg`/`ffprobe`) or encoders.
    #[error("media error: {0}")]
    Media(String),

    /// Transport or protocol errors talking to the generative service.
    #[error("service error: {0}")]
    Service(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StudioError {
    /// Build a [`StudioError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build the distinguished [`StudioError::Auth`] value.
    pub fn auth() -> Self {
        Self::Auth(API_KEY_EXPIRED_OR_INVALID.to_string())
    }

    /// Build a [`StudioError::Classification`] value.
    pub fn classification(msg: impl Into<String>) -> Self {
        Self::Classification(msg.into())
    }

    /// Build a [`StudioError::InvalidAssetFormat`] value.
    pub fn invalid_asset(msg: impl Into<String>) -> Self {
        Self::InvalidAssetFormat(msg.into())
    }

    /// Build a [`StudioError::NothingToExport`] value.
    pub fn nothing_to_export(msg: impl Into<String>) -> Self {
        Self::NothingToExport(msg.into())
    }

    /// Build a [`StudioError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StudioError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`StudioError::Service`] value.
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Build a [`StudioError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` when the caller should prompt for a new API key.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
