use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::foundation::error::{StudioError, StudioResult};

/// Decoded `data:` URL payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUrl {
    /// Media type from the header, e.g. `image/png`.
    pub mime: String,
    /// Decoded payload bytes.
    pub bytes: Vec<u8>,
}

/// Parse a base64 `data:<mime>;base64,<payload>` URL.
pub fn parse_data_url(s: &str) -> StudioResult<DataUrl> {
    let rest = s
        .strip_prefix("data:")
        .ok_or_else(|| StudioError::decode("not a data URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| StudioError::decode("data URL has no payload separator"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| StudioError::decode("only base64 data URLs are supported"))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| StudioError::decode(format!("invalid base64 payload: {e}")))?;

    Ok(DataUrl {
        mime: if mime.is_empty() {
            "application/octet-stream".to_string()
        } else {
            mime.to_string()
        },
        bytes,
    })
}

/// Encode bytes as a base64 data URL.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Return only the base64 payload of a data URL; plain base64 input is returned unchanged.
pub fn strip_data_url_prefix(s: &str) -> &str {
    match s.split_once(',') {
        Some((_, payload)) => payload,
        None => s,
    }
}

/// Standard base64 encoding used for inline service payloads.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 used by inline service payloads.
pub fn decode_base64(s: &str) -> StudioResult<Vec<u8>> {
    STANDARD
        .decode(s.trim())
        .map_err(|e| StudioError::decode(format!("invalid base64 payload: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/data_url.rs"]
mod tests;
