//! Segment encoding for the dot-delimited token format.
//!
//! Segments use the URL-safe base64 alphabet without padding so they can sit
//! between dots and inside a cookie value unescaped.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("segment is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("segment is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Inverse of [`encode_segment`]. Trailing `=` padding is accepted and ignored.
pub fn decode_segment(text: &str) -> Result<Vec<u8>, CodecError> {
    let unpadded = text.trim_end_matches('=');
    Ok(URL_SAFE_NO_PAD.decode(unpadded)?)
}

pub fn encode_json<T: Serialize>(value: &T) -> Result<String, CodecError> {
    Ok(encode_segment(&serde_json::to_vec(value)?))
}

pub fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    Ok(serde_json::from_slice(&decode_segment(text)?)?)
}
