//! Request body decoding
//!
//! Clients send the audio as base64 of a base64 *string*: the body decodes
//! to ASCII text (the inner token), and the inner token decodes to the raw
//! file bytes. Both layers must be undone, in order. Collapsing them into a
//! single decode breaks every client that follows the double encoding.

use base64::{
    alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use thiserror::Error;

/// Standard alphabet, canonical padding, non-zero trailing bits tolerated
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Body decoding errors
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Outer layer is not valid base64
    #[error("Failed to decode request body: outer base64 layer: {0}")]
    Outer(base64::DecodeError),

    /// Outer layer did not decode to UTF-8 text
    #[error("Failed to decode request body: inner token is not UTF-8: {0}")]
    InnerUtf8(#[from] std::string::FromUtf8Error),

    /// Inner token is not valid base64
    #[error("Failed to decode request body: inner base64 layer: {0}")]
    Inner(base64::DecodeError),
}

/// Raw payload bytes recovered from the body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload(Vec<u8>);

impl DecodedPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Undo both base64 layers of a request body
pub fn decode(body: &str) -> Result<DecodedPayload, DecodeError> {
    let intermediate = decode_layer(body).map_err(DecodeError::Outer)?;
    let inner_token = String::from_utf8(intermediate)?;
    let bytes = decode_layer(&inner_token).map_err(DecodeError::Inner)?;

    tracing::debug!(
        encoded_len = body.len(),
        inner_token_len = inner_token.len(),
        decoded_len = bytes.len(),
        "Request body decoded"
    );
    tracing::trace!(head = %hex_prefix(&bytes, 16), "Decoded payload prefix");

    Ok(DecodedPayload(bytes))
}

/// Standard alphabet with padding; line breaks and other ASCII whitespace
/// inserted by wrapping encoders are ignored. Unused bits of the final
/// symbol are discarded rather than rejected.
fn decode_layer(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    if text.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        BODY_ENGINE.decode(compact)
    } else {
        BODY_ENGINE.decode(text)
    }
}

fn hex_prefix(bytes: &[u8], max: usize) -> String {
    bytes
        .iter()
        .take(max)
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
