//! Inbound request event and its structural validation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Request shape errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Body absent or not flagged as base64
    #[error("Invalid request: Expected base64 encoded body.")]
    MissingBody,

    /// No usable Content-Type header
    #[error("Content-Type header is missing.")]
    MissingContentType,
}

/// Request event as delivered by the hosting runtime
///
/// Presence rules:
/// - `body` must be present (it may be empty) and `isBase64Encoded` must be
///   `true`; an absent flag counts as `false`.
/// - `Content-Type` is looked up case-insensitively and must be non-blank.
/// - `headers` may be absent or `null`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingRequest {
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub is_base64_encoded: Option<bool>,
}

/// Borrowed view of a request that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedRequest<'a> {
    /// Encoded body (base64 of a base64 string)
    pub body: &'a str,
    /// Raw Content-Type header value
    pub content_type: &'a str,
}

impl IncomingRequest {
    /// Read an event leniently, field by field
    ///
    /// A field holding the wrong JSON type is treated as absent, so the
    /// event still reaches validation: a string `"true"` flag fails the body
    /// check, and a non-string header value does not count as that header.
    pub fn from_event(event: &Value) -> Self {
        let headers = event.get("headers").and_then(Value::as_object).map(|map| {
            map.iter()
                .filter_map(|(name, value)| Some((name.clone(), value.as_str()?.to_string())))
                .collect()
        });

        Self {
            headers,
            body: event.get("body").and_then(Value::as_str).map(str::to_string),
            is_base64_encoded: event.get("isBase64Encoded").and_then(Value::as_bool),
        }
    }

    /// Header value by name, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        })
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Check the structural preconditions
    ///
    /// The body check runs first, so a request missing both reports
    /// [`ValidationError::MissingBody`].
    pub fn validate(&self) -> Result<ValidatedRequest<'_>, ValidationError> {
        let body = match (&self.body, self.is_base64_encoded) {
            (Some(body), Some(true)) => body.as_str(),
            _ => return Err(ValidationError::MissingBody),
        };

        let content_type = self
            .content_type()
            .filter(|value| !value.trim().is_empty())
            .ok_or(ValidationError::MissingContentType)?;

        Ok(ValidatedRequest { body, content_type })
    }
}
