//! Response envelope shaping

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use crate::classifier::ClassificationOutcome;
use crate::error::PipelineResult;

/// Response envelope returned to the hosting runtime
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON text
    pub body: String,
}

impl OutgoingResponse {
    fn json(status: StatusCode, body: serde_json::Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Self {
            status_code: status.as_u16(),
            headers,
            body: body.to_string(),
        }
    }

    /// `{"error": message}` with the given status
    pub fn error(status: StatusCode, message: impl std::fmt::Display) -> Self {
        Self::json(status, json!({ "error": message.to_string() }))
    }

    /// 200 with the engine's media type and tags
    pub fn success(outcome: &ClassificationOutcome) -> Self {
        Self::json(
            StatusCode::OK,
            json!({
                "mediaType": outcome.media_type,
                "tags": outcome.tags,
            }),
        )
    }

    /// Parsed body, for callers that need to inspect it
    pub fn body_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

/// Map a pipeline result to its response
pub fn build(result: &PipelineResult<ClassificationOutcome>) -> OutgoingResponse {
    match result {
        Ok(outcome) => OutgoingResponse::success(outcome),
        Err(error) => OutgoingResponse::error(error.status_code(), error),
    }
}
