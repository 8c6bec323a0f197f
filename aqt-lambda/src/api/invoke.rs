//! Invocation endpoint
//!
//! POST /invoke takes the request event and answers with the response
//! envelope. Transport status is always 200; the pipeline's status lives in
//! the envelope's `statusCode`, as with a function runtime. Any JSON value is
//! accepted as an event; only bodies that are not JSON at all are refused at
//! the transport level.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::Value;

use crate::error::PipelineError;
use crate::request::IncomingRequest;
use crate::response::{self, OutgoingResponse};
use crate::AppState;

/// POST /invoke
pub async fn invoke(
    State(state): State<AppState>,
    Json(event): Json<Value>,
) -> Json<OutgoingResponse> {
    let pipeline = state.pipeline.clone();
    let request = IncomingRequest::from_event(&event);

    // Engine calls block for the duration of inference
    let response = tokio::task::spawn_blocking(move || pipeline.handle(&request))
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Invocation task failed");
            response::build(&Err(PipelineError::Fault(format!("Task join error: {}", e))))
        });

    if response.status_code == StatusCode::INTERNAL_SERVER_ERROR.as_u16() {
        let message = response
            .body_json()
            .ok()
            .and_then(|body| body["error"].as_str().map(str::to_string));
        *state.last_error.write().await = message;
    }

    Json(response)
}

/// Build invocation routes
pub fn invoke_routes() -> Router<AppState> {
    Router::new().route("/invoke", post(invoke))
}
