//! aqt-lambda library interface
//!
//! Audio query tagging: decodes a double base64 audio payload, stages it,
//! runs the classification engine and shapes the response envelope.

pub mod api;
pub mod classifier;
pub mod decode;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod probe;
pub mod request;
pub mod response;
pub mod staging;

pub use crate::error::{PipelineError, PipelineResult};
pub use crate::pipeline::RequestPipeline;
pub use crate::request::IncomingRequest;
pub use crate::response::OutgoingResponse;

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Request pipeline (registry, staging store, engine)
    pub pipeline: Arc<RequestPipeline>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last fault message, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::invoke_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
