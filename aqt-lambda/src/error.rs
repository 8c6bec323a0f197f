//! Error types for aqt-lambda
//!
//! Every stage of the pipeline has its own error type; [`PipelineError`]
//! aggregates them and decides the response status. Client-side problems
//! (bad request shape, bad encoding, unsupported media, unreadable media)
//! map to 400. Everything else is a fault and maps to 500.

use axum::http::StatusCode;
use thiserror::Error;

use crate::classifier::ClassifierError;
use crate::decode::DecodeError;
use crate::media::MediaTypeError;
use crate::request::ValidationError;
use crate::staging::StagingError;

/// Pipeline error type
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Request shape check failed (400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Body is not valid double base64 (400)
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Content type not accepted or has no extension (400)
    #[error(transparent)]
    MediaType(#[from] MediaTypeError),

    /// Engine returned the empty media type sentinel (400)
    #[error("Failed to open media file")]
    UnreadableMedia,

    /// Staging the payload failed (500)
    #[error(transparent)]
    Staging(#[from] StagingError),

    /// Engine fault (500)
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    /// Anything else, including panics inside the pipeline (500)
    #[error("{0}")]
    Fault(String),
}

impl PipelineError {
    /// HTTP status for the response envelope
    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// True for failures caused by the request rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Validation(_)
                | PipelineError::Decode(_)
                | PipelineError::MediaType(_)
                | PipelineError::UnreadableMedia
        )
    }

    /// Short machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(ValidationError::MissingBody) => "MISSING_BODY",
            PipelineError::Validation(ValidationError::MissingContentType) => {
                "MISSING_CONTENT_TYPE"
            }
            PipelineError::Decode(_) => "DECODE_ERROR",
            PipelineError::MediaType(MediaTypeError::Unsupported(_)) => "UNSUPPORTED_MEDIA_TYPE",
            PipelineError::MediaType(MediaTypeError::NoExtension(_)) => "EXTENSION_RESOLUTION",
            PipelineError::UnreadableMedia => "UNREADABLE_MEDIA",
            PipelineError::Staging(_) => "STAGING_FAULT",
            PipelineError::Classifier(_) => "ENGINE_FAULT",
            PipelineError::Fault(_) => "UNHANDLED_FAULT",
        }
    }
}

/// Result of one pipeline run
pub type PipelineResult<T> = Result<T, PipelineError>;
