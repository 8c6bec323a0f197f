//! Per-invocation request pipeline
//!
//! validate → decode → resolve media type → stage → probe → classify →
//! shape response. Each invocation runs synchronously on the calling thread.
//! The staged file is owned by [`RequestPipeline::run`]'s scope and is
//! removed on every way out of it, including a panic in the engine.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use aqt_common::MediaTypeRegistry;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::classifier::{ClassificationOutcome, Classifier};
use crate::decode;
use crate::error::{PipelineError, PipelineResult};
use crate::media::MediaTypeResolver;
use crate::probe::probe_audio_file;
use crate::request::IncomingRequest;
use crate::response::{self, OutgoingResponse};
use crate::staging::TempFileStore;

/// Request pipeline shared by all invocations
pub struct RequestPipeline {
    resolver: MediaTypeResolver,
    store: TempFileStore,
    classifier: Arc<dyn Classifier>,
}

impl RequestPipeline {
    pub fn new(
        registry: Arc<MediaTypeRegistry>,
        store: TempFileStore,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            resolver: MediaTypeResolver::new(registry),
            store,
            classifier,
        }
    }

    pub fn store(&self) -> &TempFileStore {
        &self.store
    }

    /// Handle one invocation; always produces exactly one response
    pub fn handle(&self, request: &IncomingRequest) -> OutgoingResponse {
        let request_id = Uuid::new_v4();
        let span = info_span!("invocation", %request_id);
        let _enter = span.enter();

        info!(
            content_type = request.content_type().unwrap_or("<none>"),
            body_len = request.body.as_ref().map(String::len),
            is_base64_encoded = request.is_base64_encoded,
            "Invocation received"
        );

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run(request)))
            .unwrap_or_else(|payload| Err(PipelineError::Fault(panic_message(payload.as_ref()))));

        match &result {
            Ok(outcome) => info!(
                media_type = %outcome.media_type,
                tags = ?outcome.tags,
                "Invocation succeeded"
            ),
            Err(e) if e.is_client_error() => {
                warn!(kind = e.kind(), error = %e, "Invocation rejected")
            }
            Err(e) => error!(kind = e.kind(), error = %e, "Invocation failed"),
        }

        response::build(&result)
    }

    /// Run the stages, stopping at the first failure
    pub fn run(&self, request: &IncomingRequest) -> PipelineResult<ClassificationOutcome> {
        let validated = request.validate()?;
        let payload = decode::decode(validated.body)?;
        let descriptor = self.resolver.resolve(validated.content_type)?;

        let mut staged = self.store.stage(&payload, descriptor.extension())?;

        probe(staged.path());

        let outcome = self
            .classifier
            .classify(staged.path(), descriptor.kind().as_str());
        staged.release();
        let outcome = outcome?;

        if outcome.is_unreadable() {
            return Err(PipelineError::UnreadableMedia);
        }

        Ok(outcome)
    }
}

/// Advisory readability check; never affects the result
fn probe(path: &Path) {
    match probe_audio_file(path) {
        Ok(info) => info!(
            codec = info.codec.unwrap_or("unknown"),
            sample_rate = info.sample_rate,
            channels = info.channels,
            duration_seconds = info.duration_seconds,
            "Audio file info"
        ),
        Err(e) => debug!(error = %format!("{:#}", e), "Audio probe could not read file"),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unexpected fault".to_string()
    }
}
