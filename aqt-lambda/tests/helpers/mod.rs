//! Test Helper Utilities
//!
//! Shared utilities for aqt-lambda integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use aqt_common::MediaTypeRegistry;
use aqt_lambda::classifier::{ClassificationOutcome, Classifier, ClassifierError};
use aqt_lambda::staging::TempFileStore;
use aqt_lambda::{IncomingRequest, RequestPipeline};
use base64::{engine::general_purpose, Engine as _};

/// What the fake engine does when called
#[derive(Debug, Clone)]
pub enum EngineBehavior {
    Answer(ClassificationOutcome),
    Fail(String),
}

/// One call observed by [`FakeClassifier`]
#[derive(Debug, Clone)]
pub struct EngineCall {
    pub path: PathBuf,
    pub existed: bool,
    pub size: Option<u64>,
    pub media_kind: String,
}

/// In-process stand-in for the classification engine
pub struct FakeClassifier {
    behavior: EngineBehavior,
    calls: Mutex<Vec<EngineCall>>,
}

impl FakeClassifier {
    pub fn answering(media_type: &str, tags: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            behavior: EngineBehavior::Answer(ClassificationOutcome {
                media_type: media_type.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            }),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            behavior: EngineBehavior::Fail(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Classifier for FakeClassifier {
    fn classify(
        &self,
        file_path: &Path,
        media_kind: &str,
    ) -> Result<ClassificationOutcome, ClassifierError> {
        self.calls.lock().unwrap().push(EngineCall {
            path: file_path.to_path_buf(),
            existed: file_path.exists(),
            size: std::fs::metadata(file_path).ok().map(|m| m.len()),
            media_kind: media_kind.to_string(),
        });

        match &self.behavior {
            EngineBehavior::Answer(outcome) => Ok(outcome.clone()),
            EngineBehavior::Fail(message) => Err(ClassifierError::Execution(message.clone())),
        }
    }
}

/// Pipeline over the default registry, staging into `staging_dir`
pub fn create_pipeline(staging_dir: &Path, classifier: Arc<dyn Classifier>) -> RequestPipeline {
    RequestPipeline::new(
        Arc::new(MediaTypeRegistry::with_defaults()),
        TempFileStore::new(staging_dir),
        classifier,
    )
}

/// base64(base64(bytes)), as clients send it
pub fn double_encode(bytes: &[u8]) -> String {
    let inner = general_purpose::STANDARD.encode(bytes);
    general_purpose::STANDARD.encode(inner.as_bytes())
}

/// Well-formed request event
pub fn audio_event(content_type: &str, bytes: &[u8]) -> IncomingRequest {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), content_type.to_string());

    IncomingRequest {
        headers: Some(headers),
        body: Some(double_encode(bytes)),
        is_base64_encoded: Some(true),
    }
}

/// Short mono 16-bit WAV file contents
pub fn wav_bytes(sample_rate: u32, duration_seconds: f64) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let total_samples = (duration_seconds * sample_rate as f64) as usize;
        for i in 0..total_samples {
            // 440Hz tone at 30% amplitude
            let t = i as f32 / sample_rate as f32;
            let sample = 0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Number of entries in a directory (0 if it does not exist)
pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.count())
        .unwrap_or(0)
}
