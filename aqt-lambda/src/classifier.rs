//! Classification engine boundary
//!
//! The engine takes a staged file path and a media kind and answers with
//! `{"mediaType": string, "tags": [string]}`. An empty `mediaType` means the
//! engine could not open the media.
//!
//! [`CommandClassifier`] runs the engine as an external executable:
//! `<command> [args...] <file_path> <media_kind>`, reading the JSON answer
//! from stdout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

use aqt_common::config::ClassifierConfig;

/// Engine boundary errors (all surface as faults)
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Engine executable not found
    #[error("Classification engine not found: {0}")]
    BinaryNotFound(String),

    /// Engine could not be started
    #[error("Failed to execute classification engine: {0}")]
    Execution(String),

    /// Engine exited unsuccessfully
    #[error("Classification engine failed (exit code {code:?}): {stderr}")]
    EngineFailed { code: Option<i32>, stderr: String },

    /// Engine output is not the expected JSON
    #[error("Failed to parse classification engine output: {0}")]
    Parse(String),
}

/// `mediaType` value the engine uses for media it could not open
pub const UNREADABLE_MEDIA_TYPE: &str = "";

/// Engine answer
///
/// `mediaType` is required; an answer without it breaks the engine contract
/// and fails to parse. Missing `tags` become an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClassificationOutcome {
    #[serde(rename = "mediaType")]
    pub media_type: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl ClassificationOutcome {
    /// True when the engine reported it could not open the media
    pub fn is_unreadable(&self) -> bool {
        self.media_type == UNREADABLE_MEDIA_TYPE
    }
}

/// Synchronous classification engine
pub trait Classifier: Send + Sync {
    fn classify(
        &self,
        file_path: &Path,
        media_kind: &str,
    ) -> Result<ClassificationOutcome, ClassifierError>;
}

/// Engine reached through an external executable
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    command: String,
    args: Vec<String>,
}

impl CommandClassifier {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Location of the engine executable, if it can be found
    pub fn locate(&self) -> Option<PathBuf> {
        let command = Path::new(&self.command);
        if command.components().count() > 1 {
            return command.is_file().then(|| command.to_path_buf());
        }

        let path_var = std::env::var_os("PATH")?;
        std::env::split_paths(&path_var)
            .map(|dir| dir.join(command))
            .find(|candidate| candidate.is_file())
    }

    pub fn is_available(&self) -> bool {
        self.locate().is_some()
    }
}

impl Classifier for CommandClassifier {
    fn classify(
        &self,
        file_path: &Path,
        media_kind: &str,
    ) -> Result<ClassificationOutcome, ClassifierError> {
        tracing::info!(
            engine = %self.command,
            file = %file_path.display(),
            media_kind = media_kind,
            "Running classification engine"
        );

        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(file_path)
            .arg(media_kind)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ClassifierError::BinaryNotFound(self.command.clone())
                }
                _ => ClassifierError::Execution(e.to_string()),
            })?;

        if !output.status.success() {
            return Err(ClassifierError::EngineFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let outcome = parse_engine_output(&output.stdout)?;

        tracing::info!(
            media_type = %outcome.media_type,
            tag_count = outcome.tags.len(),
            "Classification engine completed"
        );

        Ok(outcome)
    }
}

/// Parse the engine's stdout
///
/// Engines may log to stdout before the answer, so the last non-empty line is
/// taken as the JSON document when the whole output does not parse.
pub fn parse_engine_output(stdout: &[u8]) -> Result<ClassificationOutcome, ClassifierError> {
    let text = String::from_utf8_lossy(stdout);

    if let Ok(outcome) = serde_json::from_str(text.trim()) {
        return Ok(outcome);
    }

    let last_line = text
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| ClassifierError::Parse("empty engine output".to_string()))?;

    serde_json::from_str(last_line.trim()).map_err(|e| ClassifierError::Parse(e.to_string()))
}
