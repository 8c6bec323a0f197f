//! Staged payload files
//!
//! Decoded payloads are written to a dedicated staging directory so the
//! classification engine can read them from disk. A [`StagedFile`] owns its
//! path: dropping it deletes the file, so every exit from the owning scope
//! (normal return, `?` early return, panic unwind) cleans up.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::decode::DecodedPayload;

/// Attempts at finding an unused file name before giving up
const MAX_NAME_ATTEMPTS: usize = 3;

/// Staging errors
#[derive(Debug, Error)]
pub enum StagingError {
    /// Staging directory could not be created
    #[error("Failed to create staging directory {}: {source}", .dir.display())]
    CreateDir { dir: PathBuf, source: io::Error },

    /// Staged file could not be created
    #[error("Failed to create staged file {}: {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },

    /// Payload could not be written in full
    #[error("Failed to write staged file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Creates staged files inside one directory
#[derive(Debug, Clone)]
pub struct TempFileStore {
    dir: PathBuf,
}

impl TempFileStore {
    /// Store rooted at `dir`; the directory is created on first use
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `payload` to a fresh uniquely named file ending in `extension`
    ///
    /// The write is flushed to storage before returning.
    pub fn stage(
        &self,
        payload: &DecodedPayload,
        extension: &str,
    ) -> Result<StagedFile, StagingError> {
        fs::create_dir_all(&self.dir).map_err(|source| StagingError::CreateDir {
            dir: self.dir.clone(),
            source,
        })?;

        let (mut file, path) = self.create_unique(extension)?;

        // Owned from here on: any failure below removes the partial file.
        let mut staged = StagedFile {
            path,
            bytes_written: 0,
            released: false,
        };

        file.write_all(payload.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|source| StagingError::Write {
                path: staged.path.clone(),
                source,
            })?;
        staged.bytes_written = payload.len();

        tracing::info!(
            path = %staged.path.display(),
            bytes = staged.bytes_written,
            "Payload staged"
        );

        Ok(staged)
    }

    fn create_unique(&self, extension: &str) -> Result<(fs::File, PathBuf), StagingError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let path = self
                .dir
                .join(format!("{}{}", Uuid::new_v4().simple(), extension));

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((file, path)),
                Err(e)
                    if e.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS =>
                {
                    tracing::debug!(path = %path.display(), "Staged file name taken, retrying");
                }
                Err(source) => return Err(StagingError::Create { path, source }),
            }
        }
    }
}

/// A payload file owned by one invocation
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    bytes_written: usize,
    released: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Delete the file if it still exists
    ///
    /// Idempotent. Returns true if this call removed the file. Failures are
    /// logged and otherwise ignored.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Staged file removed");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Staged file already gone");
                false
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove staged file"
                );
                false
            }
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.release();
    }
}
