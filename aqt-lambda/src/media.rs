//! Content-type resolution
//!
//! Maps the request's Content-Type to a coarse media kind and to the file
//! extension used when staging the payload.

use aqt_common::MediaTypeRegistry;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Content-type resolution errors (both carry the lower-cased content type)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaTypeError {
    /// Not an audio content type
    #[error("Unsupported media type: {0}")]
    Unsupported(String),

    /// Audio content type with no known file extension
    #[error("Unsupported Content-Type: {0}")]
    NoExtension(String),
}

/// Coarse media classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Unsupported,
}

impl MediaKind {
    /// Kind implied by a (lower-cased) content type
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.contains("audio") {
            MediaKind::Audio
        } else {
            MediaKind::Unsupported
        }
    }

    /// Name passed to the classification engine
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved media kind and staging extension
///
/// Only [`MediaTypeResolver::resolve`] builds these, and it never returns
/// one with [`MediaKind::Unsupported`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    kind: MediaKind,
    extension: String,
}

impl MediaDescriptor {
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Extension with leading dot, e.g. `.wav`
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

/// Resolves content types against the startup registry
#[derive(Debug, Clone)]
pub struct MediaTypeResolver {
    registry: Arc<MediaTypeRegistry>,
}

impl MediaTypeResolver {
    pub fn new(registry: Arc<MediaTypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, content_type: &str) -> Result<MediaDescriptor, MediaTypeError> {
        let content_type = content_type.to_lowercase();

        let kind = MediaKind::from_content_type(&content_type);
        if kind == MediaKind::Unsupported {
            return Err(MediaTypeError::Unsupported(content_type));
        }

        let extension = self
            .registry
            .extension_for(&content_type)
            .ok_or_else(|| MediaTypeError::NoExtension(content_type.clone()))?;

        tracing::debug!(
            content_type = %content_type,
            kind = %kind,
            extension = extension,
            "Resolved media type"
        );

        Ok(MediaDescriptor {
            kind,
            extension: extension.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> MediaTypeResolver {
        MediaTypeResolver::new(Arc::new(MediaTypeRegistry::with_defaults()))
    }

    #[test]
    fn test_resolve_wav() {
        let descriptor = resolver().resolve("audio/wav").unwrap();
        assert_eq!(descriptor.kind(), MediaKind::Audio);
        assert_eq!(descriptor.extension(), ".wav");
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let descriptor = resolver().resolve("AUDIO/MP3").unwrap();
        assert_eq!(descriptor.kind(), MediaKind::Audio);
        assert_eq!(descriptor.extension(), ".mp3");
    }

    #[test]
    fn test_non_audio_is_rejected_with_lowercased_type() {
        assert_eq!(
            resolver().resolve("Image/PNG"),
            Err(MediaTypeError::Unsupported("image/png".to_string()))
        );
        assert_eq!(
            resolver().resolve("application/octet-stream"),
            Err(MediaTypeError::Unsupported("application/octet-stream".to_string()))
        );
    }

    #[test]
    fn test_audio_without_extension() {
        assert_eq!(
            resolver().resolve("audio/x-made-up"),
            Err(MediaTypeError::NoExtension("audio/x-made-up".to_string()))
        );
    }

    #[test]
    fn test_audio_substring_anywhere_counts() {
        // Matching is a substring test, so the kind is audio even though the
        // registry has no extension for it.
        assert_eq!(
            MediaKind::from_content_type("application/x-audio-thing"),
            MediaKind::Audio
        );
        assert!(matches!(
            resolver().resolve("application/x-audio-thing"),
            Err(MediaTypeError::NoExtension(_))
        ));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(MediaKind::Audio.as_str(), "audio");
        assert_eq!(MediaKind::Unsupported.to_string(), "unsupported");
    }
}
