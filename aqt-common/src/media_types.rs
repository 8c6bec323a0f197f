//! Content-type to file extension registry
//!
//! The registry is assembled once at startup by [`MediaTypeRegistryBuilder`]
//! and is read-only afterwards. It is shared between concurrent requests
//! behind an `Arc`.
//!
//! Layering (later layers override earlier ones):
//! 1. System `mime.types` table, when one is merged in
//! 2. Built-in table of common types
//! 3. Guaranteed audio entries (`audio/mp3`, `audio/wav`)
//! 4. Entries from configuration

use crate::{Error, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Location of the system mime table on Unix-like systems
pub const SYSTEM_MIME_TYPES_PATH: &str = "/etc/mime.types";

/// Built-in content-type table (first extension wins for each type)
const BUILTIN_TYPES: &[(&str, &str)] = &[
    ("audio/aac", ".aac"),
    ("audio/basic", ".au"),
    ("audio/flac", ".flac"),
    ("audio/midi", ".mid"),
    ("audio/mp4", ".m4a"),
    ("audio/mpeg", ".mp3"),
    ("audio/ogg", ".ogg"),
    ("audio/opus", ".opus"),
    ("audio/webm", ".weba"),
    ("audio/x-aiff", ".aif"),
    ("audio/x-flac", ".flac"),
    ("audio/x-m4a", ".m4a"),
    ("audio/x-pn-realaudio", ".ra"),
    ("audio/x-wav", ".wav"),
    ("application/json", ".json"),
    ("application/octet-stream", ".bin"),
    ("application/pdf", ".pdf"),
    ("image/gif", ".gif"),
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("text/plain", ".txt"),
    ("video/mp4", ".mp4"),
];

/// Entries that must resolve even where a platform table lacks them
const GUARANTEED_AUDIO_TYPES: &[(&str, &str)] = &[("audio/mp3", ".mp3"), ("audio/wav", ".wav")];

/// Immutable content-type to extension mapping
#[derive(Debug, Clone)]
pub struct MediaTypeRegistry {
    extensions: BTreeMap<String, String>,
}

impl MediaTypeRegistry {
    /// Start assembling a registry
    pub fn builder() -> MediaTypeRegistryBuilder {
        MediaTypeRegistryBuilder::default()
    }

    /// Registry with the built-in table and guaranteed audio entries only
    pub fn with_defaults() -> Self {
        Self::builder().with_builtin_types().build()
    }

    /// Extension (with leading dot) for a content type
    ///
    /// Lookup is case-insensitive on the content type.
    pub fn extension_for(&self, content_type: &str) -> Option<&str> {
        self.extensions
            .get(&content_type.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    /// First content type (alphabetically) that maps to `extension`
    pub fn content_type_for_extension(&self, extension: &str) -> Option<&str> {
        let wanted = normalize_extension(extension);
        self.extensions
            .iter()
            .find(|(_, ext)| **ext == wanted)
            .map(|(content_type, _)| content_type.as_str())
    }

    /// Number of registered content types
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for MediaTypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Builder for [`MediaTypeRegistry`]
#[derive(Debug, Default)]
pub struct MediaTypeRegistryBuilder {
    extensions: BTreeMap<String, String>,
}

impl MediaTypeRegistryBuilder {
    /// Merge the contents of a `mime.types`-format table
    ///
    /// Each non-comment line is `type ext1 ext2 ...`; the first extension is
    /// used. Types without extensions are skipped.
    pub fn merge_mime_types(mut self, content: &str) -> Self {
        let mut merged = 0usize;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default();
            let mut fields = line.split_whitespace();
            let (Some(content_type), Some(extension)) = (fields.next(), fields.next()) else {
                continue;
            };
            self.extensions.insert(
                content_type.to_ascii_lowercase(),
                normalize_extension(extension),
            );
            merged += 1;
        }

        debug!(entries = merged, "Merged mime types table");
        self
    }

    /// Add the built-in table and the guaranteed audio entries
    pub fn with_builtin_types(mut self) -> Self {
        for (content_type, extension) in BUILTIN_TYPES.iter().chain(GUARANTEED_AUDIO_TYPES) {
            self.extensions
                .insert((*content_type).to_string(), (*extension).to_string());
        }
        self
    }

    /// Add a single entry, overriding any existing mapping
    pub fn insert(mut self, content_type: &str, extension: &str) -> Result<Self> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if content_type.is_empty() || !content_type.contains('/') {
            return Err(Error::InvalidInput(format!(
                "Invalid content type in media type table: '{}'",
                content_type
            )));
        }

        let extension = normalize_extension(extension);
        if extension.len() < 2 || extension.contains(|c| c == '/' || c == '\\') {
            return Err(Error::InvalidInput(format!(
                "Invalid extension for {}: '{}'",
                content_type, extension
            )));
        }

        self.extensions.insert(content_type, extension);
        Ok(self)
    }

    /// Add entries from configuration
    pub fn with_entries<'a, I>(self, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        entries
            .into_iter()
            .try_fold(self, |builder, (content_type, extension)| {
                builder.insert(content_type, extension)
            })
    }

    pub fn build(self) -> MediaTypeRegistry {
        MediaTypeRegistry {
            extensions: self.extensions,
        }
    }
}

/// Lower-case an extension and make sure it carries a leading dot
fn normalize_extension(extension: &str) -> String {
    let extension = extension.trim().to_ascii_lowercase();
    if extension.starts_with('.') {
        extension
    } else {
        format!(".{}", extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guaranteed_audio_entries() {
        let registry = MediaTypeRegistry::with_defaults();
        assert_eq!(registry.extension_for("audio/mp3"), Some(".mp3"));
        assert_eq!(registry.extension_for("audio/wav"), Some(".wav"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = MediaTypeRegistry::with_defaults();
        assert_eq!(registry.extension_for("Audio/MPEG"), Some(".mp3"));
        assert_eq!(registry.extension_for(" audio/x-wav "), Some(".wav"));
    }

    #[test]
    fn test_unknown_type() {
        let registry = MediaTypeRegistry::with_defaults();
        assert_eq!(registry.extension_for("audio/x-unknown"), None);
        assert_eq!(registry.extension_for("audio/wav; codecs=1"), None);
    }

    #[test]
    fn test_reverse_lookup() {
        let registry = MediaTypeRegistry::with_defaults();
        assert_eq!(registry.content_type_for_extension("png"), Some("image/png"));
        // audio/mp3 sorts before audio/mpeg
        assert_eq!(registry.content_type_for_extension(".MP3"), Some("audio/mp3"));
        assert_eq!(registry.content_type_for_extension(".nope"), None);
    }

    #[test]
    fn test_config_entries_override_builtin() {
        let mut extra = BTreeMap::new();
        extra.insert("Audio/X-Custom".to_string(), "XC".to_string());
        extra.insert("audio/wav".to_string(), ".wave".to_string());

        let registry = MediaTypeRegistry::builder()
            .with_builtin_types()
            .with_entries(&extra)
            .unwrap()
            .build();

        assert_eq!(registry.extension_for("audio/x-custom"), Some(".xc"));
        assert_eq!(registry.extension_for("audio/wav"), Some(".wave"));
    }

    #[test]
    fn test_insert_rejects_invalid_entries() {
        assert!(MediaTypeRegistry::builder().insert("audio", ".mp3").is_err());
        assert!(MediaTypeRegistry::builder().insert("audio/mp3", "").is_err());
        assert!(MediaTypeRegistry::builder()
            .insert("audio/mp3", "../mp3")
            .is_err());
    }

    #[test]
    fn test_merge_mime_types() {
        let table = "# comment line\n\
                     audio/x-matroska\tmka\n\
                     audio/ogg oga ogg spx   # trailing comment\n\
                     application/x-no-extension\n";

        let registry = MediaTypeRegistry::builder().merge_mime_types(table).build();

        assert_eq!(registry.extension_for("audio/x-matroska"), Some(".mka"));
        assert_eq!(registry.extension_for("audio/ogg"), Some(".oga"));
        assert_eq!(registry.extension_for("application/x-no-extension"), None);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_builtin_overrides_system_table() {
        let registry = MediaTypeRegistry::builder()
            .merge_mime_types("audio/mpeg mpga mp2 mp3\n")
            .with_builtin_types()
            .build();

        assert_eq!(registry.extension_for("audio/mpeg"), Some(".mp3"));
    }
}
