//! Bootstrap configuration loading
//!
//! Configuration is read once at startup from a TOML file. Resolution order:
//! 1. Explicit path (command-line argument or `AQT_CONFIG`)
//! 2. Per-user config file (`~/.config/aqt/config.toml`)
//! 3. System config file (`/etc/aqt/config.toml`, Linux only)
//! 4. Compiled defaults
//!
//! A missing or broken discovered config file is not an error: the compiled
//! defaults are used and the caller logs the [`ConfigSource`] once tracing is
//! initialised. An explicitly requested file must exist and parse.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the staging subdirectory created under the system temp directory
pub const DEFAULT_STAGING_SUBDIR: &str = "file";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP host port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the HTTP host binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Directory used for staged payload files.
    ///
    /// Defaults to `<system temp>/file` when not set.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// External classification engine
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Extra content-type to extension entries merged into the registry
    #[serde(default)]
    pub media_types: BTreeMap<String, String>,
}

/// Classification engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Engine executable (looked up in PATH when not absolute)
    #[serde(default = "default_classifier_command")]
    pub command: String,

    /// Arguments placed before the file path and media kind
    #[serde(default)]
    pub args: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_port() -> u16 {
    5790
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_classifier_command() -> String {
    "detect-audio-tags".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            command: default_classifier_command(),
            args: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            staging_dir: None,
            classifier: ClassifierConfig::default(),
            logging: LoggingConfig::default(),
            media_types: BTreeMap::new(),
        }
    }
}

impl TomlConfig {
    /// Effective staging directory
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_STAGING_SUBDIR))
    }
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Path given on the command line or via `AQT_CONFIG`
    Explicit(PathBuf),
    /// Per-user or system config file
    Discovered(PathBuf),
    /// No config file found
    Defaults,
    /// A discovered config file failed to load; defaults used instead
    Degraded { path: PathBuf, reason: String },
}

/// Configuration plus its origin, reported once logging is up
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

/// Resolve the bootstrap configuration
///
/// `explicit` is the path given on the command line (or via `AQT_CONFIG`);
/// when present it must load successfully.
pub fn resolve_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    if let Some(path) = explicit {
        return Ok(ResolvedConfig {
            config: load_toml_config(path)?,
            source: ConfigSource::Explicit(path.to_path_buf()),
        });
    }

    let Some(path) = default_config_path() else {
        return Ok(ResolvedConfig {
            config: TomlConfig::default(),
            source: ConfigSource::Defaults,
        });
    };

    let resolved = match load_toml_config(&path) {
        Ok(config) => ResolvedConfig {
            config,
            source: ConfigSource::Discovered(path),
        },
        Err(e) => ResolvedConfig {
            config: TomlConfig::default(),
            source: ConfigSource::Degraded {
                path,
                reason: e.to_string(),
            },
        },
    };

    Ok(resolved)
}

/// First existing config file among the platform locations
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("aqt").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/aqt/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
