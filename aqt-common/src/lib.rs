//! # AQT Common Library
//!
//! Shared code for the audio query tagging service:
//! - Error types
//! - Bootstrap configuration loading (TOML)
//! - Content-type to file extension registry

pub mod config;
pub mod error;
pub mod media_types;

pub use error::{Error, Result};
pub use media_types::MediaTypeRegistry;
