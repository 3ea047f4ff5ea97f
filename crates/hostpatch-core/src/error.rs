//! Error types for the hostpatch system
//!
//! This module defines all error types used throughout the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hostpatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the hostpatch system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Address discovery errors (non-fatal, the target is skipped)
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Version control errors
    #[error("Version control error: {0}")]
    Vcs(String),

    /// Liveness probe setup errors
    #[error("Probe error: {0}")]
    Probe(String),

    /// I/O failure while rewriting a target file (fatal to the run)
    #[error("Failed to rewrite {}: {source}", .path.display())]
    Rewrite {
        /// Target file being rewritten
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Other I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid regular expression in matching configuration
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a discovery error
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Create a version control error
    pub fn vcs(msg: impl Into<String>) -> Self {
        Self::Vcs(msg.into())
    }

    /// Create a probe error
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Create a rewrite error for the given target file
    pub fn rewrite(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Rewrite {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must abort the whole run
    ///
    /// Discovery errors only skip the affected target.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Discovery(_))
    }
}
