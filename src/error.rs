//! Error handling for the Huawei backend plugin.
//!
//! Every fallible operation in the library returns [`BackendError`]. The
//! binary wraps these with `anyhow` context at the edges.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the plugin
#[derive(Error, Debug)]
pub enum BackendError {
    /// Mandatory configuration keys are absent or empty
    #[error("Missing option(s): {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    /// `protocol` is absent or not one of the supported values
    #[error("Unsupported protocol: {}", .0.as_deref().unwrap_or("<unset>"))]
    UnsupportedProtocol(Option<String>),

    /// The per-application configuration directory could not be created
    #[error("Failed to create directory {path:?}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing, syncing, renaming or chmod-ing the rendered file failed
    #[error("Failed to render {path:?}: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The service account is unknown or chown failed
    #[error("Failed to set owner of {path:?}: {reason}")]
    Ownership { path: PathBuf, reason: String },

    /// Template syntax or field lookup errors
    #[error("Template error: {0}")]
    Template(String),

    /// Malformed operator configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors not tied to a specific output path
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for plugin operations
pub type Result<T> = std::result::Result<T, BackendError>;

impl BackendError {
    /// Create a validation error from the list of missing keys
    pub fn validation<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Validation {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an ownership error
    pub fn ownership(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Ownership {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors the lifecycle reports as Blocked rather than failed
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
