//! Error types for harness operations

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::session::Locator;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// The locator matched no displayed element within the wait window.
    #[error("Element not found: {locator} (waited {:.1}s)", timeout.as_secs_f64())]
    ElementNotFound { locator: Locator, timeout: Duration },

    /// Indexed or random selection over a result set that cannot satisfy it.
    #[error("No matching element for {locator}: {detail}")]
    NoMatch { locator: Locator, detail: String },

    /// Device bridge output lacked the expected line or field.
    #[error("Device query '{query}' failed: {detail}")]
    DeviceQuery { query: String, detail: String },

    /// The automation backend rejected or failed an action.
    #[error("Backend operation '{operation}' failed: {message}")]
    BackendOperation { operation: String, message: String },

    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("Cannot open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Command timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}

impl HarnessError {
    pub(crate) fn device_query(query: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::DeviceQuery {
            query: query.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
