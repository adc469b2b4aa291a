//! Error types for Dockerfile generation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for a generation run.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing credential or unusable configuration.
    #[error("{0}")]
    Configuration(String),

    /// The language name was empty after trimming.
    #[error("Programming language cannot be empty.")]
    EmptyLanguage,

    /// The backend failed to produce a Dockerfile.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The Dockerfile could not be written.
    #[error("Error saving Dockerfile to '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure reported by (or while reaching) an LLM backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The transport could not reach the service.
    #[error("Failed to connect to {backend}: {source}")]
    Unavailable {
        backend: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{backend} request failed with status {status}: {message}")]
    Api {
        backend: &'static str,
        status: u16,
        message: String,
    },

    /// The service answered but returned no candidate or message content.
    #[error("Empty response from {backend}{}", reason_suffix(.reason))]
    EmptyResponse {
        backend: &'static str,
        reason: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("Failed to parse {backend} response: {source}")]
    MalformedResponse {
        backend: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_ref().map(|r| format!(" ({})", r)).unwrap_or_default()
}
