//! Source error types.

use thiserror::Error;

/// Errors that can occur when listing or fetching question banks.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The requested module is not served by this source.
    #[error("module not found: {0}")]
    NotFound(String),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with an error status.
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// The payload was not valid JSON.
    #[error("invalid JSON in {name}: {message}")]
    InvalidJson { name: String, message: String },

    /// A filesystem error occurred.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
