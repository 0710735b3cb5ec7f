//! Error types for gridstream operations.
//!
//! Every fallible operation in the crate returns [`Result`]. Transport and
//! decode failures surface as typed variants instead of panics; in-stream
//! message failures are logged and skipped by the listener rather than
//! tearing the connection down.

use thiserror::Error;

/// Errors that can occur while fetching, listening for, or decoding
/// tabular task results.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured endpoint is not a valid URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// A dataset name that cannot appear in a URL path segment.
    #[error("invalid dataset name: {name:?}")]
    InvalidDatasetName {
        /// The rejected name.
        name: String,
    },

    /// HTTP transport failure, including non-success status codes.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport failure while connecting or reading.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A response body that is not valid JSON or lacks a required field.
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// A row whose column set diverges from the first row's.
    #[error("row {index} does not match the table schema (expected columns {expected:?})")]
    SchemaMismatch {
        /// Zero-based index of the offending row.
        index: usize,
        /// The column set declared by the first row.
        expected: Vec<String>,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
