//! jukeq-ui specific error types

use thiserror::Error;

/// Result type for UI operations
pub type Result<T> = std::result::Result<T, UiError>;

/// Errors surfaced by the UI client
#[derive(Error, Debug)]
pub enum UiError {
    /// HTTP request error (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Push-channel error (wraps tungstenite::Error)
    #[error("Event channel error: {0}")]
    EventChannel(#[from] tokio_tungstenite::tungstenite::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON from the server
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Shared error from jukeq-common
    #[error(transparent)]
    Common(#[from] jukeq_common::Error),

    /// Unexpected response body (status ok, payload unusable)
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}
