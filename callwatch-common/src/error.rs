//! Common error types for callwatch

use thiserror::Error;

/// Common result type for callwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the callwatch crates
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request error (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport error (wraps tungstenite::Error)
    #[error("Transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON parse error (wraps serde_json::Error)
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Outbound command rejected by the orchestrator
    #[error("Command rejected ({status}): {body}")]
    CommandRejected { status: u16, body: String },
}
