//! Error types for the application

use thiserror::Error;

/// Result type alias using our ScalperError
pub type Result<T> = std::result::Result<T, ScalperError>;

/// Main error type for feed, engine and execution operations
#[derive(Error, Debug)]
pub enum ScalperError {
    /// WebSocket connection errors
    #[error("WebSocket connection error: {0}")]
    WebSocketConnection(String),

    /// WebSocket send/receive errors
    #[error("WebSocket communication error: {0}")]
    WebSocketCommunication(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed market data rejected at the engine boundary
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Execution adapter failures (click, order placement, element lookup)
    #[error("Execution error: {0}")]
    Execution(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for ScalperError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ScalperError::WebSocketCommunication(err.to_string())
    }
}

impl From<url::ParseError> for ScalperError {
    fn from(err: url::ParseError) -> Self {
        ScalperError::Configuration(format!("invalid URL: {}", err))
    }
}
