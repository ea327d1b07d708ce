//! Error Types

use thiserror::Error;

use crate::llm::TransportFailure;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Generation backend unreachable or too slow
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportFailure),

    /// Tool executor failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Model output not decodable as the expected structure
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error (missing key, bad value)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}
