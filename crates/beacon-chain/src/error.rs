//! Error types for the local chain

use thiserror::Error;

/// Result type alias for chain operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Errors returned by the local chain
#[derive(Debug, Error)]
pub enum ChainError {
    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] beacon_core::CoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Too few supporting signatures for the honest threshold
    #[error("Failed to submit result with [{got}] signatures for honest threshold [{threshold}]")]
    InsufficientSignatures { got: usize, threshold: usize },

    /// Submitter is not a member of the group
    #[error("Submitter index {index} is outside the group of size {group_size}")]
    UnknownSubmitter { index: u16, group_size: u16 },
}

impl From<serde_json::Error> for ChainError {
    fn from(e: serde_json::Error) -> Self {
        ChainError::Serialization(e.to_string())
    }
}
