//! Error types for beacon core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid participant index: {0} (indices are 1-based)")]
    InvalidParticipantIndex(u16),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Result hash computation failed: {0}")]
    HashComputation(String),

    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),
}
