//! Error types for result signing

use beacon_core::{CoreError, ParticipantIndex, ResultHash};
use thiserror::Error;

/// Result type for result signing operations
pub type Result<T> = std::result::Result<T, ResultSigningError>;

/// Local failures of the result signing phase
///
/// Peer misbehavior is never reported through this type; see
/// [`crate::Accusations`].
#[derive(Debug, Error)]
pub enum ResultSigningError {
    /// The candidate result could not be hashed
    #[error("Result hash computation failed: {0}")]
    HashComputation(#[source] CoreError),

    /// The signature primitive failed
    #[error("Signing failed: {0}")]
    Signing(#[source] CoreError),

    /// A result was already signed during this run
    #[error("Member {index} already signed result {preferred} in this run")]
    AlreadySigned {
        index: ParticipantIndex,
        preferred: ResultHash,
    },

    /// Verification was requested before signing a result
    #[error("Member {0} has not signed a result yet")]
    NotSigned(ParticipantIndex),

    /// Roster is inconsistent with the member's own identity
    #[error("Invalid roster: {0}")]
    InvalidRoster(String),
}
