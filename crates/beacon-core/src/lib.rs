//! Beacon Core - Shared types, result hashing and cryptographic primitives
//!
//! This crate provides the foundational values exchanged during the DKG
//! result-signing phase of the beacon: participant indices, result hashes,
//! opaque signatures and the secp256k1 key material each group member signs
//! with. It also defines the [`ResultHasher`] contract the ledger fulfils.

pub mod crypto;
pub mod error;
pub mod hasher;
pub mod types;

pub use crypto::{MemberKeyPair, PublicKey};
pub use error::{CoreError, Result};
pub use hasher::{ResultHasher, Sha3ResultHasher};
pub use types::{DkgResult, ParticipantIndex, ResultHash, Signature};

/// Size of a result hash in bytes
pub const RESULT_HASH_SIZE: usize = 32;

/// Size of a compressed secp256k1 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 33;
