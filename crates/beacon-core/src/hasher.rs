//! Result hashing contract
//!
//! The ledger owns the canonical encoding of a [`DkgResult`]; members only
//! need a deterministic mapping from result to [`ResultHash`], injected at
//! construction.

use std::sync::Arc;

use sha3::{Digest, Sha3_256};

use crate::error::Result;
use crate::types::{DkgResult, ResultHash};

/// Deterministic mapping from a candidate result to the digest members sign
pub trait ResultHasher {
    /// Hash the canonical content of `result`
    ///
    /// Identical content must always produce an identical hash, regardless
    /// of the caller.
    fn calculate_result_hash(&self, result: &DkgResult) -> Result<ResultHash>;
}

impl<T: ResultHasher + ?Sized> ResultHasher for Arc<T> {
    fn calculate_result_hash(&self, result: &DkgResult) -> Result<ResultHash> {
        (**self).calculate_result_hash(result)
    }
}

impl<T: ResultHasher + ?Sized> ResultHasher for &T {
    fn calculate_result_hash(&self, result: &DkgResult) -> Result<ResultHash> {
        (**self).calculate_result_hash(result)
    }
}

/// SHA3-256 over the bitcode encoding of the result
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha3ResultHasher;

impl ResultHasher for Sha3ResultHasher {
    fn calculate_result_hash(&self, result: &DkgResult) -> Result<ResultHash> {
        let encoded = bitcode::encode(result);
        Ok(ResultHash::new(sha3_256(&encoded)))
    }
}

/// Hash data using SHA3-256
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}
