//! Wire-level message exchanged between members

use serde::{Deserialize, Serialize};

use beacon_core::{ParticipantIndex, ResultHash, Signature};

/// A member's signature over the hash of the result it prefers
///
/// Immutable once built; transport may duplicate or reorder it freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DkgResultHashSignatureMessage {
    sender_index: ParticipantIndex,
    result_hash: ResultHash,
    signature: Signature,
}

impl DkgResultHashSignatureMessage {
    pub fn new(sender_index: ParticipantIndex, result_hash: ResultHash, signature: Signature) -> Self {
        Self {
            sender_index,
            result_hash,
            signature,
        }
    }

    pub fn sender_index(&self) -> ParticipantIndex {
        self.sender_index
    }

    pub fn result_hash(&self) -> &ResultHash {
        &self.result_hash
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}
