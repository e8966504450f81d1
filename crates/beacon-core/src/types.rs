//! Core newtypes shared by every participant of a DKG run

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};
use crate::RESULT_HASH_SIZE;

/// Index of a member within a group (1-based)
///
/// Assigned at group formation and stable for the duration of one DKG run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, bitcode::Encode,
)]
#[serde(try_from = "u16", into = "u16")]
pub struct ParticipantIndex(u16);

impl ParticipantIndex {
    /// Create a new index, rejecting zero
    pub fn new(value: u16) -> Result<Self> {
        if value == 0 {
            return Err(CoreError::InvalidParticipantIndex(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u16 {
        self.0
    }

    /// Iterate over all indices of a group of the given size
    pub fn all(group_size: u16) -> impl Iterator<Item = ParticipantIndex> {
        (1..=group_size).map(ParticipantIndex)
    }
}

impl TryFrom<u16> for ParticipantIndex {
    type Error = CoreError;

    fn try_from(value: u16) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ParticipantIndex> for u16 {
    fn from(index: ParticipantIndex) -> Self {
        index.0
    }
}

impl fmt::Display for ParticipantIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Digest of a canonicalized DKG result (32 bytes)
///
/// This is what members sign, never the raw result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResultHash(#[serde(with = "hex_bytes_32")] pub [u8; RESULT_HASH_SIZE]);

impl ResultHash {
    pub fn new(bytes: [u8; RESULT_HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; RESULT_HASH_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = [0u8; RESULT_HASH_SIZE];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Short display format (first 4 bytes as hex)
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl AsRef<[u8]> for ResultHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ResultHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Opaque signature bytes over a [`ResultHash`]
///
/// Length is not validated here: a malformed signature received from a peer
/// must still be representable so it can be classified or kept as evidence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Ok(Self(hex::decode(s)?))
    }
}

impl From<Vec<u8>> for Signature {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(Self).map_err(serde::de::Error::custom)
    }
}

/// Candidate result of a DKG run
///
/// Produced by the key generation protocol; the signing phase only ever
/// hashes it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, bitcode::Encode)]
pub struct DkgResult {
    /// Group public key the members derived
    #[serde(with = "hex_vec")]
    pub group_public_key: Vec<u8>,
    /// Members disqualified or inactive during key generation
    pub misbehaved: Vec<ParticipantIndex>,
}

impl DkgResult {
    pub fn new(group_public_key: Vec<u8>, misbehaved: Vec<ParticipantIndex>) -> Self {
        Self {
            group_public_key,
            misbehaved,
        }
    }
}

/// Serde helper for 32-byte arrays as hex strings
pub mod hex_bytes_32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&s, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(bytes)
    }
}

/// Serde helper for 33-byte arrays as hex strings
pub mod hex_bytes_33 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 33], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 33], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut bytes = [0u8; 33];
        hex::decode_to_slice(&s, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(bytes)
    }
}

/// Serde helper for variable-length byte vectors as hex strings
pub mod hex_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}
