//! Cryptographic primitives for result signing
//!
//! Members sign the 32-byte [`ResultHash`] directly as an ECDSA prehash over
//! secp256k1. Signing draws fresh randomness on every call, so two signatures
//! by the same key over the same hash are expected to differ.

use k256::{
    ecdsa::{
        signature::hazmat::{PrehashVerifier, RandomizedPrehashSigner},
        Signature as K256Signature, SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{CoreError, Result};
use crate::types::{hex_bytes_33, ResultHash, Signature};
use crate::PUBLIC_KEY_SIZE;

/// Compressed secp256k1 public key (33 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "hex_bytes_33")] pub [u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Create a new PublicKey from compressed bytes
    pub fn new(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse and validate a SEC1-encoded point (compressed or uncompressed)
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        let key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| CoreError::InvalidPublicKey(e.to_string()))?;
        Ok(Self::from(&key))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = [0u8; PUBLIC_KEY_SIZE];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Verify a signature over a result hash against this public key
    ///
    /// Returns `false` for an undecodable key, undecodable signature bytes
    /// or a signature that does not verify. Never errors.
    pub fn verify(&self, hash: &ResultHash, signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(&self.0) else {
            return false;
        };
        let Ok(sig) = K256Signature::from_slice(signature.as_bytes()) else {
            return false;
        };

        verifying_key.verify_prehash(hash.as_bytes(), &sig).is_ok()
    }
}

impl From<&VerifyingKey> for PublicKey {
    fn from(key: &VerifyingKey) -> Self {
        let encoded = key.as_affine().to_encoded_point(true);
        let mut bytes = [0u8; PUBLIC_KEY_SIZE];
        bytes.copy_from_slice(encoded.as_bytes());
        Self(bytes)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A member's signing key pair
///
/// The secret scalar is zeroized when the key pair is dropped.
#[derive(Clone)]
pub struct MemberKeyPair {
    signing_key: SigningKey,
    public_key: PublicKey,
}

impl std::fmt::Debug for MemberKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberKeyPair")
            .field("signing_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl MemberKeyPair {
    /// Generate a fresh key pair
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_signing_key(SigningKey::random(rng))
    }

    /// Restore a key pair from a 32-byte secret scalar
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|e| CoreError::InvalidSecretKey(e.to_string()))?;
        Ok(Self::from_signing_key(signing_key))
    }

    /// Restore a key pair from a hex-encoded secret scalar
    pub fn from_secret_hex(s: &str) -> Result<Self> {
        let bytes = Zeroizing::new(hex::decode(s.trim())?);
        Self::from_secret_bytes(&bytes)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey::from(signing_key.verifying_key());
        Self {
            signing_key,
            public_key,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Sign a result hash with fresh randomness
    pub fn sign(&self, hash: &ResultHash) -> Result<Signature> {
        self.sign_with_rng(&mut OsRng, hash)
    }

    /// Sign a result hash, mixing entropy from the given RNG into the nonce
    pub fn sign_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        hash: &ResultHash,
    ) -> Result<Signature> {
        let sig: K256Signature = self
            .signing_key
            .sign_prehash_with_rng(rng, hash.as_bytes())
            .map_err(|e| CoreError::Signing(e.to_string()))?;

        Ok(Signature::new(sig.to_bytes().to_vec()))
    }
}
