//! # ECDSA Signatures (secp256k1)
//!
//! Compact recoverable signatures over 32-byte digests.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization
//! - The signer's public key is recovered from the signature itself, so
//!   transactions carry signatures only
//!
//! ## Encoding
//!
//! - Public key: 33-byte SEC1 compressed point
//! - Signature: 65 bytes, `[recovery_id | r (32) | s (32)]`

use crate::hashing::{sha256, Hash};
use crate::CryptoError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;
use zeroize::Zeroize;

/// Compressed secp256k1 public key (33 bytes).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicKey(#[serde_as(as = "Bytes")] [u8; 33]);

impl PublicKey {
    /// Create from compressed bytes (33 bytes, starting with 0x02 or 0x03).
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, CryptoError> {
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// The all-zero key. Witnesses with this signing key cannot produce.
    pub const fn null() -> Self {
        Self([0u8; 33])
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 33]
    }

    /// Get raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Recover the key that produced `signature` over `digest`.
    pub fn recover(digest: &Hash, signature: &CompactSignature) -> Result<Self, CryptoError> {
        let recovery_id =
            RecoveryId::from_byte(signature.0[0]).ok_or(CryptoError::InvalidSignatureFormat)?;
        let sig = Signature::from_slice(&signature.0[1..])
            .map_err(|_| CryptoError::InvalidSignatureFormat)?;
        let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
            .map_err(|_| CryptoError::RecoveryFailed)?;
        Self::from_verifying_key(&key)
    }

    fn from_verifying_key(key: &VerifyingKey) -> Result<Self, CryptoError> {
        let point = key.to_encoded_point(true);
        let bytes: [u8; 33] = point
            .as_bytes()
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CDR{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0[..8]))
    }
}

/// Recoverable ECDSA signature (65 bytes).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompactSignature(#[serde_as(as = "Bytes")] [u8; 65]);

impl CompactSignature {
    pub fn from_bytes(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }
}

impl Default for CompactSignature {
    fn default() -> Self {
        Self([0u8; 65])
    }
}

impl fmt::Debug for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactSignature({})", hex::encode(&self.0[..9]))
    }
}

/// secp256k1 private key.
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Generate a random key.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Derive a key from a seed phrase: the secret is `sha256(seed)`.
    pub fn from_seed(seed: &str) -> Result<Self, CryptoError> {
        let mut secret = sha256(seed.as_bytes());
        let key = Self::from_bytes(secret);
        secret.zeroize();
        key
    }

    /// Get public key (compressed, 33 bytes).
    pub fn public_key(&self) -> Result<PublicKey, CryptoError> {
        PublicKey::from_verifying_key(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte digest (deterministic RFC 6979).
    pub fn sign_compact(&self, digest: &Hash) -> Result<CompactSignature, CryptoError> {
        let (sig, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let mut bytes = [0u8; 65];
        bytes[0] = recovery_id.to_byte();
        bytes[1..].copy_from_slice(&sig.to_bytes());
        Ok(CompactSignature(bytes))
    }

    /// Get secret key bytes (for serialization).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        // Zeroize secret key material
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}
