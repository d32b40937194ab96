//! # Shared Crypto - Cryptographic Primitives
//!
//! The chain treats cryptography as a black box with two contracts:
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Transaction/block digests, ids, merkle roots |
//! | `ecdsa` | secp256k1 (compact, recoverable) | Transaction and block signatures |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S signatures, public
//!   key recovery from the 65-byte compact form
//! - **Private keys** are zeroized on drop

#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{CompactSignature, PrivateKey, PublicKey};
pub use errors::CryptoError;
pub use hashing::{sha256, Sha256Writer};
