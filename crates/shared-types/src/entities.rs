//! # Core Domain Entities
//!
//! Identity and time primitives used by every subsystem.
//!
//! ## Clusters
//!
//! - **Chain**: `BlockId`, `TransactionId`, `ChainId`
//! - **Accounts**: `AccountName`
//! - **Time**: `TimePointSec`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Identifies one chain; signatures are bound to it.
pub type ChainId = Hash;

/// A 20-byte block id whose first four bytes carry the block number.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BlockId(pub [u8; 20]);

impl BlockId {
    /// Build a block id from a header digest and the block number.
    pub fn new(block_num: u32, digest: &Hash) -> Self {
        let mut id = [0u8; 20];
        id.copy_from_slice(&digest[..20]);
        id[..4].copy_from_slice(&block_num.to_be_bytes());
        Self(id)
    }

    /// Block number encoded in the id. The zero id is block 0.
    pub fn block_num(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// The 32 bits used as a transaction's reference-block prefix.
    pub fn ref_prefix(&self) -> u32 {
        u32::from_le_bytes([self.0[4], self.0[5], self.0[6], self.0[7]])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({}:{})", self.block_num(), hex::encode(&self.0[4..]))
    }
}

/// A 20-byte transaction id (truncated digest of the unsigned transaction).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TransactionId(pub [u8; 20]);

impl TransactionId {
    pub fn from_digest(digest: &Hash) -> Self {
        let mut id = [0u8; 20];
        id.copy_from_slice(&digest[..20]);
        Self(id)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", hex::encode(self.0))
    }
}

// =============================================================================
// CLUSTER B: ACCOUNTS
// =============================================================================

/// Minimum account name length.
pub const MIN_ACCOUNT_NAME_LENGTH: usize = 3;

/// Maximum account name length.
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 16;

/// An account name.
///
/// Construction does not validate; operations call [`AccountName::is_valid`]
/// during stateless validation so that malformed names are reported with a
/// proper validation error rather than at parse time.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountName(String);

impl AccountName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names are dot-separated segments. Each segment is at least three
    /// characters, starts with a lowercase letter, ends with a letter or digit,
    /// and contains only lowercase letters, digits and hyphens.
    pub fn is_valid(&self) -> bool {
        let name = self.0.as_str();
        if name.len() < MIN_ACCOUNT_NAME_LENGTH || name.len() > MAX_ACCOUNT_NAME_LENGTH {
            return false;
        }
        name.split('.').all(|segment| {
            let bytes = segment.as_bytes();
            if bytes.len() < MIN_ACCOUNT_NAME_LENGTH {
                return false;
            }
            let first_ok = bytes[0].is_ascii_lowercase();
            let last = bytes[bytes.len() - 1];
            let last_ok = last.is_ascii_lowercase() || last.is_ascii_digit();
            let body_ok = bytes
                .iter()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-');
            first_ok && last_ok && body_ok
        })
    }
}

impl From<&str> for AccountName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for AccountName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

// =============================================================================
// CLUSTER C: TIME
// =============================================================================

/// Chain time with one-second resolution.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimePointSec(u32);

impl TimePointSec {
    pub const MIN: TimePointSec = TimePointSec(0);
    pub const MAX: TimePointSec = TimePointSec(u32::MAX);

    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn secs(&self) -> u32 {
        self.0
    }

    /// Signed distance `self - earlier` in seconds.
    pub fn seconds_since(&self, earlier: TimePointSec) -> i64 {
        i64::from(self.0) - i64::from(earlier.0)
    }
}

impl Add<u32> for TimePointSec {
    type Output = TimePointSec;

    fn add(self, rhs: u32) -> Self::Output {
        TimePointSec(self.0.saturating_add(rhs))
    }
}

impl Sub<u32> for TimePointSec {
    type Output = TimePointSec;

    fn sub(self, rhs: u32) -> Self::Output {
        TimePointSec(self.0.saturating_sub(rhs))
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
