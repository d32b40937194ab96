//! Composite secondary-index keys.

use crate::domain::object::Id;
use shared_types::{AccountName, TimePointSec};
use std::fmt;

/// One component of a composite key. Components compare in declaration
/// order of the variants first, then by value, so keys of one index should
/// always use the same component kinds in the same positions.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum KeyPart {
    Bool(bool),
    U64(u64),
    I64(i64),
    U128(u128),
    Str(String),
    Bytes(Vec<u8>),
}

impl From<bool> for KeyPart {
    fn from(v: bool) -> Self {
        KeyPart::Bool(v)
    }
}

impl From<u64> for KeyPart {
    fn from(v: u64) -> Self {
        KeyPart::U64(v)
    }
}

impl From<u32> for KeyPart {
    fn from(v: u32) -> Self {
        KeyPart::U64(u64::from(v))
    }
}

impl From<u16> for KeyPart {
    fn from(v: u16) -> Self {
        KeyPart::U64(u64::from(v))
    }
}

impl From<i64> for KeyPart {
    fn from(v: i64) -> Self {
        KeyPart::I64(v)
    }
}

impl From<u128> for KeyPart {
    fn from(v: u128) -> Self {
        KeyPart::U128(v)
    }
}

impl From<&str> for KeyPart {
    fn from(v: &str) -> Self {
        KeyPart::Str(v.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(v: String) -> Self {
        KeyPart::Str(v)
    }
}

impl From<&String> for KeyPart {
    fn from(v: &String) -> Self {
        KeyPart::Str(v.clone())
    }
}

impl From<&AccountName> for KeyPart {
    fn from(v: &AccountName) -> Self {
        KeyPart::Str(v.as_str().to_string())
    }
}

impl From<TimePointSec> for KeyPart {
    fn from(v: TimePointSec) -> Self {
        KeyPart::U64(u64::from(v.secs()))
    }
}

impl<T> From<Id<T>> for KeyPart {
    fn from(v: Id<T>) -> Self {
        KeyPart::U64(v.raw())
    }
}

impl From<&[u8]> for KeyPart {
    fn from(v: &[u8]) -> Self {
        KeyPart::Bytes(v.to_vec())
    }
}

/// An ordered composite key. Lexicographic over its parts, so a prefix sorts
/// before all of its extensions.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IndexKey(pub Vec<KeyPart>);

impl IndexKey {
    pub fn starts_with(&self, prefix: &IndexKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl fmt::Debug for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Build an [`IndexKey`] from values convertible into [`KeyPart`].
///
/// ```rust,ignore
/// let key = index_key!(&author, permlink.as_str());
/// ```
#[macro_export]
macro_rules! index_key {
    ($($part:expr),* $(,)?) => {
        $crate::IndexKey(vec![$($crate::KeyPart::from($part)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_sorts_first() {
        let prefix = crate::index_key!("alice");
        let full = crate::index_key!("alice", 5u64);
        let other = crate::index_key!("bob", 0u64);
        assert!(prefix < full);
        assert!(full < other);
        assert!(full.starts_with(&prefix));
        assert!(!other.starts_with(&prefix));
    }
}
