//! Stored object trait, typed ids and index declarations.

use crate::domain::key::IndexKey;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A record stored in the ledger.
pub trait Object: Clone + fmt::Debug + Send + Sync + 'static {
    /// Name used in errors and logs.
    const TYPE_NAME: &'static str;

    /// The id assigned at creation.
    fn id(&self) -> Id<Self>;

    /// Secondary indexes maintained for this type.
    fn indexes() -> Vec<IndexSpec<Self>> {
        Vec::new()
    }
}

/// Declares one secondary index.
pub struct IndexSpec<T> {
    pub name: &'static str,
    pub unique: bool,
    pub key: fn(&T) -> IndexKey,
}

impl<T> IndexSpec<T> {
    pub fn unique(name: &'static str, key: fn(&T) -> IndexKey) -> Self {
        Self {
            name,
            unique: true,
            key,
        }
    }

    pub fn non_unique(name: &'static str, key: fn(&T) -> IndexKey) -> Self {
        Self {
            name,
            unique: false,
            key,
        }
    }
}

/// Typed object id. Ids are allocated sequentially per index.
pub struct Id<T> {
    raw: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub const fn new(raw: u64) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    pub const fn raw(&self) -> u64 {
        self.raw
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.raw)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
