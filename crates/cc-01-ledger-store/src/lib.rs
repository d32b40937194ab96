//! # cc-01-ledger-store
//!
//! Versioned, indexed object store underlying all chain state.
//!
//! ## Model
//!
//! - Each record type implements [`Object`] and lives in its own typed
//!   [`Index`], keyed by a sequential [`Id`] and by any number of declared
//!   secondary keys ([`IndexSpec`]). Unique keys are enforced on every
//!   `create` and `modify`.
//! - Indexes are registered on the [`LedgerStore`] at runtime
//!   ([`LedgerStore::register_index`]); core chain objects and
//!   collaborator-owned objects use the same path and the same undo rules.
//!
//! ## Undo Sessions
//!
//! ```text
//!  revision:     1            2             3 (open)
//!            [ block 1 ] [ block 2 ]  [ pending txs ]
//!                 kept        kept        session
//! ```
//!
//! - `begin_session` opens a nested checkpoint; `rollback` undoes it,
//!   `merge` folds it into its parent, `keep` leaves it on the undo stack as
//!   a revision that `undo` can later reverse.
//! - Sessions close strictly LIFO. Closing anything but the innermost open
//!   session is [`LedgerError::SessionOrder`].
//! - `commit(revision)` forgets undo history up to `revision`.
//! - Writes made while no session is open are permanent.
//!
//! ## Capacity
//!
//! Object count is monitored against [`StoreConfig`]: a soft threshold yields
//! an advisory [`CapacityStatus`], the hard limit refuses new records.

pub mod capacity;
pub mod domain;
pub mod index;
pub mod session;
pub mod store;

pub use capacity::{CapacityMonitor, CapacityStatus};
pub use domain::{
    Id, IndexKey, IndexSpec, KeyPart, LedgerError, LedgerResult, Object, StoreConfig,
};
pub use index::Index;
pub use session::Session;
pub use store::{IndexHandle, LedgerStore, SessionId};
