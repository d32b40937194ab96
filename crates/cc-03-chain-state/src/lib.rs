//! # cc-03-chain-state
//!
//! The chain's objects and the [`ChainState`] context every other component
//! operates on.
//!
//! ## Contents
//!
//! - **Objects**: accounts, witnesses, content, market, escrow, proposals and
//!   the singleton global properties, each a ledger [`Object`] with its
//!   secondary indexes.
//! - **Context**: [`ChainState`] owns the ledger store, the chain id, the
//!   notification hub and the [`ApplyContext`] of the block, transaction
//!   and operation being applied.
//! - **Bookkeeping**: balance, supply, vesting, witness vote and bandwidth
//!   helpers, plus [`ChainState::validate_invariants`].
//! - **Genesis**: [`ChainState::from_genesis`].
//!
//! ## Sessions
//!
//! `ChainState` exposes the store's sessions directly. Callers nest them:
//!
//! ```text
//!  block session (kept)
//!   └─ transaction session (merged or rolled back)
//!       └─ proposal execution session (merged or rolled back)
//! ```
//!
//! [`Object`]: cc_01_ledger_store::Object

pub mod domain;
pub mod notifications;
pub mod state;

pub use domain::*;
pub use notifications::{ChainNotifications, OperationNotification};
pub use state::{calculate_vshares, register_core_indexes, ApplyContext, ChainState};
