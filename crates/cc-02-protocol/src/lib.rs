//! # cc-02-protocol
//!
//! Wire-level vocabulary of the chain: operations, transactions, blocks,
//! authorities, and the protocol constants.
//!
//! Everything here is stateless. Validation that needs chain state (does the
//! account exist, is the balance sufficient) belongs to the evaluators.
//!
//! ## Authority Model
//!
//! | Level | Satisfies |
//! |-------|-----------|
//! | owner | owner, active, posting |
//! | active | active, posting |
//! | posting | posting |
//!
//! [`check_authority`] returns a structured [`AuthorityCheck`] so callers
//! can tell exactly which category is missing and which signatures or
//! approvals went unused.

pub mod authority;
pub mod block;
pub mod config;
pub mod errors;
pub mod operations;
pub mod transaction;
pub mod version;

pub use authority::{
    check_authority, Approvals, Authority, AuthorityCheck, AuthorityGetter, AuthorityGetters,
    RequiredAuthorities,
};
pub use block::{BlockHeader, BlockHeaderExtension, SignedBlock, SignedBlockHeader};
pub use errors::{ProtocolError, ProtocolResult};
pub use operations::*;
pub use transaction::{SignedTransaction, Transaction};
pub use version::Version;
