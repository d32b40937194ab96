//! Domain types of the ledger store.

pub mod config;
pub mod errors;
pub mod key;
pub mod object;

pub use config::StoreConfig;
pub use errors::{LedgerError, LedgerResult};
pub use key::{IndexKey, KeyPart};
pub use object::{Id, IndexSpec, Object};
