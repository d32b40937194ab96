//! Error types for chain state access and bookkeeping.

use cc_01_ledger_store::LedgerError;
use cc_02_protocol::ProtocolError;
use shared_types::{AccountName, Asset, AssetError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainStateError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("Account {0} does not exist")]
    UnknownAccount(AccountName),

    #[error("Account {account} has insufficient funds: {available} available, {required} required")]
    InsufficientFunds {
        account: AccountName,
        available: Asset,
        required: Asset,
    },

    #[error("{operation} vetoed by subscriber: {reason}")]
    Vetoed {
        operation: &'static str,
        reason: String,
    },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Genesis failed: {0}")]
    Genesis(String),
}

impl ChainStateError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.code(),
            Self::Protocol(e) => e.code(),
            Self::Asset(e) => e.code(),
            Self::UnknownAccount(_) => "unknown_account",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::Vetoed { .. } => "vetoed",
            Self::InvariantViolation(_) => "invariant_violation",
            Self::Genesis(_) => "genesis",
        }
    }

    pub fn is_logic_error(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_logic_error(),
            Self::InvariantViolation(_) => true,
            _ => false,
        }
    }
}

pub type ChainStateResult<T> = Result<T, ChainStateError>;
