//! Error types for the reward processor.

use cc_01_ledger_store::LedgerError;
use cc_03_chain_state::ChainStateError;
use shared_types::{AccountName, AssetError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    #[error(transparent)]
    State(#[from] ChainStateError),

    #[error("Payout of {author}/{permlink} does not fit in an asset amount")]
    PayoutOverflow { author: AccountName, permlink: String },
}

impl RewardError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::State(e) => e.code(),
            Self::PayoutOverflow { .. } => "payout_overflow",
        }
    }

    pub fn is_logic_error(&self) -> bool {
        match self {
            Self::State(e) => e.is_logic_error(),
            Self::PayoutOverflow { .. } => true,
        }
    }
}

impl From<LedgerError> for RewardError {
    fn from(e: LedgerError) -> Self {
        Self::State(e.into())
    }
}

impl From<AssetError> for RewardError {
    fn from(e: AssetError) -> Self {
        Self::State(e.into())
    }
}

pub type RewardResult<T> = Result<T, RewardError>;
