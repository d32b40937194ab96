//! Error types for the chain database and its block log.

use cc_01_ledger_store::LedgerError;
use cc_02_protocol::ProtocolError;
use cc_03_chain_state::ChainStateError;
use cc_04_evaluators::EvaluationError;
use cc_05_consensus_params::ConsensusError;
use cc_06_rewards::RewardError;
use cc_07_fork_choice::ForkError;
use shared_types::{AccountName, BlockId};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockLogError {
    #[error("Block log I/O failed: {0}")]
    Io(String),

    #[error("Block log record could not be encoded or decoded: {0}")]
    Serialization(String),

    #[error("Block log is corrupt at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("Data directory {} is in use{}", path.display(), pid.map(|p| format!(" by process {p}")).unwrap_or_default())]
    Locked { path: PathBuf, pid: Option<u32> },

    #[error("Block log expects block {expected}, got {actual}")]
    NonSequential { expected: u32, actual: u32 },
}

impl BlockLogError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "block_log_io",
            Self::Serialization(_) => "block_log_serialization",
            Self::Corrupt { .. } => "block_log_corrupt",
            Self::Locked { .. } => "data_dir_locked",
            Self::NonSequential { .. } => "block_log_non_sequential",
        }
    }
}

impl From<std::io::Error> for BlockLogError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<bincode::Error> for BlockLogError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type BlockLogResult<T> = Result<T, BlockLogError>;

/// Why a block, transaction or lifecycle call on the chain database failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error(transparent)]
    Reward(#[from] RewardError),

    #[error(transparent)]
    Fork(#[from] ForkError),

    #[error(transparent)]
    State(#[from] ChainStateError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    BlockLog(#[from] BlockLogError),

    #[error("Block {block_num} is {size} bytes, the limit is {max}")]
    BlockTooLarge {
        block_num: u32,
        size: usize,
        max: usize,
    },

    #[error("Merkle root of block {0} does not match its transactions")]
    MerkleMismatch(BlockId),

    #[error("Block {0} is missing from the block log")]
    MissingLoggedBlock(u32),

    #[error("No block is known at height {0}")]
    UnknownBlockNumber(u32),

    #[error("Signing key does not belong to witness {0}")]
    SigningKeyMismatch(AccountName),

    #[error("There are no blocks to pop")]
    PopEmptyChain,

    #[error("Block {0} is irreversible and cannot be popped")]
    PopIrreversible(u32),

    #[error("The chain database is locked by another caller")]
    LockBusy,
}

impl ChainError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Evaluation(e) => e.code(),
            Self::Consensus(e) => e.code(),
            Self::Reward(e) => e.code(),
            Self::Fork(e) => e.code(),
            Self::State(e) => e.code(),
            Self::Protocol(e) => e.code(),
            Self::BlockLog(e) => e.code(),
            Self::BlockTooLarge { .. } => "block_too_large",
            Self::MerkleMismatch(_) => "merkle_mismatch",
            Self::MissingLoggedBlock(_) => "missing_logged_block",
            Self::UnknownBlockNumber(_) => "unknown_block_number",
            Self::SigningKeyMismatch(_) => "signing_key_mismatch",
            Self::PopEmptyChain => "pop_empty_chain",
            Self::PopIrreversible(_) => "pop_irreversible",
            Self::LockBusy => "database_lock_busy",
        }
    }

    pub fn is_logic_error(&self) -> bool {
        match self {
            Self::Evaluation(e) => e.is_logic_error(),
            Self::Consensus(e) => e.is_logic_error(),
            Self::Reward(e) => e.is_logic_error(),
            Self::Fork(e) => e.is_logic_error(),
            Self::State(e) => e.is_logic_error(),
            Self::MissingLoggedBlock(_) => true,
            _ => false,
        }
    }
}

impl From<LedgerError> for ChainError {
    fn from(e: LedgerError) -> Self {
        Self::State(e.into())
    }
}

pub type ChainResult<T> = Result<T, ChainError>;
