//! Error types for block header checks and consensus bookkeeping.

use cc_01_ledger_store::LedgerError;
use cc_02_protocol::{ProtocolError, Version};
use cc_03_chain_state::ChainStateError;
use shared_types::{AccountName, BlockId, TimePointSec};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error(transparent)]
    State(#[from] ChainStateError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Block {block} does not link to head {head}")]
    UnlinkableBlock { block: BlockId, head: BlockId },

    #[error("Block timestamp {timestamp} is not after head block time {head_time}")]
    TimestampNotAfterHead {
        timestamp: TimePointSec,
        head_time: TimePointSec,
    },

    #[error("Block timestamp {0} does not fall on a slot")]
    NoSlot(TimePointSec),

    #[error("Block was not signed by the signing key of witness {0}")]
    WrongWitnessSignature(AccountName),

    #[error("Witness {actual} produced a block in the slot of {expected}")]
    WrongWitness {
        expected: AccountName,
        actual: AccountName,
    },

    #[error("Witness {witness} runs {running}, the chain requires {required}")]
    OutdatedWitness {
        witness: AccountName,
        running: Version,
        required: Version,
    },

    #[error("Block {block_num} is {distance} blocks past the last irreversible block")]
    UndoHistoryExceeded { block_num: u32, distance: u32 },

    #[error("Hardfork {0} is not known to this node")]
    UnknownHardfork(u32),

    #[error("Block {block_num} is {actual}, checkpoint requires {expected}")]
    CheckpointMismatch {
        block_num: u32,
        expected: BlockId,
        actual: BlockId,
    },
}

impl ConsensusError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::State(e) => e.code(),
            Self::Protocol(e) => e.code(),
            Self::UnlinkableBlock { .. } => "unlinkable_block",
            Self::TimestampNotAfterHead { .. } => "block_timestamp_too_early",
            Self::NoSlot(_) => "block_not_in_slot",
            Self::WrongWitnessSignature(_) => "wrong_witness_signature",
            Self::WrongWitness { .. } => "wrong_witness",
            Self::OutdatedWitness { .. } => "outdated_witness_version",
            Self::UndoHistoryExceeded { .. } => "undo_history_exceeded",
            Self::UnknownHardfork(_) => "unknown_hardfork",
            Self::CheckpointMismatch { .. } => "checkpoint_mismatch",
        }
    }

    pub fn is_logic_error(&self) -> bool {
        match self {
            Self::State(e) => e.is_logic_error(),
            Self::UnknownHardfork(_) => true,
            _ => false,
        }
    }
}

impl From<LedgerError> for ConsensusError {
    fn from(e: LedgerError) -> Self {
        Self::State(e.into())
    }
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;
