use cc_02_protocol::ProtocolError;
use shared_types::BlockId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForkError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Block {block_num} is older than the fork buffer (minimum {min_block_num})")]
    BlockTooOld { block_num: u32, min_block_num: u32 },

    #[error("Block {0} is not in the fork buffer")]
    UnknownBlock(BlockId),

    #[error("The fork buffer has no head")]
    NoHead,

    #[error("Popping block {0} would leave the fork buffer without a head")]
    PopWouldEmpty(BlockId),
}

impl ForkError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Protocol(e) => e.code(),
            Self::BlockTooOld { .. } => "block_too_old",
            Self::UnknownBlock(_) => "unknown_block",
            Self::NoHead => "no_fork_head",
            Self::PopWouldEmpty(_) => "pop_empty_chain",
        }
    }

    pub fn is_logic_error(&self) -> bool {
        matches!(self, Self::NoHead | Self::PopWouldEmpty(_))
    }
}

pub type ForkResult<T> = Result<T, ForkError>;
