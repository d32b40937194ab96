//! # Checkpoints
//!
//! Operator-supplied block ids the chain must contain. Any block at a
//! checkpointed height with a different id is rejected, which also rules
//! out every fork that would switch away from a pinned block.
//!
//! Blocks at or below the last checkpoint are trusted: their signatures and
//! authorities are not checked again.

use super::errors::{ConsensusError, ConsensusResult};
use shared_types::BlockId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoints {
    pinned: BTreeMap<u32, BlockId>,
}

impl Checkpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace checkpoints.
    pub fn add(&mut self, checkpoints: impl IntoIterator<Item = (u32, BlockId)>) {
        self.pinned.extend(checkpoints);
    }

    pub fn get(&self, block_num: u32) -> Option<BlockId> {
        self.pinned.get(&block_num).copied()
    }

    pub fn last(&self) -> Option<(u32, BlockId)> {
        self.pinned.iter().next_back().map(|(num, id)| (*num, *id))
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, BlockId)> + '_ {
        self.pinned.iter().map(|(num, id)| (*num, *id))
    }

    /// Reject `id` if a different block is pinned at `block_num`.
    pub fn check(&self, block_num: u32, id: &BlockId) -> ConsensusResult<()> {
        match self.pinned.get(&block_num) {
            Some(expected) if expected != id => Err(ConsensusError::CheckpointMismatch {
                block_num,
                expected: *expected,
                actual: *id,
            }),
            _ => Ok(()),
        }
    }

    /// Whether `block_num` is covered by the last checkpoint.
    pub fn covers(&self, block_num: u32) -> bool {
        self.last().is_some_and(|(last, _)| block_num <= last)
    }
}
