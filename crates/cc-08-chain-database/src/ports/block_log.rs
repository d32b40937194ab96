use crate::domain::BlockLogResult;
use cc_02_protocol::SignedBlock;

/// Append-only history of irreversible blocks, numbered from 1.
///
/// The chain database appends a block once it becomes irreversible and
/// replays the log on open. Nothing is ever removed except by wiping the
/// data directory.
pub trait BlockLog: Send + Sync {
    /// Append the block following the current head.
    fn append(&mut self, block: &SignedBlock) -> BlockLogResult<()>;

    fn read_block_by_num(&self, block_num: u32) -> BlockLogResult<Option<SignedBlock>>;

    fn head(&self) -> Option<&SignedBlock>;

    fn head_block_num(&self) -> u32 {
        self.head().map_or(0, SignedBlock::block_num)
    }

    fn flush(&mut self) -> BlockLogResult<()>;
}
