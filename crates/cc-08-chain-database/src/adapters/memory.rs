use crate::domain::{BlockLogError, BlockLogResult};
use crate::ports::BlockLog;
use cc_02_protocol::SignedBlock;

/// Block log that lives as long as the process. Used when no data
/// directory is configured.
#[derive(Debug, Default)]
pub struct MemoryBlockLog {
    blocks: Vec<SignedBlock>,
}

impl MemoryBlockLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockLog for MemoryBlockLog {
    fn append(&mut self, block: &SignedBlock) -> BlockLogResult<()> {
        let expected = self.head_block_num() + 1;
        if block.block_num() != expected {
            return Err(BlockLogError::NonSequential {
                expected,
                actual: block.block_num(),
            });
        }
        self.blocks.push(block.clone());
        Ok(())
    }

    fn read_block_by_num(&self, block_num: u32) -> BlockLogResult<Option<SignedBlock>> {
        let Some(index) = block_num.checked_sub(1) else {
            return Ok(None);
        };
        Ok(self.blocks.get(index as usize).cloned())
    }

    fn head(&self) -> Option<&SignedBlock> {
        self.blocks.last()
    }

    fn flush(&mut self) -> BlockLogResult<()> {
        Ok(())
    }
}
