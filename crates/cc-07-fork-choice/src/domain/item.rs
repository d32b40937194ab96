use crate::domain::ForkResult;
use cc_02_protocol::SignedBlock;
use shared_types::BlockId;
use std::sync::Arc;

/// Default number of blocks kept behind the head.
pub const DEFAULT_MAX_SIZE: u32 = 1024;

/// A block held in the fork buffer, with its id and number computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkItem {
    pub id: BlockId,
    pub num: u32,
    pub data: Arc<SignedBlock>,
}

impl ForkItem {
    pub fn new(block: SignedBlock) -> ForkResult<Self> {
        Ok(Self {
            id: block.id()?,
            num: block.block_num(),
            data: Arc::new(block),
        })
    }

    pub fn previous_id(&self) -> BlockId {
        self.data.previous()
    }
}
