//! # Chain Database
//!
//! Owns the chain state and drives every other component against it.
//!
//! ```text
//! push_block
//!   ├─ already applied?                          → false
//!   ├─ fork_db.push_block                        (skip: FORK_DB)
//!   │    └─ best head on another branch?         → pop to the fork point, apply the branch
//!   └─ block session: apply_block, keep
//!        └─ newly irreversible blocks            → block log, undo history committed
//!
//! pending transactions are set aside before a block and re-applied after it
//! ```
//!
//! State lives in memory. On open it is rebuilt from genesis by replaying
//! the block log, which holds every irreversible block.

mod apply;
mod produce;
mod push;


use crate::adapters::file::{INDEX_FILE, LOG_FILE};
use crate::adapters::{DirectoryLock, FileBlockLog, MemoryBlockLog};
use crate::domain::{ChainConfig, ChainError, ChainResult};
use crate::ports::BlockLog;
use cc_01_ledger_store::SessionId;
use cc_02_protocol::{SignedBlock, SignedTransaction};
use cc_03_chain_state::{ChainState, SkipFlags};
use cc_04_evaluators::EvaluatorRegistry;
use cc_05_consensus_params::ConsensusEngine;
use cc_06_rewards::RewardProcessor;
use cc_07_fork_choice::ForkDatabase;
use shared_types::{BlockId, TimePointSec, TransactionId};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use tracing::info;

/// Checks skipped when replaying blocks the log already vouches for.
pub const REPLAY_SKIP: SkipFlags = SkipFlags::WITNESS_SIGNATURE
    .union(SkipFlags::TRANSACTION_SIGNATURES)
    .union(SkipFlags::TRANSACTION_DUPE_CHECK)
    .union(SkipFlags::TAPOS_CHECK)
    .union(SkipFlags::MERKLE_CHECK)
    .union(SkipFlags::WITNESS_SCHEDULE_CHECK)
    .union(SkipFlags::AUTHORITY_CHECK)
    .union(SkipFlags::VALIDATE_OPERATIONS)
    .union(SkipFlags::VALIDATE_INVARIANTS)
    .union(SkipFlags::UNDO_HISTORY_CHECK)
    .union(REPLAY_VERIFY_SKIP);

/// Replay that re-checks everything. Replayed blocks are final, so they
/// need no undo history, fork buffer or second log entry.
pub const REPLAY_VERIFY_SKIP: SkipFlags = SkipFlags::UNDO_BLOCK
    .union(SkipFlags::FORK_DB)
    .union(SkipFlags::BLOCK_LOG);

pub struct ChainDatabase {
    state: ChainState,
    registry: EvaluatorRegistry,
    consensus: ConsensusEngine,
    rewards: RewardProcessor,
    fork_db: ForkDatabase,
    block_log: Box<dyn BlockLog>,
    pending: Vec<SignedTransaction>,
    pending_session: Option<SessionId>,
    popped: VecDeque<SignedTransaction>,
    config: ChainConfig,
}

impl ChainDatabase {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Initialize genesis and replay the block log of `config.data_dir`, or
    /// start an in-memory chain when no directory is configured.
    pub fn open(config: ChainConfig) -> ChainResult<Self> {
        let block_log = Self::open_block_log(&config)?;
        Self::start(config, block_log, None)
    }

    /// Like [`Self::open`] with a caller-supplied block log.
    pub fn open_with_log(config: ChainConfig, block_log: Box<dyn BlockLog>) -> ChainResult<Self> {
        Self::start(config, block_log, None)
    }

    /// Rebuild the block log index and the state. Blocks before
    /// `from_block_num` replay trusted; from there on every check runs
    /// again.
    pub fn reindex(config: ChainConfig, from_block_num: u32) -> ChainResult<Self> {
        if let Some(dir) = &config.data_dir {
            Self::wipe(dir, false)?;
        }
        let block_log = Self::open_block_log(&config)?;
        info!(from_block_num, "Reindexing");
        Self::start(config, block_log, Some(from_block_num))
    }

    /// Delete the derived files in `dir`, and the block log itself when
    /// `include_blocks` is set. The directory must not be open.
    pub fn wipe(dir: &Path, include_blocks: bool) -> ChainResult<()> {
        if !dir.exists() {
            return Ok(());
        }
        let _lock = DirectoryLock::acquire(dir)?;
        remove_if_exists(&dir.join(INDEX_FILE))?;
        if include_blocks {
            remove_if_exists(&dir.join(LOG_FILE))?;
        }
        info!(dir = %dir.display(), include_blocks, "Wiped data directory");
        Ok(())
    }

    /// Drop the pending pool and flush the block log. Reversible blocks
    /// are not persisted; the next open resumes from the last irreversible
    /// block.
    pub fn close(mut self) -> ChainResult<()> {
        self.clear_pending()?;
        if self.config.flush_on_close {
            self.block_log.flush()?;
        }
        info!(
            head_block = self.state.head_block_num()?,
            logged_block = self.block_log.head_block_num(),
            "Closed chain database"
        );
        Ok(())
    }

    fn open_block_log(config: &ChainConfig) -> ChainResult<Box<dyn BlockLog>> {
        Ok(match &config.data_dir {
            Some(dir) => Box::new(FileBlockLog::open(dir)?),
            None => Box::new(MemoryBlockLog::new()),
        })
    }

    fn start(
        config: ChainConfig,
        block_log: Box<dyn BlockLog>,
        verify_from: Option<u32>,
    ) -> ChainResult<Self> {
        let state = ChainState::from_genesis(config.store, &config.genesis)?;
        let mut consensus = ConsensusEngine::new(config.hardforks.clone());
        consensus.add_checkpoints(config.checkpoints.iter().copied());
        let mut fork_db = ForkDatabase::new();
        fork_db.set_max_size(config.fork_db_size);

        let mut db = Self {
            state,
            registry: EvaluatorRegistry::new(),
            consensus,
            rewards: RewardProcessor::new(),
            fork_db,
            block_log,
            pending: Vec::new(),
            pending_session: None,
            popped: VecDeque::new(),
            config,
        };
        db.replay(verify_from)?;
        info!(
            chain = %db.config.genesis.chain_name,
            head_block = db.state.head_block_num()?,
            "Opened chain database"
        );
        Ok(db)
    }

    fn replay(&mut self, verify_from: Option<u32>) -> ChainResult<()> {
        let last = self.block_log.head_block_num();
        if last == 0 {
            return Ok(());
        }
        info!(blocks = last, "Replaying block log");
        for block_num in 1..=last {
            let block = self
                .block_log
                .read_block_by_num(block_num)?
                .ok_or(ChainError::MissingLoggedBlock(block_num))?;
            let skip = match verify_from {
                Some(from) if block_num >= from => REPLAY_VERIFY_SKIP,
                _ => REPLAY_SKIP,
            };
            self.apply_block_in_session(&block, skip)?;
            if block_num % 10_000 == 0 {
                info!(block_num, of = last, "Replay progress");
            }
        }
        if let Some(head) = self.block_log.head() {
            self.fork_db.start_block(head.clone())?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    /// For registering extension indexes and subscribing to notifications.
    /// Writes made here bypass block application.
    pub fn state_mut(&mut self) -> &mut ChainState {
        &mut self.state
    }

    pub fn registry(&self) -> &EvaluatorRegistry {
        &self.registry
    }

    /// For registering custom operation interpreters.
    pub fn registry_mut(&mut self) -> &mut EvaluatorRegistry {
        &mut self.registry
    }

    pub fn consensus(&self) -> &ConsensusEngine {
        &self.consensus
    }

    pub fn fork_db(&self) -> &ForkDatabase {
        &self.fork_db
    }

    pub fn block_log(&self) -> &dyn BlockLog {
        self.block_log.as_ref()
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn pending_transactions(&self) -> &[SignedTransaction] {
        &self.pending
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn head_block_num(&self) -> ChainResult<u32> {
        Ok(self.state.head_block_num()?)
    }

    pub fn head_block_id(&self) -> ChainResult<BlockId> {
        Ok(self.state.head_block_id()?)
    }

    pub fn head_block_time(&self) -> ChainResult<TimePointSec> {
        Ok(self.state.head_block_time()?)
    }

    pub fn is_known_transaction(&self, id: &TransactionId) -> ChainResult<bool> {
        Ok(self.state.is_known_transaction(id)?)
    }

    /// In the fork buffer, on any branch, or in the block log.
    pub fn is_known_block(&self, id: &BlockId) -> ChainResult<bool> {
        if self.fork_db.is_known_block(id) {
            return Ok(true);
        }
        Ok(self.fetch_logged_block(id)?.is_some())
    }

    pub fn fetch_block_by_id(&self, id: &BlockId) -> ChainResult<Option<SignedBlock>> {
        if let Some(item) = self.fork_db.fetch_block(id) {
            return Ok(Some(item.data.as_ref().clone()));
        }
        self.fetch_logged_block(id)
    }

    /// The block at `block_num` on the current chain.
    pub fn fetch_block_by_number(&self, block_num: u32) -> ChainResult<Option<SignedBlock>> {
        if let Some(item) = self.fork_db.fetch_block_on_main_branch_by_number(block_num) {
            return Ok(Some(item.data.as_ref().clone()));
        }
        Ok(self.block_log.read_block_by_num(block_num)?)
    }

    fn fetch_logged_block(&self, id: &BlockId) -> ChainResult<Option<SignedBlock>> {
        let Some(block) = self.block_log.read_block_by_num(id.block_num())? else {
            return Ok(None);
        };
        Ok((block.id()? == *id).then_some(block))
    }

    /// Id of the block at `block_num` on the current chain.
    pub fn get_block_id_for_num(&self, block_num: u32) -> ChainResult<BlockId> {
        let head = self.state.head_block_num()?;
        if block_num == 0 || block_num > head {
            return Err(ChainError::UnknownBlockNumber(block_num));
        }
        let summary = self.state.block_summary(block_num)?;
        if summary.block_num() == block_num {
            return Ok(summary);
        }
        self.fetch_block_by_number(block_num)?
            .map(|block| block.id())
            .transpose()?
            .ok_or(ChainError::UnknownBlockNumber(block_num))
    }

    /// Ids of the blocks on the branch ending at `head_of_fork` that are not
    /// on the current chain, tip first, followed by the fork point.
    pub fn get_block_ids_on_fork(&self, head_of_fork: &BlockId) -> ChainResult<Vec<BlockId>> {
        let head = self.state.head_block_id()?;
        let (ours, theirs) = self.fork_db.fetch_branch_from(&head, head_of_fork)?;
        let fork_point = theirs
            .last()
            .or(ours.last())
            .map_or(head, |item| item.previous_id());
        let mut ids: Vec<BlockId> = theirs.iter().map(|item| item.id).collect();
        ids.push(fork_point);
        Ok(ids)
    }

    // =========================================================================
    // Checkpoints
    // =========================================================================

    pub fn add_checkpoints(&mut self, checkpoints: impl IntoIterator<Item = (u32, BlockId)>) {
        self.consensus.add_checkpoints(checkpoints);
    }

    pub fn before_last_checkpoint(&self, block_num: u32) -> bool {
        self.consensus.before_last_checkpoint(block_num)
    }
}

fn remove_if_exists(path: &Path) -> ChainResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(crate::domain::BlockLogError::from(e).into()),
    }
}
