//! Blocks and transactions arriving from outside: fork choice, popping and
//! the pending pool.

use super::ChainDatabase;
use crate::domain::{ChainError, ChainResult};
use crate::metrics;
use cc_02_protocol::{SignedBlock, SignedTransaction};
use cc_03_chain_state::SkipFlags;
use cc_05_consensus_params::ConsensusError;
use cc_07_fork_choice::{ForkError, ForkItem};
use shared_types::BlockId;
use std::sync::Arc;
use tracing::{debug, info, warn};

impl ChainDatabase {
    // =========================================================================
    // Blocks
    // =========================================================================

    /// Apply `block` or record it as a fork candidate. Returns `true` when
    /// the chain switched to another branch.
    ///
    /// Pending transactions are set aside while the block applies and
    /// re-applied afterwards; those that no longer apply are dropped.
    pub fn push_block(&mut self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<bool> {
        self.without_pending(skip, |db| db.push_block_inner(block, skip))
    }

    fn push_block_inner(&mut self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<bool> {
        let block_id = block.id()?;
        if self.is_applied(&block_id)? {
            debug!(block = %block_id, "Block already applied");
            return Ok(false);
        }

        if !skip.contains(SkipFlags::FORK_DB) {
            let head_id = self.state.head_block_id()?;
            if self.fork_db.head().is_none() && block.previous() != head_id {
                // An empty buffer takes any block as its head.
                return Err(ConsensusError::UnlinkableBlock {
                    block: block_id,
                    head: head_id,
                }
                .into());
            }
            let new_head = self.fork_db.push_block(block.clone())?;
            if new_head.previous_id() != head_id {
                if new_head.num <= self.state.head_block_num()? {
                    debug!(
                        block = %block_id,
                        head = %head_id,
                        "Block does not extend the best chain"
                    );
                    return Ok(false);
                }
                return self.switch_to(new_head, skip);
            }
            if new_head.id != block_id {
                // The buffer's best head is another child of the chain head.
                return self.switch_to(new_head, skip);
            }
        }

        if let Err(e) = self.apply_block_in_session(block, skip) {
            warn!(block = %block_id, error = %e, "Rejected block");
            if !skip.contains(SkipFlags::FORK_DB) {
                self.fork_db.remove(&block_id);
                self.sync_fork_head()?;
            }
            return Err(e);
        }
        Ok(false)
    }

    /// Make `new_head` the head: pop back to the fork point and apply the
    /// new branch. If a block of the new branch fails, the old branch is
    /// restored and the error returned.
    fn switch_to(&mut self, new_head: Arc<ForkItem>, skip: SkipFlags) -> ChainResult<bool> {
        let head_id = self.state.head_block_id()?;
        let (new_branch, old_branch) = self.fork_db.fetch_branch_from(&new_head.id, &head_id)?;
        for item in &new_branch {
            if let Err(e) = self.consensus.check_checkpoint(item.num, &item.id) {
                self.fork_db.remove(&item.id);
                self.sync_fork_head()?;
                return Err(e.into());
            }
        }
        let Some(fork_point) = new_branch.last().map(|item| item.previous_id()) else {
            return Ok(false);
        };

        if !old_branch.is_empty() {
            info!(
                from = %head_id,
                to = %new_head.id,
                fork_point = %fork_point,
                popped = old_branch.len(),
                applied = new_branch.len(),
                "Switching to a longer branch"
            );
        }
        while self.state.head_block_id()? != fork_point {
            self.pop_block_inner()?;
        }

        for (applied, item) in new_branch.iter().rev().enumerate() {
            let Err(e) = self.apply_block_in_session(&item.data, skip) else {
                continue;
            };
            warn!(block = %item.id, error = %e, "Branch failed to apply, restoring the previous branch");
            for bad in new_branch.iter().rev().skip(applied) {
                self.fork_db.remove(&bad.id);
            }
            while self.state.head_block_id()? != fork_point {
                self.pop_block_inner()?;
            }
            if let Some(old_head) = old_branch.first() {
                self.fork_db.set_head(old_head.clone());
            }
            for item in old_branch.iter().rev() {
                self.apply_block_in_session(&item.data, skip)?;
            }
            self.sync_fork_head()?;
            return Err(e);
        }

        self.fork_db.set_head(new_head);
        if old_branch.is_empty() {
            return Ok(false);
        }
        metrics::record_fork_switch();
        Ok(true)
    }

    /// Undo the head block. Its transactions join the pending pool again.
    pub fn pop_block(&mut self) -> ChainResult<SignedBlock> {
        self.without_pending(SkipFlags::NOTHING, |db| {
            let head_id = db.state.head_block_id()?;
            let block = db.pop_block_inner()?;
            match db.fork_db.head() {
                Some(head) if head.id == head_id => match db.fork_db.pop_block() {
                    Ok(_) => {}
                    // The parent is the genesis state or already pruned.
                    Err(ForkError::PopWouldEmpty(_)) => db.fork_db.reset(),
                    Err(e) => return Err(e.into()),
                },
                _ => db.sync_fork_head()?,
            }
            Ok(block)
        })
    }

    fn pop_block_inner(&mut self) -> ChainResult<SignedBlock> {
        let head_id = self.state.head_block_id()?;
        let head_num = head_id.block_num();
        if head_num == 0 {
            return Err(ChainError::PopEmptyChain);
        }
        let block = self
            .fetch_block_by_id(&head_id)?
            .ok_or(ChainError::PopEmptyChain)?;
        if self.state.store().undo_depth() == 0 {
            return Err(ChainError::PopIrreversible(head_num));
        }
        self.state.store_mut().undo()?;
        for trx in block.transactions.iter().rev() {
            self.popped.push_front(trx.clone());
        }
        debug!(block = %head_id, "Popped block");
        Ok(block)
    }

    /// On the current chain at or below the head.
    fn is_applied(&self, id: &BlockId) -> ChainResult<bool> {
        let block_num = id.block_num();
        if block_num == 0 || block_num > self.state.head_block_num()? {
            return Ok(false);
        }
        match self.get_block_id_for_num(block_num) {
            Ok(applied) => Ok(applied == *id),
            Err(ChainError::UnknownBlockNumber(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Point the fork buffer's head at the chain head. A buffer that does
    /// not hold the chain head cannot link new blocks to it and is emptied.
    fn sync_fork_head(&mut self) -> ChainResult<()> {
        let head_id = self.state.head_block_id()?;
        match self.fork_db.fetch_block(&head_id) {
            Some(item) => self.fork_db.set_head(item),
            None => {
                debug!(head = %head_id, "Chain head is not buffered, resetting the fork buffer");
                self.fork_db.reset();
            }
        }
        Ok(())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Apply `trx` on top of the pending pool and add it to the pool.
    pub fn push_transaction(&mut self, trx: &SignedTransaction, skip: SkipFlags) -> ChainResult<()> {
        self.with_producing(|db| db.push_pending(trx.clone(), skip))?;
        metrics::record_transaction_pushed();
        Ok(())
    }

    /// Check `trx` against the head plus the pending pool without keeping
    /// any of its effects.
    pub fn validate_transaction(&mut self, trx: &SignedTransaction, skip: SkipFlags) -> ChainResult<()> {
        Ok(self.registry.validate_transaction(&mut self.state, trx, skip)?)
    }

    /// Undo the pending pool and forget its transactions.
    pub fn clear_pending(&mut self) -> ChainResult<()> {
        self.pending.clear();
        self.discard_pending_session()?;
        metrics::set_pending_transactions(0);
        Ok(())
    }

    fn push_pending(&mut self, trx: SignedTransaction, skip: SkipFlags) -> ChainResult<()> {
        if self.pending_session.is_none() {
            self.pending_session = Some(self.state.begin_session());
        }
        let applied = self.state.applied_operations().len();
        let registry = &self.registry;
        let result = self
            .state
            .with_session(|state| registry.apply_transaction(state, &trx, skip));
        self.state.truncate_applied_operations(applied);
        result?;

        self.state.notify_on_pending_transaction(&trx);
        self.pending.push(trx);
        metrics::set_pending_transactions(self.pending.len());
        Ok(())
    }

    pub(crate) fn discard_pending_session(&mut self) -> ChainResult<()> {
        if let Some(session) = self.pending_session.take() {
            self.state.rollback(session)?;
        }
        Ok(())
    }

    /// Run `f` with the pending pool undone, then re-apply popped
    /// transactions followed by the previous pool. Transactions already in
    /// a block or no longer valid are dropped.
    pub(crate) fn without_pending<R>(
        &mut self,
        skip: SkipFlags,
        f: impl FnOnce(&mut Self) -> ChainResult<R>,
    ) -> ChainResult<R> {
        let pending = std::mem::take(&mut self.pending);
        self.discard_pending_session()?;

        let result = f(self);

        let popped = std::mem::take(&mut self.popped);
        self.with_producing(|db| {
            for trx in popped.into_iter().chain(pending) {
                let trx_id = trx.id()?;
                if db.state.is_known_transaction(&trx_id)? {
                    continue;
                }
                if let Err(e) = db.push_pending(trx, skip) {
                    warn!(trx = %trx_id, error = %e, "Dropped pending transaction");
                }
            }
            Ok(())
        })?;
        metrics::set_pending_transactions(self.pending.len());
        result
    }

    pub(crate) fn with_producing<R>(&mut self, f: impl FnOnce(&mut Self) -> ChainResult<R>) -> ChainResult<R> {
        let producing = std::mem::replace(&mut self.state.context_mut().producing, true);
        let result = f(self);
        self.state.context_mut().producing = producing;
        result
    }
}
