//! Applying one block to the head.

use super::ChainDatabase;
use crate::domain::{ChainError, ChainResult};
use crate::metrics;
use cc_02_protocol::SignedBlock;
use cc_03_chain_state::SkipFlags;
use cc_05_consensus_params::block::{
    check_running_version, create_block_summary, process_header_extensions,
    update_global_dynamic_data, update_last_irreversible_block, update_signing_witness,
    validate_block_header,
};
use cc_05_consensus_params::update_witness_schedule;
use shared_types::BlockId;
use tracing::debug;

/// Checks skipped for blocks at or below the last checkpoint. Merkle roots
/// are still checked so the transactions match the pinned headers.
const CHECKPOINT_SKIP: SkipFlags = SkipFlags::WITNESS_SIGNATURE
    .union(SkipFlags::TRANSACTION_SIGNATURES)
    .union(SkipFlags::TRANSACTION_DUPE_CHECK)
    .union(SkipFlags::BLOCK_SIZE_CHECK)
    .union(SkipFlags::TAPOS_CHECK)
    .union(SkipFlags::AUTHORITY_CHECK)
    .union(SkipFlags::UNDO_HISTORY_CHECK)
    .union(SkipFlags::WITNESS_SCHEDULE_CHECK)
    .union(SkipFlags::VALIDATE_OPERATIONS)
    .union(SkipFlags::VALIDATE_INVARIANTS);

impl ChainDatabase {
    /// Apply `block` in its own kept session, or straight into the state
    /// when `UNDO_BLOCK` is skipped. Nothing of a failed block remains,
    /// except under `UNDO_BLOCK` where the caller trusts the block.
    pub(crate) fn apply_block_in_session(&mut self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<()> {
        if skip.contains(SkipFlags::UNDO_BLOCK) {
            self.apply_block(block, skip)?;
        } else {
            let session = self.state.begin_session();
            if let Err(e) = self.apply_block(block, skip) {
                self.state.rollback(session)?;
                return Err(e);
            }
            self.state.keep(session)?;
        }
        self.on_irreversible(block, skip)?;
        metrics::record_block_applied(block.block_num());
        Ok(())
    }

    fn apply_block(&mut self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<()> {
        let block_num = block.block_num();
        let block_id = block.id()?;

        let mut skip = skip;
        if !self.consensus.checkpoints().is_empty() {
            self.consensus.check_checkpoint(block_num, &block_id)?;
            if self.consensus.before_last_checkpoint(block_num) {
                skip |= CHECKPOINT_SKIP;
            }
        }

        let saved = self.state.context().clone();
        {
            let context = self.state.context_mut();
            context.skip = skip;
            context.current_block_num = block_num;
            context.current_trx_in_block = 0;
            context.current_virtual_op = 0;
        }
        let result = self.apply_block_inner(block, block_id, skip);
        *self.state.context_mut() = saved;
        self.state.clear_applied_operations();
        result
    }

    fn apply_block_inner(&mut self, block: &SignedBlock, block_id: BlockId, skip: SkipFlags) -> ChainResult<()> {
        let block_num = block.block_num();

        validate_block_header(&self.state, block, skip)?;
        block.header().validate_extensions()?;

        let block_size = block.pack_size()?;
        let max_size = self.state.dgp()?.maximum_block_size as usize;
        if !skip.contains(SkipFlags::BLOCK_SIZE_CHECK) && block_size > max_size {
            return Err(ChainError::BlockTooLarge {
                block_num,
                size: block_size,
                max: max_size,
            });
        }

        if !skip.contains(SkipFlags::MERKLE_CHECK)
            && block.calculate_merkle_root()? != block.header().transaction_merkle_root
        {
            return Err(ChainError::MerkleMismatch(block_id));
        }

        process_header_extensions(&mut self.state, block)?;
        check_running_version(&self.state, block)?;

        if !skip.contains(SkipFlags::APPLY_TRANSACTION) {
            for (index, trx) in block.transactions.iter().enumerate() {
                self.state.context_mut().current_trx_in_block = index as u32;
                self.registry.apply_transaction(&mut self.state, trx, skip)?;
            }
        }

        update_global_dynamic_data(&mut self.state, block, block_id, block_size as u32, skip)?;
        update_signing_witness(&mut self.state, block)?;
        update_last_irreversible_block(&mut self.state)?;
        create_block_summary(&mut self.state, block_id)?;

        let expired_transactions = self.registry.clear_expired_transactions(&mut self.state)?;
        let expired_orders = self.registry.clear_expired_orders(&mut self.state)?;
        let expired_proposals = self.registry.clear_expired_proposals(&mut self.state)?;
        update_witness_schedule(&mut self.state)?;

        let rewards = self.rewards.process_block(&mut self.state)?;
        self.consensus.process_hardforks(&mut self.state)?;

        if !skip.contains(SkipFlags::VALIDATE_INVARIANTS) {
            self.state.validate_invariants()?;
        }

        self.state.notify_applied_block(block);
        debug!(
            block_num,
            block = %block_id,
            witness = %block.witness(),
            transactions = block.transactions.len(),
            expired_transactions,
            expired_orders,
            expired_proposals,
            cashouts = rewards.cashouts,
            "Applied block"
        );
        Ok(())
    }

    /// Write blocks that became irreversible to the block log, drop their
    /// undo history and shrink the fork buffer to the reversible range.
    fn on_irreversible(&mut self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<()> {
        let head = self.state.head_block_num()?;
        let last_irreversible = self.state.last_irreversible_block_num()?;

        if !skip.contains(SkipFlags::BLOCK_LOG) {
            for block_num in self.block_log.head_block_num() + 1..=last_irreversible {
                let irreversible = if block_num == block.block_num() {
                    block.clone()
                } else {
                    self.fork_db
                        .fetch_block_on_main_branch_by_number(block_num)
                        .map(|item| item.data.as_ref().clone())
                        .ok_or(ChainError::UnknownBlockNumber(block_num))?
                };
                self.block_log.append(&irreversible)?;
                debug!(block_num, "Wrote irreversible block to the block log");
            }
        }

        let reversible = head - last_irreversible.min(head);
        let revision = self.state.store().revision() - i64::from(reversible);
        self.state.store_mut().commit(revision);
        self.fork_db.set_max_size(reversible + 1);
        Ok(())
    }
}
