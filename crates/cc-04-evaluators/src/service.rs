//! # Transaction and Operation Application
//!
//! ```text
//! apply_transaction
//!   ├─ validate operations            (skip: VALIDATE_OPERATIONS)
//!   ├─ duplicate check                (skip: TRANSACTION_DUPE_CHECK)
//!   ├─ signatures and authorities     (skip: TRANSACTION_SIGNATURES | AUTHORITY_CHECK)
//!   ├─ TaPoS and expiration           (skip: TAPOS_CHECK)
//!   ├─ record for duplicate detection (skip: TRANSACTION_DUPE_CHECK)
//!   ├─ bandwidth                      (enforced only while producing)
//!   ├─ apply_operation for each op
//!   │    pre_apply_operation → evaluator → post_apply_operation
//!   └─ on_applied_transaction
//! ```
//!
//! Nothing here opens a session on its own except
//! [`EvaluatorRegistry::validate_transaction`] and the proposal and custom
//! operation paths. The caller owns the transaction's session and rolls it
//! back on error.

use crate::domain::{EvaluationError, EvaluationResult};
use crate::evaluators::{account, content, custom, escrow, market, proposal, recovery, transfer, witness};
use crate::registry::EvaluatorRegistry;
use cc_02_protocol::config::{MAX_SIG_CHECK_DEPTH, MAX_TIME_UNTIL_EXPIRATION};
use cc_02_protocol::{required_authorities, Operation, ProtocolError, SignedTransaction};
use cc_03_chain_state::{ChainState, Proposal, SkipFlags, TransactionObject};
use shared_types::AccountName;
use std::collections::BTreeSet;
use tracing::debug;

#[cfg(test)]
mod tests;

impl EvaluatorRegistry {
    /// Check and apply `trx` in the current session.
    pub fn apply_transaction(
        &self,
        state: &mut ChainState,
        trx: &SignedTransaction,
        skip: SkipFlags,
    ) -> EvaluationResult<()> {
        let saved = state.context().clone();
        state.context_mut().skip = skip;
        let result = self.apply_transaction_inner(state, trx, skip);

        let context = state.context_mut();
        context.skip = saved.skip;
        context.current_trx_id = saved.current_trx_id;
        context.current_op_in_trx = saved.current_op_in_trx;
        result
    }

    fn apply_transaction_inner(
        &self,
        state: &mut ChainState,
        trx: &SignedTransaction,
        skip: SkipFlags,
    ) -> EvaluationResult<()> {
        let trx_id = trx.id()?;
        let now = state.head_block_time()?;

        if !skip.contains(SkipFlags::VALIDATE_OPERATIONS) {
            trx.trx.validate()?;
        }

        let check_dupes = !skip.contains(SkipFlags::TRANSACTION_DUPE_CHECK);
        if check_dupes && state.is_known_transaction(&trx_id)? {
            return Err(EvaluationError::DuplicateTransaction(trx_id));
        }

        if !skip.intersects(SkipFlags::TRANSACTION_SIGNATURES | SkipFlags::AUTHORITY_CHECK) {
            let chain_id = *state.chain_id();
            state.with_authority_getters(|getters| {
                trx.verify_authority(&chain_id, getters, MAX_SIG_CHECK_DEPTH)
            })?;
        }

        if !skip.contains(SkipFlags::TAPOS_CHECK) {
            let summary = state.block_summary(u32::from(trx.trx.ref_block_num))?;
            if summary.ref_prefix() != trx.trx.ref_block_prefix {
                return Err(EvaluationError::TaposMismatch {
                    ref_block_num: trx.trx.ref_block_num,
                });
            }
            let expiration = trx.expiration();
            let max = now + MAX_TIME_UNTIL_EXPIRATION;
            if expiration > max {
                return Err(EvaluationError::ExpirationTooFar { expiration, max });
            }
            if now >= expiration {
                return Err(EvaluationError::TransactionExpired { expiration, now });
            }
        }

        if check_dupes {
            let expiration = trx.expiration();
            state.store_mut().create(|id| TransactionObject {
                id,
                trx_id,
                expiration,
            })?;
        }

        self.update_bandwidth(state, trx)?;

        state.context_mut().current_trx_id = Some(trx_id);
        for (index, op) in trx.operations().iter().enumerate() {
            state.context_mut().current_op_in_trx = index as u16;
            self.apply_operation(state, op)?;
        }

        state.notify_on_applied_transaction(trx);
        debug!(trx = %trx_id, operations = trx.operations().len(), "Applied transaction");
        Ok(())
    }

    fn update_bandwidth(&self, state: &mut ChainState, trx: &SignedTransaction) -> EvaluationResult<()> {
        let required = required_authorities(trx.operations());
        let accounts: BTreeSet<AccountName> = required
            .active
            .into_iter()
            .chain(required.owner)
            .chain(required.posting)
            .collect();
        if accounts.is_empty() {
            return Ok(());
        }
        let size = trx.pack_size()?;
        for account in accounts {
            if state.find_account(&account)?.is_none() {
                continue;
            }
            let within = state.update_account_bandwidth(&account, size)?;
            if !within && state.is_producing() {
                return Err(EvaluationError::BandwidthExceeded(account));
            }
        }
        Ok(())
    }

    /// Notify, evaluate, notify.
    pub fn apply_operation(&self, state: &mut ChainState, op: &Operation) -> EvaluationResult<()> {
        let note = state.operation_notification(op.clone());
        state.notify_pre_apply_operation(&note)?;
        self.evaluate(state, op)?;
        state.notify_post_apply_operation(note);
        Ok(())
    }

    fn evaluate(&self, state: &mut ChainState, op: &Operation) -> EvaluationResult<()> {
        match op {
            Operation::Vote(op) => content::apply_vote(state, op),
            Operation::Comment(op) => content::apply_comment(state, op),
            Operation::Transfer(op) => transfer::apply_transfer(state, op),
            Operation::TransferToVesting(op) => transfer::apply_transfer_to_vesting(state, op),
            Operation::WithdrawVesting(op) => transfer::apply_withdraw_vesting(state, op),
            Operation::Convert(op) => transfer::apply_convert(state, op),
            Operation::LimitOrderCreate(op) => market::apply_limit_order_create(state, op),
            Operation::LimitOrderCancel(op) => market::apply_limit_order_cancel(state, op),
            Operation::FeedPublish(op) => witness::apply_feed_publish(state, op),
            Operation::AccountCreate(op) => account::apply_account_create(state, op),
            Operation::AccountUpdate(op) => account::apply_account_update(state, op),
            Operation::WitnessUpdate(op) => witness::apply_witness_update(state, op),
            Operation::AccountWitnessVote(op) => witness::apply_account_witness_vote(state, op),
            Operation::CustomJson(op) => custom::apply_custom_json(self, state, op),
            Operation::EscrowTransfer(op) => escrow::apply_escrow_transfer(state, op),
            Operation::EscrowApprove(op) => escrow::apply_escrow_approve(state, op),
            Operation::EscrowDispute(op) => escrow::apply_escrow_dispute(state, op),
            Operation::EscrowRelease(op) => escrow::apply_escrow_release(state, op),
            Operation::RequestAccountRecovery(op) => {
                recovery::apply_request_account_recovery(state, op)
            }
            Operation::RecoverAccount(op) => recovery::apply_recover_account(state, op),
            Operation::ProposalCreate(op) => proposal::apply_proposal_create(self, state, op),
            Operation::ProposalUpdate(op) => proposal::apply_proposal_update(self, state, op),
            Operation::ProposalDelete(op) => proposal::apply_proposal_delete(state, op),
            Operation::FillConvertRequest(_)
            | Operation::AuthorReward(_)
            | Operation::CurationReward(_)
            | Operation::LiquidityReward(_)
            | Operation::FillVestingWithdraw(_)
            | Operation::FillOrder(_)
            | Operation::ProducerReward(_)
            | Operation::ReturnEscrow(_) => Err(ProtocolError::VirtualOperation(op.name()).into()),
        }
    }

    /// Apply `trx` in a nested session that is always rolled back. The
    /// apply context and the applied-operation log are left as they were.
    pub fn validate_transaction(
        &self,
        state: &mut ChainState,
        trx: &SignedTransaction,
        skip: SkipFlags,
    ) -> EvaluationResult<()> {
        let saved = state.context().clone();
        let applied = state.applied_operations().len();
        let result = state.with_dry_run(|s| self.apply_transaction(s, trx, skip));
        *state.context_mut() = saved;
        state.truncate_applied_operations(applied);
        result
    }

    // =========================================================================
    // Per-block sweeps
    // =========================================================================

    /// Forget transactions whose expiration has passed; they can no longer
    /// be replayed.
    pub fn clear_expired_transactions(&self, state: &mut ChainState) -> EvaluationResult<usize> {
        let now = state.head_block_time()?;
        let expired: Vec<_> = state
            .store()
            .iter_by::<TransactionObject>("by_expiration")?
            .take_while(|t| t.expiration < now)
            .map(|t| t.id)
            .collect();
        for id in &expired {
            state.store_mut().remove(*id)?;
        }
        Ok(expired.len())
    }

    /// Cancel orders past their expiration, refunding the sellers.
    pub fn clear_expired_orders(&self, state: &mut ChainState) -> EvaluationResult<usize> {
        market::clear_expired_orders(state)
    }

    /// Execute or drop proposals whose expiration has come.
    pub fn clear_expired_proposals(&self, state: &mut ChainState) -> EvaluationResult<usize> {
        let now = state.head_block_time()?;
        let expired: Vec<_> = state
            .store()
            .iter_by::<Proposal>("by_expiration")?
            .take_while(|p| p.expiration_time <= now)
            .map(|p| p.id)
            .collect();
        for id in &expired {
            proposal::execute_or_expire(self, state, *id)?;
        }
        Ok(expired.len())
    }
}
