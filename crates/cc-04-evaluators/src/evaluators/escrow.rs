//! Three-party escrow: `from` locks funds for `to` under an `agent`.

use super::ensure;
use crate::domain::{EvaluationError, EvaluationResult};
use cc_01_ledger_store::index_key;
use cc_02_protocol::{
    EscrowApproveOperation, EscrowDisputeOperation, EscrowReleaseOperation,
    EscrowTransferOperation,
};
use cc_03_chain_state::{ChainState, Escrow};
use shared_types::{AccountName, Asset};

fn get_escrow<'a>(
    state: &'a ChainState,
    from: &AccountName,
    escrow_id: u32,
    to: &AccountName,
    agent: &AccountName,
) -> EvaluationResult<&'a Escrow> {
    let escrow = state
        .store()
        .get_by::<Escrow>("by_from_id", &index_key!(from, escrow_id))?;
    ensure(escrow.to == *to, "Escrow", "receiver does not match the escrow")?;
    ensure(escrow.agent == *agent, "Escrow", "agent does not match the escrow")?;
    Ok(escrow)
}

pub(crate) fn apply_escrow_transfer(
    state: &mut ChainState,
    op: &EscrowTransferOperation,
) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    ensure(
        op.ratification_deadline > now,
        "EscrowTransfer",
        "the ratification deadline must be after head block time",
    )?;
    ensure(
        op.escrow_expiration > now,
        "EscrowTransfer",
        "the escrow expiration must be after head block time",
    )?;
    state.get_account(&op.to)?;
    state.get_account(&op.agent)?;
    if state
        .store()
        .find_by::<Escrow>("by_from_id", &index_key!(&op.from, op.escrow_id))?
        .is_some()
    {
        return Err(EvaluationError::ObjectExists {
            object: "escrow",
            key: format!("{}/{}", op.from, op.escrow_id),
        });
    }

    state.adjust_balance(&op.from, op.cedar_amount.checked_neg()?)?;
    state.adjust_balance(&op.from, op.cbd_amount.checked_neg()?)?;
    state.adjust_balance(&op.from, op.fee.checked_neg()?)?;

    state.store_mut().create(|id| Escrow {
        id,
        escrow_id: op.escrow_id,
        from: op.from.clone(),
        to: op.to.clone(),
        agent: op.agent.clone(),
        ratification_deadline: op.ratification_deadline,
        escrow_expiration: op.escrow_expiration,
        cbd_balance: op.cbd_amount,
        cedar_balance: op.cedar_amount,
        pending_fee: op.fee,
        to_approved: false,
        agent_approved: false,
        disputed: false,
    })?;
    Ok(())
}

pub(crate) fn apply_escrow_approve(
    state: &mut ChainState,
    op: &EscrowApproveOperation,
) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    let escrow = get_escrow(state, &op.from, op.escrow_id, &op.to, &op.agent)?;
    ensure(
        escrow.ratification_deadline >= now,
        "EscrowApprove",
        "the ratification deadline has passed",
    )?;
    if op.who == op.to {
        ensure(!escrow.to_approved, "EscrowApprove", "the receiver has already approved")?;
    }
    if op.who == op.agent {
        ensure(!escrow.agent_approved, "EscrowApprove", "the agent has already approved")?;
    }
    let id = escrow.id;

    if !op.approve {
        let escrow = state.store_mut().remove(id)?;
        refund(state, &escrow.from, &[escrow.cedar_balance, escrow.cbd_balance, escrow.pending_fee])?;
        return Ok(());
    }

    state.store_mut().modify(id, |e: &mut Escrow| {
        if op.who == e.to {
            e.to_approved = true;
        }
        if op.who == e.agent {
            e.agent_approved = true;
        }
    })?;
    let escrow = state.store().get(id)?;
    if escrow.is_approved() && !escrow.pending_fee.is_zero() {
        let (agent, fee) = (escrow.agent.clone(), escrow.pending_fee);
        state.adjust_balance(&agent, fee)?;
        state
            .store_mut()
            .modify(id, |e: &mut Escrow| e.pending_fee = Asset::new(0, fee.symbol))?;
    }
    Ok(())
}

fn refund(state: &mut ChainState, to: &AccountName, amounts: &[Asset]) -> EvaluationResult<()> {
    for amount in amounts {
        state.adjust_balance(to, *amount)?;
    }
    Ok(())
}

pub(crate) fn apply_escrow_dispute(
    state: &mut ChainState,
    op: &EscrowDisputeOperation,
) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    let escrow = get_escrow(state, &op.from, op.escrow_id, &op.to, &op.agent)?;
    ensure(
        now < escrow.escrow_expiration,
        "EscrowDispute",
        "disputing the escrow must happen before expiration",
    )?;
    ensure(
        escrow.is_approved(),
        "EscrowDispute",
        "the escrow must be approved by all parties before a dispute can be raised",
    )?;
    ensure(!escrow.disputed, "EscrowDispute", "the escrow is already under dispute")?;
    let id = escrow.id;
    state.store_mut().modify(id, |e: &mut Escrow| e.disputed = true)?;
    Ok(())
}

pub(crate) fn apply_escrow_release(
    state: &mut ChainState,
    op: &EscrowReleaseOperation,
) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    let escrow = get_escrow(state, &op.from, op.escrow_id, &op.to, &op.agent)?;
    ensure(
        escrow.cedar_balance.amount >= op.cedar_amount.amount
            && escrow.cbd_balance.amount >= op.cbd_amount.amount,
        "EscrowRelease",
        "release amount exceeds escrow balance",
    )?;
    ensure(
        escrow.is_approved(),
        "EscrowRelease",
        "funds cannot be released prior to escrow approval",
    )?;
    if escrow.disputed {
        ensure(
            op.who == escrow.agent,
            "EscrowRelease",
            "only the agent can release funds in a disputed escrow",
        )?;
    } else {
        ensure(
            op.who == escrow.from || op.who == escrow.to,
            "EscrowRelease",
            "only the sender and the receiver can release funds from a non-disputed escrow",
        )?;
        if escrow.escrow_expiration > now {
            // Before expiration each side may only release to the other.
            let counterparty = if op.who == escrow.from { &escrow.to } else { &escrow.from };
            ensure(
                op.receiver == *counterparty,
                "EscrowRelease",
                "funds can only be released to the other party before expiration",
            )?;
        }
    }
    let id = escrow.id;

    refund(state, &op.receiver, &[op.cedar_amount, op.cbd_amount])?;
    state.store_mut().modify(id, |e: &mut Escrow| {
        e.cedar_balance.amount -= op.cedar_amount.amount;
        e.cbd_balance.amount -= op.cbd_amount.amount;
    })?;
    let escrow = state.store().get(id)?;
    if escrow.cedar_balance.is_zero() && escrow.cbd_balance.is_zero() {
        state.store_mut().remove(id)?;
    }
    Ok(())
}
