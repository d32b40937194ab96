use super::ensure;
use crate::domain::{EvaluationError, EvaluationResult};
use cc_02_protocol::config::OWNER_UPDATE_LIMIT;
use cc_02_protocol::{AccountCreateOperation, AccountUpdateOperation, Authority};
use cc_03_chain_state::{Account, AccountAuthority, ChainState};
use shared_types::TimePointSec;

/// Every account an authority delegates to must exist.
pub(crate) fn verify_authority_accounts(state: &ChainState, authority: &Authority) -> EvaluationResult<()> {
    for account in authority.account_auths.keys() {
        state.get_account(account)?;
    }
    Ok(())
}

pub(crate) fn apply_account_create(state: &mut ChainState, op: &AccountCreateOperation) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    let creator = state.get_account(&op.creator)?;
    let minimum_fee = state.witness_schedule()?.median_props.account_creation_fee;
    ensure(
        op.fee.amount >= minimum_fee.amount,
        "AccountCreate",
        &format!("insufficient fee: {} required, {} provided", minimum_fee, op.fee),
    )?;
    ensure(
        creator.balance.amount >= op.fee.amount,
        "AccountCreate",
        &format!("creator {} cannot pay the fee {}", op.creator, op.fee),
    )?;
    if state.find_account(&op.new_account_name)?.is_some() {
        return Err(EvaluationError::ObjectExists {
            object: "account",
            key: op.new_account_name.to_string(),
        });
    }
    for auth in [&op.owner, &op.active, &op.posting] {
        verify_authority_accounts(state, auth)?;
    }

    state.adjust_balance(&op.creator, op.fee.checked_neg()?)?;
    state.store_mut().create(|id| Account {
        json_metadata: op.json_metadata.clone(),
        recovery_account: op.creator.clone(),
        ..Account::new(id, op.new_account_name.clone(), op.memo_key, now)
    })?;
    state.store_mut().create(|id| AccountAuthority {
        id,
        account: op.new_account_name.clone(),
        owner: op.owner.clone(),
        active: op.active.clone(),
        posting: op.posting.clone(),
        last_owner_update: TimePointSec::MIN,
    })?;
    if op.fee.amount > 0 {
        state.create_vesting(&op.new_account_name, op.fee)?;
    }
    Ok(())
}

pub(crate) fn apply_account_update(state: &mut ChainState, op: &AccountUpdateOperation) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    let account = state.get_account(&op.account)?;

    if let Some(owner) = &op.owner {
        ensure(
            now.seconds_since(account.last_owner_update) > i64::from(OWNER_UPDATE_LIMIT),
            "AccountUpdate",
            "owner authority can only be updated once an hour",
        )?;
        verify_authority_accounts(state, owner)?;
        state.update_owner_authority(&op.account, owner.clone())?;
    }
    for auth in [&op.active, &op.posting].into_iter().flatten() {
        verify_authority_accounts(state, auth)?;
    }

    if op.active.is_some() || op.posting.is_some() {
        let id = state.get_account_authority(&op.account)?.id;
        state.store_mut().modify(id, |a| {
            if let Some(active) = &op.active {
                a.active = active.clone();
            }
            if let Some(posting) = &op.posting {
                a.posting = posting.clone();
            }
        })?;
    }
    state.modify_account(&op.account, |a| {
        if let Some(memo_key) = op.memo_key {
            a.memo_key = memo_key;
        }
        if !op.json_metadata.is_empty() {
            a.json_metadata = op.json_metadata.clone();
        }
    })?;
    Ok(())
}
