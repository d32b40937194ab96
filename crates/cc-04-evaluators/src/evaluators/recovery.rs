//! Account recovery.
//!
//! The recovery partner files a request naming a new owner authority; the
//! account then proves it held a recent owner authority and switches to the
//! requested one.

use super::account::verify_authority_accounts;
use super::ensure;
use crate::domain::{EvaluationError, EvaluationResult};
use cc_01_ledger_store::index_key;
use cc_02_protocol::config::{
    ACCOUNT_RECOVERY_REQUEST_EXPIRATION_PERIOD, OWNER_AUTH_RECOVERY_PERIOD, OWNER_UPDATE_LIMIT,
};
use cc_02_protocol::{RecoverAccountOperation, RequestAccountRecoveryOperation};
use cc_03_chain_state::{AccountRecoveryRequest, ChainState, OwnerAuthorityHistory};

pub(crate) fn apply_request_account_recovery(
    state: &mut ChainState,
    op: &RequestAccountRecoveryOperation,
) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    let account = state.get_account(&op.account_to_recover)?;
    ensure(
        !account.recovery_account.is_empty() && account.recovery_account == op.recovery_account,
        "RequestAccountRecovery",
        "cannot recover an account that does not have you as its recovery partner",
    )?;
    state.get_account(&op.recovery_account)?;

    let existing = state
        .store()
        .find_by::<AccountRecoveryRequest>("by_account", &index_key!(&op.account_to_recover))?
        .map(|r| r.id);
    let expires = now + ACCOUNT_RECOVERY_REQUEST_EXPIRATION_PERIOD;

    // A zero threshold withdraws the request.
    if op.new_owner_authority.weight_threshold == 0 {
        ensure(
            existing.is_some(),
            "RequestAccountRecovery",
            "new owner authority weight threshold must be positive",
        )?;
    }
    match existing {
        Some(id) if op.new_owner_authority.weight_threshold == 0 => {
            state.store_mut().remove(id)?;
        }
        Some(id) => {
            check_new_owner(state, op)?;
            state.store_mut().modify(id, |r: &mut AccountRecoveryRequest| {
                r.new_owner_authority = op.new_owner_authority.clone();
                r.expires = expires;
            })?;
        }
        None => {
            check_new_owner(state, op)?;
            state.store_mut().create(|id| AccountRecoveryRequest {
                id,
                account_to_recover: op.account_to_recover.clone(),
                new_owner_authority: op.new_owner_authority.clone(),
                expires,
            })?;
        }
    }
    Ok(())
}

fn check_new_owner(state: &ChainState, op: &RequestAccountRecoveryOperation) -> EvaluationResult<()> {
    ensure(
        !op.new_owner_authority.is_impossible(),
        "RequestAccountRecovery",
        "cannot recover using an impossible authority",
    )?;
    verify_authority_accounts(state, &op.new_owner_authority)
}

pub(crate) fn apply_recover_account(
    state: &mut ChainState,
    op: &RecoverAccountOperation,
) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    let account = state.get_account(&op.account_to_recover)?;
    ensure(
        now.seconds_since(account.last_account_recovery) > i64::from(OWNER_UPDATE_LIMIT),
        "RecoverAccount",
        "owner authority can only be updated once an hour",
    )?;

    let request = state
        .store()
        .find_by::<AccountRecoveryRequest>("by_account", &index_key!(&op.account_to_recover))?;
    let Some(request) = request else {
        return Err(EvaluationError::precondition(
            "RecoverAccount",
            "there are no active recovery requests for this account",
        ));
    };
    ensure(
        request.new_owner_authority == op.new_owner_authority,
        "RecoverAccount",
        "new owner authority does not match the recovery request",
    )?;
    let request_id = request.id;

    let found = state
        .store()
        .equal_range::<OwnerAuthorityHistory>("by_account", &index_key!(&op.account_to_recover))?
        .filter(|h| h.last_valid_time + OWNER_AUTH_RECOVERY_PERIOD >= now)
        .any(|h| h.previous_owner_authority == op.recent_owner_authority);
    ensure(
        found,
        "RecoverAccount",
        "recent authority not found in authority history",
    )?;
    verify_authority_accounts(state, &op.new_owner_authority)?;

    state.store_mut().remove(request_id)?;
    state.update_owner_authority(&op.account_to_recover, op.new_owner_authority.clone())?;
    state.modify_account(&op.account_to_recover, |a| a.last_account_recovery = now)?;
    Ok(())
}
