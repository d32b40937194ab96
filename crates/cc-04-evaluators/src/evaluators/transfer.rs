use super::ensure;
use crate::domain::{EvaluationError, EvaluationResult};
use cc_01_ledger_store::index_key;
use cc_02_protocol::config::{CONVERSION_DELAY, VESTING_WITHDRAW_INTERVALS, VESTING_WITHDRAW_INTERVAL_SECONDS};
use cc_02_protocol::{ConvertOperation, TransferOperation, TransferToVestingOperation, WithdrawVestingOperation};
use cc_03_chain_state::{ChainState, ChainStateError, ConvertRequest};
use shared_types::{Asset, TimePointSec};

pub(crate) fn apply_transfer(state: &mut ChainState, op: &TransferOperation) -> EvaluationResult<()> {
    state.get_account(&op.to)?;
    state.adjust_balance(&op.from, op.amount.checked_neg()?)?;
    state.adjust_balance(&op.to, op.amount)?;
    Ok(())
}

pub(crate) fn apply_transfer_to_vesting(
    state: &mut ChainState,
    op: &TransferToVestingOperation,
) -> EvaluationResult<()> {
    let to = if op.to.is_empty() { &op.from } else { &op.to };
    state.get_account(to)?;
    state.adjust_balance(&op.from, op.amount.checked_neg()?)?;
    state.create_vesting(to, op.amount)?;
    Ok(())
}

/// Replaces any running withdrawal. Zero shares stops it.
pub(crate) fn apply_withdraw_vesting(
    state: &mut ChainState,
    op: &WithdrawVestingOperation,
) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    let account = state.get_account(&op.account)?;
    if account.vesting_shares.amount < op.vesting_shares.amount {
        return Err(ChainStateError::InsufficientFunds {
            account: op.account.clone(),
            available: account.vesting_shares,
            required: op.vesting_shares,
        }
        .into());
    }

    if op.vesting_shares.amount == 0 {
        ensure(
            account.vesting_withdraw_rate.amount != 0,
            "WithdrawVesting",
            "no vesting withdrawal is running",
        )?;
        state.modify_account(&op.account, |a| {
            a.vesting_withdraw_rate = Asset::vests(0);
            a.next_vesting_withdrawal = TimePointSec::MAX;
            a.to_withdraw = 0;
            a.withdrawn = 0;
        })?;
        return Ok(());
    }

    let rate = Asset::vests((op.vesting_shares.amount / VESTING_WITHDRAW_INTERVALS).max(1));
    ensure(
        account.vesting_withdraw_rate != rate || account.to_withdraw != op.vesting_shares.amount,
        "WithdrawVesting",
        "this would not change the vesting withdraw rate",
    )?;
    state.modify_account(&op.account, |a| {
        a.vesting_withdraw_rate = rate;
        a.next_vesting_withdrawal = now + VESTING_WITHDRAW_INTERVAL_SECONDS;
        a.to_withdraw = op.vesting_shares.amount;
        a.withdrawn = 0;
    })?;
    Ok(())
}

pub(crate) fn apply_convert(state: &mut ChainState, op: &ConvertOperation) -> EvaluationResult<()> {
    ensure(
        !state.median_price()?.is_null(),
        "Convert",
        "cannot convert without a price feed",
    )?;
    let key = index_key!(&op.owner, op.requestid);
    if state.store().find_by::<ConvertRequest>("by_owner", &key)?.is_some() {
        return Err(EvaluationError::ObjectExists {
            object: "convert_request",
            key: format!("{}/{}", op.owner, op.requestid),
        });
    }

    state.adjust_balance(&op.owner, op.amount.checked_neg()?)?;
    let conversion_date = state.head_block_time()? + CONVERSION_DELAY;
    state.store_mut().create(|id| ConvertRequest {
        id,
        owner: op.owner.clone(),
        requestid: op.requestid,
        amount: op.amount,
        conversion_date,
    })?;
    Ok(())
}
