//! Time-based settlements: conversions, vesting withdrawals, recovery
//! requests and unratified escrows.

use crate::domain::RewardResult;
use cc_01_ledger_store::Id;
use cc_02_protocol::config::{OWNER_AUTH_RECOVERY_PERIOD, VESTING_WITHDRAW_INTERVAL_SECONDS};
use cc_02_protocol::{FillConvertRequestOperation, FillVestingWithdrawOperation, Operation, ReturnEscrowOperation};
use cc_03_chain_state::{
    Account, AccountRecoveryRequest, ChainState, ConvertRequest, Escrow, OwnerAuthorityHistory,
};
use shared_types::{Asset, TimePointSec};
use tracing::debug;

/// Settle conversion requests that have matured at the median feed. Nothing
/// settles while there is no feed.
pub fn process_conversions(state: &mut ChainState) -> RewardResult<usize> {
    let median = state.median_price()?;
    if median.is_null() {
        return Ok(0);
    }
    let now = state.head_block_time()?;
    let due: Vec<Id<ConvertRequest>> = state
        .store()
        .iter_by::<ConvertRequest>("by_conversion_date")?
        .take_while(|r| r.conversion_date <= now)
        .map(|r| r.id)
        .collect();

    let mut net_cbd = Asset::cbd(0);
    let mut net_cedar = Asset::cedar(0);
    for id in &due {
        let request = state.store_mut().remove(*id)?;
        let amount_out = median.convert(request.amount)?;
        state.adjust_balance(&request.owner, amount_out)?;
        net_cbd = net_cbd.checked_add(request.amount)?;
        net_cedar = net_cedar.checked_add(amount_out)?;
        state.push_virtual_operation(Operation::FillConvertRequest(FillConvertRequestOperation {
            owner: request.owner,
            requestid: request.requestid,
            amount_in: request.amount,
            amount_out,
        }))?;
    }
    if !due.is_empty() {
        state.adjust_supply(net_cbd.checked_neg()?)?;
        state.adjust_supply(net_cedar)?;
        debug!(requests = due.len(), %net_cbd, %net_cedar, "Filled conversion requests");
    }
    Ok(due.len())
}

/// Pay one installment of every vesting withdrawal that is due.
pub fn process_vesting_withdrawals(state: &mut ChainState) -> RewardResult<usize> {
    let now = state.head_block_time()?;
    let due: Vec<Id<Account>> = state
        .store()
        .iter_by::<Account>("by_next_vesting_withdrawal")?
        .take_while(|a| a.next_vesting_withdrawal <= now)
        .map(|a| a.id)
        .collect();

    for id in &due {
        let account = state.store().get(*id)?;
        let name = account.name.clone();
        let remaining = (account.to_withdraw - account.withdrawn).max(0);
        let installment = account
            .vesting_shares
            .amount
            .min(account.vesting_withdraw_rate.amount.min(remaining));
        let to_withdraw = account.to_withdraw;

        let dgp = state.dgp()?;
        let withdrawn = Asset::vests(installment);
        let deposited = dgp.vesting_share_price().convert(withdrawn)?;
        let fund = dgp.total_vesting_fund.checked_sub(deposited)?;
        let shares = dgp.total_vesting_shares.checked_sub(withdrawn)?;

        state.store_mut().modify(*id, |a: &mut Account| {
            a.vesting_shares.amount -= installment;
            a.balance.amount += deposited.amount;
            a.withdrawn += installment;
            if a.withdrawn >= to_withdraw || a.vesting_shares.amount == 0 {
                a.vesting_withdraw_rate = Asset::vests(0);
                a.next_vesting_withdrawal = TimePointSec::MAX;
            } else {
                a.next_vesting_withdrawal = a.next_vesting_withdrawal + VESTING_WITHDRAW_INTERVAL_SECONDS;
            }
        })?;
        state.modify_dgp(|p| {
            p.total_vesting_fund = fund;
            p.total_vesting_shares = shares;
        })?;
        if installment > 0 {
            state.adjust_witness_votes(&name, -installment)?;
        }
        state.push_virtual_operation(Operation::FillVestingWithdraw(FillVestingWithdrawOperation {
            from_account: name.clone(),
            to_account: name,
            withdrawn,
            deposited,
        }))?;
    }
    Ok(due.len())
}

/// Drop expired recovery requests and owner authorities too old to
/// recover with.
pub fn account_recovery_processing(state: &mut ChainState) -> RewardResult<()> {
    let now = state.head_block_time()?;
    let expired: Vec<Id<AccountRecoveryRequest>> = state
        .store()
        .iter_by::<AccountRecoveryRequest>("by_expiration")?
        .take_while(|r| r.expires <= now)
        .map(|r| r.id)
        .collect();
    for id in expired {
        state.store_mut().remove(id)?;
    }

    let stale: Vec<Id<OwnerAuthorityHistory>> = state
        .store()
        .iter_by::<OwnerAuthorityHistory>("by_last_valid")?
        .take_while(|h| h.last_valid_time + OWNER_AUTH_RECOVERY_PERIOD < now)
        .map(|h| h.id)
        .collect();
    for id in stale {
        state.store_mut().remove(id)?;
    }
    Ok(())
}

/// Return the funds of escrows nobody ratified before the deadline.
pub fn expire_escrow_ratification(state: &mut ChainState) -> RewardResult<usize> {
    let now = state.head_block_time()?;
    let expired: Vec<Id<Escrow>> = state
        .store()
        .iter_by::<Escrow>("by_ratification_deadline")?
        .take_while(|e| !e.is_approved() && e.ratification_deadline <= now)
        .map(|e| e.id)
        .collect();

    for id in &expired {
        let escrow = state.store_mut().remove(*id)?;
        for amount in [escrow.cedar_balance, escrow.cbd_balance, escrow.pending_fee] {
            if amount.amount > 0 {
                state.adjust_balance(&escrow.from, amount)?;
            }
        }
        debug!(from = %escrow.from, escrow_id = escrow.escrow_id, "Returned unratified escrow");
        state.push_virtual_operation(Operation::ReturnEscrow(ReturnEscrowOperation {
            from: escrow.from,
            escrow_id: escrow.escrow_id,
            cbd_amount: escrow.cbd_balance,
            cedar_amount: escrow.cedar_balance,
            fee: escrow.pending_fee,
        }))?;
    }
    Ok(expired.len())
}
