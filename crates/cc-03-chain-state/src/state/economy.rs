//! Balance, supply, vesting and vote bookkeeping shared by evaluators and
//! the reward processor.

use super::ChainState;
use crate::domain::{Account, ChainStateError, ChainStateResult, OwnerAuthorityHistory, WitnessVote};
use cc_01_ledger_store::index_key;
use cc_02_protocol::config::{
    BANDWIDTH_AVERAGE_WINDOW_SECONDS, BANDWIDTH_PRECISION, CONTENT_CONSTANT, PERCENT_100,
    VIRTUAL_SCHEDULE_LAP_LENGTH,
};
use cc_02_protocol::Authority;
use shared_types::{AccountName, Asset, AssetSymbol, Price};
use tracing::debug;

impl ChainState {
    /// Add `delta` to a liquid balance. A result below zero is
    /// [`ChainStateError::InsufficientFunds`].
    pub fn adjust_balance(&mut self, name: &AccountName, delta: Asset) -> ChainStateResult<()> {
        let account = self.get_account(name)?;
        let current = match delta.symbol {
            AssetSymbol::Cedar => account.balance,
            AssetSymbol::Cbd => account.cbd_balance,
            AssetSymbol::Vests => {
                return Err(ChainStateError::InvariantViolation(
                    "vesting shares are not a liquid balance".into(),
                ))
            }
        };
        let updated = current.checked_add(delta)?;
        if updated.amount < 0 {
            return Err(ChainStateError::InsufficientFunds {
                account: name.clone(),
                available: current,
                required: delta.checked_neg()?,
            });
        }
        let id = account.id;
        self.store.modify(id, |a: &mut Account| match delta.symbol {
            AssetSymbol::Cedar => a.balance = updated,
            _ => a.cbd_balance = updated,
        })?;
        Ok(())
    }

    /// Change the CEDAR or CBD supply and re-derive the virtual supply.
    pub fn adjust_supply(&mut self, delta: Asset) -> ChainStateResult<()> {
        let median = self.feed_history()?.current_median_history;
        let dgp = self.dgp()?;
        let (mut supply, mut cbd_supply) = (dgp.current_supply, dgp.current_cbd_supply);
        match delta.symbol {
            AssetSymbol::Cedar => supply = supply.checked_add(delta)?,
            AssetSymbol::Cbd => cbd_supply = cbd_supply.checked_add(delta)?,
            AssetSymbol::Vests => {
                return Err(ChainStateError::InvariantViolation(
                    "vesting shares have no supply".into(),
                ))
            }
        }
        if supply.amount < 0 || cbd_supply.amount < 0 {
            return Err(ChainStateError::InvariantViolation(format!(
                "negative supply after adjusting by {delta}"
            )));
        }
        let virtual_supply = virtual_supply(supply, cbd_supply, &median)?;
        self.modify_dgp(|p| {
            p.current_supply = supply;
            p.current_cbd_supply = cbd_supply;
            p.virtual_supply = virtual_supply;
        })
    }

    /// Recompute the virtual supply at the current median feed.
    pub fn update_virtual_supply(&mut self) -> ChainStateResult<()> {
        let median = self.feed_history()?.current_median_history;
        let dgp = self.dgp()?;
        let virtual_supply = virtual_supply(dgp.current_supply, dgp.current_cbd_supply, &median)?;
        self.modify_dgp(|p| p.virtual_supply = virtual_supply)
    }

    /// Convert `cedar` to vesting shares at the current share price and
    /// credit them to `to`. The CEDAR must already be taken from a balance or
    /// freshly issued.
    pub fn create_vesting(&mut self, to: &AccountName, cedar: Asset) -> ChainStateResult<Asset> {
        let price = self.dgp()?.vesting_share_price();
        let vests = price.convert(cedar)?;
        if vests.symbol != AssetSymbol::Vests {
            return Err(ChainStateError::InvariantViolation(format!(
                "cannot vest {cedar}"
            )));
        }
        let account = self.get_account(to)?;
        let (id, balance) = (account.id, account.vesting_shares.checked_add(vests)?);
        self.store.modify(id, |a: &mut Account| a.vesting_shares = balance)?;

        let dgp = self.dgp()?;
        let fund = dgp.total_vesting_fund.checked_add(cedar)?;
        let shares = dgp.total_vesting_shares.checked_add(vests)?;
        self.modify_dgp(|p| {
            p.total_vesting_fund = fund;
            p.total_vesting_shares = shares;
        })?;
        self.adjust_witness_votes(to, vests.amount)?;
        debug!(account = %to, %cedar, %vests, "Created vesting");
        Ok(vests)
    }

    /// Median-feed price, CBD per CEDAR. May be null before feeds exist.
    pub fn median_price(&self) -> ChainStateResult<Price> {
        Ok(self.feed_history()?.current_median_history)
    }

    pub fn to_cbd(&self, cedar: Asset) -> ChainStateResult<Asset> {
        Ok(self.median_price()?.convert(cedar)?)
    }

    pub fn to_cedar(&self, cbd: Asset) -> ChainStateResult<Asset> {
        Ok(self.median_price()?.convert(cbd)?)
    }

    /// Pay `value` CEDAR to `to`, printing the CBD print rate share as
    /// dollars at the median feed. Without a feed everything is paid in
    /// CEDAR. Returns the CBD and CEDAR actually paid.
    pub fn create_cbd(&mut self, to: &AccountName, value: Asset) -> ChainStateResult<(Asset, Asset)> {
        if value.amount == 0 {
            return Ok((Asset::cbd(0), Asset::cedar(0)));
        }
        let median = self.median_price()?;
        if median.is_null() {
            self.adjust_balance(to, value)?;
            return Ok((Asset::cbd(0), value));
        }
        let print_rate = i64::from(self.dgp()?.cbd_print_rate);
        let to_cbd = value.scale_by(print_rate, i64::from(PERCENT_100))?;
        let to_cedar = value.checked_sub(to_cbd)?;
        let cbd = median.convert(to_cbd)?;

        self.adjust_balance(to, cbd)?;
        self.adjust_balance(to, to_cedar)?;
        self.adjust_supply(to_cbd.checked_neg()?)?;
        self.adjust_supply(cbd)?;
        Ok((cbd, to_cedar))
    }

    // =========================================================================
    // Witness votes
    // =========================================================================

    /// Add `delta` to the votes of every witness `account` votes for.
    pub fn adjust_witness_votes(&mut self, account: &AccountName, delta: i64) -> ChainStateResult<()> {
        if delta == 0 {
            return Ok(());
        }
        let witnesses: Vec<AccountName> = self
            .store
            .equal_range::<WitnessVote>("by_account_witness", &index_key!(account))?
            .map(|v| v.witness.clone())
            .collect();
        for witness in witnesses {
            self.adjust_witness_vote(&witness, delta)?;
        }
        Ok(())
    }

    /// Change one witness's votes and move its place in the virtual
    /// schedule accordingly.
    pub fn adjust_witness_vote(&mut self, witness: &AccountName, delta: i64) -> ChainStateResult<()> {
        let current_virtual_time = self.witness_schedule()?.current_virtual_time;
        let total_vesting = self.dgp()?.total_vesting_shares.amount;
        let w = self.get_witness(witness)?;
        let votes = w
            .votes
            .checked_add(delta)
            .filter(|v| *v >= 0 && *v <= total_vesting)
            .ok_or_else(|| {
                ChainStateError::InvariantViolation(format!(
                    "witness {witness} votes {} adjusted by {delta} out of range",
                    w.votes
                ))
            })?;

        let elapsed = current_virtual_time.saturating_sub(w.virtual_last_update);
        let position = w
            .virtual_position
            .saturating_add((w.votes as u128).saturating_mul(elapsed));
        let mut scheduled = current_virtual_time.saturating_add(
            VIRTUAL_SCHEDULE_LAP_LENGTH.saturating_sub(position) / (votes as u128 + 1),
        );
        if scheduled < current_virtual_time {
            scheduled = u128::MAX;
        }

        let id = w.id;
        self.store.modify(id, |w| {
            w.votes = votes;
            w.virtual_position = position;
            w.virtual_last_update = current_virtual_time;
            w.virtual_scheduled_time = scheduled;
        })?;
        Ok(())
    }

    // =========================================================================
    // Authorities and rewards
    // =========================================================================

    /// Replace the owner authority, remembering the previous one for
    /// account recovery.
    pub fn update_owner_authority(&mut self, account: &AccountName, owner: Authority) -> ChainStateResult<()> {
        let now = self.head_block_time()?;
        let auth = self.get_account_authority(account)?;
        let previous = auth.owner.clone();
        let auth_id = auth.id;
        self.store.create(|id| OwnerAuthorityHistory {
            id,
            account: account.clone(),
            previous_owner_authority: previous,
            last_valid_time: now,
        })?;
        self.store.modify(auth_id, |a| {
            a.owner = owner;
            a.last_owner_update = now;
        })?;
        self.modify_account(account, |a| a.last_owner_update = now)
    }

    /// Move a comment's contribution to the reward pool from `old` to `new`
    /// reward shares.
    pub fn adjust_rshares2(&mut self, old: u128, new: u128) -> ChainStateResult<()> {
        self.modify_dgp(|p| {
            p.total_reward_shares2 = p.total_reward_shares2.saturating_sub(old).saturating_add(new);
        })
    }

    // =========================================================================
    // Bandwidth
    // =========================================================================

    /// Charge `trx_size` bytes to the account's decaying bandwidth average.
    /// Returns whether the account is within its stake-weighted share.
    pub fn update_account_bandwidth(&mut self, name: &AccountName, trx_size: usize) -> ChainStateResult<bool> {
        let dgp = self.dgp()?;
        if dgp.total_vesting_shares.amount <= 0 {
            return Ok(true);
        }
        let now = dgp.time;
        let total_vshares = dgp.total_vesting_shares.amount as u128;
        let max_virtual_bandwidth = dgp.max_virtual_bandwidth;

        let account = self.get_account(name)?;
        let trx_bandwidth = trx_size as u128 * u128::from(BANDWIDTH_PRECISION);
        let elapsed = now.seconds_since(account.last_bandwidth_update);
        let window = i64::from(BANDWIDTH_AVERAGE_WINDOW_SECONDS);
        let decayed = if elapsed >= window {
            0
        } else {
            account.average_bandwidth * (window - elapsed.max(0)) as u128 / window as u128
        };
        let average = decayed.saturating_add(trx_bandwidth);
        let account_vshares = account.vesting_shares.amount.max(0) as u128;
        let id = account.id;

        self.store.modify(id, |a: &mut Account| {
            a.average_bandwidth = average;
            a.lifetime_bandwidth = a.lifetime_bandwidth.saturating_add(trx_bandwidth);
            a.last_bandwidth_update = now;
        })?;

        Ok(account_vshares.saturating_mul(max_virtual_bandwidth)
            > average.saturating_mul(total_vshares))
    }
}

/// Reward shares of a comment with `rshares` net votes:
/// `(r + s)^2 - s^2` with `s = CONTENT_CONSTANT`. Non-positive votes earn
/// nothing.
pub fn calculate_vshares(rshares: i64) -> u128 {
    if rshares <= 0 {
        return 0;
    }
    let r = rshares as u128;
    // (r + s)^2 - s^2 = r * (r + 2s), at most ~8.5e37 for r = i64::MAX.
    r.saturating_mul(r.saturating_add(2 * CONTENT_CONSTANT))
}

/// Liquid supply plus the dollar supply valued at `median`.
pub(crate) fn virtual_supply(supply: Asset, cbd_supply: Asset, median: &Price) -> ChainStateResult<Asset> {
    if median.is_null() {
        return Ok(supply);
    }
    Ok(supply.checked_add(median.convert(cbd_supply)?)?)
}
