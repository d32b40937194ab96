//! Inflation, the price feed and the supply figures derived from it.

use crate::domain::RewardResult;
use cc_01_ledger_store::Id;
use cc_02_protocol::config::{
    BLOCKS_PER_HOUR, BLOCKS_PER_YEAR, CBD_START_PERCENT, CBD_STOP_PERCENT, CONTENT_REWARD_PERCENT,
    FEED_HISTORY_WINDOW, FEED_INTERVAL_BLOCKS, INFLATION_RATE_PERCENT, LIQUIDITY_APR_PERCENT,
    LIQUIDITY_REWARD_BLOCKS, MAX_FEED_AGE, MIN_FEEDS, MIN_LIQUIDITY_REWARD, NULL_ACCOUNT,
    PERCENT_100, VESTING_FUND_PERCENT,
};
use cc_02_protocol::{LiquidityRewardOperation, Operation, ProducerRewardOperation};
use cc_03_chain_state::{Account, ChainState, FeedHistory, LiquidityRewardBalance};
use shared_types::{AccountName, Asset, AssetSymbol, Price};
use std::cmp::Ordering;
use tracing::debug;

/// Once per feed interval, push the median of the scheduled witnesses'
/// fresh feeds into the history and take the median of the history.
/// Returns whether the history moved.
pub fn update_median_feed(state: &mut ChainState) -> RewardResult<bool> {
    if state.head_block_num()? % FEED_INTERVAL_BLOCKS != 0 {
        return Ok(false);
    }
    let now = state.head_block_time()?;
    let scheduled = state.witness_schedule()?.current_shuffled_witnesses.clone();

    let mut feeds = Vec::with_capacity(scheduled.len());
    for name in &scheduled {
        let witness = state.get_witness(name)?;
        if now < witness.last_cbd_exchange_update + MAX_FEED_AGE && !witness.cbd_exchange_rate.is_null() {
            feeds.push(witness.cbd_exchange_rate);
        }
    }
    // Small test networks schedule fewer witnesses than the usual quorum.
    let required = MIN_FEEDS.min(scheduled.len()).max(1);
    if feeds.len() < required {
        return Ok(false);
    }
    sort_prices(&mut feeds);
    let median_feed = feeds[feeds.len() / 2];

    state
        .store_mut()
        .modify(Id::<FeedHistory>::new(0), |history| {
            history.price_history.push_back(median_feed);
            while history.price_history.len() > FEED_HISTORY_WINDOW {
                history.price_history.pop_front();
            }
            let mut sorted: Vec<Price> = history.price_history.iter().copied().collect();
            sort_prices(&mut sorted);
            history.current_median_history = sorted[sorted.len() / 2];
        })?;
    debug!(feeds = feeds.len(), median = %state.median_price()?, "Updated median feed");
    Ok(true)
}

fn sort_prices(prices: &mut [Price]) {
    prices.sort_by(|a, b| a.checked_cmp(b).unwrap_or(Ordering::Equal));
}

/// Burn whatever was sent to the null account.
pub fn clear_null_account_balance(state: &mut ChainState) -> RewardResult<()> {
    let null = AccountName::new(NULL_ACCOUNT);
    let account = state.get_account(&null)?;
    let (balance, cbd_balance, vesting) = (account.balance, account.cbd_balance, account.vesting_shares);
    let id = account.id;

    let mut burned_cedar = Asset::cedar(0);
    if balance.amount > 0 {
        state.adjust_balance(&null, balance.checked_neg()?)?;
        burned_cedar = burned_cedar.checked_add(balance)?;
    }
    if cbd_balance.amount > 0 {
        state.adjust_balance(&null, cbd_balance.checked_neg()?)?;
        state.adjust_supply(cbd_balance.checked_neg()?)?;
    }
    if vesting.amount > 0 {
        let dgp = state.dgp()?;
        let converted = dgp.vesting_share_price().convert(vesting)?;
        let fund = dgp.total_vesting_fund.checked_sub(converted)?;
        let shares = dgp.total_vesting_shares.checked_sub(vesting)?;
        state.modify_dgp(|p| {
            p.total_vesting_fund = fund;
            p.total_vesting_shares = shares;
        })?;
        state
            .store_mut()
            .modify(id, |a: &mut Account| a.vesting_shares = Asset::vests(0))?;
        burned_cedar = burned_cedar.checked_add(converted)?;
    }
    if burned_cedar.amount > 0 {
        state.adjust_supply(burned_cedar.checked_neg()?)?;
        debug!(%burned_cedar, "Burned null account balance");
    }
    Ok(())
}

/// Inflation of one block, split between the content reward fund, the
/// vesting fund and the producing witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockInflation {
    pub content: i64,
    pub vesting: i64,
    pub producer: i64,
}

impl BlockInflation {
    pub fn of(virtual_supply: i64) -> Self {
        let minted = i128::from(virtual_supply) * i128::from(INFLATION_RATE_PERCENT)
            / (i128::from(PERCENT_100) * i128::from(BLOCKS_PER_YEAR));
        let minted = minted as i64;
        let content = minted * CONTENT_REWARD_PERCENT as i64 / i64::from(PERCENT_100);
        let vesting = minted * VESTING_FUND_PERCENT as i64 / i64::from(PERCENT_100);
        Self {
            content,
            vesting,
            producer: minted - content - vesting,
        }
    }

    pub fn total(&self) -> i64 {
        self.content + self.vesting + self.producer
    }
}

/// Mint this block's inflation. The producer's share is vested to the
/// current witness.
pub fn process_funds(state: &mut ChainState) -> RewardResult<BlockInflation> {
    let dgp = state.dgp()?;
    let inflation = BlockInflation::of(dgp.virtual_supply.amount);
    let producer = dgp.current_witness.clone();
    if inflation.total() == 0 {
        return Ok(inflation);
    }

    let minted = Asset::cedar(inflation.total());
    let supply = dgp.current_supply.checked_add(minted)?;
    let virtual_supply = dgp.virtual_supply.checked_add(minted)?;
    let vesting_fund = dgp.total_vesting_fund.checked_add(Asset::cedar(inflation.vesting))?;
    let reward_fund = dgp.total_reward_fund.checked_add(Asset::cedar(inflation.content))?;
    state.modify_dgp(|p| {
        p.current_supply = supply;
        p.virtual_supply = virtual_supply;
        p.total_vesting_fund = vesting_fund;
        p.total_reward_fund = reward_fund;
    })?;

    if inflation.producer > 0 {
        let vesting_shares = state.create_vesting(&producer, Asset::cedar(inflation.producer))?;
        state.push_virtual_operation(Operation::ProducerReward(ProducerRewardOperation {
            producer,
            vesting_shares,
        }))?;
    }
    Ok(inflation)
}

/// Recompute the virtual supply and throttle dollar printing as the dollar
/// supply approaches its share of the market cap.
pub fn update_virtual_supply(state: &mut ChainState) -> RewardResult<()> {
    state.update_virtual_supply()?;
    let median = state.median_price()?;
    if median.is_null() {
        return Ok(());
    }
    let dgp = state.dgp()?;
    if dgp.virtual_supply.amount <= 0 {
        return Ok(());
    }
    let cbd_value = median.convert(dgp.current_cbd_supply)?;
    let percent_cbd = (i128::from(cbd_value.amount) * i128::from(PERCENT_100)
        / i128::from(dgp.virtual_supply.amount)) as u32;
    let print_rate = cbd_print_rate(percent_cbd);
    if print_rate != dgp.cbd_print_rate {
        debug!(percent_cbd, print_rate, "Changed dollar print rate");
        state.modify_dgp(|p| p.cbd_print_rate = print_rate)?;
    }
    Ok(())
}

/// Share of new dollars actually printed when dollars make up
/// `percent_cbd` of the virtual supply.
pub fn cbd_print_rate(percent_cbd: u32) -> u32 {
    if percent_cbd <= CBD_START_PERCENT {
        PERCENT_100
    } else if percent_cbd >= CBD_STOP_PERCENT {
        0
    } else {
        (CBD_STOP_PERCENT - percent_cbd) * PERCENT_100 / (CBD_STOP_PERCENT - CBD_START_PERCENT)
    }
}

/// Hourly reward for the market participant with the most two-sided
/// volume. Returns the winner and the amount paid.
pub fn pay_liquidity_reward(state: &mut ChainState) -> RewardResult<Option<(AccountName, Asset)>> {
    if state.head_block_num()? % LIQUIDITY_REWARD_BLOCKS != 0 {
        return Ok(None);
    }
    let reward = liquidity_reward(state.dgp()?.virtual_supply);
    if reward.amount == 0 {
        return Ok(None);
    }
    let Some((id, owner)) = state
        .store()
        .iter_by::<LiquidityRewardBalance>("by_volume_weight")?
        .next()
        .filter(|b| b.weight > 0)
        .map(|b| (b.id, b.owner.clone()))
    else {
        return Ok(None);
    };

    let now = state.head_block_time()?;
    state.adjust_supply(reward)?;
    state.adjust_balance(&owner, reward)?;
    state.store_mut().modify(id, |b: &mut LiquidityRewardBalance| {
        b.cedar_volume = 0;
        b.cbd_volume = 0;
        b.weight = 0;
        b.last_update = now;
    })?;
    state.push_virtual_operation(Operation::LiquidityReward(LiquidityRewardOperation {
        owner: owner.clone(),
        payout: reward,
    }))?;
    debug!(%owner, %reward, "Paid liquidity reward");
    Ok(Some((owner, reward)))
}

fn liquidity_reward(virtual_supply: Asset) -> Asset {
    let hours_per_year = BLOCKS_PER_YEAR / u64::from(BLOCKS_PER_HOUR);
    let amount = i128::from(virtual_supply.amount) * i128::from(LIQUIDITY_APR_PERCENT)
        / (i128::from(PERCENT_100) * i128::from(hours_per_year));
    let amount = (amount as i64).max(MIN_LIQUIDITY_REWARD.amount);
    Asset::new(amount, AssetSymbol::Cedar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inflation_split() {
        let inflation = BlockInflation::of(1_000_000_000_000);
        assert_eq!(inflation.total(), 9_037);
        assert_eq!(inflation.content, 6_024);
        assert_eq!(inflation.vesting, 2_410);
        assert_eq!(inflation.producer, 603);
        assert_eq!(BlockInflation::of(1_000), BlockInflation::default());
    }

    #[test]
    fn test_print_rate_ramp() {
        assert_eq!(cbd_print_rate(0), PERCENT_100);
        assert_eq!(cbd_print_rate(CBD_START_PERCENT), PERCENT_100);
        assert_eq!(cbd_print_rate(CBD_STOP_PERCENT), 0);
        assert_eq!(cbd_print_rate(350), PERCENT_100 / 2);
    }

    #[test]
    fn test_liquidity_reward_floor() {
        assert_eq!(liquidity_reward(Asset::cedar(1_000)), MIN_LIQUIDITY_REWARD);
        assert_eq!(liquidity_reward(Asset::cedar(1_000_000_000_000)), Asset::cedar(8_561_643));
    }
}
