//! # Reward Processor
//!
//! Runs once per applied block, after the consensus bookkeeping, in a
//! fixed order:
//!
//! ```text
//! update_median_feed
//! clear_null_account_balance
//! process_funds                 inflation → content fund, vesting fund, producer
//! process_conversions
//! process_comment_cashout
//! process_vesting_withdrawals
//! pay_liquidity_reward          hourly
//! update_virtual_supply         and the dollar print rate
//! account_recovery_processing
//! expire_escrow_ratification
//! ```

use crate::cashout::process_comment_cashout;
use crate::domain::RewardResult;
use crate::funds::{
    clear_null_account_balance, pay_liquidity_reward, process_funds, update_median_feed,
    update_virtual_supply, BlockInflation,
};
use crate::maturation::{
    account_recovery_processing, expire_escrow_ratification, process_conversions,
    process_vesting_withdrawals,
};
use cc_03_chain_state::ChainState;
use shared_types::{AccountName, Asset};
use tracing::debug;


/// What one block's processing did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockRewards {
    pub feed_updated: bool,
    pub inflation: BlockInflation,
    pub conversions: usize,
    pub cashouts: usize,
    pub vesting_withdrawals: usize,
    pub liquidity_reward: Option<(AccountName, Asset)>,
    pub escrows_returned: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RewardProcessor;

impl RewardProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn process_block(&self, state: &mut ChainState) -> RewardResult<BlockRewards> {
        let feed_updated = update_median_feed(state)?;
        clear_null_account_balance(state)?;
        let inflation = process_funds(state)?;
        let conversions = process_conversions(state)?;
        let cashouts = process_comment_cashout(state)?;
        let vesting_withdrawals = process_vesting_withdrawals(state)?;
        let liquidity_reward = pay_liquidity_reward(state)?;
        update_virtual_supply(state)?;
        account_recovery_processing(state)?;
        let escrows_returned = expire_escrow_ratification(state)?;

        let rewards = BlockRewards {
            feed_updated,
            inflation,
            conversions,
            cashouts,
            vesting_withdrawals,
            liquidity_reward,
            escrows_returned,
        };
        debug!(
            block = state.head_block_num()?,
            minted = rewards.inflation.total(),
            cashouts,
            conversions,
            vesting_withdrawals,
            "Processed block rewards"
        );
        Ok(rewards)
    }
}
