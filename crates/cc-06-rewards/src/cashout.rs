//! # Content Cashout
//!
//! When a comment's cashout time comes, it claims a share of the reward
//! fund proportional to its reward shares:
//!
//! ```text
//! payout   = reward_fund * vshares(net_rshares) / total_reward_shares2
//! curation = payout * CURATION_REWARD_PERCENT      (split by vote weight)
//! author   = payout - curation + unclaimed curation
//!            ├─ percent_cbd / 2 ──▶ dollars at the median feed
//!            └─ rest            ──▶ vesting
//! ```
//!
//! The product is taken in 256 bits; the reward fund times the reward
//! shares of a single comment does not fit in 128.

use crate::domain::{RewardError, RewardResult};
use cc_01_ledger_store::{index_key, Id};
use cc_02_protocol::config::{CURATION_REWARD_PERCENT, PERCENT_100};
use cc_02_protocol::{AuthorRewardOperation, CurationRewardOperation, Operation};
use cc_03_chain_state::{calculate_vshares, ChainState, Comment, CommentVote};
use shared_types::{AccountName, Asset, TimePointSec, U256};
use tracing::debug;

/// Pay out every comment whose cashout time has come. Returns how many
/// were processed.
pub fn process_comment_cashout(state: &mut ChainState) -> RewardResult<usize> {
    let now = state.head_block_time()?;
    let due: Vec<Id<Comment>> = state
        .store()
        .iter_by::<Comment>("by_cashout_time")?
        .take_while(|c| c.cashout_time <= now)
        .map(|c| c.id)
        .collect();
    for id in &due {
        cashout_comment(state, *id, now)?;
    }
    Ok(due.len())
}

fn cashout_comment(state: &mut ChainState, id: Id<Comment>, now: TimePointSec) -> RewardResult<()> {
    let comment = state.store().get(id)?;
    let author = comment.author.clone();
    let permlink = comment.permlink.clone();
    let net_rshares = comment.net_rshares;
    let max_accepted_payout = comment.max_accepted_payout;
    let percent_cbd = comment.percent_cbd;
    let allow_curation = comment.allow_curation_rewards;
    let total_vote_weight = comment.total_vote_weight;

    if net_rshares > 0 {
        let vshares = calculate_vshares(net_rshares);
        let max_cedar = if state.median_price()?.is_null() {
            i64::MAX
        } else {
            state.to_cedar(max_accepted_payout)?.amount
        };
        let dgp = state.dgp()?;
        let reward = claim_rshare_reward(
            dgp.total_reward_fund.amount,
            dgp.total_reward_shares2,
            vshares,
            max_cedar,
        )
        .ok_or_else(|| {
            RewardError::PayoutOverflow {
                author: author.clone(),
                permlink: permlink.clone(),
            }
        })?;
        state.modify_dgp(|p| p.total_reward_fund.amount -= reward)?;

        if reward > 0 {
            let curation = (i128::from(reward) * i128::from(CURATION_REWARD_PERCENT)
                / i128::from(PERCENT_100)) as i64;
            let unclaimed = if allow_curation && total_vote_weight > 0 {
                pay_curators(state, id, &author, &permlink, curation, total_vote_weight)?
            } else {
                curation
            };
            let author_tokens = reward - curation + unclaimed;

            let cbd_cedar = (i128::from(author_tokens) * i128::from(percent_cbd)
                / (2 * i128::from(PERCENT_100))) as i64;
            let vesting_cedar = author_tokens - cbd_cedar;
            let vesting_payout = state.create_vesting(&author, Asset::cedar(vesting_cedar))?;
            let (cbd_payout, cedar_payout) = state.create_cbd(&author, Asset::cedar(cbd_cedar))?;

            let author_value = cbd_payout.checked_add(cbd_value(
                state,
                cedar_payout.checked_add(Asset::cedar(vesting_cedar))?,
            )?)?;
            let curator_value = cbd_value(state, Asset::cedar(curation - unclaimed))?;
            state.store_mut().modify(id, |c: &mut Comment| {
                c.total_payout_value.amount += author_value.amount;
                c.curator_payout_value.amount += curator_value.amount;
                c.author_rewards += author_tokens;
            })?;
            state.modify_account(&author, |a| a.posting_rewards += author_tokens)?;
            state.push_virtual_operation(Operation::AuthorReward(AuthorRewardOperation {
                author: author.clone(),
                permlink: permlink.clone(),
                cbd_payout,
                cedar_payout,
                vesting_payout,
            }))?;
            debug!(%author, %permlink, reward, author_tokens, "Paid out comment");
        }
        state.adjust_rshares2(vshares, 0)?;
    }

    state.store_mut().modify(id, |c: &mut Comment| {
        c.net_rshares = c.net_rshares.min(0);
        c.abs_rshares = 0;
        c.vote_rshares = 0;
        c.total_vote_weight = 0;
        c.cashout_time = TimePointSec::MAX;
        c.last_payout = now;
    })?;

    let votes: Vec<Id<CommentVote>> = state
        .store()
        .equal_range::<CommentVote>("by_comment_voter", &index_key!(id))?
        .map(|v| v.id)
        .collect();
    for vote in votes {
        state.store_mut().remove(vote)?;
    }
    Ok(())
}

/// A comment's share of the reward fund, capped at `max_cedar`. `None`
/// when the share does not fit in an amount.
fn claim_rshare_reward(reward_fund: i64, total: u128, vshares: u128, max_cedar: i64) -> Option<i64> {
    let fund = reward_fund.max(0);
    if total == 0 {
        return Some(0);
    }
    let payout = U256::from(fund as u64) * U256::from(vshares) / U256::from(total);
    if payout > U256::from(i64::MAX as u64) {
        return None;
    }
    Some((payout.low_u64() as i64).min(max_cedar).min(fund))
}

/// Vest each curator's share of `max_rewards` by vote weight. Returns the
/// part nobody earned.
fn pay_curators(
    state: &mut ChainState,
    comment: Id<Comment>,
    author: &AccountName,
    permlink: &str,
    max_rewards: i64,
    total_weight: u64,
) -> RewardResult<i64> {
    let votes: Vec<(AccountName, u64)> = state
        .store()
        .equal_range::<CommentVote>("by_comment_voter", &index_key!(comment))?
        .map(|v| (v.voter.clone(), v.weight))
        .collect();

    let mut unclaimed = max_rewards;
    for (voter, weight) in votes {
        let claim = (i128::from(max_rewards) * i128::from(weight) / i128::from(total_weight)) as i64;
        if claim <= 0 {
            continue;
        }
        unclaimed -= claim;
        let reward = state.create_vesting(&voter, Asset::cedar(claim))?;
        state.modify_account(&voter, |a| a.curation_rewards += claim)?;
        state.push_virtual_operation(Operation::CurationReward(CurationRewardOperation {
            curator: voter,
            reward,
            comment_author: author.clone(),
            comment_permlink: permlink.to_string(),
        }))?;
    }
    Ok(unclaimed)
}

/// CEDAR valued in dollars at the median feed; nothing before a feed exists.
fn cbd_value(state: &ChainState, cedar: Asset) -> RewardResult<Asset> {
    if state.median_price()?.is_null() {
        return Ok(Asset::cbd(0));
    }
    Ok(state.to_cbd(cedar)?)
}
