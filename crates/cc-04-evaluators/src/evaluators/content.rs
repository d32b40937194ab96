//! Posts, replies and votes.
//!
//! A vote spends part of the voter's regenerating voting power and turns it
//! into reward shares (rshares) proportional to the voter's vesting shares.
//! Positive rshares also earn curation weight along a saturating curve, so
//! early voters on a comment earn more per rshare than late ones. Votes cast
//! within the reverse auction window after creation forfeit part of their
//! weight to the author.

use super::ensure;
use crate::domain::{EvaluationError, EvaluationResult};
use cc_01_ledger_store::{index_key, Id};
use cc_02_protocol::config::{
    CASHOUT_WINDOW_SECONDS, CASHOUT_WINDOW_SECONDS_PRE_HF1, CONTENT_CONSTANT, HARDFORK_1,
    MAX_COMMENT_DEPTH, MIN_REPLY_INTERVAL, MIN_ROOT_COMMENT_INTERVAL, PERCENT_100,
    REVERSE_AUCTION_WINDOW_SECONDS, VOTE_REGENERATION_PER_DAY, VOTE_REGENERATION_SECONDS,
};
use cc_02_protocol::{CommentOperation, VoteOperation};
use cc_03_chain_state::{calculate_vshares, ChainState, Comment, CommentVote};
use shared_types::TimePointSec;

pub(crate) fn apply_comment(state: &mut ChainState, op: &CommentOperation) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    state.get_account(&op.author)?;

    if let Some(existing) = state.find_comment(&op.author, &op.permlink)? {
        ensure(
            existing.parent_author == op.parent_author
                && existing.parent_permlink == op.parent_permlink,
            "Comment",
            "the parent of a comment cannot change",
        )?;
        let id = existing.id;
        state.store_mut().modify(id, |c| {
            c.title = op.title.clone();
            c.body = op.body.clone();
            c.json_metadata = op.json_metadata.clone();
            c.last_update = now;
        })?;
        return Ok(());
    }

    let author = state.get_account(&op.author)?;
    let parent = if op.is_root() {
        ensure(
            now.seconds_since(author.last_root_post) >= i64::from(MIN_ROOT_COMMENT_INTERVAL),
            "Comment",
            "you may only post once every 5 minutes",
        )?;
        None
    } else {
        ensure(
            now.seconds_since(author.last_post) >= i64::from(MIN_REPLY_INTERVAL),
            "Comment",
            "you may only comment once every 20 seconds",
        )?;
        let parent = state.get_comment(&op.parent_author, &op.parent_permlink)?;
        ensure(
            parent.depth < MAX_COMMENT_DEPTH,
            "Comment",
            "comment is nested too deeply",
        )?;
        Some((parent.id, parent.depth, parent.root_comment))
    };

    let window = if state.has_hardfork(HARDFORK_1)? {
        CASHOUT_WINDOW_SECONDS
    } else {
        CASHOUT_WINDOW_SECONDS_PRE_HF1
    };
    state.store_mut().create(|id| {
        let mut comment = Comment::new(id, op.author.clone(), op.permlink.clone(), now);
        comment.parent_author = op.parent_author.clone();
        comment.parent_permlink = op.parent_permlink.clone();
        comment.title = op.title.clone();
        comment.body = op.body.clone();
        comment.json_metadata = op.json_metadata.clone();
        comment.cashout_time = now + window;
        if let Some((_, depth, root)) = parent {
            comment.depth = depth + 1;
            comment.root_comment = root;
        }
        comment
    })?;

    state.modify_account(&op.author, |a| {
        a.last_post = now;
        if op.is_root() {
            a.last_root_post = now;
        }
        a.post_count += 1;
    })?;

    let mut ancestor = parent.map(|(id, _, _)| id);
    while let Some(id) = ancestor {
        state.store_mut().modify(id, |c: &mut Comment| c.children += 1)?;
        let c = state.store().get(id)?;
        ancestor = if c.is_root() {
            None
        } else {
            Some(state.get_comment(&c.parent_author, &c.parent_permlink)?.id)
        };
    }
    Ok(())
}

/// Curation weight of a comment's accumulated positive rshares:
/// `u64::MAX * r / (2s + r)`.
pub(crate) fn curation_weight(vote_rshares: i64) -> u64 {
    if vote_rshares <= 0 {
        return 0;
    }
    let r = vote_rshares as u128;
    (u128::from(u64::MAX) * r / (2 * CONTENT_CONSTANT + r)) as u64
}

/// Voting power after regenerating since `last_vote_time`.
fn regenerated_power(voting_power: u16, last_vote_time: TimePointSec, now: TimePointSec) -> i64 {
    let elapsed = now.seconds_since(last_vote_time).max(0);
    let regenerated = i64::from(PERCENT_100) * elapsed / i64::from(VOTE_REGENERATION_SECONDS);
    (i64::from(voting_power) + regenerated).min(i64::from(PERCENT_100))
}

pub(crate) fn apply_vote(state: &mut ChainState, op: &VoteOperation) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    let comment = state.get_comment(&op.author, &op.permlink)?;
    ensure(comment.allow_votes, "Vote", "votes are not allowed on this comment")?;
    ensure(
        comment.cashout_time != TimePointSec::MAX,
        "Vote",
        "cannot vote after payout",
    )?;
    let comment_id: Id<Comment> = comment.id;
    let created = comment.created;
    let allow_curation = comment.allow_curation_rewards;
    let old_net = comment.net_rshares;
    let old_vote_rshares = comment.vote_rshares;

    if state
        .store()
        .find_by::<CommentVote>("by_comment_voter", &index_key!(comment_id, &op.voter))?
        .is_some()
    {
        return Err(EvaluationError::precondition(
            "Vote",
            "votes cannot be changed once cast",
        ));
    }
    ensure(op.weight != 0, "Vote", "vote weight cannot be 0")?;

    let voter = state.get_account(&op.voter)?;
    let current_power = regenerated_power(voter.voting_power, voter.last_vote_time, now);
    ensure(current_power > 0, "Vote", "voter has no voting power left")?;

    let abs_weight = i64::from(op.weight).abs();
    let max_vote_denom = i64::from(VOTE_REGENERATION_PER_DAY * VOTE_REGENERATION_SECONDS / (60 * 60 * 24));
    let used_power = current_power * abs_weight / i64::from(PERCENT_100);
    let used_power = (used_power + max_vote_denom - 1) / max_vote_denom;
    ensure(used_power <= current_power, "Vote", "voter does not have enough power")?;

    let vesting = voter.vesting_shares.amount.max(0) as u128;
    let abs_rshares = (vesting * used_power as u128 / u128::from(PERCENT_100)) as i64;
    ensure(abs_rshares > 0, "Vote", "voting power is too small to cast a vote")?;
    let rshares = if op.weight < 0 { -abs_rshares } else { abs_rshares };

    state.modify_account(&op.voter, |a| {
        a.voting_power = (current_power - used_power) as u16;
        a.last_vote_time = now;
    })?;

    let new_net = old_net + rshares;
    let new_vote_rshares = old_vote_rshares + rshares.max(0);
    let (max_vote_weight, weight) = if rshares > 0 && allow_curation {
        let max_weight = curation_weight(new_vote_rshares) - curation_weight(old_vote_rshares);
        let age = now.seconds_since(created).clamp(0, i64::from(REVERSE_AUCTION_WINDOW_SECONDS));
        let discounted = u128::from(max_weight) * age as u128
            / u128::from(REVERSE_AUCTION_WINDOW_SECONDS);
        (max_weight, discounted as u64)
    } else {
        (0, 0)
    };

    state.store_mut().modify(comment_id, |c| {
        c.net_rshares = new_net;
        c.abs_rshares += abs_rshares;
        c.vote_rshares = new_vote_rshares;
        c.net_votes += if rshares > 0 { 1 } else { -1 };
        c.total_vote_weight = c.total_vote_weight.saturating_add(max_vote_weight);
    })?;
    state.store_mut().create(|id| CommentVote {
        id,
        voter: op.voter.clone(),
        comment: comment_id,
        weight,
        rshares,
        vote_percent: op.weight,
        last_update: now,
    })?;
    state.adjust_rshares2(calculate_vshares(old_net), calculate_vshares(new_net))?;
    Ok(())
}
