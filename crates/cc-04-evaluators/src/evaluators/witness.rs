use super::ensure;
use crate::domain::{EvaluationError, EvaluationResult};
use cc_01_ledger_store::index_key;
use cc_02_protocol::config::MAX_ACCOUNT_WITNESS_VOTES;
use cc_02_protocol::{AccountWitnessVoteOperation, FeedPublishOperation, WitnessUpdateOperation};
use cc_03_chain_state::{ChainState, Witness, WitnessVote};

/// Registers the witness on first use, updates it afterwards.
pub(crate) fn apply_witness_update(state: &mut ChainState, op: &WitnessUpdateOperation) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    state.get_account(&op.owner)?;

    match state.find_witness(&op.owner)?.map(|w| w.id) {
        Some(id) => state.store_mut().modify(id, |w| {
            w.url = op.url.clone();
            w.signing_key = op.block_signing_key;
            w.props = op.props.clone();
        })?,
        None => {
            state.store_mut().create(|id| Witness {
                url: op.url.clone(),
                props: op.props.clone(),
                ..Witness::new(id, op.owner.clone(), op.block_signing_key, now)
            })?;
        }
    }
    Ok(())
}

pub(crate) fn apply_account_witness_vote(
    state: &mut ChainState,
    op: &AccountWitnessVoteOperation,
) -> EvaluationResult<()> {
    let voter = state.get_account(&op.account)?;
    let (vesting, voted_for) = (voter.vesting_shares.amount, voter.witnesses_voted_for);
    state.get_witness(&op.witness)?;
    let existing = state
        .store()
        .find_by::<WitnessVote>("by_account_witness", &index_key!(&op.account, &op.witness))?
        .map(|v| v.id);

    match (existing, op.approve) {
        (None, true) => {
            ensure(
                voted_for < MAX_ACCOUNT_WITNESS_VOTES,
                "AccountWitnessVote",
                "account has voted for too many witnesses",
            )?;
            state.store_mut().create(|id| WitnessVote {
                id,
                witness: op.witness.clone(),
                account: op.account.clone(),
            })?;
            state.adjust_witness_vote(&op.witness, vesting)?;
            state.modify_account(&op.account, |a| a.witnesses_voted_for += 1)?;
        }
        (Some(id), false) => {
            state.store_mut().remove(id)?;
            state.adjust_witness_vote(&op.witness, -vesting)?;
            state.modify_account(&op.account, |a| a.witnesses_voted_for -= 1)?;
        }
        (Some(_), true) => {
            return Err(EvaluationError::precondition(
                "AccountWitnessVote",
                "vote for this witness already exists",
            ))
        }
        (None, false) => {
            return Err(EvaluationError::precondition(
                "AccountWitnessVote",
                "vote for this witness does not exist",
            ))
        }
    }
    Ok(())
}

pub(crate) fn apply_feed_publish(state: &mut ChainState, op: &FeedPublishOperation) -> EvaluationResult<()> {
    let now = state.head_block_time()?;
    let id = state.get_witness(&op.publisher)?.id;
    state.store_mut().modify(id, |w| {
        w.cbd_exchange_rate = op.exchange_rate;
        w.last_cbd_exchange_update = now;
    })?;
    Ok(())
}
