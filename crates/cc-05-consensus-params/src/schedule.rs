//! # Witness Schedule
//!
//! Every `MAX_WITNESSES` blocks a new round is drawn:
//!
//! ```text
//!  by_vote          ──▶ top MAX_VOTED_WITNESSES (ties broken by name)
//!  by_schedule_time ──▶ next MAX_RUNNER_WITNESSES not already picked
//!                       (virtual time lottery weighted by votes)
//!  shuffle          ──▶ xorshift seeded with the head block time
//! ```
//!
//! The round also fixes the median witness properties and the versions a
//! supermajority of its witnesses run and vote for.

use crate::domain::ConsensusResult;
use cc_01_ledger_store::Id;
use cc_02_protocol::config::{
    HARDFORK_REQUIRED_WITNESS_PERCENT, MAX_RUNNER_WITNESSES, MAX_VOTED_WITNESSES, MAX_WITNESSES,
    VIRTUAL_SCHEDULE_LAP_LENGTH,
};
use cc_02_protocol::{ChainProperties, Version};
use cc_03_chain_state::{ChainState, HardforkProperty, Witness, WitnessSchedule};
use shared_types::{AccountName, TimePointSec};
use std::collections::BTreeMap;
use tracing::debug;

const SHUFFLE_MULTIPLIER: u64 = 2_685_821_657_736_338_717;

/// Witnesses of a round of `scheduled` that must agree on a version.
pub fn required_witnesses(scheduled: usize) -> usize {
    let percent = HARDFORK_REQUIRED_WITNESS_PERCENT as usize;
    (scheduled * percent).div_ceil(100).max(1)
}

pub fn update_witness_schedule(state: &mut ChainState) -> ConsensusResult<()> {
    let head = state.head_block_num()?;
    if head % MAX_WITNESSES as u32 != 0 {
        return Ok(());
    }

    let mut active: Vec<AccountName> = state
        .store()
        .iter_by::<Witness>("by_vote")?
        .filter(|w| !w.signing_key.is_null())
        .take(MAX_VOTED_WITNESSES)
        .map(|w| w.owner.clone())
        .collect();

    let new_virtual_time = select_runners(state, &mut active)?;

    shuffle(&mut active, state.head_block_time()?);
    let majority_version = tally_versions(state, &active)?;
    let median_props = median_props(state, &active)?;

    debug!(
        head,
        witnesses = active.len(),
        %majority_version,
        "Drew witness schedule"
    );
    let next_shuffle_block_num = head + active.len() as u32;
    let maximum_block_size = median_props.maximum_block_size;
    state
        .store_mut()
        .modify(Id::<WitnessSchedule>::new(0), |s| {
            s.current_shuffled_witnesses = active;
            s.next_shuffle_block_num = next_shuffle_block_num;
            s.current_virtual_time = new_virtual_time;
            s.median_props = median_props;
            s.majority_version = majority_version;
        })?;
    state.modify_dgp(|p| p.maximum_block_size = maximum_block_size)?;
    Ok(())
}

/// Add the timeshare witnesses to `active` and move every witness the
/// lottery passed over to its next lap. Returns the new virtual time.
fn select_runners(state: &mut ChainState, active: &mut Vec<AccountName>) -> ConsensusResult<u128> {
    let mut new_virtual_time = state.witness_schedule()?.current_virtual_time;
    let mut processed: Vec<(Id<Witness>, i64)> = Vec::new();
    let mut runners = 0;

    for w in state.store().iter_by::<Witness>("by_schedule_time")? {
        if runners >= MAX_RUNNER_WITNESSES {
            break;
        }
        new_virtual_time = w.virtual_scheduled_time;
        processed.push((w.id, w.votes));
        if !w.signing_key.is_null() && !active.contains(&w.owner) {
            active.push(w.owner.clone());
            runners += 1;
        }
    }

    let mut reset = false;
    for (id, votes) in &processed {
        let lap = VIRTUAL_SCHEDULE_LAP_LENGTH / (*votes as u128 + 1);
        let Some(scheduled) = new_virtual_time.checked_add(lap) else {
            reset = true;
            break;
        };
        state.store_mut().modify(*id, |w: &mut Witness| {
            w.virtual_position = 0;
            w.virtual_last_update = new_virtual_time;
            w.virtual_scheduled_time = scheduled;
        })?;
    }

    // Virtual time overflowed: start every witness over from zero.
    if reset {
        new_virtual_time = 0;
        reset_virtual_schedule_time(state)?;
    }
    Ok(new_virtual_time)
}

/// Put every witness at the start of the virtual schedule.
pub fn reset_virtual_schedule_time(state: &mut ChainState) -> ConsensusResult<()> {
    state
        .store_mut()
        .modify(Id::<WitnessSchedule>::new(0), |s| s.current_virtual_time = 0)?;
    let witnesses: Vec<(Id<Witness>, i64)> = state
        .store()
        .iter::<Witness>()?
        .map(|w| (w.id, w.votes))
        .collect();
    for (id, votes) in witnesses {
        state.store_mut().modify(id, |w: &mut Witness| {
            w.virtual_position = 0;
            w.virtual_last_update = 0;
            w.virtual_scheduled_time = VIRTUAL_SCHEDULE_LAP_LENGTH / (votes as u128 + 1);
        })?;
    }
    Ok(())
}

fn shuffle(witnesses: &mut [AccountName], seed_time: TimePointSec) {
    let now_hi = u64::from(seed_time.secs()) << 32;
    let n = witnesses.len();
    for i in 0..n {
        let mut k = now_hi.wrapping_add((i as u64).wrapping_mul(SHUFFLE_MULTIPLIER));
        k ^= k >> 12;
        k ^= k << 25;
        k ^= k >> 27;
        k = k.wrapping_mul(SHUFFLE_MULTIPLIER);
        let j = i + (k % (n - i) as u64) as usize;
        witnesses.swap(i, j);
    }
}

/// Record the next hardfork the round agrees on and return the highest
/// version a supermajority runs.
fn tally_versions(state: &mut ChainState, active: &[AccountName]) -> ConsensusResult<Version> {
    let mut running: BTreeMap<Version, usize> = BTreeMap::new();
    let mut votes: BTreeMap<(Version, TimePointSec), usize> = BTreeMap::new();
    for name in active {
        let w = state.get_witness(name)?;
        *running.entry(w.running_version).or_default() += 1;
        *votes
            .entry((w.hardfork_version_vote, w.hardfork_time_vote))
            .or_default() += 1;
    }
    let required = required_witnesses(active.len());

    // Witnesses on a version also count toward every older one.
    let mut majority_version = Version::default();
    let mut on_version_or_newer = active.len();
    for (version, count) in &running {
        if on_version_or_newer >= required {
            majority_version = *version;
        }
        on_version_or_newer -= count;
    }

    let agreed = votes
        .iter()
        .find(|(_, count)| **count >= required)
        .map(|((version, time), _)| (*version, *time));
    state
        .store_mut()
        .modify(Id::<HardforkProperty>::new(0), |h| match agreed {
            Some((version, time)) => {
                h.next_hardfork = version;
                h.next_hardfork_time = time;
            }
            None => h.next_hardfork = h.current_hardfork_version,
        })?;
    Ok(majority_version)
}

fn median_props(state: &ChainState, active: &[AccountName]) -> ConsensusResult<ChainProperties> {
    let mut props: Vec<ChainProperties> = active
        .iter()
        .map(|name| state.get_witness(name).map(|w| w.props.clone()))
        .collect::<Result<_, _>>()?;
    if props.is_empty() {
        return Ok(state.witness_schedule()?.median_props.clone());
    }
    let middle = props.len() / 2;

    props.sort_by_key(|p| p.account_creation_fee.amount);
    let account_creation_fee = props[middle].account_creation_fee;
    props.sort_by_key(|p| p.maximum_block_size);
    let maximum_block_size = props[middle].maximum_block_size;

    Ok(ChainProperties {
        account_creation_fee,
        maximum_block_size,
    })
}
