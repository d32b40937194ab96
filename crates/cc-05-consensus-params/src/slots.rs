//! Slot arithmetic.
//!
//! Slots are counted from the head block: slot 1 is the first slot after
//! it. Slot 0 is the head block's own slot and has no witness.

use crate::domain::ConsensusResult;
use cc_02_protocol::config::BLOCK_INTERVAL;
use cc_03_chain_state::ChainState;
use shared_types::{AccountName, TimePointSec};

/// Start time of `slot`. Slot 0 maps to `TimePointSec::MIN`.
pub fn get_slot_time(state: &ChainState, slot: u32) -> ConsensusResult<TimePointSec> {
    if slot == 0 {
        return Ok(TimePointSec::MIN);
    }
    let dgp = state.dgp()?;
    let offset = slot.saturating_mul(BLOCK_INTERVAL);
    if dgp.head_block_number == 0 {
        // Genesis time need not be aligned to the interval.
        return Ok(dgp.time + offset);
    }
    let head_slot_time = dgp.time.secs() / BLOCK_INTERVAL * BLOCK_INTERVAL;
    Ok(TimePointSec::from_secs(head_slot_time) + offset)
}

/// Slot `when` falls in, or 0 when it is not after the head block's slot.
pub fn get_slot_at_time(state: &ChainState, when: TimePointSec) -> ConsensusResult<u32> {
    let first_slot_time = get_slot_time(state, 1)?;
    if when < first_slot_time {
        return Ok(0);
    }
    Ok((when.secs() - first_slot_time.secs()) / BLOCK_INTERVAL + 1)
}

/// Witness scheduled to produce `slot`. A pure function of the current
/// schedule and the absolute slot number.
pub fn get_scheduled_witness(state: &ChainState, slot: u32) -> ConsensusResult<Option<AccountName>> {
    if slot == 0 {
        return Ok(None);
    }
    let aslot = state.dgp()?.current_aslot + u64::from(slot);
    let witnesses = &state.witness_schedule()?.current_shuffled_witnesses;
    if witnesses.is_empty() {
        return Ok(None);
    }
    let index = (aslot % witnesses.len() as u64) as usize;
    Ok(witnesses.get(index).cloned())
}
