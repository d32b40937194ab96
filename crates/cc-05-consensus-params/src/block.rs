//! Per-block consensus bookkeeping, run by the block applicator in this
//! order around the block's transactions:
//!
//! ```text
//! validate_block_header
//! process_header_extensions, check_running_version
//!   ... transactions ...
//! update_global_dynamic_data
//! update_signing_witness
//! update_last_irreversible_block
//! create_block_summary
//! update_witness_schedule
//! ```

use crate::domain::{ConsensusError, ConsensusResult};
use crate::slots::{get_scheduled_witness, get_slot_at_time};
use cc_01_ledger_store::Id;
use cc_02_protocol::config::{
    IRREVERSIBLE_THRESHOLD, MAX_RESERVE_RATIO, MAX_UNDO_HISTORY, PERCENT_100,
    RESERVE_RATIO_UPDATE_BLOCKS,
};
use cc_02_protocol::{BlockHeaderExtension, SignedBlock};
use cc_03_chain_state::{BlockSummary, ChainState, DynamicGlobalProperty, SkipFlags, Witness};
use shared_types::BlockId;
use tracing::{debug, info};

/// Linkage, timestamp, producer signature and producer slot.
pub fn validate_block_header(state: &ChainState, block: &SignedBlock, skip: SkipFlags) -> ConsensusResult<()> {
    let head = state.head_block_id()?;
    if block.previous() != head {
        return Err(ConsensusError::UnlinkableBlock {
            block: block.id()?,
            head,
        });
    }
    let head_time = state.head_block_time()?;
    if block.timestamp() <= head_time {
        return Err(ConsensusError::TimestampNotAfterHead {
            timestamp: block.timestamp(),
            head_time,
        });
    }

    let witness = state.get_witness(block.witness())?;
    if !skip.contains(SkipFlags::WITNESS_SIGNATURE) && !block.validate_signee(&witness.signing_key) {
        return Err(ConsensusError::WrongWitnessSignature(witness.owner.clone()));
    }

    if !skip.contains(SkipFlags::WITNESS_SCHEDULE_CHECK) {
        let slot = get_slot_at_time(state, block.timestamp())?;
        if slot == 0 {
            return Err(ConsensusError::NoSlot(block.timestamp()));
        }
        let scheduled = get_scheduled_witness(state, slot)?;
        if scheduled.as_ref() != Some(&witness.owner) {
            return Err(ConsensusError::WrongWitness {
                expected: scheduled.unwrap_or_default(),
                actual: witness.owner.clone(),
            });
        }
    }
    Ok(())
}

/// Record the version the producer runs and the hardfork it votes for.
pub fn process_header_extensions(state: &mut ChainState, block: &SignedBlock) -> ConsensusResult<()> {
    let id = state.get_witness(block.witness())?.id;
    for extension in &block.header().extensions {
        match extension {
            BlockHeaderExtension::Version(version) => {
                state.store_mut().modify(id, |w: &mut Witness| {
                    w.running_version = *version;
                })?;
            }
            BlockHeaderExtension::HardforkVersionVote { version, time } => {
                state.store_mut().modify(id, |w: &mut Witness| {
                    w.hardfork_version_vote = *version;
                    w.hardfork_time_vote = *time;
                })?;
            }
        }
    }
    Ok(())
}

/// The producer must run at least the current hardfork.
pub fn check_running_version(state: &ChainState, block: &SignedBlock) -> ConsensusResult<()> {
    let witness = state.get_witness(block.witness())?;
    let required = state.hardfork_property()?.current_hardfork_version;
    if witness.running_version < required {
        return Err(ConsensusError::OutdatedWitness {
            witness: witness.owner.clone(),
            running: witness.running_version,
            required,
        });
    }
    Ok(())
}

/// Advance the head, charge missed slots to their witnesses and retune
/// the network bandwidth reserve.
pub fn update_global_dynamic_data(
    state: &mut ChainState,
    block: &SignedBlock,
    block_id: BlockId,
    block_size: u32,
    skip: SkipFlags,
) -> ConsensusResult<()> {
    let slot = get_slot_at_time(state, block.timestamp())?;
    if slot == 0 {
        return Err(ConsensusError::NoSlot(block.timestamp()));
    }
    let missed_blocks = slot - 1;

    for missed in 1..=missed_blocks {
        let Some(scheduled) = get_scheduled_witness(state, missed)? else {
            continue;
        };
        if &scheduled == block.witness() {
            continue;
        }
        let id = state.get_witness(&scheduled)?.id;
        state.store_mut().modify(id, |w: &mut Witness| w.total_missed += 1)?;
        debug!(witness = %scheduled, block = block.block_num(), "Witness missed its slot");
    }

    let block_num = block.block_num();
    let timestamp = block.timestamp();
    let producer = block.witness().clone();
    state.modify_dgp(|p| {
        for i in 0..=missed_blocks {
            if p.recent_slots_filled & (1u128 << 127) != 0 {
                p.participation_count = p.participation_count.saturating_sub(1);
            }
            let produced = i == 0;
            p.recent_slots_filled = (p.recent_slots_filled << 1) | u128::from(produced);
            if produced {
                p.participation_count = p.participation_count.saturating_add(1);
            }
        }
        p.head_block_number = block_num;
        p.head_block_id = block_id;
        p.time = timestamp;
        p.current_witness = producer;
        p.current_aslot += u64::from(missed_blocks) + 1;
        p.average_block_size = ((99 * u64::from(p.average_block_size) + u64::from(block_size)) / 100) as u32;

        if block_num % RESERVE_RATIO_UPDATE_BLOCKS == 0 {
            if p.average_block_size > p.maximum_block_size / 4 {
                p.current_reserve_ratio = (p.current_reserve_ratio / 2).max(1);
            } else {
                p.current_reserve_ratio = (p.current_reserve_ratio + 1).min(MAX_RESERVE_RATIO);
            }
            p.max_virtual_bandwidth =
                DynamicGlobalProperty::virtual_bandwidth(p.maximum_block_size, p.current_reserve_ratio);
        }
    })?;

    if !skip.contains(SkipFlags::UNDO_HISTORY_CHECK) {
        let distance = block_num - state.last_irreversible_block_num()?;
        if distance >= MAX_UNDO_HISTORY {
            return Err(ConsensusError::UndoHistoryExceeded { block_num, distance });
        }
    }
    Ok(())
}

pub fn update_signing_witness(state: &mut ChainState, block: &SignedBlock) -> ConsensusResult<()> {
    let aslot = state.dgp()?.current_aslot + u64::from(get_slot_at_time(state, block.timestamp())?);
    let id = state.get_witness(block.witness())?.id;
    let block_num = block.block_num();
    state.store_mut().modify(id, |w: &mut Witness| {
        w.last_aslot = aslot;
        w.last_confirmed_block_num = block_num;
    })?;
    Ok(())
}

/// Raise the last irreversible block to the highest block confirmed by
/// three quarters of the scheduled witnesses. Returns the new number when
/// it moved.
pub fn update_last_irreversible_block(state: &mut ChainState) -> ConsensusResult<Option<u32>> {
    let mut confirmed: Vec<u32> = state
        .witness_schedule()?
        .current_shuffled_witnesses
        .iter()
        .map(|name| state.get_witness(name).map(|w| w.last_confirmed_block_num))
        .collect::<Result<_, _>>()?;
    if confirmed.is_empty() {
        return Ok(None);
    }

    // 1 1 1 2 2 2 2 2 2 2 -> 1 is confirmed by every witness, 2 by 70%.
    let offset = (PERCENT_100 - IRREVERSIBLE_THRESHOLD) as usize * confirmed.len() / PERCENT_100 as usize;
    let (_, candidate, _) = confirmed.select_nth_unstable(offset);
    let candidate = *candidate;

    let current = state.last_irreversible_block_num()?;
    if candidate <= current {
        return Ok(None);
    }
    state.modify_dgp(|p| p.last_irreversible_block_num = candidate)?;
    info!(last_irreversible_block = candidate, "Advanced last irreversible block");
    Ok(Some(candidate))
}

/// Store `block_id` in the TaPoS ring.
pub fn create_block_summary(state: &mut ChainState, block_id: BlockId) -> ConsensusResult<()> {
    let slot = u64::from(block_id.block_num() & 0xFFFF);
    state
        .store_mut()
        .modify(Id::<BlockSummary>::new(slot), |s| s.block_id = block_id)?;
    Ok(())
}
