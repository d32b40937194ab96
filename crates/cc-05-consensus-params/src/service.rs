//! # Consensus Engine
//!
//! Owns the node-local consensus configuration: which hardforks exist and
//! when they may activate, and which blocks are pinned by checkpoint.
//! Everything else it needs lives in the chain state.

use crate::domain::{Checkpoints, ConsensusError, ConsensusResult, HardforkSchedule};
use crate::schedule::reset_virtual_schedule_time;
use cc_02_protocol::config::{HARDFORK_1, HARDFORK_2};
use cc_02_protocol::Version;
use cc_03_chain_state::{Account, ChainState, HardforkProperty, Witness, WitnessVote};
use cc_01_ledger_store::Id;
use shared_types::{AccountName, BlockId, TimePointSec};
use tracing::info;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Default)]
pub struct ConsensusEngine {
    hardforks: HardforkSchedule,
    checkpoints: Checkpoints,
}

impl ConsensusEngine {
    pub fn new(hardforks: HardforkSchedule) -> Self {
        Self {
            hardforks,
            checkpoints: Checkpoints::default(),
        }
    }

    pub fn hardforks(&self) -> &HardforkSchedule {
        &self.hardforks
    }

    pub fn checkpoints(&self) -> &Checkpoints {
        &self.checkpoints
    }

    pub fn add_checkpoints(&mut self, checkpoints: impl IntoIterator<Item = (u32, BlockId)>) {
        self.checkpoints.add(checkpoints);
    }

    /// Verify `id` against the checkpoint at `block_num`, if any.
    pub fn check_checkpoint(&self, block_num: u32, id: &BlockId) -> ConsensusResult<()> {
        self.checkpoints.check(block_num, id)
    }

    /// True when `block_num` is at or below the last checkpoint, so its
    /// signatures and authorities need not be checked.
    pub fn before_last_checkpoint(&self, block_num: u32) -> bool {
        self.checkpoints.covers(block_num)
    }

    // =========================================================================
    // Hardforks
    // =========================================================================

    /// Apply every hardfork whose time has come and, unless the schedule
    /// waives votes, whose version the witness majority has agreed on.
    /// Returns how many were applied.
    pub fn process_hardforks(&self, state: &mut ChainState) -> ConsensusResult<u32> {
        let mut applied = 0;
        loop {
            let now = state.head_block_time()?;
            let property = state.hardfork_property()?;
            let next = property.last_hardfork + 1;
            let Some((version, time)) = self.hardforks.get(next) else {
                break;
            };
            if time > now {
                break;
            }
            if self.hardforks.require_witness_votes
                && !(property.next_hardfork >= version && property.next_hardfork_time <= now)
            {
                break;
            }
            self.apply_hardfork(state, next, version, time)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Apply hardforks up to and including `hardfork` immediately,
    /// regardless of time or votes.
    pub fn set_hardfork(&self, state: &mut ChainState, hardfork: u32) -> ConsensusResult<()> {
        if hardfork > self.hardforks.len() {
            return Err(ConsensusError::UnknownHardfork(hardfork));
        }
        let now = state.head_block_time()?;
        let last = state.hardfork_property()?.last_hardfork;
        for next in last + 1..=hardfork {
            let (version, _) = self
                .hardforks
                .get(next)
                .ok_or(ConsensusError::UnknownHardfork(next))?;
            self.apply_hardfork(state, next, version, now)?;
        }
        Ok(())
    }

    fn apply_hardfork(
        &self,
        state: &mut ChainState,
        hardfork: u32,
        version: Version,
        time: TimePointSec,
    ) -> ConsensusResult<()> {
        match hardfork {
            HARDFORK_1 => reset_virtual_schedule_time(state)?,
            HARDFORK_2 => retally_witness_votes(state)?,
            _ => return Err(ConsensusError::UnknownHardfork(hardfork)),
        }

        state.store_mut().modify(Id::<HardforkProperty>::new(0), |p| {
            p.processed_hardforks.push(time);
            p.last_hardfork = hardfork;
            p.current_hardfork_version = version;
        })?;
        info!(
            hardfork,
            %version,
            block = state.head_block_num()?,
            "Applied hardfork"
        );
        Ok(())
    }
}

/// Recompute every witness's votes from the standing witness votes and
/// the voters' current vesting.
fn retally_witness_votes(state: &mut ChainState) -> ConsensusResult<()> {
    let witnesses: Vec<Id<Witness>> = state.store().iter::<Witness>()?.map(|w| w.id).collect();
    for id in witnesses {
        state.store_mut().modify(id, |w: &mut Witness| {
            w.votes = 0;
            w.virtual_position = 0;
        })?;
    }

    let votes: Vec<(AccountName, AccountName)> = state
        .store()
        .iter::<WitnessVote>()?
        .map(|v| (v.account.clone(), v.witness.clone()))
        .collect();
    for (account, witness) in votes {
        let weight = state.get_account(&account).map(|a: &Account| a.vesting_shares.amount)?;
        state.adjust_witness_vote(&witness, weight)?;
    }
    Ok(())
}
