//! Hardfork activation table.

use cc_02_protocol::config::{HARDFORK_1_TIME, HARDFORK_1_VERSION, HARDFORK_2_TIME, HARDFORK_2_VERSION};
use cc_02_protocol::Version;
use shared_types::TimePointSec;

/// When each hardfork may activate.
///
/// Entry `n` describes hardfork `n + 1`; hardfork 0 is genesis. A hardfork
/// activates once its time has come and, when `require_witness_votes` is
/// set, once the witness majority votes for its version. Chains replayed
/// from a configured genesis (test networks) apply every due hardfork by
/// time alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardforkSchedule {
    entries: Vec<(Version, TimePointSec)>,
    pub require_witness_votes: bool,
}

impl Default for HardforkSchedule {
    fn default() -> Self {
        Self {
            entries: vec![
                (HARDFORK_1_VERSION, TimePointSec::from_secs(HARDFORK_1_TIME)),
                (HARDFORK_2_VERSION, TimePointSec::from_secs(HARDFORK_2_TIME)),
            ],
            require_witness_votes: true,
        }
    }
}

impl HardforkSchedule {
    /// Same versions, every hardfork due at `time`, no votes needed.
    pub fn all_at(time: TimePointSec) -> Self {
        let mut schedule = Self::default();
        for entry in &mut schedule.entries {
            entry.1 = time;
        }
        schedule.require_witness_votes = false;
        schedule
    }

    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Version and activation time of hardfork `hardfork` (1-based).
    pub fn get(&self, hardfork: u32) -> Option<(Version, TimePointSec)> {
        let index = usize::try_from(hardfork.checked_sub(1)?).ok()?;
        self.entries.get(index).copied()
    }
}
