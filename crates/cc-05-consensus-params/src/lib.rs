//! # cc-05-consensus-params
//!
//! Who may produce which block, and what follows once they do.
//!
//! - [`slots`]: slot times and the witness scheduled for each slot.
//! - [`schedule`]: the per-round draw of voted and timeshare witnesses,
//!   median chain properties and the version majority.
//! - [`block`]: header checks and the bookkeeping run for every applied
//!   block (missed slots, participation, bandwidth reserve, signing
//!   witness, last irreversible block, TaPoS summaries).
//! - [`ConsensusEngine`]: hardfork activation and checkpoints.

pub mod block;
pub mod domain;
pub mod schedule;
pub mod service;
pub mod slots;

pub use domain::*;
pub use schedule::{required_witnesses, update_witness_schedule};
pub use service::ConsensusEngine;
pub use slots::{get_scheduled_witness, get_slot_at_time, get_slot_time};
