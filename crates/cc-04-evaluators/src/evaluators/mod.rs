//! One module per operation family. Each evaluator checks the stateful
//! preconditions of its operation and applies it to the [`ChainState`].
//!
//! [`ChainState`]: cc_03_chain_state::ChainState

pub(crate) mod account;
pub(crate) mod content;
pub(crate) mod custom;
pub(crate) mod escrow;
pub(crate) mod market;
pub(crate) mod proposal;
pub(crate) mod recovery;
pub(crate) mod transfer;
pub(crate) mod witness;

use crate::domain::{EvaluationError, EvaluationResult};

pub(crate) fn ensure(condition: bool, operation: &'static str, reason: &str) -> EvaluationResult<()> {
    if condition {
        Ok(())
    } else {
        Err(EvaluationError::precondition(operation, reason))
    }
}
