use crate::domain::{EvaluationError, EvaluationResult};
use crate::registry::EvaluatorRegistry;
use cc_02_protocol::CustomJsonOperation;
use cc_03_chain_state::ChainState;
use tracing::{debug, warn};

/// Route the payload to the interpreter registered for its id. Unknown ids
/// are accepted and ignored. An interpreter failure rejects the operation
/// only while producing; in a received block its writes are discarded and
/// the block still applies.
pub(crate) fn apply_custom_json(
    registry: &EvaluatorRegistry,
    state: &mut ChainState,
    op: &CustomJsonOperation,
) -> EvaluationResult<()> {
    let Some(interpreter) = registry.interpreter(&op.id).cloned() else {
        debug!(id = %op.id, "No interpreter for custom operation");
        return Ok(());
    };

    match state.with_session(|s| interpreter.apply(s, op)) {
        Ok(()) => Ok(()),
        Err(e) if state.is_producing() => Err(EvaluationError::CustomOperation {
            id: op.id.clone(),
            reason: e.to_string(),
        }),
        Err(e) => {
            warn!(id = %op.id, error = %e, "Custom operation failed, ignoring");
            Ok(())
        }
    }
}
