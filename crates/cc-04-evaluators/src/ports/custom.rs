use crate::domain::EvaluationResult;
use cc_02_protocol::CustomJsonOperation;
use cc_03_chain_state::ChainState;

/// Handles `custom_json` operations carrying one registered id.
///
/// Interpreters run inside the transaction's session and may write to
/// their own extension indexes registered on the store. Whatever they
/// write is undone with the transaction.
pub trait CustomOperationInterpreter: Send + Sync {
    fn apply(&self, state: &mut ChainState, op: &CustomJsonOperation) -> EvaluationResult<()>;
}
