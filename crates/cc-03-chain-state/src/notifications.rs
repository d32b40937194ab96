//! # Chain Notifications
//!
//! Hook points external collaborators subscribe to. Every signal hands its
//! subscribers a read-only [`ChainState`] plus the event, on the applying
//! thread, in registration order.
//!
//! | Signal | Fires | Veto |
//! |--------|-------|------|
//! | `pre_apply_operation` | before an operation's evaluator runs | only while producing |
//! | `post_apply_operation` | after an operation applied | never |
//! | `applied_block` | after a block applied, before its session closes | never |
//! | `on_pending_transaction` | after a transaction joined the pending pool | never |
//! | `on_applied_transaction` | after a transaction applied | never |

use crate::state::ChainState;
use cc_02_protocol::{Operation, SignedBlock, SignedTransaction};
use shared_bus::Signal;
use shared_types::TransactionId;

/// Where an operation was applied, plus the operation itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationNotification {
    /// `None` for operations applied outside a transaction (virtual
    /// operations produced by block processing).
    pub trx_id: Option<TransactionId>,
    pub block: u32,
    pub trx_in_block: u32,
    pub op_in_trx: u16,
    pub virtual_op: u32,
    pub op: Operation,
}

pub struct ChainNotifications {
    pub pre_apply_operation: Signal<ChainState, OperationNotification>,
    pub post_apply_operation: Signal<ChainState, OperationNotification>,
    pub applied_block: Signal<ChainState, SignedBlock>,
    pub on_pending_transaction: Signal<ChainState, SignedTransaction>,
    pub on_applied_transaction: Signal<ChainState, SignedTransaction>,
}

impl Default for ChainNotifications {
    fn default() -> Self {
        Self {
            pre_apply_operation: Signal::new("pre_apply_operation"),
            post_apply_operation: Signal::new("post_apply_operation"),
            applied_block: Signal::new("applied_block"),
            on_pending_transaction: Signal::new("on_pending_transaction"),
            on_applied_transaction: Signal::new("on_applied_transaction"),
        }
    }
}

impl std::fmt::Debug for ChainNotifications {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainNotifications")
            .field("pre_apply_operation", &self.pre_apply_operation)
            .field("post_apply_operation", &self.post_apply_operation)
            .field("applied_block", &self.applied_block)
            .field("on_pending_transaction", &self.on_pending_transaction)
            .field("on_applied_transaction", &self.on_applied_transaction)
            .finish()
    }
}
