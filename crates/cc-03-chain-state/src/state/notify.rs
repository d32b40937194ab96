//! Publishing to [`crate::ChainNotifications`].

use super::ChainState;
use crate::domain::{ChainStateError, ChainStateResult};
use crate::notifications::OperationNotification;
use cc_02_protocol::{Operation, SignedBlock, SignedTransaction};
use std::sync::Arc;
use tracing::{debug, warn};

impl ChainState {
    /// Notification for `op` at the current position in the block.
    pub fn operation_notification(&self, op: Operation) -> OperationNotification {
        OperationNotification {
            trx_id: self.context.current_trx_id,
            block: self.context.current_block_num,
            trx_in_block: self.context.current_trx_in_block,
            op_in_trx: self.context.current_op_in_trx,
            virtual_op: self.context.current_virtual_op,
            op,
        }
    }

    /// Subscribers may veto while producing. On blocks from the network a
    /// veto cannot stop consensus and is only logged.
    pub fn notify_pre_apply_operation(&self, note: &OperationNotification) -> ChainStateResult<()> {
        let notifications = Arc::clone(&self.notifications);
        if self.context.producing {
            notifications
                .pre_apply_operation
                .emit(self, note)
                .map_err(|e| ChainStateError::Vetoed {
                    operation: note.op.name(),
                    reason: e.to_string(),
                })
        } else {
            let failures = notifications.pre_apply_operation.emit_all(self, note);
            if failures > 0 {
                warn!(
                    operation = note.op.name(),
                    block = note.block,
                    failures,
                    "Ignored pre-apply subscriber failures on a network block"
                );
            }
            Ok(())
        }
    }

    /// Records the operation as applied this block, then notifies.
    pub fn notify_post_apply_operation(&mut self, note: OperationNotification) {
        let notifications = Arc::clone(&self.notifications);
        notifications.post_apply_operation.emit_all(self, &note);
        self.applied_operations.push(note);
    }

    /// Record a chain-produced operation such as a reward payout.
    pub fn push_virtual_operation(&mut self, op: Operation) -> ChainStateResult<()> {
        if !op.is_virtual() {
            return Err(ChainStateError::InvariantViolation(format!(
                "{} is not a virtual operation",
                op.name()
            )));
        }
        let note = self.operation_notification(op);
        self.context.current_virtual_op += 1;
        let notifications = Arc::clone(&self.notifications);
        notifications.pre_apply_operation.emit_all(self, &note);
        debug!(operation = note.op.name(), block = note.block, "Virtual operation");
        self.notify_post_apply_operation(note);
        Ok(())
    }

    pub fn notify_applied_block(&self, block: &SignedBlock) {
        let notifications = Arc::clone(&self.notifications);
        notifications.applied_block.emit_all(self, block);
    }

    pub fn notify_on_pending_transaction(&self, trx: &SignedTransaction) {
        let notifications = Arc::clone(&self.notifications);
        notifications.on_pending_transaction.emit_all(self, trx);
    }

    pub fn notify_on_applied_transaction(&self, trx: &SignedTransaction) {
        let notifications = Arc::clone(&self.notifications);
        notifications.on_applied_transaction.emit_all(self, trx);
    }
}
