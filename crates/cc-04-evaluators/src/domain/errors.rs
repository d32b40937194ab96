//! Error types for operation and transaction evaluation.

use cc_01_ledger_store::LedgerError;
use cc_02_protocol::ProtocolError;
use cc_03_chain_state::ChainStateError;
use shared_types::{AccountName, AssetError, TimePointSec, TransactionId};
use thiserror::Error;

/// Why a transaction or one of its operations was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    State(#[from] ChainStateError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    // =========================================================================
    // Transaction checks
    // =========================================================================
    #[error("Duplicate transaction {0}")]
    DuplicateTransaction(TransactionId),

    #[error("Transaction expired at {expiration}, head block time is {now}")]
    TransactionExpired {
        expiration: TimePointSec,
        now: TimePointSec,
    },

    #[error("Transaction expiration {expiration} is later than {max}")]
    ExpirationTooFar {
        expiration: TimePointSec,
        max: TimePointSec,
    },

    #[error("Transaction references an unknown block (ref_block_num {ref_block_num})")]
    TaposMismatch { ref_block_num: u16 },

    #[error("Account {0} exceeded its bandwidth allocation")]
    BandwidthExceeded(AccountName),

    // =========================================================================
    // Operation preconditions
    // =========================================================================
    #[error("{operation}: {reason}")]
    Precondition {
        operation: &'static str,
        reason: String,
    },

    #[error("{object} {key} already exists")]
    ObjectExists { object: &'static str, key: String },

    // =========================================================================
    // Proposals
    // =========================================================================
    #[error("You can't create more than {max} nested proposals")]
    ProposalDepthTooHigh { max: u32 },

    #[error("This proposal is in its review period. No new approvals may be added")]
    ApprovalInReviewPeriod,

    #[error("Can't remove the non existing approval {0}")]
    NonExistingApproval(String),

    #[error("Can't add already existing approval {0}")]
    AlreadyExistingApproval(String),

    #[error("{requester} is not authoritative for this proposal")]
    ProposalDeleteNotAllowed { requester: AccountName },

    // =========================================================================
    // Custom operations
    // =========================================================================
    #[error("An interpreter for custom operation {0} is already registered")]
    DuplicateInterpreter(String),

    #[error("Custom operation {id} failed: {reason}")]
    CustomOperation { id: String, reason: String },
}

impl EvaluationError {
    pub(crate) fn precondition(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Precondition {
            operation,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::State(e) => e.code(),
            Self::Protocol(e) => e.code(),
            Self::DuplicateTransaction(_) => "tx_duplicate",
            Self::TransactionExpired { .. } => "tx_expired",
            Self::ExpirationTooFar { .. } => "tx_expiration_too_far",
            Self::TaposMismatch { .. } => "tx_tapos_mismatch",
            Self::BandwidthExceeded(_) => "bandwidth_exceeded",
            Self::Precondition { .. } => "precondition_failed",
            Self::ObjectExists { .. } => "object_already_exists",
            Self::ProposalDepthTooHigh { .. } => "proposal_depth_too_high",
            Self::ApprovalInReviewPeriod => "cannot_add_approval_in_review_period",
            Self::NonExistingApproval(_) => "non_existing_approval",
            Self::AlreadyExistingApproval(_) => "already_existing_approval",
            Self::ProposalDeleteNotAllowed { .. } => "proposal_delete_not_allowed",
            Self::DuplicateInterpreter(_) => "duplicate_custom_interpreter",
            Self::CustomOperation { .. } => "custom_operation_failed",
        }
    }

    /// Defects in the caller rather than bad input.
    pub fn is_logic_error(&self) -> bool {
        match self {
            Self::State(e) => e.is_logic_error(),
            Self::NonExistingApproval(_)
            | Self::AlreadyExistingApproval(_)
            | Self::DuplicateInterpreter(_)
            | Self::ProposalDepthTooHigh { .. }
            | Self::ApprovalInReviewPeriod
            | Self::ProposalDeleteNotAllowed { .. } => true,
            _ => false,
        }
    }
}

impl From<LedgerError> for EvaluationError {
    fn from(e: LedgerError) -> Self {
        Self::State(e.into())
    }
}

impl From<AssetError> for EvaluationError {
    fn from(e: AssetError) -> Self {
        Self::State(e.into())
    }
}

pub type EvaluationResult<T> = Result<T, EvaluationError>;
