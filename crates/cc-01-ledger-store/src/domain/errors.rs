//! Error types for the ledger store.

use thiserror::Error;

/// Ledger store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Index for {0} is not registered")]
    UnknownIndex(&'static str),

    #[error("Index for {0} is already registered")]
    DuplicateIndex(&'static str),

    #[error("Cannot register index for {0} while a session is open")]
    RegistrationDuringSession(&'static str),

    #[error("{object} has no secondary index named {index}")]
    UnknownSecondaryIndex {
        object: &'static str,
        index: &'static str,
    },

    #[error("{object} not found: {key}")]
    NotFound { object: &'static str, key: String },

    #[error("Uniqueness violation on {object}.{index}: {key}")]
    UniquenessViolation {
        object: &'static str,
        index: &'static str,
        key: String,
    },

    #[error("{object} constructor returned id {actual}, expected {expected}")]
    IdMismatch {
        object: &'static str,
        expected: u64,
        actual: u64,
    },

    #[error("Session order violated: innermost open session is {expected:?}, got {actual}")]
    SessionOrder { expected: Option<i64>, actual: i64 },

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Store capacity exhausted: {objects} objects, limit {limit}")]
    CapacityExhausted { objects: usize, limit: usize },
}

impl LedgerError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownIndex(_) => "unknown_index",
            Self::DuplicateIndex(_) => "duplicate_index",
            Self::RegistrationDuringSession(_) => "registration_during_session",
            Self::UnknownSecondaryIndex { .. } => "unknown_secondary_index",
            Self::NotFound { .. } => "object_not_found",
            Self::UniquenessViolation { .. } => "uniqueness_violation",
            Self::IdMismatch { .. } => "id_mismatch",
            Self::SessionOrder { .. } => "session_order",
            Self::NothingToUndo => "nothing_to_undo",
            Self::CapacityExhausted { .. } => "capacity_exhausted",
        }
    }

    /// Programmer errors, as opposed to conditions caused by input.
    /// Uniqueness violations count: callers check for existing records first.
    pub fn is_logic_error(&self) -> bool {
        !matches!(self, Self::NotFound { .. } | Self::CapacityExhausted { .. })
    }
}

/// Result alias for ledger store operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
