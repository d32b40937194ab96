//! Error types for protocol validation and authority checks.

use shared_crypto::{CryptoError, PublicKey};
use shared_types::{AccountName, AssetError};
use std::collections::BTreeSet;
use thiserror::Error;

/// Stateless validation and authority errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("Transaction has no operations")]
    EmptyTransaction,

    #[error("Virtual operation {0} cannot be included in a transaction")]
    VirtualOperation(&'static str),

    #[error("Duplicate signature from key {0}")]
    DuplicateSignature(PublicKey),

    #[error("Missing active authority of {accounts:?}")]
    MissingActiveAuthority {
        accounts: BTreeSet<AccountName>,
        used_signatures: BTreeSet<PublicKey>,
    },

    #[error("Missing owner authority of {accounts:?}")]
    MissingOwnerAuthority {
        accounts: BTreeSet<AccountName>,
        used_signatures: BTreeSet<PublicKey>,
    },

    #[error("Missing posting authority of {accounts:?}")]
    MissingPostingAuthority {
        accounts: BTreeSet<AccountName>,
        used_signatures: BTreeSet<PublicKey>,
    },

    #[error("Missing authority")]
    MissingOtherAuthority,

    #[error("Irrelevant signatures: {0:?}")]
    IrrelevantSignature(BTreeSet<PublicKey>),

    #[error("Irrelevant approvals: {0:?}")]
    IrrelevantApproval(BTreeSet<AccountName>),

    #[error("Posting authority cannot be combined with active, owner or other authority")]
    MixedPostingAuthority,

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl ProtocolError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::Asset(e) => e.code(),
            Self::Crypto(_) => "crypto",
            Self::EmptyTransaction => "tx_no_operations",
            Self::VirtualOperation(_) => "virtual_operation",
            Self::DuplicateSignature(_) => "tx_duplicate_sig",
            Self::MissingActiveAuthority { .. } => "tx_missing_active_auth",
            Self::MissingOwnerAuthority { .. } => "tx_missing_owner_auth",
            Self::MissingPostingAuthority { .. } => "tx_missing_posting_auth",
            Self::MissingOtherAuthority => "tx_missing_other_auth",
            Self::IrrelevantSignature(_) => "tx_irrelevant_sig",
            Self::IrrelevantApproval(_) => "tx_irrelevant_approval",
            Self::MixedPostingAuthority => "tx_combined_posting_auth",
            Self::Serialization(_) => "serialization",
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}

impl From<bincode::Error> for ProtocolError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for protocol checks.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
