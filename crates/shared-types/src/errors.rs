//! # Error Types
//!
//! Defines error types shared across subsystems.

use crate::AssetSymbol;
use thiserror::Error;

/// Errors raised by asset and price arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// Operands carry different symbols.
    #[error("Asset symbol mismatch: {left} vs {right}")]
    SymbolMismatch {
        left: AssetSymbol,
        right: AssetSymbol,
    },

    /// Result does not fit in the 64-bit amount.
    #[error("Asset arithmetic overflow")]
    Overflow,

    /// Price with a zero or negative side, or with equal symbols.
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Textual asset could not be parsed.
    #[error("Cannot parse asset: {0}")]
    Parse(String),
}

impl AssetError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SymbolMismatch { .. } => "asset_symbol_mismatch",
            Self::Overflow => "asset_overflow",
            Self::InvalidPrice(_) => "invalid_price",
            Self::Parse(_) => "asset_parse",
        }
    }
}

/// Result alias for asset arithmetic.
pub type AssetResult<T> = Result<T, AssetError>;
