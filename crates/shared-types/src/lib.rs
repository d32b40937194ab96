//! # Shared Types Crate
//!
//! Primitive types shared by every Cedar-Chain subsystem.
//!
//! ## Contents
//!
//! - **Identity**: [`AccountName`], [`BlockId`], [`TransactionId`], [`ChainId`]
//! - **Time**: [`TimePointSec`], second-resolution chain time
//! - **Value**: [`Asset`], [`AssetSymbol`], [`Price`]
//!
//! ## Design Principles
//!
//! - **Checked arithmetic**: every asset operation returns a `Result`. Mixing
//!   symbols or overflowing `i64` is an error, never a panic or a silent wrap.
//! - **Integer only**: no value that reaches consensus state is computed with
//!   floating point.

pub mod asset;
pub mod entities;
pub mod errors;

pub use asset::{Asset, AssetSymbol, Price};
pub use entities::*;
pub use errors::*;
