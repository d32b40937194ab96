//! # cc-04-evaluators
//!
//! Turns operations into state changes.
//!
//! - [`EvaluatorRegistry::apply_transaction`] runs the transaction checks
//!   (validation, duplicates, authority, TaPoS, bandwidth) and applies each
//!   operation with its notifications.
//! - Built-in operations dispatch by an exhaustive match. `custom_json`
//!   payloads go to the [`CustomOperationInterpreter`] registered for their
//!   id.
//! - Proposals, the internal market, escrow and account recovery live here
//!   because they are driven by operations. The per-block sweeps that expire
//!   transactions, orders and proposals are exposed for the block applier.

pub mod domain;
pub mod ports;
pub mod registry;
pub mod service;

mod evaluators;

pub use domain::{EvaluationError, EvaluationResult};
pub use ports::CustomOperationInterpreter;
pub use registry::EvaluatorRegistry;
