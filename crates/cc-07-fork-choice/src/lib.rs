//! # cc-07-fork-choice
//!
//! The buffer of reversible blocks from which the best chain head is
//! chosen.
//!
//! [`ForkDatabase`] keeps every block that could still be reorganized away,
//! linked to its parent, and parks blocks whose parent has not arrived.
//! The head is the highest linked block; between branches of equal length
//! the one seen first stays head.

pub mod domain;
pub mod service;

pub use domain::*;
pub use service::ForkDatabase;
