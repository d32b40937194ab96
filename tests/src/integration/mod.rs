//! # Integration Scenarios
//!
//! Every scenario runs full chain databases: signed transactions go
//! through the pending pool, blocks are generated, signed and pushed.

pub mod blocks;
pub mod persistence;
pub mod proposals;
pub mod reorg;
