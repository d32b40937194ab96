//! # Cedar-Chain Test Suite
//!
//! Unified test crate for behavior that spans several crates.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Shared genesis, producers and transaction builders
//! ├── integration/      # Scenarios driven through the chain database
//! │   ├── blocks.rs     # Duplicate blocks, competing candidates
//! │   ├── reorg.rs      # Branch switches against direct application
//! │   ├── proposals.rs  # Proposal approval through signed transactions
//! │   └── persistence.rs# Block log, restart and reindex
//! └── properties/       # Property tests over random inputs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cc-tests
//!
//! # By category
//! cargo test -p cc-tests integration::
//! cargo test -p cc-tests properties::
//!
//! # Benchmarks
//! cargo bench -p cc-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
pub mod properties;
