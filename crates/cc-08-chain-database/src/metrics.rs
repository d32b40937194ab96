//! # Chain Database Metrics
//!
//! Prometheus metrics for monitoring block application.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! cc-08-chain-database = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `chain_blocks_applied_total` - Counter of blocks applied to the head
//! - `chain_fork_switches_total` - Counter of switches to another branch
//! - `chain_transactions_pushed_total` - Counter of transactions accepted into the pending pool
//! - `chain_head_block_number` - Gauge of the current head block number
//! - `chain_pending_transactions` - Gauge of the pending pool size

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total blocks applied to the head
    pub static ref BLOCKS_APPLIED: IntCounter = register_int_counter!(
        "chain_blocks_applied_total",
        "Total number of blocks applied to the head"
    )
    .expect("Failed to create BLOCKS_APPLIED metric");

    /// Total switches to another branch
    pub static ref FORK_SWITCHES: IntCounter = register_int_counter!(
        "chain_fork_switches_total",
        "Total number of switches to another branch"
    )
    .expect("Failed to create FORK_SWITCHES metric");

    /// Total transactions accepted into the pending pool
    pub static ref TRANSACTIONS_PUSHED: IntCounter = register_int_counter!(
        "chain_transactions_pushed_total",
        "Total number of transactions accepted into the pending pool"
    )
    .expect("Failed to create TRANSACTIONS_PUSHED metric");

    /// Current head block number
    pub static ref HEAD_BLOCK_NUMBER: IntGauge = register_int_gauge!(
        "chain_head_block_number",
        "Current head block number"
    )
    .expect("Failed to create HEAD_BLOCK_NUMBER metric");

    /// Current pending pool size
    pub static ref PENDING_TRANSACTIONS: IntGauge = register_int_gauge!(
        "chain_pending_transactions",
        "Number of transactions in the pending pool"
    )
    .expect("Failed to create PENDING_TRANSACTIONS metric");
}

/// Record a block applied at `block_num`
#[cfg(feature = "metrics")]
pub fn record_block_applied(block_num: u32) {
    BLOCKS_APPLIED.inc();
    HEAD_BLOCK_NUMBER.set(i64::from(block_num));
}

/// Record a switch to another branch
#[cfg(feature = "metrics")]
pub fn record_fork_switch() {
    FORK_SWITCHES.inc();
}

/// Record a transaction accepted into the pending pool
#[cfg(feature = "metrics")]
pub fn record_transaction_pushed() {
    TRANSACTIONS_PUSHED.inc();
}

/// Record the pending pool size
#[cfg(feature = "metrics")]
pub fn set_pending_transactions(count: usize) {
    PENDING_TRANSACTIONS.set(i64::try_from(count).unwrap_or(i64::MAX));
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_block_applied(_block_num: u32) {}

#[cfg(not(feature = "metrics"))]
pub fn record_fork_switch() {}

#[cfg(not(feature = "metrics"))]
pub fn record_transaction_pushed() {}

#[cfg(not(feature = "metrics"))]
pub fn set_pending_transactions(_count: usize) {}
