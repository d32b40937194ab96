//! # cc-06-rewards
//!
//! The per-block economy. Everything here is integer arithmetic; amounts
//! that could overflow 128 bits go through `U256`.
//!
//! - [`funds`]: inflation, the median price feed, the null account burn,
//!   the virtual supply and dollar print rate, liquidity rewards.
//! - [`cashout`]: content payouts to authors and curators.
//! - [`maturation`]: conversions, vesting withdrawals, account recovery
//!   expiry and unratified escrows.
//! - [`RewardProcessor`] runs them in block order.

pub mod cashout;
pub mod domain;
pub mod funds;
pub mod maturation;
pub mod service;

pub use domain::{RewardError, RewardResult};
pub use funds::BlockInflation;
pub use service::{BlockRewards, RewardProcessor};
