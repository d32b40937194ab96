//! # cc-08-chain-database
//!
//! The chain itself: blocks in, state transitions out.
//!
//! [`ChainDatabase`] ties the other crates together. It validates and
//! applies blocks, follows the best branch of the fork buffer, keeps a pool
//! of pending transactions on top of the head, produces blocks, and writes
//! irreversible blocks to the [`BlockLog`]. [`Chain`] shares it between
//! threads.
//!
//! ## Usage
//!
//! ```ignore
//! let chain = Chain::open(ChainConfig::default().with_data_dir("data"))?;
//! chain.push_block(&block, SkipFlags::NOTHING)?;
//! let head = chain.with_read_lock(|db| db.head_block_num())?;
//! ```

pub mod adapters;
pub mod chain;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{FileBlockLog, MemoryBlockLog};
pub use chain::Chain;
pub use domain::{BlockLogError, BlockLogResult, ChainConfig, ChainError, ChainResult};
pub use ports::BlockLog;
pub use service::{ChainDatabase, REPLAY_SKIP, REPLAY_VERIFY_SKIP};
