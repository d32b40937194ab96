//! Storage the chain database depends on.

pub mod block_log;

pub use block_log::BlockLog;
