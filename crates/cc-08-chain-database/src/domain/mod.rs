pub mod config;
pub mod errors;

pub use config::ChainConfig;
pub use errors::{BlockLogError, BlockLogResult, ChainError, ChainResult};
