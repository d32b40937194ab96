pub mod config;
pub mod errors;
pub mod objects;
pub mod skip_flags;

pub use config::GenesisConfig;
pub use errors::{ChainStateError, ChainStateResult};
pub use objects::*;
pub use skip_flags::SkipFlags;
