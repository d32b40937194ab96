mod checkpoints;
mod errors;
mod hardforks;

pub use checkpoints::*;
pub use errors::*;
pub use hardforks::*;
