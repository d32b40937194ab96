mod errors;
mod item;

pub use errors::*;
pub use item::*;
