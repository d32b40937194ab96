//! Extension points for collaborators outside the core.

pub mod custom;

pub use custom::CustomOperationInterpreter;
