//! Block log implementations.

pub mod file;
pub mod lock;
pub mod memory;

pub use file::FileBlockLog;
pub use lock::DirectoryLock;
pub use memory::MemoryBlockLog;
