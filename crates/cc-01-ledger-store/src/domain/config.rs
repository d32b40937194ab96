//! Store configuration.

/// Capacity limits, counted in stored objects across all indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Above this count the store reports [`crate::CapacityStatus::Advisory`].
    pub soft_capacity: usize,
    /// At this count new objects are refused.
    pub hard_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            soft_capacity: 8_000_000,
            hard_capacity: 10_000_000,
        }
    }
}
