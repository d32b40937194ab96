//! # Capacity Monitor
//!
//! Degrades to an advisory past the soft threshold and refuses new objects
//! at the hard limit.

use crate::domain::{LedgerError, LedgerResult, StoreConfig};
use tracing::warn;

/// Current capacity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityStatus {
    Normal,
    /// Past the soft threshold. Writes still succeed.
    Advisory { objects: usize, soft_limit: usize },
    /// At the hard limit. New objects are refused.
    Exhausted { objects: usize, hard_limit: usize },
}

#[derive(Debug)]
pub struct CapacityMonitor {
    config: StoreConfig,
    objects: usize,
    advised: bool,
}

impl CapacityMonitor {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            objects: 0,
            advised: false,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn status(&self) -> CapacityStatus {
        if self.objects >= self.config.hard_capacity {
            CapacityStatus::Exhausted {
                objects: self.objects,
                hard_limit: self.config.hard_capacity,
            }
        } else if self.objects >= self.config.soft_capacity {
            CapacityStatus::Advisory {
                objects: self.objects,
                soft_limit: self.config.soft_capacity,
            }
        } else {
            CapacityStatus::Normal
        }
    }

    /// Called before a new object is stored.
    pub(crate) fn check_create(&self) -> LedgerResult<()> {
        if self.objects >= self.config.hard_capacity {
            return Err(LedgerError::CapacityExhausted {
                objects: self.objects,
                limit: self.config.hard_capacity,
            });
        }
        Ok(())
    }

    /// Record the current object count, warning once when crossing the
    /// soft threshold.
    pub(crate) fn observe(&mut self, objects: usize) {
        self.objects = objects;
        if objects >= self.config.soft_capacity {
            if !self.advised {
                self.advised = true;
                warn!(
                    objects,
                    soft_limit = self.config.soft_capacity,
                    hard_limit = self.config.hard_capacity,
                    "Ledger store is nearing capacity"
                );
            }
        } else {
            self.advised = false;
        }
    }
}
