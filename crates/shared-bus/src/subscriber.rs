//! # Subscribers
//!
//! Subscriber callbacks and the errors they may report.

use thiserror::Error;

/// Handle returned by [`crate::Signal::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Failure reported by a subscriber callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriberError {
    /// The subscriber rejects the action being announced.
    #[error("Vetoed: {0}")]
    Veto(String),

    /// The subscriber itself failed; the action is unaffected.
    #[error("Subscriber failed: {0}")]
    Failed(String),
}

/// Boxed subscriber callback: read-only view plus event.
pub type SubscriberFn<V, E> =
    Box<dyn Fn(&V, &E) -> Result<(), SubscriberError> + Send + Sync + 'static>;
