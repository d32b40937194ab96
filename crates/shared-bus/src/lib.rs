//! # Shared Bus - Synchronous Notification Signals
//!
//! The chain publishes state-change notifications to external collaborators
//! (indexing plugins, APIs) through [`Signal`]s.
//!
//! ## Rules
//!
//! - Subscribers run synchronously, on the publishing thread, in
//!   registration order.
//! - Subscribers receive a read-only view (`&V`) of the publisher's state
//!   plus the event (`&E`). They cannot mutate the publisher.
//! - A subscriber may fail with [`SubscriberError`]. The publisher decides
//!   whether the failure vetoes the action ([`Signal::emit`]) or is only
//!   logged ([`Signal::emit_all`]).
//! - Subscribers must not subscribe or unsubscribe from inside a callback.
//!
//! ```text
//!   publisher ──emit(&view, &event)──▶ [ sub #1 ] ─▶ [ sub #2 ] ─▶ [ sub #3 ]
//!                                         registration order, same thread
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod publisher;
pub mod subscriber;

pub use publisher::Signal;
pub use subscriber::{SubscriberError, SubscriberFn, SubscriptionId};
