//! # Signal
//!
//! An ordered list of subscriber callbacks invoked synchronously.

use crate::subscriber::{SubscriberError, SubscriberFn, SubscriptionId};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// One notification hook.
///
/// `V` is the read-only view handed to subscribers, `E` the event payload.
pub struct Signal<V: ?Sized, E> {
    name: &'static str,
    subscribers: RwLock<Vec<(SubscriptionId, SubscriberFn<V, E>)>>,
    next_id: AtomicU64,
    events_published: AtomicU64,
}

impl<V: ?Sized, E> Signal<V, E> {
    /// Create a signal with no subscribers.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            events_published: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Append a subscriber. It runs after every previously registered one.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&V, &E) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Box::new(callback)));
        debug!(signal = self.name, subscription = id.0, "New subscription created");
        id
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        before != subscribers.len()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Total number of emissions.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    /// Invoke subscribers in order, stopping at the first failure and
    /// returning it. Used where a subscriber may veto.
    pub fn emit(&self, view: &V, event: &E) -> Result<(), SubscriberError> {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        let subscribers = self.subscribers.read();
        for (id, callback) in subscribers.iter() {
            if let Err(e) = callback(view, event) {
                debug!(signal = self.name, subscription = id.0, error = %e, "Subscriber rejected event");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Invoke every subscriber in order. Failures are logged and counted but
    /// never stop the remaining subscribers.
    pub fn emit_all(&self, view: &V, event: &E) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        let subscribers = self.subscribers.read();
        let mut failures = 0;
        for (id, callback) in subscribers.iter() {
            if let Err(e) = callback(view, event) {
                failures += 1;
                warn!(signal = self.name, subscription = id.0, error = %e, "Subscriber failed");
            }
        }
        failures
    }
}

impl<V: ?Sized, E> std::fmt::Debug for Signal<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct View {
        height: u32,
    }

    #[test]
    fn test_subscribers_run_in_registration_order() {
        let signal: Signal<View, &'static str> = Signal::new("test");
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let log = log.clone();
            signal.subscribe(move |view: &View, event: &&'static str| {
                log.lock().push(format!("{tag}:{}:{event}", view.height));
                Ok(())
            });
        }

        signal.emit(&View { height: 7 }, &"block").unwrap();

        assert_eq!(
            *log.lock(),
            vec!["first:7:block", "second:7:block", "third:7:block"]
        );
        assert_eq!(signal.events_published(), 1);
    }

    #[test]
    fn test_emit_stops_at_veto() {
        let signal: Signal<View, u32> = Signal::new("veto");
        let reached = Arc::new(AtomicU64::new(0));

        signal.subscribe(|_, event: &u32| {
            if *event == 13 {
                Err(SubscriberError::Veto("unlucky".into()))
            } else {
                Ok(())
            }
        });
        let counter = reached.clone();
        signal.subscribe(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(signal.emit(&View { height: 0 }, &1).is_ok());
        assert_eq!(
            signal.emit(&View { height: 0 }, &13),
            Err(SubscriberError::Veto("unlucky".into()))
        );
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_emit_all_continues_after_failure() {
        let signal: Signal<View, ()> = Signal::new("all");
        let reached = Arc::new(AtomicU64::new(0));

        signal.subscribe(|_, _| Err(SubscriberError::Failed("boom".into())));
        let counter = reached.clone();
        signal.subscribe(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(signal.emit_all(&View { height: 0 }, &()), 1);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let signal: Signal<View, ()> = Signal::new("unsub");
        let id = signal.subscribe(|_, _| Ok(()));
        assert_eq!(signal.subscriber_count(), 1);
        assert!(signal.unsubscribe(id));
        assert!(!signal.unsubscribe(id));
        assert_eq!(signal.subscriber_count(), 0);
    }
}
