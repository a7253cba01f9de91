//! Process-wide teardown signal.
//!
//! The host fires the signal when its whole object graph is torn down (for
//! example when execution stops). Subscribers reset their state.

use crate::key::InstanceId;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// A subscriber of a [`Teardown`] signal.
pub trait Dispose: Send + Sync + 'static {
    /// Resets the subscriber's state.
    fn dispose(&self);
}

/// A teardown signal with weakly held subscribers.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tether_registry::{Injector, Teardown};
///
/// let teardown = Teardown::new();
/// let injector = Arc::new(Injector::new());
///
/// assert!(injector.attach(&teardown));
/// assert!(!injector.attach(&teardown));
/// assert_eq!(teardown.fire(), 1);
/// ```
#[derive(Default)]
pub struct Teardown {
    subscribers: Mutex<Vec<Weak<dyn Dispose>>>,
}

impl Teardown {
    /// Creates a signal with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `subscriber`. Returns false if it was already subscribed.
    pub fn subscribe<D: Dispose>(&self, subscriber: &Arc<D>) -> bool {
        let id = InstanceId::of(subscriber);
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|weak| weak.strong_count() > 0);
        if subscribers
            .iter()
            .any(|weak| InstanceId::of_weak(weak) == id)
        {
            return false;
        }
        let weak: Weak<D> = Arc::downgrade(subscriber);
        subscribers.push(weak);
        true
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .lock()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Returns true if no live subscriber remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Disposes every live subscriber in subscription order and returns how
    /// many were disposed. Subscriptions stay in place for the next firing.
    pub fn fire(&self) -> usize {
        let live: Vec<Arc<dyn Dispose>> = self
            .subscribers
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        for subscriber in &live {
            subscriber.dispose();
        }
        tracing::info!(subscribers = live.len(), "teardown fired");
        live.len()
    }
}

impl core::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Teardown")
            .field("subscribers", &self.len())
            .finish()
    }
}
