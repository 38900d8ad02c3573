//! Subscription management for change feeds.
//!
//! This module provides subscription IDs, the registry every feed uses to
//! track its observers, and the `Subscription` handle returned to callers.

use hashbrown::HashMap;
use std::sync::Arc;

/// Unique identifier for a subscription within one feed.
pub type SubscriptionId = u64;

/// Callback invoked for every notification a feed delivers.
pub type Observer<N> = Arc<dyn Fn(&N) + Send + Sync>;

/// Wraps a closure into an [`Observer`].
pub fn observer<N, F>(callback: F) -> Observer<N>
where
    F: Fn(&N) + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// Tracks the observers attached to one feed.
pub struct SubscriptionManager<N> {
    /// Active observers
    subscriptions: HashMap<SubscriptionId, Observer<N>>,
    /// Next subscription ID to assign
    next_id: SubscriptionId,
}

impl<N> Default for SubscriptionManager<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> SubscriptionManager<N> {
    /// Creates a new subscription manager.
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Registers an observer.
    ///
    /// Returns the subscription ID that can be used to unsubscribe.
    pub fn subscribe(&mut self, observer: Observer<N>) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.insert(id, observer);
        id
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Returns the registered observers in subscription order.
    ///
    /// Feeds take this copy under their state lock and invoke the observers
    /// after releasing it.
    pub fn observers(&self) -> Vec<Observer<N>> {
        let mut entries: Vec<_> = self.subscriptions.iter().collect();
        entries.sort_unstable_by_key(|(id, _)| **id);
        entries.into_iter().map(|(_, o)| Arc::clone(o)).collect()
    }

    /// Returns the number of active subscriptions.
    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns true if there are no subscriptions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

/// A live attachment to a feed.
///
/// Dropping the handle (or calling [`Subscription::unsubscribe`]) detaches
/// the observer. Detaching the last observer of a derived feed tears its
/// chain down.
#[must_use = "dropping a Subscription detaches it immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Creates a subscription that runs `detach` exactly once.
    pub fn new<F>(detach: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A subscription with nothing to detach.
    pub fn empty() -> Self {
        Self { detach: None }
    }

    /// Returns true until the subscription has been detached.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.detach.is_some()
    }

    /// Detaches now.
    pub fn unsubscribe(mut self) {
        self.run_detach();
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_detach();
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
