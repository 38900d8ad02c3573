//! The change-feed contract shared by sources and derived collections.

use crate::subscription::{Observer, Subscription};
use std::sync::Arc;

/// Anything that can push notifications of type `N` to observers.
///
/// Implementations deliver exactly one replay of the current state to a new
/// observer before any live notification.
pub trait Observable<N>: Send + Sync {
    fn subscribe(&self, observer: Observer<N>) -> Subscription;
}

/// A cloneable handle to a change feed.
///
/// Subscribing yields one replay of the most recent notification (as a
/// `Reset`), followed by every live notification in mutation order. A fresh
/// subscription always starts a fresh replay-then-live sequence.
pub struct ChangeFeed<N> {
    inner: Arc<dyn Observable<N>>,
}

impl<N> Clone for ChangeFeed<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N: 'static> ChangeFeed<N> {
    pub fn new(inner: Arc<dyn Observable<N>>) -> Self {
        Self { inner }
    }

    /// Wraps any observable value.
    pub fn from_observable<O>(observable: O) -> Self
    where
        O: Observable<N> + 'static,
    {
        Self::new(Arc::new(observable))
    }

    pub fn subscribe(&self, observer: Observer<N>) -> Subscription {
        self.inner.subscribe(observer)
    }

    /// Subscribes with a closure.
    pub fn subscribe_fn<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&N) + Send + Sync + 'static,
    {
        self.inner.subscribe(Arc::new(callback))
    }
}

impl<N> core::fmt::Debug for ChangeFeed<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChangeFeed").finish_non_exhaustive()
    }
}
