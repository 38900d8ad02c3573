//! The multicast point owned by every mutable source.

use crate::feed::Observable;
use crate::subscription::{Observer, Subscription, SubscriptionManager};
use parking_lot::{Mutex, ReentrantMutex};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;
use tributary_core::CollectionNotification;

struct SubjectState<N> {
    /// Latest published notification; mutations build on it.
    current: N,
    /// Latest notification handed to observers; replays start here.
    delivered: N,
    subscribers: SubscriptionManager<N>,
    /// Notifications published while observers are running, in order.
    pending: VecDeque<N>,
    draining: bool,
}

struct SubjectInner<N> {
    /// Serialises read-modify-publish sequences, replays and fan-out.
    /// Re-entrant so an observer may mutate or subscribe from its callback.
    delivery: ReentrantMutex<()>,
    state: Mutex<SubjectState<N>>,
}

/// Clears the drain flag even if an observer panics.
struct DrainGuard<'a, N>(&'a Mutex<SubjectState<N>>);

impl<N> Drop for DrainGuard<'_, N> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        state.draining = false;
        state.pending.clear();
    }
}

/// A hot feed that always holds a current notification.
///
/// New observers receive the current notification (normalised to a
/// `Reset`) and then every subsequent one. Publishing a notification equal
/// to the current one is suppressed.
pub struct Subject<N> {
    inner: Arc<SubjectInner<N>>,
}

impl<N> Clone for Subject<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N: CollectionNotification> Subject<N> {
    pub fn new(initial: N) -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                delivery: ReentrantMutex::new(()),
                state: Mutex::new(SubjectState {
                    current: initial.clone(),
                    delivered: initial,
                    subscribers: SubscriptionManager::new(),
                    pending: VecDeque::new(),
                    draining: false,
                }),
            }),
        }
    }

    /// Returns the most recently published notification.
    pub fn value(&self) -> N {
        self.inner.state.lock().current.clone()
    }

    /// Reads the most recently published notification in place.
    ///
    /// `read` must not call back into this subject.
    pub fn read<R, F>(&self, read: F) -> R
    where
        F: FnOnce(&N) -> R,
    {
        read(&self.inner.state.lock().current)
    }

    /// Runs one read-modify-publish step.
    ///
    /// `step` sees the current notification and returns the next one, or
    /// `None` when the mutation is a no-op. An error aborts the step with
    /// nothing published. Returns the published notification, if any.
    ///
    /// Called from inside an observer, the notification is queued and
    /// reaches every observer after the one being delivered.
    pub fn update<E, F>(&self, step: F) -> Result<Option<N>, E>
    where
        F: FnOnce(&N) -> Result<Option<N>, E>,
    {
        let _delivery = self.inner.delivery.lock();
        let current = self.value();
        match step(&current)? {
            Some(next) => Ok(self.deliver(next)),
            None => {
                trace!("mutation left the collection unchanged");
                Ok(None)
            }
        }
    }

    /// Publishes a notification unless it equals the current one.
    pub fn publish(&self, notification: N) -> bool {
        let _delivery = self.inner.delivery.lock();
        self.deliver(notification).is_some()
    }

    fn deliver(&self, notification: N) -> Option<N> {
        {
            let mut state = self.inner.state.lock();
            if state.current == notification {
                trace!("suppressing redundant notification");
                return None;
            }
            state.current = notification.clone();
            state.pending.push_back(notification.clone());
            if state.draining {
                trace!(queued = state.pending.len(), "queueing nested notification");
                return Some(notification);
            }
            state.draining = true;
        }
        self.drain();
        Some(notification)
    }

    /// Hands queued notifications to observers one at a time, each to
    /// every observer before the next.
    fn drain(&self) {
        let _guard = DrainGuard(&self.inner.state);
        loop {
            let (next, observers) = {
                let mut state = self.inner.state.lock();
                let Some(next) = state.pending.pop_front() else {
                    return;
                };
                state.delivered = next.clone();
                (next, state.subscribers.observers())
            };
            for observer in &observers {
                observer(&next);
            }
        }
    }

    /// Returns the number of attached observers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }
}

impl<N: CollectionNotification> Observable<N> for Subject<N> {
    fn subscribe(&self, observer: Observer<N>) -> Subscription {
        let _delivery = self.inner.delivery.lock();
        let (id, replay) = {
            let mut state = self.inner.state.lock();
            let id = state.subscribers.subscribe(Arc::clone(&observer));
            (id, state.delivered.to_reset())
        };
        observer(&replay);

        let inner = Arc::clone(&self.inner);
        Subscription::new(move || {
            inner.state.lock().subscribers.unsubscribe(id);
        })
    }
}
