//! Reference-counted multicast for derived collections.
//!
//! A [`SharedFeed`] connects its upstream chain when the first observer
//! arrives and tears it down when the last one leaves. While connected it
//! remembers the most recent notification so late joiners get a replay
//! without rebuilding anything.

use crate::feed::Observable;
use crate::subscription::{Observer, Subscription, SubscriptionId, SubscriptionManager};
use parking_lot::{Mutex, ReentrantMutex};
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};
use tributary_core::CollectionNotification;

/// Builds a fresh upstream chain that pushes into `sink`.
///
/// Returns the subscriptions that keep the chain alive; dropping them tears
/// it down.
pub type Connector<N> = Box<dyn Fn(Observer<N>) -> Vec<Subscription> + Send + Sync>;

enum Connection {
    Idle,
    Connecting,
    Connected(Vec<Subscription>),
}

struct SharedState<N> {
    subscribers: SubscriptionManager<N>,
    /// Latest notification accepted from the chain, for repeat suppression.
    last: Option<N>,
    /// Latest notification handed to observers; replays start here.
    delivered: Option<N>,
    /// Notifications accepted while observers are running, tagged with the
    /// generation of the chain that produced them.
    pending: VecDeque<(u64, N)>,
    draining: bool,
    connection: Connection,
    /// Bumped on every teardown; notifications from an older chain are
    /// dropped.
    generation: u64,
}

/// Clears the drain flag even if an observer panics.
struct DrainGuard<'a, N>(&'a Mutex<SharedState<N>>);

impl<N> Drop for DrainGuard<'_, N> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        state.draining = false;
        state.pending.clear();
    }
}

struct SharedInner<N> {
    connector: Connector<N>,
    delivery: ReentrantMutex<()>,
    state: Mutex<SharedState<N>>,
}

/// A lazily connected, replay-one multicast feed.
pub struct SharedFeed<N> {
    inner: Arc<SharedInner<N>>,
}

impl<N> Clone for SharedFeed<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N: CollectionNotification> SharedFeed<N> {
    pub fn new<F>(connector: F) -> Self
    where
        F: Fn(Observer<N>) -> Vec<Subscription> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(SharedInner {
                connector: Box::new(connector),
                delivery: ReentrantMutex::new(()),
                state: Mutex::new(SharedState {
                    subscribers: SubscriptionManager::new(),
                    last: None,
                    delivered: None,
                    pending: VecDeque::new(),
                    draining: false,
                    connection: Connection::Idle,
                    generation: 0,
                }),
            }),
        }
    }

    /// Returns the number of attached observers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }

    /// Returns true while an upstream chain is live.
    pub fn is_connected(&self) -> bool {
        matches!(self.inner.state.lock().connection, Connection::Connected(_))
    }

    /// Returns the most recent notification delivered by the live chain.
    pub fn last(&self) -> Option<N> {
        self.inner.state.lock().delivered.clone()
    }

    fn connect(&self, generation: u64) {
        debug!(generation, "connecting shared change feed");
        let weak: Weak<SharedInner<N>> = Arc::downgrade(&self.inner);
        let sink: Observer<N> = Arc::new(move |notification: &N| {
            if let Some(inner) = weak.upgrade() {
                inner.publish(generation, notification);
            }
        });

        let subscriptions = (self.inner.connector)(sink);

        let mut state = self.inner.state.lock();
        if state.generation == generation && matches!(state.connection, Connection::Connecting) {
            state.connection = Connection::Connected(subscriptions);
        } else {
            // Every observer left while the chain was being built.
            drop(state);
            debug!(generation, "discarding chain built for departed observers");
            drop(subscriptions);
        }
    }
}

impl<N: CollectionNotification> SharedInner<N> {
    fn publish(&self, generation: u64, notification: &N) {
        let _delivery = self.delivery.lock();
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                trace!("dropping notification from a torn-down chain");
                return;
            }
            if state.last.as_ref() == Some(notification) {
                trace!("suppressing redundant notification");
                return;
            }
            state.last = Some(notification.clone());
            state.pending.push_back((generation, notification.clone()));
            if state.draining {
                trace!(queued = state.pending.len(), "queueing nested notification");
                return;
            }
            state.draining = true;
        }
        self.drain();
    }

    /// Hands queued notifications to observers one at a time, each to
    /// every observer before the next.
    fn drain(&self) {
        let _guard = DrainGuard(&self.state);
        loop {
            let (next, observers) = {
                let mut state = self.state.lock();
                let Some((generation, next)) = state.pending.pop_front() else {
                    return;
                };
                if generation != state.generation {
                    trace!("dropping queued notification from a torn-down chain");
                    continue;
                }
                state.delivered = Some(next.clone());
                (next, state.subscribers.observers())
            };
            for observer in &observers {
                observer(&next);
            }
        }
    }

    fn detach(&self, id: SubscriptionId) {
        let connection = {
            let mut state = self.state.lock();
            if !state.subscribers.unsubscribe(id) || !state.subscribers.is_empty() {
                return;
            }
            state.last = None;
            state.delivered = None;
            state.generation += 1;
            core::mem::replace(&mut state.connection, Connection::Idle)
        };
        if let Connection::Connected(subscriptions) = connection {
            debug!("last observer left, tearing down shared change feed");
            drop(subscriptions);
        }
    }
}

impl<N: CollectionNotification> Observable<N> for SharedFeed<N> {
    fn subscribe(&self, observer: Observer<N>) -> Subscription {
        let (id, connect) = {
            let _delivery = self.inner.delivery.lock();
            let (id, replay, connect) = {
                let mut state = self.inner.state.lock();
                let id = state.subscribers.subscribe(Arc::clone(&observer));
                let connect = matches!(state.connection, Connection::Idle);
                if connect {
                    state.connection = Connection::Connecting;
                }
                let replay = state.delivered.as_ref().map(CollectionNotification::to_reset);
                (id, replay, connect.then_some(state.generation))
            };
            if let Some(replay) = replay {
                observer(&replay);
            }
            (id, connect)
        };

        // Upstream delivery locks are taken while connecting, so ours must
        // not be held here.
        if let Some(generation) = connect {
            self.connect(generation);
        }

        let inner = Arc::clone(&self.inner);
        Subscription::new(move || inner.detach(id))
    }
}
