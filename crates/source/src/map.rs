//! Key/value map source.

use crate::apply;
use core::fmt;
use core::hash::Hash;
use hashbrown::HashSet;
use tributary_core::{MapNotification, MapSnapshot};
use tributary_reactive::{ChangeFeed, Subject, Subscription};

/// A mutable hash map publishing `(key, value)` notifications.
///
/// A new key publishes `Add`, a changed value `Replace` with the old and new
/// pair, and a removed key `Remove`. Binding a key to the value it already
/// holds publishes nothing.
pub struct MapSource<K, V> {
    subject: Subject<MapNotification<K, V>>,
}

impl<K, V> Clone for MapSource<K, V> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
        }
    }
}

impl<K, V> MapSource<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            subject: Subject::new(MapNotification::empty()),
        }
    }

    /// Creates a map holding `pairs`; a later pair overwrites an earlier one.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            subject: Subject::new(MapNotification::reset(
                &MapSnapshot::new(),
                MapSnapshot::from_pairs(pairs),
            )),
        }
    }

    pub fn changes(&self) -> ChangeFeed<MapNotification<K, V>> {
        ChangeFeed::from_observable(self.subject.clone())
    }

    pub fn snapshot(&self) -> MapSnapshot<K, V> {
        self.subject.read(|n| n.current().clone())
    }

    pub fn len(&self) -> usize {
        self.subject.read(|n| n.current().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.subject.read(|n| n.current().get(key).cloned())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.subject.read(|n| n.current().contains_key(key))
    }

    pub fn keys(&self) -> Vec<K> {
        self.subject.read(|n| n.current().keys().cloned().collect())
    }

    fn apply<F>(&self, step: F) -> Option<MapNotification<K, V>>
    where
        F: FnOnce(&MapSnapshot<K, V>) -> Option<MapNotification<K, V>>,
    {
        apply(&self.subject, |n| step(n.current()))
    }

    /// Calls `callback` with the value bound to `key` on replay and after
    /// every change, skipping notifications in which the key is absent.
    pub fn subscribe_value<F>(&self, key: K, callback: F) -> Subscription
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.changes().subscribe_fn(move |n: &MapNotification<K, V>| {
            if let Some(value) = n.current().get(&key) {
                callback(value);
            }
        })
    }

    /// Binds `key` to `value`.
    pub fn insert(&self, key: K, value: V) {
        self.apply(|current| match current.get(&key) {
            Some(old) if *old == value => None,
            Some(old) => {
                let old = (key.clone(), old.clone());
                let (next, _) = current.insert(key.clone(), value.clone());
                Some(MapNotification::replaced(next, old, (key, value)))
            }
            None => {
                let (next, _) = current.insert(key.clone(), value.clone());
                Some(MapNotification::added(next, vec![(key, value)]))
            }
        });
    }

    /// Binds every pair.
    ///
    /// Publishes one `Add` when every key is new and distinct, otherwise one
    /// `Reset` if the content changed.
    pub fn insert_range<I>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs: Vec<(K, V)> = pairs.into_iter().collect();
        if pairs.is_empty() {
            return;
        }
        self.apply(|current| {
            let all_new = {
                let mut seen = HashSet::with_capacity(pairs.len());
                pairs
                    .iter()
                    .all(|(key, _)| !current.contains_key(key) && seen.insert(key))
            };
            let next = current.extend(pairs.iter().cloned());
            if all_new {
                Some(MapNotification::added(next, pairs))
            } else {
                (next != *current).then(|| MapNotification::reset(current, next))
            }
        });
    }

    /// Removes `key`, returning the value it was bound to.
    pub fn remove(&self, key: &K) -> Option<V> {
        let published = self.apply(|current| {
            let (next, value) = current.remove(key)?;
            Some(MapNotification::removed(next, vec![(key.clone(), value)]))
        })?;
        published.old_items().first().map(|(_, value)| value.clone())
    }

    /// Removes every present key in `keys` as one `Remove`.
    pub fn remove_keys<I>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
    {
        let keys: Vec<K> = keys.into_iter().collect();
        self.apply(|current| {
            let (next, removed) = current.remove_keys(&keys);
            (!removed.is_empty()).then(|| MapNotification::removed(next, removed))
        });
    }

    pub fn clear(&self) {
        self.apply(|current| {
            (!current.is_empty()).then(|| MapNotification::reset(current, MapSnapshot::new()))
        });
    }

    /// Replaces the whole content with `pairs` as one `Reset`.
    pub fn reset<I>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let next = MapSnapshot::from_pairs(pairs);
        self.apply(|current| (next != *current).then(|| MapNotification::reset(current, next)));
    }
}

impl<K, V> Default for MapSource<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for MapSource<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + fmt::Debug + 'static,
    V: Clone + PartialEq + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapSource")
            .field("entries", &self.snapshot())
            .finish()
    }
}
