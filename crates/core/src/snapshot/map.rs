//! Persistent key/value map snapshot.

use core::fmt;
use core::hash::Hash;
use imbl::HashMap;

/// An immutable, cheaply clonable hash map.
///
/// Backed by a hash array mapped trie: clones are O(1) and a single
/// insert or removal copies O(log n) nodes.
pub struct MapSnapshot<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Clone, V: Clone> Clone for MapSnapshot<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<K, V> fmt::Debug for MapSnapshot<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> MapSnapshot<K, V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.values()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Builds a map from pairs; a later pair overwrites an earlier one.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }

    pub fn to_pairs(&self) -> Vec<(K, V)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns the map with `key` bound to `value`, plus the previous value.
    pub fn insert(&self, key: K, value: V) -> (Self, Option<V>) {
        let mut entries = self.entries.clone();
        let previous = entries.insert(key, value);
        (Self { entries }, previous)
    }

    /// Returns the map with every pair bound; a later pair overwrites an
    /// earlier one.
    pub fn extend<I>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut entries = self.entries.clone();
        entries.extend(pairs);
        Self { entries }
    }

    /// Returns the map without any of `keys`, plus the removed pairs.
    pub fn remove_keys(&self, keys: &[K]) -> (Self, Vec<(K, V)>) {
        let mut entries = self.entries.clone();
        let removed: Vec<(K, V)> = keys
            .iter()
            .filter_map(|key| entries.remove_with_key(key))
            .collect();
        if removed.is_empty() {
            return (self.clone(), removed);
        }
        (Self { entries }, removed)
    }

    /// Returns the map without `key` and the removed value, or `None` if the
    /// key is absent.
    pub fn remove(&self, key: &K) -> Option<(Self, V)> {
        let mut entries = self.entries.clone();
        let removed = entries.remove(key)?;
        Some((Self { entries }, removed))
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for MapSnapshot<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V: Clone + PartialEq> PartialEq for MapSnapshot<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
