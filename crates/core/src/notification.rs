//! Change notifications.
//!
//! A notification describes one atomic change to a collection together with
//! the complete resulting snapshot. For every producer,
//! `current == apply(action, old_items, new_items, index, previous.current)`;
//! the `apply_to` methods perform exactly that reconstruction.

use crate::snapshot::{ListSnapshot, MapSnapshot, SortedSetSnapshot};
use core::fmt;
use core::hash::Hash;
use hashbrown::HashMap;
use std::sync::Arc;

/// The kind of change a notification describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    /// `new_items` were inserted.
    Add,
    /// `old_items` were removed.
    Remove,
    /// `old_items` were replaced by `new_items`.
    Replace,
    /// The whole content changed: `old_items` is everything before,
    /// `new_items` everything after.
    Reset,
}

/// Behaviour shared by every notification kind.
///
/// Operators that consume arbitrary upstream feeds depend only on this
/// trait.
pub trait CollectionNotification: Clone + PartialEq + Send + Sync + 'static {
    type Item: Clone + PartialEq + Send + Sync + 'static;

    fn action(&self) -> ChangeAction;

    fn old_items(&self) -> &[Self::Item];

    fn new_items(&self) -> &[Self::Item];

    /// Position of an index-preserving change on an ordered collection.
    fn index(&self) -> Option<usize> {
        None
    }

    fn current_len(&self) -> usize;

    /// Copies the items of `current`.
    fn current_items(&self) -> Vec<Self::Item>;

    /// Counts the items of `current` in front of `index` that satisfy
    /// `predicate`. `None` for unordered kinds or when `index` lies past
    /// the end.
    fn count_before(&self, _index: usize, _predicate: &dyn Fn(&Self::Item) -> bool) -> Option<usize> {
        None
    }

    /// The form in which this notification is replayed to a subscriber that
    /// joins late: a `Reset` from nothing to `current`.
    fn to_reset(&self) -> Self;
}

fn shared<T>(items: Vec<T>) -> Arc<[T]> {
    Arc::from(items)
}

// ---------------------------------------------------------------------------
// ListNotification
// ---------------------------------------------------------------------------

/// A change to an unsorted or sorted list.
#[derive(Clone)]
pub struct ListNotification<T> {
    action: ChangeAction,
    index: Option<usize>,
    old_items: Arc<[T]>,
    new_items: Arc<[T]>,
    current: ListSnapshot<T>,
}

impl<T: Clone> ListNotification<T> {
    /// The notification every list starts from.
    pub fn empty() -> Self {
        Self {
            action: ChangeAction::Reset,
            index: None,
            old_items: shared(Vec::new()),
            new_items: shared(Vec::new()),
            current: ListSnapshot::new(),
        }
    }

    /// `new_items` were inserted at `index`.
    pub fn added(current: ListSnapshot<T>, new_items: Vec<T>, index: usize) -> Self {
        Self {
            action: ChangeAction::Add,
            index: Some(index),
            old_items: shared(Vec::new()),
            new_items: shared(new_items),
            current,
        }
    }

    /// `old_items` were removed starting at `index`.
    pub fn removed(current: ListSnapshot<T>, old_items: Vec<T>, index: usize) -> Self {
        Self {
            action: ChangeAction::Remove,
            index: Some(index),
            old_items: shared(old_items),
            new_items: shared(Vec::new()),
            current,
        }
    }

    /// The item at `index` was replaced.
    pub fn replaced(current: ListSnapshot<T>, old_item: T, new_item: T, index: usize) -> Self {
        Self {
            action: ChangeAction::Replace,
            index: Some(index),
            old_items: shared(vec![old_item]),
            new_items: shared(vec![new_item]),
            current,
        }
    }

    #[inline]
    pub fn action(&self) -> ChangeAction {
        self.action
    }

    #[inline]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    #[inline]
    pub fn old_items(&self) -> &[T] {
        &self.old_items
    }

    #[inline]
    pub fn new_items(&self) -> &[T] {
        &self.new_items
    }

    #[inline]
    pub fn current(&self) -> &ListSnapshot<T> {
        &self.current
    }
}

impl<T: Clone> ListNotification<T> {
    /// The list went from `previous` to `current` wholesale.
    pub fn reset(previous: &ListSnapshot<T>, current: ListSnapshot<T>) -> Self {
        Self {
            action: ChangeAction::Reset,
            index: None,
            old_items: shared(previous.to_vec()),
            new_items: shared(current.to_vec()),
            current,
        }
    }
}

impl<T: Clone + PartialEq> ListNotification<T> {
    /// Applies this change to a plain copy of the previous state.
    pub fn apply_to(&self, state: &mut Vec<T>) {
        match (self.action, self.index) {
            (ChangeAction::Reset, _) => *state = self.new_items.to_vec(),
            (ChangeAction::Add, Some(index)) => {
                state.splice(index..index, self.new_items.iter().cloned());
            }
            (ChangeAction::Remove, Some(index)) => {
                state.drain(index..index + self.old_items.len());
            }
            (ChangeAction::Replace, Some(index)) => {
                state.splice(
                    index..index + self.old_items.len(),
                    self.new_items.iter().cloned(),
                );
            }
            (_, None) => {
                for old in self.old_items.iter() {
                    if let Some(pos) = state.iter().position(|x| x == old) {
                        state.remove(pos);
                    }
                }
                state.extend(self.new_items.iter().cloned());
            }
        }
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for ListNotification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListNotification")
            .field("action", &self.action)
            .field("index", &self.index)
            .field("old_items", &self.old_items)
            .field("new_items", &self.new_items)
            .field("current", &self.current)
            .finish()
    }
}

impl<T: Clone + PartialEq> PartialEq for ListNotification<T> {
    fn eq(&self, other: &Self) -> bool {
        self.action == other.action
            && self.index == other.index
            && self.old_items == other.old_items
            && self.new_items == other.new_items
            && self.current == other.current
    }
}

impl<T> CollectionNotification for ListNotification<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    type Item = T;

    fn action(&self) -> ChangeAction {
        self.action
    }

    fn old_items(&self) -> &[T] {
        &self.old_items
    }

    fn new_items(&self) -> &[T] {
        &self.new_items
    }

    fn index(&self) -> Option<usize> {
        self.index
    }

    fn current_len(&self) -> usize {
        self.current.len()
    }

    fn current_items(&self) -> Vec<T> {
        self.current.to_vec()
    }

    fn count_before(&self, index: usize, predicate: &dyn Fn(&T) -> bool) -> Option<usize> {
        (index <= self.current.len())
            .then(|| self.current.iter().take(index).filter(|item| predicate(item)).count())
    }

    fn to_reset(&self) -> Self {
        Self::reset(&ListSnapshot::new(), self.current.clone())
    }
}

// ---------------------------------------------------------------------------
// SortedSetNotification
// ---------------------------------------------------------------------------

/// A change to a sorted set. Sets are unordered from a delta point of view,
/// so these notifications never carry an index.
#[derive(Clone)]
pub struct SortedSetNotification<T> {
    action: ChangeAction,
    old_items: Arc<[T]>,
    new_items: Arc<[T]>,
    current: SortedSetSnapshot<T>,
}

impl<T: Clone> SortedSetNotification<T> {
    /// The notification every sorted set starts from.
    pub fn empty(current: SortedSetSnapshot<T>) -> Self {
        Self {
            action: ChangeAction::Reset,
            old_items: shared(Vec::new()),
            new_items: shared(Vec::new()),
            current,
        }
    }

    pub fn added(current: SortedSetSnapshot<T>, new_items: Vec<T>) -> Self {
        Self {
            action: ChangeAction::Add,
            old_items: shared(Vec::new()),
            new_items: shared(new_items),
            current,
        }
    }

    pub fn removed(current: SortedSetSnapshot<T>, old_items: Vec<T>) -> Self {
        Self {
            action: ChangeAction::Remove,
            old_items: shared(old_items),
            new_items: shared(Vec::new()),
            current,
        }
    }

    #[inline]
    pub fn action(&self) -> ChangeAction {
        self.action
    }

    #[inline]
    pub fn old_items(&self) -> &[T] {
        &self.old_items
    }

    #[inline]
    pub fn new_items(&self) -> &[T] {
        &self.new_items
    }

    #[inline]
    pub fn current(&self) -> &SortedSetSnapshot<T> {
        &self.current
    }
}

impl<T: Clone> SortedSetNotification<T> {
    pub fn reset(previous: &SortedSetSnapshot<T>, current: SortedSetSnapshot<T>) -> Self {
        Self {
            action: ChangeAction::Reset,
            old_items: shared(previous.to_vec()),
            new_items: shared(current.to_vec()),
            current,
        }
    }

    /// Applies this change to a plain sorted copy of the previous state.
    pub fn apply_to(&self, state: &mut Vec<T>) {
        let comparer = self.current.comparer();
        if self.action == ChangeAction::Reset {
            *state = self.new_items.to_vec();
            return;
        }
        for old in self.old_items.iter() {
            if let Ok(pos) = state.binary_search_by(|x| comparer(x, old)) {
                state.remove(pos);
            }
        }
        for new in self.new_items.iter() {
            if let Err(pos) = state.binary_search_by(|x| comparer(x, new)) {
                state.insert(pos, new.clone());
            }
        }
    }

    /// Returns true if `items` is sorted and duplicate-free under this
    /// set's comparer.
    pub fn is_strictly_ordered<'a, I>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.current.is_strictly_ordered(items)
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for SortedSetNotification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedSetNotification")
            .field("action", &self.action)
            .field("old_items", &self.old_items)
            .field("new_items", &self.new_items)
            .field("current", &self.current)
            .finish()
    }
}

impl<T: Clone + PartialEq> PartialEq for SortedSetNotification<T> {
    fn eq(&self, other: &Self) -> bool {
        self.action == other.action
            && self.old_items == other.old_items
            && self.new_items == other.new_items
            && self.current == other.current
    }
}

impl<T> CollectionNotification for SortedSetNotification<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    type Item = T;

    fn action(&self) -> ChangeAction {
        self.action
    }

    fn old_items(&self) -> &[T] {
        &self.old_items
    }

    fn new_items(&self) -> &[T] {
        &self.new_items
    }

    fn current_len(&self) -> usize {
        self.current.len()
    }

    fn current_items(&self) -> Vec<T> {
        self.current.to_vec()
    }

    fn count_before(&self, index: usize, predicate: &dyn Fn(&T) -> bool) -> Option<usize> {
        (index <= self.current.len())
            .then(|| self.current.iter().take(index).filter(|item| predicate(item)).count())
    }

    fn to_reset(&self) -> Self {
        Self::reset(&self.current.clear(), self.current.clone())
    }
}

// ---------------------------------------------------------------------------
// MapNotification
// ---------------------------------------------------------------------------

/// A change to a key/value map. Items are `(key, value)` pairs.
#[derive(Clone)]
pub struct MapNotification<K, V> {
    action: ChangeAction,
    old_items: Arc<[(K, V)]>,
    new_items: Arc<[(K, V)]>,
    current: MapSnapshot<K, V>,
}

impl<K: Eq + Hash + Clone, V: Clone> MapNotification<K, V> {
    pub fn added(current: MapSnapshot<K, V>, new_items: Vec<(K, V)>) -> Self {
        Self {
            action: ChangeAction::Add,
            old_items: shared(Vec::new()),
            new_items: shared(new_items),
            current,
        }
    }

    pub fn removed(current: MapSnapshot<K, V>, old_items: Vec<(K, V)>) -> Self {
        Self {
            action: ChangeAction::Remove,
            old_items: shared(old_items),
            new_items: shared(Vec::new()),
            current,
        }
    }

    /// The value bound to one key changed.
    pub fn replaced(current: MapSnapshot<K, V>, old_item: (K, V), new_item: (K, V)) -> Self {
        Self {
            action: ChangeAction::Replace,
            old_items: shared(vec![old_item]),
            new_items: shared(vec![new_item]),
            current,
        }
    }

    #[inline]
    pub fn action(&self) -> ChangeAction {
        self.action
    }

    #[inline]
    pub fn old_items(&self) -> &[(K, V)] {
        &self.old_items
    }

    #[inline]
    pub fn new_items(&self) -> &[(K, V)] {
        &self.new_items
    }

    #[inline]
    pub fn current(&self) -> &MapSnapshot<K, V> {
        &self.current
    }
}

impl<K: Eq + Hash + Clone, V: Clone> MapNotification<K, V> {
    /// The notification every map starts from.
    pub fn empty() -> Self {
        Self {
            action: ChangeAction::Reset,
            old_items: shared(Vec::new()),
            new_items: shared(Vec::new()),
            current: MapSnapshot::new(),
        }
    }

    pub fn reset(previous: &MapSnapshot<K, V>, current: MapSnapshot<K, V>) -> Self {
        Self {
            action: ChangeAction::Reset,
            old_items: shared(previous.to_pairs()),
            new_items: shared(current.to_pairs()),
            current,
        }
    }

    /// Applies this change to a plain copy of the previous state.
    pub fn apply_to(&self, state: &mut HashMap<K, V>) {
        if self.action == ChangeAction::Reset {
            state.clear();
        }
        for (key, _) in self.old_items.iter() {
            state.remove(key);
        }
        for (key, value) in self.new_items.iter() {
            state.insert(key.clone(), value.clone());
        }
    }
}

impl<K, V> fmt::Debug for MapNotification<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapNotification")
            .field("action", &self.action)
            .field("old_items", &self.old_items)
            .field("new_items", &self.new_items)
            .field("current", &self.current)
            .finish()
    }
}

impl<K: Eq + Hash + Clone, V: Clone + PartialEq> PartialEq for MapNotification<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.action == other.action
            && self.old_items == other.old_items
            && self.new_items == other.new_items
            && self.current == other.current
    }
}

impl<K, V> CollectionNotification for MapNotification<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    type Item = (K, V);

    fn action(&self) -> ChangeAction {
        self.action
    }

    fn old_items(&self) -> &[(K, V)] {
        &self.old_items
    }

    fn new_items(&self) -> &[(K, V)] {
        &self.new_items
    }

    fn current_len(&self) -> usize {
        self.current.len()
    }

    fn current_items(&self) -> Vec<(K, V)> {
        self.current.to_pairs()
    }

    fn to_reset(&self) -> Self {
        Self::reset(&MapSnapshot::new(), self.current.clone())
    }
}
