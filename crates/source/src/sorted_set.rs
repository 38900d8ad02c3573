//! Sorted set source.

use crate::apply;
use core::fmt;
use tributary_core::{natural_order, Comparer, Error, Result, SortedSetNotification, SortedSetSnapshot};
use tributary_reactive::{ChangeFeed, Subject};

const KIND: &str = "sorted set";

/// A sorted, duplicate-free set. Two items are the same member when the
/// comparer reports them equal.
///
/// Notifications never carry an index. Set algebra publishes one `Reset`
/// with the full old and new contents.
pub struct SortedSetSource<T> {
    subject: Subject<SortedSetNotification<T>>,
}

impl<T> Clone for SortedSetSource<T> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
        }
    }
}

impl<T> SortedSetSource<T>
where
    T: Clone + Ord + Send + Sync + 'static,
{
    /// Creates an empty set in natural order.
    pub fn new() -> Self {
        Self::with_comparer(natural_order())
    }
}

impl<T> Default for SortedSetSource<T>
where
    T: Clone + Ord + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SortedSetSource<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates an empty set ordered by `comparer`.
    pub fn with_comparer(comparer: Comparer<T>) -> Self {
        Self {
            subject: Subject::new(SortedSetNotification::empty(SortedSetSnapshot::new(comparer))),
        }
    }

    pub fn changes(&self) -> ChangeFeed<SortedSetNotification<T>> {
        ChangeFeed::from_observable(self.subject.clone())
    }

    pub fn snapshot(&self) -> SortedSetSnapshot<T> {
        self.subject.read(|n| n.current().clone())
    }

    pub fn comparer(&self) -> Comparer<T> {
        self.subject.read(|n| n.current().comparer().clone())
    }

    pub fn len(&self) -> usize {
        self.subject.read(|n| n.current().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the member at sorted position `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.subject.read(|n| n.current().get(index).cloned())
    }

    pub fn contains(&self, item: &T) -> bool {
        self.subject.read(|n| n.current().contains(item))
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.subject.read(|n| n.current().index_of(item))
    }

    /// Returns the stored member equal to `item` under the comparer.
    pub fn try_get_value(&self, item: &T) -> Option<T> {
        self.subject.read(|n| n.current().try_get_value(item).cloned())
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.snapshot().to_vec()
    }

    fn apply<F>(&self, step: F) -> Option<SortedSetNotification<T>>
    where
        F: FnOnce(&SortedSetSnapshot<T>) -> Option<SortedSetNotification<T>>,
    {
        apply(&self.subject, |n| step(n.current()))
    }

    /// Adds `item` unless an equal member exists. Returns true if added.
    pub fn add(&self, item: T) -> bool {
        self.apply(|current| {
            let next = current.insert(item.clone())?;
            Some(SortedSetNotification::added(next, vec![item]))
        })
        .is_some()
    }

    /// Adds every item that is not yet a member as one `Add`.
    pub fn add_range<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.apply(|current| {
            let (next, inserted) = current.insert_many(items);
            (!inserted.is_empty()).then(|| SortedSetNotification::added(next, inserted))
        });
    }

    /// Removes the member equal to `item`. Returns false if absent.
    pub fn remove(&self, item: &T) -> bool {
        self.apply(|current| {
            let (next, removed) = current.remove(item)?;
            Some(SortedSetNotification::removed(next, vec![removed]))
        })
        .is_some()
    }

    pub fn clear(&self) {
        self.apply(|current| changed(current, current.clear()));
    }

    /// Replaces the whole content with `items`, dropping duplicates.
    pub fn reset<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.apply(|current| {
            let next = SortedSetSnapshot::from_items(current.comparer().clone(), items);
            changed(current, next)
        });
    }

    pub fn union<I>(&self, other: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.apply(|current| changed(current, current.union(other)));
    }

    pub fn intersect<I>(&self, other: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.apply(|current| changed(current, current.intersect(other)));
    }

    pub fn except<I>(&self, other: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.apply(|current| changed(current, current.except(other)));
    }

    pub fn symmetric_except<I>(&self, other: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.apply(|current| changed(current, current.symmetric_except(other)));
    }

    pub fn is_subset_of<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        self.snapshot().is_subset_of(other)
    }

    pub fn is_superset_of<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        self.snapshot().is_superset_of(other)
    }

    pub fn is_proper_subset_of<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        self.snapshot().is_proper_subset_of(other)
    }

    pub fn is_proper_superset_of<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        self.snapshot().is_proper_superset_of(other)
    }

    pub fn overlaps<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        self.snapshot().overlaps(other)
    }

    pub fn set_equals<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        self.snapshot().set_equals(other)
    }

    pub fn insert(&self, _index: usize, _item: T) -> Result<()> {
        Err(Error::unsupported("insert", KIND))
    }

    pub fn remove_at(&self, _index: usize) -> Result<()> {
        Err(Error::unsupported("remove_at", KIND))
    }

    pub fn set_item(&self, _index: usize, _item: T) -> Result<()> {
        Err(Error::unsupported("set_item", KIND))
    }
}

impl<T> fmt::Debug for SortedSetSource<T>
where
    T: Clone + PartialEq + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedSetSource")
            .field("items", &self.snapshot())
            .finish()
    }
}

fn changed<T: Clone + PartialEq>(
    current: &SortedSetSnapshot<T>,
    next: SortedSetSnapshot<T>,
) -> Option<SortedSetNotification<T>> {
    (next != *current).then(|| SortedSetNotification::reset(current, next))
}
