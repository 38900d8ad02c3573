//! Sorted list source.

use crate::list::ListSource;
use core::cmp::Ordering;
use core::fmt;
use tracing::trace;
use tributary_core::{
    natural_equality, natural_order, Comparer, EqualityComparer, Error, ListNotification,
    ListSnapshot, Result,
};
use tributary_reactive::ChangeFeed;

const KIND: &str = "sorted list";

/// A list kept sorted under a comparer. Duplicates are allowed and keep
/// their insertion order.
///
/// Shares [`ListNotification`] with [`ListSource`]: every `Add` and
/// `Remove` carries the index at which it happened. Positional writes
/// (`insert`, `set_item`, reordering) are rejected with
/// [`Error::UnsupportedOperation`].
///
/// Lookups and removals by value use the configured equality comparer,
/// `PartialEq` unless one is supplied.
pub struct SortedListSource<T> {
    list: ListSource<T>,
    comparer: Comparer<T>,
    equality: EqualityComparer<T>,
}

impl<T> Clone for SortedListSource<T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            comparer: self.comparer.clone(),
            equality: self.equality.clone(),
        }
    }
}

impl<T> SortedListSource<T>
where
    T: Clone + Ord + Send + Sync + 'static,
{
    /// Creates an empty list in natural order.
    pub fn new() -> Self {
        Self::with_comparer(natural_order())
    }
}

impl<T> Default for SortedListSource<T>
where
    T: Clone + Ord + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SortedListSource<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates an empty list ordered by `comparer`.
    pub fn with_comparer(comparer: Comparer<T>) -> Self {
        Self::with_comparers(comparer, natural_equality())
    }

    /// Creates an empty list ordered by `comparer` that matches items by
    /// `equality`.
    pub fn with_comparers(comparer: Comparer<T>, equality: EqualityComparer<T>) -> Self {
        Self {
            list: ListSource::new(),
            comparer,
            equality,
        }
    }

    #[inline]
    pub fn comparer(&self) -> &Comparer<T> {
        &self.comparer
    }

    pub fn changes(&self) -> ChangeFeed<ListNotification<T>> {
        self.list.changes()
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        self.list.snapshot()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.list.get(index)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.index_of(item).is_some()
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.snapshot().position_by(item, |a, b| (self.equality)(a, b))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.list.to_vec()
    }

    /// Position of the first element strictly greater than `item`.
    fn insertion_index(&self, current: &ListSnapshot<T>, item: &T) -> usize {
        current
            .iter()
            .position(|x| (self.comparer)(item, x) == Ordering::Less)
            .unwrap_or(current.len())
    }

    fn sorted(&self, mut items: Vec<T>) -> Vec<T> {
        items.sort_by(|a, b| (self.comparer)(a, b));
        items
    }

    /// Inserts `item` after every element that does not sort after it.
    pub fn add(&self, item: T) {
        self.list.apply(|current| {
            let index = self.insertion_index(current, &item);
            let next = current.insert_range(index, core::slice::from_ref(&item)).ok()?;
            Some(ListNotification::added(next, vec![item], index))
        });
    }

    /// Adds `items`.
    ///
    /// Into an empty list the batch is sorted once and published as a
    /// single `Add`; otherwise every item is added on its own.
    pub fn add_range<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return;
        }
        let mut pending = Some(items);
        self.list.apply(|current| {
            if !current.is_empty() {
                return None;
            }
            let batch = self.sorted(pending.take()?);
            Some(ListNotification::added(
                ListSnapshot::from_vec(batch.clone()),
                batch,
                0,
            ))
        });
        if let Some(items) = pending {
            trace!(count = items.len(), "adding items one at a time");
            for item in items {
                self.add(item);
            }
        }
    }

    pub fn remove(&self, item: &T) -> bool {
        self.list.remove_with(item, |a, b| (self.equality)(a, b))
    }

    pub fn remove_with<F>(&self, item: &T, eq: F) -> bool
    where
        F: Fn(&T, &T) -> bool,
    {
        self.list.remove_with(item, eq)
    }

    pub fn remove_at(&self, index: usize) -> Result<()> {
        self.list.remove_at(index)
    }

    pub fn remove_range(&self, index: usize, count: usize) -> Result<()> {
        self.list.remove_range(index, count)
    }

    /// Removes every item in `items` individually.
    pub fn remove_items<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.remove_items_with(items, |a, b| (self.equality)(a, b));
    }

    pub fn remove_items_with<I, F>(&self, items: I, eq: F)
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T, &T) -> bool,
    {
        for item in items {
            self.list.remove_with(&item, &eq);
        }
    }

    pub fn remove_all<F>(&self, predicate: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.list.remove_all(predicate);
    }

    pub fn clear(&self) {
        self.list.clear();
    }

    /// Replaces the whole content with `items`, sorted.
    pub fn reset<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.list.reset(self.sorted(items.into_iter().collect()));
    }

    /// Removes `old` if present, then adds `new` at its sorted position.
    pub fn replace(&self, old: &T, new: T) {
        self.replace_with(old, new, |a, b| (self.equality)(a, b));
    }

    pub fn replace_with<F>(&self, old: &T, new: T, eq: F)
    where
        F: Fn(&T, &T) -> bool,
    {
        self.list.remove_with(old, eq);
        self.add(new);
    }

    pub fn insert(&self, _index: usize, _item: T) -> Result<()> {
        Err(Error::unsupported("insert", KIND))
    }

    pub fn insert_range<I>(&self, _index: usize, _items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        Err(Error::unsupported("insert_range", KIND))
    }

    pub fn set_item(&self, _index: usize, _item: T) -> Result<()> {
        Err(Error::unsupported("set_item", KIND))
    }

    pub fn reverse(&self) -> Result<()> {
        Err(Error::unsupported("reverse", KIND))
    }

    pub fn sort_range(&self, _index: usize, _count: usize, _comparer: &Comparer<T>) -> Result<()> {
        Err(Error::unsupported("sort_range", KIND))
    }
}

impl<T> fmt::Debug for SortedListSource<T>
where
    T: Clone + PartialEq + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedListSource")
            .field("items", &self.snapshot())
            .finish()
    }
}
