//! Unordered list source.

use crate::apply;
use core::fmt;
use tracing::trace;
use tributary_core::{natural_order, Comparer, Error, ListNotification, ListSnapshot, Result};
use tributary_reactive::{ChangeFeed, Subject};

/// A mutable, index-addressable list that publishes one notification per
/// effective change.
///
/// Index-preserving mutations (`insert`, `remove_at`, `set_item`, ...)
/// publish `Add`, `Remove` or `Replace` with an index. Bulk reshaping
/// (`clear`, `reset`, sorting, multi-item removal) publishes a single
/// `Reset` carrying the full old and new contents.
pub struct ListSource<T> {
    subject: Subject<ListNotification<T>>,
}

impl<T> Clone for ListSource<T> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
        }
    }
}

impl<T> ListSource<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            subject: Subject::new(ListNotification::empty()),
        }
    }

    /// Creates a list holding `items`.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            subject: Subject::new(ListNotification::reset(
                &ListSnapshot::new(),
                ListSnapshot::from_vec(items),
            )),
        }
    }

    /// Returns the change feed of this list.
    pub fn changes(&self) -> ChangeFeed<ListNotification<T>> {
        ChangeFeed::from_observable(self.subject.clone())
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> ListSnapshot<T> {
        self.subject.read(|n| n.current().clone())
    }

    /// Returns the most recently published notification.
    pub fn notification(&self) -> ListNotification<T> {
        self.subject.value()
    }

    pub fn len(&self) -> usize {
        self.subject.read(|n| n.current().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.subject.read(|n| n.current().get(index).cloned())
    }

    pub fn contains(&self, item: &T) -> bool {
        self.subject.read(|n| n.current().contains(item))
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.subject.read(|n| n.current().index_of(item))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.snapshot().to_vec()
    }

    /// Runs one fallible read-modify-publish step against the current
    /// snapshot.
    pub(crate) fn mutate<F>(&self, step: F) -> Result<Option<ListNotification<T>>>
    where
        F: FnOnce(&ListSnapshot<T>) -> Result<Option<ListNotification<T>>>,
    {
        self.subject.update(|n| step(n.current()))
    }

    /// Runs one infallible read-modify-publish step.
    pub(crate) fn apply<F>(&self, step: F) -> Option<ListNotification<T>>
    where
        F: FnOnce(&ListSnapshot<T>) -> Option<ListNotification<T>>,
    {
        apply(&self.subject, |n| step(n.current()))
    }

    // ---------------------------------------------------------------------
    // Additions
    // ---------------------------------------------------------------------

    /// Appends one item.
    pub fn add(&self, item: T) {
        self.add_range(core::iter::once(item));
    }

    /// Appends `items` as one `Add`. An empty batch is a no-op.
    pub fn add_range<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return;
        }
        self.apply(|current| {
            let index = current.len();
            Some(ListNotification::added(current.append(&items), items, index))
        });
    }

    /// Inserts one item before position `index`.
    pub fn insert(&self, index: usize, item: T) -> Result<()> {
        self.insert_range(index, core::iter::once(item))
    }

    /// Inserts `items` before position `index` as one `Add`.
    pub fn insert_range<I>(&self, index: usize, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        self.mutate(|current| {
            let next = current.insert_range(index, &items)?;
            if items.is_empty() {
                return Ok(None);
            }
            Ok(Some(ListNotification::added(next, items, index)))
        })?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Removals
    // ---------------------------------------------------------------------

    /// Removes the first item equal to `item`.
    ///
    /// Returns false, publishing nothing, if there is no such item.
    pub fn remove(&self, item: &T) -> bool {
        self.remove_with(item, |a, b| a == b)
    }

    /// Removes the first item `eq` considers equal to `item`.
    pub fn remove_with<F>(&self, item: &T, eq: F) -> bool
    where
        F: Fn(&T, &T) -> bool,
    {
        self.apply(|current| {
            let index = current.position_by(item, eq)?;
            removed_at(current, index, 1)
        })
        .is_some()
    }

    /// Removes the item at `index`.
    pub fn remove_at(&self, index: usize) -> Result<()> {
        self.mutate(|current| {
            if index >= current.len() {
                return Err(Error::index_out_of_range(index, current.len()));
            }
            Ok(removed_at(current, index, 1))
        })?;
        Ok(())
    }

    /// Removes `count` items starting at `index` as one `Remove`.
    pub fn remove_range(&self, index: usize, count: usize) -> Result<()> {
        self.mutate(|current| {
            current.range(index, count)?;
            if count == 0 {
                return Ok(None);
            }
            Ok(removed_at(current, index, count))
        })?;
        Ok(())
    }

    /// Removes the first match of every item in `items`.
    pub fn remove_items<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.remove_items_with(items, |a, b| a == b);
    }

    /// Removes the first `eq` match of every item in `items`.
    ///
    /// A single item behaves exactly like [`ListSource::remove_with`];
    /// several items publish one `Reset` if anything was removed.
    pub fn remove_items_with<I, F>(&self, items: I, eq: F)
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T, &T) -> bool,
    {
        let items: Vec<T> = items.into_iter().collect();
        match items.as_slice() {
            [] => {}
            [item] => {
                self.remove_with(item, eq);
            }
            _ => {
                self.apply(|current| {
                    let mut remaining = current.to_vec();
                    let mut removed = 0;
                    for item in &items {
                        if let Some(pos) = remaining.iter().position(|x| eq(x, item)) {
                            remaining.remove(pos);
                            removed += 1;
                        }
                    }
                    trace!(requested = items.len(), removed, "bulk removal");
                    (removed > 0)
                        .then(|| ListNotification::reset(current, ListSnapshot::from_vec(remaining)))
                });
            }
        }
    }

    /// Removes every item matching `predicate` with one `Reset`.
    pub fn remove_all<F>(&self, mut predicate: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.apply(|current| {
            let kept = current.retain(|x| !predicate(x));
            reshaped(current, kept)
        });
    }

    /// Removes every item.
    pub fn clear(&self) {
        self.apply(|current| {
            (!current.is_empty()).then(|| ListNotification::reset(current, ListSnapshot::new()))
        });
    }

    // ---------------------------------------------------------------------
    // Replacement
    // ---------------------------------------------------------------------

    /// Replaces the first item equal to `old` with `new`.
    ///
    /// Nothing is published if `old` is absent or equal to `new`.
    pub fn replace(&self, old: &T, new: T) {
        self.replace_with(old, new, |a, b| a == b);
    }

    /// Replaces the first item `eq` considers equal to `old` with `new`.
    pub fn replace_with<F>(&self, old: &T, new: T, eq: F)
    where
        F: Fn(&T, &T) -> bool,
    {
        self.apply(|current| {
            let index = current.position_by(old, eq)?;
            replaced_at(current, index, new)
        });
    }

    /// Replaces the item at `index`. Setting an equal value is a no-op.
    pub fn set_item(&self, index: usize, item: T) -> Result<()> {
        self.mutate(|current| {
            if index >= current.len() {
                return Err(Error::index_out_of_range(index, current.len()));
            }
            Ok(replaced_at(current, index, item))
        })?;
        Ok(())
    }

    /// Replaces the whole content with `items` as one `Reset`.
    pub fn reset<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let next: ListSnapshot<T> = items.into_iter().collect();
        self.apply(|current| reshaped(current, next));
    }

    // ---------------------------------------------------------------------
    // Reordering
    // ---------------------------------------------------------------------

    pub fn reverse(&self) {
        self.apply(|current| reshaped(current, current.reverse_range(0, current.len()).ok()?));
    }

    pub fn reverse_range(&self, index: usize, count: usize) -> Result<()> {
        self.mutate(|current| Ok(reshaped(current, current.reverse_range(index, count)?)))?;
        Ok(())
    }

    /// Stably sorts the whole list by `comparer`.
    pub fn sort_by(&self, comparer: Comparer<T>) {
        self.apply(|current| {
            let next = current.sort_range(0, current.len(), &comparer).ok()?;
            reshaped(current, next)
        });
    }

    /// Stably sorts `count` items starting at `index`.
    pub fn sort_range(&self, index: usize, count: usize, comparer: &Comparer<T>) -> Result<()> {
        self.mutate(|current| Ok(reshaped(current, current.sort_range(index, count, comparer)?)))?;
        Ok(())
    }
}

impl<T> ListSource<T>
where
    T: Clone + Ord + Send + Sync + 'static,
{
    /// Sorts the whole list in natural order.
    pub fn sort(&self) {
        self.sort_by(natural_order());
    }
}

impl<T> Default for ListSource<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListSource<T>
where
    T: Clone + PartialEq + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListSource")
            .field("items", &self.snapshot())
            .finish()
    }
}

fn removed_at<T: Clone>(
    current: &ListSnapshot<T>,
    index: usize,
    count: usize,
) -> Option<ListNotification<T>> {
    let old = current.range(index, count).ok()?;
    let next = current.remove_range(index, count).ok()?;
    Some(ListNotification::removed(next, old, index))
}

fn replaced_at<T: Clone + PartialEq>(
    current: &ListSnapshot<T>,
    index: usize,
    item: T,
) -> Option<ListNotification<T>> {
    let old = current.get(index)?;
    if *old == item {
        return None;
    }
    let old = old.clone();
    let next = current.set_item(index, item.clone()).ok()?;
    Some(ListNotification::replaced(next, old, item, index))
}

/// A `Reset` to `next`, or nothing if the content is unchanged.
pub(crate) fn reshaped<T: Clone + PartialEq>(
    current: &ListSnapshot<T>,
    next: ListSnapshot<T>,
) -> Option<ListNotification<T>> {
    (next != *current).then(|| ListNotification::reset(current, next))
}
