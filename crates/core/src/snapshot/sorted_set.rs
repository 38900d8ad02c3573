//! Persistent sorted set snapshot.

use crate::compare::Comparer;
use core::cmp::Ordering;
use core::fmt;
use imbl::Vector;
use std::sync::Arc;

/// An immutable, duplicate-free, sorted sequence under a supplied comparer.
///
/// Two items are the same member when the comparer reports
/// `Ordering::Equal`. Storage is a persistent vector kept in order, so
/// lookups are binary searches, a single insert or removal costs
/// O(log n) and clones are O(1).
pub struct SortedSetSnapshot<T> {
    items: Vector<T>,
    comparer: Comparer<T>,
}

impl<T: Clone> Clone for SortedSetSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            comparer: Arc::clone(&self.comparer),
        }
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for SortedSetSnapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.iter()).finish()
    }
}

impl<T: Clone> SortedSetSnapshot<T> {
    /// Creates an empty set ordered by `comparer`.
    pub fn new(comparer: Comparer<T>) -> Self {
        Self {
            items: Vector::new(),
            comparer,
        }
    }

    /// Builds a set from arbitrary items, dropping duplicates.
    ///
    /// Of several equal items the first one wins.
    pub fn from_items<I>(comparer: Comparer<T>, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut items: Vec<T> = items.into_iter().collect();
        items.sort_by(|a, b| comparer(a, b));
        items.dedup_by(|later, earlier| comparer(&*earlier, &*later) == Ordering::Equal);
        Self {
            items: items.into_iter().collect(),
            comparer,
        }
    }

    #[inline]
    pub fn comparer(&self) -> &Comparer<T> {
        &self.comparer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> imbl::vector::Iter<'_, T> {
        self.items.iter()
    }

    fn search(&self, item: &T) -> Result<usize, usize> {
        self.items.binary_search_by(|member| (self.comparer)(member, item))
    }

    pub fn contains(&self, item: &T) -> bool {
        self.search(item).is_ok()
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.search(item).ok()
    }

    /// Returns the stored member equal to `item`, if any.
    pub fn try_get_value(&self, item: &T) -> Option<&T> {
        self.search(item).ok().and_then(|i| self.items.get(i))
    }

    /// Returns true if `items` is sorted and duplicate-free under this
    /// set's comparer.
    pub fn is_strictly_ordered<'a, I>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut items = items.into_iter();
        let Some(mut previous) = items.next() else {
            return true;
        };
        items.all(|item| {
            let ordered = (self.comparer)(previous, item) == Ordering::Less;
            previous = item;
            ordered
        })
    }

    fn with_items(&self, items: Vector<T>) -> Self {
        Self {
            items,
            comparer: Arc::clone(&self.comparer),
        }
    }

    fn others<I>(&self, other: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_items(Arc::clone(&self.comparer), other)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    /// Returns a set containing `item`, or `None` if it is already a member.
    pub fn insert(&self, item: T) -> Option<Self> {
        let index = self.search(&item).err()?;
        let mut items = self.items.clone();
        items.insert(index, item);
        Some(self.with_items(items))
    }

    /// Inserts every item that is not yet a member.
    ///
    /// Returns the new set together with the items actually inserted, in
    /// the order they were supplied.
    pub fn insert_many<I>(&self, items: I) -> (Self, Vec<T>)
    where
        I: IntoIterator<Item = T>,
    {
        let mut next = self.items.clone();
        let mut inserted: Vec<T> = Vec::new();
        for item in items {
            if let Err(index) = next.binary_search_by(|member| (self.comparer)(member, &item)) {
                next.insert(index, item.clone());
                inserted.push(item);
            }
        }
        if inserted.is_empty() {
            return (self.clone(), inserted);
        }
        (self.with_items(next), inserted)
    }

    /// Returns the set without `item` and the removed member, or `None` if
    /// `item` is not a member.
    pub fn remove(&self, item: &T) -> Option<(Self, T)> {
        let index = self.search(item).ok()?;
        let mut items = self.items.clone();
        let removed = items.remove(index);
        Some((self.with_items(items), removed))
    }

    pub fn clear(&self) -> Self {
        self.with_items(Vector::new())
    }

    /// Members of `self` or `other`.
    pub fn union<I>(&self, other: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        self.insert_many(other).0
    }

    /// Members of both `self` and `other`.
    pub fn intersect<I>(&self, other: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let other = self.others(other);
        let items = self.items.iter().filter(|x| other.contains(x)).cloned().collect();
        self.with_items(items)
    }

    /// Members of `self` that are not in `other`.
    pub fn except<I>(&self, other: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let other = self.others(other);
        let items = self.items.iter().filter(|x| !other.contains(x)).cloned().collect();
        self.with_items(items)
    }

    /// Members of exactly one of `self` and `other`.
    pub fn symmetric_except<I>(&self, other: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let other = self.others(other);
        let mut items: Vec<T> = self.items.iter().filter(|x| !other.contains(x)).cloned().collect();
        items.extend(other.iter().filter(|x| !self.contains(x)).cloned());
        items.sort_by(|a, b| (self.comparer)(a, b));
        self.with_items(items.into_iter().collect())
    }

    pub fn is_subset_of<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        let other = self.others(other);
        self.items.iter().all(|x| other.contains(x))
    }

    pub fn is_superset_of<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        self.others(other).iter().all(|x| self.contains(x))
    }

    pub fn is_proper_subset_of<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        let other = self.others(other);
        other.len() > self.len() && self.items.iter().all(|x| other.contains(x))
    }

    pub fn is_proper_superset_of<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        let other = self.others(other);
        self.len() > other.len() && other.iter().all(|x| self.contains(x))
    }

    pub fn overlaps<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        other.into_iter().any(|x| self.contains(&x))
    }

    pub fn set_equals<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = T>,
    {
        let other = self.others(other);
        other.len() == self.len() && other.iter().all(|x| self.contains(x))
    }
}

impl<T: Clone + PartialEq> PartialEq for SortedSetSnapshot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<'a, T: Clone> IntoIterator for &'a SortedSetSnapshot<T> {
    type Item = &'a T;
    type IntoIter = imbl::vector::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{key_order, natural_order, reverse_order};

    #[test]
    fn test_sorted_set_insert() {
        let set = SortedSetSnapshot::new(natural_order());
        let set = set.insert(5).unwrap();
        let set = set.insert(2).unwrap();

        assert_eq!(set.to_vec(), vec![2, 5]);
        assert!(set.insert(5).is_none());
    }

    #[test]
    fn test_sorted_set_from_items_dedups() {
        let set = SortedSetSnapshot::from_items(natural_order(), vec![3, 1, 3, 2, 1]);
        assert_eq!(set.to_vec(), vec![1, 2, 3]);

        let desc = SortedSetSnapshot::from_items(reverse_order(), vec![1, 3, 2]);
        assert_eq!(desc.to_vec(), vec![3, 2, 1]);
    }

    #[test]
    fn test_sorted_set_first_equal_item_wins() {
        let by_len = key_order(|s: &String| s.len());
        let set = SortedSetSnapshot::from_items(by_len, vec!["ab".to_string(), "cd".to_string()]);
        assert_eq!(set.to_vec(), vec!["ab".to_string()]);
        assert_eq!(set.try_get_value(&"zz".to_string()), Some(&"ab".to_string()));
    }

    #[test]
    fn test_sorted_set_insert_many() {
        let set = SortedSetSnapshot::from_items(natural_order(), vec![2, 4]);
        let (set, inserted) = set.insert_many(vec![4, 3, 1, 3]);

        assert_eq!(set.to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(inserted, vec![3, 1]);
    }

    #[test]
    fn test_sorted_set_remove() {
        let set = SortedSetSnapshot::from_items(natural_order(), vec![1, 2, 3]);
        let (smaller, removed) = set.remove(&2).unwrap();

        assert_eq!(removed, 2);
        assert_eq!(smaller.to_vec(), vec![1, 3]);
        assert!(smaller.remove(&2).is_none());
    }

    #[test]
    fn test_sorted_set_algebra() {
        let set = SortedSetSnapshot::from_items(natural_order(), vec![1, 2, 3, 4]);

        assert_eq!(set.union(vec![6, 5]).to_vec(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(set.intersect(vec![2, 4, 8]).to_vec(), vec![2, 4]);
        assert_eq!(set.except(vec![1, 4]).to_vec(), vec![2, 3]);
        assert_eq!(set.symmetric_except(vec![3, 4, 5]).to_vec(), vec![1, 2, 5]);
    }

    #[test]
    fn test_sorted_set_relations() {
        let set = SortedSetSnapshot::from_items(natural_order(), vec![1, 2]);

        assert!(set.is_subset_of(vec![1, 2]));
        assert!(!set.is_proper_subset_of(vec![1, 2]));
        assert!(set.is_proper_subset_of(vec![1, 2, 3]));
        assert!(set.is_superset_of(vec![2]));
        assert!(set.is_proper_superset_of(vec![2, 2]));
        assert!(set.overlaps(vec![9, 2]));
        assert!(!set.overlaps(vec![9]));
        assert!(set.set_equals(vec![2, 1, 1]));
    }

    #[test]
    fn test_sorted_set_updates_leave_older_versions_intact() {
        let base = SortedSetSnapshot::from_items(natural_order(), (0..4_000).map(|x| x * 2));
        let grown = base.insert(1_001).unwrap();
        let (shrunk, removed) = grown.remove(&2_000).unwrap();

        assert_eq!(removed, 2_000);
        assert_eq!(base.len(), 4_000);
        assert!(!base.contains(&1_001));
        assert!(base.contains(&2_000));
        assert_eq!(grown.index_of(&1_001), Some(501));
        assert_eq!(shrunk.len(), 4_000);
        assert!(shrunk.is_strictly_ordered(&shrunk));
        assert!(!shrunk.is_strictly_ordered(&vec![3, 1]));
    }
}
