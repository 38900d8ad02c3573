//! Persistent list snapshot.

use crate::compare::Comparer;
use crate::error::{check_index, check_range, Result};
use core::fmt;
use imbl::Vector;

/// An immutable, cheaply clonable list.
///
/// Storage is a persistent RRB vector. Cloning is O(1), and an update
/// copies only the O(log n) nodes on the path it touches while sharing
/// the rest with `self`. A snapshot captured by a notification therefore
/// stays valid for as long as anyone holds it.
pub struct ListSnapshot<T> {
    items: Vector<T>,
}

impl<T: Clone> Clone for ListSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T: Clone> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for ListSnapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T: Clone> ListSnapshot<T> {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self {
            items: Vector::new(),
        }
    }

    /// Creates a snapshot owning the given items.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
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

    /// Returns the position of the first item matching `eq`.
    pub fn position_by<F>(&self, item: &T, eq: F) -> Option<usize>
    where
        F: Fn(&T, &T) -> bool,
    {
        self.items.iter().position(|x| eq(x, item))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    fn derive<F>(&self, update: F) -> Self
    where
        F: FnOnce(&mut Vector<T>),
    {
        let mut items = self.items.clone();
        update(&mut items);
        Self { items }
    }

    /// Returns a copy of `count` items starting at `index`.
    pub fn range(&self, index: usize, count: usize) -> Result<Vec<T>> {
        check_range(index, count, self.len())?;
        Ok(self.items.skip(index).take(count).into_iter().collect())
    }

    /// Appends `items` at the end.
    pub fn append(&self, items: &[T]) -> Self {
        self.derive(|v| v.extend(items.iter().cloned()))
    }

    /// Inserts `items` before position `index` (`index == len` appends).
    pub fn insert_range(&self, index: usize, items: &[T]) -> Result<Self> {
        check_range(index, 0, self.len())?;
        Ok(self.derive(|v| {
            let tail = v.split_off(index);
            v.extend(items.iter().cloned());
            v.append(tail);
        }))
    }

    /// Removes `count` items starting at `index`.
    pub fn remove_range(&self, index: usize, count: usize) -> Result<Self> {
        check_range(index, count, self.len())?;
        Ok(self.derive(|v| {
            let mut tail = v.split_off(index);
            v.append(tail.split_off(count));
        }))
    }

    /// Replaces the item at `index`.
    pub fn set_item(&self, index: usize, item: T) -> Result<Self> {
        check_index(index, self.len())?;
        Ok(self.derive(|v| {
            v.set(index, item);
        }))
    }

    /// Keeps only the items for which `keep` returns true.
    pub fn retain<F>(&self, keep: F) -> Self
    where
        F: FnMut(&T) -> bool,
    {
        self.derive(|v| v.retain(keep))
    }

    /// Rewrites `count` items starting at `index` through `update`.
    fn derive_range<F>(&self, index: usize, count: usize, update: F) -> Result<Self>
    where
        F: FnOnce(&mut Vec<T>),
    {
        check_range(index, count, self.len())?;
        Ok(self.derive(|v| {
            let mut middle = v.split_off(index);
            let rest = middle.split_off(count);
            let mut window: Vec<T> = middle.into_iter().collect();
            update(&mut window);
            v.extend(window);
            v.append(rest);
        }))
    }

    /// Reverses `count` items starting at `index`.
    pub fn reverse_range(&self, index: usize, count: usize) -> Result<Self> {
        self.derive_range(index, count, |window| window.reverse())
    }

    /// Stably sorts `count` items starting at `index`.
    pub fn sort_range(&self, index: usize, count: usize, comparer: &Comparer<T>) -> Result<Self> {
        self.derive_range(index, count, |window| window.sort_by(|a, b| comparer(a, b)))
    }
}

impl<T: Clone + PartialEq> ListSnapshot<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.items.iter().any(|x| x == item)
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|x| x == item)
    }
}

impl<T: Clone + PartialEq> PartialEq for ListSnapshot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Clone + Eq> Eq for ListSnapshot<T> {}

impl<T: Clone> FromIterator<T> for ListSnapshot<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a, T: Clone> IntoIterator for &'a ListSnapshot<T> {
    type Item = &'a T;
    type IntoIter = imbl::vector::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{natural_order, reverse_order};
    use crate::error::Error;

    #[test]
    fn test_list_snapshot_insert_range() {
        let list = ListSnapshot::from_vec(vec![1, 2, 3]);
        let inserted = list.insert_range(1, &[9]).unwrap();

        assert_eq!(inserted.to_vec(), vec![1, 9, 2, 3]);
        // The previous snapshot is untouched
        assert_eq!(list.to_vec(), vec![1, 2, 3]);

        let appended = list.insert_range(3, &[4, 5]).unwrap();
        assert_eq!(appended.to_vec(), vec![1, 2, 3, 4, 5]);

        assert_eq!(list.insert_range(4, &[0]).unwrap_err(), Error::index_out_of_range(4, 3));
    }

    #[test]
    fn test_list_snapshot_remove_range() {
        let list = ListSnapshot::from_vec(vec![1, 2, 3, 4]);
        assert_eq!(list.remove_range(1, 2).unwrap().to_vec(), vec![1, 4]);
        assert_eq!(list.remove_range(0, 4).unwrap().to_vec(), Vec::<i32>::new());
        assert!(list.remove_range(3, 2).is_err());
        assert_eq!(list.range(1, 2).unwrap(), vec![2, 3]);
        assert_eq!(list.range(4, 0).unwrap(), Vec::<i32>::new());
    }

    #[test]
    fn test_list_snapshot_set_item() {
        let list = ListSnapshot::from_vec(vec!["a", "b"]);
        assert_eq!(list.set_item(1, "c").unwrap().to_vec(), vec!["a", "c"]);
        assert!(list.set_item(2, "d").is_err());
    }

    #[test]
    fn test_list_snapshot_reorder() {
        let list = ListSnapshot::from_vec(vec![3, 1, 2, 5]);
        assert_eq!(list.reverse_range(0, 4).unwrap().to_vec(), vec![5, 2, 1, 3]);
        assert_eq!(list.reverse_range(1, 2).unwrap().to_vec(), vec![3, 2, 1, 5]);
        assert_eq!(
            list.sort_range(0, 3, &natural_order()).unwrap().to_vec(),
            vec![1, 2, 3, 5]
        );
        assert_eq!(
            list.sort_range(0, 4, &reverse_order()).unwrap().to_vec(),
            vec![5, 3, 2, 1]
        );
    }

    #[test]
    fn test_list_snapshot_equality() {
        let a = ListSnapshot::from_vec(vec![1, 2]);
        let b = a.clone();
        let c: ListSnapshot<i32> = vec![1, 2].into_iter().collect();

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_ne!(a, a.retain(|x| *x > 1));
    }

    #[test]
    fn test_list_snapshot_lookup() {
        let list = ListSnapshot::from_vec(vec![1, 2, 2, 3]);
        assert!(list.contains(&2));
        assert_eq!(list.index_of(&2), Some(1));
        assert_eq!(list.index_of(&7), None);
        assert_eq!(list.position_by(&4, |a, b| a * 2 == *b), Some(1));
    }

    #[test]
    fn test_list_snapshot_updates_leave_older_versions_intact() {
        let base: ListSnapshot<usize> = (0..10_000).collect();
        let mut versions = vec![base.clone()];
        for i in 0..100 {
            let latest = versions.last().unwrap().set_item(i * 97, usize::MAX).unwrap();
            versions.push(latest);
        }

        assert_eq!(base.to_vec(), (0..10_000).collect::<Vec<_>>());
        for (step, version) in versions.iter().enumerate() {
            let replaced = version.iter().filter(|x| **x == usize::MAX).count();
            assert_eq!(replaced, step);
            assert_eq!(version.len(), 10_000);
        }

        let shifted = base.insert_range(5_000, &[1, 2, 3]).unwrap();
        assert_eq!(shifted.get(5_000), Some(&1));
        assert_eq!(shifted.get(5_003), Some(&5_000));
        assert_eq!(base.get(5_000), Some(&5_000));
    }
}
