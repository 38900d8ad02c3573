//! Output collections a derived view can maintain.
//!
//! Every source kind can act as the accumulator of a transformation. Kinds
//! that keep upstream positions (plain lists) accept index-based writes;
//! the others place items themselves and reject positional writes.

use core::hash::Hash;
use tributary_core::{
    CollectionNotification, Error, ListNotification, MapNotification, Result,
    SortedSetNotification,
};
use tributary_reactive::ChangeFeed;
use tributary_source::{ListSource, MapSource, SortedListSource, SortedSetSource};

/// The write capabilities of an accumulator collection.
pub trait TargetCollection: Send + Sync + 'static {
    type Item: Clone + PartialEq + Send + Sync + 'static;
    type Notification: CollectionNotification<Item = Self::Item>;

    /// Human-readable kind, used in error messages.
    fn kind(&self) -> &'static str;

    /// True if positional writes keep upstream positions.
    fn can_handle_indexes(&self) -> bool {
        false
    }

    fn insert_range(&self, _index: usize, _items: Vec<Self::Item>) -> Result<()> {
        Err(Error::unsupported("insert_range", self.kind()))
    }

    fn remove_range(&self, _index: usize, _count: usize) -> Result<()> {
        Err(Error::unsupported("remove_range", self.kind()))
    }

    fn set_item(&self, _index: usize, _item: Self::Item) -> Result<()> {
        Err(Error::unsupported("set_item", self.kind()))
    }

    /// Adds items wherever the collection places them.
    fn add_range(&self, items: Vec<Self::Item>) -> Result<()>;

    /// Removes one match of every item.
    fn remove_items(&self, items: Vec<Self::Item>) -> Result<()>;

    fn replace(&self, old: Self::Item, new: Self::Item) -> Result<()>;

    /// Replaces the whole content, publishing at most one notification.
    fn reset(&self, items: Vec<Self::Item>) -> Result<()>;

    fn changes(&self) -> ChangeFeed<Self::Notification>;
}

impl<T> TargetCollection for ListSource<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    type Item = T;
    type Notification = ListNotification<T>;

    fn kind(&self) -> &'static str {
        "list"
    }

    fn can_handle_indexes(&self) -> bool {
        true
    }

    fn insert_range(&self, index: usize, items: Vec<T>) -> Result<()> {
        ListSource::insert_range(self, index, items)
    }

    fn remove_range(&self, index: usize, count: usize) -> Result<()> {
        ListSource::remove_range(self, index, count)
    }

    fn set_item(&self, index: usize, item: T) -> Result<()> {
        ListSource::set_item(self, index, item)
    }

    fn add_range(&self, items: Vec<T>) -> Result<()> {
        ListSource::add_range(self, items);
        Ok(())
    }

    fn remove_items(&self, items: Vec<T>) -> Result<()> {
        ListSource::remove_items(self, items);
        Ok(())
    }

    fn replace(&self, old: T, new: T) -> Result<()> {
        ListSource::replace(self, &old, new);
        Ok(())
    }

    fn reset(&self, items: Vec<T>) -> Result<()> {
        ListSource::reset(self, items);
        Ok(())
    }

    fn changes(&self) -> ChangeFeed<ListNotification<T>> {
        ListSource::changes(self)
    }
}

impl<T> TargetCollection for SortedListSource<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    type Item = T;
    type Notification = ListNotification<T>;

    fn kind(&self) -> &'static str {
        "sorted list"
    }

    fn add_range(&self, items: Vec<T>) -> Result<()> {
        SortedListSource::add_range(self, items);
        Ok(())
    }

    fn remove_items(&self, items: Vec<T>) -> Result<()> {
        SortedListSource::remove_items(self, items);
        Ok(())
    }

    fn replace(&self, old: T, new: T) -> Result<()> {
        SortedListSource::replace(self, &old, new);
        Ok(())
    }

    fn reset(&self, items: Vec<T>) -> Result<()> {
        SortedListSource::reset(self, items);
        Ok(())
    }

    fn changes(&self) -> ChangeFeed<ListNotification<T>> {
        SortedListSource::changes(self)
    }
}

impl<T> TargetCollection for SortedSetSource<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    type Item = T;
    type Notification = SortedSetNotification<T>;

    fn kind(&self) -> &'static str {
        "sorted set"
    }

    fn add_range(&self, items: Vec<T>) -> Result<()> {
        SortedSetSource::add_range(self, items);
        Ok(())
    }

    /// Removes the items one by one, so a multi-item removal reaches
    /// subscribers as one `Remove` notification per member removed.
    fn remove_items(&self, items: Vec<T>) -> Result<()> {
        for item in &items {
            SortedSetSource::remove(self, item);
        }
        Ok(())
    }

    /// Publishes a `Remove` for `old` followed by an `Add` for `new`.
    fn replace(&self, old: T, new: T) -> Result<()> {
        SortedSetSource::remove(self, &old);
        SortedSetSource::add(self, new);
        Ok(())
    }

    fn reset(&self, items: Vec<T>) -> Result<()> {
        SortedSetSource::reset(self, items);
        Ok(())
    }

    fn changes(&self) -> ChangeFeed<SortedSetNotification<T>> {
        SortedSetSource::changes(self)
    }
}

impl<K, V> TargetCollection for MapSource<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    type Item = (K, V);
    type Notification = MapNotification<K, V>;

    fn kind(&self) -> &'static str {
        "map"
    }

    fn add_range(&self, items: Vec<(K, V)>) -> Result<()> {
        MapSource::insert_range(self, items);
        Ok(())
    }

    fn remove_items(&self, items: Vec<(K, V)>) -> Result<()> {
        MapSource::remove_keys(self, items.into_iter().map(|(key, _)| key));
        Ok(())
    }

    fn replace(&self, old: (K, V), new: (K, V)) -> Result<()> {
        if old.0 != new.0 {
            MapSource::remove(self, &old.0);
        }
        MapSource::insert(self, new.0, new.1);
        Ok(())
    }

    fn reset(&self, items: Vec<(K, V)>) -> Result<()> {
        MapSource::reset(self, items);
        Ok(())
    }

    fn changes(&self) -> ChangeFeed<MapNotification<K, V>> {
        MapSource::changes(self)
    }
}
