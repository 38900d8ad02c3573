//! Sort-merge view: any upstream feed merged into a sorted set.

use core::fmt;
use parking_lot::ReentrantMutex;
use std::sync::Arc;
use tracing::{debug, trace};
use tributary_core::{ChangeAction, CollectionNotification, Comparer, SortedSetNotification};
use tributary_reactive::{ChangeFeed, Observer, SharedFeed, Subscription};
use tributary_source::SortedSetSource;

/// Folds upstream notifications into one sorted-set accumulator.
struct Merge<T> {
    target: ReentrantMutex<SortedSetSource<T>>,
}

impl<T> Merge<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn process<N>(&self, notification: &N)
    where
        N: CollectionNotification<Item = T>,
    {
        let target = self.target.lock();
        trace!(action = ?notification.action(), "merging upstream notification");
        match notification.action() {
            ChangeAction::Add => match notification.new_items() {
                [item] => {
                    target.add(item.clone());
                }
                items => target.add_range(items.iter().cloned()),
            },
            ChangeAction::Remove => {
                for item in notification.old_items() {
                    target.remove(item);
                }
            }
            ChangeAction::Replace => {
                for item in notification.old_items() {
                    target.remove(item);
                }
                target.add_range(notification.new_items().iter().cloned());
            }
            ChangeAction::Reset => target.reset(notification.current_items()),
        }
    }
}

/// A sorted, duplicate-free view over an upstream feed.
///
/// Members are identified by the comparer, so two upstream items that
/// compare equal collapse into one member.
pub struct SortedSetView<N: CollectionNotification> {
    comparer: Comparer<N::Item>,
    changes: SharedFeed<SortedSetNotification<N::Item>>,
}

/// Maintains the items of `upstream` as a sorted set ordered by `comparer`.
pub fn sort_set<N>(upstream: &ChangeFeed<N>, comparer: Comparer<N::Item>) -> SortedSetView<N>
where
    N: CollectionNotification,
{
    let changes = {
        let upstream = upstream.clone();
        let comparer = Arc::clone(&comparer);
        SharedFeed::new(move |sink: Observer<SortedSetNotification<N::Item>>| {
            debug!("building sort-merge chain");
            let merge = Arc::new(Merge {
                target: ReentrantMutex::new(SortedSetSource::with_comparer(Arc::clone(&comparer))),
            });
            let feeder = Arc::clone(&merge);
            let input: Subscription = upstream.subscribe_fn(move |n: &N| feeder.process(n));
            let output = merge.target.lock().changes();
            vec![input, output.subscribe(sink)]
        })
    };
    SortedSetView { comparer, changes }
}

impl<N: CollectionNotification> SortedSetView<N> {
    pub fn changes(&self) -> ChangeFeed<SortedSetNotification<N::Item>> {
        ChangeFeed::from_observable(self.changes.clone())
    }

    pub fn comparer(&self) -> &Comparer<N::Item> {
        &self.comparer
    }

    pub fn is_connected(&self) -> bool {
        self.changes.is_connected()
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes.subscriber_count()
    }
}

impl<N: CollectionNotification> fmt::Debug for SortedSetView<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedSetView")
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tributary_core::{key_order, natural_order, reverse_order};
    use tributary_source::{ListSource, MapSource};

    type Recorded<T> = Arc<Mutex<Vec<SortedSetNotification<T>>>>;

    fn record<T>(feed: &ChangeFeed<SortedSetNotification<T>>) -> (Recorded<T>, Subscription)
    where
        T: Clone + PartialEq + Send + Sync + 'static,
    {
        let seen: Recorded<T> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = feed.subscribe_fn(move |n| sink.lock().push(n.clone()));
        (seen, sub)
    }

    fn last<T: Clone>(seen: &Recorded<T>) -> Vec<T> {
        seen.lock()
            .last()
            .map(|n| n.current().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn test_sort_set_replays_sorted_upstream() {
        let source = ListSource::from_vec(vec![3, 1, 2, 3]);
        let view = sort_set(&source.changes(), natural_order());
        let (seen, _sub) = record(&view.changes());

        assert_eq!(seen.lock().len(), 1);
        assert_eq!(last(&seen), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_set_follows_list_changes() {
        let source = ListSource::from_vec(vec![5, 1]);
        let view = sort_set(&source.changes(), reverse_order());
        let (seen, _sub) = record(&view.changes());

        source.add(3);
        assert_eq!(last(&seen), vec![5, 3, 1]);

        source.add_range(vec![7, 0]);
        assert_eq!(last(&seen), vec![7, 5, 3, 1, 0]);

        source.set_item(0, 4).unwrap();
        assert_eq!(last(&seen), vec![7, 4, 3, 1, 0]);

        source.remove(&7);
        assert_eq!(last(&seen), vec![4, 3, 1, 0]);

        source.reset(vec![9]);
        assert_eq!(last(&seen), vec![9]);
    }

    #[test]
    fn test_sort_set_output_is_monotonic() {
        let source = ListSource::new();
        let view = sort_set(&source.changes(), natural_order());
        let (seen, _sub) = record(&view.changes());

        for value in [8, 3, 9, 3, 1, 8, 4] {
            source.add(value);
        }
        source.remove_at(0).unwrap();

        for n in seen.lock().iter() {
            assert!(n.is_strictly_ordered(n.current()));
        }
        // Removing one upstream copy of 8 removes the member.
        assert_eq!(last(&seen), vec![1, 3, 4, 9]);
    }

    #[test]
    fn test_sort_set_adding_present_member_is_silent() {
        let source = ListSource::from_vec(vec![1, 2]);
        let view = sort_set(&source.changes(), natural_order());
        let (seen, _sub) = record(&view.changes());

        source.add(2);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_sort_set_from_map_by_value() {
        let source = MapSource::from_pairs(vec![("b", 2), ("a", 5)]);
        let view = sort_set(&source.changes(), key_order(|pair: &(&'static str, i32)| pair.1));
        let (seen, _sub) = record(&view.changes());

        assert_eq!(last(&seen), vec![("b", 2), ("a", 5)]);

        source.insert("c", 1);
        source.insert("a", 0);
        assert_eq!(last(&seen), vec![("a", 0), ("c", 1), ("b", 2)]);
    }

    #[test]
    fn test_sort_set_chain_rebuilds_after_teardown() {
        let source = ListSource::from_vec(vec![2, 1]);
        let view = sort_set(&source.changes(), natural_order());

        let (_, first) = record(&view.changes());
        assert!(view.is_connected());
        drop(first);
        assert!(!view.is_connected());

        source.add(0);
        let (seen, _second) = record(&view.changes());
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(last(&seen), vec![0, 1, 2]);
    }
}
