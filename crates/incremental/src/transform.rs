//! Incremental filter/map transformation.
//!
//! A [`Transformation`] consumes an upstream change feed and maintains a
//! derived collection holding `map(filter(upstream))`. Index-preserving
//! upstream changes are translated into index-preserving output changes;
//! only bulk changes rebuild the output, and a rebuild publishes a single
//! `Reset`.
//!
//! Each subscription chain owns a fresh accumulator created by the target
//! factory. The chain is connected when the first observer subscribes and
//! dropped when the last one leaves.

use crate::target::TargetCollection;
use core::hash::Hash;
use parking_lot::ReentrantMutex;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use tributary_core::{
    ChangeAction, CollectionNotification, Comparer, EqualityComparer, Error, MapNotification,
    Result,
};
use tributary_reactive::{ChangeFeed, Observer, SharedFeed, Subscription};
use tributary_source::{ListSource, MapSource, SortedListSource, SortedSetSource};

/// Keeps an upstream item when it returns true.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Maps an upstream item to an output item.
pub type Selector<T, R> = Arc<dyn Fn(&T) -> R + Send + Sync>;

/// Creates a fresh, empty accumulator for a new chain.
pub type TargetFactory<C> = Arc<dyn Fn() -> C + Send + Sync>;

/// The per-chain state: one accumulator behind a re-entrant lock.
struct Chain<T, C: TargetCollection> {
    filter: Option<Predicate<T>>,
    selector: Selector<T, C::Item>,
    target: ReentrantMutex<C>,
}

impl<T, C> Chain<T, C>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    C: TargetCollection,
{
    #[inline]
    fn passes(&self, item: &T) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(item))
    }

    fn project(&self, items: &[T]) -> Vec<C::Item> {
        items
            .iter()
            .filter(|item| self.passes(item))
            .map(|item| (self.selector)(item))
            .collect()
    }

    /// Position in the output that corresponds to the upstream index.
    ///
    /// With a filter this is the number of passing items in front of the
    /// upstream index, so list outputs keep upstream order.
    fn output_index<N>(&self, target: &C, notification: &N) -> Option<usize>
    where
        N: CollectionNotification<Item = T>,
    {
        let index = notification.index()?;
        if !target.can_handle_indexes() {
            return None;
        }
        match &self.filter {
            None => Some(index),
            Some(filter) => notification.count_before(index, &|item: &T| filter(item)),
        }
    }

    fn process<N>(&self, notification: &N)
    where
        N: CollectionNotification<Item = T>,
    {
        let target = self.target.lock();
        trace!(action = ?notification.action(), "processing upstream notification");
        if let Err(error) = self.apply(&target, notification) {
            warn!(%error, kind = target.kind(), "rebuilding derived collection after failed update");
            if let Err(error) = self.rebuild(&target, notification) {
                warn!(%error, kind = target.kind(), "rebuild of derived collection failed");
            }
        }
    }

    fn apply<N>(&self, target: &C, notification: &N) -> Result<()>
    where
        N: CollectionNotification<Item = T>,
    {
        let old_items = notification.old_items();
        let new_items = notification.new_items();
        match notification.action() {
            ChangeAction::Add => {
                let items = self.project(new_items);
                if items.is_empty() {
                    return Ok(());
                }
                match self.output_index(target, notification) {
                    Some(index) => target.insert_range(index, items),
                    None => target.add_range(items),
                }
            }
            ChangeAction::Remove => {
                let items = self.project(old_items);
                if items.is_empty() {
                    return Ok(());
                }
                match self.output_index(target, notification) {
                    Some(index) => target.remove_range(index, items.len()),
                    None => target.remove_items(items),
                }
            }
            ChangeAction::Replace if old_items.len() == 1 && new_items.len() == 1 => {
                let (old, new) = (&old_items[0], &new_items[0]);
                let index = self.output_index(target, notification);
                match (self.passes(old), self.passes(new)) {
                    (true, true) => {
                        let new = (self.selector)(new);
                        match index {
                            Some(index) => target.set_item(index, new),
                            None => target.replace((self.selector)(old), new),
                        }
                    }
                    (true, false) => match index {
                        Some(index) => target.remove_range(index, 1),
                        None => target.remove_items(vec![(self.selector)(old)]),
                    },
                    (false, true) => {
                        let new = vec![(self.selector)(new)];
                        match index {
                            Some(index) => target.insert_range(index, new),
                            None => target.add_range(new),
                        }
                    }
                    (false, false) => Ok(()),
                }
            }
            ChangeAction::Replace | ChangeAction::Reset => self.rebuild(target, notification),
        }
    }

    fn rebuild<N>(&self, target: &C, notification: &N) -> Result<()>
    where
        N: CollectionNotification<Item = T>,
    {
        let items = self.project(&notification.current_items());
        trace!(count = items.len(), "rebuilding derived collection");
        target.reset(items)
    }
}

/// A derived collection maintained incrementally from an upstream feed.
///
/// `N` is the upstream notification type and `C` the accumulator kind.
pub struct Transformation<N: CollectionNotification, C: TargetCollection> {
    upstream: ChangeFeed<N>,
    filter: Option<Predicate<N::Item>>,
    selector: Selector<N::Item, C::Item>,
    mapped: bool,
    target: TargetFactory<C>,
    changes: SharedFeed<C::Notification>,
}

impl<N, C> Transformation<N, C>
where
    N: CollectionNotification,
    C: TargetCollection,
{
    fn assemble(
        upstream: ChangeFeed<N>,
        filter: Option<Predicate<N::Item>>,
        selector: Selector<N::Item, C::Item>,
        mapped: bool,
        target: TargetFactory<C>,
    ) -> Self {
        let changes = {
            let upstream = upstream.clone();
            let filter = filter.clone();
            let selector = Arc::clone(&selector);
            let target = Arc::clone(&target);
            SharedFeed::new(move |sink: Observer<C::Notification>| {
                let chain = Arc::new(Chain {
                    filter: filter.clone(),
                    selector: Arc::clone(&selector),
                    target: ReentrantMutex::new(target()),
                });
                debug!(kind = chain.target.lock().kind(), "building transformation chain");

                // The upstream replay is folded into the accumulator before
                // the accumulator's own replay reaches the sink.
                let feeder = Arc::clone(&chain);
                let input: Subscription = upstream.subscribe_fn(move |n: &N| feeder.process(n));
                let output = chain.target.lock().changes();
                vec![input, output.subscribe(sink)]
            })
        };

        Self {
            upstream,
            filter,
            selector,
            mapped,
            target,
            changes,
        }
    }

    /// Returns the change feed of the derived collection.
    pub fn changes(&self) -> ChangeFeed<C::Notification> {
        ChangeFeed::from_observable(self.changes.clone())
    }

    /// Returns true while at least one observer keeps a chain alive.
    pub fn is_connected(&self) -> bool {
        self.changes.is_connected()
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes.subscriber_count()
    }

    /// True if a predicate can still be merged into this transformation.
    ///
    /// Once a mapping is applied, later predicates see output items and
    /// must be a separate transformation.
    #[inline]
    pub fn can_add_where(&self) -> bool {
        !self.mapped
    }

    /// Returns a transformation that additionally requires `predicate`, or
    /// `None` if a mapping is already applied.
    pub fn try_where<F>(&self, predicate: F) -> Option<Self>
    where
        F: Fn(&N::Item) -> bool + Send + Sync + 'static,
    {
        if self.mapped {
            return None;
        }
        let filter: Predicate<N::Item> = match &self.filter {
            Some(existing) => {
                let existing = Arc::clone(existing);
                Arc::new(move |item: &N::Item| existing(item) && predicate(item))
            }
            None => Arc::new(predicate),
        };
        Some(Self::assemble(
            self.upstream.clone(),
            Some(filter),
            Arc::clone(&self.selector),
            false,
            Arc::clone(&self.target),
        ))
    }

    #[inline]
    pub fn can_add_select(&self) -> bool {
        true
    }

    /// Returns a transformation that maps every output item through
    /// `selector` into a new accumulator kind.
    pub fn select<D, F, G>(&self, selector: F, target: G) -> Transformation<N, D>
    where
        D: TargetCollection,
        F: Fn(&C::Item) -> D::Item + Send + Sync + 'static,
        G: Fn() -> D + Send + Sync + 'static,
    {
        let inner = Arc::clone(&self.selector);
        Transformation::assemble(
            self.upstream.clone(),
            self.filter.clone(),
            Arc::new(move |item: &N::Item| selector(&inner(item))),
            true,
            Arc::new(target),
        )
    }
}

impl<N, C> core::fmt::Debug for Transformation<N, C>
where
    N: CollectionNotification,
    C: TargetCollection,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Transformation")
            .field("filtered", &self.filter.is_some())
            .field("mapped", &self.mapped)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Builder for [`Transformation`].
///
/// `upstream` and `target` are always required. A `selector` is required
/// by [`TransformationBuilder::build`]; [`TransformationBuilder::build_filtered`]
/// falls back to passing items through unchanged.
pub struct TransformationBuilder<N: CollectionNotification, C: TargetCollection> {
    upstream: Option<ChangeFeed<N>>,
    filter: Option<Predicate<N::Item>>,
    selector: Option<Selector<N::Item, C::Item>>,
    target: Option<TargetFactory<C>>,
}

impl<N, C> Default for TransformationBuilder<N, C>
where
    N: CollectionNotification,
    C: TargetCollection,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, C> TransformationBuilder<N, C>
where
    N: CollectionNotification,
    C: TargetCollection,
{
    pub fn new() -> Self {
        Self {
            upstream: None,
            filter: None,
            selector: None,
            target: None,
        }
    }

    pub fn upstream(mut self, upstream: ChangeFeed<N>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&N::Item) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(predicate));
        self
    }

    pub fn selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(&N::Item) -> C::Item + Send + Sync + 'static,
    {
        self.selector = Some(Arc::new(selector));
        self
    }

    /// Sets the factory that creates one empty accumulator per chain.
    pub fn target<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.target = Some(Arc::new(factory));
        self
    }

    #[allow(clippy::type_complexity)]
    fn required(
        self,
    ) -> Result<(
        ChangeFeed<N>,
        TargetFactory<C>,
        Option<Predicate<N::Item>>,
        Option<Selector<N::Item, C::Item>>,
    )> {
        let upstream = self
            .upstream
            .ok_or_else(|| Error::invalid_argument("transformation requires an upstream feed"))?;
        let target = self
            .target
            .ok_or_else(|| Error::invalid_argument("transformation requires a target factory"))?;
        Ok((upstream, target, self.filter, self.selector))
    }

    /// Builds a mapping transformation.
    pub fn build(self) -> Result<Transformation<N, C>> {
        let (upstream, target, filter, selector) = self.required()?;
        let selector = selector
            .ok_or_else(|| Error::invalid_argument("transformation requires a selector"))?;
        Ok(Transformation::assemble(upstream, filter, selector, true, target))
    }
}

impl<N, C> TransformationBuilder<N, C>
where
    N: CollectionNotification,
    C: TargetCollection<Item = N::Item>,
{
    /// Builds a transformation whose output items are the upstream items,
    /// unless a selector was given.
    pub fn build_filtered(self) -> Result<Transformation<N, C>> {
        let (upstream, target, filter, selector) = self.required()?;
        let mapped = selector.is_some();
        let selector: Selector<N::Item, N::Item> =
            selector.unwrap_or_else(|| Arc::new(|item: &N::Item| item.clone()));
        Ok(Transformation::assemble(upstream, filter, selector, mapped, target))
    }
}

// ---------------------------------------------------------------------------
// Operator constructors
// ---------------------------------------------------------------------------

/// Keeps the upstream items matching `predicate`, in upstream order.
pub fn filter_list<N, F>(upstream: &ChangeFeed<N>, predicate: F) -> Transformation<N, ListSource<N::Item>>
where
    N: CollectionNotification,
    F: Fn(&N::Item) -> bool + Send + Sync + 'static,
{
    Transformation::assemble(
        upstream.clone(),
        Some(Arc::new(predicate)),
        Arc::new(|item: &N::Item| item.clone()),
        false,
        Arc::new(ListSource::new),
    )
}

/// Maps every upstream item through `selector`, in upstream order.
pub fn select_list<N, R, F>(upstream: &ChangeFeed<N>, selector: F) -> Transformation<N, ListSource<R>>
where
    N: CollectionNotification,
    R: Clone + PartialEq + Send + Sync + 'static,
    F: Fn(&N::Item) -> R + Send + Sync + 'static,
{
    Transformation::assemble(
        upstream.clone(),
        None,
        Arc::new(selector),
        true,
        Arc::new(ListSource::new),
    )
}

/// Keeps the upstream items in a list sorted by `comparer`.
///
/// Removals and replacements locate output items with `equality`.
pub fn sort_list<N>(
    upstream: &ChangeFeed<N>,
    comparer: Comparer<N::Item>,
    equality: EqualityComparer<N::Item>,
) -> Transformation<N, SortedListSource<N::Item>>
where
    N: CollectionNotification,
{
    Transformation::assemble(
        upstream.clone(),
        None,
        Arc::new(|item: &N::Item| item.clone()),
        false,
        Arc::new(move || SortedListSource::with_comparers(Arc::clone(&comparer), Arc::clone(&equality))),
    )
}

/// Maps every upstream item through `selector` into a sorted set.
pub fn sort_set_map<N, R, F>(
    upstream: &ChangeFeed<N>,
    selector: F,
    comparer: Comparer<R>,
) -> Transformation<N, SortedSetSource<R>>
where
    N: CollectionNotification,
    R: Clone + PartialEq + Send + Sync + 'static,
    F: Fn(&N::Item) -> R + Send + Sync + 'static,
{
    Transformation::assemble(
        upstream.clone(),
        None,
        Arc::new(selector),
        true,
        Arc::new(move || SortedSetSource::with_comparer(Arc::clone(&comparer))),
    )
}

/// Keeps the entries whose value matches `predicate` and maps their values
/// through `selector`. Keys are preserved.
pub fn filter_map_values<K, V, R, P, F>(
    upstream: &ChangeFeed<MapNotification<K, V>>,
    predicate: P,
    selector: F,
) -> Transformation<MapNotification<K, V>, MapSource<K, R>>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
    R: Clone + PartialEq + Send + Sync + 'static,
    P: Fn(&V) -> bool + Send + Sync + 'static,
    F: Fn(&V) -> R + Send + Sync + 'static,
{
    Transformation::assemble(
        upstream.clone(),
        Some(Arc::new(move |(_, value): &(K, V)| predicate(value))),
        Arc::new(move |(key, value): &(K, V)| (key.clone(), selector(value))),
        true,
        Arc::new(MapSource::new),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tributary_core::{natural_equality, natural_order, ListNotification, SortedSetNotification};

    fn record<M: CollectionNotification>(feed: &ChangeFeed<M>) -> (Arc<Mutex<Vec<M>>>, Subscription) {
        let seen: Arc<Mutex<Vec<M>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = feed.subscribe_fn(move |n: &M| sink.lock().push(n.clone()));
        (seen, sub)
    }

    fn even(x: &i32) -> bool {
        x % 2 == 0
    }

    #[test]
    fn test_filter_list_initial_replay() {
        let source = ListSource::from_vec(vec![1, 2, 3, 4]);
        let evens = filter_list(&source.changes(), even);

        let (seen, _sub) = record(&evens.changes());

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].action(), ChangeAction::Reset);
        assert_eq!(seen[0].current().to_vec(), vec![2, 4]);
    }

    #[test]
    fn test_filter_list_projects_indexes() {
        let source = ListSource::from_vec(vec![1, 2, 3, 4]);
        let evens = filter_list(&source.changes(), even);
        let (seen, _sub) = record(&evens.changes());

        source.insert(3, 10).unwrap(); // [1, 2, 3, 10, 4]
        source.insert(0, 5).unwrap(); // filtered out
        source.remove_at(2).unwrap(); // removes 2

        let seen = seen.lock();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].action(), ChangeAction::Add);
        assert_eq!(seen[1].index(), Some(1));
        assert_eq!(seen[1].current().to_vec(), vec![2, 10, 4]);
        assert_eq!(seen[2].action(), ChangeAction::Remove);
        assert_eq!(seen[2].index(), Some(0));
        assert_eq!(seen[2].current().to_vec(), vec![10, 4]);
    }

    #[test]
    fn test_filter_list_replace_cases() {
        let source = ListSource::from_vec(vec![2, 3]);
        let evens = filter_list(&source.changes(), even);
        let (seen, _sub) = record(&evens.changes());

        source.set_item(0, 4).unwrap(); // both pass
        source.set_item(0, 5).unwrap(); // only old passes
        source.set_item(1, 6).unwrap(); // only new passes
        source.set_item(0, 7).unwrap(); // neither passes

        let seen = seen.lock();
        let actions: Vec<_> = seen.iter().skip(1).map(|n| n.action()).collect();
        assert_eq!(
            actions,
            vec![ChangeAction::Replace, ChangeAction::Remove, ChangeAction::Add]
        );
        assert_eq!(seen.last().unwrap().current().to_vec(), vec![6]);
    }

    #[test]
    fn test_bulk_change_rebuilds_with_single_reset() {
        let source = ListSource::from_vec(vec![3, 1, 2]);
        let doubled = select_list(&source.changes(), |x: &i32| x * 2);
        let (seen, _sub) = record(&doubled.changes());

        source.sort();
        source.remove_all(|x| *x == 5);

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].action(), ChangeAction::Reset);
        assert_eq!(seen[1].old_items(), &[6, 2, 4]);
        assert_eq!(seen[1].new_items(), &[2, 4, 6]);
    }

    #[test]
    fn test_no_match_keeps_output_silent() {
        let source = ListSource::new();
        let big = filter_list(&source.changes(), |x: &i32| *x > 100);
        let (seen, _sub) = record(&big.changes());

        source.add_range(vec![1, 2, 3]);
        source.clear();

        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_try_where_merges_predicates() {
        let source = ListSource::from_vec((1..=12).collect());
        let evens = filter_list(&source.changes(), even);
        assert!(evens.can_add_where());

        let by_six = evens.try_where(|x| x % 3 == 0).unwrap();
        let (seen, _sub) = record(&by_six.changes());
        source.add(18);

        assert_eq!(seen.lock().last().unwrap().current().to_vec(), vec![6, 12, 18]);
    }

    #[test]
    fn test_try_where_refused_after_select() {
        let source = ListSource::from_vec(vec![1, 2]);
        let labels = select_list(&source.changes(), |x: &i32| x.to_string());

        assert!(!labels.can_add_where());
        assert!(labels.try_where(|_| true).is_none());
        assert!(labels.can_add_select());
    }

    #[test]
    fn test_select_composes_selectors() {
        let source = ListSource::from_vec(vec![1, 2, 3]);
        let evens = filter_list(&source.changes(), even);
        let squares = evens.select(|x: &i32| x * x, ListSource::new);
        let (seen, _sub) = record(&squares.changes());

        source.add(4);

        assert_eq!(seen.lock().last().unwrap().current().to_vec(), vec![4, 16]);
        assert!(!squares.can_add_where());
    }

    #[test]
    fn test_sort_list_keeps_order() {
        let source = ListSource::from_vec(vec![5, 1, 4]);
        let sorted = sort_list(&source.changes(), natural_order(), natural_equality());
        let (seen, _sub) = record(&sorted.changes());

        source.add(3);
        source.replace(&5, 0);
        source.remove(&4);

        let seen = seen.lock();
        assert_eq!(seen[0].current().to_vec(), vec![1, 4, 5]);
        assert_eq!(seen.last().unwrap().current().to_vec(), vec![0, 1, 3]);
        assert!(seen.iter().all(|n: &ListNotification<i32>| {
            n.current().to_vec().windows(2).all(|w| w[0] <= w[1])
        }));
    }

    #[test]
    fn test_sort_set_map() {
        let source = ListSource::from_vec(vec!["bb".to_string(), "a".to_string()]);
        let lengths = sort_set_map(&source.changes(), |s: &String| s.len(), natural_order());
        let (seen, _sub) = record(&lengths.changes());

        source.add("cc".to_string());
        source.add("dddd".to_string());

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].current().to_vec(), vec![1, 2, 4]);
        assert!(seen.iter().all(|n: &SortedSetNotification<usize>| n.index().is_none()));
    }

    #[test]
    fn test_filter_map_values() {
        let source = MapSource::from_pairs(vec![("a", 1), ("b", 20)]);
        let big = filter_map_values(&source.changes(), |v: &i32| *v >= 10, |v: &i32| v * 100);
        let (seen, _sub) = record(&big.changes());

        source.insert("a", 15);
        source.insert("b", 5);
        source.insert("c", 30);

        let seen = seen.lock();
        let last = seen.last().unwrap().current();
        assert_eq!(last.get(&"a"), Some(&1500));
        assert_eq!(last.get(&"b"), None);
        assert_eq!(last.get(&"c"), Some(&3000));
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_chain_lifecycle() {
        let source = ListSource::from_vec(vec![1, 2]);
        let evens = filter_list(&source.changes(), even);
        assert!(!evens.is_connected());

        let (_, first) = record(&evens.changes());
        let (late, second) = record(&evens.changes());
        assert!(evens.is_connected());
        assert_eq!(evens.subscriber_count(), 2);
        assert_eq!(late.lock().len(), 1);

        drop(first);
        drop(second);
        assert!(!evens.is_connected());

        source.add(4);
        let (seen, _sub) = record(&evens.changes());
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].current().to_vec(), vec![2, 4]);
    }

    #[test]
    fn test_independent_instances_do_not_share_chains() {
        let source = ListSource::from_vec(vec![1, 2]);
        let a = filter_list(&source.changes(), even);
        let b = filter_list(&source.changes(), even);

        let (_, _sa) = record(&a.changes());
        let (_, _sb) = record(&b.changes());

        assert!(a.is_connected() && b.is_connected());
        assert_eq!(a.subscriber_count(), 1);
        assert_eq!(b.subscriber_count(), 1);
    }

    #[test]
    fn test_sorted_upstream_filtered_into_list() {
        let source = SortedListSource::new();
        source.add_range(vec![4, 1, 8]);
        let evens = filter_list(&source.changes(), even);
        let (seen, _sub) = record(&evens.changes());

        source.add(6);
        source.add(2);

        assert_eq!(seen.lock().last().unwrap().current().to_vec(), vec![2, 4, 6, 8]);
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let source = ListSource::from_vec(vec![1, 2, 3]);

        let missing_upstream = TransformationBuilder::<ListNotification<i32>, ListSource<i32>>::new()
            .target(ListSource::new)
            .build_filtered();
        assert!(matches!(missing_upstream, Err(Error::InvalidArgument { .. })));

        let missing_target = TransformationBuilder::<ListNotification<i32>, ListSource<i32>>::new()
            .upstream(source.changes())
            .build_filtered();
        assert!(matches!(missing_target, Err(Error::InvalidArgument { .. })));

        let missing_selector = TransformationBuilder::<ListNotification<i32>, ListSource<String>>::new()
            .upstream(source.changes())
            .target(ListSource::new)
            .build();
        assert!(matches!(missing_selector, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_builder_builds_mapping_transformation() {
        let source = ListSource::from_vec(vec![1, 2, 3]);
        let labels = TransformationBuilder::<_, ListSource<String>>::new()
            .upstream(source.changes())
            .filter(|x: &i32| *x > 1)
            .selector(|x: &i32| format!("#{x}"))
            .target(ListSource::new)
            .build()
            .unwrap();
        let (seen, _sub) = record(&labels.changes());

        source.insert(0, 9).unwrap();

        let seen = seen.lock();
        assert_eq!(
            seen.last().unwrap().current().to_vec(),
            vec!["#9".to_string(), "#2".to_string(), "#3".to_string()]
        );
    }

    #[test]
    fn test_subscriber_can_mutate_upstream_from_callback() {
        let source = ListSource::from_vec(vec![2]);
        let evens = filter_list(&source.changes(), even);
        let writer = source.clone();

        let _sub = evens.changes().subscribe_fn(move |n: &ListNotification<i32>| {
            if n.current().len() == 2 {
                writer.add(100);
            }
        });
        source.add(4);

        assert_eq!(source.to_vec(), vec![2, 4, 100]);
        let (seen, _late) = record(&evens.changes());
        assert_eq!(seen.lock()[0].current().to_vec(), vec![2, 4, 100]);
    }

    #[test]
    fn test_nested_mutation_reaches_later_observers_in_order() {
        let source = ListSource::from_vec(vec![2]);
        let writer = source.clone();
        let _echo = source.changes().subscribe_fn(move |n: &ListNotification<i32>| {
            if n.action() == ChangeAction::Add && n.new_items() == [4] {
                writer.add(100);
            }
        });
        let (direct, _direct_sub) = record(&source.changes());
        let evens = filter_list(&source.changes(), even);
        let (derived, _derived_sub) = record(&evens.changes());

        source.add(4);

        let currents: Vec<Vec<i32>> = direct.lock().iter().map(|n| n.current().to_vec()).collect();
        assert_eq!(currents, vec![vec![2], vec![2, 4], vec![2, 4, 100]]);

        let mut state = Vec::new();
        for n in derived.lock().iter() {
            n.apply_to(&mut state);
            assert_eq!(&state, &n.current().to_vec());
        }
        assert_eq!(state, vec![2, 4, 100]);
        assert_eq!(source.to_vec(), vec![2, 4, 100]);
    }

    #[test]
    fn test_filter_list_tracks_writers_on_several_threads() {
        let source = ListSource::new();
        let evens = filter_list(&source.changes(), even);
        let (seen, _sub) = record(&evens.changes());
        let writers = Mutex::new(());

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let source = &source;
                let writers = &writers;
                scope.spawn(move || {
                    for i in 0..60 {
                        let _turn = writers.lock();
                        let value = worker * 1000 + i;
                        source.add(value);
                        if i % 5 == 4 {
                            source.remove_at(0).unwrap();
                        }
                        if i % 7 == 6 {
                            source.set_item(source.len() / 2, value + 1).unwrap();
                        }
                    }
                });
            }
        });

        let expected: Vec<i32> = source.to_vec().into_iter().filter(|x| even(x)).collect();
        let seen = seen.lock();
        assert_eq!(seen.last().unwrap().current().to_vec(), expected);

        let mut state = Vec::new();
        for n in seen.iter() {
            n.apply_to(&mut state);
            assert_eq!(&state, &n.current().to_vec());
        }
    }
}
