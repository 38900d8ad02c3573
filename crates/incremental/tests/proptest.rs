//! Property-based tests for tributary-incremental using proptest.

use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use tributary_core::{natural_equality, natural_order, CollectionNotification, ListNotification};
use tributary_incremental::{filter_list, select_list, sort_list, sort_set, Transformation};
use tributary_reactive::{ChangeFeed, Subscription};
use tributary_source::{ListSource, SortedListSource};

#[derive(Debug, Clone)]
enum Op {
    Add(i32),
    AddRange(Vec<i32>),
    Insert(usize, i32),
    RemoveAt(usize),
    RemoveRange(usize, usize),
    SetItem(usize, i32),
    Move(usize, usize),
    Sort,
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0i32..40).prop_map(Op::Add),
        1 => prop::collection::vec(0i32..40, 0..5).prop_map(Op::AddRange),
        3 => (0usize..30, 0i32..40).prop_map(|(i, x)| Op::Insert(i, x)),
        2 => (0usize..30).prop_map(Op::RemoveAt),
        1 => (0usize..30, 0usize..4).prop_map(|(i, n)| Op::RemoveRange(i, n)),
        3 => (0usize..30, 0i32..40).prop_map(|(i, x)| Op::SetItem(i, x)),
        1 => (0usize..30, 0usize..30).prop_map(|(from, to)| Op::Move(from, to)),
        1 => Just(Op::Sort),
        1 => Just(Op::Clear),
    ]
}

fn apply(list: &ListSource<i32>, op: Op) {
    let _ = match op {
        Op::Add(x) => {
            list.add(x);
            Ok(())
        }
        Op::AddRange(items) => {
            list.add_range(items);
            Ok(())
        }
        Op::Insert(index, x) => list.insert(index, x),
        Op::RemoveAt(index) => list.remove_at(index),
        Op::RemoveRange(index, count) => list.remove_range(index, count),
        Op::SetItem(index, x) => list.set_item(index, x),
        Op::Move(from, to) => match list.get(from) {
            Some(item) => list.remove_at(from).and_then(|_| list.insert(to.min(list.len()), item)),
            None => Ok(()),
        },
        Op::Sort => {
            list.sort();
            Ok(())
        }
        Op::Clear => {
            list.clear();
            Ok(())
        }
    };
}

type Recorded<N> = Arc<Mutex<Vec<N>>>;

fn record<N>(feed: &ChangeFeed<N>) -> (Recorded<N>, Subscription)
where
    N: CollectionNotification,
{
    let seen: Recorded<N> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = feed.subscribe_fn(move |n| sink.lock().push(n.clone()));
    (seen, sub)
}

fn evens_doubled(source: &ListSource<i32>) -> Transformation<ListNotification<i32>, ListSource<i32>> {
    filter_list(&source.changes(), |x: &i32| x % 2 == 0)
        .select(|x: &i32| x * 2, ListSource::new)
}

proptest! {
    /// Test that a filtered, mapped list equals map(filter(upstream)) in upstream order.
    #[test]
    fn filter_map_matches_recomputation(
        initial in prop::collection::vec(0i32..40, 0..10),
        ops in prop::collection::vec(op(), 0..50),
    ) {
        let source = ListSource::from_vec(initial);
        let derived = evens_doubled(&source);
        let (seen, _sub) = record(&derived.changes());

        for op in ops {
            apply(&source, op);
            let expected: Vec<i32> = source.to_vec().into_iter().filter(|x| x % 2 == 0).map(|x| x * 2).collect();
            let actual = seen.lock().last().map(|n| n.current().to_vec()).unwrap_or_default();
            prop_assert_eq!(actual, expected);
        }
    }

    /// Test that every derived notification replays onto the previous state.
    #[test]
    fn derived_notifications_replay(
        initial in prop::collection::vec(0i32..40, 0..10),
        ops in prop::collection::vec(op(), 0..50),
    ) {
        let source = ListSource::from_vec(initial);
        let derived = filter_list(&source.changes(), |x: &i32| x % 3 != 0);
        let (seen, _sub) = record(&derived.changes());

        for op in ops {
            apply(&source, op);
        }

        let seen = seen.lock();
        let mut state = Vec::new();
        for pair in seen.windows(2) {
            prop_assert!(pair[0].current() != pair[1].current());
        }
        for n in seen.iter() {
            n.apply_to(&mut state);
            prop_assert_eq!(&state, &n.current().to_vec());
        }
    }

    /// Test that sort-merge and sorted-list outputs stay ordered.
    #[test]
    fn sorted_outputs_are_monotonic(
        initial in prop::collection::vec(0i32..40, 0..10),
        ops in prop::collection::vec(op(), 0..50),
    ) {
        let source = ListSource::from_vec(initial);
        let set = sort_set(&source.changes(), natural_order());
        let list = sort_list(&source.changes(), natural_order(), natural_equality());
        let (set_seen, _set_sub) = record(&set.changes());
        let (list_seen, _list_sub) = record(&list.changes());

        for op in ops {
            apply(&source, op);
        }

        for n in set_seen.lock().iter() {
            prop_assert!(n.is_strictly_ordered(n.current()));
        }
        let mut state = Vec::new();
        for n in list_seen.lock().iter() {
            prop_assert!(n.current().to_vec().windows(2).all(|pair| pair[0] <= pair[1]));
            n.apply_to(&mut state);
        }

        let mut expected = source.to_vec();
        expected.sort();
        prop_assert_eq!(state, expected);
    }

    /// Test that a late subscriber receives exactly one replay of the current state.
    #[test]
    fn late_subscriber_gets_one_replay(
        initial in prop::collection::vec(0i32..40, 0..10),
        ops in prop::collection::vec(op(), 0..30),
    ) {
        let source = ListSource::from_vec(initial);
        let derived = select_list(&source.changes(), |x: &i32| x + 1);
        let (_early, _early_sub) = record(&derived.changes());

        for op in ops {
            apply(&source, op);
        }

        let (late, _late_sub) = record(&derived.changes());
        let late = late.lock();
        prop_assert_eq!(late.len(), 1);
        let expected: Vec<i32> = source.to_vec().iter().map(|x| x + 1).collect();
        prop_assert_eq!(late[0].current().to_vec(), expected);
    }

    /// Test that a chain torn down and rebuilt reflects the upstream's current state.
    #[test]
    fn chain_rebuilds_from_current_state(
        initial in prop::collection::vec(0i32..40, 0..10),
        before in prop::collection::vec(op(), 0..20),
        after in prop::collection::vec(op(), 0..20),
    ) {
        let source = ListSource::from_vec(initial);
        let upstream = SortedListSource::new();
        let feeder = upstream.clone();
        let _mirror = source.changes().subscribe_fn(move |n: &ListNotification<i32>| {
            feeder.reset(n.current().to_vec());
        });
        let derived = filter_list(&upstream.changes(), |x: &i32| *x > 10);

        for op in before {
            apply(&source, op);
        }
        let (_, first) = record(&derived.changes());
        drop(first);
        prop_assert!(!derived.is_connected());

        for op in after {
            apply(&source, op);
        }
        let (seen, _second) = record(&derived.changes());
        let mut expected: Vec<i32> = source.to_vec().into_iter().filter(|x| *x > 10).collect();
        expected.sort();
        prop_assert_eq!(seen.lock()[0].current().to_vec(), expected);
    }
}
