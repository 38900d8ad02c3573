//! Tributary Source - mutable collections that originate change feeds.
//!
//! Every source owns one persistent snapshot and a [`Subject`]. A mutation
//! reads the current snapshot, computes the next one and, only if the
//! content actually changed, publishes exactly one notification before the
//! call returns.
//!
//! - [`ListSource`]: unordered, index-addressable list
//! - [`SortedListSource`]: list kept sorted under a comparer, duplicates allowed
//! - [`SortedSetSource`]: sorted, duplicate-free set
//! - [`MapSource`]: key/value map
//!
//! Each source serialises its own read-modify-publish sequence. Concurrent
//! writers still need to agree on an order among themselves if the order of
//! their mutations matters.
//!
//! # Example
//!
//! ```
//! use tributary_core::ChangeAction;
//! use tributary_source::ListSource;
//!
//! let list = ListSource::from_vec(vec![1, 2, 3]);
//! list.insert(1, 9).unwrap();
//!
//! let snapshot = list.snapshot();
//! assert_eq!(snapshot.to_vec(), vec![1, 9, 2, 3]);
//!
//! let _sub = list.changes().subscribe_fn(|n| {
//!     // The replay of the current state arrives first.
//!     assert_eq!(n.action(), ChangeAction::Reset);
//! });
//! ```

use core::convert::Infallible;
use tributary_core::CollectionNotification;
use tributary_reactive::Subject;

mod list;
mod map;
mod sorted_list;
mod sorted_set;

pub use list::ListSource;
pub use map::MapSource;
pub use sorted_list::SortedListSource;
pub use sorted_set::SortedSetSource;

/// Runs a mutation step that cannot fail.
pub(crate) fn apply<N, F>(subject: &Subject<N>, step: F) -> Option<N>
where
    N: CollectionNotification,
    F: FnOnce(&N) -> Option<N>,
{
    match subject.update(|current| Ok::<_, Infallible>(step(current))) {
        Ok(published) => published,
        Err(never) => match never {},
    }
}
