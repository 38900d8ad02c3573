//! Tributary Incremental - derived collections maintained from change feeds.
//!
//! Operators subscribe to an upstream [`ChangeFeed`](tributary_reactive::ChangeFeed)
//! and translate every upstream notification into the smallest change of a
//! derived collection, instead of recomputing it.
//!
//! # Operators
//!
//! - [`Transformation`]: filter and map into any [`TargetCollection`]
//!   (list, sorted list, sorted set, map). Build one with
//!   [`TransformationBuilder`] or a convenience constructor such as
//!   [`filter_list`] or [`sort_list`].
//! - [`SortedSetView`]: merges any upstream into a sorted, duplicate-free set.
//!
//! Derived feeds are lazy. The first subscriber connects a chain that owns
//! its own accumulator; dropping the last subscription disconnects it, and
//! the next subscriber rebuilds from the upstream's current state.
//!
//! # Example
//!
//! ```rust
//! use tributary_incremental::filter_list;
//! use tributary_source::ListSource;
//!
//! let numbers = ListSource::from_vec(vec![1, 2, 3, 4]);
//! let evens = filter_list(&numbers.changes(), |x: &i32| x % 2 == 0);
//!
//! let latest = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
//! let sink = latest.clone();
//! let _sub = evens
//!     .changes()
//!     .subscribe_fn(move |n| *sink.lock() = n.current().to_vec());
//! assert_eq!(*latest.lock(), vec![2, 4]);
//!
//! numbers.insert(1, 6).unwrap();
//! assert_eq!(*latest.lock(), vec![6, 2, 4]);
//! ```

mod sort;
pub mod target;
mod transform;

pub use sort::{sort_set, SortedSetView};
pub use target::TargetCollection;
pub use transform::{
    filter_list, filter_map_values, select_list, sort_list, sort_set_map, Predicate, Selector,
    TargetFactory, Transformation, TransformationBuilder,
};
