//! Orderings and equivalences supplied to sorted collections and operators.

use core::cmp::Ordering;
use std::sync::Arc;

/// A total order over `T`.
pub type Comparer<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// An equivalence relation over `T`.
pub type EqualityComparer<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// The natural (`Ord`) ordering.
pub fn natural_order<T: Ord + 'static>() -> Comparer<T> {
    Arc::new(|a: &T, b: &T| a.cmp(b))
}

/// The reverse of the natural ordering.
pub fn reverse_order<T: Ord + 'static>() -> Comparer<T> {
    Arc::new(|a: &T, b: &T| b.cmp(a))
}

/// Orders values by a derived key.
pub fn key_order<T, K, F>(key: F) -> Comparer<T>
where
    T: 'static,
    K: Ord,
    F: Fn(&T) -> K + Send + Sync + 'static,
{
    Arc::new(move |a: &T, b: &T| key(a).cmp(&key(b)))
}

/// Wraps a comparison closure.
pub fn comparer<T, F>(compare: F) -> Comparer<T>
where
    T: 'static,
    F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    Arc::new(compare)
}

/// The natural (`PartialEq`) equivalence.
pub fn natural_equality<T: PartialEq + 'static>() -> EqualityComparer<T> {
    Arc::new(|a: &T, b: &T| a == b)
}
