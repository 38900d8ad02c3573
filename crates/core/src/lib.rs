//! Tributary Core - change notifications and persistent snapshots.
//!
//! This crate provides the data model shared by every Tributary crate:
//!
//! - `ChangeAction`: the kind of a change (`Add`, `Remove`, `Replace`, `Reset`)
//! - `ListNotification`, `SortedSetNotification`, `MapNotification`: one
//!   immutable record per atomic change, carrying the resulting snapshot
//! - `CollectionNotification`: the trait operators use to consume any of them
//! - `snapshot`: persistent, cheaply clonable list, sorted set and map
//! - `Comparer` / `EqualityComparer`: orderings and equivalences
//! - `Error`: error types for collection operations
//!
//! # Example
//!
//! ```rust
//! use tributary_core::{ChangeAction, ListNotification, ListSnapshot};
//!
//! let before = ListSnapshot::from_vec(vec![1, 2, 3]);
//! let after = before.insert_range(1, &[9]).unwrap();
//! let notification = ListNotification::added(after, vec![9], 1);
//!
//! assert_eq!(notification.action(), ChangeAction::Add);
//! assert_eq!(notification.current().to_vec(), vec![1, 9, 2, 3]);
//!
//! let mut replayed = before.to_vec();
//! notification.apply_to(&mut replayed);
//! assert_eq!(replayed, vec![1, 9, 2, 3]);
//! ```

mod compare;
mod error;
pub mod notification;
pub mod snapshot;

pub use compare::{comparer, key_order, natural_equality, natural_order, reverse_order, Comparer, EqualityComparer};
pub use error::{Error, Result};
pub use notification::{ChangeAction, CollectionNotification, ListNotification, MapNotification, SortedSetNotification};
pub use snapshot::{ListSnapshot, MapSnapshot, SortedSetSnapshot};
