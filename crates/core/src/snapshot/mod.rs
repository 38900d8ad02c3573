//! Persistent snapshots backing every collection kind.
//!
//! A snapshot is immutable: updates produce a new snapshot and the old one
//! stays valid. Clones share storage, which is what lets a notification
//! carry the full `current` state for free.

mod list;
mod map;
mod sorted_set;

pub use list::ListSnapshot;
pub use map::MapSnapshot;
pub use sorted_set::SortedSetSnapshot;
