//! Tributary Reactive - change feeds for reactive collections.
//!
//! Every collection exposes its changes as a [`ChangeFeed`]. Subscribing
//! delivers one replay of the current state, normalised to a `Reset`,
//! followed by every live notification in mutation order.
//!
//! # Core Concepts
//!
//! - [`Subject`]: the multicast point owned by a mutable source. It always
//!   holds a current notification and suppresses exact repeats.
//! - [`SharedFeed`]: the multicast point of a derived collection. Its
//!   upstream chain is connected on the first subscription and torn down
//!   when the last one is dropped.
//! - [`Subscription`]: the handle returned by every `subscribe` call.
//!   Dropping it detaches the observer.
//!
//! # Example
//!
//! ```
//! use tributary_core::{ListNotification, ListSnapshot};
//! use tributary_reactive::{ChangeFeed, Subject};
//!
//! let subject = Subject::new(ListNotification::empty());
//! let feed = ChangeFeed::from_observable(subject.clone());
//!
//! let _sub = feed.subscribe_fn(|n: &ListNotification<i32>| {
//!     println!("{:?} -> {:?}", n.action(), n.current());
//! });
//!
//! let current = ListSnapshot::from_vec(vec![7]);
//! subject.publish(ListNotification::added(current, vec![7], 0));
//! ```

mod feed;
mod shared;
mod subject;
pub mod subscription;

pub use feed::{ChangeFeed, Observable};
pub use shared::{Connector, SharedFeed};
pub use subject::Subject;
pub use subscription::{observer, Observer, Subscription, SubscriptionId, SubscriptionManager};
