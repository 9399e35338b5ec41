//! An observable, snapshot-friendly indexed sequence.
//!
//! [`AList`] stores items in a counted B-tree, giving O(log n) indexed
//! insert, remove, and replace anywhere in the sequence, an O(1) structural
//! snapshot via `Clone`, and a synchronous [`TreeObserver`] protocol that
//! reports every structural change as it happens. [`SumTracker`] is the
//! bundled observer: a per-tree running sum that answers in O(1) between
//! mutations.
//!
//! For front-heavy workloads with cheap persistent versions, see the
//! [`vlist`](crate::vlist) family instead.

mod list;
mod node;
mod observer;

pub use list::{AList, AListIntoIterator, AListIterator};
pub use node::{Children, Node};
pub use observer::{NodeId, ObserverRef, SumTracker, TreeId, TreeObserver};
