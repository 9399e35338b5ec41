//! The VList family: persistent block-chain lists and their mutable
//! wrappers.
//!
//! All four types share one representation, a chain of fixed-capacity
//! blocks with write-once slots (see the module-level docs on each type):
//!
//! - [`FVList`]: immutable, forward oriented — position 0 is the newest
//!   item, push/pop work at the front.
//! - [`RVList`]: immutable, reverse oriented — the newest item sits at
//!   `len() - 1`, push appends at the back.
//! - [`FWList`] / [`WList`]: mutable wrappers over the same chains, editing
//!   in place while exclusively owned and copy-on-write once shared.
//!
//! Conversions within the family are O(1) in either direction; they never
//! copy items, only re-orient or freeze the shared blocks.

pub(crate) mod block;
mod fvlist;
mod rvlist;
mod writable;

pub use fvlist::{FVList, FVListIntoIterator, FVListIterator};
pub use rvlist::{RVList, RVListIntoIterator, RVListIterator};
pub use writable::{FWList, WList};
