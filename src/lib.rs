//! # vlists
//!
//! Persistent, structurally-shared sequence types for Rust:
//!
//! - **VList family**: [`FVList`] / [`RVList`], immutable lists built from
//!   chains of small fixed-capacity blocks, plus their mutable wrappers
//!   [`FWList`] / [`WList`] which own the unfrozen tail of a chain and fall
//!   back to copy-on-write when a block is shared.
//! - **AList**: [`AList`], an indexed B-tree sequence with O(log n) indexed
//!   insert/remove and a synchronous [`TreeObserver`] protocol so external
//!   trackers (running sums, aggregate statistics) stay incrementally up to
//!   date without rescanning the tree.
//!
//! All types are single-threaded per instance: sharing is expressed through
//! reference-counted blocks and nodes, never through locks. A block or node
//! is either exclusively owned (safe to mutate in place) or shared (cloned
//! before mutation).
//!
//! ## Example
//!
//! ```rust
//! use vlists::prelude::*;
//!
//! // Immutable lists share structure across versions.
//! let list = FVList::new().push(10).push(9).push(8);
//! let longer = list.push(7);
//! assert_eq!(list.len(), 3);   // original unchanged
//! assert_eq!(longer.len(), 4);
//!
//! // The indexed tree sequence supports O(log n) edits anywhere.
//! let mut tree: AList<i32> = (1..=5).collect();
//! tree.insert(2, 99).unwrap();
//! assert_eq!(tree.get(2), Some(&99));
//! ```
//!
//! [`FVList`]: vlist::FVList
//! [`RVList`]: vlist::RVList
//! [`FWList`]: vlist::FWList
//! [`WList`]: vlist::WList
//! [`AList`]: alist::AList
//! [`TreeObserver`]: alist::TreeObserver

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// Fixed to `std::rc::Rc`: every structure in this crate is single-threaded
/// per instance, and the freeze bookkeeping inside blocks uses `Cell` and
/// `OnceCell`, which are not `Sync`. Callers that need to hand a sequence to
/// another thread must freeze it and move it wholesale.
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

pub mod alist;
pub mod error;
pub mod vlist;

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use vlists::prelude::*;
/// ```
pub mod prelude {
    pub use crate::alist::*;
    pub use crate::error::*;
    pub use crate::vlist::*;
}

#[cfg(test)]
mod tests {
    use super::ReferenceCounter;
    use rstest::rstest;

    #[rstest]
    fn test_reference_counter_clone() {
        let reference_counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        let reference_counter_clone = reference_counter.clone();
        assert_eq!(*reference_counter, *reference_counter_clone);
    }

    #[rstest]
    fn test_reference_counter_strong_count() {
        let reference_counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 1);
        let reference_counter_clone = reference_counter.clone();
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 2);
        drop(reference_counter_clone);
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 1);
    }
}
