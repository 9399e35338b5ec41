//! Error conditions raised by the sequence types.
//!
//! Every condition here is a programming-contract violation, surfaced
//! synchronously to the immediate caller. Nothing is caught and retried
//! internally, and no operation partially completes: an insert either fully
//! applies (counts updated, observers notified) or does not start mutating
//! at all.
//!
//! `get`-style accessors keep the lighter `Option` convention; the enum
//! covers indexed mutation, pop on empty sequences, and structural contract
//! breaks such as attaching the same observer twice.

use thiserror::Error;

/// The error conditions shared by the list family and the indexed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// An indexed access, insert, or removal used an index outside the
    /// valid range. Insertion accepts `index == length` (append); every
    /// other indexed operation requires `index < length`.
    #[error("index {index} out of range for sequence of length {length}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The sequence length at the time of the call.
        length: usize,
    },

    /// A pop or peek style operation was applied to a zero-length sequence.
    #[error("operation on an empty sequence")]
    EmptySequence,

    /// A structural invariant was broken, e.g. attaching an observer that
    /// is already attached. Detected eagerly and never silently patched.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}
