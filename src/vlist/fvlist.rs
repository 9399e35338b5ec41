//! Forward persistent (immutable) block-chain list.
//!
//! This module provides [`FVList`], an immutable list built from a chain of
//! small fixed-capacity blocks that uses structural sharing for efficient
//! operations.
//!
//! # Overview
//!
//! `FVList` is the forward member of the VList family: position 0 is the
//! *newest* item, the one nearest the handle. It provides:
//!
//! - O(1) push (front-insert) and pop
//! - O(1) length and snapshot capture
//! - O(n / B) indexed access, walking block headers only (B = block size)
//! - O(index) indexed set/insert/remove, sharing everything behind the edit
//!
//! All operations return new lists without modifying the original, and
//! structural sharing ensures memory efficiency: a push appends into a free
//! write-once slot of the shared front block whenever possible and only
//! chains a fresh block when the slot is taken.
//!
//! # Examples
//!
//! ```rust
//! use vlists::vlist::FVList;
//!
//! // Pushes go to the front (position 0 is the newest item).
//! let list = FVList::new().push(10).push(9).push(8);
//! let collected: Vec<&i32> = list.iter().collect();
//! assert_eq!(collected, vec![&8, &9, &10]);
//!
//! // Structural sharing: the original list is preserved.
//! let extended = list.push(7);
//! assert_eq!(list.len(), 3);     // Original unchanged
//! assert_eq!(extended.len(), 4); // New list with prepended item
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use super::block::{Chain, ChainIter};
use super::rvlist::RVList;
use crate::error::Error;

/// A forward persistent (immutable) block-chain list.
///
/// `FVList` is an immutable data structure: every operation returns a new
/// handle and shares all unchanged blocks with its ancestors. Position 0 is
/// the newest item.
///
/// # Time Complexity
///
/// | Operation   | Complexity          |
/// |-------------|---------------------|
/// | `new`       | O(1)                |
/// | `push`      | O(1) amortized      |
/// | `pop`       | O(1)                |
/// | `first`     | O(1)                |
/// | `len`       | O(1)                |
/// | `get`       | O(n / B) block hops |
/// | `set`       | O(index)            |
/// | `insert_at` | O(index)            |
/// | `remove_at` | O(index)            |
/// | `iter`      | O(1) per step       |
///
/// For large-scale arbitrary-position editing, prefer
/// [`AList`](crate::alist::AList); this family is optimized for front
/// push/pop with cheap snapshots.
///
/// # Examples
///
/// ```rust
/// use vlists::vlist::FVList;
///
/// let list = FVList::singleton(42);
/// assert_eq!(list.first(), Some(&42));
/// ```
pub struct FVList<T> {
    pub(crate) chain: Chain<T>,
}

impl<T> FVList<T> {
    /// Creates a new empty list.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vlists::vlist::FVList;
    ///
    /// let list: FVList<i32> = FVList::new();
    /// assert!(list.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chain: Chain::new(),
        }
    }

    /// Creates a list containing a single item.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vlists::vlist::FVList;
    ///
    /// let list = FVList::singleton(42);
    /// assert_eq!(list.len(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(item: T) -> Self {
        Self::new().push(item)
    }

    /// Returns the number of items in the list.
    ///
    /// # Complexity
    ///
    /// O(1) - the count below the front block is cached.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Returns `true` if the list contains no items.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Adds `item` at the front (position 0).
    ///
    /// The new list shares every pre-existing block with `self`; older
    /// handles never observe the change.
    ///
    /// # Complexity
    ///
    /// O(1) amortized - either a write-once append into the shared front
    /// block, or a fresh block chained onto this handle.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vlists::vlist::FVList;
    ///
    /// let list = FVList::new().push(2).push(1);
    /// assert_eq!(list.first(), Some(&1));
    /// assert_eq!(list.len(), 2);
    /// ```
    #[inline]
    #[must_use]
    pub fn push(&self, item: T) -> Self {
        Self {
            chain: self.chain.pushed(item),
        }
    }

    /// Returns a reference to the front item, or `None` if the list is
    /// empty.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.chain.get(0)
    }

    /// Returns a reference to the item at `index` (0 = newest).
    ///
    /// Returns `None` if the index is out of bounds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vlists::vlist::FVList;
    ///
    /// let list = FVList::new().push(3).push(2).push(1);
    /// assert_eq!(list.get(0), Some(&1));
    /// assert_eq!(list.get(2), Some(&3));
    /// assert_eq!(list.get(3), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.chain.get(index)
    }

    /// Returns an iterator over references to the items, front to back
    /// (newest first).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vlists::vlist::FVList;
    ///
    /// let list = FVList::new().push(3).push(2).push(1);
    /// let collected: Vec<&i32> = list.iter().collect();
    /// assert_eq!(collected, vec![&1, &2, &3]);
    /// ```
    #[inline]
    #[must_use]
    pub fn iter(&self) -> FVListIterator<'_, T> {
        FVListIterator {
            inner: self.chain.iter(),
        }
    }

    /// Finds the index of the first item that satisfies the predicate.
    ///
    /// Returns `Some(index)` if an item is found, `None` otherwise.
    #[must_use]
    pub fn find_index<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(&T) -> bool,
    {
        self.iter().position(predicate)
    }
}

impl<T: Clone> FVList<T> {
    /// Removes the front item, returning it together with the remaining
    /// list.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySequence`] if the list has zero items.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vlists::vlist::FVList;
    ///
    /// let list = FVList::new().push(2).push(1);
    /// let (front, rest) = list.pop().unwrap();
    /// assert_eq!(front, 1);
    /// assert_eq!(rest.len(), 1);
    /// assert_eq!(list.len(), 2); // Original unchanged
    /// ```
    pub fn pop(&self) -> Result<(T, Self), Error> {
        let (item, chain) = self.chain.popped()?;
        Ok((item, Self { chain }))
    }

    /// Returns a list with the item at `index` replaced by `value`.
    ///
    /// Blocks in front of the target are copied; everything behind it is
    /// shared with `self`. The original list is never mutated.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vlists::vlist::FVList;
    ///
    /// let list = FVList::new().push(3).push(2).push(1);
    /// let updated = list.set(1, 99).unwrap();
    /// assert_eq!(updated.get(1), Some(&99));
    /// assert_eq!(list.get(1), Some(&2)); // Original unchanged
    /// ```
    pub fn set(&self, index: usize, value: T) -> Result<Self, Error> {
        let mut chain = self.chain.clone();
        chain.set_in_place(index, value)?;
        Ok(Self { chain })
    }

    /// Returns a list with `value` spliced in before position `index`.
    ///
    /// `index == len()` appends at the back (the oldest end).
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index > len()`.
    pub fn insert_at(&self, index: usize, value: T) -> Result<Self, Error> {
        Ok(Self {
            chain: self.chain.rebuilt_insert(index, value)?,
        })
    }

    /// Returns a list with the item at `index` spliced out.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len()`.
    pub fn remove_at(&self, index: usize) -> Result<Self, Error> {
        let (_, chain) = self.chain.rebuilt_remove(index)?;
        Ok(Self { chain })
    }
}

impl<T> FVList<T> {
    /// Reverse view of this list: same blocks, the newest item at the back.
    ///
    /// # Complexity
    ///
    /// O(1) - no items are copied.
    #[inline]
    #[must_use]
    pub fn to_rvlist(&self) -> RVList<T> {
        RVList {
            forward: self.clone(),
        }
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// A borrowing iterator over the items of an [`FVList`], newest first.
pub struct FVListIterator<'a, T> {
    inner: ChainIter<'a, T>,
}

impl<'a, T> FVListIterator<'a, T> {
    pub(crate) fn over(chain: &'a Chain<T>) -> Self {
        Self {
            inner: chain.iter(),
        }
    }
}

impl<'a, T> Iterator for FVListIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for FVListIterator<'_, T> {}

/// An owning iterator over the items of an [`FVList`], newest first.
pub struct FVListIntoIterator<T> {
    list: FVList<T>,
}

impl<T: Clone> Iterator for FVListIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let (item, rest) = self.list.pop().ok()?;
        self.list = rest;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.list.len();
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for FVListIntoIterator<T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Clone for FVList<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
        }
    }
}

impl<T> Default for FVList<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for FVList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        // The first yielded item must end up at position 0 (the newest), so
        // items are pushed from the back of a buffer.
        let mut items: Vec<T> = iter.into_iter().collect();
        let mut chain = Chain::new();
        while let Some(item) = items.pop() {
            chain = chain.pushed(item);
        }
        Self { chain }
    }
}

impl<T: Clone> IntoIterator for FVList<T> {
    type Item = T;
    type IntoIter = FVListIntoIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        FVListIntoIterator { list: self }
    }
}

impl<'a, T> IntoIterator for &'a FVList<T> {
    type Item = &'a T;
    type IntoIter = FVListIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for FVList<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for FVList<T> {}

impl<T: Hash> Hash for FVList<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self {
            item.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FVList<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for FVList<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        let mut first = true;
        for item in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{item}")?;
        }
        write!(formatter, "]")
    }
}

// =============================================================================
// Tests
// =============================================================================
