//! Reverse persistent (immutable) block-chain list.
//!
//! This module provides [`RVList`], the reverse member of the VList family:
//! the same block chain as [`FVList`], viewed with the *newest* item at
//! position `len() - 1`. Where `FVList` behaves like a persistent stack
//! growing at the front, `RVList` behaves like a persistent vector growing
//! at the back — without copying a single item between the two views.
//!
//! # Examples
//!
//! ```rust
//! use vlists::vlist::RVList;
//!
//! let list = RVList::new().push(1).push(2).push(3);
//! let collected: Vec<&i32> = list.iter().collect();
//! assert_eq!(collected, vec![&1, &2, &3]);
//! assert_eq!(list.last(), Some(&3));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use super::block::{Chain, ChainRevIter};
use super::fvlist::FVList;
use crate::error::Error;

/// A reverse persistent (immutable) block-chain list.
///
/// Shares its representation with [`FVList`]; only the index orientation
/// differs. Position `len() - 1` is the newest item, so `push` appends at
/// the back and enumeration runs oldest first.
///
/// # Time Complexity
///
/// Identical to [`FVList`] with `index` measured from the *back*: `push`,
/// `pop`, and `last` are O(1); `set`/`insert_at`/`remove_at` cost
/// O(distance from the back).
///
/// # Examples
///
/// ```rust
/// use vlists::vlist::RVList;
///
/// let list: RVList<i32> = (1..=5).collect();
/// assert_eq!(list.get(0), Some(&1));
/// assert_eq!(list.get(4), Some(&5));
/// ```
pub struct RVList<T> {
    pub(crate) forward: FVList<T>,
}

impl<T> RVList<T> {
    /// Creates a new empty list.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forward: FVList::new(),
        }
    }

    /// Creates a list containing a single item.
    #[inline]
    #[must_use]
    pub fn singleton(item: T) -> Self {
        Self::new().push(item)
    }

    /// Returns the number of items in the list. O(1).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns `true` if the list contains no items.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Appends `item` at the back (position `len()`).
    ///
    /// Physically identical to [`FVList::push`]: the new item lands in the
    /// slot nearest the handle; only the index orientation differs.
    ///
    /// # Complexity
    ///
    /// O(1) amortized.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vlists::vlist::RVList;
    ///
    /// let list = RVList::new().push(1).push(2);
    /// assert_eq!(list.last(), Some(&2));
    /// ```
    #[inline]
    #[must_use]
    pub fn push(&self, item: T) -> Self {
        Self {
            forward: self.forward.push(item),
        }
    }

    /// Returns a reference to the last (newest) item.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.forward.first()
    }

    /// Returns a reference to the first (oldest) item.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a reference to the item at `index` (0 = oldest).
    ///
    /// Returns `None` if the index is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        let length = self.len();
        if index >= length {
            return None;
        }
        self.forward.get(length - 1 - index)
    }

    /// Returns an iterator over references to the items, front to back
    /// (oldest first).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vlists::vlist::RVList;
    ///
    /// let list: RVList<i32> = (1..=3).collect();
    /// let collected: Vec<&i32> = list.iter().collect();
    /// assert_eq!(collected, vec![&1, &2, &3]);
    /// ```
    #[inline]
    #[must_use]
    pub fn iter(&self) -> RVListIterator<'_, T> {
        RVListIterator::over(&self.forward.chain)
    }

    /// Finds the index of the first item that satisfies the predicate.
    #[must_use]
    pub fn find_index<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(&T) -> bool,
    {
        self.iter().position(predicate)
    }

    /// Forward view of this list: same blocks, the newest item at the
    /// front. O(1).
    #[inline]
    #[must_use]
    pub fn to_fvlist(&self) -> FVList<T> {
        self.forward.clone()
    }
}

impl<T: Clone> RVList<T> {
    /// Removes the last (newest) item, returning it together with the
    /// remaining list.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySequence`] if the list has zero items.
    pub fn pop(&self) -> Result<(T, Self), Error> {
        let (item, forward) = self.forward.pop()?;
        Ok((item, Self { forward }))
    }

    /// Returns a list with the item at `index` replaced by `value`.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len()`.
    pub fn set(&self, index: usize, value: T) -> Result<Self, Error> {
        let length = self.len();
        if index >= length {
            return Err(Error::IndexOutOfRange { index, length });
        }
        Ok(Self {
            forward: self.forward.set(length - 1 - index, value)?,
        })
    }

    /// Returns a list with `value` spliced in before position `index`.
    ///
    /// `index == len()` appends at the back.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index > len()`.
    pub fn insert_at(&self, index: usize, value: T) -> Result<Self, Error> {
        let length = self.len();
        if index > length {
            return Err(Error::IndexOutOfRange { index, length });
        }
        Ok(Self {
            forward: self.forward.insert_at(length - index, value)?,
        })
    }

    /// Returns a list with the item at `index` spliced out.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len()`.
    pub fn remove_at(&self, index: usize) -> Result<Self, Error> {
        let length = self.len();
        if index >= length {
            return Err(Error::IndexOutOfRange { index, length });
        }
        Ok(Self {
            forward: self.forward.remove_at(length - 1 - index)?,
        })
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// A borrowing iterator over the items of an [`RVList`], oldest first.
pub struct RVListIterator<'a, T> {
    inner: ChainRevIter<'a, T>,
}

impl<'a, T> RVListIterator<'a, T> {
    pub(crate) fn over(chain: &'a Chain<T>) -> Self {
        Self {
            inner: chain.rev_iter(),
        }
    }
}

impl<'a, T> Iterator for RVListIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for RVListIterator<'_, T> {}

/// An owning iterator over the items of an [`RVList`], oldest first.
pub struct RVListIntoIterator<T> {
    list: RVList<T>,
    position: usize,
}

impl<T: Clone> Iterator for RVListIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.list.get(self.position).cloned()?;
        self.position += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.list.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for RVListIntoIterator<T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Clone for RVList<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            forward: self.forward.clone(),
        }
    }
}

impl<T> Default for RVList<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for RVList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        // Appending in source order puts the first item at position 0.
        let mut chain = Chain::new();
        for item in iter {
            chain = chain.pushed(item);
        }
        Self {
            forward: FVList { chain },
        }
    }
}

impl<T: Clone> IntoIterator for RVList<T> {
    type Item = T;
    type IntoIter = RVListIntoIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        RVListIntoIterator {
            list: self,
            position: 0,
        }
    }
}

impl<'a, T> IntoIterator for &'a RVList<T> {
    type Item = &'a T;
    type IntoIter = RVListIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for RVList<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for RVList<T> {}

impl<T: Hash> Hash for RVList<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self {
            item.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RVList<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for RVList<T> {
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
