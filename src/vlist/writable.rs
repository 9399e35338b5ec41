//! Mutable wrappers over the block chain.
//!
//! [`FWList`] and [`WList`] are single-owner editors for the same block
//! chains the immutable types use. While the wrapper holds the only
//! reference to its front block it mutates slots in place — push reuses
//! vacated slots and pop reclaims them — so a build-then-freeze loop runs
//! at `Vec`-like cost. The moment a block becomes shared (a frozen view was
//! taken, or the wrapper was cloned) the same operations silently fall back
//! to the persistent copy-on-write paths; shared holders never observe a
//! change.
//!
//! Ownership is not tracked by a separate tag: the block's reference count
//! *is* the capability. An operation checks exclusivity with
//! [`ReferenceCounter::get_mut`] and regains the in-place fast path as soon
//! as the last outside reference is dropped.
//!
//! # Examples
//!
//! ```rust
//! use vlists::vlist::WList;
//!
//! let mut list = WList::new();
//! for value in 1..=100 {
//!     list.push(value);
//! }
//! let frozen = list.to_rvlist();
//! list.push(101); // the frozen view is unaffected
//! assert_eq!(frozen.len(), 100);
//! assert_eq!(list.len(), 101);
//! ```

use std::cell::OnceCell;
use std::fmt;
use std::iter::FromIterator;

use super::block::{BLOCK_CAPACITY, Chain};
use super::fvlist::{FVList, FVListIterator};
use super::rvlist::{RVList, RVListIterator};
use crate::ReferenceCounter;
use crate::error::Error;

// =============================================================================
// FWList
// =============================================================================

/// A mutable forward list over a block chain (position 0 = newest).
///
/// The writable counterpart of [`FVList`]: the same representation driven
/// through `&mut self`, with in-place slot reuse whenever the front block
/// is exclusively held.
///
/// # Time Complexity
///
/// | Operation   | Exclusive front block | Shared front block |
/// |-------------|-----------------------|--------------------|
/// | `push`      | O(1)                  | O(1) amortized     |
/// | `pop`       | O(1)                  | O(1) + item clone  |
/// | `set`       | O(n / B)              | O(index)           |
/// | `insert_at` | O(index)              | O(index)           |
/// | `remove_at` | O(index)              | O(index)           |
///
/// # Examples
///
/// ```rust
/// use vlists::vlist::FWList;
///
/// let mut list = FWList::new();
/// list.push(2);
/// list.push(1);
/// assert_eq!(list.first(), Some(&1));
/// ```
pub struct FWList<T> {
    chain: Chain<T>,
}

impl<T> FWList<T> {
    /// Creates a new empty list.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chain: Chain::new(),
        }
    }

    /// Returns the number of items in the list. O(1).
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
    /// With an exclusive front block the item is written straight into the
    /// next slot, reusing storage vacated by earlier pops. Otherwise this
    /// is the persistent push: a write-once append into the shared block or
    /// a fresh block.
    pub fn push(&mut self, item: T) {
        if self.chain.local_count < BLOCK_CAPACITY
            && let Some(reference) = self.chain.block.as_mut()
            && let Some(block) = ReferenceCounter::get_mut(reference)
        {
            let slot = self.chain.local_count;
            block.items[slot] = OnceCell::from(item);
            block.immutable_count.set(slot + 1);
            self.chain.local_count = slot + 1;
        } else {
            self.chain = self.chain.pushed(item);
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
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.chain.get(index)
    }

    /// Returns an iterator over references to the items, front to back
    /// (newest first).
    #[inline]
    #[must_use]
    pub fn iter(&self) -> FVListIterator<'_, T> {
        FVListIterator::over(&self.chain)
    }

    /// Finds the index of the first item that satisfies the predicate.
    #[must_use]
    pub fn find_index<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(&T) -> bool,
    {
        self.iter().position(predicate)
    }

    /// Removes every item, releasing the wrapper's hold on the chain.
    /// Frozen views taken earlier keep their items.
    #[inline]
    pub fn clear(&mut self) {
        self.chain = Chain::new();
    }

    /// Frozen forward view of the current contents. O(1).
    ///
    /// The view shares every block with the wrapper; later wrapper edits
    /// copy-on-write around it.
    #[inline]
    #[must_use]
    pub fn to_fvlist(&self) -> FVList<T> {
        FVList {
            chain: self.chain.clone(),
        }
    }
}

impl<T: Clone> FWList<T> {
    /// Removes and returns the front item.
    ///
    /// With an exclusive front block the slot is reclaimed in place and the
    /// item moved out; a later push reuses it. With a shared block the item
    /// is cloned out and the handle stepped back, leaving sharers intact.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySequence`] if the list has zero items.
    pub fn pop(&mut self) -> Result<T, Error> {
        let mut reclaimed: Option<(T, Option<Chain<T>>)> = None;
        if self.chain.local_count > 0
            && let Some(reference) = self.chain.block.as_mut()
            && let Some(block) = ReferenceCounter::get_mut(reference)
        {
            let slot = self.chain.local_count - 1;
            let item = block.items[slot]
                .take()
                .ok_or(Error::InvalidState("unfilled slot inside the frozen region"))?;
            block.immutable_count.set(slot);
            let stepped = (slot == 0).then(|| block.prior.clone());
            reclaimed = Some((item, stepped));
        }
        if let Some((item, stepped)) = reclaimed {
            match stepped {
                Some(prior) => self.chain = prior,
                None => self.chain.local_count -= 1,
            }
            return Ok(item);
        }
        let (item, rest) = self.chain.popped()?;
        self.chain = rest;
        Ok(item)
    }

    /// Replaces the item at `index`, returning the previous value. Copies
    /// only the blocks shared with other handles on the path to the target.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len()`.
    pub fn set(&mut self, index: usize, value: T) -> Result<T, Error> {
        self.chain.set_in_place(index, value)
    }

    /// Splices `value` in before position `index` (`index == len()` appends
    /// at the back).
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index > len()`.
    pub fn insert_at(&mut self, index: usize, value: T) -> Result<(), Error> {
        self.chain = self.chain.rebuilt_insert(index, value)?;
        Ok(())
    }

    /// Splices out and returns the item at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len()`.
    pub fn remove_at(&mut self, index: usize) -> Result<T, Error> {
        let (item, chain) = self.chain.rebuilt_remove(index)?;
        self.chain = chain;
        Ok(item)
    }
}

impl<T> Clone for FWList<T> {
    /// Cloning shares every block; both wrappers fall back to copy-on-write
    /// until they diverge.
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
        }
    }
}

impl<T> Default for FWList<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<FVList<T>> for FWList<T> {
    /// Starts editing on top of a frozen list. O(1); the frozen list keeps
    /// its items because the shared blocks force copy-on-write.
    fn from(list: FVList<T>) -> Self {
        Self { chain: list.chain }
    }
}

impl<T> FromIterator<T> for FWList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(FVList::from_iter(iter))
    }
}

impl<T> Extend<T> for FWList<T> {
    /// Pushes the items in order; the last item yielded ends at position 0.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T> IntoIterator for &'a FWList<T> {
    type Item = &'a T;
    type IntoIter = FVListIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for FWList<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for FWList<T> {}

impl<T: fmt::Debug> fmt::Debug for FWList<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

// =============================================================================
// WList
// =============================================================================

/// A mutable reverse list over a block chain (newest at `len() - 1`).
///
/// The writable counterpart of [`RVList`]: `push` appends at the back,
/// `pop` removes from the back, and enumeration runs oldest first. Shares
/// the in-place/copy-on-write behavior of [`FWList`] through index
/// reflection.
///
/// # Examples
///
/// ```rust
/// use vlists::vlist::WList;
///
/// let mut list = WList::new();
/// list.push("a");
/// list.push("b");
/// assert_eq!(list.last(), Some(&"b"));
/// assert_eq!(list.get(0), Some(&"a"));
/// ```
pub struct WList<T> {
    forward: FWList<T>,
}

impl<T> WList<T> {
    /// Creates a new empty list.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forward: FWList::new(),
        }
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
    #[inline]
    pub fn push(&mut self, item: T) {
        self.forward.push(item);
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
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        let length = self.len();
        if index >= length {
            return None;
        }
        self.forward.get(length - 1 - index)
    }

    /// Returns an iterator over references to the items, oldest first.
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

    /// Removes every item. Frozen views taken earlier keep their items.
    #[inline]
    pub fn clear(&mut self) {
        self.forward.clear();
    }

    /// Frozen reverse view of the current contents. O(1).
    #[inline]
    #[must_use]
    pub fn to_rvlist(&self) -> RVList<T> {
        self.forward.to_fvlist().to_rvlist()
    }
}

impl<T: Clone> WList<T> {
    /// Removes and returns the last (newest) item.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySequence`] if the list has zero items.
    #[inline]
    pub fn pop(&mut self) -> Result<T, Error> {
        self.forward.pop()
    }

    /// Replaces the item at `index` (0 = oldest), returning the previous
    /// value.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len()`.
    pub fn set(&mut self, index: usize, value: T) -> Result<T, Error> {
        let length = self.len();
        if index >= length {
            return Err(Error::IndexOutOfRange { index, length });
        }
        self.forward.set(length - 1 - index, value)
    }

    /// Splices `value` in before position `index` (`index == len()`
    /// appends at the back).
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index > len()`.
    pub fn insert_at(&mut self, index: usize, value: T) -> Result<(), Error> {
        let length = self.len();
        if index > length {
            return Err(Error::IndexOutOfRange { index, length });
        }
        self.forward.insert_at(length - index, value)
    }

    /// Splices out and returns the item at `index` (0 = oldest).
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len()`.
    pub fn remove_at(&mut self, index: usize) -> Result<T, Error> {
        let length = self.len();
        if index >= length {
            return Err(Error::IndexOutOfRange { index, length });
        }
        self.forward.remove_at(length - 1 - index)
    }
}

impl<T> Clone for WList<T> {
    fn clone(&self) -> Self {
        Self {
            forward: self.forward.clone(),
        }
    }
}

impl<T> Default for WList<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<RVList<T>> for WList<T> {
    /// Starts editing on top of a frozen reverse list. O(1).
    fn from(list: RVList<T>) -> Self {
        Self {
            forward: FWList::from(list.forward),
        }
    }
}

impl<T> FromIterator<T> for WList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(RVList::from_iter(iter))
    }
}

impl<T> Extend<T> for WList<T> {
    /// Appends the items in order at the back.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T> IntoIterator for &'a WList<T> {
    type Item = &'a T;
    type IntoIter = RVListIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for WList<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for WList<T> {}

impl<T: fmt::Debug> fmt::Debug for WList<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::{FWList, WList};
    use crate::ReferenceCounter;
    use crate::error::Error;
    use crate::vlist::FVList;
    use crate::vlist::block::BLOCK_CAPACITY;
    use rstest::rstest;

    #[rstest]
    fn test_push_pop_cycle() {
        let mut list = FWList::new();
        list.push(2);
        list.push(1);
        assert_eq!(list.pop(), Ok(1));
        assert_eq!(list.pop(), Ok(2));
        assert_eq!(list.pop(), Err(Error::EmptySequence));
    }

    #[rstest]
    fn test_exclusive_push_reuses_block() {
        let mut list = FWList::new();
        for value in 0..BLOCK_CAPACITY {
            list.push(value);
        }
        let front = list.chain.block.as_ref().map(ReferenceCounter::as_ptr);
        assert_eq!(list.pop(), Ok(BLOCK_CAPACITY - 1));
        list.push(999);
        // The vacated slot is rewritten in place, no new block.
        let after = list.chain.block.as_ref().map(ReferenceCounter::as_ptr);
        assert_eq!(front, after);
        assert_eq!(list.first(), Some(&999));
        assert_eq!(list.len(), BLOCK_CAPACITY);
    }

    #[rstest]
    fn test_frozen_view_is_isolated() {
        let mut list: FWList<i32> = (1..=10).collect();
        let frozen = list.to_fvlist();
        assert_eq!(list.pop(), Ok(1));
        assert_eq!(list.set(0, 99).map(|_| ()), Ok(()));
        list.push(0);
        let expected: Vec<i32> = (1..=10).collect();
        let actual: Vec<i32> = frozen.iter().copied().collect();
        assert_eq!(actual, expected);
    }

    #[rstest]
    fn test_from_frozen_copy_on_write() {
        let frozen: FVList<i32> = (1..=5).collect();
        let mut editable = FWList::from(frozen.clone());
        assert_eq!(editable.set(2, 0), Ok(3));
        assert_eq!(editable.get(2), Some(&0));
        assert_eq!(frozen.get(2), Some(&3));
    }

    #[rstest]
    fn test_exclusivity_regained_after_view_drops() {
        let mut list: FWList<i32> = (1..=3).collect();
        let frozen = list.to_fvlist();
        drop(frozen);
        let before = list.chain.block.as_ref().map(ReferenceCounter::as_ptr);
        assert_eq!(list.pop(), Ok(1));
        list.push(7);
        let after = list.chain.block.as_ref().map(ReferenceCounter::as_ptr);
        assert_eq!(before, after);
    }

    #[rstest]
    fn test_insert_and_remove_at() {
        let mut list: FWList<i32> = (1..=5).collect();
        list.insert_at(2, 99).expect("within bounds");
        let collected: Vec<i32> = list.iter().copied().collect();
        assert_eq!(collected, vec![1, 2, 99, 3, 4, 5]);
        assert_eq!(list.remove_at(2), Ok(99));
        let collected: Vec<i32> = list.iter().copied().collect();
        assert_eq!(collected, vec![1, 2, 3, 4, 5]);
    }

    #[rstest]
    fn test_wlist_appends_at_back() {
        let mut list = WList::new();
        list.extend(1..=4);
        let collected: Vec<i32> = list.iter().copied().collect();
        assert_eq!(collected, vec![1, 2, 3, 4]);
        assert_eq!(list.pop(), Ok(4));
        assert_eq!(list.last(), Some(&3));
        assert_eq!(list.get(0), Some(&1));
    }

    #[rstest]
    fn test_wlist_mirrored_edits() {
        let mut list: WList<i32> = (1..=5).collect();
        assert_eq!(list.set(0, 10), Ok(1));
        list.insert_at(1, 99).expect("within bounds");
        let collected: Vec<i32> = list.iter().copied().collect();
        assert_eq!(collected, vec![10, 99, 2, 3, 4, 5]);
        assert_eq!(list.remove_at(1), Ok(99));
        assert_eq!(
            list.remove_at(5).err(),
            Some(Error::IndexOutOfRange {
                index: 5,
                length: 5
            })
        );
    }

    #[rstest]
    fn test_wlist_frozen_view_round_trip() {
        let mut list: WList<i32> = (1..=50).collect();
        let frozen = list.to_rvlist();
        list.push(51);
        assert_eq!(frozen.len(), 50);
        let reopened = WList::from(frozen);
        assert_eq!(reopened.len(), 50);
        assert_eq!(reopened.last(), Some(&50));
    }

    #[rstest]
    fn test_clear_releases_items() {
        let mut list: WList<i32> = (1..=10).collect();
        let frozen = list.to_rvlist();
        list.clear();
        assert!(list.is_empty());
        assert_eq!(frozen.len(), 10);
    }
}
