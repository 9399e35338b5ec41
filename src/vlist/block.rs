//! Block chain internals shared by the whole list family.
//!
//! A [`Block`] is a small fixed-capacity segment of write-once slots plus a
//! shared reference to a strictly older block. A [`Chain`] is a lightweight
//! handle into such a chain: the block holding its newest items and how many
//! of that block's slots belong to this handle. All four public list types
//! are thin views over `Chain`.
//!
//! The freeze discipline is structural: a filled `OnceCell` slot cannot be
//! rewritten through a shared reference, so any region visible to another
//! handle is immutable by construction. Rewriting or truncating a slot
//! requires an exclusive block reference (`get_mut`/`make_mut`), which is
//! the copy-on-write boundary.

use std::cell::{Cell, OnceCell};

use smallvec::SmallVec;
use static_assertions::const_assert;

use crate::ReferenceCounter;
use crate::error::Error;

/// Number of item slots in every block.
///
/// Small enough that the copy performed by a copy-on-write stays cheap,
/// large enough that a chain of n items touches O(n / 32) block headers.
pub(crate) const BLOCK_CAPACITY: usize = 32;

const_assert!(BLOCK_CAPACITY >= 2);
const_assert!(BLOCK_CAPACITY.is_power_of_two());

// =============================================================================
// Block Definition
// =============================================================================

/// A fixed-capacity array segment plus a link to a prior (older) block.
///
/// The unit of structural sharing: many handles may reference the same
/// block, each seeing some prefix of its filled slots.
pub(crate) struct Block<T> {
    /// Write-once item slots; `items[0]` is the oldest item in the block.
    pub(crate) items: [OnceCell<T>; BLOCK_CAPACITY],
    /// Number of filled slots from index 0. Filled slots are frozen for
    /// every shared holder; only an exclusive owner may reclaim them.
    pub(crate) immutable_count: Cell<usize>,
    /// Handle to the older portion of the chain (empty for the first block).
    pub(crate) prior: Chain<T>,
    /// Cached `prior.len()`, so total length is O(1).
    pub(crate) prior_count: usize,
}

impl<T> Block<T> {
    /// Allocates a fresh block holding `first`, chained onto `prior`.
    fn allocate(prior: Chain<T>, first: T) -> Self {
        let mut items: [OnceCell<T>; BLOCK_CAPACITY] = std::array::from_fn(|_| OnceCell::new());
        items[0] = OnceCell::from(first);
        Self {
            items,
            immutable_count: Cell::new(1),
            prior_count: prior.len(),
            prior,
        }
    }
}

impl<T: Clone> Clone for Block<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            immutable_count: self.immutable_count.clone(),
            prior: self.prior.clone(),
            prior_count: self.prior_count,
        }
    }
}

// =============================================================================
// Chain Definition
// =============================================================================

/// A handle into a block chain: `(block, local_count)`.
///
/// Forward oriented: position 0 is the newest item (the one nearest the
/// handle). Invariant: `block.is_some()` implies `local_count >= 1`, and
/// `local_count` never exceeds the block's filled-slot count.
pub(crate) struct Chain<T> {
    /// The block holding this handle's newest items, shared with any other
    /// handle that has not diverged.
    pub(crate) block: Option<ReferenceCounter<Block<T>>>,
    /// How many of `block`'s slots belong to this handle's view.
    pub(crate) local_count: usize,
}

impl<T> Chain<T> {
    /// The empty chain.
    pub(crate) const fn new() -> Self {
        Self {
            block: None,
            local_count: 0,
        }
    }

    /// Total number of items reachable from this handle. O(1) via the
    /// cached prior count.
    pub(crate) fn len(&self) -> usize {
        self.block
            .as_deref()
            .map_or(0, |block| self.local_count + block.prior_count)
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.block.is_none()
    }

    /// Item at forward position `index` (0 = newest). Walks block headers,
    /// never individual items, until the owning block is found.
    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        let mut block = self.block.as_deref()?;
        let mut local = self.local_count;
        let mut index = index;
        loop {
            if index < local {
                return block.items[local - 1 - index].get();
            }
            index -= local;
            let prior = &block.prior;
            local = prior.local_count;
            block = prior.block.as_deref()?;
        }
    }

    /// Returns a handle with `item` at position 0, sharing every existing
    /// block with `self`.
    ///
    /// Fast path: when this handle sits exactly at the block's fill
    /// boundary and a slot is free, the item is appended into the shared
    /// block via its write-once cell; no other handle can see the new slot,
    /// so nothing observable changes for them. Otherwise a fresh block is
    /// chained onto this handle.
    pub(crate) fn pushed(&self, item: T) -> Self {
        if let Some(block) = &self.block
            && self.local_count == block.immutable_count.get()
            && self.local_count < BLOCK_CAPACITY
        {
            // The cell hands the item back if another handle won the slot
            // since the fill count was read; fall through to a new block.
            match block.items[self.local_count].set(item) {
                Ok(()) => {
                    block.immutable_count.set(self.local_count + 1);
                    return Self {
                        block: Some(block.clone()),
                        local_count: self.local_count + 1,
                    };
                }
                Err(returned) => return self.grown(returned),
            }
        }
        self.grown(item)
    }

    /// Chains a fresh block holding `item` onto this handle.
    fn grown(&self, item: T) -> Self {
        Self {
            block: Some(ReferenceCounter::new(Block::allocate(self.clone(), item))),
            local_count: 1,
        }
    }

    /// Handle after dropping the `skip` newest items. `None` if `skip`
    /// exceeds the length.
    pub(crate) fn suffix(&self, mut skip: usize) -> Option<Self> {
        let mut chain = self.clone();
        while skip > 0 {
            let block = chain.block.as_ref()?;
            if skip < chain.local_count {
                return Some(Self {
                    block: Some(block.clone()),
                    local_count: chain.local_count - skip,
                });
            }
            skip -= chain.local_count;
            let prior = block.prior.clone();
            chain = prior;
        }
        Some(chain)
    }

    /// Iterates newest-first (forward order), O(1) per step.
    pub(crate) fn iter(&self) -> ChainIter<'_, T> {
        ChainIter {
            block: self.block.as_deref(),
            remaining: self.local_count,
        }
    }

    /// Iterates oldest-first (reverse order) by first stacking the chain's
    /// block headers, O(n) overall.
    pub(crate) fn rev_iter(&self) -> ChainRevIter<'_, T> {
        let mut stack = Vec::new();
        let mut block = self.block.as_deref();
        let mut visible = self.local_count;
        while let Some(current) = block {
            stack.push((current, visible));
            visible = current.prior.local_count;
            block = current.prior.block.as_deref();
        }
        ChainRevIter { stack, position: 0 }
    }
}

impl<T: Clone> Chain<T> {
    /// Removes the newest item, returning it together with the remaining
    /// handle. The vacated slot stays in the block (it may be shared); the
    /// returned handle simply no longer sees it.
    pub(crate) fn popped(&self) -> Result<(T, Self), Error> {
        let item = self.get(0).cloned().ok_or(Error::EmptySequence)?;
        let rest = self.suffix(1).unwrap_or_default();
        Ok((item, rest))
    }

    /// Overwrites the slot at forward position `index` in place, cloning
    /// every block on the path from the front to the target if it is shared
    /// by another handle. Returns the previous item.
    ///
    /// The caller validates `index < len()`; a missing block mid-walk still
    /// surfaces as `IndexOutOfRange` rather than being clamped.
    pub(crate) fn set_in_place(&mut self, index: usize, value: T) -> Result<T, Error> {
        let length = self.len();
        let mut remaining = index;
        let mut current: &mut Self = self;
        loop {
            let chain = current;
            if remaining < chain.local_count {
                let slot = chain.local_count - 1 - remaining;
                let Some(block_reference) = chain.block.as_mut() else {
                    return Err(Error::IndexOutOfRange { index, length });
                };
                let block = ReferenceCounter::make_mut(block_reference);
                let cell = &mut block.items[slot];
                let previous = cell
                    .take()
                    .ok_or(Error::InvalidState("unfilled slot inside the frozen region"))?;
                *cell = OnceCell::from(value);
                return Ok(previous);
            }
            remaining -= chain.local_count;
            let Some(block_reference) = chain.block.as_mut() else {
                return Err(Error::IndexOutOfRange { index, length });
            };
            current = &mut ReferenceCounter::make_mut(block_reference).prior;
        }
    }

    /// Splices `value` in before forward position `index` (`index == len`
    /// appends at the back). The chain behind the splice point is shared;
    /// the items in front of it are re-pushed, O(index).
    pub(crate) fn rebuilt_insert(&self, index: usize, value: T) -> Result<Self, Error> {
        let length = self.len();
        if index > length {
            return Err(Error::IndexOutOfRange { index, length });
        }
        let front = self.front_items(index);
        let mut chain = self.suffix(index).unwrap_or_default();
        chain = chain.pushed(value);
        Ok(Self::repushed(chain, front))
    }

    /// Splices out the item at forward position `index`, returning it and
    /// the rebuilt chain. O(index) plus the shared tail.
    pub(crate) fn rebuilt_remove(&self, index: usize) -> Result<(T, Self), Error> {
        let length = self.len();
        if index >= length {
            return Err(Error::IndexOutOfRange { index, length });
        }
        let removed = self
            .get(index)
            .cloned()
            .ok_or(Error::IndexOutOfRange { index, length })?;
        let front = self.front_items(index);
        let chain = self.suffix(index + 1).unwrap_or_default();
        Ok((removed, Self::repushed(chain, front)))
    }

    /// Clones the `count` newest items, newest first.
    fn front_items(&self, count: usize) -> SmallVec<[T; BLOCK_CAPACITY]> {
        self.iter().take(count).cloned().collect()
    }

    /// Pushes `front` (newest first) back onto `chain`, restoring order.
    fn repushed(mut chain: Self, mut front: SmallVec<[T; BLOCK_CAPACITY]>) -> Self {
        while let Some(item) = front.pop() {
            chain = chain.pushed(item);
        }
        chain
    }
}

impl<T> Clone for Chain<T> {
    fn clone(&self) -> Self {
        Self {
            block: self.block.clone(),
            local_count: self.local_count,
        }
    }
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Newest-first walk over a chain.
pub(crate) struct ChainIter<'a, T> {
    block: Option<&'a Block<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for ChainIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let block = self.block?;
            if self.remaining == 0 {
                let prior = &block.prior;
                self.remaining = prior.local_count;
                self.block = prior.block.as_deref();
                continue;
            }
            self.remaining -= 1;
            return block.items[self.remaining].get();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = self
            .block
            .map_or(0, |block| self.remaining + block.prior_count);
        (total, Some(total))
    }
}

impl<T> ExactSizeIterator for ChainIter<'_, T> {}

/// Oldest-first walk over a chain, driven by a stack of block headers.
pub(crate) struct ChainRevIter<'a, T> {
    /// Blocks from newest (index 0) to oldest, each with the number of
    /// slots visible to the originating handle.
    stack: Vec<(&'a Block<T>, usize)>,
    position: usize,
}

impl<'a, T> Iterator for ChainRevIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let &(block, visible) = self.stack.last()?;
            if self.position < visible {
                let item = block.items[self.position].get();
                self.position += 1;
                return item;
            }
            self.stack.pop();
            self.position = 0;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total: usize = self
            .stack
            .iter()
            .map(|&(_, visible)| visible)
            .sum::<usize>()
            - self.position;
        (total, Some(total))
    }
}

impl<T> ExactSizeIterator for ChainRevIter<'_, T> {}

// =============================================================================
// Tests
// =============================================================================
