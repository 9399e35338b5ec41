//! The observable indexed tree sequence.
//!
//! # Overview
//!
//! [`AList`] keeps its items in a B-tree ordered by position, so indexed
//! reads and edits anywhere in the sequence are O(log n) — the complement of
//! the VList family, which is O(1) at the front but linear elsewhere. Two
//! capabilities come with the tree:
//!
//! - **Snapshots**: `Clone` is O(1) and shares every node; later mutation of
//!   either copy clones only the root-to-target path.
//! - **Observation**: attached [`TreeObserver`]s hear every structural
//!   change synchronously, letting consumers such as
//!   [`SumTracker`](super::SumTracker) maintain aggregates incrementally.
//!
//! # Examples
//!
//! ```rust
//! use vlists::alist::AList;
//!
//! let mut list: AList<i32> = (1..=100).collect();
//! list.insert(50, -1).unwrap();
//! assert_eq!(list.get(50), Some(&-1));
//! assert_eq!(list.remove_at(50), Ok(-1));
//!
//! let snapshot = list.clone(); // O(1)
//! list.set(0, 999).unwrap();
//! assert_eq!(snapshot.get(0), Some(&1));
//! ```

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use smallvec::smallvec;

use super::node::{Child, Children, Node, NodeRef, insert_node, remove_node, set_node};
use super::observer::{NodeId, Notifier, ObserverRef, TreeId};
use crate::ReferenceCounter;
use crate::error::Error;

/// An indexed sequence backed by a counted B-tree, with synchronous change
/// observation.
///
/// Positions are plain indexes (0 = front). Inner nodes cache subtree
/// counts, so every indexed operation descends one root-to-leaf path.
///
/// # Time Complexity
///
/// | Operation     | Complexity     |
/// |---------------|----------------|
/// | `len`         | O(1)           |
/// | `get`         | O(log n)       |
/// | `insert`      | O(log n)       |
/// | `remove_at`   | O(log n)       |
/// | `set`         | O(log n)       |
/// | `push` / `pop`| O(log n)       |
/// | `clone`       | O(1)           |
/// | `iter`        | O(1) per step  |
///
/// `push`/`pop` work at the back, which together with `get`/`set` by index
/// makes the list a suitable backing store for an array-heap priority
/// queue.
///
/// # Observers
///
/// Observers are attached with [`add_observer`](Self::add_observer) and
/// notified in-line during each mutation; see
/// [`TreeObserver`] for the event protocol. Snapshots
/// ([`Clone`]) carry no observers and get a fresh [`TreeId`].
///
/// [`TreeObserver`]: super::TreeObserver
pub struct AList<T> {
    root: Option<NodeRef<T>>,
    count: usize,
    id: TreeId,
    observers: Vec<ObserverRef<T>>,
}

impl<T> AList<T> {
    /// Creates a new empty list with a fresh [`TreeId`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            count: 0,
            id: TreeId::allocate(),
            observers: Vec::new(),
        }
    }

    /// This tree's identity token, as seen by observers.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> TreeId {
        self.id
    }

    /// Returns the number of items in the list. O(1).
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if the list contains no items.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns a reference to the item at `index`, or `None` if out of
    /// bounds. O(log n).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.root.as_deref().and_then(|root| root.get_at(index))
    }

    /// Returns a reference to the first item.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a reference to the last item.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.count.checked_sub(1).and_then(|index| self.get(index))
    }

    /// Returns an iterator over references to the items, front to back.
    #[must_use]
    pub fn iter(&self) -> AListIterator<'_, T> {
        AListIterator::over(self.root.as_deref(), self.count)
    }

    /// Finds the index of the first item that satisfies the predicate.
    #[must_use]
    pub fn find_index<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(&T) -> bool,
    {
        self.iter().position(predicate)
    }

    /// Attaches `observer`. The observer's `attach` hook runs first; if it
    /// asks for the current contents (`Ok(true)`) the whole tree is
    /// reported through `add_all` before any future mutation event.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if this exact observer is already attached,
    /// or whatever the observer's own `attach` returns.
    pub fn add_observer(&mut self, observer: ObserverRef<T>) -> Result<(), Error> {
        if self.observers.iter().any(|existing| {
            std::ptr::addr_eq(
                ReferenceCounter::as_ptr(existing),
                ReferenceCounter::as_ptr(&observer),
            )
        }) {
            return Err(Error::InvalidState("observer is already attached"));
        }
        let wants_contents = observer.borrow_mut().attach(self.id)?;
        if wants_contents && let Some(root) = self.root.as_deref() {
            observer.borrow_mut().add_all(self.id, root);
        }
        self.observers.push(observer);
        Ok(())
    }

    /// Detaches `observer`; it receives `detach` with the current root so
    /// it can release per-tree caches. Further mutations no longer reach
    /// it.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if the observer is not attached.
    pub fn remove_observer(&mut self, observer: &ObserverRef<T>) -> Result<(), Error> {
        let position = self
            .observers
            .iter()
            .position(|existing| {
                std::ptr::addr_eq(
                    ReferenceCounter::as_ptr(existing),
                    ReferenceCounter::as_ptr(observer),
                )
            })
            .ok_or(Error::InvalidState("observer is not attached"))?;
        let removed = self.observers.remove(position);
        removed.borrow_mut().detach(self.id, self.root.as_deref());
        Ok(())
    }

    /// Removes every item. Observers see `root_changed(None, clear)`, a
    /// `remove_all` walk of the dropped tree, and a final check point.
    pub fn clear(&mut self) {
        let shared_clone = Cell::new(false);
        let Self {
            root,
            count,
            id,
            observers,
        } = &mut *self;
        if let Some(reference) = root.take() {
            let notifier = Notifier::new(*id, observers.as_slice(), &shared_clone);
            notifier.root_changed(None, true);
            notifier.remove_all(reference.as_ref());
            *count = 0;
            notifier.check_point(0);
        }
    }
}

impl<T: Clone> AList<T> {
    /// Inserts `item` before position `index`; `index == len()` appends.
    /// O(log n).
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index > len()`. A failed insert
    /// performs no mutation and fires no events.
    pub fn insert(&mut self, index: usize, item: T) -> Result<(), Error> {
        if index > self.count {
            return Err(Error::IndexOutOfRange {
                index,
                length: self.count,
            });
        }
        self.insert_unchecked(index, item);
        Ok(())
    }

    /// Appends `item` at the back. O(log n).
    pub fn push(&mut self, item: T) {
        self.insert_unchecked(self.count, item);
    }

    fn insert_unchecked(&mut self, index: usize, item: T) {
        let shared_clone = Cell::new(false);
        let Self {
            root,
            count,
            id,
            observers,
        } = &mut *self;
        let notifier = Notifier::new(*id, observers.as_slice(), &shared_clone);
        let previous_root = root.as_deref().map(NodeId::of);
        match root.as_mut() {
            None => {
                let leaf = Node::leaf(smallvec![item]);
                if let Some(first) = leaf.items().first() {
                    notifier.item_added(first, NodeId::of(leaf.as_ref()));
                }
                *root = Some(leaf);
            }
            Some(reference) => {
                if let Some(new_child) = insert_node(reference, index, item, &notifier) {
                    // Root overflow is the only place the tree grows taller.
                    let grown = Node::inner(smallvec![Child::of(reference.clone()), new_child]);
                    let grown_id = NodeId::of(grown.as_ref());
                    for child in grown.children() {
                        notifier.node_added(NodeId::of(child), grown_id);
                    }
                    *root = Some(grown);
                }
            }
        }
        *count += 1;
        Self::report_completion(&notifier, root.as_deref(), previous_root, &shared_clone, *count);
    }

    /// Replaces the item at `index`, returning the previous value.
    /// Observers see the change as a removal plus an addition in the same
    /// leaf. O(log n).
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len()`.
    pub fn set(&mut self, index: usize, value: T) -> Result<T, Error> {
        if index >= self.count {
            return Err(Error::IndexOutOfRange {
                index,
                length: self.count,
            });
        }
        let shared_clone = Cell::new(false);
        let Self {
            root,
            count,
            id,
            observers,
        } = &mut *self;
        let notifier = Notifier::new(*id, observers.as_slice(), &shared_clone);
        let previous_root = root.as_deref().map(NodeId::of);
        let Some(reference) = root.as_mut() else {
            return Err(Error::InvalidState("cached count out of sync with an absent root"));
        };
        let previous = set_node(reference, index, value, &notifier)?;
        Self::report_completion(&notifier, root.as_deref(), previous_root, &shared_clone, *count);
        Ok(previous)
    }

    /// Removes and returns the item at `index`. O(log n).
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= len()`. A failed remove
    /// performs no mutation and fires no events.
    pub fn remove_at(&mut self, index: usize) -> Result<T, Error> {
        if index >= self.count {
            return Err(Error::IndexOutOfRange {
                index,
                length: self.count,
            });
        }
        let shared_clone = Cell::new(false);
        let Self {
            root,
            count,
            id,
            observers,
        } = &mut *self;
        let notifier = Notifier::new(*id, observers.as_slice(), &shared_clone);
        let previous_root = root.as_deref().map(NodeId::of);
        let Some(reference) = root.as_mut() else {
            return Err(Error::InvalidState("cached count out of sync with an absent root"));
        };
        let removed = remove_node(reference, index, &notifier)?;
        *count -= 1;
        // Height shrinks only here: a single-child inner root collapses
        // into its child, and an emptied leaf root is dropped.
        loop {
            let replacement = match root.as_deref() {
                Some(node) if node.count() == 0 => Some(None),
                Some(node) => node.sole_child().map(|child| Some(child.clone())),
                None => None,
            };
            match replacement {
                Some(next) => *root = next,
                None => break,
            }
        }
        Self::report_completion(&notifier, root.as_deref(), previous_root, &shared_clone, *count);
        Ok(removed)
    }

    /// Removes and returns the last item. O(log n).
    ///
    /// # Errors
    ///
    /// [`Error::EmptySequence`] if the list has zero items.
    pub fn pop(&mut self) -> Result<T, Error> {
        if self.count == 0 {
            return Err(Error::EmptySequence);
        }
        self.remove_at(self.count - 1)
    }

    /// Root-change and check-point reporting shared by every completed
    /// mutation. A copy-on-write clone anywhere on the path invalidates
    /// observers' node ids, hence the clear flag.
    fn report_completion(
        notifier: &Notifier<'_, T>,
        root: Option<&Node<T>>,
        previous_root: Option<NodeId>,
        shared_clone: &Cell<bool>,
        count: usize,
    ) {
        if shared_clone.get() {
            notifier.root_changed(root, true);
        } else if root.map(NodeId::of) != previous_root {
            notifier.root_changed(root, false);
        }
        notifier.check_point(count);
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// A borrowing iterator over the items of an [`AList`], front to back.
///
/// Walks the tree with an explicit stack of child cursors, so a full
/// traversal is O(n).
pub struct AListIterator<'a, T> {
    stack: Vec<Children<'a, T>>,
    leaf: std::slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T> AListIterator<'a, T> {
    fn over(root: Option<&'a Node<T>>, remaining: usize) -> Self {
        let mut iterator = Self {
            stack: Vec::new(),
            leaf: Default::default(),
            remaining,
        };
        if let Some(root) = root {
            iterator.descend(root);
        }
        iterator
    }

    fn descend(&mut self, node: &'a Node<T>) {
        let mut node = node;
        loop {
            if node.is_leaf() {
                self.leaf = node.items().iter();
                return;
            }
            let mut children = node.children();
            let first = children.next();
            self.stack.push(children);
            match first {
                Some(child) => node = child,
                None => return,
            }
        }
    }
}

impl<'a, T> Iterator for AListIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.leaf.next() {
                self.remaining -= 1;
                return Some(item);
            }
            let next_child = loop {
                let children = self.stack.last_mut()?;
                if let Some(child) = children.next() {
                    break child;
                }
                self.stack.pop();
            };
            self.descend(next_child);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for AListIterator<'_, T> {}

/// An owning iterator over the items of an [`AList`], front to back.
pub struct AListIntoIterator<T> {
    list: AList<T>,
    position: usize,
}

impl<T: Clone> Iterator for AListIntoIterator<T> {
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

impl<T: Clone> ExactSizeIterator for AListIntoIterator<T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Clone for AList<T> {
    /// O(1) snapshot: shares every node with `self`, carries no observers,
    /// and gets a fresh [`TreeId`]. Later mutation of either copy clones
    /// only the root-to-target path.
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            count: self.count,
            id: TreeId::allocate(),
            observers: Vec::new(),
        }
    }
}

impl<T> Default for AList<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> FromIterator<T> for AList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        for item in iter {
            list.push(item);
        }
        list
    }
}

impl<T: Clone> Extend<T> for AList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T: Clone> IntoIterator for AList<T> {
    type Item = T;
    type IntoIter = AListIntoIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        AListIntoIterator {
            list: self,
            position: 0,
        }
    }
}

impl<'a, T> IntoIterator for &'a AList<T> {
    type Item = &'a T;
    type IntoIter = AListIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for AList<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for AList<T> {}

impl<T: Hash> Hash for AList<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self {
            item.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for AList<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for AList<T> {
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
