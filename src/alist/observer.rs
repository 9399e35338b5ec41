//! Synchronous observer protocol for the indexed tree sequence.
//!
//! An [`AList`](super::AList) fires [`TreeObserver`] callbacks at the exact
//! moment of each structural change, in-line on the mutating call: the item
//! first, then any node restructuring, then a root-change report if the root
//! was replaced, then one [`check_point`](TreeObserver::check_point) when the
//! operation has fully completed. Nothing is batched or deferred, so an
//! observer's view is consistent with the tree at every callback.
//!
//! Identity is two-level. A [`TreeId`] names a tree for the observer's whole
//! lifetime (snapshots get fresh ids), so one observer instance can serve
//! many trees with state keyed per tree. A [`NodeId`] names a node only
//! until the next `root_changed` with the clear flag set: copy-on-write
//! against a snapshot re-allocates nodes, and the clear flag is how the tree
//! tells observers their per-node caches are stale.
//!
//! [`SumTracker`] is the canonical consumer: a running per-tree sum kept
//! O(1)-queryable between mutations.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::ops::{AddAssign, SubAssign};
use std::sync::atomic::{AtomicU64, Ordering};

use super::node::Node;
use crate::error::Error;

// =============================================================================
// Identity Tokens
// =============================================================================

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(0);

/// A stable identity token for one tree.
///
/// Allocated monotonically at construction; never reused within a process.
/// Snapshot clones receive a fresh id, so an observer attached to the
/// original never confuses the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(u64);

impl TreeId {
    pub(crate) fn allocate() -> Self {
        Self(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "tree#{}", self.0)
    }
}

/// An identity token for one tree node, derived from its allocation address.
///
/// Valid until the owning tree reports `root_changed` with the clear flag
/// set; after that, cached ids may name nodes that no longer belong to the
/// tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The identity of `node`.
    #[must_use]
    pub fn of<T>(node: &Node<T>) -> Self {
        Self(std::ptr::from_ref(node).addr())
    }
}

// =============================================================================
// TreeObserver
// =============================================================================

/// A shared, interiorly-mutable observer handle, as stored by the tree.
pub type ObserverRef<T> = std::rc::Rc<RefCell<dyn TreeObserver<T>>>;

/// Receiver side of the tree's synchronous change protocol.
///
/// Only [`attach`](Self::attach) and [`detach`](Self::detach) are required;
/// every event method defaults to a no-op, and the subtree walks
/// [`add_all`](Self::add_all) / [`remove_all`](Self::remove_all) default to
/// firing the per-item events. Events carry the [`TreeId`] so a single
/// observer can track several trees at once.
pub trait TreeObserver<T> {
    /// Called when the observer is registered with a tree.
    ///
    /// Returning `Ok(true)` requests an immediate `add_all` of the current
    /// contents, so the observer starts from a complete picture.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if the observer is already serving this tree.
    fn attach(&mut self, tree: TreeId) -> Result<bool, Error>;

    /// Called when the observer is unregistered. `root` is the tree's
    /// current root, for observers that release per-node caches by walking
    /// it (`remove_all` semantics).
    fn detach(&mut self, tree: TreeId, root: Option<&Node<T>>);

    /// The tree's root node was replaced (or dropped, `root = None`).
    ///
    /// `clear = true` additionally invalidates every [`NodeId`] the observer
    /// has cached for this tree: a mutation had to clone shared nodes, so
    /// old ids name nodes outside the tree.
    fn root_changed(&mut self, tree: TreeId, root: Option<&Node<T>>, clear: bool) {
        let _ = (tree, root, clear);
    }

    /// A mutation completed; `count` is the tree's item count afterwards.
    /// Fired exactly once per completed operation, after all other events.
    fn check_point(&mut self, tree: TreeId, count: usize) {
        let _ = (tree, count);
    }

    /// `item` is now present in the leaf `leaf`.
    fn item_added(&mut self, tree: TreeId, item: &T, leaf: NodeId) {
        let _ = (tree, item, leaf);
    }

    /// `item` is no longer present in the leaf `leaf`.
    fn item_removed(&mut self, tree: TreeId, item: &T, leaf: NodeId) {
        let _ = (tree, item, leaf);
    }

    /// Node `child` became a child of `parent` (fresh split node, or an
    /// existing node moved during rebalancing).
    fn node_added(&mut self, tree: TreeId, child: NodeId, parent: NodeId) {
        let _ = (tree, child, parent);
    }

    /// Node `child` is no longer a child of `parent`.
    fn node_removed(&mut self, tree: TreeId, child: NodeId, parent: NodeId) {
        let _ = (tree, child, parent);
    }

    /// Reports every item below `node` as added. Used for the initial
    /// picture after a successful attach.
    fn add_all(&mut self, tree: TreeId, node: &Node<T>) {
        if node.is_leaf() {
            let leaf = NodeId::of(node);
            for item in node.items() {
                self.item_added(tree, item, leaf);
            }
        } else {
            for child in node.children() {
                self.add_all(tree, child);
            }
        }
    }

    /// Reports every item below `node` as removed. Used when a whole
    /// subtree is dropped, e.g. by `clear`.
    fn remove_all(&mut self, tree: TreeId, node: &Node<T>) {
        if node.is_leaf() {
            let leaf = NodeId::of(node);
            for item in node.items() {
                self.item_removed(tree, item, leaf);
            }
        } else {
            for child in node.children() {
                self.remove_all(tree, child);
            }
        }
    }
}

// =============================================================================
// Notifier
// =============================================================================

/// Fan-out helper handed down the mutation recursion: one call here becomes
/// one call on every attached observer.
///
/// Also carries the shared-clone flag. Mutation code reports through
/// [`note_shared_clone`](Self::note_shared_clone) whenever copy-on-write had
/// to clone a node another handle still references; the tree turns that into
/// a `root_changed` with the clear flag once the operation completes.
pub(crate) struct Notifier<'a, T> {
    tree: TreeId,
    observers: &'a [ObserverRef<T>],
    shared_clone: &'a Cell<bool>,
}

impl<'a, T> Notifier<'a, T> {
    pub(crate) fn new(
        tree: TreeId,
        observers: &'a [ObserverRef<T>],
        shared_clone: &'a Cell<bool>,
    ) -> Self {
        Self {
            tree,
            observers,
            shared_clone,
        }
    }

    pub(crate) fn note_shared_clone(&self) {
        self.shared_clone.set(true);
    }

    pub(crate) fn item_added(&self, item: &T, leaf: NodeId) {
        for observer in self.observers {
            observer.borrow_mut().item_added(self.tree, item, leaf);
        }
    }

    pub(crate) fn item_removed(&self, item: &T, leaf: NodeId) {
        for observer in self.observers {
            observer.borrow_mut().item_removed(self.tree, item, leaf);
        }
    }

    pub(crate) fn node_added(&self, child: NodeId, parent: NodeId) {
        for observer in self.observers {
            observer.borrow_mut().node_added(self.tree, child, parent);
        }
    }

    pub(crate) fn node_removed(&self, child: NodeId, parent: NodeId) {
        for observer in self.observers {
            observer.borrow_mut().node_removed(self.tree, child, parent);
        }
    }

    pub(crate) fn root_changed(&self, root: Option<&Node<T>>, clear: bool) {
        for observer in self.observers {
            observer.borrow_mut().root_changed(self.tree, root, clear);
        }
    }

    pub(crate) fn check_point(&self, count: usize) {
        for observer in self.observers {
            observer.borrow_mut().check_point(self.tree, count);
        }
    }

    pub(crate) fn remove_all(&self, node: &Node<T>) {
        for observer in self.observers {
            observer.borrow_mut().remove_all(self.tree, node);
        }
    }
}

// =============================================================================
// SumTracker
// =============================================================================

/// A running per-tree sum, maintained incrementally from item events.
///
/// The canonical statistic consumer of the observer protocol: between
/// mutations the sum is a single map lookup instead of an O(n) rescan. One
/// tracker may serve several trees; state is keyed by [`TreeId`], so it
/// survives node-level restructuring and the clear flag untouched.
///
/// # Examples
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use vlists::alist::{AList, SumTracker};
///
/// let mut list: AList<i64> = (1..=5).collect();
/// let tracker = Rc::new(RefCell::new(SumTracker::new()));
/// list.add_observer(tracker.clone()).unwrap();
/// assert_eq!(tracker.borrow().sum(list.id()), Some(15));
///
/// list.remove_at(2).unwrap(); // removes the 3
/// assert_eq!(tracker.borrow().sum(list.id()), Some(12));
/// ```
pub struct SumTracker<T> {
    sums: HashMap<TreeId, T>,
}

impl<T> SumTracker<T> {
    /// Creates a tracker serving no trees yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sums: HashMap::new(),
        }
    }

    /// The current sum for `tree`, or `None` if the tracker is not attached
    /// to it. O(1).
    #[must_use]
    pub fn sum(&self, tree: TreeId) -> Option<T>
    where
        T: Copy,
    {
        self.sums.get(&tree).copied()
    }

    /// Whether the tracker currently serves `tree`.
    #[must_use]
    pub fn is_tracking(&self, tree: TreeId) -> bool {
        self.sums.contains_key(&tree)
    }
}

impl<T> Default for SumTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeObserver<T> for SumTracker<T>
where
    T: Copy + AddAssign + SubAssign + Default,
{
    fn attach(&mut self, tree: TreeId) -> Result<bool, Error> {
        if self.sums.contains_key(&tree) {
            return Err(Error::InvalidState("tracker is already serving this tree"));
        }
        self.sums.insert(tree, T::default());
        // The current contents must be summed in.
        Ok(true)
    }

    fn detach(&mut self, tree: TreeId, _root: Option<&Node<T>>) {
        self.sums.remove(&tree);
    }

    fn item_added(&mut self, tree: TreeId, item: &T, _leaf: NodeId) {
        if let Some(sum) = self.sums.get_mut(&tree) {
            *sum += *item;
        }
    }

    fn item_removed(&mut self, tree: TreeId, item: &T, _leaf: NodeId) {
        if let Some(sum) = self.sums.get_mut(&tree) {
            *sum -= *item;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::{NodeId, SumTracker, TreeId, TreeObserver};
    use crate::error::Error;
    use rstest::rstest;

    #[rstest]
    fn test_tree_ids_are_unique() {
        let first = TreeId::allocate();
        let second = TreeId::allocate();
        assert_ne!(first, second);
    }

    #[rstest]
    fn test_tracker_accumulates_item_events() {
        let tree = TreeId::allocate();
        let leaf = NodeId(0xDEAD);
        let mut tracker: SumTracker<i64> = SumTracker::new();
        assert_eq!(tracker.attach(tree), Ok(true));
        tracker.item_added(tree, &10, leaf);
        tracker.item_added(tree, &5, leaf);
        tracker.item_removed(tree, &3, leaf);
        assert_eq!(tracker.sum(tree), Some(12));
    }

    #[rstest]
    fn test_tracker_rejects_duplicate_attach() {
        let tree = TreeId::allocate();
        let mut tracker: SumTracker<i64> = SumTracker::new();
        assert_eq!(tracker.attach(tree), Ok(true));
        assert_eq!(
            tracker.attach(tree),
            Err(Error::InvalidState("tracker is already serving this tree"))
        );
    }

    #[rstest]
    fn test_tracker_keys_trees_independently() {
        let first = TreeId::allocate();
        let second = TreeId::allocate();
        let leaf = NodeId(0xBEEF);
        let mut tracker: SumTracker<i64> = SumTracker::new();
        tracker.attach(first).expect("fresh tree");
        tracker.attach(second).expect("fresh tree");
        tracker.item_added(first, &7, leaf);
        tracker.item_added(second, &2, leaf);
        assert_eq!(tracker.sum(first), Some(7));
        assert_eq!(tracker.sum(second), Some(2));
        tracker.detach(first, None);
        assert!(!tracker.is_tracking(first));
        assert_eq!(tracker.sum(second), Some(2));
    }
}
