//! Nodes of the indexed B-tree behind [`AList`](super::AList).
//!
//! A node is either a leaf holding items in order, or an inner node holding
//! child handles with cached subtree counts. Descent is by cumulative
//! counts: an index is narrowed to one child per level by subtracting the
//! counts of the children to its left. Rebalancing is classic B-tree:
//! overflow splits at half, underflow borrows from an adjacent sibling when
//! it has surplus and merges otherwise, and the tree only changes height at
//! the root.
//!
//! The mutation entry points ([`insert_node`], [`set_node`], [`remove_node`])
//! acquire each node on the descent path through [`exclusive`]: an
//! exclusively-held node is rewritten in place, a node shared with a
//! snapshot is cloned first and the clone recorded on the notifier, so the
//! owning list can raise the clear flag. Observer events fire in-line,
//! immediately after each structural change.

use smallvec::SmallVec;
use static_assertions::const_assert;

use super::observer::{NodeId, Notifier};
use crate::ReferenceCounter;
use crate::error::Error;

/// Maximum number of items a leaf holds before splitting.
pub(crate) const MAX_LEAF_ITEMS: usize = 32;
/// Maximum number of children an inner node holds before splitting.
pub(crate) const MAX_INNER_CHILDREN: usize = 8;
/// Minimum leaf occupancy (non-root); below this, rebalancing restores it.
const MIN_LEAF_ITEMS: usize = MAX_LEAF_ITEMS / 2;
/// Minimum inner-node occupancy (non-root).
const MIN_INNER_CHILDREN: usize = MAX_INNER_CHILDREN / 2;

const_assert!(MIN_INNER_CHILDREN >= 2);
const_assert!(MIN_LEAF_ITEMS >= 1);
// A merge of an underfull node and a no-surplus sibling must fit.
const_assert!(2 * MIN_LEAF_ITEMS <= MAX_LEAF_ITEMS);
const_assert!(2 * MIN_INNER_CHILDREN <= MAX_INNER_CHILDREN);

/// Shared handle to a node; cloning shares the whole subtree.
pub(crate) type NodeRef<T> = ReferenceCounter<Node<T>>;

// =============================================================================
// Node Definition
// =============================================================================

/// One node of the indexed tree.
///
/// Exposed read-only so observers can walk subtrees (see
/// [`TreeObserver::add_all`](super::TreeObserver::add_all)); construction
/// and mutation are internal to the crate.
#[derive(Clone)]
pub struct Node<T> {
    kind: Kind<T>,
}

#[derive(Clone)]
enum Kind<T> {
    Leaf {
        items: SmallVec<[T; MAX_LEAF_ITEMS]>,
    },
    Inner {
        children: SmallVec<[Child<T>; MAX_INNER_CHILDREN]>,
    },
}

/// A child handle with its cached subtree count. The cache is what makes
/// descent O(fan-out) per level instead of a subtree walk.
pub(crate) struct Child<T> {
    pub(crate) node: NodeRef<T>,
    pub(crate) count: usize,
}

impl<T> Child<T> {
    pub(crate) fn of(node: NodeRef<T>) -> Self {
        let count = node.count();
        Self { node, count }
    }
}

impl<T> Clone for Child<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            count: self.count,
        }
    }
}

impl<T> Node<T> {
    pub(crate) fn leaf(items: SmallVec<[T; MAX_LEAF_ITEMS]>) -> NodeRef<T> {
        ReferenceCounter::new(Self {
            kind: Kind::Leaf { items },
        })
    }

    pub(crate) fn inner(children: SmallVec<[Child<T>; MAX_INNER_CHILDREN]>) -> NodeRef<T> {
        ReferenceCounter::new(Self {
            kind: Kind::Inner { children },
        })
    }

    /// Number of items in this node's subtree.
    #[must_use]
    pub fn count(&self) -> usize {
        match &self.kind {
            Kind::Leaf { items } => items.len(),
            Kind::Inner { children } => children.iter().map(|child| child.count).sum(),
        }
    }

    /// Whether this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(&self.kind, Kind::Leaf { .. })
    }

    /// The items held directly by this node; empty for inner nodes.
    #[must_use]
    pub fn items(&self) -> &[T] {
        match &self.kind {
            Kind::Leaf { items } => items,
            Kind::Inner { .. } => &[],
        }
    }

    /// Iterates this node's direct children; empty for leaves.
    #[must_use]
    pub fn children(&self) -> Children<'_, T> {
        match &self.kind {
            Kind::Leaf { .. } => Children {
                inner: Default::default(),
            },
            Kind::Inner { children } => Children {
                inner: children.iter(),
            },
        }
    }

    /// The only child of a single-child inner node (the root-collapse case).
    pub(crate) fn sole_child(&self) -> Option<&NodeRef<T>> {
        match &self.kind {
            Kind::Inner { children } if children.len() == 1 => {
                children.first().map(|child| &child.node)
            }
            _ => None,
        }
    }

    /// Item at `index` within this subtree, by cumulative-count descent.
    pub(crate) fn get_at(&self, index: usize) -> Option<&T> {
        let mut node = self;
        let mut index = index;
        loop {
            match &node.kind {
                Kind::Leaf { items } => return items.get(index),
                Kind::Inner { children } => {
                    let mut next = None;
                    for child in children {
                        if index < child.count {
                            next = Some(child.node.as_ref());
                            break;
                        }
                        index -= child.count;
                    }
                    node = next?;
                }
            }
        }
    }

    fn is_underfull(&self) -> bool {
        match &self.kind {
            Kind::Leaf { items } => items.len() < MIN_LEAF_ITEMS,
            Kind::Inner { children } => children.len() < MIN_INNER_CHILDREN,
        }
    }

    fn has_surplus(&self) -> bool {
        match &self.kind {
            Kind::Leaf { items } => items.len() > MIN_LEAF_ITEMS,
            Kind::Inner { children } => children.len() > MIN_INNER_CHILDREN,
        }
    }
}

/// Iterator over a node's direct children.
pub struct Children<'a, T> {
    inner: std::slice::Iter<'a, Child<T>>,
}

impl<'a, T> Iterator for Children<'a, T> {
    type Item = &'a Node<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|child| child.node.as_ref())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Children<'_, T> {}

// =============================================================================
// Mutation
// =============================================================================

/// `make_mut` with bookkeeping: when the node is shared with a snapshot the
/// clone is recorded on the notifier, so the list raises the clear flag.
fn exclusive<'a, T: Clone>(
    reference: &'a mut NodeRef<T>,
    notifier: &Notifier<'_, T>,
) -> &'a mut Node<T> {
    if ReferenceCounter::strong_count(reference) > 1 {
        notifier.note_shared_clone();
    }
    ReferenceCounter::make_mut(reference)
}

/// Inserts `item` at `index` within the subtree. Returns the split-off
/// right sibling when the node overflowed; the caller links it in (or, at
/// the root, grows the tree by one level).
pub(crate) fn insert_node<T: Clone>(
    reference: &mut NodeRef<T>,
    index: usize,
    item: T,
    notifier: &Notifier<'_, T>,
) -> Option<Child<T>> {
    let node = exclusive(reference, notifier);
    let node_id = NodeId::of(node);
    match &mut node.kind {
        Kind::Leaf { items } => {
            items.insert(index, item);
            notifier.item_added(&items[index], node_id);
            if items.len() <= MAX_LEAF_ITEMS {
                return None;
            }
            let half = items.len() / 2;
            let right = Node::leaf(items.drain(half..).collect());
            let right_id = NodeId::of(right.as_ref());
            for moved in right.items() {
                notifier.item_removed(moved, node_id);
                notifier.item_added(moved, right_id);
            }
            Some(Child::of(right))
        }
        Kind::Inner { children } => {
            // First child that can absorb the position; `<=` lets an append
            // land at the end of the last child.
            let mut position = 0;
            let mut local = index;
            while local > children[position].count {
                local -= children[position].count;
                position += 1;
            }
            match insert_node(&mut children[position].node, local, item, notifier) {
                None => {
                    children[position].count += 1;
                    None
                }
                Some(new_child) => {
                    children[position].count = children[position].node.count();
                    let new_id = NodeId::of(new_child.node.as_ref());
                    children.insert(position + 1, new_child);
                    notifier.node_added(new_id, node_id);
                    if children.len() <= MAX_INNER_CHILDREN {
                        return None;
                    }
                    let half = children.len() / 2;
                    let right = Node::inner(children.drain(half..).collect());
                    let right_id = NodeId::of(right.as_ref());
                    for moved in right.children() {
                        let moved_id = NodeId::of(moved);
                        notifier.node_removed(moved_id, node_id);
                        notifier.node_added(moved_id, right_id);
                    }
                    Some(Child::of(right))
                }
            }
        }
    }
}

/// Replaces the item at `index` within the subtree, returning the previous
/// value. Reported to observers as a removal plus an addition in the same
/// leaf.
pub(crate) fn set_node<T: Clone>(
    reference: &mut NodeRef<T>,
    index: usize,
    value: T,
    notifier: &Notifier<'_, T>,
) -> Result<T, Error> {
    let node = exclusive(reference, notifier);
    let node_id = NodeId::of(node);
    match &mut node.kind {
        Kind::Leaf { items } => {
            let Some(slot) = items.get_mut(index) else {
                return Err(Error::InvalidState(
                    "cached count out of sync with leaf occupancy",
                ));
            };
            let previous = std::mem::replace(slot, value);
            notifier.item_removed(&previous, node_id);
            notifier.item_added(&items[index], node_id);
            Ok(previous)
        }
        Kind::Inner { children } => {
            let mut position = 0;
            let mut local = index;
            while local >= children[position].count {
                local -= children[position].count;
                position += 1;
            }
            set_node(&mut children[position].node, local, value, notifier)
        }
    }
}

/// Removes and returns the item at `index` within the subtree, rebalancing
/// any child that drops below minimum occupancy. The root itself is exempt
/// from the minimum; the caller collapses it when it thins out.
pub(crate) fn remove_node<T: Clone>(
    reference: &mut NodeRef<T>,
    index: usize,
    notifier: &Notifier<'_, T>,
) -> Result<T, Error> {
    let node = exclusive(reference, notifier);
    let node_id = NodeId::of(node);
    match &mut node.kind {
        Kind::Leaf { items } => {
            if index >= items.len() {
                return Err(Error::InvalidState(
                    "cached count out of sync with leaf occupancy",
                ));
            }
            let removed = items.remove(index);
            notifier.item_removed(&removed, node_id);
            Ok(removed)
        }
        Kind::Inner { children } => {
            let mut position = 0;
            let mut local = index;
            while local >= children[position].count {
                local -= children[position].count;
                position += 1;
            }
            let removed = remove_node(&mut children[position].node, local, notifier)?;
            children[position].count -= 1;
            if children[position].node.is_underfull() {
                rebalance(children, position, node_id, notifier)?;
            }
            Ok(removed)
        }
    }
}

/// Restores minimum occupancy of `children[position]`: borrow one entry
/// from an adjacent sibling with surplus, else merge with it.
fn rebalance<T: Clone>(
    children: &mut SmallVec<[Child<T>; MAX_INNER_CHILDREN]>,
    position: usize,
    parent: NodeId,
    notifier: &Notifier<'_, T>,
) -> Result<(), Error> {
    let sibling = if position > 0 { position - 1 } else { position + 1 };
    if sibling >= children.len() {
        // Single child under this node; the root-collapse path resolves it.
        return Ok(());
    }
    if children[sibling].node.has_surplus() {
        borrow_between(children, sibling, position, notifier)
    } else {
        merge_into_left(children, sibling.min(position), parent, notifier)
    }
}

/// Moves one boundary entry from `donor` to the adjacent `receiver`,
/// reporting the move through the item/node events.
fn borrow_between<T: Clone>(
    children: &mut SmallVec<[Child<T>; MAX_INNER_CHILDREN]>,
    donor: usize,
    receiver: usize,
    notifier: &Notifier<'_, T>,
) -> Result<(), Error> {
    let donor_is_left = donor < receiver;
    let (front, back) = children.split_at_mut(donor.max(receiver));
    let (donor_child, receiver_child) = if donor_is_left {
        (&mut front[donor], &mut back[0])
    } else {
        (&mut back[0], &mut front[receiver])
    };
    let donor_node = exclusive(&mut donor_child.node, notifier);
    let receiver_node = exclusive(&mut receiver_child.node, notifier);
    let donor_id = NodeId::of(donor_node);
    let receiver_id = NodeId::of(receiver_node);
    let moved_count = match (&mut donor_node.kind, &mut receiver_node.kind) {
        (Kind::Leaf { items: donor_items }, Kind::Leaf { items: receiver_items }) => {
            if donor_items.is_empty() {
                return Err(Error::InvalidState("borrow from an empty sibling"));
            }
            let item = if donor_is_left {
                donor_items.remove(donor_items.len() - 1)
            } else {
                donor_items.remove(0)
            };
            notifier.item_removed(&item, donor_id);
            if donor_is_left {
                receiver_items.insert(0, item);
            } else {
                receiver_items.push(item);
            }
            let landed = if donor_is_left {
                receiver_items.first()
            } else {
                receiver_items.last()
            };
            if let Some(moved) = landed {
                notifier.item_added(moved, receiver_id);
            }
            1
        }
        (
            Kind::Inner {
                children: donor_children,
            },
            Kind::Inner {
                children: receiver_children,
            },
        ) => {
            if donor_children.is_empty() {
                return Err(Error::InvalidState("borrow from an empty sibling"));
            }
            let moved = if donor_is_left {
                donor_children.remove(donor_children.len() - 1)
            } else {
                donor_children.remove(0)
            };
            let moved_id = NodeId::of(moved.node.as_ref());
            let count = moved.count;
            notifier.node_removed(moved_id, donor_id);
            if donor_is_left {
                receiver_children.insert(0, moved);
            } else {
                receiver_children.push(moved);
            }
            notifier.node_added(moved_id, receiver_id);
            count
        }
        _ => return Err(Error::InvalidState("sibling nodes of mismatched depth")),
    };
    donor_child.count -= moved_count;
    receiver_child.count += moved_count;
    Ok(())
}

/// Merges `children[left + 1]` into `children[left]`, dropping the emptied
/// right node from the parent.
fn merge_into_left<T: Clone>(
    children: &mut SmallVec<[Child<T>; MAX_INNER_CHILDREN]>,
    left: usize,
    parent: NodeId,
    notifier: &Notifier<'_, T>,
) -> Result<(), Error> {
    if children[left].node.is_leaf() != children[left + 1].node.is_leaf() {
        return Err(Error::InvalidState("sibling nodes of mismatched depth"));
    }
    let mut right_child = children.remove(left + 1);
    let merged_count = right_child.count;
    let right_node = exclusive(&mut right_child.node, notifier);
    let right_id = NodeId::of(right_node);
    let left_node = exclusive(&mut children[left].node, notifier);
    let left_id = NodeId::of(left_node);
    match (&mut left_node.kind, &mut right_node.kind) {
        (Kind::Leaf { items: left_items }, Kind::Leaf { items: right_items }) => {
            for item in right_items.drain(..) {
                notifier.item_removed(&item, right_id);
                left_items.push(item);
                if let Some(moved) = left_items.last() {
                    notifier.item_added(moved, left_id);
                }
            }
        }
        (
            Kind::Inner {
                children: left_inner,
            },
            Kind::Inner {
                children: right_inner,
            },
        ) => {
            for child in right_inner.drain(..) {
                let moved_id = NodeId::of(child.node.as_ref());
                notifier.node_removed(moved_id, right_id);
                left_inner.push(child);
                notifier.node_added(moved_id, left_id);
            }
        }
        _ => return Err(Error::InvalidState("sibling nodes of mismatched depth")),
    }
    children[left].count += merged_count;
    notifier.node_removed(right_id, parent);
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
