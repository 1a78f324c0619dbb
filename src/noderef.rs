//! Tagged child references and the node interface shared by both trees.

use std::cmp::Ordering;

use crate::key::LoadKey;

/// A child slot: nothing, a leaf record, or an owned inner node.
///
/// Leaves are never allocated; the record reference is stored in place.
#[derive(Debug)]
pub enum Ref<N> {
    /// Absent child.
    Empty,
    /// Leaf holding a record reference.
    Leaf(u64),
    /// Owned inner node.
    Inner(Box<N>),
}

impl<N> Default for Ref<N> {
    fn default() -> Self {
        Ref::Empty
    }
}

impl<N> Ref<N> {
    /// Make a leaf reference.
    #[inline]
    pub fn leaf(record: u64) -> Self {
        Ref::Leaf(record)
    }

    /// Whether this is an absent slot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Ref::Empty)
    }

    /// Whether this slot holds a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Ref::Leaf(_))
    }

    /// The record reference of a leaf slot.
    #[inline]
    pub fn leaf_value(&self) -> Option<u64> {
        match self {
            Ref::Leaf(record) => Some(*record),
            _ => None,
        }
    }

    /// The inner node of this slot.
    #[inline]
    pub fn as_inner(&self) -> Option<&N> {
        match self {
            Ref::Inner(node) => Some(&**node),
            _ => None,
        }
    }

    /// Move the content out, leaving the slot empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

/// Read-only view of an inner node used by cursors, integrity checks and
/// shape reports.
///
/// A *slot* is an opaque position inside the node. Slots visited through
/// [`RadixNode::slot_from`] come out in ascending key-byte order.
pub trait RadixNode: Sized {
    /// Number of populated children.
    fn count(&self) -> usize;

    /// Length of the compressed prefix in bytes.
    fn prefix_len(&self) -> usize;

    /// Three-way comparison of `key[depth..depth + prefix_len]` against the
    /// full prefix of this node.
    fn compare_prefix<L: LoadKey + ?Sized>(&self, key: &[u8], depth: usize, loader: &L) -> Ordering;

    /// First populated slot at or after `from`.
    fn slot_from(&self, from: usize) -> Option<usize>;

    /// First populated slot whose key byte is `>= byte`, and whether it is
    /// an exact match.
    fn seek(&self, byte: u8) -> Option<(usize, bool)>;

    /// Child stored at `slot`.
    fn child_at(&self, slot: usize) -> &Ref<Self>;

    /// Key byte of the child stored at `slot`.
    fn key_at(&self, slot: usize) -> u8;

    /// Estimated heap bytes held by this node, children excluded.
    fn footprint(&self) -> usize;

    /// Child references in key order.
    fn children(&self) -> Children<'_, Self> {
        Children { node: self, next: 0 }
    }

    /// A node is *inner* when none of its direct children is a leaf.
    fn is_inner(&self) -> bool {
        self.children().all(|(_, child)| !child.is_leaf())
    }
}

/// Iterator over `(key_byte, child)` pairs of a node.
pub struct Children<'a, N> {
    node: &'a N,
    next: usize,
}

impl<'a, N: RadixNode> Iterator for Children<'a, N> {
    type Item = (u8, &'a Ref<N>);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.node.slot_from(self.next)?;
        self.next = slot + 1;
        Some((self.node.key_at(slot), self.node.child_at(slot)))
    }
}

/// Record reference of the smallest leaf below `node`.
pub fn minimum_leaf<N: RadixNode>(node: &N) -> Option<u64> {
    let mut node = node;
    loop {
        let slot = node.slot_from(0)?;
        match node.child_at(slot) {
            Ref::Empty => return None,
            Ref::Leaf(record) => return Some(*record),
            Ref::Inner(child) => node = &**child,
        }
    }
}

/// Number of leaves reachable from `r`.
pub fn count_leaves<N: RadixNode>(r: &Ref<N>) -> usize {
    match r {
        Ref::Empty => 0,
        Ref::Leaf(_) => 1,
        Ref::Inner(node) => node.children().map(|(_, child)| count_leaves(child)).sum(),
    }
}
