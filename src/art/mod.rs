//! Adaptive Radix Tree used as the write buffer of the hybrid index.
//!
//! Based on "The Adaptive Radix Tree: ARTful Indexing for Main-Memory Databases"
//! by Leis et al., 2013.
//!
//! Key features:
//! - Adaptive node sizes (4, 16, 48, 256 children) with grow/shrink hysteresis
//! - Path compression with a 9-byte inline prefix
//! - Leaves are record references; full keys come from a [`LoadKey`]

mod debug;
mod node;

use serde::Serialize;
use tracing::trace;

use crate::cursor::Cursor;
use crate::histogram::{self, ShapeHistogram};
use crate::key::{self, LoadKey};
use crate::noderef::{RadixNode, Ref};

pub use node::{DynRef, Node, NodeType, MAX_PREFIX_LEN};

/// Per-layout node counts and memory estimate of a dynamic tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DynamicStats {
    /// Number of Node4 instances
    pub node4: usize,
    /// Number of Node16 instances
    pub node16: usize,
    /// Number of Node48 instances
    pub node48: usize,
    /// Number of Node256 instances
    pub node256: usize,
    /// Estimated bytes held by inner nodes
    pub memory_bytes: usize,
}

impl DynamicStats {
    fn counter(&mut self, node_type: NodeType) -> &mut usize {
        match node_type {
            NodeType::Node4 => &mut self.node4,
            NodeType::Node16 => &mut self.node16,
            NodeType::Node48 => &mut self.node48,
            NodeType::Node256 => &mut self.node256,
        }
    }

    pub(crate) fn alloc(&mut self, node_type: NodeType) {
        *self.counter(node_type) += 1;
        self.memory_bytes += node_type.footprint();
    }

    pub(crate) fn free(&mut self, node_type: NodeType) {
        *self.counter(node_type) -= 1;
        self.memory_bytes -= node_type.footprint();
    }

    pub(crate) fn replace(&mut self, from: NodeType, to: NodeType) {
        self.free(from);
        self.alloc(to);
    }

    /// Total number of inner nodes.
    pub fn nodes(&self) -> usize {
        self.node4 + self.node16 + self.node48 + self.node256
    }
}

/// Mutable adaptive radix tree over fixed-length keys.
///
/// The tree stores record references only; every operation takes the
/// loader that maps a record back to its key.
pub struct DynamicTree {
    root: DynRef,
    key_len: usize,
    len: usize,
    stats: DynamicStats,
}

impl DynamicTree {
    /// Create an empty tree for keys of `key_len` bytes.
    pub fn new(key_len: usize) -> Self {
        Self {
            root: Ref::Empty,
            key_len,
            len: 0,
            stats: DynamicStats::default(),
        }
    }

    /// Key length of this tree.
    pub fn key_len(&self) -> usize {
        self.key_len
    }

    /// Number of records in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Node counts and memory estimate.
    pub fn stats(&self) -> &DynamicStats {
        &self.stats
    }

    pub(crate) fn root(&self) -> &DynRef {
        &self.root
    }

    /// Give up the nodes, leaving an empty tree behind.
    pub(crate) fn take_root(&mut self) -> (DynRef, usize) {
        let len = self.len;
        self.len = 0;
        self.stats = DynamicStats::default();
        (self.root.take(), len)
    }

    /// Insert `record` under `key`.
    ///
    /// Returns `false` without touching the tree when the key is already
    /// present; use [`DynamicTree::upsert`] to overwrite.
    pub fn insert<L: LoadKey + ?Sized>(&mut self, key: &[u8], record: u64, loader: &L) -> bool {
        debug_assert_eq!(key.len(), self.key_len);
        let inserted = insert_at(&mut self.root, key, 0, record, loader, &mut self.stats);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Optimistic point lookup.
    ///
    /// Prefixes longer than the inline capacity are skipped during descent
    /// and the whole key is compared at the leaf instead.
    pub fn get<L: LoadKey + ?Sized>(&self, key: &[u8], loader: &L) -> Option<u64> {
        let mut node = &self.root;
        let mut depth = 0;
        let mut skipped = false;
        loop {
            match node {
                Ref::Empty => return None,
                Ref::Leaf(record) => {
                    let from = if skipped { 0 } else { depth };
                    return key::leaf_matches(loader, *record, key, from).then_some(*record);
                }
                Ref::Inner(inner) => {
                    let len = inner.prefix_len();
                    if len > 0 {
                        if len <= MAX_PREFIX_LEN {
                            if key.get(depth..depth + len) != Some(inner.inline_prefix()) {
                                return None;
                            }
                        } else {
                            skipped = true;
                        }
                        depth += len;
                    }
                    node = inner.find_child(*key.get(depth)?)?;
                    depth += 1;
                }
            }
        }
    }

    /// Point lookup that validates every prefix byte on the way down.
    pub fn get_pessimistic<L: LoadKey + ?Sized>(&self, key: &[u8], loader: &L) -> Option<u64> {
        let mut node = &self.root;
        let mut depth = 0;
        loop {
            match node {
                Ref::Empty => return None,
                Ref::Leaf(record) => {
                    return key::leaf_matches(loader, *record, key, depth).then_some(*record);
                }
                Ref::Inner(inner) => {
                    let len = inner.prefix_len();
                    if len > 0 {
                        if depth + len > key.len() || inner.prefix_mismatch(key, depth, loader) != len {
                            return None;
                        }
                        depth += len;
                    }
                    node = inner.find_child(*key.get(depth)?)?;
                    depth += 1;
                }
            }
        }
    }

    /// Overwrite the record stored under `key`. Returns whether it was found.
    pub fn update<L: LoadKey + ?Sized>(&mut self, key: &[u8], record: u64, loader: &L) -> bool {
        update_at(&mut self.root, key, 0, false, record, loader)
    }

    /// Overwrite `key` if present, insert it otherwise.
    pub fn upsert<L: LoadKey + ?Sized>(&mut self, key: &[u8], record: u64, loader: &L) {
        if !self.update(key, record, loader) {
            self.insert(key, record, loader);
        }
    }

    /// Remove `key`. Returns whether a record was removed.
    pub fn erase<L: LoadKey + ?Sized>(&mut self, key: &[u8], loader: &L) -> bool {
        debug_assert_eq!(key.len(), self.key_len);
        let erased = erase_at(&mut self.root, key, 0, loader, &mut self.stats);
        if erased {
            self.len -= 1;
        }
        erased
    }

    /// Cursor at the first key `>= key`.
    pub fn lower_bound<'a, L: LoadKey + ?Sized>(&'a self, key: &[u8], loader: &L) -> Cursor<'a, Node> {
        Cursor::lower_bound(&self.root, key, loader)
    }

    /// Cursor over the whole tree in key order.
    pub fn iter(&self) -> Cursor<'_, Node> {
        Cursor::first(&self.root)
    }

    /// Prefix-length distribution and node byte split of the tree.
    pub fn shape_histogram(&self) -> ShapeHistogram {
        histogram::shape_histogram(&self.root)
    }
}

impl Default for DynamicTree {
    fn default() -> Self {
        Self::new(8)
    }
}

fn insert_at<L: LoadKey + ?Sized>(
    slot: &mut DynRef,
    key: &[u8],
    mut depth: usize,
    record: u64,
    loader: &L,
    stats: &mut DynamicStats,
) -> bool {
    let node = match slot {
        Ref::Empty => {
            *slot = Ref::Leaf(record);
            return true;
        }
        Ref::Leaf(existing) => {
            let existing = *existing;
            let existing_key = key::load(loader, existing, key.len());
            let common = key::common_prefix_len(&existing_key[depth..], &key[depth..]);
            if depth + common >= key.len() {
                return false;
            }
            let mut node = Node::new4();
            stats.alloc(NodeType::Node4);
            node.set_prefix(&key[depth..], common);
            node.add_child(existing_key[depth + common], Ref::Leaf(existing), stats);
            node.add_child(key[depth + common], Ref::Leaf(record), stats);
            *slot = Ref::Inner(Box::new(node));
            return true;
        }
        Ref::Inner(node) => node,
    };

    let prefix_len = node.prefix_len();
    if prefix_len > 0 {
        let mismatch = node.prefix_mismatch(key, depth, loader);
        if mismatch < prefix_len {
            if let Ref::Inner(old) = slot.take() {
                *slot = Ref::Inner(split_prefix(old, key, depth, mismatch, record, loader, stats));
            }
            return true;
        }
        depth += prefix_len;
    }

    let byte = key[depth];
    if let Some(child) = node.find_child_mut(byte) {
        return insert_at(child, key, depth + 1, record, loader, stats);
    }
    node.add_child(byte, Ref::Leaf(record), stats);
    true
}

/// Put a new Node4 above `old` holding the first `mismatch` prefix bytes,
/// with `old` and the new leaf as its two branches.
fn split_prefix<L: LoadKey + ?Sized>(
    mut old: Box<Node>,
    key: &[u8],
    depth: usize,
    mismatch: usize,
    record: u64,
    loader: &L,
    stats: &mut DynamicStats,
) -> Box<Node> {
    let mut parent = Node::new4();
    stats.alloc(NodeType::Node4);
    parent.set_prefix(old.inline_prefix(), mismatch);

    let old_len = old.prefix_len();
    let remaining = old_len - mismatch - 1;
    let branch = if old_len <= MAX_PREFIX_LEN {
        let branch = old.prefix[mismatch];
        old.prefix.copy_within(mismatch + 1..old_len, 0);
        branch
    } else {
        let min_key = old.full_prefix(depth, key.len(), loader);
        let stored = remaining.min(MAX_PREFIX_LEN);
        old.prefix[..stored].copy_from_slice(&min_key[mismatch + 1..mismatch + 1 + stored]);
        min_key[mismatch]
    };
    old.prefix_len = remaining as u32;

    parent.add_child(branch, Ref::Inner(old), stats);
    parent.add_child(key[depth + mismatch], Ref::Leaf(record), stats);
    Box::new(parent)
}

fn update_at<L: LoadKey + ?Sized>(
    slot: &mut DynRef,
    key: &[u8],
    mut depth: usize,
    mut skipped: bool,
    record: u64,
    loader: &L,
) -> bool {
    match slot {
        Ref::Empty => false,
        Ref::Leaf(existing) => {
            let from = if skipped { 0 } else { depth };
            if !key::leaf_matches(loader, *existing, key, from) {
                return false;
            }
            *existing = record;
            true
        }
        Ref::Inner(node) => {
            let len = node.prefix_len();
            if len > 0 {
                if len <= MAX_PREFIX_LEN {
                    if key.get(depth..depth + len) != Some(node.inline_prefix()) {
                        return false;
                    }
                } else {
                    skipped = true;
                }
                depth += len;
            }
            let Some(&byte) = key.get(depth) else {
                return false;
            };
            match node.find_child_mut(byte) {
                Some(child) => update_at(child, key, depth + 1, skipped, record, loader),
                None => false,
            }
        }
    }
}

fn erase_at<L: LoadKey + ?Sized>(
    slot: &mut DynRef,
    key: &[u8],
    mut depth: usize,
    loader: &L,
    stats: &mut DynamicStats,
) -> bool {
    let node = match slot {
        Ref::Empty => return false,
        Ref::Leaf(record) => {
            // Only reached when the root itself is a leaf.
            if !key::leaf_matches(loader, *record, key, depth) {
                return false;
            }
            *slot = Ref::Empty;
            return true;
        }
        Ref::Inner(node) => node,
    };

    let prefix_len = node.prefix_len();
    if prefix_len > 0 {
        if node.prefix_mismatch(key, depth, loader) != prefix_len {
            return false;
        }
        depth += prefix_len;
    }

    let byte = key[depth];
    let Some(child) = node.find_child_mut(byte) else {
        return false;
    };
    let hit = match child {
        Ref::Leaf(record) => key::leaf_matches(loader, *record, key, depth + 1),
        _ => false,
    };
    if !hit {
        return erase_at(child, key, depth + 1, loader, stats);
    }

    node.remove_child(byte, stats);
    if node.node_type() == NodeType::Node4 && node.count() == 1 {
        collapse(slot, stats);
    }
    true
}

/// Replace a one-way Node4 in `slot` with its only child.
fn collapse(slot: &mut DynRef, stats: &mut DynamicStats) {
    let Ref::Inner(mut parent) = slot.take() else {
        return;
    };
    let (byte, mut child) = parent.take_only_child();
    if let Ref::Inner(inner) = &mut child {
        inner.absorb_prefix(&parent, byte);
    }
    stats.free(NodeType::Node4);
    trace!(byte, leaf = child.is_leaf(), "collapse");
    *slot = child;
}
