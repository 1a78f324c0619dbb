//! Static radix tree holding the bulk of the index.
//!
//! The static tree is never edited in place. It is produced whole by
//! freezing a dynamic tree ([`StaticTree::freeze`]) and replaced whole by
//! merging a newer frozen tree into it ([`StaticTree::merge`]).
//!
//! Trade-offs:
//! - Nodes are sized exactly at construction; no spare capacity
//! - Leaf-adjacent nodes use sorted arrays, interior nodes 256-way arrays
//! - Prefixes are stored in full, so lookups only load a key at the leaf

mod freeze;
mod merge;
mod node;

use serde::Serialize;

use crate::cursor::Cursor;
use crate::histogram::{self, ShapeHistogram};
use crate::key::{self, LoadKey};
use crate::noderef::{self, RadixNode, Ref};

pub use merge::MergeOutcome;
pub use node::{ShapePolicy, StaticNode, StaticRef, StaticType, UniversalNode};

/// Per-shape node counts and memory estimate of a static tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaticStats {
    /// Number of Dense nodes
    pub dense: usize,
    /// Number of DensePrefix nodes
    pub dense_prefix: usize,
    /// Number of Full nodes
    pub full: usize,
    /// Number of FullPrefix nodes
    pub full_prefix: usize,
    /// Estimated bytes held by inner nodes
    pub memory_bytes: usize,
}

impl StaticStats {
    fn collect(r: &StaticRef) -> Self {
        let mut stats = Self::default();
        stats.visit(r);
        stats
    }

    fn visit(&mut self, r: &StaticRef) {
        let Ref::Inner(node) = r else {
            return;
        };
        match node.static_type() {
            StaticType::Dense => self.dense += 1,
            StaticType::DensePrefix => self.dense_prefix += 1,
            StaticType::Full => self.full += 1,
            StaticType::FullPrefix => self.full_prefix += 1,
            StaticType::Universal => {}
        }
        self.memory_bytes += node.footprint();
        for (_, child) in node.children() {
            self.visit(child);
        }
    }

    /// Total number of inner nodes.
    pub fn nodes(&self) -> usize {
        self.dense + self.dense_prefix + self.full + self.full_prefix
    }
}

/// Immutable radix tree over fixed-length keys.
pub struct StaticTree {
    root: StaticRef,
    key_len: usize,
    len: usize,
    stats: StaticStats,
}

impl StaticTree {
    /// Create an empty tree for keys of `key_len` bytes.
    pub fn new(key_len: usize) -> Self {
        Self {
            root: Ref::Empty,
            key_len,
            len: 0,
            stats: StaticStats::default(),
        }
    }

    fn from_root(root: StaticRef, key_len: usize, len: usize) -> Self {
        let stats = StaticStats::collect(&root);
        Self {
            root,
            key_len,
            len,
            stats,
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

    /// Node counts and memory estimate, taken when the tree was built.
    pub fn stats(&self) -> &StaticStats {
        &self.stats
    }

    pub(crate) fn root(&self) -> &StaticRef {
        &self.root
    }

    /// Point lookup.
    pub fn get<L: LoadKey + ?Sized>(&self, key: &[u8], loader: &L) -> Option<u64> {
        let mut r = &self.root;
        let mut depth = 0;
        loop {
            match r {
                Ref::Empty => return None,
                Ref::Leaf(record) => {
                    return key::leaf_matches(loader, *record, key, depth).then_some(*record);
                }
                Ref::Inner(node) => {
                    let prefix = node.prefix();
                    if !prefix.is_empty() {
                        if key.get(depth..depth + prefix.len()) != Some(prefix) {
                            return None;
                        }
                        depth += prefix.len();
                    }
                    r = node.find_child(*key.get(depth)?)?;
                    depth += 1;
                }
            }
        }
    }

    /// Cursor at the first key `>= key`.
    pub fn lower_bound<'a, L: LoadKey + ?Sized>(&'a self, key: &[u8], loader: &L) -> Cursor<'a, StaticNode> {
        Cursor::lower_bound(&self.root, key, loader)
    }

    /// Cursor over the whole tree in key order.
    pub fn iter(&self) -> Cursor<'_, StaticNode> {
        Cursor::first(&self.root)
    }

    /// Prefix-length distribution and node byte split of the tree.
    pub fn shape_histogram(&self) -> ShapeHistogram {
        histogram::shape_histogram(&self.root)
    }

    /// Verify structural invariants; returns the problems found.
    pub fn verify_integrity(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let leaves = noderef::count_leaves(&self.root);
        if leaves != self.len {
            issues.push(format!("len is {} but {} leaves are reachable", self.len, leaves));
        }
        Self::verify_node(&self.root, &mut issues);
        issues
    }

    fn verify_node(r: &StaticRef, issues: &mut Vec<String>) {
        let Ref::Inner(node) = r else {
            return;
        };
        if node.static_type() == StaticType::Universal {
            issues.push(format!("scratch node left in tree: {:?}", node));
        }
        let keys: Vec<u8> = node.children().map(|(byte, _)| byte).collect();
        if keys.len() != node.count() {
            issues.push(format!("{:?} has {} populated slots", node, keys.len()));
        }
        if !keys.windows(2).all(|w| w[0] < w[1]) {
            issues.push(format!("{:?} keys not ascending: {:?}", node, keys));
        }
        if node.children().any(|(_, child)| child.is_empty()) {
            issues.push(format!("{:?} holds an empty child", node));
        }
        match node.static_type() {
            StaticType::Dense | StaticType::Full if node.prefix_len() > 0 => {
                issues.push(format!("{:?} has a prefix", node));
            }
            StaticType::DensePrefix | StaticType::FullPrefix if node.prefix_len() == 0 => {
                issues.push(format!("{:?} has an empty prefix", node));
            }
            _ => {}
        }
        for (_, child) in node.children() {
            Self::verify_node(child, issues);
        }
    }

    /// [`StaticTree::verify_integrity`] plus a check that every leaf sits
    /// under the path of prefixes and branch bytes leading to it.
    pub fn verify_integrity_with<L: LoadKey + ?Sized>(&self, loader: &L) -> Vec<String> {
        let mut issues = self.verify_integrity();
        let mut path = Vec::with_capacity(self.key_len);
        self.verify_keys(&self.root, &mut path, loader, &mut issues);
        issues
    }

    fn verify_keys<L: LoadKey + ?Sized>(&self, r: &StaticRef, path: &mut Vec<u8>, loader: &L, issues: &mut Vec<String>) {
        match r {
            Ref::Empty => {}
            Ref::Leaf(record) => {
                let leaf_key = key::load(loader, *record, self.key_len);
                if !leaf_key.starts_with(path.as_slice()) {
                    issues.push(format!("leaf {} is not under path {:?}", record, path));
                }
            }
            Ref::Inner(node) => {
                let depth = path.len();
                path.extend_from_slice(node.prefix());
                for (byte, child) in node.children() {
                    path.push(byte);
                    self.verify_keys(child, path, loader, issues);
                    path.pop();
                }
                path.truncate(depth);
            }
        }
    }
}

impl Default for StaticTree {
    fn default() -> Self {
        Self::new(8)
    }
}
