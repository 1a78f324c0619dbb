//! Merging two static trees into one.
//!
//! Both inputs are consumed. Nodes are opened into [`UniversalNode`]s,
//! prefixes are reconciled by pushing any non-shared tail one level down,
//! then children are merged pairwise by key byte. Where both trees hold the
//! same key the newer record wins.

use tracing::debug;

use super::node::{ShapePolicy, StaticNode, StaticRef, StaticType, UniversalNode};
use super::StaticTree;
use crate::key::{self, KeyBuf, LoadKey};
use crate::noderef::{RadixNode, Ref};

/// Summary of a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Records in the merged tree.
    pub items: usize,
    /// Keys present in both inputs; the newer record was kept.
    pub collisions: usize,
}

struct Merger<'a, L: ?Sized> {
    loader: &'a L,
    key_len: usize,
    policy: &'a ShapePolicy,
    collisions: usize,
}

impl<L: LoadKey + ?Sized> Merger<'_, L> {
    /// Merge two subtrees hanging at key offset `depth`.
    fn merge_refs(&mut self, newer: StaticRef, older: StaticRef, depth: usize) -> StaticRef {
        match (newer, older) {
            (Ref::Empty, other) | (other, Ref::Empty) => self.finish(other),
            (Ref::Leaf(a), Ref::Leaf(b)) => self.merge_leaves(a, b, depth),
            (Ref::Leaf(a), Ref::Inner(node)) => {
                let wrapped = self.wrap_leaf(a, node.prefix_len(), depth);
                self.merge_nodes(wrapped, (*node).into_universal(), depth, KeyBuf::new())
            }
            (Ref::Inner(node), Ref::Leaf(b)) => {
                let wrapped = self.wrap_leaf(b, node.prefix_len(), depth);
                self.merge_nodes((*node).into_universal(), wrapped, depth, KeyBuf::new())
            }
            (Ref::Inner(a), Ref::Inner(b)) => {
                self.merge_nodes((*a).into_universal(), (*b).into_universal(), depth, KeyBuf::new())
            }
        }
    }

    fn merge_leaves(&mut self, newer: u64, older: u64, depth: usize) -> StaticRef {
        let newer_key = key::load(self.loader, newer, self.key_len);
        let older_key = key::load(self.loader, older, self.key_len);
        let split = depth + key::common_prefix_len(&newer_key[depth..], &older_key[depth..]);
        if split >= self.key_len {
            self.collisions += 1;
            return Ref::Leaf(newer);
        }
        let mut node = UniversalNode {
            prefix: KeyBuf::from_slice(&newer_key[depth..split]),
            ..UniversalNode::default()
        };
        let a = (newer_key[split], Ref::Leaf(newer));
        let b = (older_key[split], Ref::Leaf(older));
        let (low, high) = if a.0 < b.0 { (a, b) } else { (b, a) };
        node.push(low.0, low.1);
        node.push(high.0, high.1);
        self.emit(node)
    }

    /// A one-child node holding `record`, with a prefix as long as that of
    /// the node it is about to be merged with.
    fn wrap_leaf(&self, record: u64, prefix_len: usize, depth: usize) -> UniversalNode {
        let leaf_key = key::load(self.loader, record, self.key_len);
        let branch = depth + prefix_len;
        UniversalNode::single(&leaf_key[depth..branch], leaf_key[branch], Ref::Leaf(record))
    }

    fn merge_nodes(
        &mut self,
        newer: UniversalNode,
        older: UniversalNode,
        depth: usize,
        mut inherited: KeyBuf,
    ) -> StaticRef {
        if !newer.prefix.is_empty() || !older.prefix.is_empty() {
            let common = key::common_prefix_len(&newer.prefix, &older.prefix);
            inherited.extend_from_slice(&newer.prefix[..common]);
            let newer = push_down_prefix(newer, common);
            let older = push_down_prefix(older, common);
            return self.merge_nodes(newer, older, depth + common, inherited);
        }

        let UniversalNode {
            keys: newer_keys,
            children: mut newer_children,
            ..
        } = newer;
        let UniversalNode {
            keys: older_keys,
            children: mut older_children,
            ..
        } = older;

        let mut out = UniversalNode {
            prefix: inherited,
            ..UniversalNode::default()
        };
        let (mut i, mut j) = (0, 0);
        loop {
            match (newer_keys.get(i).copied(), older_keys.get(j).copied()) {
                (Some(a), Some(b)) if a == b => {
                    let newer_child = newer_children[i].take();
                    let older_child = older_children[j].take();
                    out.push(a, self.merge_refs(newer_child, older_child, depth + 1));
                    i += 1;
                    j += 1;
                }
                (Some(a), b) if b.map_or(true, |b| a < b) => {
                    out.push(a, self.finish(newer_children[i].take()));
                    i += 1;
                }
                (_, Some(b)) => {
                    out.push(b, self.finish(older_children[j].take()));
                    j += 1;
                }
                _ => break,
            }
        }
        self.emit(out)
    }

    /// Turn a subtree copied from one side into final static shapes.
    fn finish(&self, r: StaticRef) -> StaticRef {
        match r {
            Ref::Inner(node) if node.static_type() == StaticType::Universal => {
                let mut node = (*node).into_universal();
                node.children = node.children.into_iter().map(|child| self.finish(child)).collect();
                self.emit(node)
            }
            other => other,
        }
    }

    /// Build the final node, folding one-way nodes into their child.
    fn emit(&self, mut node: UniversalNode) -> StaticRef {
        if node.keys.len() == 1 {
            return match node.children.pop() {
                Some(Ref::Inner(child)) => {
                    let mut child = (*child).into_universal();
                    let mut prefix = std::mem::take(&mut node.prefix);
                    prefix.push(node.keys[0]);
                    prefix.extend_from_slice(&child.prefix);
                    child.prefix = prefix;
                    self.emit(child)
                }
                Some(leaf) => leaf,
                None => Ref::Empty,
            };
        }
        if node.keys.is_empty() {
            return Ref::Empty;
        }
        Ref::Inner(Box::new(StaticNode::from_universal(node, self.policy)))
    }
}

/// Keep `node.prefix[..at]` for the caller. Anything after it moves into a
/// one-child wrapper keyed by `node.prefix[at]`.
fn push_down_prefix(mut node: UniversalNode, at: usize) -> UniversalNode {
    if node.prefix.len() == at {
        node.prefix.clear();
        return node;
    }
    let byte = node.prefix[at];
    node.prefix = KeyBuf::from_slice(&node.prefix[at + 1..]);
    UniversalNode::single(&[], byte, Ref::Inner(Box::new(StaticNode::Universal(node))))
}

impl StaticTree {
    /// Merge `newer` into `older`, consuming both. Records of `newer` win
    /// on equal keys.
    pub fn merge<L: LoadKey + ?Sized>(
        newer: StaticTree,
        older: StaticTree,
        loader: &L,
        policy: &ShapePolicy,
    ) -> (StaticTree, MergeOutcome) {
        debug_assert_eq!(newer.key_len, older.key_len);
        let key_len = older.key_len;
        let total = newer.len + older.len;
        let mut merger = Merger {
            loader,
            key_len,
            policy,
            collisions: 0,
        };
        let root = merger.merge_refs(newer.root, older.root, 0);
        let outcome = MergeOutcome {
            items: total - merger.collisions,
            collisions: merger.collisions,
        };
        let tree = StaticTree::from_root(root, key_len, outcome.items);
        debug!(
            items = outcome.items,
            collisions = outcome.collisions,
            static_nodes = tree.stats.nodes(),
            memory = tree.stats.memory_bytes,
            "merged static trees"
        );
        (tree, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::art::DynamicTree;
    use crate::key::{encode_u64, BigEndianU64};

    fn frozen_with(values: impl IntoIterator<Item = u64>, loader: &impl LoadKey) -> StaticTree {
        let mut dynamic = DynamicTree::new(8);
        for v in values {
            dynamic.insert(&key::load(loader, v, 8), v, loader);
        }
        let tree = StaticTree::freeze(&mut dynamic, loader, &ShapePolicy::default());
        assert_eq!(tree.verify_integrity_with(loader), Vec::<String>::new());
        tree
    }

    fn merged(newer: StaticTree, older: StaticTree, loader: &impl LoadKey) -> (StaticTree, MergeOutcome) {
        let (tree, outcome) = StaticTree::merge(newer, older, loader, &ShapePolicy::default());
        assert_eq!(tree.verify_integrity_with(loader), Vec::<String>::new());
        (tree, outcome)
    }

    #[test]
    fn test_merge_disjoint_ranges() {
        let newer = frozen_with(1000..2000, &BigEndianU64);
        let older = frozen_with(0..1000, &BigEndianU64);
        let (tree, outcome) = merged(newer, older, &BigEndianU64);
        assert_eq!(outcome, MergeOutcome { items: 2000, collisions: 0 });
        assert_eq!(tree.iter().collect::<Vec<_>>(), (0..2000).collect::<Vec<_>>());
    }

    #[test]
    fn test_merge_interleaved_keys() {
        let newer = frozen_with((0..3000).filter(|v| v % 3 == 0), &BigEndianU64);
        let older = frozen_with((0..3000).filter(|v| v % 3 != 0), &BigEndianU64);
        let (tree, _) = merged(newer, older, &BigEndianU64);
        for v in 0..3000 {
            assert_eq!(tree.get(&encode_u64(v), &BigEndianU64), Some(v));
        }
        assert_eq!(tree.len(), 3000);
    }

    #[test]
    fn test_merge_newer_record_wins() {
        // Records above one million share the key of `record % 1_000_000`.
        let loader = |record: u64, out: &mut [u8]| out.copy_from_slice(&encode_u64(record % 1_000_000));
        let older = frozen_with(0..500, &loader);
        let newer = frozen_with((250..750).map(|v| v + 1_000_000), &loader);
        let (tree, outcome) = merged(newer, older, &loader);
        assert_eq!(outcome.collisions, 250);
        assert_eq!(tree.len(), 750);
        assert_eq!(tree.get(&encode_u64(100), &loader), Some(100));
        assert_eq!(tree.get(&encode_u64(300), &loader), Some(1_000_300));
        assert_eq!(tree.get(&encode_u64(700), &loader), Some(1_000_700));
        assert_eq!(tree.iter().count(), 750);
    }

    #[test]
    fn test_merge_splits_prefixes() {
        // Root prefixes 00 00 00 00 01 00 00 and 00 00 00 00 02 00 share four bytes.
        let newer = frozen_with([0x0100_0001, 0x0100_0002], &BigEndianU64);
        let older = frozen_with([0x0200_0001, 0x0200_0002, 0x0200_0100], &BigEndianU64);
        let (tree, _) = merged(newer, older, &BigEndianU64);
        let root = tree.root().as_inner().map(|node| node.prefix().to_vec());
        assert_eq!(root, Some(vec![0, 0, 0, 0]));
        assert_eq!(
            tree.iter().collect::<Vec<_>>(),
            vec![0x0100_0001, 0x0100_0002, 0x0200_0001, 0x0200_0002, 0x0200_0100]
        );
    }

    #[test]
    fn test_merge_leaf_into_subtree() {
        let newer = frozen_with([0x0101], &BigEndianU64);
        let older = frozen_with([0x0100, 0x0102, 0x0200], &BigEndianU64);
        let (tree, outcome) = merged(newer, older, &BigEndianU64);
        assert_eq!(outcome.items, 4);
        assert_eq!(tree.iter().collect::<Vec<_>>(), vec![0x0100, 0x0101, 0x0102, 0x0200]);

        let newer = frozen_with([0x0100, 0x0102], &BigEndianU64);
        let older = frozen_with([0x0900_0000], &BigEndianU64);
        assert_eq!(older.root().leaf_value(), Some(0x0900_0000));
        let (tree, _) = merged(newer, older, &BigEndianU64);
        assert_eq!(tree.iter().collect::<Vec<_>>(), vec![0x0100, 0x0102, 0x0900_0000]);
        // Shared bytes 0..4 stay compressed instead of one node per byte.
        assert_eq!(tree.root().as_inner().map(RadixNode::prefix_len), Some(4));
    }

    #[test]
    fn test_merge_with_empty_sides() {
        let (tree, outcome) = merged(StaticTree::new(8), frozen_with(0..10, &BigEndianU64), &BigEndianU64);
        assert_eq!(outcome, MergeOutcome { items: 10, collisions: 0 });
        assert_eq!(tree.iter().collect::<Vec<_>>(), (0..10).collect::<Vec<_>>());

        let (tree, _) = merged(frozen_with(0..10, &BigEndianU64), StaticTree::new(8), &BigEndianU64);
        assert_eq!(tree.len(), 10);

        let (tree, _) = merged(StaticTree::new(8), StaticTree::new(8), &BigEndianU64);
        assert!(tree.is_empty());
        assert!(tree.root().is_empty());
    }

    #[test]
    fn test_merge_long_keys() {
        let keys: Vec<[u8; 24]> = (0..300u32)
            .map(|i| {
                let mut key = [0xC3; 24];
                key[18..22].copy_from_slice(&(i * 131).to_be_bytes());
                key
            })
            .collect();
        let loader = |record: u64, out: &mut [u8]| out.copy_from_slice(&keys[record as usize]);
        let freeze = |range: std::ops::Range<usize>| {
            let mut dynamic = DynamicTree::new(24);
            for i in range.filter(|i| i % 2 == 0) {
                dynamic.insert(&keys[i], i as u64, &loader);
            }
            StaticTree::freeze(&mut dynamic, &loader, &ShapePolicy::default())
        };
        let newer = freeze(100..300);
        let older = freeze(0..200);
        let (tree, outcome) = merged(newer, older, &loader);
        assert_eq!(outcome.collisions, 50);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(tree.get(key, &loader), (i % 2 == 0).then_some(i as u64));
        }
    }
}
