//! Dynamic to static conversion.

use tracing::debug;

use super::node::{ShapePolicy, StaticNode, StaticRef, UniversalNode};
use super::StaticTree;
use crate::art::{DynRef, DynamicTree, Node};
use crate::key::LoadKey;
use crate::noderef::Ref;

struct Freezer<'a, L: ?Sized> {
    loader: &'a L,
    key_len: usize,
    policy: &'a ShapePolicy,
}

impl<L: LoadKey + ?Sized> Freezer<'_, L> {
    fn convert(&self, r: DynRef, depth: usize) -> StaticRef {
        match r {
            Ref::Empty => Ref::Empty,
            Ref::Leaf(record) => Ref::Leaf(record),
            Ref::Inner(node) => Ref::Inner(Box::new(self.convert_node(*node, depth))),
        }
    }

    /// Children are converted first, so the shape decision sees their final
    /// leaf/inner status. The dynamic node is dropped on return.
    fn convert_node(&self, node: Node, depth: usize) -> StaticNode {
        let prefix = node.full_prefix(depth, self.key_len, self.loader);
        let child_depth = depth + prefix.len() + 1;
        let mut out = UniversalNode {
            prefix,
            ..UniversalNode::default()
        };
        for (byte, child) in node.into_children() {
            out.push(byte, self.convert(child, child_depth));
        }
        StaticNode::from_universal(out, self.policy)
    }
}

impl StaticTree {
    /// Convert the contents of `dynamic` into a new static tree, leaving
    /// `dynamic` empty.
    pub fn freeze<L: LoadKey + ?Sized>(dynamic: &mut DynamicTree, loader: &L, policy: &ShapePolicy) -> StaticTree {
        let key_len = dynamic.key_len();
        let nodes = dynamic.stats().nodes();
        let (root, len) = dynamic.take_root();
        let freezer = Freezer {
            loader,
            key_len,
            policy,
        };
        let tree = StaticTree::from_root(freezer.convert(root, 0), key_len, len);
        debug!(
            items = len,
            dynamic_nodes = nodes,
            static_nodes = tree.stats.nodes(),
            memory = tree.stats.memory_bytes,
            "froze dynamic tree"
        );
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frozen::StaticType;
    use crate::key::{encode_u64, BigEndianU64};

    fn dynamic_with(values: impl IntoIterator<Item = u64>) -> DynamicTree {
        let mut tree = DynamicTree::new(8);
        for v in values {
            tree.insert(&encode_u64(v), v, &BigEndianU64);
        }
        tree
    }

    #[test]
    fn test_freeze_mirrors_contents() {
        let values: Vec<u64> = (0..5000).map(|v| v * 37).collect();
        let mut dynamic = dynamic_with(values.iter().copied());
        let frozen = StaticTree::freeze(&mut dynamic, &BigEndianU64, &ShapePolicy::default());
        assert!(dynamic.is_empty());
        assert_eq!(dynamic.stats().nodes(), 0);
        assert_eq!(frozen.len(), values.len());
        for &v in &values {
            assert_eq!(frozen.get(&encode_u64(v), &BigEndianU64), Some(v));
        }
        assert_eq!(frozen.get(&encode_u64(1), &BigEndianU64), None);
        assert_eq!(frozen.iter().collect::<Vec<_>>(), values);
        assert!(frozen.verify_integrity_with(&BigEndianU64).is_empty());
    }

    #[test]
    fn test_freeze_shape_selection() {
        // Root fans out on byte 6 to nodes that hold leaves only.
        let mut dynamic = dynamic_with(0..1000);
        let frozen = StaticTree::freeze(&mut dynamic, &BigEndianU64, &ShapePolicy::default());
        let stats = frozen.stats();
        // Children hold 256, 256, 256 and 232 leaves, all above 227.
        assert_eq!(stats.full, 4);
        assert_eq!(stats.full_prefix, 1);
        assert_eq!(stats.dense + stats.dense_prefix, 0);

        let mut sparse = dynamic_with([1, 2, 3, 0x0100, 0x0200]);
        let frozen = StaticTree::freeze(&mut sparse, &BigEndianU64, &ShapePolicy::default());
        let root = frozen.root().as_inner().map(StaticNode::static_type);
        assert_eq!(root, Some(StaticType::DensePrefix));
        assert_eq!(frozen.stats().dense, 1);
    }

    #[test]
    fn test_freeze_materialises_long_prefixes() {
        let keys: Vec<[u8; 16]> = (0..50u8)
            .map(|i| {
                let mut key = [0x5A; 16];
                key[14] = i / 10;
                key[15] = i;
                key
            })
            .collect();
        let loader = |record: u64, out: &mut [u8]| out.copy_from_slice(&keys[record as usize]);
        let mut dynamic = DynamicTree::new(16);
        for (i, key) in keys.iter().enumerate() {
            dynamic.insert(key, i as u64, &loader);
        }
        let frozen = StaticTree::freeze(&mut dynamic, &loader, &ShapePolicy::default());
        let root = frozen.root().as_inner().map(|node| node.prefix().to_vec());
        assert_eq!(root, Some(vec![0x5A; 14]));
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(frozen.get(key, &loader), Some(i as u64));
        }
        let mut miss = keys[3];
        miss[12] = 0;
        assert_eq!(frozen.get(&miss, &loader), None);
        assert!(frozen.verify_integrity_with(&loader).is_empty());
    }

    #[test]
    fn test_freeze_empty_and_single() {
        let mut empty = DynamicTree::new(8);
        let frozen = StaticTree::freeze(&mut empty, &BigEndianU64, &ShapePolicy::default());
        assert!(frozen.is_empty());
        assert_eq!(frozen.iter().next(), None);

        let mut single = dynamic_with([42]);
        let frozen = StaticTree::freeze(&mut single, &BigEndianU64, &ShapePolicy::default());
        assert_eq!(frozen.root().leaf_value(), Some(42));
        assert_eq!(frozen.get(&encode_u64(42), &BigEndianU64), Some(42));
    }
}
