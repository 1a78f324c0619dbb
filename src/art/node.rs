//! Adaptive inner nodes of the dynamic tree.
//!
//! A node picks its layout by fan-out:
//!
//! - Node4: up to 4 children, sorted key array
//! - Node16: 5-16 children, sorted key array
//! - Node48: 17-48 children, 256-byte index into 48 child slots
//! - Node256: 49-256 children, direct array indexing
//!
//! Every node carries a compressed prefix. Only the first
//! [`MAX_PREFIX_LEN`] bytes are stored inline; longer prefixes are recovered
//! from the key of any leaf below the node.

use std::cmp::Ordering;

use tracing::trace;

use super::DynamicStats;
use crate::key::{self, KeyBuf, LoadKey};
use crate::noderef::{self, RadixNode, Ref};

/// Inline prefix capacity of a dynamic node header.
pub const MAX_PREFIX_LEN: usize = 9;

/// Node48 index value marking an unused byte.
const EMPTY_MARKER: u8 = 48;

/// Child reference of the dynamic tree.
pub type DynRef = Ref<Node>;

/// The layout of a dynamic node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Up to 4 children.
    Node4,
    /// 5-16 children.
    Node16,
    /// 17-48 children.
    Node48,
    /// 49-256 children.
    Node256,
}

impl NodeType {
    /// Heap bytes of a node of this layout.
    pub fn footprint(self) -> usize {
        let header = std::mem::size_of::<Node>();
        match self {
            NodeType::Node4 => header,
            NodeType::Node16 => header + std::mem::size_of::<[DynRef; 16]>(),
            NodeType::Node48 => header + 256 + std::mem::size_of::<[DynRef; 48]>(),
            NodeType::Node256 => header + std::mem::size_of::<[DynRef; 256]>(),
        }
    }
}

/// An inner node of the dynamic tree.
pub struct Node {
    pub(super) prefix_len: u32,
    pub(super) count: u16,
    pub(super) prefix: [u8; MAX_PREFIX_LEN],
    body: Body,
}

enum Body {
    Node4 {
        keys: [u8; 4],
        children: [DynRef; 4],
    },
    Node16 {
        keys: [u8; 16],
        children: Box<[DynRef; 16]>,
    },
    Node48 {
        child_index: Box<[u8; 256]>,
        children: Box<[DynRef; 48]>,
    },
    Node256 {
        children: Box<[DynRef; 256]>,
    },
}

fn empty_children<const N: usize>() -> [DynRef; N] {
    std::array::from_fn(|_| Ref::Empty)
}

impl Body {
    fn empty4() -> Self {
        Body::Node4 {
            keys: [0; 4],
            children: empty_children(),
        }
    }
}

impl Node {
    /// A fresh Node4 with no children and an empty prefix.
    pub fn new4() -> Self {
        Node {
            prefix_len: 0,
            count: 0,
            prefix: [0; MAX_PREFIX_LEN],
            body: Body::empty4(),
        }
    }

    /// Current layout.
    pub fn node_type(&self) -> NodeType {
        match self.body {
            Body::Node4 { .. } => NodeType::Node4,
            Body::Node16 { .. } => NodeType::Node16,
            Body::Node48 { .. } => NodeType::Node48,
            Body::Node256 { .. } => NodeType::Node256,
        }
    }

    /// Stored prefix bytes; truncated to [`MAX_PREFIX_LEN`] for long prefixes.
    pub fn inline_prefix(&self) -> &[u8] {
        &self.prefix[..(self.prefix_len as usize).min(MAX_PREFIX_LEN)]
    }

    /// Set a prefix of logical length `len`. `bytes` must hold at least the
    /// first `min(len, MAX_PREFIX_LEN)` bytes of it.
    pub(super) fn set_prefix(&mut self, bytes: &[u8], len: usize) {
        let stored = len.min(MAX_PREFIX_LEN);
        self.prefix[..stored].copy_from_slice(&bytes[..stored]);
        self.prefix_len = len as u32;
    }

    /// The complete prefix, loading a leaf key when it exceeds the inline
    /// capacity. `depth` is the key offset at which the prefix starts.
    pub fn full_prefix<L: LoadKey + ?Sized>(&self, depth: usize, key_len: usize, loader: &L) -> KeyBuf {
        let len = self.prefix_len as usize;
        if len <= MAX_PREFIX_LEN {
            return KeyBuf::from_slice(self.inline_prefix());
        }
        match noderef::minimum_leaf(self) {
            Some(record) => {
                let leaf_key = key::load(loader, record, key_len);
                KeyBuf::from_slice(&leaf_key[depth..depth + len])
            }
            None => KeyBuf::from_slice(self.inline_prefix()),
        }
    }

    /// Position of the first byte where `key[depth..]` leaves the prefix;
    /// equals the prefix length on a full match.
    pub fn prefix_mismatch<L: LoadKey + ?Sized>(&self, key: &[u8], depth: usize, loader: &L) -> usize {
        let len = self.prefix_len as usize;
        let inline = self.inline_prefix();
        let matched = key::common_prefix_len(inline, &key[depth..]);
        if matched < inline.len() || len <= MAX_PREFIX_LEN {
            return matched;
        }
        let Some(record) = noderef::minimum_leaf(self) else {
            return matched;
        };
        let leaf_key = key::load(loader, record, key.len());
        MAX_PREFIX_LEN
            + key::common_prefix_len(
                &leaf_key[depth + MAX_PREFIX_LEN..depth + len],
                &key[depth + MAX_PREFIX_LEN..],
            )
    }

    /// Child for `byte`, if any.
    pub fn find_child(&self, byte: u8) -> Option<&DynRef> {
        let count = self.count as usize;
        match &self.body {
            Body::Node4 { keys, children } => keys[..count]
                .iter()
                .position(|&k| k == byte)
                .map(|i| &children[i]),
            Body::Node16 { keys, children } => keys[..count]
                .iter()
                .position(|&k| k == byte)
                .map(|i| &children[i]),
            Body::Node48 {
                child_index,
                children,
            } => {
                let i = child_index[byte as usize];
                if i == EMPTY_MARKER {
                    None
                } else {
                    Some(&children[i as usize])
                }
            }
            Body::Node256 { children } => {
                let child = &children[byte as usize];
                if child.is_empty() {
                    None
                } else {
                    Some(child)
                }
            }
        }
    }

    /// Mutable child for `byte`, if any.
    pub fn find_child_mut(&mut self, byte: u8) -> Option<&mut DynRef> {
        let count = self.count as usize;
        match &mut self.body {
            Body::Node4 { keys, children } => {
                let i = keys[..count].iter().position(|&k| k == byte)?;
                Some(&mut children[i])
            }
            Body::Node16 { keys, children } => {
                let i = keys[..count].iter().position(|&k| k == byte)?;
                Some(&mut children[i])
            }
            Body::Node48 {
                child_index,
                children,
            } => {
                let i = child_index[byte as usize];
                if i == EMPTY_MARKER {
                    None
                } else {
                    Some(&mut children[i as usize])
                }
            }
            Body::Node256 { children } => {
                let child = &mut children[byte as usize];
                if child.is_empty() {
                    None
                } else {
                    Some(child)
                }
            }
        }
    }

    fn is_full(&self) -> bool {
        let capacity = match self.body {
            Body::Node4 { .. } => 4,
            Body::Node16 { .. } => 16,
            Body::Node48 { .. } => 48,
            Body::Node256 { .. } => 256,
        };
        self.count as usize >= capacity
    }

    /// Add a child for `byte`, growing the layout first when it is full.
    /// `byte` must not already be present.
    pub fn add_child(&mut self, byte: u8, child: DynRef, stats: &mut DynamicStats) {
        if self.is_full() {
            self.grow(stats);
        }
        let count = self.count as usize;
        match &mut self.body {
            Body::Node4 { keys, children } => insert_sorted(keys, &mut children[..], count, byte, child),
            Body::Node16 { keys, children } => insert_sorted(keys, &mut children[..], count, byte, child),
            Body::Node48 {
                child_index,
                children,
            } => {
                let mut pos = count;
                if !children[pos].is_empty() {
                    pos = children.iter().position(Ref::is_empty).unwrap_or(pos);
                }
                children[pos] = child;
                child_index[byte as usize] = pos as u8;
            }
            Body::Node256 { children } => children[byte as usize] = child,
        }
        self.count += 1;
    }

    /// Remove and return the child for `byte`, shrinking the layout when the
    /// count falls to the shrink point. Returns [`Ref::Empty`] if absent.
    pub fn remove_child(&mut self, byte: u8, stats: &mut DynamicStats) -> DynRef {
        let count = self.count as usize;
        let removed = match &mut self.body {
            Body::Node4 { keys, children } => remove_sorted(keys, &mut children[..], count, byte),
            Body::Node16 { keys, children } => remove_sorted(keys, &mut children[..], count, byte),
            Body::Node48 {
                child_index,
                children,
            } => {
                let i = child_index[byte as usize];
                if i == EMPTY_MARKER {
                    Ref::Empty
                } else {
                    child_index[byte as usize] = EMPTY_MARKER;
                    children[i as usize].take()
                }
            }
            Body::Node256 { children } => children[byte as usize].take(),
        };
        if removed.is_empty() {
            return removed;
        }
        self.count -= 1;
        match (self.node_type(), self.count) {
            (NodeType::Node16, 3) | (NodeType::Node48, 12) | (NodeType::Node256, 37) => self.shrink(stats),
            _ => {}
        }
        removed
    }

    /// Detach the only child of a one-way Node4.
    pub(super) fn take_only_child(&mut self) -> (u8, DynRef) {
        self.count = 0;
        match &mut self.body {
            Body::Node4 { keys, children } => (keys[0], children[0].take()),
            _ => unreachable!("collapse only applies to Node4"),
        }
    }

    /// Prepend `parent.prefix ++ byte` to this node's prefix when it replaces
    /// its collapsed parent.
    pub(super) fn absorb_prefix(&mut self, parent: &Node, byte: u8) {
        let parent_len = parent.prefix_len as usize;
        let mut merged = [0u8; MAX_PREFIX_LEN];
        let mut len = parent_len.min(MAX_PREFIX_LEN);
        merged[..len].copy_from_slice(&parent.prefix[..len]);
        if len < MAX_PREFIX_LEN {
            merged[len] = byte;
            len += 1;
        }
        if len < MAX_PREFIX_LEN {
            let own = (self.prefix_len as usize).min(MAX_PREFIX_LEN - len);
            merged[len..len + own].copy_from_slice(&self.prefix[..own]);
        }
        self.prefix = merged;
        self.prefix_len += parent_len as u32 + 1;
    }

    /// Consume the node and return its children in key order.
    pub fn into_children(self) -> Vec<(u8, DynRef)> {
        let count = self.count as usize;
        let mut out = Vec::with_capacity(count);
        match self.body {
            Body::Node4 { keys, children } => {
                out.extend(keys.into_iter().zip(children).take(count));
            }
            Body::Node16 { keys, children } => {
                let children: [DynRef; 16] = *children;
                out.extend(keys.into_iter().zip(children).take(count));
            }
            Body::Node48 {
                child_index,
                children,
            } => {
                let mut children: [DynRef; 48] = *children;
                for (byte, &i) in child_index.iter().enumerate() {
                    if i != EMPTY_MARKER {
                        out.push((byte as u8, children[i as usize].take()));
                    }
                }
            }
            Body::Node256 { children } => {
                let children: [DynRef; 256] = *children;
                for (byte, child) in children.into_iter().enumerate() {
                    if !child.is_empty() {
                        out.push((byte as u8, child));
                    }
                }
            }
        }
        out
    }

    fn grow(&mut self, stats: &mut DynamicStats) {
        let from = self.node_type();
        let count = self.count as usize;
        self.body = match std::mem::replace(&mut self.body, Body::empty4()) {
            Body::Node4 { keys, children } => {
                let mut wide_keys = [0u8; 16];
                wide_keys[..4].copy_from_slice(&keys);
                let mut wide: Box<[DynRef; 16]> = Box::new(empty_children());
                for (slot, child) in wide.iter_mut().zip(children) {
                    *slot = child;
                }
                Body::Node16 {
                    keys: wide_keys,
                    children: wide,
                }
            }
            Body::Node16 { keys, children } => {
                let children: [DynRef; 16] = *children;
                let mut child_index = Box::new([EMPTY_MARKER; 256]);
                let mut wide: Box<[DynRef; 48]> = Box::new(empty_children());
                for (i, child) in children.into_iter().enumerate().take(count) {
                    child_index[keys[i] as usize] = i as u8;
                    wide[i] = child;
                }
                Body::Node48 {
                    child_index,
                    children: wide,
                }
            }
            Body::Node48 {
                child_index,
                children,
            } => {
                let mut children: [DynRef; 48] = *children;
                let mut wide: Box<[DynRef; 256]> = Box::new(empty_children());
                for (byte, &i) in child_index.iter().enumerate() {
                    if i != EMPTY_MARKER {
                        wide[byte] = children[i as usize].take();
                    }
                }
                Body::Node256 { children: wide }
            }
            Body::Node256 { .. } => unreachable!("Node256 has no larger layout"),
        };
        let to = self.node_type();
        trace!(?from, ?to, count, "grow");
        stats.replace(from, to);
    }

    fn shrink(&mut self, stats: &mut DynamicStats) {
        let from = self.node_type();
        self.body = match std::mem::replace(&mut self.body, Body::empty4()) {
            Body::Node16 { keys, children } => {
                let children: [DynRef; 16] = *children;
                let mut narrow_keys = [0u8; 4];
                narrow_keys.copy_from_slice(&keys[..4]);
                let mut narrow: [DynRef; 4] = empty_children();
                for (slot, child) in narrow.iter_mut().zip(children) {
                    *slot = child;
                }
                Body::Node4 {
                    keys: narrow_keys,
                    children: narrow,
                }
            }
            Body::Node48 {
                child_index,
                children,
            } => {
                let mut children: [DynRef; 48] = *children;
                let mut keys = [0u8; 16];
                let mut narrow: Box<[DynRef; 16]> = Box::new(empty_children());
                let mut next = 0;
                for (byte, &i) in child_index.iter().enumerate() {
                    if i != EMPTY_MARKER {
                        keys[next] = byte as u8;
                        narrow[next] = children[i as usize].take();
                        next += 1;
                    }
                }
                Body::Node16 {
                    keys,
                    children: narrow,
                }
            }
            Body::Node256 { children } => {
                let children: [DynRef; 256] = *children;
                let mut child_index = Box::new([EMPTY_MARKER; 256]);
                let mut narrow: Box<[DynRef; 48]> = Box::new(empty_children());
                let mut next = 0;
                for (byte, child) in children.into_iter().enumerate() {
                    if !child.is_empty() {
                        child_index[byte] = next as u8;
                        narrow[next] = child;
                        next += 1;
                    }
                }
                Body::Node48 {
                    child_index,
                    children: narrow,
                }
            }
            Body::Node4 { .. } => unreachable!("Node4 has no smaller layout"),
        };
        let to = self.node_type();
        trace!(?from, ?to, count = self.count, "shrink");
        stats.replace(from, to);
    }

    /// Layout-specific consistency problems of this node.
    pub(super) fn layout_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let count = self.count as usize;
        let (min, max) = match self.body {
            Body::Node4 { .. } => (2, 4),
            Body::Node16 { .. } => (4, 16),
            Body::Node48 { .. } => (13, 48),
            Body::Node256 { .. } => (38, 256),
        };
        if count < min || count > max {
            errors.push(format!("{:?} holds {} children", self.node_type(), count));
        }
        match &self.body {
            Body::Node4 { keys, .. } if !keys[..count].windows(2).all(|w| w[0] < w[1]) => {
                errors.push(format!("Node4 keys not sorted: {:?}", &keys[..count]));
            }
            Body::Node16 { keys, .. } if !keys[..count].windows(2).all(|w| w[0] < w[1]) => {
                errors.push(format!("Node16 keys not sorted: {:?}", &keys[..count]));
            }
            Body::Node48 {
                child_index,
                children,
            } => {
                let indexed = child_index.iter().filter(|&&i| i != EMPTY_MARKER).count();
                let occupied = children.iter().filter(|c| !c.is_empty()).count();
                if indexed != count || occupied != count {
                    errors.push(format!(
                        "Node48 count {} but {} indexed and {} occupied",
                        count, indexed, occupied
                    ));
                }
            }
            _ => {}
        }
        if self.children().count() != count {
            errors.push(format!("{:?} count {} disagrees with populated slots", self.node_type(), count));
        }
        errors
    }
}

fn insert_sorted(keys: &mut [u8], children: &mut [DynRef], count: usize, byte: u8, child: DynRef) {
    let pos = keys[..count].iter().position(|&k| k > byte).unwrap_or(count);
    keys.copy_within(pos..count, pos + 1);
    children[pos..=count].rotate_right(1);
    keys[pos] = byte;
    children[pos] = child;
}

fn remove_sorted(keys: &mut [u8], children: &mut [DynRef], count: usize, byte: u8) -> DynRef {
    let Some(pos) = keys[..count].iter().position(|&k| k == byte) else {
        return Ref::Empty;
    };
    let removed = children[pos].take();
    keys.copy_within(pos + 1..count, pos);
    children[pos..count].rotate_left(1);
    removed
}

impl RadixNode for Node {
    fn count(&self) -> usize {
        self.count as usize
    }

    fn prefix_len(&self) -> usize {
        self.prefix_len as usize
    }

    fn compare_prefix<L: LoadKey + ?Sized>(&self, key: &[u8], depth: usize, loader: &L) -> Ordering {
        let len = self.prefix_len as usize;
        let inline = self.inline_prefix();
        let ord = key[depth..depth + inline.len()].cmp(inline);
        if ord != Ordering::Equal || len <= MAX_PREFIX_LEN {
            return ord;
        }
        let Some(record) = noderef::minimum_leaf(self) else {
            return ord;
        };
        let leaf_key = key::load(loader, record, key.len());
        let rest = depth + MAX_PREFIX_LEN..depth + len;
        key[rest.clone()].cmp(&leaf_key[rest])
    }

    fn slot_from(&self, from: usize) -> Option<usize> {
        let count = self.count as usize;
        match &self.body {
            Body::Node4 { .. } | Body::Node16 { .. } => (from < count).then_some(from),
            Body::Node48 { child_index, .. } => {
                (from..256).find(|&byte| child_index[byte] != EMPTY_MARKER)
            }
            Body::Node256 { children } => (from..256).find(|&byte| !children[byte].is_empty()),
        }
    }

    fn seek(&self, byte: u8) -> Option<(usize, bool)> {
        let count = self.count as usize;
        let keys: &[u8] = match &self.body {
            Body::Node4 { keys, .. } => &keys[..count],
            Body::Node16 { keys, .. } => &keys[..count],
            Body::Node48 { .. } | Body::Node256 { .. } => {
                let slot = self.slot_from(byte as usize)?;
                return Some((slot, slot == byte as usize));
            }
        };
        let pos = keys.iter().position(|&k| k >= byte)?;
        Some((pos, keys[pos] == byte))
    }

    fn child_at(&self, slot: usize) -> &DynRef {
        match &self.body {
            Body::Node4 { children, .. } => &children[slot],
            Body::Node16 { children, .. } => &children[slot],
            Body::Node48 {
                child_index,
                children,
            } => &children[child_index[slot] as usize],
            Body::Node256 { children } => &children[slot],
        }
    }

    fn key_at(&self, slot: usize) -> u8 {
        match &self.body {
            Body::Node4 { keys, .. } => keys[slot],
            Body::Node16 { keys, .. } => keys[slot],
            Body::Node48 { .. } | Body::Node256 { .. } => slot as u8,
        }
    }

    fn footprint(&self) -> usize {
        self.node_type().footprint()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("type", &self.node_type())
            .field("count", &self.count)
            .field("prefix_len", &self.prefix_len)
            .field("prefix", &self.inline_prefix())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with(bytes: impl IntoIterator<Item = u8>, stats: &mut DynamicStats) -> Node {
        let mut node = Node::new4();
        stats.alloc(NodeType::Node4);
        for byte in bytes {
            node.add_child(byte, Ref::leaf(byte as u64), stats);
        }
        node
    }

    #[test]
    fn test_node4_keeps_keys_sorted() {
        let mut stats = DynamicStats::default();
        let node = node_with([9, 3, 7, 1], &mut stats);
        let keys: Vec<u8> = node.children().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1, 3, 7, 9]);
        assert_eq!(node.node_type(), NodeType::Node4);
        assert!(node.layout_errors().is_empty());
    }

    #[test]
    fn test_grow_through_every_layout() {
        let mut stats = DynamicStats::default();
        let mut node = node_with(0..4, &mut stats);
        node.add_child(4, Ref::leaf(4), &mut stats);
        assert_eq!(node.node_type(), NodeType::Node16);
        for byte in 5..17 {
            node.add_child(byte, Ref::leaf(byte as u64), &mut stats);
        }
        assert_eq!(node.node_type(), NodeType::Node48);
        for byte in 17..49 {
            node.add_child(byte, Ref::leaf(byte as u64), &mut stats);
        }
        assert_eq!(node.node_type(), NodeType::Node256);
        assert_eq!(stats.node256, 1);
        assert_eq!(stats.node4 + stats.node16 + stats.node48, 0);
        for byte in 0..49u8 {
            assert_eq!(node.find_child(byte).and_then(Ref::leaf_value), Some(byte as u64));
        }
        assert!(node.find_child(200).is_none());
    }

    #[test]
    fn test_shrink_points() {
        let mut stats = DynamicStats::default();
        let mut node = node_with(0..49, &mut stats);
        for byte in (37..49).rev() {
            assert_eq!(node.node_type(), NodeType::Node256);
            assert_eq!(node.remove_child(byte, &mut stats).leaf_value(), Some(byte as u64));
        }
        assert_eq!(node.node_type(), NodeType::Node48);
        for byte in (12..37).rev() {
            node.remove_child(byte, &mut stats);
        }
        assert_eq!(node.node_type(), NodeType::Node16);
        for byte in (3..12).rev() {
            node.remove_child(byte, &mut stats);
        }
        assert_eq!(node.node_type(), NodeType::Node4);
        assert_eq!(node.count(), 3);
        let keys: Vec<u8> = node.children().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![0, 1, 2]);
        assert_eq!(stats.node4, 1);
    }

    #[test]
    fn test_take_only_child() {
        let mut stats = DynamicStats::default();
        let mut node = node_with([1, 7], &mut stats);
        node.remove_child(1, &mut stats);
        let (byte, child) = node.take_only_child();
        assert_eq!((byte, child.leaf_value()), (7, Some(7)));
        assert_eq!(node.count(), 0);
    }

    #[test]
    #[should_panic(expected = "collapse only applies to Node4")]
    fn test_take_only_child_rejects_wide_layouts() {
        let mut stats = DynamicStats::default();
        let mut node = node_with(0..5, &mut stats);
        assert_eq!(node.node_type(), NodeType::Node16);
        node.take_only_child();
    }

    #[test]
    fn test_remove_missing_child_is_noop() {
        let mut stats = DynamicStats::default();
        let mut node = node_with([1, 2], &mut stats);
        assert!(node.remove_child(3, &mut stats).is_empty());
        assert_eq!(node.count(), 2);
    }

    #[test]
    fn test_node48_reuses_freed_slots() {
        let mut stats = DynamicStats::default();
        let mut node = node_with(0..20, &mut stats);
        node.remove_child(0, &mut stats);
        node.remove_child(1, &mut stats);
        node.add_child(100, Ref::leaf(100), &mut stats);
        node.add_child(101, Ref::leaf(101), &mut stats);
        assert_eq!(node.node_type(), NodeType::Node48);
        assert_eq!(node.find_child(101).and_then(Ref::leaf_value), Some(101));
        assert!(node.layout_errors().is_empty());
    }

    #[test]
    fn test_seek_over_layouts() {
        let mut stats = DynamicStats::default();
        let small = node_with([10, 20, 30], &mut stats);
        assert_eq!(small.seek(20), Some((1, true)));
        assert_eq!(small.seek(21), Some((2, false)));
        assert_eq!(small.seek(31), None);

        let wide = node_with((0..60).map(|b| b * 4), &mut stats);
        assert_eq!(wide.node_type(), NodeType::Node256);
        assert_eq!(wide.seek(8), Some((8, true)));
        assert_eq!(wide.seek(9), Some((12, false)));
        assert_eq!(wide.key_at(12), 12);
    }

    #[test]
    fn test_absorb_prefix_truncates_inline_bytes() {
        let mut parent = Node::new4();
        parent.set_prefix(&[1, 2, 3, 4, 5, 6, 7], 7);
        let mut child = Node::new4();
        child.set_prefix(&[9, 9, 9], 3);
        child.absorb_prefix(&parent, 8);
        assert_eq!(child.prefix_len(), 11);
        assert_eq!(child.inline_prefix(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }
}
