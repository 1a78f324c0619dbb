//! Immutable node shapes of the static tree.
//!
//! - Dense / DensePrefix: key and child arrays sized exactly to the fan-out
//! - Full / FullPrefix: a 256-entry child array indexed by key byte
//! - Universal: prefix, keys and children in plain vectors; only exists
//!   while a merge is rebuilding a subtree
//!
//! Static nodes store their complete prefix, so descent never needs to
//! load a key to check one.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::key::{KeyBuf, LoadKey};
use crate::noderef::{RadixNode, Ref};

/// Child reference of the static tree.
pub type StaticRef = Ref<StaticNode>;

/// The shape of a static node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaticType {
    /// Sorted key/child arrays, no prefix.
    Dense,
    /// Sorted key/child arrays with a prefix.
    DensePrefix,
    /// 256 child slots, no prefix.
    Full,
    /// 256 child slots with a prefix.
    FullPrefix,
    /// Scratch shape used during merge.
    Universal,
}

/// Rules for picking a static shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapePolicy {
    /// Fan-out above which a node is always full-width.
    pub dense_threshold: usize,
}

impl Default for ShapePolicy {
    fn default() -> Self {
        Self { dense_threshold: 227 }
    }
}

impl ShapePolicy {
    /// Full-width shapes are used for wide nodes and for nodes without any
    /// direct leaf child.
    pub fn wants_full(&self, count: usize, inner: bool) -> bool {
        count > self.dense_threshold || inner
    }
}

/// A static inner node.
pub enum StaticNode {
    /// Sorted key/child arrays, no prefix.
    Dense {
        /// Child key bytes, ascending.
        keys: Box<[u8]>,
        /// Children in key order.
        children: Box<[StaticRef]>,
    },
    /// Sorted key/child arrays with a prefix.
    DensePrefix {
        /// Complete compressed prefix.
        prefix: Box<[u8]>,
        /// Child key bytes, ascending.
        keys: Box<[u8]>,
        /// Children in key order.
        children: Box<[StaticRef]>,
    },
    /// 256 child slots, no prefix.
    Full {
        /// Populated slots.
        count: u16,
        /// Children indexed by key byte.
        children: Box<[StaticRef; 256]>,
    },
    /// 256 child slots with a prefix.
    FullPrefix {
        /// Complete compressed prefix.
        prefix: Box<[u8]>,
        /// Populated slots.
        count: u16,
        /// Children indexed by key byte.
        children: Box<[StaticRef; 256]>,
    },
    /// Merge scratch node.
    Universal(UniversalNode),
}

/// Uniform prefix/keys/children form that every static shape converts to
/// and from.
#[derive(Default)]
pub struct UniversalNode {
    /// Complete compressed prefix.
    pub prefix: KeyBuf,
    /// Child key bytes, ascending.
    pub keys: Vec<u8>,
    /// Children in key order.
    pub children: Vec<StaticRef>,
}

impl UniversalNode {
    /// A node with one child under `byte`.
    pub fn single(prefix: &[u8], byte: u8, child: StaticRef) -> Self {
        Self {
            prefix: KeyBuf::from_slice(prefix),
            keys: vec![byte],
            children: vec![child],
        }
    }

    /// Append a child; `byte` must exceed every key already present.
    pub fn push(&mut self, byte: u8, child: StaticRef) {
        debug_assert!(self.keys.last().map_or(true, |&last| last < byte));
        self.keys.push(byte);
        self.children.push(child);
    }

    /// Whether none of the children is a leaf.
    pub fn is_inner(&self) -> bool {
        self.children.iter().all(|child| !child.is_leaf())
    }
}

fn empty_slots() -> Box<[StaticRef; 256]> {
    Box::new(std::array::from_fn(|_| Ref::Empty))
}

impl StaticNode {
    /// Build the final shape for `node` under `policy`.
    pub fn from_universal(node: UniversalNode, policy: &ShapePolicy) -> StaticNode {
        let inner = node.is_inner();
        let UniversalNode {
            prefix,
            keys,
            children,
        } = node;
        if policy.wants_full(keys.len(), inner) {
            let count = keys.len() as u16;
            let mut slots = empty_slots();
            for (byte, child) in keys.into_iter().zip(children) {
                slots[byte as usize] = child;
            }
            if prefix.is_empty() {
                StaticNode::Full { count, children: slots }
            } else {
                StaticNode::FullPrefix {
                    prefix: prefix.into_vec().into_boxed_slice(),
                    count,
                    children: slots,
                }
            }
        } else if prefix.is_empty() {
            StaticNode::Dense {
                keys: keys.into_boxed_slice(),
                children: children.into_boxed_slice(),
            }
        } else {
            StaticNode::DensePrefix {
                prefix: prefix.into_vec().into_boxed_slice(),
                keys: keys.into_boxed_slice(),
                children: children.into_boxed_slice(),
            }
        }
    }

    /// Take the node apart into the uniform form.
    pub fn into_universal(self) -> UniversalNode {
        match self {
            StaticNode::Dense { keys, children } => UniversalNode {
                prefix: KeyBuf::new(),
                keys: keys.into_vec(),
                children: children.into_vec(),
            },
            StaticNode::DensePrefix {
                prefix,
                keys,
                children,
            } => UniversalNode {
                prefix: KeyBuf::from_slice(&prefix),
                keys: keys.into_vec(),
                children: children.into_vec(),
            },
            StaticNode::Full { children, .. } => Self::universal_from_slots(&[], children),
            StaticNode::FullPrefix {
                prefix, children, ..
            } => Self::universal_from_slots(&prefix, children),
            StaticNode::Universal(node) => node,
        }
    }

    fn universal_from_slots(prefix: &[u8], slots: Box<[StaticRef; 256]>) -> UniversalNode {
        let slots: [StaticRef; 256] = *slots;
        let mut node = UniversalNode {
            prefix: KeyBuf::from_slice(prefix),
            ..UniversalNode::default()
        };
        for (byte, child) in slots.into_iter().enumerate() {
            if !child.is_empty() {
                node.push(byte as u8, child);
            }
        }
        node
    }

    /// Current shape.
    pub fn static_type(&self) -> StaticType {
        match self {
            StaticNode::Dense { .. } => StaticType::Dense,
            StaticNode::DensePrefix { .. } => StaticType::DensePrefix,
            StaticNode::Full { .. } => StaticType::Full,
            StaticNode::FullPrefix { .. } => StaticType::FullPrefix,
            StaticNode::Universal(_) => StaticType::Universal,
        }
    }

    /// Complete prefix of the node.
    pub fn prefix(&self) -> &[u8] {
        match self {
            StaticNode::Dense { .. } | StaticNode::Full { .. } => &[],
            StaticNode::DensePrefix { prefix, .. } | StaticNode::FullPrefix { prefix, .. } => &**prefix,
            StaticNode::Universal(node) => node.prefix.as_slice(),
        }
    }

    /// Child for `byte`, if any.
    pub fn find_child(&self, byte: u8) -> Option<&StaticRef> {
        match self {
            StaticNode::Dense { keys, children } | StaticNode::DensePrefix { keys, children, .. } => {
                let i = keys.binary_search(&byte).ok()?;
                Some(&children[i])
            }
            StaticNode::Full { children, .. } | StaticNode::FullPrefix { children, .. } => {
                let child = &children[byte as usize];
                if child.is_empty() {
                    None
                } else {
                    Some(child)
                }
            }
            StaticNode::Universal(node) => {
                let i = node.keys.binary_search(&byte).ok()?;
                Some(&node.children[i])
            }
        }
    }

    fn sorted_keys(&self) -> Option<&[u8]> {
        match self {
            StaticNode::Dense { keys, .. } | StaticNode::DensePrefix { keys, .. } => Some(&**keys),
            StaticNode::Universal(node) => Some(node.keys.as_slice()),
            StaticNode::Full { .. } | StaticNode::FullPrefix { .. } => None,
        }
    }

    fn slots(&self) -> Option<&[StaticRef; 256]> {
        match self {
            StaticNode::Full { children, .. } | StaticNode::FullPrefix { children, .. } => Some(&**children),
            _ => None,
        }
    }
}

impl RadixNode for StaticNode {
    fn count(&self) -> usize {
        match self {
            StaticNode::Dense { keys, .. } | StaticNode::DensePrefix { keys, .. } => keys.len(),
            StaticNode::Full { count, .. } | StaticNode::FullPrefix { count, .. } => *count as usize,
            StaticNode::Universal(node) => node.keys.len(),
        }
    }

    fn prefix_len(&self) -> usize {
        self.prefix().len()
    }

    fn compare_prefix<L: LoadKey + ?Sized>(&self, key: &[u8], depth: usize, _loader: &L) -> Ordering {
        let prefix = self.prefix();
        key[depth..depth + prefix.len()].cmp(prefix)
    }

    fn slot_from(&self, from: usize) -> Option<usize> {
        match (self.sorted_keys(), self.slots()) {
            (Some(keys), _) => (from < keys.len()).then_some(from),
            (None, Some(slots)) => (from..256).find(|&byte| !slots[byte].is_empty()),
            (None, None) => None,
        }
    }

    fn seek(&self, byte: u8) -> Option<(usize, bool)> {
        if let Some(keys) = self.sorted_keys() {
            return match keys.binary_search(&byte) {
                Ok(i) => Some((i, true)),
                Err(i) if i < keys.len() => Some((i, false)),
                Err(_) => None,
            };
        }
        let slot = self.slot_from(byte as usize)?;
        Some((slot, slot == byte as usize))
    }

    fn child_at(&self, slot: usize) -> &StaticRef {
        match self {
            StaticNode::Dense { children, .. } | StaticNode::DensePrefix { children, .. } => &children[slot],
            StaticNode::Full { children, .. } | StaticNode::FullPrefix { children, .. } => &children[slot],
            StaticNode::Universal(node) => &node.children[slot],
        }
    }

    fn key_at(&self, slot: usize) -> u8 {
        match self.sorted_keys() {
            Some(keys) => keys[slot],
            None => slot as u8,
        }
    }

    fn footprint(&self) -> usize {
        let header = std::mem::size_of::<StaticNode>();
        let entry = 1 + std::mem::size_of::<StaticRef>();
        match self {
            StaticNode::Dense { keys, .. } => header + keys.len() * entry,
            StaticNode::DensePrefix { prefix, keys, .. } => header + prefix.len() + keys.len() * entry,
            StaticNode::Full { .. } => header + std::mem::size_of::<[StaticRef; 256]>(),
            StaticNode::FullPrefix { prefix, .. } => {
                header + prefix.len() + std::mem::size_of::<[StaticRef; 256]>()
            }
            StaticNode::Universal(node) => header + node.prefix.len() + node.keys.len() * entry,
        }
    }
}

impl std::fmt::Debug for StaticNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticNode")
            .field("type", &self.static_type())
            .field("count", &self.count())
            .field("prefix", &self.prefix())
            .finish()
    }
}
