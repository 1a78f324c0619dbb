//! Ordered traversal over either node family.
//!
//! A [`Cursor`] owns its root-to-leaf path as a stack of `(node, slot)`
//! frames, so any number of scans can be open over the same tree at once.
//! The borrow on the tree keeps it from being mutated while a cursor lives.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::key::{self, LoadKey};
use crate::noderef::{RadixNode, Ref};

struct Frame<'a, N> {
    node: &'a N,
    slot: usize,
}

/// Forward cursor over the leaves of one tree.
///
/// The cursor is positioned on a leaf (or exhausted); iterating yields the
/// current record and then moves to the next one in key order.
pub struct Cursor<'a, N> {
    stack: SmallVec<[Frame<'a, N>; 16]>,
    current: Option<u64>,
}

impl<'a, N: RadixNode> Cursor<'a, N> {
    fn unpositioned() -> Self {
        Cursor {
            stack: SmallVec::new(),
            current: None,
        }
    }

    /// Cursor on the smallest leaf of the tree.
    pub fn first(root: &'a Ref<N>) -> Self {
        let mut cursor = Self::unpositioned();
        cursor.current = cursor.minimum_with_path(root);
        cursor
    }

    /// Cursor on the first leaf whose key is `>= key`.
    pub fn lower_bound<L: LoadKey + ?Sized>(root: &'a Ref<N>, key: &[u8], loader: &L) -> Self {
        let mut cursor = Self::unpositioned();
        let mut r = root;
        let mut depth = 0;
        cursor.current = loop {
            let node: &'a N = match r {
                Ref::Empty => break None,
                Ref::Leaf(record) => {
                    // Bytes below this leaf were never compared on the way down.
                    let leaf_key = key::load(loader, *record, key.len());
                    if leaf_key.as_slice() >= key {
                        break Some(*record);
                    }
                    break cursor.next_leaf();
                }
                Ref::Inner(node) => node,
            };
            match node.compare_prefix(key, depth, loader) {
                Ordering::Greater => break cursor.next_leaf(),
                Ordering::Less => break cursor.minimum_with_path(r),
                Ordering::Equal => {}
            }
            depth += node.prefix_len();
            let Some(&byte) = key.get(depth) else {
                break cursor.minimum_with_path(r);
            };
            let Some((slot, exact)) = node.seek(byte) else {
                // Every child sorts before the key.
                break cursor.next_leaf();
            };
            cursor.stack.push(Frame { node, slot });
            let child = node.child_at(slot);
            if !exact {
                break cursor.minimum_with_path(child);
            }
            r = child;
            depth += 1;
        };
        cursor
    }

    /// Record under the cursor.
    pub fn current(&self) -> Option<u64> {
        self.current
    }

    /// Move to the next leaf and return it.
    pub fn advance(&mut self) -> Option<u64> {
        if self.current.is_some() {
            self.current = self.next_leaf();
        }
        self.current
    }

    /// Descend to the smallest leaf below `r`, recording the path.
    fn minimum_with_path(&mut self, r: &'a Ref<N>) -> Option<u64> {
        let mut r = r;
        loop {
            match r {
                Ref::Empty => return None,
                Ref::Leaf(record) => return Some(*record),
                Ref::Inner(node) => {
                    let node: &'a N = node;
                    let slot = node.slot_from(0)?;
                    self.stack.push(Frame { node, slot });
                    r = node.child_at(slot);
                }
            }
        }
    }

    /// Step the deepest frame with a remaining sibling to that sibling,
    /// popping exhausted frames.
    fn next_slot(&mut self) -> Option<&'a Ref<N>> {
        while let Some(top) = self.stack.last_mut() {
            let node = top.node;
            if let Some(slot) = node.slot_from(top.slot + 1) {
                top.slot = slot;
                return Some(node.child_at(slot));
            }
            self.stack.pop();
        }
        None
    }

    fn next_leaf(&mut self) -> Option<u64> {
        let next = self.next_slot()?;
        self.minimum_with_path(next)
    }
}

impl<'a, N: RadixNode> Iterator for Cursor<'a, N> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let current = self.current?;
        self.current = self.next_leaf();
        Some(current)
    }
}
