//! Tree shape report shared by both node families.

use std::collections::VecDeque;

use serde::Serialize;

use crate::art::MAX_PREFIX_LEN;
use crate::noderef::{RadixNode, Ref};

/// Breadth-first summary of a tree's shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShapeHistogram {
    /// Child slots summed over all inner nodes.
    pub items: u64,
    /// Bytes in nodes without a direct leaf child.
    pub inner_bytes: u64,
    /// Bytes in nodes with at least one direct leaf child.
    pub leaf_bytes: u64,
    /// `prefix_lengths[n]` counts nodes whose prefix is `n` bytes long.
    pub prefix_lengths: [u64; MAX_PREFIX_LEN + 1],
    /// Nodes whose prefix exceeds the inline capacity.
    pub long_prefixes: u64,
}

impl ShapeHistogram {
    /// Number of inner nodes seen.
    pub fn nodes(&self) -> u64 {
        self.prefix_lengths.iter().sum::<u64>() + self.long_prefixes
    }
}

/// Walk the tree under `root` level by level.
pub fn shape_histogram<N: RadixNode>(root: &Ref<N>) -> ShapeHistogram {
    let mut histogram = ShapeHistogram::default();
    let mut queue: VecDeque<&N> = VecDeque::new();
    if let Ref::Inner(node) = root {
        queue.push_back(node);
    }
    while let Some(node) = queue.pop_front() {
        histogram.items += node.count() as u64;
        match node.prefix_len() {
            len if len <= MAX_PREFIX_LEN => histogram.prefix_lengths[len] += 1,
            _ => histogram.long_prefixes += 1,
        }
        let bytes = node.footprint() as u64;
        if node.is_inner() {
            histogram.inner_bytes += bytes;
        } else {
            histogram.leaf_bytes += bytes;
        }
        for (_, child) in node.children() {
            if let Ref::Inner(child) = child {
                queue.push_back(child);
            }
        }
    }
    histogram
}
