//! HybridIndex: dynamic write buffer + static bulk tree
//!
//! - Dynamic layer: adaptive radix tree taking every write
//! - Static layer: compact immutable radix tree holding everything merged so far
//! - Merge: freeze the dynamic tree and fold it into the static one
//!
//! Reads consult the dynamic tree first, so a record written after the last
//! merge shadows the static record for the same key.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, trace};

use crate::art::{DynamicStats, DynamicTree, Node};
use crate::cursor::Cursor;
use crate::error::Result;
use crate::frozen::{MergeOutcome, StaticNode, StaticStats, StaticTree};
use crate::histogram::ShapeHistogram;
use crate::key::{self, LoadKey};
use crate::Config;

/// Index over fixed-length keys combining a dynamic and a static tree.
pub struct HybridIndex<L> {
    config: Config,
    loader: L,
    dynamic: DynamicTree,
    frozen: StaticTree,
}

/// Diagnostics of both layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Records in the dynamic tree.
    pub dynamic_items: usize,
    /// Records in the static tree.
    pub static_items: usize,
    /// Dynamic node counts.
    pub dynamic: DynamicStats,
    /// Static node counts.
    pub frozen: StaticStats,
    /// Estimated bytes of inner nodes across both trees.
    pub memory_bytes: usize,
}

impl<L: LoadKey> HybridIndex<L> {
    /// Create an index with the default configuration (8-byte keys,
    /// automatic merging off).
    pub fn new(loader: L) -> Self {
        let config = Config::default();
        Self {
            dynamic: DynamicTree::new(config.key_len),
            frozen: StaticTree::new(config.key_len),
            config,
            loader,
        }
    }

    /// Create an index with the given configuration.
    pub fn with_config(config: Config, loader: L) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dynamic: DynamicTree::new(config.key_len),
            frozen: StaticTree::new(config.key_len),
            config,
            loader,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The key loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// The dynamic layer.
    pub fn dynamic(&self) -> &DynamicTree {
        &self.dynamic
    }

    /// The static layer.
    pub fn frozen(&self) -> &StaticTree {
        &self.frozen
    }

    /// Insert `record` under `key`.
    ///
    /// Returns `false` and leaves the index unchanged when the dynamic tree
    /// already holds the key.
    pub fn insert(&mut self, key: &[u8], record: u64) -> bool {
        self.merge_if_due();
        self.dynamic.insert(key, record, &self.loader)
    }

    /// Store `record` under `key`, replacing any record the dynamic tree
    /// holds for it.
    pub fn upsert(&mut self, key: &[u8], record: u64) {
        self.merge_if_due();
        self.dynamic.upsert(key, record, &self.loader);
    }

    /// Look up `key`.
    pub fn get(&self, key: &[u8]) -> Option<u64> {
        self.dynamic
            .get(key, &self.loader)
            .or_else(|| self.frozen.get(key, &self.loader))
    }

    /// Look up `key`, validating long prefixes in the dynamic tree on the
    /// way down instead of at the leaf.
    pub fn get_pessimistic(&self, key: &[u8]) -> Option<u64> {
        self.dynamic
            .get_pessimistic(key, &self.loader)
            .or_else(|| self.frozen.get(key, &self.loader))
    }

    /// Remove `key` from the dynamic tree.
    ///
    /// Records already merged into the static tree are immutable and stay
    /// visible.
    pub fn erase(&mut self, key: &[u8]) -> bool {
        self.dynamic.erase(key, &self.loader)
    }

    /// Iterator over records in key order, starting at the first key `>= key`.
    pub fn lower_bound(&self, key: &[u8]) -> HybridScan<'_, L> {
        HybridScan {
            dynamic: self.dynamic.lower_bound(key, &self.loader),
            frozen: self.frozen.lower_bound(key, &self.loader),
            loader: &self.loader,
            key_len: self.config.key_len,
        }
    }

    /// Iterator over all records in key order.
    pub fn iter(&self) -> HybridScan<'_, L> {
        HybridScan {
            dynamic: self.dynamic.iter(),
            frozen: self.frozen.iter(),
            loader: &self.loader,
            key_len: self.config.key_len,
        }
    }

    /// Up to `count` records starting at the first key `>= key`.
    pub fn scan(&self, key: &[u8], count: usize) -> Vec<u64> {
        self.lower_bound(key).take(count).collect()
    }

    /// Whether the automatic merge condition currently holds.
    pub fn merge_due(&self) -> bool {
        let pending = self.dynamic.len();
        self.config.auto_merge
            && pending > self.config.merge_threshold
            && pending.saturating_mul(self.config.merge_ratio) > self.frozen.len()
    }

    fn merge_if_due(&mut self) {
        if self.merge_due() {
            trace!(
                dynamic_items = self.dynamic.len(),
                static_items = self.frozen.len(),
                "merge threshold reached"
            );
            self.merge();
        }
    }

    /// Freeze the dynamic tree and merge it into the static tree. The
    /// dynamic tree is empty afterwards.
    pub fn merge(&mut self) -> MergeOutcome {
        let policy = self.config.shape_policy();
        debug!(
            dynamic_items = self.dynamic.len(),
            static_items = self.frozen.len(),
            "merging write buffer"
        );
        if self.dynamic.is_empty() {
            return MergeOutcome {
                items: self.frozen.len(),
                collisions: 0,
            };
        }
        let fresh = StaticTree::freeze(&mut self.dynamic, &self.loader, &policy);
        if self.frozen.is_empty() {
            self.frozen = fresh;
            return MergeOutcome {
                items: self.frozen.len(),
                collisions: 0,
            };
        }
        let older = std::mem::replace(&mut self.frozen, StaticTree::new(self.config.key_len));
        let (merged, outcome) = StaticTree::merge(fresh, older, &self.loader, &policy);
        self.frozen = merged;
        outcome
    }

    /// Records held by the dynamic tree.
    pub fn dynamic_len(&self) -> usize {
        self.dynamic.len()
    }

    /// Records held by the static tree.
    pub fn static_len(&self) -> usize {
        self.frozen.len()
    }

    /// Whether both trees are empty.
    pub fn is_empty(&self) -> bool {
        self.dynamic.is_empty() && self.frozen.is_empty()
    }

    /// Node counts and memory estimates of both trees.
    pub fn stats(&self) -> IndexStats {
        let dynamic = self.dynamic.stats().clone();
        let frozen = self.frozen.stats().clone();
        IndexStats {
            dynamic_items: self.dynamic.len(),
            static_items: self.frozen.len(),
            memory_bytes: dynamic.memory_bytes + frozen.memory_bytes,
            dynamic,
            frozen,
        }
    }

    /// Shape report of the dynamic tree only.
    pub fn shape_histogram(&self) -> ShapeHistogram {
        self.dynamic.shape_histogram()
    }

    /// Shape report of the static tree.
    pub fn frozen_shape_histogram(&self) -> ShapeHistogram {
        self.frozen.shape_histogram()
    }
}

/// Ordered scan over both trees of a [`HybridIndex`].
///
/// Each tree has its own cursor; the smaller current key is emitted first.
/// When both trees hold the same key, the dynamic record is emitted and the
/// static one skipped.
pub struct HybridScan<'a, L> {
    dynamic: Cursor<'a, Node>,
    frozen: Cursor<'a, StaticNode>,
    loader: &'a L,
    key_len: usize,
}

impl<L: LoadKey> Iterator for HybridScan<'_, L> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        match (self.dynamic.current(), self.frozen.current()) {
            (None, None) => None,
            (Some(d), None) => {
                self.dynamic.advance();
                Some(d)
            }
            (None, Some(s)) => {
                self.frozen.advance();
                Some(s)
            }
            (Some(d), Some(s)) => {
                let dynamic_key = key::load(self.loader, d, self.key_len);
                let static_key = key::load(self.loader, s, self.key_len);
                match dynamic_key.cmp(&static_key) {
                    Ordering::Less => {
                        self.dynamic.advance();
                        Some(d)
                    }
                    Ordering::Greater => {
                        self.frozen.advance();
                        Some(s)
                    }
                    Ordering::Equal => {
                        self.dynamic.advance();
                        self.frozen.advance();
                        Some(d)
                    }
                }
            }
        }
    }
}
