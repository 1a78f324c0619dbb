//! # hybrid-art
//!
//! An ordered index over fixed-length byte keys that pairs an Adaptive Radix
//! Tree with a compact static radix tree.
//!
//! Leaves hold 64-bit record references rather than keys. Whenever the full
//! key of a record is needed it is loaded through a caller-supplied
//! [`LoadKey`].
//!
//! ## Architecture
//!
//! The index keeps two layers:
//!
//! 1. **Dynamic layer ([`art`])**: an Adaptive Radix Tree taking all writes.
//!    Nodes hold 4, 16, 48 or 256 children and change layout as they fill.
//!
//! 2. **Static layer ([`frozen`])**: an immutable radix tree built by freezing
//!    the dynamic layer and merging it into the previous static tree. Nodes
//!    are sized exactly and never change after construction.
//!
//! Lookups try the dynamic layer first. Range scans walk both layers with
//! [`cursor::Cursor`]s and interleave them in key order.
//!
//! ## Example
//!
//! ```rust
//! use hybrid_art::key::{encode_u64, BigEndianU64};
//! use hybrid_art::HybridIndex;
//!
//! let mut index = HybridIndex::new(BigEndianU64);
//! for v in 0..1000u64 {
//!     index.insert(&encode_u64(v), v);
//! }
//! index.merge();
//! index.insert(&encode_u64(5000), 5000);
//!
//! assert_eq!(index.get(&encode_u64(500)), Some(500));
//! assert_eq!(index.scan(&encode_u64(998), 3), vec![998, 999, 5000]);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod art;
pub mod cursor;
pub mod error;
pub mod frozen;
pub mod histogram;
pub mod hybrid;
pub mod key;
pub mod noderef;

pub use art::DynamicTree;
pub use error::{Error, Result};
pub use frozen::{MergeOutcome, ShapePolicy, StaticTree};
pub use hybrid::{HybridIndex, HybridScan, IndexStats};
pub use key::LoadKey;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Configuration for a [`HybridIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Length in bytes of every key
    pub key_len: usize,
    /// Merge automatically before writes once the thresholds below are met
    pub auto_merge: bool,
    /// Dynamic records required before an automatic merge
    pub merge_threshold: usize,
    /// Merge once dynamic records times this ratio exceed static records
    pub merge_ratio: usize,
    /// Fan-out above which static nodes always use a 256-way array
    pub dense_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_len: 8,
            auto_merge: false,
            merge_threshold: 1_000_000,
            merge_ratio: 10,
            dense_threshold: 227,
        }
    }
}

impl Config {
    /// Check the configuration for values no index can work with.
    pub fn validate(&self) -> Result<()> {
        if self.key_len == 0 {
            return Err(Error::ZeroKeyLength);
        }
        if self.merge_ratio == 0 {
            return Err(Error::ZeroMergeRatio);
        }
        if self.dense_threshold > 256 {
            return Err(Error::DenseThresholdTooLarge(self.dense_threshold));
        }
        Ok(())
    }

    /// Static node shape policy derived from this configuration.
    pub fn shape_policy(&self) -> ShapePolicy {
        ShapePolicy {
            dense_threshold: self.dense_threshold,
        }
    }
}

/// A [`HybridIndex`] behind a reader-writer lock.
///
/// Readers run concurrently; writes and merges take the lock exclusively.
pub struct SharedIndex<L> {
    inner: RwLock<HybridIndex<L>>,
}

impl<L: LoadKey> SharedIndex<L> {
    /// Create a shared index with the default configuration.
    pub fn new(loader: L) -> Self {
        Self::from_index(HybridIndex::new(loader))
    }

    /// Create a shared index with the given configuration.
    pub fn with_config(config: Config, loader: L) -> Result<Self> {
        Ok(Self::from_index(HybridIndex::with_config(config, loader)?))
    }

    /// Wrap an existing index.
    pub fn from_index(index: HybridIndex<L>) -> Self {
        Self {
            inner: RwLock::new(index),
        }
    }

    /// Insert `record` under `key`. See [`HybridIndex::insert`].
    pub fn insert(&self, key: &[u8], record: u64) -> bool {
        self.inner.write().insert(key, record)
    }

    /// Insert or replace. See [`HybridIndex::upsert`].
    pub fn upsert(&self, key: &[u8], record: u64) {
        self.inner.write().upsert(key, record);
    }

    /// Point lookup.
    pub fn get(&self, key: &[u8]) -> Option<u64> {
        self.inner.read().get(key)
    }

    /// Remove `key` from the dynamic layer.
    pub fn erase(&self, key: &[u8]) -> bool {
        self.inner.write().erase(key)
    }

    /// Up to `count` records starting at the first key `>= key`.
    pub fn scan(&self, key: &[u8], count: usize) -> Vec<u64> {
        self.inner.read().scan(key, count)
    }

    /// Fold the dynamic layer into the static layer.
    pub fn merge(&self) -> MergeOutcome {
        self.inner.write().merge()
    }

    /// Total records across both layers, counting shadowed keys twice.
    pub fn len(&self) -> usize {
        let inner = self.inner.read();
        inner.dynamic_len() + inner.static_len()
    }

    /// Check if both layers are empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Diagnostics of both layers.
    pub fn stats(&self) -> IndexStats {
        self.inner.read().stats()
    }

    /// Unwrap the index.
    pub fn into_inner(self) -> HybridIndex<L> {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod proptests;
