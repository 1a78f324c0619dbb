//! Fixed-length keys and the key-loading collaborator.
//!
//! The index never stores keys. Leaves hold an opaque record reference and
//! every comparison that needs bytes beyond what the tree path encodes asks a
//! [`LoadKey`] implementation to reconstruct the key for that record.

use smallvec::{smallvec, SmallVec};

/// Scratch buffer for a reconstructed key. Keys up to 32 bytes stay on the stack.
pub type KeyBuf = SmallVec<[u8; 32]>;

/// Reconstructs the comparison key of a record reference.
///
/// Implementations must be deterministic and order-preserving: the unsigned
/// lexicographic order of the produced bytes is the order of the index.
/// `key` is always exactly the index's key length.
pub trait LoadKey {
    /// Write the key of `record` into `key`.
    fn load_key(&self, record: u64, key: &mut [u8]);
}

impl<F> LoadKey for F
where
    F: Fn(u64, &mut [u8]),
{
    #[inline]
    fn load_key(&self, record: u64, key: &mut [u8]) {
        self(record, key)
    }
}

/// Loader for indexes whose record reference *is* the key: an unsigned
/// integer stored big-endian in the last 8 bytes of the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct BigEndianU64;

impl LoadKey for BigEndianU64 {
    #[inline]
    fn load_key(&self, record: u64, key: &mut [u8]) {
        let bytes = record.to_be_bytes();
        if key.len() >= bytes.len() {
            let split = key.len() - bytes.len();
            key[..split].fill(0);
            key[split..].copy_from_slice(&bytes);
        } else {
            key.copy_from_slice(&bytes[bytes.len() - key.len()..]);
        }
    }
}

/// Encode `value` as an 8-byte big-endian key.
#[inline]
pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Load the `len`-byte key of `record`.
#[inline]
pub fn load<L: LoadKey + ?Sized>(loader: &L, record: u64, len: usize) -> KeyBuf {
    let mut buf: KeyBuf = smallvec![0u8; len];
    loader.load_key(record, &mut buf);
    buf
}

/// Length of the common prefix of `a` and `b`.
#[inline]
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Whether the leaf `record` holds `key`, given that `key[..depth]` has
/// already been matched on the way down.
#[inline]
pub fn leaf_matches<L: LoadKey + ?Sized>(loader: &L, record: u64, key: &[u8], depth: usize) -> bool {
    if depth >= key.len() {
        return true;
    }
    let stored = load(loader, record, key.len());
    stored[depth..] == key[depth..]
}
