extern crate self as consensus_core;

use std::collections::{HashMap, HashSet};
use std::hash::{BuildHasher, Hasher};

pub use blockdag_hashes::Hash;

pub mod blockhash;
pub mod blockstatus;
pub mod config;
pub mod errors;
pub mod hashing;
pub mod header;
pub mod network;

/// The GHOSTDAG k parameter; it bounds the anticone size of blue blocks
pub type KType = u8;

/// Integer type for accumulated blue scores
pub type BlueScore = u64;

/// Map from Block hash to K type
pub type HashKTypeMap = std::sync::Arc<BlockHashMap<KType>>;

/// This HashMap skips the hashing of the key and uses the key directly as the hash.
/// Should only be used for block hashes that passed proof of work,
/// otherwise it is susceptible to DOS attacks via hash collisions.
pub type BlockHashMap<V> = HashMap<Hash, V, BlockHasher>;

/// Same as `BlockHashMap` but a `HashSet`.
pub type BlockHashSet = HashSet<Hash, BlockHasher>;

pub trait HashMapCustomHasher {
    fn new() -> Self;
    fn with_capacity(capacity: usize) -> Self;
}

// HashMap::new and HashMap::with_capacity are only implemented on Hashmap<K, V, RandomState>,
// so we re-implement them for our custom hasher
impl<V> HashMapCustomHasher for BlockHashMap<V> {
    #[inline(always)]
    fn new() -> Self {
        Self::with_hasher(BlockHasher::new())
    }

    #[inline(always)]
    fn with_capacity(cap: usize) -> Self {
        Self::with_capacity_and_hasher(cap, BlockHasher::new())
    }
}

impl HashMapCustomHasher for BlockHashSet {
    #[inline(always)]
    fn new() -> Self {
        Self::with_hasher(BlockHasher::new())
    }

    #[inline(always)]
    fn with_capacity(cap: usize) -> Self {
        Self::with_capacity_and_hasher(cap, BlockHasher::new())
    }
}

/// `hashes::Hash` writes a single u64 word, which this hasher passes through unchanged.
#[derive(Default, Clone, Copy)]
pub struct BlockHasher(u64);

impl BlockHasher {
    #[inline(always)]
    pub const fn new() -> Self {
        Self(0)
    }
}

impl Hasher for BlockHasher {
    #[inline(always)]
    fn finish(&self) -> u64 {
        self.0
    }

    #[inline(always)]
    fn write_u64(&mut self, v: u64) {
        self.0 = v;
    }

    #[cold]
    fn write(&mut self, bytes: &[u8]) {
        // Only reached by non-hash keys; fold them in so the hasher stays total
        for chunk in bytes.chunks(8) {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            self.0 = self.0.rotate_left(5) ^ u64::from_le_bytes(word);
        }
    }
}

impl BuildHasher for BlockHasher {
    type Hasher = Self;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        Self(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_hash_collections() {
        let mut map = BlockHashMap::<u64>::new();
        let mut set = BlockHashSet::with_capacity(16);
        for i in 0..64u64 {
            map.insert(i.into(), i);
            set.insert(Hash::from(i));
        }
        assert_eq!(map.len(), 64);
        assert_eq!(map[&Hash::from(17)], 17);
        assert!(set.contains(&Hash::from(63)));
        assert!(!set.contains(&Hash::from(64)));
    }
}
