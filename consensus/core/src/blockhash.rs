use blockdag_hashes::{HASH_SIZE, Hash};
use std::sync::Arc;

pub type BlockHashes = Arc<Vec<Hash>>;

/// `blockhash::NONE` is a hash which is used in rare cases as the `None` block hash
pub const NONE: Hash = Hash::from_bytes([0u8; HASH_SIZE]);

/// `blockhash::VIRTUAL` is a special hash representing the `virtual` block.
pub const VIRTUAL: Hash = Hash::from_bytes([0xff; HASH_SIZE]);

pub trait BlockHashExtensions {
    fn is_none(&self) -> bool;
    fn is_virtual(&self) -> bool;
}

impl BlockHashExtensions for Hash {
    fn is_none(&self) -> bool {
        self.eq(&NONE)
    }

    fn is_virtual(&self) -> bool {
        self.eq(&VIRTUAL)
    }
}
