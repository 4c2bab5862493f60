mod hashers;

pub use hashers::{BlockHash, Hasher, HasherBase};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash as StdHash, Hasher as StdHasher};
use std::str::{self, FromStr};

pub const HASH_SIZE: usize = 32;

pub use faster_hex::Error as HexError;

/// A 256-bit block identifier. Ordering is byte-wise lexicographic over the
/// 32 bytes, which is the tie-breaking order used throughout consensus.
#[derive(PartialEq, Eq, Clone, Copy, Default, PartialOrd, Ord)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; HASH_SIZE]);

    #[inline(always)]
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    #[inline(always)]
    pub const fn as_bytes(&self) -> [u8; HASH_SIZE] {
        self.0
    }

    #[inline(always)]
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(<[u8; HASH_SIZE]>::try_from(bytes).expect("slice must have the length of a Hash"))
    }

    /// Builds a hash whose last eight bytes hold `word` in big-endian order,
    /// so that numeric order of words equals the byte order of the hashes.
    #[inline(always)]
    pub const fn from_u64_word(word: u64) -> Self {
        let mut bytes = [0u8; HASH_SIZE];
        let be = word.to_be_bytes();
        let mut i = 0;
        while i < 8 {
            bytes[HASH_SIZE - 8 + i] = be[i];
            i += 1;
        }
        Self(bytes)
    }

    #[inline(always)]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }

    pub fn to_hex(&self) -> String {
        let mut hex = [0u8; HASH_SIZE * 2];
        faster_hex::hex_encode(&self.0, &mut hex).expect("The output is exactly twice the size of the input");
        str::from_utf8(&hex).expect("hex is always valid UTF-8").to_owned()
    }
}

impl StdHash for Hash {
    #[inline(always)]
    fn hash<H: StdHasher>(&self, state: &mut H) {
        // The trailing word varies for both real digests and word-built test hashes
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.0[HASH_SIZE - 8..]);
        state.write_u64(u64::from_le_bytes(word));
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for Hash {
    type Err = HexError;

    fn from_str(hash_str: &str) -> Result<Self, Self::Err> {
        if hash_str.len() != HASH_SIZE * 2 {
            return Err(HexError::InvalidLength(hash_str.len()));
        }
        let mut bytes = [0u8; HASH_SIZE];
        faster_hex::hex_decode(hash_str.as_bytes(), &mut bytes)?;
        Ok(Hash(bytes))
    }
}

impl From<u64> for Hash {
    #[inline(always)]
    fn from(word: u64) -> Self {
        Self::from_u64_word(word)
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8; HASH_SIZE]> for Hash {
    #[inline(always)]
    fn as_ref(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for Hash {
    #[inline(always)]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() { serializer.serialize_str(&self.to_hex()) } else { self.0.serialize(serializer) }
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
            Hash::from_str(&s).map_err(de::Error::custom)
        } else {
            <[u8; HASH_SIZE]>::deserialize(deserializer).map(Hash)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_basics() {
        let hash_str = "8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3af";
        let hash = Hash::from_str(hash_str).unwrap();
        assert_eq!(hash_str, hash.to_string());
        let hash2 = Hash::from_str(hash_str).unwrap();
        assert_eq!(hash, hash2);

        let hash3 = Hash::from_str("8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3ab").unwrap();
        assert_ne!(hash2, hash3);

        let odd_str = "8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3a";
        let short_str = "8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3";
        assert!(Hash::from_str(odd_str).is_err());
        assert!(Hash::from_str(short_str).is_err());
    }

    #[test]
    fn test_word_order_matches_byte_order() {
        let words = [0u64, 1, 255, 256, 70_000, u64::MAX - 1, u64::MAX];
        for pair in words.windows(2) {
            assert!(Hash::from(pair[0]) < Hash::from(pair[1]));
        }
        assert!(Hash::from(0).is_zero());
        assert_eq!(Hash::ZERO, Hash::from(0));
    }

    #[test]
    fn test_serde_formats() {
        let hash = Hash::from(0x1234_5678_9abc_def0);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash));
        assert_eq!(serde_json::from_str::<Hash>(&json).unwrap(), hash);

        let bin = bincode::serialize(&hash).unwrap();
        assert_eq!(bin.len(), HASH_SIZE);
        assert_eq!(bincode::deserialize::<Hash>(&bin).unwrap(), hash);
    }
}
