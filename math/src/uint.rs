use num_bigint::{BigInt, BigUint, Sign};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt::{Display, Formatter, LowerHex},
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UintError {
    #[error("value is negative")]
    Negative,

    #[error("value needs {0} bits which exceeds 256")]
    Overflow(u64),
}

/// Little-endian 256-bit unsigned integer with const construction, used where a
/// target must live in a `const` (e.g. network params). Arithmetic goes through
/// [`BigInt`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Uint256(pub [u64; 4]);

impl Uint256 {
    pub const ZERO: Self = Uint256([0; 4]);
    pub const MAX: Self = Uint256([u64::MAX; 4]);
    pub const BITS: u32 = 256;

    #[inline]
    pub const fn from_u64(n: u64) -> Self {
        Uint256([n, 0, 0, 0])
    }

    #[inline(always)]
    pub fn is_zero(self) -> bool {
        self.0.iter().all(|&a| a == 0)
    }

    /// Return the least number of bits needed to represent the number
    #[inline(always)]
    pub fn bits(&self) -> u32 {
        for (i, &word) in self.0.iter().enumerate().rev() {
            if word != 0 {
                return u64::BITS * (i as u32 + 1) - word.leading_zeros();
            }
        }
        0
    }

    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        let mut out = [0u64; 4];
        for (word, chunk) in out.iter_mut().zip(bytes.chunks_exact(8)) {
            *word = u64::from_le_bytes(chunk.try_into().expect("chunks are exactly 8 bytes"));
        }
        Uint256(out)
    }

    pub fn to_le_bytes(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (chunk, word) in out.chunks_exact_mut(8).zip(self.0) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    pub fn to_biguint(self) -> BigUint {
        BigUint::from_bytes_le(&self.to_le_bytes())
    }

    pub fn to_bigint(self) -> BigInt {
        BigInt::from_biguint(Sign::Plus, self.to_biguint())
    }

    pub fn try_from_bigint(value: &BigInt) -> Result<Self, UintError> {
        if value.sign() == Sign::Minus {
            return Err(UintError::Negative);
        }
        let magnitude = value.magnitude();
        if magnitude.bits() > Self::BITS as u64 {
            return Err(UintError::Overflow(magnitude.bits()));
        }
        let mut bytes = [0u8; 32];
        let le = magnitude.to_bytes_le();
        bytes[..le.len()].copy_from_slice(&le);
        Ok(Self::from_le_bytes(bytes))
    }
}

impl From<u64> for Uint256 {
    fn from(n: u64) -> Self {
        Self::from_u64(n)
    }
}

impl From<Uint256> for BigInt {
    fn from(value: Uint256) -> Self {
        value.to_bigint()
    }
}

impl TryFrom<BigInt> for Uint256 {
    type Error = UintError;

    fn try_from(value: BigInt) -> Result<Self, Self::Error> {
        Self::try_from_bigint(&value)
    }
}

impl PartialOrd for Uint256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Uint256 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl LowerHex for Uint256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut be = self.to_le_bytes();
        be.reverse();
        let mut hex = [0u8; 64];
        faster_hex::hex_encode(&be, &mut hex).expect("The output is exactly twice the size of the input");
        let s = std::str::from_utf8(&hex).expect("hex is always valid UTF-8");
        let trimmed = s.trim_start_matches('0');
        f.pad_integral(true, "0x", if trimmed.is_empty() { "0" } else { trimmed })
    }
}

impl Display for Uint256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.to_biguint(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{One, Zero};
    use rand::{RngCore, SeedableRng, rngs::StdRng};

    #[test]
    fn test_bigint_conversions() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..64 {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let value = Uint256::from_le_bytes(bytes);
            assert_eq!(Uint256::try_from(value.to_bigint()).unwrap(), value);
            assert_eq!(value.to_le_bytes(), bytes);
        }

        let max: BigInt = (BigInt::one() << 256) - 1;
        assert_eq!(Uint256::try_from(max.clone()).unwrap(), Uint256::MAX);
        assert_eq!(Uint256::try_from(max + 1), Err(UintError::Overflow(257)));
        assert_eq!(Uint256::try_from(BigInt::from(-1)), Err(UintError::Negative));
        assert_eq!(Uint256::try_from(BigInt::zero()).unwrap(), Uint256::ZERO);
    }

    #[test]
    fn test_ordering_and_bits() {
        let low = Uint256([u64::MAX, u64::MAX, u64::MAX, 0]);
        let high = Uint256([0, 0, 0, 1]);
        assert!(low < high);
        assert_eq!(high.bits(), 193);
        assert_eq!(Uint256::ZERO.bits(), 0);
        assert_eq!(Uint256::from_u64(255).bits(), 8);
        assert_eq!(format!("{:x}", Uint256::from_u64(0xabc)), "abc");
        assert_eq!(format!("{:#x}", Uint256::ZERO), "0x0");
        assert_eq!(Uint256::from_u64(1234).to_string(), "1234");
    }
}
