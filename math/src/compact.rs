//!
//! Compact ("bits") representation of difficulty targets.
//!
//! A compact value packs a big integer into 32 bits: the high byte is the
//! length of the number in bytes (the exponent), bit 23 is the sign and the
//! low 23 bits are the most significant bytes of the magnitude (the mantissa).
//!
//! ```text
//! N = (-1^sign) * mantissa * 256^(exponent - 3)
//! ```

use num_bigint::{BigInt, Sign};
use num_traits::Zero;

const MANTISSA_MASK: u32 = 0x007f_ffff;
const SIGN_BIT: u32 = 0x0080_0000;

/// Expands a compact target into a big integer. Bits of the mantissa that are
/// shifted out for small exponents are dropped.
pub fn compact_to_big(compact: u32) -> BigInt {
    let mantissa = compact & MANTISSA_MASK;
    let is_negative = compact & SIGN_BIT != 0;
    let exponent = compact >> 24;

    let value = if exponent <= 3 {
        BigInt::from(mantissa >> (8 * (3 - exponent)))
    } else {
        BigInt::from(mantissa) << (8 * (exponent - 3) as usize)
    };

    if is_negative { -value } else { value }
}

/// Packs a big integer into its compact form. Precision below the three most
/// significant bytes is lost.
pub fn big_to_compact(value: &BigInt) -> u32 {
    if value.is_zero() {
        return 0;
    }

    let magnitude = value.magnitude();
    let mut exponent = magnitude.bits().div_ceil(8) as u32;
    let mut mantissa = if exponent <= 3 {
        lowest_u32(magnitude) << (8 * (3 - exponent))
    } else {
        lowest_u32(&(magnitude >> (8 * (exponent - 3) as usize)))
    };

    // The sign bit is taken, so move one byte into the exponent
    if mantissa & SIGN_BIT != 0 {
        mantissa >>= 8;
        exponent += 1;
    }

    let mut compact = (exponent << 24) | mantissa;
    if value.sign() == Sign::Minus {
        compact |= SIGN_BIT;
    }
    compact
}

/// Returns the canonical compact encoding of the value `compact` expands to.
pub fn normalize_compact(compact: u32) -> u32 {
    big_to_compact(&compact_to_big(compact))
}

fn lowest_u32(value: &num_bigint::BigUint) -> u32 {
    value.iter_u32_digits().next().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    #[test]
    fn test_compact_to_big() {
        let tests: &[(u32, i64)] = &[
            (0x00000000, 0),
            (0x00989680, 0),
            (0x01003456, 0),
            (0x01123456, 0x12),
            (0x02008000, 0x80),
            (0x03123456, 0x123456),
            (0x04123456, 0x12345600),
            (0x04923456, -0x12345600),
            (0x05009234, 0x92340000),
        ];
        for &(compact, expected) in tests {
            assert_eq!(compact_to_big(compact), BigInt::from(expected), "compact {:#010x}", compact);
        }

        let genesis_like = compact_to_big(0x1d00ffff);
        assert_eq!(genesis_like, BigInt::from(0xffffu64) << 208);
    }

    #[test]
    fn test_big_to_compact() {
        let tests: &[(i64, u32)] = &[
            (0, 0),
            (-1, 0x01810000),
            (0x12, 0x01120000),
            (0x80, 0x02008000),
            (0x123456, 0x03123456),
            (0x12345600, 0x04123456),
            (-0x12345600, 0x04923456),
            (0x92340000, 0x05009234),
        ];
        for &(value, expected) in tests {
            assert_eq!(big_to_compact(&BigInt::from(value)), expected, "value {:#x}", value);
        }
    }

    #[test]
    fn test_pow_max_compact_form() {
        let pow_max = (BigInt::one() << 255) - 1;
        assert_eq!(big_to_compact(&pow_max), 0x207fffff);

        // Expanding the compact form truncates below the mantissa precision
        let expanded = compact_to_big(0x207fffff);
        assert!(expanded <= pow_max);
        assert_eq!(big_to_compact(&expanded), 0x207fffff);
    }

    #[test]
    fn test_normalization_round_trip() {
        // A compact value with precision the mantissa cannot hold normalizes to its canonical form
        assert_eq!(normalize_compact(0x01123456), 0x01120000);
        for compact in [0x1d00ffffu32, 0x207fffff, 0x1b0404cb, 0x03123456, 0x04923456] {
            let normalized = normalize_compact(compact);
            assert_eq!(compact_to_big(normalized), compact_to_big(compact));
            assert_eq!(normalize_compact(normalized), normalized);
        }
    }
}
