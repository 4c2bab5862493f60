pub mod compact;
pub mod uint;

pub use compact::{big_to_compact, compact_to_big, normalize_compact};
pub use num_bigint::{BigInt, BigUint, Sign};
pub use uint::{Uint256, UintError};
