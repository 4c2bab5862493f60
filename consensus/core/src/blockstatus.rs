use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Validation state of a block. Flags only accumulate over the lifetime of a block,
    /// except through an explicit unset by the block index.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BlockStatus: u8 {
        /// The block header is fully stored
        const DATA_STORED = 1 << 0;

        /// The block passed full validation
        const VALID = 1 << 1;

        /// The block failed validation
        const VALIDATE_FAILED = 1 << 2;

        /// Some ancestor of the block failed validation
        const INVALID_ANCESTOR = 1 << 3;
    }
}

impl BlockStatus {
    pub fn have_data(self) -> bool {
        self.contains(BlockStatus::DATA_STORED)
    }

    pub fn known_valid(self) -> bool {
        self.contains(BlockStatus::VALID)
    }

    pub fn known_invalid(self) -> bool {
        self.intersects(BlockStatus::VALIDATE_FAILED | BlockStatus::INVALID_ANCESTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_predicates() {
        let mut status = BlockStatus::DATA_STORED;
        assert!(status.have_data());
        assert!(!status.known_valid());
        assert!(!status.known_invalid());

        status |= BlockStatus::VALID;
        assert!(status.known_valid());

        status.remove(BlockStatus::VALID);
        status |= BlockStatus::INVALID_ANCESTOR;
        assert!(status.known_invalid());
        assert!(BlockStatus::VALIDATE_FAILED.known_invalid());
        assert!(!BlockStatus::default().have_data());
    }

    #[test]
    fn test_status_serializes_as_bits() {
        let status = BlockStatus::DATA_STORED | BlockStatus::VALIDATE_FAILED;
        let bytes = bincode::serialize(&status).unwrap();
        assert_eq!(bincode::deserialize::<BlockStatus>(&bytes).unwrap(), status);
    }
}
