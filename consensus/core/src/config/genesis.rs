use crate::{config::constants::consensus::BLOCK_VERSION, header::Header};
use blockdag_hashes::Hash;
use serde::{Deserialize, Serialize};

/// The fields required for building the genesis header. The hash is taken as given:
/// headers are addressed by their cached hash throughout consensus.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisBlock {
    pub hash: Hash,
    pub version: u16,
    pub hash_merkle_root: Hash,
    pub accepted_id_merkle_root: Hash,
    pub utxo_commitment: Hash,
    pub timestamp: i64,
    pub bits: u32,
    pub nonce: u64,
}

impl GenesisBlock {
    pub fn build_header(&self) -> Header {
        Header {
            hash: self.hash,
            version: self.version,
            parents: Vec::new(),
            hash_merkle_root: self.hash_merkle_root,
            accepted_id_merkle_root: self.accepted_id_merkle_root,
            utxo_commitment: self.utxo_commitment,
            timestamp: self.timestamp,
            bits: self.bits,
            nonce: self.nonce,
        }
    }
}

impl From<&GenesisBlock> for Header {
    fn from(genesis: &GenesisBlock) -> Self {
        genesis.build_header()
    }
}

pub const GENESIS: GenesisBlock = GenesisBlock {
    hash: Hash::from_bytes([
        0x58, 0xc2, 0xd4, 0x19, 0x9e, 0x21, 0xf9, 0x10, 0xd1, 0x57, 0x1d, 0x11, 0x49, 0x69, 0xce, 0xce, 0xf4, 0x8f, 0x09, 0xf9, 0x34,
        0xd4, 0x2c, 0xcb, 0x6a, 0x28, 0x1a, 0x15, 0x86, 0x8f, 0x29, 0x99,
    ]),
    version: BLOCK_VERSION,
    hash_merkle_root: Hash::from_bytes([
        0x8e, 0xc8, 0x98, 0x56, 0x8c, 0x68, 0x01, 0xd1, 0x3d, 0xf4, 0xee, 0x6e, 0x2a, 0x1b, 0x54, 0xb7, 0xe6, 0x23, 0x6f, 0x67, 0x1f,
        0x20, 0x95, 0x4f, 0x05, 0x30, 0x64, 0x10, 0x51, 0x8e, 0xeb, 0x32,
    ]),
    accepted_id_merkle_root: Hash::ZERO,
    utxo_commitment: Hash::from_bytes([
        0x71, 0x0f, 0x27, 0xdf, 0x42, 0x3e, 0x63, 0xaa, 0x6c, 0xdb, 0x72, 0xb8, 0x9e, 0xa5, 0xa0, 0x6c, 0xff, 0xa3, 0x99, 0xd6, 0x6f,
        0x16, 0x77, 0x04, 0x45, 0x5b, 0x5a, 0xf5, 0x9d, 0xef, 0x8e, 0x20,
    ]),
    timestamp: 1637609671,
    bits: 0x1e7fffff,
    nonce: 0x3392c,
};

pub const TESTNET_GENESIS: GenesisBlock = GenesisBlock {
    hash: Hash::from_bytes([
        0xf8, 0x96, 0xa3, 0x03, 0x48, 0x73, 0xbe, 0x17, 0x39, 0xfc, 0x43, 0x59, 0x23, 0x68, 0x99, 0xfd, 0x3d, 0x65, 0xd2, 0xbc, 0x94,
        0xf9, 0x78, 0x0d, 0xf0, 0xd0, 0xda, 0x3e, 0xb1, 0xcc, 0x43, 0x70,
    ]),
    version: BLOCK_VERSION,
    hash_merkle_root: Hash::from_bytes([
        0x17, 0x59, 0x5c, 0x09, 0xdd, 0x1a, 0x51, 0x65, 0x14, 0xbc, 0x19, 0xff, 0x29, 0xea, 0xf3, 0xcb, 0xe2, 0x76, 0xf0, 0xc7, 0x86,
        0xf8, 0xb2, 0x3d, 0x1f, 0x5b, 0x4c, 0xa6, 0x2b, 0x0a, 0x33, 0x94,
    ]),
    accepted_id_merkle_root: Hash::ZERO,
    utxo_commitment: Hash::ZERO,
    timestamp: 1664891813,
    bits: 0x1e7fffff,
    nonce: 0x14582,
};

pub const SIMNET_GENESIS: GenesisBlock = GenesisBlock {
    hash: Hash::from_bytes([
        0x41, 0x1f, 0x8c, 0xd2, 0x6f, 0x3d, 0x41, 0x12, 0xdf, 0x29, 0x0a, 0x7b, 0x3d, 0x3a, 0x11, 0x76, 0x05, 0x89, 0x37, 0x4a, 0x21,
        0x31, 0x3b, 0xb8, 0x2f, 0xed, 0x0c, 0x54, 0xf5, 0x63, 0xfa, 0x70,
    ]),
    version: BLOCK_VERSION,
    hash_merkle_root: Hash::from_bytes([
        0x19, 0x46, 0xd6, 0x29, 0xf7, 0xe9, 0x22, 0xa7, 0xbc, 0xed, 0x59, 0x20, 0x4b, 0x42, 0xc7, 0x2d, 0x3d, 0x2f, 0x8a, 0x10, 0xb0,
        0x5f, 0x7a, 0x53, 0x38, 0x42, 0xf6, 0x1d, 0x54, 0x16, 0xdf, 0x2c,
    ]),
    accepted_id_merkle_root: Hash::ZERO,
    utxo_commitment: Hash::ZERO,
    timestamp: 1700000000,
    bits: 0x207fffff,
    nonce: 0x2,
};

pub const DEVNET_GENESIS: GenesisBlock = GenesisBlock {
    hash: Hash::from_bytes([
        0x42, 0x9d, 0x1e, 0xc6, 0x0c, 0x5a, 0x3f, 0xb7, 0x92, 0x11, 0xd8, 0xe3, 0x63, 0x21, 0x88, 0x1a, 0x2f, 0x6e, 0x95, 0xd1, 0x8e,
        0x43, 0x7f, 0x69, 0xc9, 0xd0, 0x09, 0x36, 0x4a, 0x6c, 0xb6, 0x8b,
    ]),
    version: BLOCK_VERSION,
    hash_merkle_root: Hash::from_bytes([
        0x58, 0xab, 0xf2, 0x03, 0x21, 0xd7, 0x07, 0x16, 0x16, 0x2b, 0x6b, 0xf8, 0xd9, 0xf5, 0x89, 0xca, 0x33, 0xae, 0x6e, 0x32, 0xb3,
        0xb1, 0x9a, 0xbb, 0x7f, 0xa6, 0x5d, 0x11, 0x41, 0xa3, 0xf9, 0x4d,
    ]),
    accepted_id_merkle_root: Hash::ZERO,
    utxo_commitment: Hash::ZERO,
    timestamp: 1659602155,
    bits: 0x1e21bc1c,
    nonce: 0x48e5e,
};

#[cfg(test)]
mod tests {
    use super::*;
    use blockdag_math::compact_to_big;

    #[test]
    fn test_genesis_presets() {
        let presets = [GENESIS, TESTNET_GENESIS, SIMNET_GENESIS, DEVNET_GENESIS];
        for (i, genesis) in presets.iter().enumerate() {
            let header = genesis.build_header();
            assert_eq!(header.hash, genesis.hash);
            assert!(header.parents.is_empty());
            assert!(compact_to_big(genesis.bits) > 0.into());
            for other in presets.iter().skip(i + 1) {
                assert_ne!(genesis.hash, other.hash);
            }
        }
    }
}
