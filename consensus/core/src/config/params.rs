pub use super::{
    constants::consensus::*,
    genesis::{DEVNET_GENESIS, GENESIS, GenesisBlock, SIMNET_GENESIS, TESTNET_GENESIS},
};
use crate::{
    KType,
    errors::config::{ConfigError, ConfigResult},
    network::NetworkType,
};
use blockdag_math::{Uint256, big_to_compact};
use serde::{Deserialize, Serialize};

/// Consensus parameters. Contains settings and configurations which are consensus-sensitive.
/// Changing one of these on a network node would exclude and prevent it from reaching consensus
/// with the other unmodified nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
    pub net: NetworkType,
    pub genesis: GenesisBlock,

    /// The k-cluster parameter bounding the anticone size of blue blocks
    pub ghostdag_k: KType,

    /// Number of blue blocks used to calculate the required difficulty of each block
    pub difficulty_window_size: usize,

    /// Target time per block (in seconds)
    pub target_time_per_block: u64,

    /// Defines the highest allowed proof of work difficulty value for a block as a [`Uint256`]
    pub max_difficulty_target: Uint256,

    /// Compact form of `max_difficulty_target`
    pub max_difficulty_bits: u32,

    /// Divisor of the blue score used for the finality score
    pub finality_interval: u64,

    /// Number of selected-chain timestamps used to calculate the past median time. Must be odd
    pub past_median_time_window_size: usize,

    /// Timestamp deviation tolerance (in block time units)
    pub timestamp_deviation_tolerance: u64,

    pub max_block_parents: u8,
    pub skip_proof_of_work: bool,
}

impl Params {
    #[inline]
    #[must_use]
    pub fn ghostdag_k(&self) -> KType {
        self.ghostdag_k
    }

    /// The furthest a block timestamp may lie ahead of the local clock (in seconds)
    #[inline]
    #[must_use]
    pub fn max_future_time_offset(&self) -> i64 {
        (self.timestamp_deviation_tolerance * self.target_time_per_block) as i64
    }

    pub fn network_name(&self) -> String {
        self.net.to_string()
    }

    /// Checks the internal consistency of the params
    pub fn validate(&self) -> ConfigResult<()> {
        if self.ghostdag_k == 0 {
            return Err(ConfigError::ZeroGhostdagK);
        }
        if self.difficulty_window_size == 0 {
            return Err(ConfigError::ZeroDifficultyWindow);
        }
        if self.target_time_per_block == 0 {
            return Err(ConfigError::ZeroTargetTimePerBlock);
        }
        if self.finality_interval == 0 {
            return Err(ConfigError::ZeroFinalityInterval);
        }
        if self.past_median_time_window_size % 2 == 0 {
            return Err(ConfigError::EvenPastMedianTimeWindow(self.past_median_time_window_size));
        }
        if self.max_block_parents == 0 {
            return Err(ConfigError::ZeroMaxBlockParents);
        }
        let expected = big_to_compact(&self.max_difficulty_target.to_bigint());
        if self.max_difficulty_target.is_zero() || expected != self.max_difficulty_bits {
            return Err(ConfigError::MismatchedMaxDifficultyBits(self.max_difficulty_bits, expected));
        }
        Ok(())
    }
}

impl From<NetworkType> for Params {
    fn from(value: NetworkType) -> Self {
        match value {
            NetworkType::Mainnet => MAINNET_PARAMS,
            NetworkType::Testnet => TESTNET_PARAMS,
            NetworkType::Devnet => DEVNET_PARAMS,
            NetworkType::Simnet => SIMNET_PARAMS,
        }
    }
}

pub const MAINNET_PARAMS: Params = Params {
    net: NetworkType::Mainnet,
    genesis: GENESIS,
    ghostdag_k: DEFAULT_GHOSTDAG_K,
    difficulty_window_size: DEFAULT_DIFFICULTY_WINDOW_SIZE,
    target_time_per_block: DEFAULT_TARGET_TIME_PER_BLOCK,
    max_difficulty_target: MAX_DIFFICULTY_TARGET,
    max_difficulty_bits: MAX_DIFFICULTY_BITS,
    finality_interval: DEFAULT_FINALITY_INTERVAL,
    past_median_time_window_size: PAST_MEDIAN_TIME_WINDOW_SIZE,
    timestamp_deviation_tolerance: TIMESTAMP_DEVIATION_TOLERANCE,
    max_block_parents: DEFAULT_MAX_BLOCK_PARENTS,
    skip_proof_of_work: false,
};

pub const TESTNET_PARAMS: Params = Params {
    net: NetworkType::Testnet,
    genesis: TESTNET_GENESIS,
    ghostdag_k: DEFAULT_GHOSTDAG_K,
    difficulty_window_size: DEFAULT_DIFFICULTY_WINDOW_SIZE,
    target_time_per_block: DEFAULT_TARGET_TIME_PER_BLOCK,
    max_difficulty_target: MAX_DIFFICULTY_TARGET,
    max_difficulty_bits: MAX_DIFFICULTY_BITS,
    finality_interval: DEFAULT_FINALITY_INTERVAL,
    past_median_time_window_size: PAST_MEDIAN_TIME_WINDOW_SIZE,
    timestamp_deviation_tolerance: TIMESTAMP_DEVIATION_TOLERANCE,
    max_block_parents: DEFAULT_MAX_BLOCK_PARENTS,
    skip_proof_of_work: false,
};

pub const SIMNET_PARAMS: Params = Params {
    net: NetworkType::Simnet,
    genesis: SIMNET_GENESIS,
    ghostdag_k: DEFAULT_GHOSTDAG_K,
    difficulty_window_size: DEFAULT_DIFFICULTY_WINDOW_SIZE,
    target_time_per_block: DEFAULT_TARGET_TIME_PER_BLOCK,
    max_difficulty_target: MAX_DIFFICULTY_TARGET,
    max_difficulty_bits: MAX_DIFFICULTY_BITS,
    finality_interval: DEFAULT_FINALITY_INTERVAL,
    past_median_time_window_size: PAST_MEDIAN_TIME_WINDOW_SIZE,
    timestamp_deviation_tolerance: TIMESTAMP_DEVIATION_TOLERANCE,
    max_block_parents: DEFAULT_MAX_BLOCK_PARENTS,
    // Simnet blocks are generated locally by tests and simulations
    skip_proof_of_work: true,
};

pub const DEVNET_PARAMS: Params = Params {
    net: NetworkType::Devnet,
    genesis: DEVNET_GENESIS,
    ghostdag_k: DEFAULT_GHOSTDAG_K,
    difficulty_window_size: DEFAULT_DIFFICULTY_WINDOW_SIZE,
    target_time_per_block: DEFAULT_TARGET_TIME_PER_BLOCK,
    max_difficulty_target: MAX_DIFFICULTY_TARGET,
    max_difficulty_bits: MAX_DIFFICULTY_BITS,
    finality_interval: DEFAULT_FINALITY_INTERVAL,
    past_median_time_window_size: PAST_MEDIAN_TIME_WINDOW_SIZE,
    timestamp_deviation_tolerance: TIMESTAMP_DEVIATION_TOLERANCE,
    max_block_parents: DEFAULT_MAX_BLOCK_PARENTS,
    skip_proof_of_work: false,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for net in [NetworkType::Mainnet, NetworkType::Testnet, NetworkType::Devnet, NetworkType::Simnet] {
            let params = Params::from(net);
            assert_eq!(params.net, net);
            params.validate().unwrap();
        }
        assert_eq!(MAINNET_PARAMS.max_future_time_offset(), 132);
        assert_eq!(MAINNET_PARAMS.network_name(), "mainnet");
    }

    #[test]
    fn test_validate_rejects_inconsistent_params() {
        let mut params = SIMNET_PARAMS;
        params.past_median_time_window_size = 10;
        assert!(matches!(params.validate(), Err(ConfigError::EvenPastMedianTimeWindow(10))));

        let mut params = SIMNET_PARAMS;
        params.max_difficulty_bits = 0x1d00ffff;
        assert!(matches!(params.validate(), Err(ConfigError::MismatchedMaxDifficultyBits(0x1d00ffff, 0x207fffff))));

        let mut params = SIMNET_PARAMS;
        params.ghostdag_k = 0;
        assert!(matches!(params.validate(), Err(ConfigError::ZeroGhostdagK)));
    }

    #[test]
    fn test_params_serde() {
        let json = serde_json::to_string(&TESTNET_PARAMS).unwrap();
        let params: Params = serde_json::from_str(&json).unwrap();
        assert_eq!(params.genesis.hash, TESTNET_GENESIS.hash);
        assert_eq!(params.max_difficulty_target, MAX_DIFFICULTY_TARGET);
        assert_eq!(params.difficulty_window_size, TESTNET_PARAMS.difficulty_window_size);
    }
}
