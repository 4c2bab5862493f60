use super::window::BlueWindowManager;
use crate::model::{block_node::BlockNode, stores::block_index::BlockNodeStoreReader};
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;
use blockdag_math::{BigInt, Uint256, big_to_compact, compact_to_big};
use itertools::Itertools;
use num_traits::Zero;
use std::sync::Arc;

/// Retargets the proof of work difficulty over a blue window
#[derive(Clone)]
pub struct DifficultyManager<T: BlockNodeStoreReader> {
    window_manager: BlueWindowManager<T>,
    difficulty_window_size: usize,
    target_time_per_block: u64,
    max_difficulty_target: BigInt,
    max_difficulty_bits: u32,
}

impl<T: BlockNodeStoreReader> DifficultyManager<T> {
    pub fn new(
        window_manager: BlueWindowManager<T>,
        difficulty_window_size: usize,
        target_time_per_block: u64,
        max_difficulty_target: Uint256,
        max_difficulty_bits: u32,
    ) -> Self {
        Self {
            window_manager,
            difficulty_window_size,
            target_time_per_block,
            max_difficulty_target: max_difficulty_target.to_bigint(),
            max_difficulty_bits,
        }
    }

    pub fn max_difficulty_target(&self) -> &BigInt {
        &self.max_difficulty_target
    }

    /// Returns the compact target required of a block whose bluest parent is `bluest_parent`.
    ///
    /// Until the bluest parent has a blue score of at least `window_size + 1` the maximal target
    /// is required. Otherwise a window of `window_size + 1` blues yields `window_size` block
    /// intervals, and the average target of the window is scaled by the ratio of the actual
    /// to the expected window duration.
    pub fn required_difficulty(&self, bluest_parent: Option<&Arc<BlockNode>>) -> Result<u32, StoreError> {
        let window_size = self.difficulty_window_size;
        let Some(bluest_parent) = bluest_parent else {
            return Ok(self.max_difficulty_bits);
        };
        if bluest_parent.blue_score() < window_size as u64 + 1 {
            return Ok(self.max_difficulty_bits);
        }

        let window = self.window_manager.blue_window(bluest_parent, window_size + 1)?;
        let (min_timestamp, max_timestamp) = window.iter().map(|node| node.timestamp).minmax().into_option().unwrap_or_default();
        let window_duration = max_timestamp - min_timestamp;

        let targets_sum: BigInt = window.iter().take(window_size).map(|node| compact_to_big(node.bits)).sum();
        let average_target = targets_sum / BigInt::from(window_size);
        let new_target =
            average_target * BigInt::from(window_duration) / BigInt::from(self.target_time_per_block * window_size as u64);

        if new_target > self.max_difficulty_target {
            return Ok(self.max_difficulty_bits);
        }
        Ok(big_to_compact(&new_target))
    }

    /// Whether the target `bits` encode lies within `(0, max_difficulty_target]`
    pub fn is_target_in_range(&self, bits: u32) -> bool {
        let target = compact_to_big(bits);
        target > BigInt::zero() && target <= self.max_difficulty_target
    }
}

/// Checks that `hash`, read as a little endian 256-bit integer, does not exceed the target encoded by `bits`
pub fn check_proof_of_work(hash: Hash, bits: u32) -> bool {
    Uint256::from_le_bytes(hash.as_bytes()).to_bigint() <= compact_to_big(bits)
}
