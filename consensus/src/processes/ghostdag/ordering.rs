use blockdag_consensus_core::BlueScore;
use blockdag_hashes::Hash;
use std::cmp::{Ordering, Reverse};

/// The key maximized when choosing a selected parent or a selected tip: the highest blue score wins,
/// ties broken in favor of the smaller hash
pub fn bluest_key(hash: Hash, blue_score: BlueScore) -> (BlueScore, Reverse<Hash>) {
    (blue_score, Reverse(hash))
}

/// A block paired with its blue score, ordered by (blue score, hash). This is the
/// deterministic topological order used for mergesets
#[derive(Eq, Clone, Copy, Debug)]
pub struct SortableBlock {
    pub hash: Hash,
    pub blue_score: BlueScore,
}

impl SortableBlock {
    pub fn new(hash: Hash, blue_score: BlueScore) -> Self {
        Self { hash, blue_score }
    }
}

impl PartialEq for SortableBlock {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl PartialOrd for SortableBlock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortableBlock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.blue_score.cmp(&other.blue_score).then_with(|| self.hash.cmp(&other.hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sortable_block_order() {
        let mut blocks = vec![SortableBlock::new(9.into(), 2), SortableBlock::new(3.into(), 5), SortableBlock::new(1.into(), 2)];
        blocks.sort();
        let hashes: Vec<Hash> = blocks.iter().map(|b| b.hash).collect();
        assert_eq!(hashes, vec![Hash::from(1), Hash::from(9), Hash::from(3)]);
    }

    #[test]
    fn test_bluest_key() {
        assert!(bluest_key(9.into(), 3) > bluest_key(1.into(), 2));
        assert!(bluest_key(1.into(), 2) > bluest_key(9.into(), 2));
    }
}
