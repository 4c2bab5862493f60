use blockdag_consensus_core::{
    BlockHashMap, BlueScore, HashKTypeMap, HashMapCustomHasher, KType,
    blockhash::{self, BlockHashExtensions, BlockHashes},
};
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The output of the coloring protocol for a single block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostdagData {
    pub blue_score: BlueScore,
    pub selected_parent: Hash,
    pub mergeset_blues: BlockHashes,
    pub mergeset_reds: BlockHashes,
    pub blues_anticone_sizes: HashKTypeMap,
}

impl GhostdagData {
    pub fn new(
        blue_score: BlueScore,
        selected_parent: Hash,
        mergeset_blues: BlockHashes,
        mergeset_reds: BlockHashes,
        blues_anticone_sizes: HashKTypeMap,
    ) -> Self {
        Self { blue_score, selected_parent, mergeset_blues, mergeset_reds, blues_anticone_sizes }
    }

    /// Seeds the data of a new block with its selected parent as the first blue
    pub fn new_with_selected_parent(block: Hash, selected_parent: Hash, k: KType) -> Self {
        let mut mergeset_blues: Vec<Hash> = Vec::with_capacity(k as usize + 1);
        let mut blues_anticone_sizes: BlockHashMap<KType> = BlockHashMap::with_capacity(k as usize + 2);
        mergeset_blues.push(selected_parent);
        blues_anticone_sizes.insert(selected_parent, 0);
        blues_anticone_sizes.insert(block, 0);

        Self {
            blue_score: Default::default(),
            selected_parent,
            mergeset_blues: BlockHashes::new(mergeset_blues),
            mergeset_reds: Default::default(),
            blues_anticone_sizes: HashKTypeMap::new(blues_anticone_sizes),
        }
    }

    /// The data of the genesis block: no selected parent, no blues, and a zero anticone entry for itself
    pub fn genesis(genesis_hash: Hash) -> Self {
        let mut blues_anticone_sizes: BlockHashMap<KType> = BlockHashMap::with_capacity(1);
        blues_anticone_sizes.insert(genesis_hash, 0);
        Self {
            blue_score: 0,
            selected_parent: blockhash::NONE,
            mergeset_blues: Default::default(),
            mergeset_reds: Default::default(),
            blues_anticone_sizes: HashKTypeMap::new(blues_anticone_sizes),
        }
    }

    pub fn has_selected_parent(&self) -> bool {
        !self.selected_parent.is_none()
    }

    pub fn mergeset_size(&self) -> usize {
        self.mergeset_blues.len() + self.mergeset_reds.len()
    }

    /// Returns an iterator to the mergeset with no specified order (excluding the selected parent)
    pub fn unordered_mergeset_without_selected_parent(&self) -> impl Iterator<Item = Hash> + '_ {
        self.mergeset_blues
            .iter()
            .skip(1) // Skip the selected parent
            .cloned()
            .chain(self.mergeset_reds.iter().cloned())
    }

    /// Returns an iterator to the mergeset with no specified order (including the selected parent)
    pub fn unordered_mergeset(&self) -> impl Iterator<Item = Hash> + '_ {
        self.mergeset_blues.iter().cloned().chain(self.mergeset_reds.iter().cloned())
    }

    pub fn is_blue(&self, hash: &Hash) -> bool {
        self.mergeset_blues.contains(hash)
    }
}

impl GhostdagData {
    pub fn add_blue(self: &mut Arc<Self>, block: Hash, blue_anticone_size: KType, block_blues_anticone_sizes: &BlockHashMap<KType>) {
        // Extract mutable data
        let data = Arc::make_mut(self);

        // Add the new blue block to mergeset blues
        BlockHashes::make_mut(&mut data.mergeset_blues).push(block);

        // Get a mut ref to internal anticone size map
        let blues_anticone_sizes = HashKTypeMap::make_mut(&mut data.blues_anticone_sizes);

        // Insert the new blue block with its blue anticone size to the map
        blues_anticone_sizes.insert(block, blue_anticone_size);

        // Insert/update map entries for blocks affected by this insertion
        for (blue, size) in block_blues_anticone_sizes {
            blues_anticone_sizes.insert(*blue, size + 1);
        }
    }

    pub fn add_red(self: &mut Arc<Self>, block: Hash) {
        let data = Arc::make_mut(self);
        BlockHashes::make_mut(&mut data.mergeset_reds).push(block);
    }

    pub fn finalize_score(self: &mut Arc<Self>, blue_score: BlueScore) {
        Arc::make_mut(self).blue_score = blue_score;
    }
}

/// Read access to the coloring data of admitted blocks
pub trait GhostdagStoreReader {
    fn get_blue_score(&self, hash: Hash) -> Result<BlueScore, StoreError>;
    fn get_selected_parent(&self, hash: Hash) -> Result<Hash, StoreError>;
    fn get_mergeset_blues(&self, hash: Hash) -> Result<BlockHashes, StoreError>;
    fn get_blues_anticone_sizes(&self, hash: Hash) -> Result<HashKTypeMap, StoreError>;

    /// Returns full block data for the requested hash
    fn get_data(&self, hash: Hash) -> Result<Arc<GhostdagData>, StoreError>;

    /// Check if the store contains data for the requested hash
    fn has(&self, hash: Hash) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mergeset_iterators() {
        let k: KType = 3;
        let mut data = Arc::new(GhostdagData::new_with_selected_parent(10.into(), 1.into(), k));
        data.add_blue(2.into(), 1, &BlockHashMap::from_iter([(Hash::from(1), 0)]));
        data.add_red(3.into());
        data.finalize_score(7);

        assert_eq!(data.blue_score, 7);
        assert_eq!(data.mergeset_size(), 3);
        assert_eq!(data.unordered_mergeset().collect::<Vec<_>>(), vec![Hash::from(1), Hash::from(2), Hash::from(3)]);
        assert_eq!(data.unordered_mergeset_without_selected_parent().collect::<Vec<_>>(), vec![Hash::from(2), Hash::from(3)]);
        assert_eq!(data.blues_anticone_sizes[&Hash::from(1)], 1);
        assert_eq!(data.blues_anticone_sizes[&Hash::from(2)], 1);
        assert_eq!(data.blues_anticone_sizes[&Hash::from(10)], 0);
        assert!(data.is_blue(&2.into()));
        assert!(!data.is_blue(&3.into()));
    }

    #[test]
    fn test_genesis_data() {
        let genesis = GhostdagData::genesis(5.into());
        assert!(!genesis.has_selected_parent());
        assert_eq!(genesis.blue_score, 0);
        assert!(genesis.mergeset_blues.is_empty());
        assert_eq!(genesis.blues_anticone_sizes.len(), 1);
        assert_eq!(genesis.blues_anticone_sizes[&Hash::from(5)], 0);
    }
}
