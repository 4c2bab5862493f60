use crate::model::stores::ghostdag::GhostdagStoreReader;
use blockdag_consensus_core::{BlockHashMap, HashMapCustomHasher, blockhash::BlockHashExtensions};
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;

/// The change in the selected parent chain caused by a new virtual selected parent
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainPath {
    /// Blocks which joined the chain, ascending from the fork point
    pub added: Vec<Hash>,
    /// Blocks which left the chain, descending from the previous tip
    pub removed: Vec<Hash>,
}

impl ChainPath {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// The selected parent chain of the virtual, from genesis up to the selected tip,
/// with constant time membership and position queries
#[derive(Clone, Debug)]
pub struct SelectedParentChain {
    slice: Vec<Hash>,
    indices: BlockHashMap<usize>,
}

impl SelectedParentChain {
    pub fn new(genesis: Hash) -> Self {
        let mut indices = BlockHashMap::new();
        indices.insert(genesis, 0);
        Self { slice: vec![genesis], indices }
    }

    /// Rebuilds the chain ending at `tip` by walking its selected parents
    pub fn from_tip(tip: Hash, store: &(impl GhostdagStoreReader + ?Sized)) -> Result<Self, StoreError> {
        let mut slice = vec![tip];
        let mut current = tip;
        loop {
            let selected_parent = store.get_selected_parent(current)?;
            if selected_parent.is_none() {
                break;
            }
            slice.push(selected_parent);
            current = selected_parent;
        }
        slice.reverse();
        let indices = slice.iter().enumerate().map(|(i, hash)| (*hash, i)).collect();
        Ok(Self { slice, indices })
    }

    pub fn tip(&self) -> Hash {
        self.slice[self.slice.len() - 1]
    }

    pub fn genesis(&self) -> Hash {
        self.slice[0]
    }

    pub fn len(&self) -> usize {
        self.slice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slice.is_empty()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.indices.contains_key(hash)
    }

    /// The position of `hash` on the chain, genesis being 0
    pub fn index_of(&self, hash: &Hash) -> Option<usize> {
        self.indices.get(hash).copied()
    }

    pub fn get_by_index(&self, index: usize) -> Option<Hash> {
        self.slice.get(index).copied()
    }

    pub fn as_slice(&self) -> &[Hash] {
        &self.slice
    }

    /// Moves the chain to end at `new_tip` and returns the resulting diff
    pub fn apply_new_tip(&mut self, new_tip: Hash, store: &(impl GhostdagStoreReader + ?Sized)) -> Result<ChainPath, StoreError> {
        let (added_descending, fork_index) = self.walk_to_chain(new_tip, store)?;

        let removed: Vec<Hash> = self.slice[fork_index + 1..].iter().rev().copied().collect();
        for hash in removed.iter() {
            self.indices.remove(hash);
        }
        self.slice.truncate(fork_index + 1);

        let added: Vec<Hash> = added_descending.into_iter().rev().collect();
        for hash in added.iter().copied() {
            self.indices.insert(hash, self.slice.len());
            self.slice.push(hash);
        }

        Ok(ChainPath { added, removed })
    }

    /// Returns the diff required to move from the chain of `hash` to the current chain:
    /// `removed` holds `hash` and its selected ancestors down to (excluding) the first block
    /// on the current chain, and `added` holds the current chain above that block
    pub fn selected_parent_chain(&self, hash: Hash, store: &(impl GhostdagStoreReader + ?Sized)) -> Result<ChainPath, StoreError> {
        let (removed, fork_index) = self.walk_to_chain(hash, store)?;
        let added = self.slice[fork_index + 1..].to_vec();
        Ok(ChainPath { added, removed })
    }

    /// Walks selected parents from `hash` until reaching the chain. Returns the blocks passed
    /// on the way (descending) and the chain index of the fork point
    fn walk_to_chain(&self, hash: Hash, store: &(impl GhostdagStoreReader + ?Sized)) -> Result<(Vec<Hash>, usize), StoreError> {
        let mut path = Vec::new();
        let mut current = hash;
        loop {
            if let Some(index) = self.index_of(&current) {
                return Ok((path, index));
            }
            path.push(current);
            current = store.get_selected_parent(current)?;
            if current.is_none() {
                return Err(StoreError::DataInconsistency(format!("the selected chain of {hash} does not meet the virtual chain")));
            }
        }
    }
}
