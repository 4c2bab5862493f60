use super::{block_node::BlockNode, stores::relations::RelationsStoreReader};
use crate::processes::ghostdag::ordering::bluest_key;
use blockdag_consensus_core::{BlockHashMap, HashMapCustomHasher};
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;
use std::{cmp::Reverse, sync::Arc};

/// An unordered collection of block nodes keyed by hash
#[derive(Clone, Default)]
pub struct BlockSet {
    nodes: BlockHashMap<Arc<BlockNode>>,
}

impl BlockSet {
    pub fn new() -> Self {
        Self { nodes: BlockHashMap::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { nodes: BlockHashMap::with_capacity(capacity) }
    }

    pub fn add(&mut self, node: Arc<BlockNode>) {
        self.nodes.insert(node.hash, node);
    }

    pub fn remove(&mut self, hash: &Hash) -> Option<Arc<BlockNode>> {
        self.nodes.remove(hash)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.nodes.contains_key(hash)
    }

    pub fn get(&self, hash: &Hash) -> Option<&Arc<BlockNode>> {
        self.nodes.get(hash)
    }

    /// Returns a new set holding the nodes of both sets
    pub fn union(&self, other: &BlockSet) -> BlockSet {
        let mut result = self.clone();
        result.add_set(other);
        result
    }

    /// Returns a new set holding the nodes of this set which are not in `other`
    pub fn subtract(&self, other: &BlockSet) -> BlockSet {
        Self { nodes: self.nodes.iter().filter(|(hash, _)| !other.contains(hash)).map(|(hash, node)| (*hash, node.clone())).collect() }
    }

    pub fn add_set(&mut self, other: &BlockSet) {
        self.nodes.extend(other.nodes.iter().map(|(hash, node)| (*hash, node.clone())));
    }

    /// Returns the hashes of the set in ascending order. This is the canonical form of a set
    pub fn hashes(&self) -> Vec<Hash> {
        let mut hashes: Vec<Hash> = self.nodes.keys().copied().collect();
        hashes.sort_unstable();
        hashes
    }

    /// Checks whether any child of `hash` is in this set
    pub fn any_child_in_set(&self, hash: Hash, relations: &(impl RelationsStoreReader + ?Sized)) -> Result<bool, StoreError> {
        Ok(relations.get_children(hash)?.iter().any(|child| self.contains(child)))
    }

    /// The node with the highest blue score, ties broken in favor of the smaller hash
    pub fn bluest(&self) -> Option<&Arc<BlockNode>> {
        self.nodes.values().max_by_key(|node| bluest_key(node.hash, node.blue_score()))
    }

    /// The node with the largest height, ties broken in favor of the smaller hash
    pub fn highest(&self) -> Option<&Arc<BlockNode>> {
        self.nodes.values().max_by_key(|node| (node.height, Reverse(node.hash)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<BlockNode>> {
        self.nodes.values()
    }
}

impl FromIterator<Arc<BlockNode>> for BlockSet {
    fn from_iter<I: IntoIterator<Item = Arc<BlockNode>>>(iter: I) -> Self {
        Self { nodes: iter.into_iter().map(|node| (node.hash, node)).collect() }
    }
}

impl Extend<Arc<BlockNode>> for BlockSet {
    fn extend<I: IntoIterator<Item = Arc<BlockNode>>>(&mut self, iter: I) {
        self.nodes.extend(iter.into_iter().map(|node| (node.hash, node)));
    }
}
