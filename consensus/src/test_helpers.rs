use crate::model::{
    block_node::BlockNode,
    block_set::BlockSet,
    stores::{block_index::BlockNodeStoreReader, ghostdag::GhostdagData, relations::RelationsStoreReader},
};
use blockdag_consensus_core::{BlockHashMap, HashMapCustomHasher, blockhash::BlockHashes, header::Header};
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;
use std::sync::Arc;

pub fn header_from_precomputed_hash(hash: Hash, parents: Vec<Hash>, timestamp: i64) -> Header {
    let mut header = Header::from_precomputed_hash(hash, parents);
    header.timestamp = timestamp;
    header
}

/// A node with no parents and the given scores, for tests which only need ordering keys
pub fn node_with(hash: Hash, blue_score: u64, height: u64) -> Arc<BlockNode> {
    let mut ghostdag = Arc::new(GhostdagData::genesis(hash));
    ghostdag.finalize_score(blue_score);
    let mut node = BlockNode::new(&Header::from_precomputed_hash(hash, vec![]), &BlockSet::new(), ghostdag).unwrap();
    node.height = height;
    node.chain_height = height;
    Arc::new(node)
}

/// A linear chain of nodes, hashed 1, 2, 3... from genesis up
pub struct NodeChain {
    pub nodes: Vec<Arc<BlockNode>>,
    map: BlockHashMap<Arc<BlockNode>>,
    children: BlockHashMap<BlockHashes>,
}

impl NodeChain {
    pub fn linear(len: usize, start_timestamp: i64, timestamp_step: i64) -> Self {
        let mut nodes: Vec<Arc<BlockNode>> = Vec::with_capacity(len);
        for i in 0..len {
            let hash = Hash::from(i as u64 + 1);
            let timestamp = start_timestamp + i as i64 * timestamp_step;
            let node = match nodes.last() {
                None => BlockNode::new(&header_from_precomputed_hash(hash, vec![], timestamp), &BlockSet::new(), Arc::new(GhostdagData::genesis(hash))),
                Some(parent) => {
                    let mut ghostdag = Arc::new(GhostdagData::new_with_selected_parent(hash, parent.hash, 18));
                    ghostdag.finalize_score(i as u64);
                    let parents: BlockSet = [parent.clone()].into_iter().collect();
                    BlockNode::new(&header_from_precomputed_hash(hash, vec![parent.hash], timestamp), &parents, ghostdag)
                }
            };
            nodes.push(Arc::new(node.unwrap()));
        }

        let map = nodes.iter().map(|n| (n.hash, n.clone())).collect();
        let mut children: BlockHashMap<BlockHashes> = nodes.iter().map(|n| (n.hash, BlockHashes::default())).collect();
        for pair in nodes.windows(2) {
            children.insert(pair[0].hash, BlockHashes::new(vec![pair[1].hash]));
        }
        Self { nodes, map, children }
    }

    pub fn tip(&self) -> Arc<BlockNode> {
        self.nodes.last().cloned().unwrap()
    }

    /// Sets the bits of all nodes
    pub fn set_bits(&mut self, bits: u32) {
        for node in self.nodes.iter_mut() {
            Arc::make_mut(node).bits = bits;
        }
        self.map = self.nodes.iter().map(|n| (n.hash, n.clone())).collect();
    }
}

impl BlockNodeStoreReader for NodeChain {
    fn get_node(&self, hash: Hash) -> Result<Arc<BlockNode>, StoreError> {
        self.map.get(&hash).cloned().ok_or(StoreError::HashNotFound(hash))
    }
}

impl RelationsStoreReader for NodeChain {
    fn get_parents(&self, hash: Hash) -> Result<BlockHashes, StoreError> {
        Ok(self.get_node(hash)?.parents.clone())
    }

    fn get_children(&self, hash: Hash) -> Result<BlockHashes, StoreError> {
        self.children.get(&hash).cloned().ok_or(StoreError::HashNotFound(hash))
    }

    fn has(&self, hash: Hash) -> Result<bool, StoreError> {
        Ok(self.map.contains_key(&hash))
    }
}
