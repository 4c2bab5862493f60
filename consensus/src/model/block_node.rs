use super::{block_set::BlockSet, stores::block_index::BlockNodeStoreReader, stores::ghostdag::GhostdagData};
use blockdag_consensus_core::{BlueScore, blockhash::BlockHashes, header::Header};
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An admitted block. Nodes are immutable once created and are shared as `Arc<BlockNode>`;
/// everything that changes after admission (status, children, reachability) lives in
/// hash-keyed stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNode {
    pub hash: Hash,
    pub parents: BlockHashes,
    pub ghostdag: Arc<GhostdagData>,

    /// One more than the maximal parent height, 0 for genesis
    pub height: u64,
    /// One more than the selected parent chain height, 0 for genesis
    pub chain_height: u64,

    pub version: u16,
    pub hash_merkle_root: Hash,
    pub accepted_id_merkle_root: Hash,
    pub utxo_commitment: Hash,
    pub timestamp: i64,
    pub bits: u32,
    pub nonce: u64,
}

impl BlockNode {
    /// Builds the node of `header` given its resolved `parents` and coloring output.
    /// `parents` must hold the selected parent of `ghostdag` unless the block is genesis
    pub fn new(header: &Header, parents: &BlockSet, ghostdag: Arc<GhostdagData>) -> Result<Self, StoreError> {
        let (height, chain_height) = match parents.highest() {
            None => (0, 0),
            Some(highest) => {
                let selected_parent =
                    parents.get(&ghostdag.selected_parent).ok_or(StoreError::HashNotFound(ghostdag.selected_parent))?;
                (highest.height + 1, selected_parent.chain_height + 1)
            }
        };
        Ok(Self {
            hash: header.hash,
            parents: BlockHashes::new(header.parents.clone()),
            ghostdag,
            height,
            chain_height,
            version: header.version,
            hash_merkle_root: header.hash_merkle_root,
            accepted_id_merkle_root: header.accepted_id_merkle_root,
            utxo_commitment: header.utxo_commitment,
            timestamp: header.timestamp,
            bits: header.bits,
            nonce: header.nonce,
        })
    }

    pub fn is_genesis(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn blue_score(&self) -> BlueScore {
        self.ghostdag.blue_score
    }

    /// The selected parent, or `None` for genesis
    pub fn selected_parent(&self) -> Option<Hash> {
        self.ghostdag.has_selected_parent().then_some(self.ghostdag.selected_parent)
    }

    /// The mergeset blues, starting with the selected parent
    pub fn blues(&self) -> &BlockHashes {
        &self.ghostdag.mergeset_blues
    }

    pub fn finality_score(&self, finality_interval: u64) -> u64 {
        self.blue_score() / finality_interval
    }

    /// Reconstructs the header this node was admitted from
    pub fn header(&self) -> Header {
        Header {
            hash: self.hash,
            version: self.version,
            parents: self.parents.to_vec(),
            hash_merkle_root: self.hash_merkle_root,
            accepted_id_merkle_root: self.accepted_id_merkle_root,
            utxo_commitment: self.utxo_commitment,
            timestamp: self.timestamp,
            bits: self.bits,
            nonce: self.nonce,
        }
    }

    /// Returns the selected chain ancestor of this node at `chain_height`, or `None`
    /// if the requested height is above the height of this node
    pub fn selected_ancestor(
        self: &Arc<Self>,
        store: &(impl BlockNodeStoreReader + ?Sized),
        chain_height: u64,
    ) -> Result<Option<Arc<BlockNode>>, StoreError> {
        if chain_height > self.chain_height {
            return Ok(None);
        }
        let mut current = self.clone();
        while current.chain_height > chain_height {
            match current.selected_parent() {
                Some(selected_parent) => current = store.get_node(selected_parent)?,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Returns the selected chain ancestor `distance` blocks below this node
    pub fn relative_ancestor(
        self: &Arc<Self>,
        store: &(impl BlockNodeStoreReader + ?Sized),
        distance: u64,
    ) -> Result<Option<Arc<BlockNode>>, StoreError> {
        match self.chain_height.checked_sub(distance) {
            Some(chain_height) => self.selected_ancestor(store, chain_height),
            None => Ok(None),
        }
    }

    /// Returns the median timestamp of this node and its previous selected chain ancestors,
    /// `window_size` timestamps in total. Missing entries are padded with the earliest timestamp
    pub fn past_median_time(self: &Arc<Self>, store: &(impl BlockNodeStoreReader + ?Sized), window_size: usize) -> Result<i64, StoreError> {
        let mut timestamps = Vec::with_capacity(window_size);
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if timestamps.len() == window_size {
                break;
            }
            timestamps.push(node.timestamp);
            current = match node.selected_parent() {
                Some(selected_parent) => Some(store.get_node(selected_parent)?),
                None => None,
            };
        }
        if let Some(&earliest) = timestamps.last() {
            timestamps.resize(window_size, earliest);
        }
        timestamps.sort_unstable(); // This is deterministic because we sort integers
        Ok(timestamps.get(window_size / 2).copied().unwrap_or(self.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::NodeChain;

    #[test]
    fn test_chain_ancestors() {
        let chain = NodeChain::linear(10, 1000, 1);
        let tip = chain.tip();

        assert_eq!(tip.chain_height, 9);
        assert_eq!(tip.height, 9);
        assert_eq!(tip.selected_ancestor(&chain, 4).unwrap().unwrap().hash, chain.nodes[4].hash);
        assert_eq!(tip.selected_ancestor(&chain, 9).unwrap().unwrap().hash, tip.hash);
        assert!(tip.selected_ancestor(&chain, 10).unwrap().is_none());
        assert_eq!(tip.relative_ancestor(&chain, 3).unwrap().unwrap().hash, chain.nodes[6].hash);
        assert_eq!(tip.relative_ancestor(&chain, 9).unwrap().unwrap().hash, chain.nodes[0].hash);
        assert!(tip.relative_ancestor(&chain, 10).unwrap().is_none());
    }

    #[test]
    fn test_past_median_time() {
        let chain = NodeChain::linear(10, 1000, 1);
        // Timestamps 1000..=1009; a window of 5 at the tip covers 1005..=1009
        assert_eq!(chain.tip().past_median_time(&chain, 5).unwrap(), 1007);
        // Fewer known blocks than the window: padded with the genesis timestamp
        assert_eq!(chain.nodes[2].past_median_time(&chain, 11).unwrap(), 1000);
        assert_eq!(chain.nodes[0].past_median_time(&chain, 1).unwrap(), 1000);
    }

    #[test]
    fn test_header_reconstruction_and_scores() {
        let chain = NodeChain::linear(3, 1000, 1);
        let genesis = &chain.nodes[0];
        assert!(genesis.is_genesis());
        assert_eq!(genesis.selected_parent(), None);
        let tip = chain.tip();
        assert_eq!(tip.selected_parent(), Some(chain.nodes[1].hash));
        assert_eq!(tip.blue_score(), 2);
        assert_eq!(tip.finality_score(2), 1);
        let header = tip.header();
        assert_eq!(header.hash, tip.hash);
        assert_eq!(header.parents, vec![chain.nodes[1].hash]);
        assert_eq!(header.timestamp, tip.timestamp);
    }
}
