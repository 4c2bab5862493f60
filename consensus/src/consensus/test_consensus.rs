use super::{BlockAddition, Consensus};
use crate::{
    errors::{BlockProcessResult, ConsensusResult},
    model::{block_set::BlockSet, stores::block_nodes::BlockNodesStore},
};
use blockdag_consensus_core::{config::Config, header::Header};
use blockdag_hashes::Hash;
use std::{ops::Deref, sync::Arc};

/// A consensus instance with helpers for building valid headers over arbitrary parents
pub struct TestConsensus {
    consensus: Consensus,
}

impl TestConsensus {
    pub fn new(config: &Config) -> ConsensusResult<Self> {
        Ok(Self { consensus: Consensus::new(Arc::new(config.clone()))? })
    }

    pub fn with_store(config: &Config, store: Arc<dyn BlockNodesStore>) -> ConsensusResult<Self> {
        Ok(Self { consensus: Consensus::from_store(Arc::new(config.clone()), store)? })
    }

    /// Builds a header over `parents` which passes admission: its timestamp is one target block
    /// time after the latest parent and its bits are the required difficulty
    pub fn build_header_with_parents(&self, hash: Hash, parents: Vec<Hash>) -> Header {
        let selected_parent = parents.iter().map(|parent| self.consensus.lookup(*parent).unwrap()).collect::<BlockSet>().bluest().cloned().unwrap();
        let max_parent_timestamp = parents.iter().map(|parent| self.consensus.lookup(*parent).unwrap().timestamp).max().unwrap();

        let mut header = Header::from_precomputed_hash(hash, parents);
        header.timestamp = max_parent_timestamp + self.consensus.config().target_time_per_block as i64;
        header.bits = self.consensus.difficulty_manager.required_difficulty(Some(&selected_parent)).unwrap();
        header
    }

    /// Same as `build_header_with_parents` but with an explicit timestamp
    pub fn build_header_with_timestamp(&self, hash: Hash, parents: Vec<Hash>, timestamp: i64) -> Header {
        let mut header = self.build_header_with_parents(hash, parents);
        header.timestamp = timestamp;
        header
    }

    pub fn add_block_with_parents(&self, hash: Hash, parents: Vec<Hash>) -> BlockProcessResult<BlockAddition> {
        let header = self.build_header_with_parents(hash, parents);
        self.consensus.add_block_at(header, i64::MAX / 2)
    }

    pub fn into_inner(self) -> Consensus {
        self.consensus
    }
}

impl Deref for TestConsensus {
    type Target = Consensus;

    fn deref(&self) -> &Self::Target {
        &self.consensus
    }
}
