//!
//! Flushing the block index and reloading the DAG from persistence
//!

mod common;

use blockdag_consensus::{
    consensus::test_consensus::TestConsensus,
    errors::ErrorKind,
    model::stores::block_nodes::{BlockNodeRecord, BlockNodesStore, BlockNodesWriteTx, DbBlockNodesStore, MemoryBlockNodesStore},
};
use blockdag_consensus_core::blockstatus::BlockStatus;
use blockdag_database::{create_temp_db, prelude::ConnBuilder, prelude::StoreError};
use blockdag_hashes::Hash;
use common::config_with_k;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Builds a small DAG with a reorg and a merge of two branches
fn build_dag(consensus: &TestConsensus) {
    let genesis = consensus.genesis_hash();
    for (word, parents) in [(2u64, vec![1u64]), (3, vec![2]), (4, vec![2]), (5, vec![4]), (6, vec![3, 5]), (7, vec![6]), (8, vec![1])] {
        let parents = parents.into_iter().map(Hash::from).collect();
        consensus.add_block_with_parents(word.into(), parents).unwrap();
    }
    assert_eq!(consensus.lookup(2.into()).unwrap().parents.as_slice(), &[genesis]);
}

#[test]
fn flush_and_reload_test() {
    let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10)).unwrap();
    let config = config_with_k(2);

    let (selected_tip, virtual_parents, chain, virtual_blue_score) = {
        let consensus = TestConsensus::with_store(&config, Arc::new(DbBlockNodesStore::new(db.clone(), config.perf.block_nodes_cache_size))).unwrap();
        build_dag(&consensus);
        assert_eq!(consensus.flush().unwrap(), 8);
        // Nothing is left dirty
        assert_eq!(consensus.flush().unwrap(), 0);
        (consensus.selected_tip(), consensus.virtual_parents(), consensus.selected_chain(), consensus.virtual_blue_score())
    };

    let consensus = TestConsensus::with_store(&config, Arc::new(DbBlockNodesStore::new(db.clone(), config.perf.block_nodes_cache_size))).unwrap();
    assert_eq!(consensus.block_count(), 8);
    assert_eq!(consensus.selected_tip(), selected_tip);
    assert_eq!(consensus.virtual_parents(), virtual_parents);
    assert_eq!(consensus.selected_chain(), chain);
    assert_eq!(consensus.virtual_blue_score(), virtual_blue_score);

    // Children and reachability are rebuilt on load
    assert_eq!(consensus.children(2.into()).unwrap().as_slice(), &[Hash::from(3), Hash::from(4)]);
    assert!(consensus.is_dag_ancestor_of(3.into(), 7.into()).unwrap());
    assert!(!consensus.is_dag_ancestor_of(8.into(), 7.into()).unwrap());
    assert_eq!(consensus.status(7.into()), Some(BlockStatus::DATA_STORED | BlockStatus::VALID));

    // Loaded blocks are clean, and the reloaded DAG keeps growing
    assert_eq!(consensus.flush().unwrap(), 0);
    consensus.add_block_with_parents(9.into(), vec![7.into(), 8.into()]).unwrap();
    assert_eq!(consensus.selected_tip(), Hash::from(9));
    assert_eq!(consensus.flush().unwrap(), 1);
}

#[test]
fn reload_rejects_foreign_genesis_test() {
    let store = Arc::new(MemoryBlockNodesStore::new());
    {
        let consensus = TestConsensus::with_store(&config_with_k(2), store.clone()).unwrap();
        build_dag(&consensus);
        consensus.flush().unwrap();
    }
    let mut config = config_with_k(2);
    config.params.genesis.hash = 0x77.into();
    let err = TestConsensus::with_store(&config, store).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);
}

/// A store whose transactions fail while `fail` is set
#[derive(Default)]
struct FlakyStore {
    inner: MemoryBlockNodesStore,
    fail: AtomicBool,
}

struct FlakyWriteTx<'a> {
    inner: Box<dyn BlockNodesWriteTx + 'a>,
    fail: bool,
}

impl BlockNodesWriteTx for FlakyWriteTx<'_> {
    fn store_block_node(&mut self, record: &BlockNodeRecord) -> Result<(), StoreError> {
        self.inner.store_block_node(record)
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.fail {
            self.inner.abort();
            return Err(StoreError::DataInconsistency("commit failed".to_string()));
        }
        self.inner.commit()
    }

    fn abort(self: Box<Self>) {
        self.inner.abort()
    }
}

impl BlockNodesStore for FlakyStore {
    fn begin_write(&self) -> Result<Box<dyn BlockNodesWriteTx + '_>, StoreError> {
        Ok(Box::new(FlakyWriteTx { inner: self.inner.begin_write()?, fail: self.fail.load(Ordering::SeqCst) }))
    }

    fn load_all(&self) -> Result<Vec<BlockNodeRecord>, StoreError> {
        self.inner.load_all()
    }
}

#[test]
fn failed_flush_is_retried_test() {
    let store = Arc::new(FlakyStore::default());
    let consensus = TestConsensus::with_store(&config_with_k(2), store.clone()).unwrap();
    build_dag(&consensus);

    store.fail.store(true, Ordering::SeqCst);
    assert!(consensus.flush().is_err());
    assert!(store.inner.is_empty());

    // The same blocks are flushed once the store recovers
    store.fail.store(false, Ordering::SeqCst);
    assert_eq!(consensus.flush().unwrap(), 8);
    assert_eq!(store.inner.len(), 8);
    assert_eq!(store.inner.get(6.into()).unwrap().node.parents.as_slice(), &[Hash::from(3), Hash::from(5)]);
}
