use crate::model::block_node::BlockNode;
use blockdag_consensus_core::{BlockHashMap, BlockHasher, HashMapCustomHasher, blockstatus::BlockStatus};
use blockdag_database::{
    prelude::{BatchDbWriter, CachedDbAccess, DB, StoreError},
    registry::DatabaseStorePrefixes,
};
use blockdag_hashes::Hash;
use parking_lot::RwLock;
use rocksdb::WriteBatch;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The persisted form of a block node. Children, reachability tree data and future
/// covering sets are left out since they are rebuilt when the DAG is loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNodeRecord {
    pub node: BlockNode,
    pub status: BlockStatus,
}

impl BlockNodeRecord {
    pub fn new(node: BlockNode, status: BlockStatus) -> Self {
        Self { node, status }
    }

    pub fn hash(&self) -> Hash {
        self.node.hash
    }
}

/// A write transaction over a [`BlockNodesStore`]. Nothing is visible before `commit`
pub trait BlockNodesWriteTx {
    fn store_block_node(&mut self, record: &BlockNodeRecord) -> Result<(), StoreError>;
    fn commit(self: Box<Self>) -> Result<(), StoreError>;
    fn abort(self: Box<Self>);
}

/// Persistence of block nodes
pub trait BlockNodesStore: Send + Sync {
    fn begin_write(&self) -> Result<Box<dyn BlockNodesWriteTx + '_>, StoreError>;

    /// Returns all persisted records, in no particular order
    fn load_all(&self) -> Result<Vec<BlockNodeRecord>, StoreError>;
}

/// A DB implementation of `BlockNodesStore`, writing each transaction as a single batch
#[derive(Clone)]
pub struct DbBlockNodesStore {
    db: Arc<DB>,
    access: CachedDbAccess<Hash, BlockNodeRecord, BlockHasher>,
}

impl DbBlockNodesStore {
    /// Records enter the cache only once their transaction is committed
    pub fn new(db: Arc<DB>, cache_size: u64) -> Self {
        Self { db: Arc::clone(&db), access: CachedDbAccess::new(db, cache_size, DatabaseStorePrefixes::BlockNodes.into()) }
    }

    pub fn get(&self, hash: Hash) -> Result<BlockNodeRecord, StoreError> {
        self.access.read(hash)
    }
}

struct DbBlockNodesWriteTx<'a> {
    store: &'a DbBlockNodesStore,
    batch: WriteBatch,
    staged: Vec<BlockNodeRecord>,
}

impl BlockNodesWriteTx for DbBlockNodesWriteTx<'_> {
    fn store_block_node(&mut self, record: &BlockNodeRecord) -> Result<(), StoreError> {
        self.store.access.write_uncached(BatchDbWriter::new(&mut self.batch), record.hash(), record)?;
        self.staged.push(record.clone());
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let DbBlockNodesWriteTx { store, batch, staged } = *self;
        store.db.write(batch)?;
        for record in staged {
            store.access.cache_committed(record.hash(), record);
        }
        Ok(())
    }

    fn abort(self: Box<Self>) {}
}

impl BlockNodesStore for DbBlockNodesStore {
    fn begin_write(&self) -> Result<Box<dyn BlockNodesWriteTx + '_>, StoreError> {
        Ok(Box::new(DbBlockNodesWriteTx { store: self, batch: WriteBatch::default(), staged: Vec::new() }))
    }

    fn load_all(&self) -> Result<Vec<BlockNodeRecord>, StoreError> {
        self.access
            .iterator()
            .map(|res| res.map(|(_, record)| record).map_err(|err| StoreError::DataInconsistency(err.to_string())))
            .collect()
    }
}

/// An in-memory implementation of `BlockNodesStore`
#[derive(Default)]
pub struct MemoryBlockNodesStore {
    records: RwLock<BlockHashMap<BlockNodeRecord>>,
}

impl MemoryBlockNodesStore {
    pub fn new() -> Self {
        Self { records: RwLock::new(BlockHashMap::new()) }
    }

    pub fn get(&self, hash: Hash) -> Option<BlockNodeRecord> {
        self.records.read().get(&hash).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

struct MemoryBlockNodesWriteTx<'a> {
    store: &'a MemoryBlockNodesStore,
    pending: Vec<BlockNodeRecord>,
}

impl BlockNodesWriteTx for MemoryBlockNodesWriteTx<'_> {
    fn store_block_node(&mut self, record: &BlockNodeRecord) -> Result<(), StoreError> {
        self.pending.push(record.clone());
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut records = self.store.records.write();
        for record in self.pending {
            records.insert(record.hash(), record);
        }
        Ok(())
    }

    fn abort(self: Box<Self>) {}
}

impl BlockNodesStore for MemoryBlockNodesStore {
    fn begin_write(&self) -> Result<Box<dyn BlockNodesWriteTx + '_>, StoreError> {
        Ok(Box::new(MemoryBlockNodesWriteTx { store: self, pending: Vec::new() }))
    }

    fn load_all(&self) -> Result<Vec<BlockNodeRecord>, StoreError> {
        Ok(self.records.read().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::NodeChain;
    use blockdag_database::{create_temp_db, prelude::ConnBuilder};

    fn records() -> Vec<BlockNodeRecord> {
        NodeChain::linear(4, 100, 1).nodes.iter().map(|n| BlockNodeRecord::new((**n).clone(), BlockStatus::DATA_STORED)).collect()
    }

    fn assert_round_trip(store: &dyn BlockNodesStore) {
        let records = records();

        // Aborted transactions leave no trace
        let mut tx = store.begin_write().unwrap();
        tx.store_block_node(&records[0]).unwrap();
        tx.abort();
        assert!(store.load_all().unwrap().is_empty());

        let mut tx = store.begin_write().unwrap();
        for record in records.iter() {
            tx.store_block_node(record).unwrap();
        }
        tx.commit().unwrap();

        let mut loaded = store.load_all().unwrap();
        loaded.sort_by_key(|r| r.node.chain_height);
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryBlockNodesStore::new();
        assert_round_trip(&store);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_db_store_round_trip() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10)).unwrap();
        let store = DbBlockNodesStore::new(db, 0);
        assert_round_trip(&store);
        let records = records();
        assert_eq!(store.get(records[2].hash()).unwrap(), records[2]);
    }

    #[test]
    fn test_db_store_cache_skips_aborted_records() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10)).unwrap();
        let store = DbBlockNodesStore::new(db, 16);
        let records = records();

        let mut tx = store.begin_write().unwrap();
        tx.store_block_node(&records[0]).unwrap();
        tx.abort();
        assert!(matches!(store.get(records[0].hash()), Err(StoreError::KeyNotFound(_))));

        assert_round_trip(&store);
        assert_eq!(store.get(records[0].hash()).unwrap(), records[0]);
    }
}
