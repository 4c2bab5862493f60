use super::{
    block_nodes::{BlockNodeRecord, BlockNodesStore},
    ghostdag::{GhostdagData, GhostdagStoreReader},
    relations::RelationsStoreReader,
};
use crate::model::block_node::BlockNode;
use blockdag_consensus_core::{
    BlockHashMap, BlockHashSet, BlueScore, HashKTypeMap, HashMapCustomHasher, blockhash::BlockHashes, blockstatus::BlockStatus,
};
use blockdag_core::{debug, info};
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;
use parking_lot::RwLock;
use std::sync::Arc;

/// Read access to admitted block nodes
pub trait BlockNodeStoreReader {
    fn get_node(&self, hash: Hash) -> Result<Arc<BlockNode>, StoreError>;
}

#[derive(Default)]
struct BlockIndexInner {
    nodes: BlockHashMap<Arc<BlockNode>>,
    statuses: BlockHashMap<BlockStatus>,
    children: BlockHashMap<BlockHashes>,
    dirty: BlockHashSet,
}

/// The in-memory index of all admitted blocks along with their validation status and
/// children. Status changes are tracked in a dirty set until flushed to persistence.
#[derive(Default)]
pub struct BlockIndex {
    inner: RwLock<BlockIndexInner>,
}

impl BlockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_block(&self, hash: Hash) -> bool {
        self.inner.read().nodes.contains_key(&hash)
    }

    pub fn lookup(&self, hash: Hash) -> Option<Arc<BlockNode>> {
        self.inner.read().nodes.get(&hash).cloned()
    }

    /// Adds a newly admitted node and marks it dirty
    pub fn add_node(&self, node: Arc<BlockNode>, status: BlockStatus) {
        let mut inner = self.inner.write();
        inner.dirty.insert(node.hash);
        Self::insert(&mut inner, node, status);
    }

    /// Adds a node loaded from persistence, so it is not marked dirty
    pub fn add_node_no_dirty(&self, node: Arc<BlockNode>, status: BlockStatus) {
        Self::insert(&mut self.inner.write(), node, status);
    }

    fn insert(inner: &mut BlockIndexInner, node: Arc<BlockNode>, status: BlockStatus) {
        for parent in node.parents.iter().copied() {
            BlockHashes::make_mut(inner.children.entry(parent).or_default()).push(node.hash);
        }
        inner.children.entry(node.hash).or_default();
        inner.statuses.insert(node.hash, status);
        inner.nodes.insert(node.hash, node);
    }

    /// Removes a childless node which was added but could not be fully admitted
    pub fn remove_node(&self, hash: Hash) {
        let mut inner = self.inner.write();
        let Some(node) = inner.nodes.remove(&hash) else { return };
        debug_assert!(inner.children.get(&hash).is_none_or(|children| children.is_empty()));
        for parent in node.parents.iter() {
            if let Some(children) = inner.children.get_mut(parent) {
                BlockHashes::make_mut(children).retain(|child| *child != hash);
            }
        }
        inner.children.remove(&hash);
        inner.statuses.remove(&hash);
        inner.dirty.remove(&hash);
    }

    pub fn status(&self, hash: Hash) -> Option<BlockStatus> {
        self.inner.read().statuses.get(&hash).copied()
    }

    /// ORs `flags` into the status of `hash` and marks it dirty
    pub fn set_status_flags(&self, hash: Hash, flags: BlockStatus) -> Result<BlockStatus, StoreError> {
        self.update_status(hash, |status| status | flags)
    }

    /// Clears `flags` from the status of `hash` and marks it dirty
    pub fn unset_status_flags(&self, hash: Hash, flags: BlockStatus) -> Result<BlockStatus, StoreError> {
        self.update_status(hash, |status| status - flags)
    }

    fn update_status(&self, hash: Hash, op: impl FnOnce(BlockStatus) -> BlockStatus) -> Result<BlockStatus, StoreError> {
        let mut inner = self.inner.write();
        let status = inner.statuses.get_mut(&hash).ok_or(StoreError::HashNotFound(hash))?;
        *status = op(*status);
        let status = *status;
        inner.dirty.insert(hash);
        Ok(status)
    }

    pub fn children(&self, hash: Hash) -> Option<BlockHashes> {
        self.inner.read().children.get(&hash).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().nodes.is_empty()
    }

    pub fn dirty_count(&self) -> usize {
        self.inner.read().dirty.len()
    }

    /// Returns the hashes of all blocks with no children
    pub fn tips(&self) -> Vec<Hash> {
        self.inner.read().children.iter().filter(|(_, children)| children.is_empty()).map(|(hash, _)| *hash).collect()
    }

    /// Persists all dirty nodes in a single transaction. The dirty set is cleared only if the
    /// transaction commits, and only for entries which did not change while it was running.
    /// Returns the number of flushed nodes.
    pub fn flush_dirty(&self, store: &(impl BlockNodesStore + ?Sized)) -> Result<usize, StoreError> {
        let snapshot: Vec<BlockNodeRecord> = {
            let inner = self.inner.write();
            inner
                .dirty
                .iter()
                .map(|hash| match (inner.nodes.get(hash), inner.statuses.get(hash)) {
                    (Some(node), Some(status)) => Ok(BlockNodeRecord::new((**node).clone(), *status)),
                    _ => Err(StoreError::DataInconsistency(format!("dirty block {hash} is missing from the index"))),
                })
                .collect::<Result<_, _>>()?
        };
        if snapshot.is_empty() {
            return Ok(0);
        }

        let mut tx = store.begin_write()?;
        for record in snapshot.iter() {
            if let Err(err) = tx.store_block_node(record) {
                tx.abort();
                return Err(err);
            }
        }
        tx.commit()?;

        let mut inner = self.inner.write();
        for record in snapshot.iter() {
            if inner.statuses.get(&record.hash()) == Some(&record.status) {
                inner.dirty.remove(&record.hash());
            }
        }
        let remaining = inner.dirty.len();
        drop(inner);

        if remaining > 0 {
            debug!("{} block nodes changed during flush and remain dirty", remaining);
        }
        info!("Flushed {} block nodes", snapshot.len());
        Ok(snapshot.len())
    }
}

impl BlockNodeStoreReader for BlockIndex {
    fn get_node(&self, hash: Hash) -> Result<Arc<BlockNode>, StoreError> {
        self.lookup(hash).ok_or(StoreError::HashNotFound(hash))
    }
}

impl GhostdagStoreReader for BlockIndex {
    fn get_blue_score(&self, hash: Hash) -> Result<BlueScore, StoreError> {
        Ok(self.get_node(hash)?.blue_score())
    }

    fn get_selected_parent(&self, hash: Hash) -> Result<Hash, StoreError> {
        Ok(self.get_node(hash)?.ghostdag.selected_parent)
    }

    fn get_mergeset_blues(&self, hash: Hash) -> Result<BlockHashes, StoreError> {
        Ok(self.get_node(hash)?.ghostdag.mergeset_blues.clone())
    }

    fn get_blues_anticone_sizes(&self, hash: Hash) -> Result<HashKTypeMap, StoreError> {
        Ok(self.get_node(hash)?.ghostdag.blues_anticone_sizes.clone())
    }

    fn get_data(&self, hash: Hash) -> Result<Arc<GhostdagData>, StoreError> {
        Ok(self.get_node(hash)?.ghostdag.clone())
    }

    fn has(&self, hash: Hash) -> Result<bool, StoreError> {
        Ok(self.has_block(hash))
    }
}

impl RelationsStoreReader for BlockIndex {
    fn get_parents(&self, hash: Hash) -> Result<BlockHashes, StoreError> {
        Ok(self.get_node(hash)?.parents.clone())
    }

    fn get_children(&self, hash: Hash) -> Result<BlockHashes, StoreError> {
        self.children(hash).ok_or(StoreError::HashNotFound(hash))
    }

    fn has(&self, hash: Hash) -> Result<bool, StoreError> {
        Ok(self.has_block(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::stores::block_nodes::{BlockNodesWriteTx, MemoryBlockNodesStore},
        test_helpers::NodeChain,
    };

    fn index_with_chain(len: usize) -> (BlockIndex, NodeChain) {
        let chain = NodeChain::linear(len, 0, 1);
        let index = BlockIndex::new();
        for node in chain.nodes.iter() {
            index.add_node(node.clone(), BlockStatus::DATA_STORED);
        }
        (index, chain)
    }

    #[test]
    fn test_add_and_lookup() {
        let (index, chain) = index_with_chain(3);
        assert_eq!(index.len(), 3);
        assert!(index.has_block(chain.nodes[1].hash));
        assert!(!index.has_block(99.into()));
        assert!(index.lookup(99.into()).is_none());
        assert_eq!(index.lookup(chain.nodes[2].hash).unwrap().hash, chain.nodes[2].hash);
        assert_eq!(index.children(chain.nodes[0].hash).unwrap().as_slice(), &[chain.nodes[1].hash]);
        assert!(index.children(chain.nodes[2].hash).unwrap().is_empty());
        assert_eq!(index.tips(), vec![chain.nodes[2].hash]);
        assert_eq!(index.get_blue_score(chain.nodes[2].hash).unwrap(), 2);
        assert!(matches!(index.get_node(99.into()), Err(StoreError::HashNotFound(_))));
    }

    #[test]
    fn test_remove_node() {
        let (index, chain) = index_with_chain(3);
        let (middle, tip) = (chain.nodes[1].hash, chain.nodes[2].hash);
        index.remove_node(tip);
        assert_eq!(index.len(), 2);
        assert!(index.lookup(tip).is_none());
        assert!(index.status(tip).is_none());
        assert!(index.children(tip).is_none());
        assert!(index.children(middle).unwrap().is_empty());
        assert_eq!(index.tips(), vec![middle]);
        assert_eq!(index.dirty_count(), 2);

        // Unknown hashes are ignored, and the removed hash can be added again
        index.remove_node(tip);
        index.add_node(chain.nodes[2].clone(), BlockStatus::DATA_STORED);
        assert_eq!(index.children(middle).unwrap().as_slice(), &[tip]);
    }

    #[test]
    fn test_status_flags() {
        let (index, chain) = index_with_chain(2);
        let hash = chain.nodes[1].hash;
        assert_eq!(index.set_status_flags(hash, BlockStatus::VALID).unwrap(), BlockStatus::DATA_STORED | BlockStatus::VALID);
        assert_eq!(index.unset_status_flags(hash, BlockStatus::DATA_STORED).unwrap(), BlockStatus::VALID);
        assert_eq!(index.status(hash), Some(BlockStatus::VALID));
        assert!(index.status(99.into()).is_none());
        assert!(index.set_status_flags(99.into(), BlockStatus::VALID).is_err());
    }

    #[test]
    fn test_flush_clears_dirty() {
        let (index, chain) = index_with_chain(3);
        let store = MemoryBlockNodesStore::new();
        assert_eq!(index.dirty_count(), 3);
        assert_eq!(index.flush_dirty(&store).unwrap(), 3);
        assert_eq!(index.dirty_count(), 0);
        assert_eq!(store.len(), 3);
        assert_eq!(index.flush_dirty(&store).unwrap(), 0);

        index.set_status_flags(chain.nodes[0].hash, BlockStatus::VALID).unwrap();
        assert_eq!(index.dirty_count(), 1);
        index.flush_dirty(&store).unwrap();
        assert_eq!(store.get(chain.nodes[0].hash).unwrap().status, BlockStatus::DATA_STORED | BlockStatus::VALID);

        // Hydrated nodes are not dirty
        let hydrated = BlockIndex::new();
        hydrated.add_node_no_dirty(chain.nodes[0].clone(), BlockStatus::VALID);
        assert_eq!(hydrated.dirty_count(), 0);
    }

    struct FailingStore;

    struct FailingTx;

    impl BlockNodesWriteTx for FailingTx {
        fn store_block_node(&mut self, _record: &BlockNodeRecord) -> Result<(), StoreError> {
            Ok(())
        }

        fn commit(self: Box<Self>) -> Result<(), StoreError> {
            Err(StoreError::DataInconsistency("commit failed".to_string()))
        }

        fn abort(self: Box<Self>) {}
    }

    impl BlockNodesStore for FailingStore {
        fn begin_write(&self) -> Result<Box<dyn BlockNodesWriteTx + '_>, StoreError> {
            Ok(Box::new(FailingTx))
        }

        fn load_all(&self) -> Result<Vec<BlockNodeRecord>, StoreError> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_failed_flush_keeps_dirty() {
        let (index, _) = index_with_chain(3);
        assert!(index.flush_dirty(&FailingStore).is_err());
        assert_eq!(index.dirty_count(), 3);
        // A later flush retries the same set
        assert_eq!(index.flush_dirty(&MemoryBlockNodesStore::new()).unwrap(), 3);
        assert_eq!(index.dirty_count(), 0);
    }
}
