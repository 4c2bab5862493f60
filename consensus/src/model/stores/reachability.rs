use crate::processes::reachability::interval::Interval;
use blockdag_consensus_core::{
    BlockHashMap, HashMapCustomHasher,
    blockhash::{self, BlockHashes},
};
use blockdag_database::prelude::StoreError;
use blockdag_hashes::Hash;
use serde::{Deserialize, Serialize};
use std::{collections::hash_map::Entry::Vacant, ops::Range, sync::Arc};

#[derive(Clone, Serialize, Deserialize)]
pub struct ReachabilityData {
    pub children: BlockHashes,
    pub parent: Hash,
    pub interval: Interval,
    pub height: u64,
    pub future_covering_set: BlockHashes,
}

impl ReachabilityData {
    pub fn new(parent: Hash, interval: Interval, height: u64) -> Self {
        Self { children: Arc::new(vec![]), parent, interval, height, future_covering_set: Arc::new(vec![]) }
    }
}

/// Reader API for `ReachabilityStore`.
pub trait ReachabilityStoreReader {
    fn has(&self, hash: Hash) -> Result<bool, StoreError>;
    fn get_interval(&self, hash: Hash) -> Result<Interval, StoreError>;
    /// Returns the reachability *tree* parent of `hash`
    fn get_parent(&self, hash: Hash) -> Result<Hash, StoreError>;
    /// Returns the reachability *tree* children of `hash`
    fn get_children(&self, hash: Hash) -> Result<BlockHashes, StoreError>;
    fn get_future_covering_set(&self, hash: Hash) -> Result<BlockHashes, StoreError>;
    /// Returns the *tree* height of `hash`, which equals its chain height
    fn get_height(&self, hash: Hash) -> Result<u64, StoreError>;
    fn get_reindex_root(&self) -> Result<Hash, StoreError>;
    /// Returns the counts of entries in the store. To be used for tests only
    fn count(&self) -> Result<usize, StoreError>;
}

/// Write API for `ReachabilityStore`. All write functions are deliberately `mut`
/// since reachability writes are not append-only and thus need to be guarded.
pub trait ReachabilityStore: ReachabilityStoreReader {
    fn init(&mut self, origin: Hash, capacity: Interval) -> Result<(), StoreError>;
    fn insert(&mut self, hash: Hash, parent: Hash, interval: Interval, height: u64) -> Result<(), StoreError>;
    fn set_interval(&mut self, hash: Hash, interval: Interval) -> Result<(), StoreError>;
    fn append_child(&mut self, hash: Hash, child: Hash) -> Result<u64, StoreError>;
    fn insert_future_covering_item(&mut self, hash: Hash, fci: Hash, insertion_index: usize) -> Result<(), StoreError>;
    /// Drops the future covering items in `range`
    fn remove_future_covering_items(&mut self, hash: Hash, range: Range<usize>) -> Result<(), StoreError>;
    fn set_reindex_root(&mut self, root: Hash) -> Result<(), StoreError>;
}

/// The in-memory reachability store. Reachability data is never persisted on its own;
/// it is rebuilt from the block nodes on start up.
pub struct MemoryReachabilityStore {
    map: BlockHashMap<ReachabilityData>,
    reindex_root: Option<Hash>,
}

impl Default for MemoryReachabilityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryReachabilityStore {
    pub fn new() -> Self {
        Self { map: BlockHashMap::new(), reindex_root: None }
    }

    fn get_data_mut(&mut self, hash: Hash) -> Result<&mut ReachabilityData, StoreError> {
        self.map.get_mut(&hash).ok_or(StoreError::HashNotFound(hash))
    }

    fn get_data(&self, hash: Hash) -> Result<&ReachabilityData, StoreError> {
        self.map.get(&hash).ok_or(StoreError::HashNotFound(hash))
    }
}

impl ReachabilityStore for MemoryReachabilityStore {
    fn init(&mut self, origin: Hash, capacity: Interval) -> Result<(), StoreError> {
        self.insert(origin, blockhash::NONE, capacity, 0)?;
        self.set_reindex_root(origin)?;
        Ok(())
    }

    fn insert(&mut self, hash: Hash, parent: Hash, interval: Interval, height: u64) -> Result<(), StoreError> {
        if let Vacant(e) = self.map.entry(hash) {
            e.insert(ReachabilityData::new(parent, interval, height));
            Ok(())
        } else {
            Err(StoreError::HashAlreadyExists(hash))
        }
    }

    fn set_interval(&mut self, hash: Hash, interval: Interval) -> Result<(), StoreError> {
        let data = self.get_data_mut(hash)?;
        data.interval = interval;
        Ok(())
    }

    fn append_child(&mut self, hash: Hash, child: Hash) -> Result<u64, StoreError> {
        let data = self.get_data_mut(hash)?;
        Arc::make_mut(&mut data.children).push(child);
        Ok(data.height)
    }

    fn insert_future_covering_item(&mut self, hash: Hash, fci: Hash, insertion_index: usize) -> Result<(), StoreError> {
        let data = self.get_data_mut(hash)?;
        Arc::make_mut(&mut data.future_covering_set).insert(insertion_index, fci);
        Ok(())
    }

    fn remove_future_covering_items(&mut self, hash: Hash, range: Range<usize>) -> Result<(), StoreError> {
        let data = self.get_data_mut(hash)?;
        Arc::make_mut(&mut data.future_covering_set).drain(range);
        Ok(())
    }

    fn set_reindex_root(&mut self, root: Hash) -> Result<(), StoreError> {
        self.reindex_root = Some(root);
        Ok(())
    }
}

impl ReachabilityStoreReader for MemoryReachabilityStore {
    fn has(&self, hash: Hash) -> Result<bool, StoreError> {
        Ok(self.map.contains_key(&hash))
    }

    fn get_interval(&self, hash: Hash) -> Result<Interval, StoreError> {
        Ok(self.get_data(hash)?.interval)
    }

    fn get_parent(&self, hash: Hash) -> Result<Hash, StoreError> {
        Ok(self.get_data(hash)?.parent)
    }

    fn get_children(&self, hash: Hash) -> Result<BlockHashes, StoreError> {
        Ok(Arc::clone(&self.get_data(hash)?.children))
    }

    fn get_future_covering_set(&self, hash: Hash) -> Result<BlockHashes, StoreError> {
        Ok(Arc::clone(&self.get_data(hash)?.future_covering_set))
    }

    fn get_height(&self, hash: Hash) -> Result<u64, StoreError> {
        Ok(self.get_data(hash)?.height)
    }

    fn get_reindex_root(&self) -> Result<Hash, StoreError> {
        self.reindex_root.ok_or(StoreError::DataInconsistency("reindex root was not initialized".to_string()))
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.map.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_basics() {
        let mut store = MemoryReachabilityStore::new();
        assert!(store.get_reindex_root().is_err());

        let (hash, parent) = (7.into(), 15.into());
        let interval = Interval::maximal();
        store.init(parent, interval).unwrap();
        assert_eq!(store.get_reindex_root().unwrap(), parent);
        assert_eq!(store.get_parent(parent).unwrap(), blockhash::NONE);

        let height = store.append_child(parent, hash).unwrap();
        store.insert(hash, parent, interval, height + 1).unwrap();
        assert!(matches!(store.insert(hash, parent, interval, 1), Err(StoreError::HashAlreadyExists(_))));

        let children = store.get_children(parent).unwrap();
        assert_eq!(children.as_slice(), &[hash]);
        assert_eq!(store.get_parent(hash).unwrap(), parent);
        assert_eq!(store.get_height(hash).unwrap(), 1);

        store.insert_future_covering_item(parent, 1.into(), 0).unwrap();
        store.insert_future_covering_item(parent, 3.into(), 1).unwrap();
        store.insert_future_covering_item(parent, 2.into(), 1).unwrap();
        assert_eq!(store.get_future_covering_set(parent).unwrap().as_slice(), &[Hash::from(1), Hash::from(2), Hash::from(3)]);
        store.remove_future_covering_items(parent, 1..3).unwrap();
        assert_eq!(store.get_future_covering_set(parent).unwrap().as_slice(), &[Hash::from(1)]);

        assert!(matches!(store.get_interval(99.into()), Err(StoreError::HashNotFound(_))));
        assert_eq!(store.count().unwrap(), 2);
    }
}
