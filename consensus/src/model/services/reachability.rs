use crate::{
    model::stores::reachability::ReachabilityStoreReader,
    processes::reachability::{Result, inquirer, interval::Interval},
};
use blockdag_hashes::Hash;
use parking_lot::RwLock;
use std::sync::Arc;

/// Ancestry queries over the reachability index
pub trait ReachabilityService {
    fn is_chain_ancestor_of(&self, this: Hash, queried: Hash) -> Result<bool>;
    fn is_dag_ancestor_of(&self, this: Hash, queried: Hash) -> Result<bool>;
    fn is_any_dag_ancestor(&self, list: &mut impl Iterator<Item = Hash>, queried: Hash) -> Result<bool>;
    fn get_next_chain_ancestor(&self, descendant: Hash, ancestor: Hash) -> Result<Hash>;
}

/// Multi-threaded reachability service imp
#[derive(Clone)]
pub struct MTReachabilityService<T: ReachabilityStoreReader + ?Sized> {
    store: Arc<RwLock<T>>,
}

impl<T: ReachabilityStoreReader + ?Sized> MTReachabilityService<T> {
    pub fn new(store: Arc<RwLock<T>>) -> Self {
        Self { store }
    }

    pub fn interval(&self, hash: Hash) -> Result<Interval> {
        Ok(self.store.read().get_interval(hash)?)
    }

    /// Returns the reachability tree parent of `hash`
    pub fn tree_parent(&self, hash: Hash) -> Result<Hash> {
        Ok(self.store.read().get_parent(hash)?)
    }

    pub fn future_covering_set(&self, hash: Hash) -> Result<Vec<Hash>> {
        Ok(self.store.read().get_future_covering_set(hash)?.to_vec())
    }

    pub fn reindex_root(&self) -> Result<Hash> {
        Ok(self.store.read().get_reindex_root()?)
    }
}

impl<T: ReachabilityStoreReader + ?Sized> ReachabilityService for MTReachabilityService<T> {
    fn is_chain_ancestor_of(&self, this: Hash, queried: Hash) -> Result<bool> {
        let read_guard = self.store.read();
        inquirer::is_chain_ancestor_of(&*read_guard, this, queried)
    }

    fn is_dag_ancestor_of(&self, this: Hash, queried: Hash) -> Result<bool> {
        let read_guard = self.store.read();
        inquirer::is_dag_ancestor_of(&*read_guard, this, queried)
    }

    fn is_any_dag_ancestor(&self, list: &mut impl Iterator<Item = Hash>, queried: Hash) -> Result<bool> {
        let read_guard = self.store.read();
        for hash in list {
            if inquirer::is_dag_ancestor_of(&*read_guard, hash, queried)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_next_chain_ancestor(&self, descendant: Hash, ancestor: Hash) -> Result<Hash> {
        let read_guard = self.store.read();
        inquirer::get_next_chain_ancestor(&*read_guard, descendant, ancestor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::stores::reachability::MemoryReachabilityStore,
        processes::reachability::tests::{DagBlock, DagBuilder},
    };

    #[test]
    fn test_service_answers_dag_queries() {
        let mut store = MemoryReachabilityStore::new();
        DagBuilder::new(&mut store)
            .init(1.into())
            .add_block(DagBlock::new(2.into(), vec![1.into()]))
            .add_block(DagBlock::new(3.into(), vec![1.into()]))
            .add_block(DagBlock::new(4.into(), vec![3.into(), 2.into()]));

        let service = MTReachabilityService::new(Arc::new(RwLock::new(store)));
        assert!(service.is_dag_ancestor_of(2.into(), 4.into()).unwrap());
        assert!(!service.is_chain_ancestor_of(2.into(), 4.into()).unwrap());
        assert!(service.is_chain_ancestor_of(3.into(), 4.into()).unwrap());
        assert!(!service.is_dag_ancestor_of(2.into(), 3.into()).unwrap());
        assert!(service.is_any_dag_ancestor(&mut [Hash::from(3), Hash::from(2)].into_iter(), 4.into()).unwrap());
        assert!(!service.is_any_dag_ancestor(&mut [Hash::from(4)].into_iter(), 2.into()).unwrap());
        assert_eq!(service.get_next_chain_ancestor(4.into(), 1.into()).unwrap(), Hash::from(3));
        assert_eq!(service.tree_parent(4.into()).unwrap(), Hash::from(3));
        assert_eq!(service.future_covering_set(2.into()).unwrap(), vec![Hash::from(4)]);
        assert!(service.interval(1.into()).unwrap().strictly_contains(service.interval(4.into()).unwrap()));
        assert!(service.is_dag_ancestor_of(1.into(), 99.into()).unwrap_err().is_key_not_found());
    }
}
