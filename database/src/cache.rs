use indexmap::IndexMap;
use parking_lot::RwLock;
use rand::Rng;
use std::{collections::hash_map::RandomState, hash::BuildHasher, sync::Arc};

/// A bounded concurrent cache evicting a random entry when full.
/// A cache with zero capacity stores nothing.
#[derive(Clone)]
pub struct Cache<TKey, TData, S = RandomState>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
{
    // We use IndexMap and not HashMap because it makes it cheaper to remove a random element when the cache is full.
    map: Arc<RwLock<IndexMap<TKey, TData, S>>>,
    size: usize,
}

impl<TKey, TData, S> Cache<TKey, TData, S>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
    S: BuildHasher + Default,
{
    pub fn new(size: u64) -> Self {
        // Use `size + 1` for not triggering a realloc if new element exactly overflows capacity
        Self { map: Arc::new(RwLock::new(IndexMap::with_capacity_and_hasher(size as usize + 1, S::default()))), size: size as usize }
    }

    pub fn get(&self, key: &TKey) -> Option<TData> {
        self.map.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &TKey) -> bool {
        self.map.read().contains_key(key)
    }

    pub fn insert(&self, key: TKey, data: TData) {
        if self.size == 0 {
            return;
        }
        let mut write_guard = self.map.write();
        if write_guard.len() == self.size && !write_guard.contains_key(&key) {
            write_guard.swap_remove_index(rand::thread_rng().gen_range(0..self.size));
        }
        write_guard.insert(key, data);
    }

    pub fn remove(&self, key: &TKey) -> Option<TData> {
        if self.size == 0 {
            return None;
        }
        self.map.write().swap_remove(key)
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_eviction() {
        let cache = Cache::<u64, u64>::new(4);
        for i in 0..32 {
            cache.insert(i, i * 10);
            assert!(cache.len() <= 4);
        }
        assert!(cache.contains_key(&31));
        assert_eq!(cache.get(&31), Some(310));
        // Re-inserting an existing key never evicts
        cache.insert(31, 0);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.remove(&31), Some(0));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_zero_sized_cache_stores_nothing() {
        let cache = Cache::<u64, u64>::new(0);
        cache.insert(1, 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);
    }
}
