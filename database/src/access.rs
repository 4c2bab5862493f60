use crate::{db::DB, errors::StoreError};

use super::prelude::{Cache, DbKey, DbWriter};
use rocksdb::{Direction, IteratorMode, ReadOptions};
use serde::{Serialize, de::DeserializeOwned};
use std::{collections::hash_map::RandomState, error::Error, hash::BuildHasher, sync::Arc};

/// A concurrent DB store access with typed caching.
#[derive(Clone)]
pub struct CachedDbAccess<TKey, TData, S = RandomState>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
{
    db: Arc<DB>,

    // Cache
    cache: Cache<TKey, TData, S>,

    // DB bucket/path
    prefix: Vec<u8>,
}

pub type KeyDataResult<TData> = Result<(Box<[u8]>, TData), Box<dyn Error>>;

impl<TKey, TData, S> CachedDbAccess<TKey, TData, S>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
    S: BuildHasher + Default,
{
    pub fn new(db: Arc<DB>, cache_size: u64, prefix: Vec<u8>) -> Self {
        Self { db, cache: Cache::new(cache_size), prefix }
    }

    pub fn has(&self, key: TKey) -> Result<bool, StoreError>
    where
        TKey: AsRef<[u8]>,
    {
        Ok(self.cache.contains_key(&key) || self.db.get_pinned(DbKey::new(&self.prefix, key))?.is_some())
    }

    pub fn read(&self, key: TKey) -> Result<TData, StoreError>
    where
        TKey: AsRef<[u8]>,
        TData: DeserializeOwned, // We need `DeserializeOwned` since the slice coming from `db.get_pinned` has short lifetime
    {
        if let Some(data) = self.cache.get(&key) {
            Ok(data)
        } else {
            let db_key = DbKey::new(&self.prefix, key.clone());
            if let Some(slice) = self.db.get_pinned(&db_key)? {
                let data: TData = bincode::deserialize(&slice)?;
                self.cache.insert(key, data.clone());
                Ok(data)
            } else {
                Err(StoreError::KeyNotFound(db_key))
            }
        }
    }

    /// Iterates over all entries under this prefix in key order, bypassing the cache
    pub fn iterator(&self) -> impl Iterator<Item = KeyDataResult<TData>> + '_
    where
        TKey: AsRef<[u8]>,
        TData: DeserializeOwned,
    {
        let prefix_key = DbKey::prefix_only(&self.prefix);
        let mut read_opts = ReadOptions::default();
        read_opts.set_iterate_range(rocksdb::PrefixRange(prefix_key.as_ref()));
        self.db.iterator_opt(IteratorMode::From(prefix_key.as_ref(), Direction::Forward), read_opts).map(move |iter_result| {
            match iter_result {
                Ok((key, data_bytes)) => match bincode::deserialize(&data_bytes) {
                    Ok(data) => Ok((key[prefix_key.prefix_len()..].into(), data)),
                    Err(e) => Err(e.into()),
                },
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Writes through `writer` and caches the entry right away. Batches which may be dropped
    /// should go through `write_uncached` instead.
    pub fn write(&self, writer: impl DbWriter, key: TKey, data: TData) -> Result<(), StoreError>
    where
        TKey: AsRef<[u8]>,
        TData: Serialize,
    {
        self.write_uncached(writer, key.clone(), &data)?;
        self.cache.insert(key, data);
        Ok(())
    }

    /// Writes through `writer` without touching the cache. Once the write is durable the
    /// caller may publish the entry with `cache_committed`.
    pub fn write_uncached(&self, mut writer: impl DbWriter, key: TKey, data: &TData) -> Result<(), StoreError>
    where
        TKey: AsRef<[u8]>,
        TData: Serialize,
    {
        let bin_data = bincode::serialize(data)?;
        writer.put(DbKey::new(&self.prefix, key), bin_data)?;
        Ok(())
    }

    pub fn cache_committed(&self, key: TKey, data: TData) {
        self.cache.insert(key, data);
    }

    pub fn delete(&self, mut writer: impl DbWriter, key: TKey) -> Result<(), StoreError>
    where
        TKey: AsRef<[u8]>,
    {
        self.cache.remove(&key);
        writer.delete(DbKey::new(&self.prefix, key))?;
        Ok(())
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        create_temp_db,
        prelude::{BatchDbWriter, ConnBuilder, DirectDbWriter},
        registry::DatabaseStorePrefixes,
    };
    use blockdag_hashes::Hash;
    use rocksdb::WriteBatch;

    #[test]
    fn test_write_read_delete() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10)).expect("Failed to create temp db");
        let access = CachedDbAccess::<Hash, u64>::new(db.clone(), 2, DatabaseStorePrefixes::Tests.into());

        for i in 0..16u64 {
            access.write(DirectDbWriter::new(&db), i.into(), i * 2).unwrap();
        }
        assert_eq!(16, access.iterator().count());
        assert_eq!(access.read(7.into()).unwrap(), 14);
        assert!(access.has(15.into()).unwrap());
        assert!(!access.has(16.into()).unwrap());
        assert!(matches!(access.read(16.into()), Err(StoreError::KeyNotFound(_))));

        access.delete(DirectDbWriter::new(&db), 7.into()).unwrap();
        assert!(!access.has(7.into()).unwrap());
        assert_eq!(15, access.iterator().count());
    }

    #[test]
    fn test_batch_is_invisible_until_written() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10)).expect("Failed to create temp db");
        let access = CachedDbAccess::<Hash, u64>::new(db.clone(), 0, DatabaseStorePrefixes::Tests.into());

        let mut batch = WriteBatch::default();
        for i in 0..8u64 {
            access.write(BatchDbWriter::new(&mut batch), i.into(), i).unwrap();
        }
        assert_eq!(0, access.iterator().count());
        assert!(!access.has(3.into()).unwrap());
        db.write(batch).unwrap();
        assert_eq!(8, access.iterator().count());

        // Iteration follows key order, which for word-built hashes is numeric order
        let values = access.iterator().map(|r| r.unwrap().1).collect::<Vec<_>>();
        assert_eq!(values, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_uncached_write_of_dropped_batch() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10)).expect("Failed to create temp db");
        let access = CachedDbAccess::<Hash, u64>::new(db.clone(), 4, DatabaseStorePrefixes::Tests.into());

        let mut batch = WriteBatch::default();
        access.write_uncached(BatchDbWriter::new(&mut batch), 1.into(), &10).unwrap();
        drop(batch);
        assert!(!access.has(1.into()).unwrap());
        assert!(matches!(access.read(1.into()), Err(StoreError::KeyNotFound(_))));

        let mut batch = WriteBatch::default();
        access.write_uncached(BatchDbWriter::new(&mut batch), 2.into(), &20).unwrap();
        db.write(batch).unwrap();
        access.cache_committed(2.into(), 20);
        assert_eq!(access.read(2.into()).unwrap(), 20);
    }
}
