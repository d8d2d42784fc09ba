use crate::error::Error;
use crate::model::HashRecord;
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use tracing::{debug, info};

/// Durable key→value contract for hash results.
///
/// Keys are identity-key bytes (`path|size|secs.nanos`); a changed file gets
/// a new key, so stale values are never returned. Concurrent puts race
/// safely: last-writer-wins is fine because the key already encodes the
/// content version.
pub trait HashStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<HashRecord>, Error>;
    fn put(&self, key: &[u8], record: &HashRecord) -> Result<(), Error>;
}

/// RocksDB-backed store with bincode-encoded records.
pub struct RocksDbStore {
    db: DB,
}

impl RocksDbStore {
    pub fn open(path: &Path) -> Result<RocksDbStore, Error> {
        debug!("Using '{}' for hash cache", path.display());
        let mut db_options = Options::default();
        db_options.create_if_missing(true);
        let db = DB::open(&db_options, path).map_err(|e| Error::Cache(e.to_string()))?;
        Ok(RocksDbStore { db })
    }

    pub fn key_count(&self) -> Result<usize, Error> {
        let mut count = 0usize;
        for item in self.db.iterator(IteratorMode::Start) {
            item.map_err(|e| Error::Cache(e.to_string()))?;
            count += 1;
        }
        Ok(count)
    }

    pub fn clear_all(&self) -> Result<usize, Error> {
        let mut batch = WriteBatch::default();
        let mut removed = 0usize;
        for item in self.db.iterator(IteratorMode::Start) {
            let (key, _) = item.map_err(|e| Error::Cache(e.to_string()))?;
            batch.delete(&key);
            removed += 1;
        }
        self.db
            .write(batch)
            .map_err(|e| Error::Cache(e.to_string()))?;
        info!("Hash cache cleared ({} entries)", removed);
        Ok(removed)
    }
}

impl HashStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<HashRecord>, Error> {
        match self.db.get(key).map_err(|e| Error::Cache(e.to_string()))? {
            Some(value) => {
                let record: HashRecord =
                    bincode::deserialize(&value).map_err(|e| Error::Cache(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &[u8], record: &HashRecord) -> Result<(), Error> {
        let value = bincode::serialize(record).map_err(|e| Error::Cache(e.to_string()))?;
        self.db
            .put(key, value)
            .map_err(|e| Error::Cache(e.to_string()))
    }
}

/// Store used when caching is disabled or the real store failed to open:
/// every lookup misses, every write vanishes, the scan recomputes.
pub struct NullStore;

impl HashStore for NullStore {
    fn get(&self, _key: &[u8]) -> Result<Option<HashRecord>, Error> {
        Ok(None)
    }

    fn put(&self, _key: &[u8], _record: &HashRecord) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(fingerprint: u64) -> HashRecord {
        HashRecord {
            content_hash: [7u8; 32],
            fingerprint,
            sharpness: 12.5,
            width: 640,
            height: 480,
        }
    }

    #[test]
    fn roundtrip_get_put() {
        let tmp = tempdir().unwrap();
        let store = RocksDbStore::open(&tmp.path().join("cache.db")).unwrap();

        assert!(store.get(b"k1").unwrap().is_none());
        store.put(b"k1", &record(42)).unwrap();
        assert_eq!(store.get(b"k1").unwrap(), Some(record(42)));
        assert!(store.get(b"k2").unwrap().is_none());
    }

    #[test]
    fn last_writer_wins() {
        let tmp = tempdir().unwrap();
        let store = RocksDbStore::open(&tmp.path().join("cache.db")).unwrap();

        store.put(b"k", &record(1)).unwrap();
        store.put(b"k", &record(2)).unwrap();
        assert_eq!(store.get(b"k").unwrap().unwrap().fingerprint, 2);
    }

    #[test]
    fn count_and_clear() {
        let tmp = tempdir().unwrap();
        let store = RocksDbStore::open(&tmp.path().join("cache.db")).unwrap();

        store.put(b"a", &record(1)).unwrap();
        store.put(b"b", &record(2)).unwrap();
        assert_eq!(store.key_count().unwrap(), 2);

        assert_eq!(store.clear_all().unwrap(), 2);
        assert_eq!(store.key_count().unwrap(), 0);
    }

    #[test]
    fn null_store_never_hits() {
        let store = NullStore;
        store.put(b"k", &record(9)).unwrap();
        assert!(store.get(b"k").unwrap().is_none());
    }
}
