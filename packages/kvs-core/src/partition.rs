//! A shard of the key space: a `Fingerprint -> Record` map guarded by a
//! reader/writer lock, its own [`DataPool`], and its own [`ExpiredKeyBuffer`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::data_pool::DataPool;
use crate::error::StoreResult;
use crate::expired_key_buffer::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ATTEMPTS, ExpiredKeyBuffer};
use crate::hash::Fingerprint;
use crate::record::Record;
use crate::slab_pool::SlabPool;

pub struct Partition {
    map: RwLock<HashMap<Fingerprint, Record>>,
    data_pool: DataPool,
    expired: ExpiredKeyBuffer,
}

impl Partition {
    pub fn new(slab_pool: Arc<SlabPool>) -> StoreResult<Self> {
        Ok(Self {
            map: RwLock::new(HashMap::new()),
            data_pool: DataPool::new(slab_pool)?,
            expired: ExpiredKeyBuffer::new(),
        })
    }

    /// Copies `data` via this partition's `DataPool`, then replaces the
    /// record at `key_hash` under the write lock. A displaced record's
    /// buffer is released exactly once.
    pub fn add(&self, key_hash: Fingerprint, data: &[u8], expiration_millis: u64) -> StoreResult<()> {
        let buffer = self.data_pool.store(data, expiration_millis)?;
        let record = Record::new(buffer, expiration_millis);

        let mut map = self.map.write();
        if let Some(displaced) = map.insert(key_hash, record) {
            displaced.release();
        }
        Ok(())
    }

    /// Returns the stored bytes if present and unexpired. An expired record
    /// enqueues its key for deferred deletion and reports `Expired`; an
    /// absent key reports `NotFound`. These are distinct here even though
    /// HTTP callers collapse both to 404.
    pub fn get(&self, key_hash: Fingerprint, now_millis: u64) -> StoreResult<Vec<u8>> {
        enum Outcome {
            Found(Vec<u8>),
            Expired,
        }

        let outcome = {
            let map = self.map.read();
            match map.get(&key_hash) {
                None => return Err(crate::error::StoreError::NotFound),
                Some(record) if record.is_expired(now_millis) => Outcome::Expired,
                Some(record) => Outcome::Found(record.bytes()),
            }
        };

        match outcome {
            Outcome::Found(bytes) => Ok(bytes),
            Outcome::Expired => {
                self.expired.push(std::iter::once(key_hash));
                Err(crate::error::StoreError::Expired)
            }
        }
    }

    /// Runs the arena reclamation sweep and the expired-key drain.
    /// `cancelled` is checked between drain chunks; the sweep never
    /// interrupts a chunk mid-way.
    pub fn clean(&self, now_millis: u64, cancelled: &dyn Fn() -> bool) {
        self.data_pool.clean(now_millis);

        self.expired.drain(
            |keys| {
                if cancelled() {
                    return false;
                }

                let mut map = self.map.write();
                let mut prev: Option<Fingerprint> = None;
                for &key_hash in keys {
                    if prev == Some(key_hash) {
                        continue;
                    }
                    prev = Some(key_hash);

                    let still_expired = map
                        .get(&key_hash)
                        .is_some_and(|record| record.expiration_millis() < now_millis);
                    if still_expired {
                        if let Some(record) = map.remove(&key_hash) {
                            record.release();
                        }
                    }
                }
                true
            },
            DEFAULT_MAX_ATTEMPTS,
            DEFAULT_CHUNK_SIZE,
        );
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.map.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition() -> Partition {
        let pool = Arc::new(SlabPool::new(4096, 8));
        Partition::new(pool).unwrap()
    }

    #[test]
    fn add_then_get_round_trips() {
        let p = partition();
        p.add(1, b"value", 10_000).unwrap();
        assert_eq!(p.get(1, 1_000).unwrap(), b"value");
    }

    #[test]
    fn get_missing_key_is_not_found() {
        let p = partition();
        assert!(matches!(
            p.get(42, 1_000),
            Err(crate::error::StoreError::NotFound)
        ));
    }

    #[test]
    fn get_expired_key_enqueues_for_deletion() {
        let p = partition();
        p.add(1, b"value", 500).unwrap();
        assert!(matches!(
            p.get(1, 1_000),
            Err(crate::error::StoreError::Expired)
        ));
        assert_eq!(p.len(), 1, "record is not removed by Get itself");
    }

    #[test]
    fn clean_removes_expired_record_after_get_observed_it() {
        let p = partition();
        p.add(1, b"value", 500).unwrap();
        assert!(p.get(1, 1_000).is_err());

        p.clean(1_000, &|| false);

        assert_eq!(p.len(), 0);
        assert!(matches!(
            p.get(1, 1_000),
            Err(crate::error::StoreError::NotFound)
        ));
    }

    #[test]
    fn overwriting_a_key_releases_the_displaced_buffer() {
        let p = partition();
        p.add(7, b"first", 10_000).unwrap();
        p.add(7, b"second", 10_000).unwrap();
        assert_eq!(p.get(7, 1_000).unwrap(), b"second");
    }
}
