//! Top-level facade: hashes external keys, applies the configured TTL, and
//! dispatches into the partitioned dictionary.
//!
//! The nonce is process-lifetime and, per the source, is *not* a security
//! feature: it exists only to randomize bucket placement across restarts,
//! not to resist an adversary who can submit arbitrary keys.

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::StoreResult;
use crate::hash::KeyHasher;
use crate::partitioned_dictionary::PartitionedDictionary;
use crate::slab_pool::SlabPool;

pub struct KvStore {
    hasher: KeyHasher,
    ttl_millis: u64,
    clock: Arc<dyn Clock>,
    dictionary: PartitionedDictionary,
}

/// Construction parameters for [`KvStore`], mirroring the env/CLI surface
/// the server layer exposes.
pub struct KvStoreConfig {
    pub partition_count: usize,
    pub slab_capacity: usize,
    pub max_live_slabs: usize,
    pub ttl_millis: u64,
    pub nonce: [u8; 32],
}

impl KvStore {
    pub fn new(config: KvStoreConfig, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let slab_pool = Arc::new(SlabPool::new(config.slab_capacity, config.max_live_slabs));
        let dictionary = PartitionedDictionary::new(config.partition_count, slab_pool)?;

        Ok(Self {
            hasher: KeyHasher::with_nonce(config.nonce),
            ttl_millis: config.ttl_millis,
            clock,
            dictionary,
        })
    }

    /// Stores `value` under `key`, expiring `ttl_millis` from now.
    pub fn add(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let key_hash = self.hasher.hash(key);
        let expiration_millis = self.clock.now_millis() + self.ttl_millis;
        self.dictionary.add(key_hash, value, expiration_millis)
    }

    /// Retrieves the bytes stored under `key`. The caller does not need to
    /// release anything explicitly -- unlike the source's RefBuffer
    /// hand-off, `Get` here returns an owned copy (see `arena.rs` for why).
    pub fn get(&self, key: &[u8]) -> StoreResult<Vec<u8>> {
        let key_hash = self.hasher.hash(key);
        let now_millis = self.clock.now_millis();
        self.dictionary.get(key_hash, now_millis)
    }

    /// Runs one Clean pass across every partition.
    pub fn clean(&self, cancelled: &dyn Fn() -> bool) {
        let now_millis = self.clock.now_millis();
        self.dictionary.clean(now_millis, cancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;

    fn store_with_clock(ttl_millis: u64, clock: Arc<TestClock>) -> KvStore {
        KvStore::new(
            KvStoreConfig {
                partition_count: 16,
                slab_capacity: 4096,
                max_live_slabs: 64,
                ttl_millis,
                nonce: [0u8; 32],
            },
            clock,
        )
        .unwrap()
    }

    #[test]
    fn add_then_get_within_ttl() {
        let clock = Arc::new(TestClock::new(1_000));
        let store = store_with_clock(10_000, clock);
        store.add(b"/foo", b"hello").unwrap();
        assert_eq!(store.get(b"/foo").unwrap(), b"hello");
    }

    #[test]
    fn get_after_ttl_reports_expired() {
        let clock = Arc::new(TestClock::new(0));
        let store = store_with_clock(100, clock.clone());
        store.add(b"/k", b"v").unwrap();
        clock.advance(150);
        assert!(store.get(b"/k").is_err());
    }

    #[test]
    fn clean_then_get_reports_not_found() {
        let clock = Arc::new(TestClock::new(0));
        let store = store_with_clock(100, clock.clone());
        store.add(b"/k", b"v").unwrap();
        clock.advance(150);
        assert!(store.get(b"/k").is_err());

        store.clean(&|| false);

        assert!(matches!(
            store.get(b"/k"),
            Err(crate::error::StoreError::NotFound)
        ));
    }

    #[test]
    fn overwrite_same_key_returns_latest_value() {
        let clock = Arc::new(TestClock::new(0));
        let store = store_with_clock(10_000, clock);
        store.add(b"/k", b"first").unwrap();
        store.add(b"/k", b"second").unwrap();
        assert_eq!(store.get(b"/k").unwrap(), b"second");
    }

    #[test]
    fn empty_key_and_value_round_trip() {
        let clock = Arc::new(TestClock::new(0));
        let store = store_with_clock(10_000, clock);
        store.add(b"", b"").unwrap();
        assert_eq!(store.get(b"").unwrap(), Vec::<u8>::new());
    }
}
