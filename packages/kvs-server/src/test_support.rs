//! Shared test fixtures for the HTTP layer.

#![cfg(test)]

use std::sync::Arc;

use kvs_core::{KvStore, KvStoreConfig, SystemClock};

/// Builds a small `KvStore` suitable for handler-level unit tests.
pub fn test_kv_store() -> Arc<KvStore> {
    Arc::new(
        KvStore::new(
            KvStoreConfig {
                partition_count: 16,
                slab_capacity: 1 << 20,
                max_live_slabs: 64,
                ttl_millis: 30 * 60 * 1000,
                nonce: [0u8; 32],
            },
            Arc::new(SystemClock),
        )
        .expect("test kv store construction"),
    )
}
