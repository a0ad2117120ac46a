//! Storage substrate for an in-memory key/value cache with a uniform
//! per-entry TTL.
//!
//! - **Arena allocator** ([`arena`], [`slab_pool`], [`ref_buffer`]): carves
//!   per-entry buffers out of large pre-allocated slabs and hands out
//!   refcounted read-only views.
//! - **Reclamation** ([`reclamation_queue`], [`data_pool`]): recycles an
//!   arena's slab once every buffer it issued has been released and its
//!   high-water expiration has passed.
//! - **Dictionary** ([`partition`], [`partitioned_dictionary`], [`record`],
//!   [`expired_key_buffer`]): a sharded `key hash -> Record` map with
//!   deferred deletion of keys observed expired on read.
//! - **Facade** ([`store`]): hashes external keys, applies the TTL, and
//!   drives the periodic Clean pass ([`scheduler`]).

pub mod arena;
pub mod clock;
pub mod data_pool;
pub mod error;
pub mod expired_key_buffer;
pub mod hash;
pub mod partition;
pub mod partitioned_dictionary;
pub mod record;
pub mod reclamation_queue;
pub mod ref_buffer;
pub mod scheduler;
pub mod slab_pool;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use hash::{Fingerprint, KeyHasher};
pub use partitioned_dictionary::DEFAULT_PARTITION_COUNT;
pub use scheduler::{Maintainer, MaintenanceScheduler};
pub use store::{KvStore, KvStoreConfig};
