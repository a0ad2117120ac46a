//! Error taxonomy for the storage substrate.
//!
//! Four variants only: a missing key, a key that existed but has expired,
//! a write that could not be satisfied within the configured memory budget,
//! and an opaque internal failure. Callers that only care about HTTP status
//! codes can treat `NotFound` and `Expired` the same way; callers that need
//! to distinguish them (e.g. to enqueue a deferred delete) can match on the
//! variant directly.

use thiserror::Error;

/// Error returned by the fallible operations of [`crate::KvStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record was ever stored under this key.
    #[error("key not found")]
    NotFound,

    /// A record exists but its expiration has passed.
    #[error("key expired")]
    Expired,

    /// The partition's storage budget is exhausted and no slab can be
    /// rotated in to satisfy the write.
    #[error("storage limit reached")]
    OutOfLimit,

    /// Anything else: lock poisoning, programmer errors surfaced as
    /// invariant violations, etc.
    #[error("internal storage error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
