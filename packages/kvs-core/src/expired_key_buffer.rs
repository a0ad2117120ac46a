//! Append-only buffer of keys observed expired on read, drained in bounded
//! chunks by the periodic Clean pass.
//!
//! Drain policy (chosen variant -- see `DESIGN.md` for the two variants the
//! source mixes together): `cleared_index` advances by the *actual* length
//! of the slice just processed, not by the configured chunk size, and both
//! `cleared_index` and the backing list reset to empty once the index
//! catches up with the list length. A chunk whose callback returns `false`
//! (cancellation) leaves `cleared_index` at the start of that chunk so the
//! same keys are retried on the next pass.

use parking_lot::Mutex;

use crate::hash::Fingerprint;

pub const DEFAULT_MAX_ATTEMPTS: usize = 5;
pub const DEFAULT_CHUNK_SIZE: usize = 100;
const INITIAL_CAPACITY: usize = 1024;

struct Inner {
    keys: Vec<Fingerprint>,
    cleared_index: usize,
}

#[derive(Default)]
pub struct ExpiredKeyBuffer {
    inner: Mutex<Inner>,
}

impl ExpiredKeyBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                keys: Vec::with_capacity(INITIAL_CAPACITY),
                cleared_index: 0,
            }),
        }
    }

    /// Appends keys observed expired on read. Duplicates are allowed;
    /// they are resolved at drain time.
    pub fn push(&self, keys: impl IntoIterator<Item = Fingerprint>) {
        self.inner.lock().keys.extend(keys);
    }

    /// Drains up to `max_attempts` chunks of up to `chunk_size` keys each,
    /// calling `apply` with each sorted, non-empty chunk. `apply` returns
    /// `false` to signal cancellation, stopping the drain without
    /// advancing past the in-progress chunk.
    pub fn drain<F>(&self, mut apply: F, max_attempts: usize, chunk_size: usize)
    where
        F: FnMut(&[Fingerprint]) -> bool,
    {
        for _ in 0..max_attempts {
            let chunk = {
                let mut inner = self.inner.lock();
                if inner.cleared_index >= inner.keys.len() {
                    inner.keys.clear();
                    inner.cleared_index = 0;
                    return;
                }
                inner.keys[inner.cleared_index..].sort_unstable();
                let end = (inner.cleared_index + chunk_size).min(inner.keys.len());
                inner.keys[inner.cleared_index..end].to_vec()
            };

            if chunk.is_empty() {
                return;
            }

            let should_continue = apply(&chunk);

            let mut inner = self.inner.lock();
            if !should_continue {
                return;
            }
            inner.cleared_index += chunk.len();
            if inner.cleared_index >= inner.keys.len() {
                inner.keys.clear();
                inner.cleared_index = 0;
            }
        }
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        let inner = self.inner.lock();
        inner.keys.len() - inner.cleared_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_everything_within_budget() {
        let buffer = ExpiredKeyBuffer::new();
        buffer.push(0..250);

        let mut seen = Vec::new();
        buffer.drain(
            |chunk| {
                seen.extend_from_slice(chunk);
                true
            },
            DEFAULT_MAX_ATTEMPTS,
            DEFAULT_CHUNK_SIZE,
        );

        assert_eq!(seen.len(), 250);
        assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn duplicates_are_preserved_for_caller_dedup() {
        let buffer = ExpiredKeyBuffer::new();
        buffer.push([1, 1, 2]);

        let mut seen = Vec::new();
        buffer.drain(
            |chunk| {
                seen.extend_from_slice(chunk);
                true
            },
            DEFAULT_MAX_ATTEMPTS,
            DEFAULT_CHUNK_SIZE,
        );

        assert_eq!(seen, vec![1, 1, 2]);
    }

    #[test]
    fn cancellation_leaves_chunk_for_retry() {
        let buffer = ExpiredKeyBuffer::new();
        buffer.push(0..10);

        buffer.drain(|_chunk| false, DEFAULT_MAX_ATTEMPTS, 4);
        assert_eq!(buffer.pending_len(), 10);

        let mut seen = Vec::new();
        buffer.drain(
            |chunk| {
                seen.extend_from_slice(chunk);
                true
            },
            DEFAULT_MAX_ATTEMPTS,
            4,
        );
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn stops_after_max_attempts() {
        let buffer = ExpiredKeyBuffer::new();
        buffer.push(0..100);

        let mut calls = 0;
        buffer.drain(
            |_chunk| {
                calls += 1;
                true
            },
            3,
            10,
        );

        assert_eq!(calls, 3);
        assert_eq!(buffer.pending_len(), 70);
    }
}
