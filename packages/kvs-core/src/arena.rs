//! One slab plus the bump-pointer allocator and refcount bookkeeping that
//! decide when the slab can go back to the pool.
//!
//! `unsafe_code` is forbidden workspace-wide, so the slab is not a raw byte
//! pointer with manual bounds checking; it is a `parking_lot::RwLock<Box<[u8]>>`.
//! Writes happen exactly once per sub-buffer, under a short write-lock, at
//! allocation time; reads take a read-lock and copy the requested range out.
//! This keeps the two-counter design from the source (a strong reference
//! keeps the `Arena` object alive; `live_count` decides when its slab may be
//! recycled) without needing unsafe aliasing tricks.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::ref_buffer::RefBuffer;

pub struct Arena {
    slab: RwLock<Box<[u8]>>,
    capacity: usize,
    cursor: AtomicUsize,
    high_water_expiration: AtomicU64,
    live_count: AtomicUsize,
}

impl Arena {
    #[must_use]
    pub fn new(capacity: usize) -> Arc<Self> {
        Self::from_slab(vec![0u8; capacity].into_boxed_slice())
    }

    /// Wraps an existing boxed slab -- fresh or recycled from
    /// [`crate::slab_pool::SlabPool`]'s free list -- as a brand-new arena
    /// with its cursor and counters reset to zero. The slab's bytes are not
    /// cleared; every byte is overwritten by `try_allocate` before any
    /// reader can see it, so a recycled slab still carrying the previous
    /// tenant's bytes past the new cursor is unobservable.
    #[must_use]
    pub fn from_slab(slab: Box<[u8]>) -> Arc<Self> {
        let capacity = slab.len();
        Arc::new(Self {
            slab: RwLock::new(slab),
            capacity,
            cursor: AtomicUsize::new(0),
            high_water_expiration: AtomicU64::new(0),
            live_count: AtomicUsize::new(0),
        })
    }

    /// Consumes the arena and hands back its boxed slab so `SlabPool` can
    /// recycle it into a future arena. Callers must only call this once an
    /// arena is no longer reachable from any other `Arc`, i.e. after
    /// `Arc::try_unwrap` succeeds.
    pub(crate) fn into_slab(self) -> Box<[u8]> {
        self.slab.into_inner()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reserves `data.len()` bytes starting at the current cursor and copies
    /// `data` into them, returning a [`RefBuffer`] view. A strict `<`
    /// against capacity reserves a guard byte, matching the source.
    ///
    /// Returns `None` ("Full") without mutating any state if the arena
    /// cannot fit `data`. Callers (the owning `DataPool`) serialize calls to
    /// this method, so there is no retry loop on the cursor itself.
    pub fn try_allocate(self: &Arc<Self>, data: &[u8], expiration_millis: u64) -> Option<RefBuffer> {
        let size = data.len();
        let cursor = self.cursor.load(Ordering::Relaxed);
        if cursor + size >= self.capacity {
            return None;
        }

        self.cursor.store(cursor + size, Ordering::Relaxed);
        self.high_water_expiration
            .fetch_max(expiration_millis, Ordering::Relaxed);

        {
            let mut slab = self.slab.write();
            slab[cursor..cursor + size].copy_from_slice(data);
        }

        self.live_count.fetch_add(1, Ordering::AcqRel);
        Some(RefBuffer::new(Arc::clone(self), cursor, size))
    }

    pub(crate) fn read_range(&self, offset: usize, len: usize) -> Vec<u8> {
        let slab = self.slab.read();
        slab[offset..offset + len].to_vec()
    }

    pub(crate) fn release_one(&self) {
        self.live_count.fetch_sub(1, Ordering::AcqRel);
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live_count.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_reclaimable(&self, now_millis: u64) -> bool {
        self.live_count.load(Ordering::Acquire) == 0
            && self.high_water_expiration.load(Ordering::Acquire) <= now_millis
    }
}
