//! Bounded issuance of fresh and recycled arenas.
//!
//! Keeps a free list of boxed slabs retired by fully-drained arenas and
//! hands them back out on `acquire()` before ever allocating a new one,
//! matching the source's literal free-list recycling. `live_slabs` still
//! tracks the soft cap against `max_live_slabs` -- the resource budget the
//! spec's `OutOfLimit` behavior protects is "arenas concurrently
//! reachable", not "bytes ever allocated", so the cap and the free list are
//! independent bookkeeping.
//!
//! This is the only process-wide shared resource in the system (see the
//! concurrency model); every `Partition`'s `DataPool` acquires arenas from
//! one shared instance.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::arena::Arena;
use crate::error::{StoreError, StoreResult};

pub struct SlabPool {
    slab_capacity: usize,
    max_live_slabs: usize,
    live_slabs: AtomicUsize,
    free_slabs: Mutex<Vec<Box<[u8]>>>,
}

impl SlabPool {
    #[must_use]
    pub fn new(slab_capacity: usize, max_live_slabs: usize) -> Self {
        Self {
            slab_capacity,
            max_live_slabs,
            live_slabs: AtomicUsize::new(0),
            free_slabs: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn slab_capacity(&self) -> usize {
        self.slab_capacity
    }

    /// Never blocks. Returns `OutOfLimit` once `max_live_slabs` concurrently
    /// live arenas have been issued and none have been released yet.
    /// Prefers a recycled slab from the free list over a fresh allocation.
    pub fn acquire(&self) -> StoreResult<Arc<Arena>> {
        loop {
            let current = self.live_slabs.load(Ordering::Acquire);
            if current >= self.max_live_slabs {
                return Err(StoreError::OutOfLimit);
            }
            if self
                .live_slabs
                .compare_exchange_weak(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let recycled = self.free_slabs.lock().pop();
                return Ok(match recycled {
                    Some(slab) => Arena::from_slab(slab),
                    None => Arena::new(self.slab_capacity),
                });
            }
        }
    }

    /// Returns one slab's worth of budget and, if `arena` is no longer
    /// reachable from anywhere else, reclaims its boxed buffer onto the
    /// free list for a future `acquire()`. Callers are required to call
    /// this at most once per `acquire()`, with the same arena that call
    /// returned (or one already fully drained), never a live one.
    pub fn release(&self, arena: Arc<Arena>) {
        self.live_slabs.fetch_sub(1, Ordering::AcqRel);
        if let Ok(arena) = Arc::try_unwrap(arena) {
            self.free_slabs.lock().push(arena.into_slab());
        }
    }

    #[must_use]
    pub fn live_slab_count(&self) -> usize {
        self.live_slabs.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn free_slab_count(&self) -> usize {
        self.free_slabs.lock().len()
    }
}
