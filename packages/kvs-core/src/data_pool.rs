//! Facade that turns `(bytes, expiration)` into a stored, readable buffer,
//! rotating arenas transparently when the current one fills up.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::arena::Arena;
use crate::error::{StoreError, StoreResult};
use crate::reclamation_queue::ReclamationQueue;
use crate::ref_buffer::RefBuffer;
use crate::slab_pool::SlabPool;

struct Rotation {
    current: Arc<Arena>,
    reclamation: ReclamationQueue,
}

pub struct DataPool {
    slab_pool: Arc<SlabPool>,
    rotation: Mutex<Rotation>,
}

impl DataPool {
    pub fn new(slab_pool: Arc<SlabPool>) -> StoreResult<Self> {
        let current = slab_pool.acquire()?;
        Ok(Self {
            slab_pool,
            rotation: Mutex::new(Rotation {
                current,
                reclamation: ReclamationQueue::new(),
            }),
        })
    }

    /// Stores `data` in the current arena, rotating to a fresh one and
    /// retrying exactly once if the current arena is full. Returns
    /// `OutOfLimit` if a value cannot fit even a fresh arena, or if the
    /// pool's slab budget is already exhausted.
    pub fn store(&self, data: &[u8], expiration_millis: u64) -> StoreResult<RefBuffer> {
        let mut rotation = self.rotation.lock();

        if let Some(buffer) = rotation.current.try_allocate(data, expiration_millis) {
            return Ok(buffer);
        }

        let fresh = self.slab_pool.acquire()?;
        let retiring = std::mem::replace(&mut rotation.current, fresh);
        rotation.reclamation.push(retiring);

        rotation
            .current
            .try_allocate(data, expiration_millis)
            .ok_or(StoreError::OutOfLimit)
    }

    /// Non-blocking sweep of the reclamation queue: detaches reclaimable
    /// arenas from the head and returns their slab budget, stopping at the
    /// first non-reclaimable entry.
    pub fn clean(&self, now_millis: u64) {
        let mut rotation = self.rotation.lock();
        while let Some(arena) = rotation.reclamation.pop_if_reclaimable(now_millis) {
            self.slab_pool.release(arena);
        }
    }
}
