//! FIFO of retired arenas awaiting recycling.
//!
//! Chosen policy (the source has two variants, see `DESIGN.md`): strict
//! head-only. `pop_if_reclaimable` only ever inspects the front of the
//! queue and stops at the first non-reclaimable entry, matching the
//! "stop at the first non-reclaimable entry" default `DataPool::clean`
//! behavior. Forward progress is still guaranteed because released buffers
//! drive `live_count` to zero independent of scan order.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::arena::Arena;

#[derive(Default)]
pub struct ReclamationQueue {
    queue: VecDeque<Arc<Arena>>,
}

impl ReclamationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Enqueues an arena that has just been retired from `current`. Callers
    /// must ensure an arena is retired (stopped being handed allocations)
    /// before it is pushed, and pushed at most once.
    pub fn push(&mut self, arena: Arc<Arena>) {
        self.queue.push_back(arena);
    }

    pub fn pop_if_reclaimable(&mut self, now_millis: u64) -> Option<Arc<Arena>> {
        if self
            .queue
            .front()
            .is_some_and(|arena| arena.is_reclaimable(now_millis))
        {
            self.queue.pop_front()
        } else {
            None
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
