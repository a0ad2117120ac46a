//! Single coordinator thread driving the periodic Clean pass.
//!
//! Ticks every `maintenance_interval`. Each tick spawns one short-lived
//! worker thread per managed maintainer and waits for all of them before
//! the next tick can fire. Every tenth tick would ask the runtime for a
//! generational GC hint in the source (`go runtime.GC()`); Rust has no
//! equivalent primitive, so this is a log line only and correctness never
//! depends on it.
//!
//! The wait between ticks is a condvar `wait_timeout_while`, not a plain
//! sleep: it wakes as soon as `stop()` fires instead of only after the full
//! interval elapses, mirroring the source's
//! `select { case <-ctx.Done(): return; case <-ticker.C: }`
//! (`original_source/internal/server/maintenence.go`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info};

/// Anything the scheduler can periodically ask to clean itself up.
/// `KvStore` is the only maintainer in this system, but the trait keeps the
/// scheduler decoupled from its one caller.
pub trait Maintainer: Send + Sync + 'static {
    fn clean(&self, cancelled: &dyn Fn() -> bool);
}

impl<F> Maintainer for F
where
    F: Fn(&dyn Fn() -> bool) + Send + Sync + 'static,
{
    fn clean(&self, cancelled: &dyn Fn() -> bool) {
        self(cancelled);
    }
}

/// A stop flag with a timed, cancellable wait, so the coordinator thread
/// never blocks longer than necessary for a shutdown to be observed.
struct StopSignal {
    stopped: Mutex<bool>,
    cvar: Condvar,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            cvar: Condvar::new(),
        }
    }

    fn is_stopped(&self) -> bool {
        *self
            .stopped
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn signal_stop(&self) {
        let mut stopped = self
            .stopped
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *stopped = true;
        self.cvar.notify_all();
    }

    /// Waits up to `timeout` for a stop signal. Returns `true` if the
    /// signal fired during the wait, `false` if the timeout elapsed first.
    fn wait(&self, timeout: Duration) -> bool {
        let stopped = self
            .stopped
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let (stopped, _) = self
            .cvar
            .wait_timeout_while(stopped, timeout, |stopped| !*stopped)
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *stopped
    }
}

/// Drives the periodic Clean loop on a dedicated thread.
pub struct MaintenanceScheduler {
    stop: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
}

impl MaintenanceScheduler {
    /// Starts the coordinator thread. `maintainers` are run in order on
    /// their own short-lived threads each tick; the tick does not advance
    /// until all finish.
    #[must_use]
    pub fn start(interval: Duration, maintainers: Vec<Arc<dyn Maintainer>>) -> Self {
        let stop = Arc::new(StopSignal::new());
        let stop_for_thread = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let tick_index = AtomicU64::new(0);
            loop {
                if stop_for_thread.wait(interval) {
                    return;
                }

                let cancelled = Arc::clone(&stop_for_thread);
                let handles: Vec<_> = maintainers
                    .iter()
                    .cloned()
                    .map(|maintainer| {
                        let cancelled = Arc::clone(&cancelled);
                        thread::spawn(move || {
                            maintainer.clean(&|| cancelled.is_stopped());
                        })
                    })
                    .collect();

                for handle in handles {
                    let _ = handle.join();
                }

                let tick = tick_index.fetch_add(1, Ordering::Relaxed) + 1;
                if tick % 10 == 0 {
                    debug!("maintenance tick {tick}: advisory GC hint (no-op)");
                }
                info!("maintenance tick {tick} complete");

                if stop_for_thread.is_stopped() {
                    return;
                }
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Signals the loop to exit and waits for the coordinator thread to
    /// finish. Wakes the thread immediately rather than waiting out the
    /// rest of the current interval. In-flight Clean invocations observe
    /// `cancelled()` between drain chunks and between partitions and are
    /// allowed to finish their current chunk.
    pub fn stop(mut self) {
        self.stop.signal_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MaintenanceScheduler {
    fn drop(&mut self) {
        self.stop.signal_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
