//! Shared worker runtime for operation queues.
//!
//! Every [`WorkQueue`](super::WorkQueue) dispatches ready work onto the
//! blocking pool of a single, lazily built multi-thread tokio runtime.
//!
//! # Design Philosophy
//!
//! Operations block: `flat_map` waits on the operation its function returns
//! and the callback adapter waits on an external callback. A fixed-size pool
//! would let enough blocked workers starve the work they are waiting for, so
//! queues use the blocking pool, which grows on demand and reuses idle
//! threads.
//!
//! The runtime has static lifetime and is never dropped.

use std::cell::RefCell;
use std::sync::LazyLock;

use tokio::runtime::{Builder, Handle, Runtime};

/// Upper bound on simultaneously blocked operation workers.
const MAX_BLOCKING_THREADS: usize = 1024;

// =============================================================================
// Global Runtime
// =============================================================================

static GLOBAL_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .max_blocking_threads(MAX_BLOCKING_THREADS)
        .thread_name("typed-operation-worker")
        .enable_all()
        .build()
        .expect("Failed to create global tokio runtime")
});

/// Returns the runtime operation queues dispatch onto.
#[inline]
#[must_use]
pub fn global() -> &'static Runtime {
    &GLOBAL_RUNTIME
}

// =============================================================================
// Handle Caching
// =============================================================================

thread_local! {
    static CACHED_HANDLE: RefCell<Option<Handle>> = const { RefCell::new(None) };
}

/// Returns the current runtime's handle when called inside one, otherwise a
/// cached handle to the global runtime.
///
/// Used to offload blocking waits from async callers onto whichever runtime
/// they are running in.
#[must_use]
pub fn handle() -> Handle {
    if let Ok(current_handle) = Handle::try_current() {
        return current_handle;
    }

    CACHED_HANDLE.with(|cached| {
        cached
            .borrow_mut()
            .get_or_insert_with(|| global().handle().clone())
            .clone()
    })
}

/// Runs `job` on a blocking worker of the global runtime.
///
/// Always targets the global runtime, never the caller's, so queued work
/// outlives short-lived runtimes such as the ones `#[tokio::test]` creates.
pub(crate) fn spawn_worker<F>(job: F)
where
    F: FnOnce() + Send + 'static,
{
    // Completion is reported through the task's own `Completion`; the join
    // handle is not needed.
    drop(global().spawn_blocking(job));
}
