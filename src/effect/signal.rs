//! One-shot blocking wait handle.
//!
//! A `WaitHandle` starts unsignalled, is signalled at most once, and lets any
//! number of threads block until that happens. It backs both operation
//! completion and the callback adapter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// How long a blocking wait may last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitTimeout {
    /// Block until signalled, however long that takes.
    #[default]
    Forever,
    /// Give up after the given duration.
    After(Duration),
}

#[derive(Debug, Default)]
struct Signal {
    signalled: Mutex<bool>,
    condvar: Condvar,
}

/// A cloneable one-shot signal. Clones observe the same state.
///
/// # Examples
///
/// ```rust
/// use typed_operation::effect::{WaitHandle, WaitTimeout};
/// use std::thread;
///
/// let handle = WaitHandle::create();
/// let signaller = handle.clone();
/// thread::spawn(move || {
///     signaller.signal();
/// });
/// assert!(handle.wait(WaitTimeout::Forever));
/// ```
#[derive(Debug, Clone, Default)]
pub struct WaitHandle {
    inner: Arc<Signal>,
}

impl WaitHandle {
    /// Creates an unsignalled handle.
    pub fn create() -> Self {
        Self::default()
    }

    /// Signals the handle, waking every waiter.
    ///
    /// Returns `true` for the call that performed the transition; later calls
    /// are no-ops and return `false`.
    pub fn signal(&self) -> bool {
        let mut signalled = self.inner.signalled.lock();
        if *signalled {
            return false;
        }
        *signalled = true;
        self.inner.condvar.notify_all();
        true
    }

    /// Returns `true` once the handle has been signalled.
    pub fn is_signalled(&self) -> bool {
        *self.inner.signalled.lock()
    }

    /// Blocks until the handle is signalled or the timeout elapses.
    ///
    /// Returns whether the handle was signalled.
    pub fn wait(&self, timeout: WaitTimeout) -> bool {
        let mut signalled = self.inner.signalled.lock();
        match timeout {
            WaitTimeout::Forever => {
                while !*signalled {
                    self.inner.condvar.wait(&mut signalled);
                }
                true
            }
            WaitTimeout::After(duration) => {
                let deadline = Instant::now() + duration;
                while !*signalled {
                    if self
                        .inner
                        .condvar
                        .wait_until(&mut signalled, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
                *signalled
            }
        }
    }
}
