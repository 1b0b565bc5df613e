//! Callback adapter - lifts callback-style APIs into operations.
//!
//! Many asynchronous APIs take a completion callback, return immediately,
//! and later call the callback with a value or an error. The adapter runs
//! such a registration function inside an operation and blocks that
//! operation's worker until the callback fires, so the result composes with
//! every other operation combinator.
//!
//! The callback outcome is interpreted as follows:
//!
//! | value  | error  | outcome                                   |
//! |--------|--------|-------------------------------------------|
//! | `Some` | `None` | success                                   |
//! | any    | `Some` | failure with that error                   |
//! | `None` | `None` | [`OperationError::IndeterminateOutcome`]  |
//!
//! If the registration function itself fails, the operation fails at once
//! without waiting. If the callback is dropped uncalled the operation fails
//! with [`OperationError::CallbackDropped`].
//!
//! By default the wait is unbounded. [`AdapterConfig::with_wait`] sets a
//! bound, after which the operation fails with [`OperationError::TimedOut`].
//!
//! # Examples
//!
//! ```rust
//! use typed_operation::effect::{Callback, CallbackAdapter};
//! use std::thread;
//!
//! fn fetch_answer(callback: impl FnOnce(Option<u32>, Option<std::io::Error>) + Send + 'static) {
//!     thread::spawn(move || callback(Some(42), None));
//! }
//!
//! let operation = CallbackAdapter::new().adapt(|callback: Callback<u32>| {
//!     fetch_answer(move |value, error| callback.complete(value, error));
//! });
//! assert_eq!(operation.await_result().unwrap(), 42);
//! ```

use std::convert::Infallible;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::operation::Operation;
use super::queue::WorkQueue;
use super::signal::{WaitHandle, WaitTimeout};
use crate::OperationError;
use crate::control::Try;

// =============================================================================
// Configuration
// =============================================================================

/// Settings for a [`CallbackAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdapterConfig {
    wait: WaitTimeout,
}

impl AdapterConfig {
    /// Unbounded wait.
    pub const fn new() -> Self {
        Self {
            wait: WaitTimeout::Forever,
        }
    }

    /// Sets how long the adapter waits for the callback.
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitTimeout) -> Self {
        self.wait = wait;
        self
    }

    /// The configured wait.
    pub const fn wait(&self) -> WaitTimeout {
        self.wait
    }
}

// =============================================================================
// Callback
// =============================================================================

struct Delivery<A> {
    outcome: Mutex<Option<Try<A>>>,
    delivered: WaitHandle,
}

impl<A> Delivery<A> {
    fn deliver(&self, outcome: Try<A>) {
        let mut slot = self.outcome.lock();
        if slot.is_none() {
            *slot = Some(outcome);
        }
        drop(slot);
        self.delivered.signal();
    }

    fn receive(&self, wait: WaitTimeout) -> Try<A> {
        if self.delivered.wait(wait) {
            return self
                .outcome
                .lock()
                .take()
                .unwrap_or(Try::Failed(OperationError::IndeterminateOutcome));
        }
        match wait {
            WaitTimeout::After(bound) => {
                tracing::debug!(?bound, "callback wait timed out");
                Try::Failed(OperationError::TimedOut(bound))
            }
            WaitTimeout::Forever => Try::Failed(OperationError::IndeterminateOutcome),
        }
    }
}

/// The completion handle passed to a registration function.
///
/// Consumed by whichever completion method is called; dropping it uncalled
/// resolves the operation to [`OperationError::CallbackDropped`].
pub struct Callback<A> {
    delivery: Option<Arc<Delivery<A>>>,
}

impl<A> Callback<A> {
    fn new(delivery: Arc<Delivery<A>>) -> Self {
        Self {
            delivery: Some(delivery),
        }
    }

    /// Completes with the `(value, error)` pair a callback API reports.
    ///
    /// An error wins over a value; neither is an indeterminate outcome.
    pub fn complete<E>(self, value: Option<A>, error: Option<E>)
    where
        E: Error + Send + Sync + 'static,
    {
        let outcome = match (value, error) {
            (_, Some(error)) => Try::Failed(OperationError::new(error)),
            (Some(value), None) => Try::Succeeded(value),
            (None, None) => {
                tracing::debug!("callback completed with neither value nor error");
                Try::Failed(OperationError::IndeterminateOutcome)
            }
        };
        self.resolve(outcome);
    }

    /// Completes with a value.
    pub fn succeed(self, value: A) {
        self.resolve(Try::Succeeded(value));
    }

    /// Completes with an error.
    pub fn fail<E>(self, error: E)
    where
        E: Error + Send + Sync + 'static,
    {
        self.resolve(Try::Failed(OperationError::new(error)));
    }

    /// Completes with a `Result`.
    pub fn complete_with<E>(self, result: Result<A, E>)
    where
        E: Error + Send + Sync + 'static,
    {
        self.resolve(Try::from(result));
    }

    /// Completes with an outcome.
    pub fn resolve(mut self, outcome: Try<A>) {
        if let Some(delivery) = self.delivery.take() {
            delivery.deliver(outcome);
        }
    }
}

impl<A> Drop for Callback<A> {
    fn drop(&mut self) {
        if let Some(delivery) = self.delivery.take() {
            tracing::debug!("callback dropped without being invoked");
            delivery.deliver(Try::Failed(OperationError::CallbackDropped));
        }
    }
}

impl<A> fmt::Debug for Callback<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Callback")
            .field("pending", &self.delivery.is_some())
            .finish()
    }
}

// =============================================================================
// CallbackAdapter
// =============================================================================

/// Builds operations from callback-style asynchronous calls.
#[derive(Debug, Clone, Default)]
pub struct CallbackAdapter {
    config: AdapterConfig,
    queue: Option<WorkQueue>,
}

impl CallbackAdapter {
    /// An adapter with an unbounded wait that runs each call on a fresh queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// An adapter with the given settings.
    pub fn with_config(config: AdapterConfig) -> Self {
        Self {
            config,
            queue: None,
        }
    }

    /// Runs adapted calls on `queue` instead of a fresh queue each.
    ///
    /// Every adapted call occupies one of the queue's slots while it waits.
    #[must_use]
    pub fn on_queue(mut self, queue: &WorkQueue) -> Self {
        self.queue = Some(queue.clone());
        self
    }

    /// The adapter's settings.
    pub const fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Adapts a registration function that cannot fail.
    pub fn adapt<A, F>(&self, register: F) -> Operation<A>
    where
        A: Clone + Send + Sync + 'static,
        F: FnOnce(Callback<A>) + Send + 'static,
    {
        self.try_adapt(move |callback| {
            register(callback);
            Ok::<(), Infallible>(())
        })
    }

    /// Adapts a registration function that may fail before returning.
    ///
    /// A registration error fails the operation immediately, even if the
    /// callback was already invoked.
    pub fn try_adapt<A, F, E>(&self, register: F) -> Operation<A>
    where
        A: Clone + Send + Sync + 'static,
        F: FnOnce(Callback<A>) -> Result<(), E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        let wait = self.config.wait;
        let queue = self.queue.clone().unwrap_or_default();
        Operation::from_computation(&queue, move || {
            let delivery = Arc::new(Delivery {
                outcome: Mutex::new(None),
                delivered: WaitHandle::create(),
            });
            if let Err(error) = register(Callback::new(Arc::clone(&delivery))) {
                return Try::Failed(OperationError::new(error));
            }
            delivery.receive(wait)
        })
    }
}

impl<A> Operation<A>
where
    A: Clone + Send + Sync + 'static,
{
    /// Shorthand for `CallbackAdapter::new().adapt(register)`.
    pub fn from_callback<F>(register: F) -> Self
    where
        F: FnOnce(Callback<A>) + Send + 'static,
    {
        CallbackAdapter::new().adapt(register)
    }
}
