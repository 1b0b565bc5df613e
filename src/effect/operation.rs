//! Operation - a typed computation running on a work queue.
//!
//! An `Operation<A>` is submitted for execution as soon as it is built and
//! eventually resolves to a [`Try<A>`]. Combinators never run user code on
//! the caller's thread: each one builds a new operation that depends on the
//! operation(s) it derives from, submits it, and returns it. Chaining
//! combinators therefore builds a graph whose edges mean "must finish
//! before", and the [`WorkQueue`] executes that graph.
//!
//! # Queues
//!
//! Root constructors (`new`, `from_fn`, `constant`, `failed`, ...) create a
//! fresh queue unless given one explicitly with the `*_on` variants.
//! Operations built by a combinator run on the queue of the operation they
//! derive from. The operation that produces a mapped value is submitted to
//! a different, fresh queue. Steps that wait for another operation
//! (`map`, `flat_map`, `rescue`, `transform`) give their queue slot back
//! while they wait, so on a queue with a concurrency limit the operation
//! being waited for can still run there.
//!
//! # Failures
//!
//! A user function that returns an error or panics yields a failed
//! operation; nothing escapes onto the worker. Failures flow forward through
//! `map`, `flat_map` and `join` untouched and stop only at `handle` or
//! `rescue`.
//!
//! # Examples
//!
//! ```rust
//! use typed_operation::effect::Operation;
//!
//! let result = Operation::constant(10)
//!     .map(|n| n * 10)
//!     .flat_map(|n| Operation::constant(n + 1))
//!     .await_result();
//! assert_eq!(result.unwrap(), 101);
//! ```
//!
//! # Blocking
//!
//! [`Operation::await_result`] blocks the calling thread. It is a last
//! resort: calling it from a task that shares a queue slot with the awaited
//! operation can stall that queue. Prefer composing with combinators and
//! observing with `on_success` / `on_failure`, or use
//! [`Operation::await_async`] from async code.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use super::queue::{Completion, Task, TaskId, WorkQueue};
use super::runtime;
use super::slot::ResultSlot;
use crate::OperationError;
use crate::control::{Try, Tuple2, Tuple3};

struct OperationInner<A> {
    queue: WorkQueue,
    completion: Completion,
    slot: Arc<ResultSlot<A>>,
}

/// A typed computation scheduled on a [`WorkQueue`].
///
/// Cloning an `Operation` yields another handle to the same computation;
/// it never re-runs it.
///
/// # Type Parameters
///
/// - `A`: the success type. Results are read by every dependent, so
///   combinators require `A: Clone + Send + Sync + 'static`.
pub struct Operation<A> {
    inner: Arc<OperationInner<A>>,
}

impl<A> Clone for Operation<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> Operation<A> {
    /// The identifier of the task running this operation.
    pub fn id(&self) -> TaskId {
        self.inner.completion.task_id()
    }

    /// The queue this operation was submitted to.
    pub fn queue(&self) -> &WorkQueue {
        &self.inner.queue
    }

    /// The completion signalled once this operation has run.
    pub(crate) fn completion(&self) -> &Completion {
        &self.inner.completion
    }

    /// Returns `true` once the operation has run and its result is available.
    pub fn is_finished(&self) -> bool {
        self.inner.completion.is_finished()
    }

    /// Borrowing read of a finished result.
    fn finished_ref(&self) -> Try<&A> {
        self.inner.slot.read_ref()
    }
}

impl<A> Operation<A>
where
    A: Clone + Send + Sync + 'static,
{
    // =========================================================================
    // Construction
    // =========================================================================

    /// Creates an operation from a fallible function and submits it to a
    /// fresh queue.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use typed_operation::effect::Operation;
    ///
    /// let parsed = Operation::new(|| "42".parse::<i32>());
    /// assert_eq!(parsed.await_result().unwrap(), 42);
    ///
    /// let broken = Operation::new(|| "forty-two".parse::<i32>());
    /// assert!(broken.await_result().is_err());
    /// ```
    pub fn new<F, E>(function: F) -> Self
    where
        F: FnOnce() -> Result<A, E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::new_on(&WorkQueue::new(), function)
    }

    /// Like [`new`](Self::new), on an explicit queue.
    pub fn new_on<F, E>(queue: &WorkQueue, function: F) -> Self
    where
        F: FnOnce() -> Result<A, E> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::from_computation(queue, move || Try::of(function))
    }

    /// Creates an operation from an infallible function and submits it to a
    /// fresh queue. A panic inside `function` fails the operation.
    pub fn from_fn<F>(function: F) -> Self
    where
        F: FnOnce() -> A + Send + 'static,
    {
        Self::from_fn_on(&WorkQueue::new(), function)
    }

    /// Like [`from_fn`](Self::from_fn), on an explicit queue.
    pub fn from_fn_on<F>(queue: &WorkQueue, function: F) -> Self
    where
        F: FnOnce() -> A + Send + 'static,
    {
        Self::from_computation(queue, move || Try::catching(function))
    }

    /// An operation that resolves to `value`.
    pub fn constant(value: A) -> Self {
        Self::constant_on(&WorkQueue::new(), value)
    }

    /// Like [`constant`](Self::constant), on an explicit queue.
    pub fn constant_on(queue: &WorkQueue, value: A) -> Self {
        Self::from_computation(queue, move || Try::Succeeded(value))
    }

    /// An operation that resolves to `error`.
    pub fn failed(error: OperationError) -> Self {
        Self::failed_on(&WorkQueue::new(), error)
    }

    /// Like [`failed`](Self::failed), on an explicit queue.
    pub fn failed_on(queue: &WorkQueue, error: OperationError) -> Self {
        Self::from_computation(queue, move || Try::Failed(error))
    }

    /// An operation that resolves to an existing outcome.
    pub fn from_try(outcome: Try<A>) -> Self {
        Self::from_computation(&WorkQueue::new(), move || outcome)
    }

    /// Creates and submits an operation whose computation already yields a `Try`.
    pub(crate) fn from_computation<F>(queue: &WorkQueue, computation: F) -> Self
    where
        F: FnOnce() -> Try<A> + Send + 'static,
    {
        let (operation, task) = Self::prepare(queue.clone(), computation);
        operation.inner.queue.submit(task);
        operation
    }

    /// Builds an operation and its unsubmitted task. The caller declares
    /// dependencies and submits.
    fn prepare<F>(queue: WorkQueue, computation: F) -> (Self, Task)
    where
        F: FnOnce() -> Try<A> + Send + 'static,
    {
        let slot = Arc::new(ResultSlot::new());
        let writer = Arc::clone(&slot);
        let task = Task::new(move || {
            let outcome = Try::flatten_catching(computation);
            if !writer.fill(outcome) {
                tracing::warn!("operation result written twice; keeping the first");
            }
        });
        let operation = Self {
            inner: Arc::new(OperationInner {
                queue,
                completion: task.completion().clone(),
                slot,
            }),
        };
        (operation, task)
    }

    /// Builds an operation on this operation's queue that runs after every
    /// operation in `predecessors`, and submits it.
    fn dependent<B, F>(&self, predecessors: &[&Completion], computation: F) -> Operation<B>
    where
        B: Clone + Send + Sync + 'static,
        F: FnOnce() -> Try<B> + Send + 'static,
    {
        let (operation, mut task) = Operation::prepare(self.inner.queue.clone(), computation);
        for predecessor in predecessors {
            task.add_dependency(predecessor);
        }
        tracing::trace!(
            operation = %operation.id(),
            queue = %self.inner.queue.name(),
            depends_on = predecessors.len(),
            "dependent operation built"
        );
        operation.inner.queue.submit(task);
        operation
    }

    // =========================================================================
    // Results
    // =========================================================================

    /// The result, if the operation has finished. Never blocks.
    pub fn result(&self) -> Option<Try<A>> {
        if self.is_finished() {
            self.inner.slot.peek().cloned()
        } else {
            None
        }
    }

    /// Cloning read of a finished result.
    fn finished_result(&self) -> Try<A> {
        self.inner.slot.read()
    }

    /// Blocks until finished, then returns the outcome.
    fn wait_try(&self) -> Try<A> {
        self.inner.completion.wait();
        self.finished_result()
    }

    /// Blocks the calling thread until the operation finishes and returns
    /// its value.
    ///
    /// Calling it again returns the same outcome without re-running anything.
    ///
    /// # Errors
    ///
    /// Returns the error the operation failed with.
    pub fn await_result(&self) -> Result<A, OperationError> {
        self.wait_try().get()
    }

    /// Awaits the result from async code.
    ///
    /// The blocking wait runs on the caller's runtime blocking pool (or the
    /// shared runtime outside one), so no async worker is blocked.
    ///
    /// # Errors
    ///
    /// Returns the error the operation failed with.
    pub async fn await_async(&self) -> Result<A, OperationError> {
        let operation = self.clone();
        runtime::handle()
            .spawn_blocking(move || operation.await_result())
            .await
            .unwrap_or_else(|join_error| Err(OperationError::Panicked(join_error.to_string())))
    }

    // =========================================================================
    // Combinators
    // =========================================================================

    /// Applies `function` to this operation's outcome once it is available
    /// and resolves to the operation `function` returns.
    ///
    /// The returned operation may live on any queue, including this one.
    /// While the step waits for it, the step's slot on this operation's
    /// queue is handed back, so a queue with a concurrency limit of one can
    /// still run the awaited operation.
    pub fn transform<B, F>(&self, function: F) -> Operation<B>
    where
        B: Clone + Send + Sync + 'static,
        F: FnOnce(Try<A>) -> Operation<B> + Send + 'static,
    {
        let source = self.clone();
        let queue = self.inner.queue.clone();
        self.dependent(&[self.completion()], move || {
            let awaited = function(source.finished_result());
            if awaited.is_finished() {
                awaited.finished_result()
            } else {
                queue.suspended(|| awaited.wait_try())
            }
        })
    }

    /// Applies `function` to the value once this operation succeeds.
    ///
    /// `function` runs as its own operation on a fresh queue. On failure the
    /// error is carried over and `function` is never called.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use typed_operation::effect::Operation;
    ///
    /// let doubled = Operation::constant(21).map(|n| n * 2);
    /// assert_eq!(doubled.await_result().unwrap(), 42);
    /// ```
    pub fn map<B, F>(&self, function: F) -> Operation<B>
    where
        B: Clone + Send + Sync + 'static,
        F: FnOnce(A) -> B + Send + 'static,
    {
        self.transform(move |outcome| match outcome {
            Try::Succeeded(value) => Operation::from_fn(move || function(value)),
            Try::Failed(error) => Operation::failed(error),
        })
    }

    /// Like [`map`](Self::map) for a fallible function.
    pub fn try_map<B, E, F>(&self, function: F) -> Operation<B>
    where
        B: Clone + Send + Sync + 'static,
        E: Error + Send + Sync + 'static,
        F: FnOnce(A) -> Result<B, E> + Send + 'static,
    {
        self.transform(move |outcome| match outcome {
            Try::Succeeded(value) => Operation::new(move || function(value)),
            Try::Failed(error) => Operation::failed(error),
        })
    }

    /// Chains an operation-producing function onto this operation.
    ///
    /// The operation `function` returns is awaited and its outcome becomes
    /// the outcome of the result. On failure `function` is never called.
    /// A function that can fail before it has an operation to return should
    /// use [`try_flat_map`](Self::try_flat_map).
    pub fn flat_map<B, F>(&self, function: F) -> Operation<B>
    where
        B: Clone + Send + Sync + 'static,
        F: FnOnce(A) -> Operation<B> + Send + 'static,
    {
        self.transform(move |outcome| match outcome {
            Try::Succeeded(value) => function(value),
            Try::Failed(error) => Operation::failed(error),
        })
    }

    /// Like [`flat_map`](Self::flat_map) for a function that may fail
    /// instead of returning an operation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use typed_operation::effect::Operation;
    ///
    /// let lookup = Operation::constant("7")
    ///     .try_flat_map(|text| text.parse::<i32>().map(|n| Operation::constant(n * 6)));
    /// assert_eq!(lookup.await_result().unwrap(), 42);
    /// ```
    pub fn try_flat_map<B, E, F>(&self, function: F) -> Operation<B>
    where
        B: Clone + Send + Sync + 'static,
        E: Error + Send + Sync + 'static,
        F: FnOnce(A) -> Result<Operation<B>, E> + Send + 'static,
    {
        self.transform(move |outcome| match outcome {
            Try::Succeeded(value) => {
                function(value).unwrap_or_else(|error| Operation::failed(OperationError::new(error)))
            }
            Try::Failed(error) => Operation::failed(error),
        })
    }

    /// Combines this operation with `other`.
    ///
    /// Succeeds only if both succeed. When either fails the result carries
    /// the first failure, checking `self` before `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use typed_operation::control::Tuple2;
    /// use typed_operation::effect::Operation;
    ///
    /// let joined = Operation::constant(10).join(&Operation::constant("ten"));
    /// assert_eq!(joined.await_result().unwrap(), Tuple2(10, "ten"));
    /// ```
    pub fn join<B>(&self, other: &Operation<B>) -> Operation<Tuple2<A, B>>
    where
        B: Clone + Send + Sync + 'static,
    {
        let left = self.clone();
        let right = other.clone();
        self.dependent(&[self.completion(), other.completion()], move || {
            left.finished_result()
                .flat_map(|first| right.finished_result().map(|second| Tuple2(first, second)))
        })
    }

    /// Combines three operations; failures are checked in argument order.
    pub fn join3<B, C>(
        &self,
        second: &Operation<B>,
        third: &Operation<C>,
    ) -> Operation<Tuple3<A, B, C>>
    where
        B: Clone + Send + Sync + 'static,
        C: Clone + Send + Sync + 'static,
    {
        let first_source = self.clone();
        let second_source = second.clone();
        let third_source = third.clone();
        self.dependent(
            &[self.completion(), second.completion(), third.completion()],
            move || {
                first_source.finished_result().flat_map(|first| {
                    second_source.finished_result().flat_map(|second| {
                        third_source
                            .finished_result()
                            .map(|third| Tuple3(first, second, third))
                    })
                })
            },
        )
    }

    /// Collects the values of `operations` in order.
    ///
    /// Fails with the first failure in input order. An empty input resolves
    /// to an empty vector.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use typed_operation::effect::Operation;
    ///
    /// let all = Operation::join_all((1..=3).map(Operation::constant));
    /// assert_eq!(all.await_result().unwrap(), vec![1, 2, 3]);
    /// ```
    pub fn join_all<I>(operations: I) -> Operation<Vec<A>>
    where
        I: IntoIterator<Item = Self>,
    {
        let operations: Vec<Self> = operations.into_iter().collect();
        let Some(first) = operations.first().cloned() else {
            return Operation::constant(Vec::new());
        };
        let completions: Vec<Completion> = operations
            .iter()
            .map(|operation| operation.completion().clone())
            .collect();
        let predecessors: Vec<&Completion> = completions.iter().collect();
        first.dependent(&predecessors, move || {
            operations
                .iter()
                .map(Self::finished_result)
                .collect::<Try<Vec<A>>>()
        })
    }

    /// Calls `function` with the value once this operation succeeds.
    ///
    /// Returns `self`, so later combinators derive from this operation and
    /// not from the observer. Observers registered separately run in no
    /// particular order relative to each other or to other dependents.
    pub fn on_success<F>(&self, function: F) -> Self
    where
        F: FnOnce(&A) + Send + 'static,
    {
        let source = self.clone();
        self.observe(move || {
            if let Try::Succeeded(value) = source.finished_ref() {
                function(value);
            }
        })
    }

    /// Calls `function` with the error once this operation fails.
    ///
    /// Returns `self`; see [`on_success`](Self::on_success).
    pub fn on_failure<F>(&self, function: F) -> Self
    where
        F: FnOnce(&OperationError) + Send + 'static,
    {
        let source = self.clone();
        self.observe(move || {
            if let Try::Failed(error) = source.finished_ref() {
                function(&error);
            }
        })
    }

    fn observe<F>(&self, observer: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner
            .queue
            .submit(Task::new(observer).depending_on(self.completion()));
        self.clone()
    }

    /// Recovers from a failure with a plain value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use typed_operation::{OperationError, effect::Operation};
    ///
    /// let recovered = Operation::<i32>::failed(OperationError::IndeterminateOutcome)
    ///     .handle(|_| 10);
    /// assert_eq!(recovered.await_result().unwrap(), 10);
    /// ```
    pub fn handle<F>(&self, function: F) -> Self
    where
        F: FnOnce(OperationError) -> A + Send + 'static,
    {
        let source = self.clone();
        self.dependent(&[self.completion()], move || {
            source.finished_result().handle(function)
        })
    }

    /// Recovers from a failure with another operation, which may itself fail.
    ///
    /// On success the original value passes through.
    pub fn rescue<F>(&self, function: F) -> Self
    where
        F: FnOnce(OperationError) -> Self + Send + 'static,
    {
        let source = self.clone();
        self.transform(move |outcome| match outcome {
            Try::Succeeded(_) => source,
            Try::Failed(error) => function(error),
        })
    }
}

impl<A> fmt::Debug for Operation<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Operation")
            .field("id", &self.id())
            .field("queue", &self.inner.queue.name())
            .field("finished", &self.is_finished())
            .finish()
    }
}
