//! Work queues with dependency-ordered execution.
//!
//! A [`Task`] is a unit of work plus the [`Completion`]s it must wait for.
//! [`WorkQueue::submit`] hands it over; the task runs exactly once, only
//! after every declared predecessor has finished (successfully or not), and
//! its own completion is signalled after it runs.
//!
//! Ready tasks start in the order they became ready and execute on the
//! shared [`runtime`](super::runtime). A queue runs any number of them at
//! once unless built with a concurrency limit; on a limited queue a task that
//! blocks waiting for another operation hands its slot back for the duration
//! of the wait.
//!
//! # Examples
//!
//! ```rust
//! use typed_operation::effect::{Task, WorkQueue};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let queue = WorkQueue::new();
//! let order = Arc::new(AtomicUsize::new(0));
//!
//! let first_order = Arc::clone(&order);
//! let first = queue.submit(Task::new(move || {
//!     first_order.compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst).unwrap();
//! }));
//!
//! let second_order = Arc::clone(&order);
//! let mut second = Task::new(move || {
//!     second_order.compare_exchange(1, 2, Ordering::SeqCst, Ordering::SeqCst).unwrap();
//! });
//! second.add_dependency(&first);
//! queue.submit(second).wait();
//!
//! assert_eq!(order.load(Ordering::SeqCst), 2);
//! ```

use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::runtime;
use super::signal::{WaitHandle, WaitTimeout};

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

type Job = Box<dyn FnOnce() + Send + 'static>;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifies a task (and the operation it runs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        Self(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "task-{}", self.0)
    }
}

/// Identifies a work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueId(u64);

impl fmt::Display for QueueId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "queue-{}", self.0)
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Errors raised while building a [`QueueConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueConfigError {
    /// The concurrency limit was zero.
    InvalidConcurrency,
}

impl fmt::Display for QueueConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConcurrency => {
                write!(formatter, "max concurrent operations must be greater than 0")
            }
        }
    }
}

impl Error for QueueConfigError {}

/// Settings for a [`WorkQueue`].
///
/// # Examples
///
/// ```rust
/// use typed_operation::effect::{QueueConfig, WorkQueue};
///
/// let config = QueueConfig::new()
///     .with_name("downloads")
///     .with_max_concurrent_operations(1)
///     .unwrap();
/// let queue = WorkQueue::with_config(config);
/// assert_eq!(queue.name(), "downloads");
/// assert_eq!(queue.max_concurrent_operations(), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueConfig {
    name: Option<String>,
    /// `None` means unlimited.
    max_concurrent_operations: Option<usize>,
}

impl QueueConfig {
    /// Unnamed queue with no concurrency limit.
    pub const fn new() -> Self {
        Self {
            name: None,
            max_concurrent_operations: None,
        }
    }

    /// Sets the queue name used in logs and `Debug` output.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets how many ready tasks may run at once.
    ///
    /// Tasks blocked waiting for another operation's result do not count
    /// against the limit while they wait.
    ///
    /// # Errors
    ///
    /// Returns [`QueueConfigError::InvalidConcurrency`] if `limit` is zero.
    pub fn with_max_concurrent_operations(
        mut self,
        limit: usize,
    ) -> Result<Self, QueueConfigError> {
        if limit == 0 {
            return Err(QueueConfigError::InvalidConcurrency);
        }
        self.max_concurrent_operations = Some(limit);
        Ok(self)
    }

    /// The configured name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The concurrency limit, or `None` if unlimited.
    pub const fn max_concurrent_operations(&self) -> Option<usize> {
        self.max_concurrent_operations
    }
}

// =============================================================================
// Completion
// =============================================================================

struct CompletionInner {
    task: TaskId,
    finished: WaitHandle,
    /// `None` once the task has finished.
    dependents: Mutex<Option<Vec<Arc<PendingTask>>>>,
}

/// The finished state of a task, shared by everyone waiting on it.
#[derive(Clone)]
pub struct Completion {
    inner: Arc<CompletionInner>,
}

impl Completion {
    fn new(task: TaskId) -> Self {
        Self {
            inner: Arc::new(CompletionInner {
                task,
                finished: WaitHandle::create(),
                dependents: Mutex::new(Some(Vec::new())),
            }),
        }
    }

    /// The task this completion belongs to.
    pub fn task_id(&self) -> TaskId {
        self.inner.task
    }

    /// Returns `true` once the task has run.
    pub fn is_finished(&self) -> bool {
        self.inner.finished.is_signalled()
    }

    /// Blocks until the task has run.
    pub fn wait(&self) {
        self.inner.finished.wait(WaitTimeout::Forever);
    }

    /// Blocks until the task has run or `timeout` elapses.
    ///
    /// Returns whether the task finished.
    pub fn wait_timeout(&self, timeout: WaitTimeout) -> bool {
        self.inner.finished.wait(timeout)
    }

    /// Registers a dependent. Returns `false` if this task already finished,
    /// in which case the dependent is not retained.
    fn register(&self, dependent: &Arc<PendingTask>) -> bool {
        match self.inner.dependents.lock().as_mut() {
            Some(dependents) => {
                dependents.push(Arc::clone(dependent));
                true
            }
            None => false,
        }
    }

    fn finish(&self) {
        let dependents = self.inner.dependents.lock().take().unwrap_or_default();
        self.inner.finished.signal();
        tracing::trace!(
            task = %self.inner.task,
            dependents = dependents.len(),
            "task finished"
        );
        for dependent in dependents {
            dependent.release();
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Completion")
            .field("task", &self.inner.task)
            .field("finished", &self.is_finished())
            .finish()
    }
}

// =============================================================================
// Task
// =============================================================================

/// A unit of work awaiting submission.
pub struct Task {
    job: Job,
    completion: Completion,
    dependencies: Vec<Completion>,
}

impl Task {
    /// Wraps `job` in a task with no dependencies.
    pub fn new<F>(job: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            job: Box::new(job),
            completion: Completion::new(TaskId::next()),
            dependencies: Vec::new(),
        }
    }

    /// The task's identifier.
    pub fn id(&self) -> TaskId {
        self.completion.task_id()
    }

    /// The completion signalled after this task runs.
    pub const fn completion(&self) -> &Completion {
        &self.completion
    }

    /// Declares that this task must not start before `predecessor` finishes.
    pub fn add_dependency(&mut self, predecessor: &Completion) {
        self.dependencies.push(predecessor.clone());
    }

    /// Builder form of [`add_dependency`](Self::add_dependency).
    #[must_use]
    pub fn depending_on(mut self, predecessor: &Completion) -> Self {
        self.add_dependency(predecessor);
        self
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Task")
            .field("id", &self.id())
            .field(
                "dependencies",
                &self
                    .dependencies
                    .iter()
                    .map(Completion::task_id)
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

struct ReadyTask {
    job: Job,
    completion: Completion,
}

impl ReadyTask {
    fn run(self) {
        let task = self.completion.task_id();
        if let Err(payload) = catch_unwind(AssertUnwindSafe(self.job)) {
            // Operation jobs catch their own panics; this only guards raw tasks.
            let error = crate::OperationError::from_panic(payload);
            tracing::debug!(%task, %error, "task panicked");
        }
        self.completion.finish();
    }
}

/// A submitted task waiting for its predecessors.
struct PendingTask {
    /// Unfinished predecessors, plus one held by `submit` until registration ends.
    remaining: AtomicUsize,
    ready: Mutex<Option<ReadyTask>>,
    queue: WorkQueue,
}

impl PendingTask {
    fn release(self: &Arc<Self>) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            if let Some(task) = self.ready.lock().take() {
                self.queue.enqueue(task);
            }
        }
    }
}

// =============================================================================
// WorkQueue
// =============================================================================

struct QueueState {
    running: usize,
    ready: VecDeque<ReadyTask>,
}

struct QueueInner {
    id: QueueId,
    name: String,
    max_concurrent_operations: Option<usize>,
    state: Mutex<QueueState>,
}

/// A handle to a work queue. Clones refer to the same queue.
#[derive(Clone)]
pub struct WorkQueue {
    inner: Arc<QueueInner>,
}

impl WorkQueue {
    /// Creates a queue with the default configuration.
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Creates a queue from `config`.
    pub fn with_config(config: QueueConfig) -> Self {
        let id = QueueId(NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed));
        let name = config
            .name
            .unwrap_or_else(|| format!("TypedOperation {id}"));
        tracing::debug!(queue = %name, limit = ?config.max_concurrent_operations, "queue created");
        Self {
            inner: Arc::new(QueueInner {
                id,
                name,
                max_concurrent_operations: config.max_concurrent_operations,
                state: Mutex::new(QueueState {
                    running: 0,
                    ready: VecDeque::new(),
                }),
            }),
        }
    }

    /// The queue's identifier.
    pub fn id(&self) -> QueueId {
        self.inner.id
    }

    /// The queue's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The concurrency limit, or `None` if unlimited.
    pub fn max_concurrent_operations(&self) -> Option<usize> {
        self.inner.max_concurrent_operations
    }

    fn has_capacity(&self, running: usize) -> bool {
        self.inner
            .max_concurrent_operations
            .is_none_or(|limit| running < limit)
    }

    /// Returns `true` if both handles refer to the same queue.
    pub fn same_queue(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Submits `task` and returns its completion.
    ///
    /// The task runs once all of its dependencies have finished; if it has
    /// none it becomes ready immediately.
    pub fn submit(&self, task: Task) -> Completion {
        let Task {
            job,
            completion,
            dependencies,
        } = task;
        tracing::trace!(
            queue = %self.inner.name,
            task = %completion.task_id(),
            dependencies = dependencies.len(),
            "task submitted"
        );

        let pending = Arc::new(PendingTask {
            remaining: AtomicUsize::new(dependencies.len() + 1),
            ready: Mutex::new(Some(ReadyTask {
                job,
                completion: completion.clone(),
            })),
            queue: self.clone(),
        });
        for dependency in &dependencies {
            if !dependency.register(&pending) {
                pending.release();
            }
        }
        pending.release();
        completion
    }

    fn enqueue(&self, task: ReadyTask) {
        let mut state = self.inner.state.lock();
        if self.has_capacity(state.running) {
            state.running += 1;
            drop(state);
            self.dispatch(task);
        } else {
            state.ready.push_back(task);
        }
    }

    /// Starts a worker for `task`. The caller has already counted it as running.
    fn dispatch(&self, task: ReadyTask) {
        tracing::trace!(queue = %self.inner.name, task = %task.completion.task_id(), "task dispatched");
        let queue = self.clone();
        runtime::spawn_worker(move || queue.drain(task));
    }

    /// Runs `wait` with the calling task's slot handed back to the queue.
    ///
    /// Must be called from a task running on this queue. Ready tasks may
    /// start while `wait` blocks; afterwards the slot is taken back even if
    /// that briefly puts the queue over its limit.
    pub(crate) fn suspended<R>(&self, wait: impl FnOnce() -> R) -> R {
        let mut state = self.inner.state.lock();
        let next = if self.has_capacity(state.running - 1) {
            state.ready.pop_front()
        } else {
            None
        };
        if next.is_none() {
            state.running -= 1;
        }
        drop(state);
        if let Some(task) = next {
            self.dispatch(task);
        }

        let result = wait();
        self.inner.state.lock().running += 1;
        result
    }

    /// Runs `first`, then keeps taking ready tasks until none are left or
    /// the queue is over its limit.
    fn drain(&self, first: ReadyTask) {
        let mut next = Some(first);
        while let Some(task) = next {
            task.run();
            let mut state = self.inner.state.lock();
            next = if self.has_capacity(state.running - 1) {
                state.ready.pop_front()
            } else {
                None
            };
            if next.is_none() {
                state.running -= 1;
            }
        }
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WorkQueue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("WorkQueue")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field(
                "max_concurrent_operations",
                &self.inner.max_concurrent_operations,
            )
            .finish()
    }
}
