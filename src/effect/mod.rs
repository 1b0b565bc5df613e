//! Asynchronous operations and the machinery that runs them.
//!
//! - [`Operation`]: a typed computation scheduled on a queue, with
//!   combinators that build dependent operations
//! - [`CallbackAdapter`]: turns callback-style APIs into operations
//! - [`WorkQueue`], [`Task`], [`Completion`]: the executor. Tasks declare
//!   predecessors and run once all of them have finished.
//! - [`WaitHandle`]: one-shot blocking signal
//!
//! # Examples
//!
//! ```rust
//! use typed_operation::effect::Operation;
//!
//! let price = Operation::constant(100);
//! let tax = price.map(|amount| amount / 10);
//! let total = price
//!     .join(&tax)
//!     .map(|pair| pair.0 + pair.1)
//!     .on_success(|total| println!("total: {total}"));
//!
//! assert_eq!(total.await_result().unwrap(), 110);
//! ```
//!
//! # Recovery
//!
//! ```rust
//! use typed_operation::{OperationError, effect::Operation};
//!
//! let recovered = Operation::<i32>::failed(OperationError::IndeterminateOutcome)
//!     .map(|n| n * 2)
//!     .rescue(|_| Operation::constant(10));
//! assert_eq!(recovered.await_result().unwrap(), 10);
//! ```

mod adapter;
mod operation;
mod queue;
pub mod runtime;
mod signal;
mod slot;

pub use adapter::{AdapterConfig, Callback, CallbackAdapter};
pub use operation::Operation;
pub use queue::{Completion, QueueConfig, QueueConfigError, QueueId, Task, TaskId, WorkQueue};
pub use signal::{WaitHandle, WaitTimeout};
