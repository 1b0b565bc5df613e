//! # typed-operation
//!
//! Typed asynchronous operations that compose without callbacks, locks or
//! manual thread management.
//!
//! ## Overview
//!
//! - **[`Try`](control::Try)**: the synchronous outcome of a computation,
//!   `Succeeded(value)` or `Failed(error)`, with `map`, `flat_map`, `handle`,
//!   `rescue` and observers.
//! - **[`Operation`](effect::Operation)**: a computation submitted to a work
//!   queue. Combinators build new operations that depend on the ones they
//!   derive from, so a downstream step never runs before its inputs exist.
//! - **[`CallbackAdapter`](effect::CallbackAdapter)**: wraps callback-based
//!   asynchronous APIs as operations.
//!
//! ## Feature Flags
//!
//! - `control`: `Try`, `Tuple2`, `Tuple3`
//! - `effect`: operations, queues and the callback adapter
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use typed_operation::prelude::*;
//!
//! let total = Operation::constant(10)
//!     .flat_map(|n| Operation::constant(n * 10))
//!     .map(|n| n + 1);
//! assert_eq!(total.await_result().unwrap(), 101);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// ```rust
/// use typed_operation::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::OperationError;

    #[cfg(feature = "control")]
    pub use crate::control::*;

    #[cfg(feature = "effect")]
    pub use crate::effect::{
        AdapterConfig, Callback, CallbackAdapter, Operation, QueueConfig, WaitTimeout, WorkQueue,
    };
}

mod error;

pub use error::{BoxError, OperationError};

#[cfg(feature = "control")]
pub mod control;

#[cfg(feature = "effect")]
pub mod effect;
