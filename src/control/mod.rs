//! Synchronous building blocks.
//!
//! - [`Try`]: the outcome of a computation, a value or an [`OperationError`](crate::OperationError)
//! - [`Tuple2`] / [`Tuple3`]: products carried by joined operations
//!
//! # Examples
//!
//! ```rust
//! use typed_operation::control::Try;
//!
//! let result = Try::succeeded(10)
//!     .map(|n| n * 10)
//!     .flat_map(|n| if n > 50 { Try::succeeded(n) } else { Try::succeeded(0) });
//! assert_eq!(result.get().unwrap(), 100);
//! ```

mod try_result;
mod tuple;

pub use try_result::Try;
pub use tuple::{Tuple2, Tuple3};
