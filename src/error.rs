//! Failure type carried by [`Try`](crate::control::Try) and operations.
//!
//! An `OperationError` is opaque with respect to the user errors it wraps:
//! the combinators never inspect it, they only carry it forward to the next
//! recovery point (`handle`/`rescue`) or to the caller of `await_result`.
//!
//! Cloning is cheap (the wrapped error sits behind an `Arc`), so a single
//! failure can be observed by every dependent of an operation.
//!
//! # Examples
//!
//! ```rust
//! use typed_operation::OperationError;
//! use std::fmt;
//!
//! #[derive(Debug)]
//! struct Timeout;
//!
//! impl fmt::Display for Timeout {
//!     fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         write!(formatter, "timeout")
//!     }
//! }
//!
//! impl std::error::Error for Timeout {}
//!
//! let error = OperationError::new(Timeout);
//! assert!(error.downcast_ref::<Timeout>().is_some());
//! assert_eq!(error.to_string(), "timeout");
//! ```

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Boxed, thread-safe user error.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// The reason an operation or a [`Try`](crate::control::Try) failed.
#[derive(Debug, Clone)]
pub enum OperationError {
    /// An error returned by a user-supplied function.
    Computation(Arc<dyn Error + Send + Sync + 'static>),

    /// A user-supplied function panicked. The payload message is kept when
    /// it is a string.
    Panicked(String),

    /// A callback was invoked with neither a value nor an error.
    IndeterminateOutcome,

    /// A callback was dropped without ever being invoked.
    CallbackDropped,

    /// A callback did not fire within the configured wait bound.
    TimedOut(Duration),

    /// A result slot was read before its operation finished.
    ///
    /// Seeing this means a dependency edge was missing.
    ResultUnavailable,
}

impl OperationError {
    /// Wraps a user error.
    ///
    /// Passing an `OperationError` returns it unchanged instead of nesting it.
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::from_boxed(Box::new(error))
    }

    /// Wraps an already boxed user error.
    pub fn from_boxed(error: BoxError) -> Self {
        match error.downcast::<Self>() {
            Ok(inner) => *inner,
            Err(other) => Self::Computation(Arc::from(other)),
        }
    }

    /// Converts a panic payload captured by `catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&'static str>()
            .map(|message| (*message).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        tracing::debug!(panic = %message, "user function panicked");
        Self::Panicked(message)
    }

    /// Returns the wrapped error as `E` if it is one.
    ///
    /// Asking for `OperationError` itself always succeeds.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Error + 'static,
    {
        if let Some(this) = (self as &dyn Any).downcast_ref::<E>() {
            return Some(this);
        }
        match self {
            Self::Computation(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns `true` if a user function panicked.
    #[inline]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }

    /// Returns `true` if this wraps an error returned by user code.
    #[inline]
    pub const fn is_computation(&self) -> bool {
        matches!(self, Self::Computation(_))
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Computation(error) => write!(formatter, "{error}"),
            Self::Panicked(message) => write!(formatter, "operation panicked: {message}"),
            Self::IndeterminateOutcome => write!(
                formatter,
                "callback completed with neither a value nor an error"
            ),
            Self::CallbackDropped => {
                write!(formatter, "callback was dropped before it was invoked")
            }
            Self::TimedOut(bound) => {
                write!(formatter, "callback did not complete within {bound:?}")
            }
            Self::ResultUnavailable => write!(
                formatter,
                "operation result was read before the operation finished"
            ),
        }
    }
}

impl Error for OperationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Computation(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}
