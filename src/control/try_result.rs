//! Try type - the synchronous outcome of a computation.
//!
//! `Try<A>` is either `Succeeded(A)` or `Failed(OperationError)`. It is the
//! value an [`Operation`](crate::effect::Operation) resolves to, and every
//! operation combinator is expressed in terms of the combinators here.
//!
//! All methods are pure and synchronous. A panic inside a transforming
//! function (`map`, `flat_map`, `handle`, `rescue`) is caught and becomes a
//! `Failed` value; the observers `on_success`/`on_failure` run the function
//! as-is.
//!
//! # Examples
//!
//! ```rust
//! use typed_operation::control::Try;
//!
//! let parsed = Try::of(|| "21".parse::<i32>());
//! let doubled = parsed.map(|n| n * 2);
//! assert_eq!(doubled, Try::succeeded(42));
//!
//! let broken = Try::of(|| "x".parse::<i32>()).map(|n| n * 2);
//! assert!(broken.is_failed());
//! assert_eq!(broken.handle(|_| 0).get().unwrap(), 0);
//! ```
//!
//! # Equality
//!
//! Two `Try` values are equal only when both succeeded with equal values.
//! Failures never compare equal, not even to themselves, because errors carry
//! no equality. `Try` therefore implements `PartialEq` but not `Eq`.

use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::OperationError;

/// The outcome of a computation: a value or the error that prevented it.
#[derive(Debug, Clone)]
pub enum Try<A> {
    /// The computation produced a value.
    Succeeded(A),
    /// The computation failed.
    Failed(OperationError),
}

impl<A> Try<A> {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Creates a successful `Try`.
    #[inline]
    pub const fn succeeded(value: A) -> Self {
        Self::Succeeded(value)
    }

    /// Creates a failed `Try`.
    #[inline]
    pub const fn failed(error: OperationError) -> Self {
        Self::Failed(error)
    }

    /// Runs a fallible function immediately and captures its outcome.
    ///
    /// `Ok` becomes `Succeeded`, `Err` becomes `Failed`, and a panic becomes
    /// `Failed(OperationError::Panicked)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use typed_operation::control::Try;
    ///
    /// assert!(Try::of(|| "7".parse::<u8>()).is_succeeded());
    /// assert!(Try::of(|| "700".parse::<u8>()).is_failed());
    /// ```
    pub fn of<F, E>(function: F) -> Self
    where
        F: FnOnce() -> Result<A, E>,
        E: Error + Send + Sync + 'static,
    {
        match catch_unwind(AssertUnwindSafe(function)) {
            Ok(result) => Self::from(result),
            Err(payload) => Self::Failed(OperationError::from_panic(payload)),
        }
    }

    /// Runs an infallible function immediately, turning a panic into a failure.
    pub fn catching<F>(function: F) -> Self
    where
        F: FnOnce() -> A,
    {
        match catch_unwind(AssertUnwindSafe(function)) {
            Ok(value) => Self::Succeeded(value),
            Err(payload) => Self::Failed(OperationError::from_panic(payload)),
        }
    }

    /// Runs a function that already returns a `Try`, turning a panic into a failure.
    pub(crate) fn flatten_catching<F>(function: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        catch_unwind(AssertUnwindSafe(function))
            .unwrap_or_else(|payload| Self::Failed(OperationError::from_panic(payload)))
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Returns `true` if this is `Succeeded`.
    #[inline]
    pub const fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Returns `true` if this is `Failed`.
    #[inline]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the error of a failed `Try`.
    #[inline]
    pub const fn error(&self) -> Option<&OperationError> {
        match self {
            Self::Succeeded(_) => None,
            Self::Failed(error) => Some(error),
        }
    }

    /// Borrows the success value, cloning the (cheap) error on failure.
    pub fn as_ref(&self) -> Try<&A> {
        match self {
            Self::Succeeded(value) => Try::Succeeded(value),
            Self::Failed(error) => Try::Failed(error.clone()),
        }
    }

    // =========================================================================
    // Transformation
    // =========================================================================

    /// Applies `function` to a success value.
    ///
    /// A failure is passed through untouched and `function` is not called.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use typed_operation::control::Try;
    ///
    /// assert_eq!(Try::succeeded(10).map(|n| n * 2), Try::succeeded(20));
    /// ```
    pub fn map<B, F>(self, function: F) -> Try<B>
    where
        F: FnOnce(A) -> B,
    {
        match self {
            Self::Succeeded(value) => Try::catching(move || function(value)),
            Self::Failed(error) => Try::Failed(error),
        }
    }

    /// Applies a function returning a `Try` to a success value.
    ///
    /// A failure is passed through untouched and `function` is not called.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use typed_operation::control::Try;
    ///
    /// let result = Try::succeeded(10).flat_map(|n| Try::succeeded(n * 2));
    /// assert_eq!(result, Try::succeeded(20));
    /// ```
    pub fn flat_map<B, F>(self, function: F) -> Try<B>
    where
        F: FnOnce(A) -> Try<B>,
    {
        match self {
            Self::Succeeded(value) => Try::flatten_catching(move || function(value)),
            Self::Failed(error) => Try::Failed(error),
        }
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    /// Recovers from a failure with a plain value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use typed_operation::{OperationError, control::Try};
    ///
    /// let recovered = Try::<i32>::failed(OperationError::IndeterminateOutcome).handle(|_| 20);
    /// assert_eq!(recovered, Try::succeeded(20));
    /// ```
    pub fn handle<F>(self, function: F) -> Self
    where
        F: FnOnce(OperationError) -> A,
    {
        match self {
            Self::Succeeded(_) => self,
            Self::Failed(error) => Self::catching(move || function(error)),
        }
    }

    /// Recovers from a failure with another `Try`, which may itself fail.
    pub fn rescue<F>(self, function: F) -> Self
    where
        F: FnOnce(OperationError) -> Self,
    {
        match self {
            Self::Succeeded(_) => self,
            Self::Failed(error) => Self::flatten_catching(move || function(error)),
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Calls `function` with the success value, then returns `self` unchanged.
    pub fn on_success<F>(self, function: F) -> Self
    where
        F: FnOnce(&A),
    {
        if let Self::Succeeded(value) = &self {
            function(value);
        }
        self
    }

    /// Calls `function` with the error, then returns `self` unchanged.
    pub fn on_failure<F>(self, function: F) -> Self
    where
        F: FnOnce(&OperationError),
    {
        if let Self::Failed(error) = &self {
            function(error);
        }
        self
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    /// Returns the success value or the error.
    ///
    /// # Errors
    ///
    /// Returns the wrapped [`OperationError`] if this is `Failed`.
    #[inline]
    pub fn get(self) -> Result<A, OperationError> {
        match self {
            Self::Succeeded(value) => Ok(value),
            Self::Failed(error) => Err(error),
        }
    }

    /// Converts into an `Option`, discarding the error.
    #[inline]
    pub fn to_option(self) -> Option<A> {
        match self {
            Self::Succeeded(value) => Some(value),
            Self::Failed(_) => None,
        }
    }
}

impl<A: PartialEq> PartialEq for Try<A> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Succeeded(left), Self::Succeeded(right)) => left == right,
            _ => false,
        }
    }
}

impl<A, E> From<Result<A, E>> for Try<A>
where
    E: Error + Send + Sync + 'static,
{
    fn from(result: Result<A, E>) -> Self {
        match result {
            Ok(value) => Self::Succeeded(value),
            Err(error) => Self::Failed(OperationError::new(error)),
        }
    }
}

impl<A> From<Try<A>> for Result<A, OperationError> {
    #[inline]
    fn from(outcome: Try<A>) -> Self {
        outcome.get()
    }
}

/// Collects successes into `V`, stopping at the first failure.
///
/// # Examples
///
/// ```rust
/// use typed_operation::control::Try;
///
/// let all: Try<Vec<i32>> = vec![Try::succeeded(1), Try::succeeded(2)].into_iter().collect();
/// assert_eq!(all, Try::succeeded(vec![1, 2]));
/// ```
impl<A, V> FromIterator<Try<A>> for Try<V>
where
    V: FromIterator<A>,
{
    fn from_iter<I: IntoIterator<Item = Try<A>>>(iter: I) -> Self {
        match iter.into_iter().map(Try::get).collect::<Result<V, _>>() {
            Ok(values) => Self::Succeeded(values),
            Err(error) => Self::Failed(error),
        }
    }
}

impl<A> From<Try<A>> for Option<A> {
    #[inline]
    fn from(outcome: Try<A>) -> Self {
        outcome.to_option()
    }
}
