//! Fixed-arity products used as the result of joined operations.
//!
//! `Tuple2` and `Tuple3` are plain structs with value equality over every
//! component. They exist so that a joined result has a nameable type with
//! `Display` and accessor methods; converting to and from native tuples is
//! free.
//!
//! # Examples
//!
//! ```rust
//! use typed_operation::control::Tuple2;
//!
//! let pair = Tuple2::new(10, "ten");
//! assert_eq!(*pair.first(), 10);
//! assert_eq!(pair.into_inner(), (10, "ten"));
//! ```

use std::fmt;

/// A pair of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tuple2<T, U>(pub T, pub U);

impl<T, U> Tuple2<T, U> {
    /// Creates a pair.
    #[inline]
    pub const fn new(first: T, second: U) -> Self {
        Self(first, second)
    }

    /// Returns the first component.
    #[inline]
    pub const fn first(&self) -> &T {
        &self.0
    }

    /// Returns the second component.
    #[inline]
    pub const fn second(&self) -> &U {
        &self.1
    }

    /// Converts into a native tuple.
    #[inline]
    pub fn into_inner(self) -> (T, U) {
        (self.0, self.1)
    }
}

impl<T, U> From<(T, U)> for Tuple2<T, U> {
    #[inline]
    fn from((first, second): (T, U)) -> Self {
        Self(first, second)
    }
}

impl<T, U> From<Tuple2<T, U>> for (T, U) {
    #[inline]
    fn from(pair: Tuple2<T, U>) -> Self {
        pair.into_inner()
    }
}

impl<T: fmt::Display, U: fmt::Display> fmt::Display for Tuple2<T, U> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "({}, {})", self.0, self.1)
    }
}

/// A triple of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tuple3<T, U, V>(pub T, pub U, pub V);

impl<T, U, V> Tuple3<T, U, V> {
    /// Creates a triple.
    #[inline]
    pub const fn new(first: T, second: U, third: V) -> Self {
        Self(first, second, third)
    }

    /// Returns the first component.
    #[inline]
    pub const fn first(&self) -> &T {
        &self.0
    }

    /// Returns the second component.
    #[inline]
    pub const fn second(&self) -> &U {
        &self.1
    }

    /// Returns the third component.
    #[inline]
    pub const fn third(&self) -> &V {
        &self.2
    }

    /// Converts into a native tuple.
    #[inline]
    pub fn into_inner(self) -> (T, U, V) {
        (self.0, self.1, self.2)
    }
}

impl<T, U, V> From<(T, U, V)> for Tuple3<T, U, V> {
    #[inline]
    fn from((first, second, third): (T, U, V)) -> Self {
        Self(first, second, third)
    }
}

impl<T, U, V> From<Tuple3<T, U, V>> for (T, U, V) {
    #[inline]
    fn from(triple: Tuple3<T, U, V>) -> Self {
        triple.into_inner()
    }
}

impl<T: fmt::Display, U: fmt::Display, V: fmt::Display> fmt::Display for Tuple3<T, U, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "({}, {}, {})", self.0, self.1, self.2)
    }
}
