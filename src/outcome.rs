//! Three-valued outcome type: the payload of a settled cell.
//!
//! An [`Outcome`] is what a producer writes and what continuations read:
//!
//! - `Empty`: nothing settled yet (never observable through a settled cell)
//! - `Value(T)`: success with a value (`Value(())` for unit work)
//! - `Failure`: a captured failure, re-raised on retrieval
//!
//! Tag transitions inside a cell are one-shot: `Empty` moves to exactly one
//! of `Value` or `Failure` and stays there.

use core::fmt;

use crate::error::{Error, Failure, Result};

/// The outcome of an asynchronous computation.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// No settlement has happened.
    Empty,
    /// The computation produced a value.
    Value(T),
    /// The computation failed; the failure is kept for re-raising.
    Failure(Failure),
}

impl<T> Outcome<T> {
    /// Returns true if this outcome carries a value.
    #[must_use]
    pub const fn has_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Returns true if this outcome carries a captured failure.
    #[must_use]
    pub const fn has_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns true if nothing has been settled.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Consumes the outcome and returns the value.
    ///
    /// # Errors
    ///
    /// [`Error::Failed`] re-raises a captured failure;
    /// [`Error::NotInitialized`] reports an empty outcome.
    pub fn value(self) -> Result<T> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Failure(failure) => Err(Error::Failed(failure)),
            Self::Empty => Err(Error::NotInitialized),
        }
    }

    /// Returns the captured failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns the value or panics.
    ///
    /// # Panics
    ///
    /// Panics if the outcome is not `Value`.
    #[track_caller]
    pub fn unwrap(self) -> T {
        match self {
            Self::Value(value) => value,
            Self::Failure(failure) => {
                panic!("called `Outcome::unwrap()` on a `Failure` value: {failure}")
            }
            Self::Empty => panic!("called `Outcome::unwrap()` on an `Empty` value"),
        }
    }

    /// Returns the value or a default.
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Self::Value(value) => value,
            _ => default,
        }
    }

    /// Maps the value using the provided function.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Value(value) => Outcome::Value(f(value)),
            Self::Failure(failure) => Outcome::Failure(failure),
            Self::Empty => Outcome::Empty,
        }
    }
}

impl<T> Outcome<Outcome<T>> {
    /// Removes one level of nesting. Flattening an already-flat outcome is
    /// the identity, so repeated application is idempotent.
    #[must_use]
    pub fn flatten(self) -> Outcome<T> {
        match self {
            Self::Value(inner) => inner,
            Self::Failure(failure) => Outcome::Failure(failure),
            Self::Empty => Outcome::Empty,
        }
    }
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T> From<std::result::Result<T, Failure>> for Outcome<T> {
    fn from(result: std::result::Result<T, Failure>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(failure) => Self::Failure(failure),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "<empty>"),
            Self::Value(value) => write!(f, "{value}"),
            Self::Failure(failure) => write!(f, "{failure}"),
        }
    }
}
