//! Error types for the settlement primitives.
//!
//! Two layers of failure exist and they travel on different channels:
//!
//! - [`Failure`] is a *captured* failure produced by user code (a panic in a
//!   continuation, an explicit [`Promise::set_failure`]). It rides the
//!   outcome channel: it is stored in a cell, forwarded along `then` chains,
//!   and re-raised from [`Future::get`] at the end.
//! - [`Error`] is raised *locally* by the operation you just called — a
//!   timed-out handle, a double retrieval, a detached handle. Local errors
//!   are never routed into the outcome channel.
//!
//! [`Promise::set_failure`]: crate::Promise::set_failure
//! [`Future::get`]: crate::Future::get

use core::fmt;
use std::sync::Arc;

/// A `Result` alias defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error raised directly by an operation on a promise or future.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A timed wait expired and poisoned the handle.
    #[error("future timed out")]
    Timeout,
    /// The value was already moved out by a previous `get`.
    #[error("future already retrieved")]
    AlreadyRetrieved,
    /// An outcome was read before any settlement.
    #[error("outcome is not initialized")]
    NotInitialized,
    /// The handle is not attached to a cell.
    #[error("future has no associated state")]
    NoState,
    /// The upstream computation failed; carries the captured failure.
    #[error(transparent)]
    Failed(#[from] Failure),
}

impl Error {
    /// Returns true for the timeout kind.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns the captured failure, if this error carries one.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// An opaque captured failure, suitable for storing and re-raising later.
///
/// This is the payload of [`Outcome::Failure`](crate::Outcome::Failure).
/// Cloning is cheap: the source error, when present, is shared behind an
/// `Arc`.
#[derive(Debug, Clone)]
pub struct Failure {
    message: String,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Failure {
    /// Creates a failure from a plain message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Captures an error value, keeping it reachable through `source()`.
    #[must_use]
    pub fn from_error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }

    /// Captures a panic payload from `catch_unwind`.
    ///
    /// String-ish payloads keep their message; anything else is recorded as
    /// a panic of unknown type.
    #[must_use]
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&'static str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic of unknown type".to_owned());
        Self {
            message: format!("panic: {message}"),
            source: None,
        }
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}
