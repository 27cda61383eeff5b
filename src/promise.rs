//! The write end of a settlement cell.

use std::sync::Arc;

use crate::error::Failure;
use crate::future::Future;
use crate::outcome::Outcome;
use crate::state::{SharedState, Status};

/// The producer side of a future: settles its cell exactly once.
///
/// A promise is not clonable; it is the single write end of its cell.
/// Settlement is one-shot — the second and any later `set_value` /
/// `set_failure` calls are silently ignored, only the first wins.
///
/// # Example
///
/// ```
/// let promise = settle::Promise::new();
/// let future = promise.future();
///
/// promise.set_value(42);
/// promise.set_value(7); // ignored
///
/// assert_eq!(future.get().unwrap(), 42);
/// ```
pub struct Promise<T> {
    state: Arc<SharedState<T>>,
}

impl<T> Promise<T> {
    /// Creates a promise over a fresh pending cell.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(SharedState::new()),
        }
    }

    /// Settles the cell with a value. No-op if the cell is already settled
    /// or poisoned.
    pub fn set_value(&self, value: T) {
        self.state.settle(Outcome::Value(value));
    }

    /// Settles the cell with a captured failure. Same one-shot rule as
    /// [`set_value`](Self::set_value).
    pub fn set_failure(&self, failure: impl Into<Failure>) {
        self.state.settle(Outcome::Failure(failure.into()));
    }

    /// Settles the cell with an already-formed outcome.
    pub(crate) fn set_outcome(&self, outcome: Outcome<T>) {
        self.state.settle(outcome);
    }

    /// Returns true once the cell has been settled or poisoned.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.status() != Status::Pending
    }

    /// Hands out the consumer handle for this cell.
    ///
    /// There is exactly one valid handle per cell: the first call returns
    /// it, and any later call returns a detached handle whose
    /// [`valid`](Future::valid) reports false.
    #[must_use]
    pub fn future(&self) -> Future<T> {
        if self.state.take_future() {
            Future::attached(Arc::clone(&self.state))
        } else {
            tracing::debug!("consumer handle already taken; returning detached future");
            Future::detached()
        }
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise")
            .field("ready", &self.is_ready())
            .finish()
    }
}
