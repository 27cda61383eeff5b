//! The shared settlement cell.
//!
//! One [`SharedState`] sits between a producer, a consumer, and any number
//! of continuations. A single mutex guards the status, the outcome, and the
//! FIFO continuation list; a condvar wakes blocked waiters on settlement.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      CELL LIFECYCLE                          │
//! │                                                              │
//! │            settle()                 get()                    │
//! │  Pending ───────────────► Done ──────────────► Retrieved     │
//! │     │                                                        │
//! │     │ wait_for() expiry                                      │
//! │     ▼                                                        │
//! │  TimedOut   (later settlements are silent no-ops)            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Continuations registered while `Pending` are drained in registration
//! order when the cell settles; continuations registered after settlement
//! run immediately on the registering thread. The drain loop runs outside
//! the lock, so a continuation may attach further continuations to any
//! cell, including the one it runs from.

use std::mem;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::{Error, Failure, Result};
use crate::outcome::Outcome;

/// Lifecycle status of a settlement cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Not yet settled.
    Pending,
    /// Settled; the value has not been retrieved.
    Done,
    /// Settled and the value has been moved out by `get`.
    Retrieved,
    /// A timed wait expired and poisoned the cell.
    TimedOut,
}

/// A deferred unit of work registered against a cell.
pub(crate) type Thunk = Box<dyn FnOnce() + Send>;

/// The synchronization cell co-owned by a promise, a future, and any
/// pending continuation closures.
pub(crate) struct SharedState<T> {
    inner: Mutex<Inner<T>>,
    settled: Condvar,
}

struct Inner<T> {
    status: Status,
    outcome: Outcome<T>,
    continuations: Vec<Thunk>,
    future_taken: bool,
}

impl<T> SharedState<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                status: Status::Pending,
                outcome: Outcome::Empty,
                continuations: Vec::new(),
                future_taken: false,
            }),
            settled: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().expect("settlement cell mutex poisoned")
    }

    pub(crate) fn status(&self) -> Status {
        self.lock().status
    }

    /// Marks the cell's consumer handle as handed out. Returns true for the
    /// first caller only.
    pub(crate) fn take_future(&self) -> bool {
        let mut inner = self.lock();
        !mem::replace(&mut inner.future_taken, true)
    }

    /// Writes the outcome exactly once. Settling an already settled or
    /// poisoned cell is a silent no-op. Pending continuations are drained
    /// in FIFO order, outside the lock.
    pub(crate) fn settle(&self, outcome: Outcome<T>) {
        let pending = {
            let mut inner = self.lock();
            if inner.status != Status::Pending {
                tracing::trace!(status = ?inner.status, "settlement ignored");
                return;
            }
            inner.outcome = outcome;
            inner.status = Status::Done;
            self.settled.notify_all();
            mem::take(&mut inner.continuations)
        };
        for thunk in pending {
            thunk();
        }
    }

    /// Blocks until the cell is settled (or poisoned by another waiter).
    pub(crate) fn wait(&self) {
        let inner = self.lock();
        let _inner = self
            .settled
            .wait_while(inner, |inner| inner.status == Status::Pending)
            .expect("settlement cell mutex poisoned");
    }

    /// Blocks until settlement or expiry of `timeout`. On expiry the cell
    /// is poisoned: its status flips to [`Status::TimedOut`] and later
    /// settlements are ignored.
    pub(crate) fn wait_for(&self, timeout: Duration) -> Status {
        let inner = self.lock();
        let (mut inner, result) = self
            .settled
            .wait_timeout_while(inner, timeout, |inner| inner.status == Status::Pending)
            .expect("settlement cell mutex poisoned");
        if result.timed_out() {
            inner.status = Status::TimedOut;
            tracing::trace!("timed wait expired; cell poisoned");
        }
        inner.status
    }

    /// Blocks until settlement or the absolute `deadline`.
    pub(crate) fn wait_until(&self, deadline: Instant) -> Status {
        self.wait_for(deadline.saturating_duration_since(Instant::now()))
    }

    /// Blocks until settled, then moves the value out.
    ///
    /// A `Value` outcome leaves `Empty` behind and flips the status to
    /// [`Status::Retrieved`]; a `Failure` outcome is cloned and left in
    /// place so late continuations still observe it.
    pub(crate) fn retrieve(&self) -> Result<T> {
        let mut inner = self.lock();
        loop {
            match inner.status {
                Status::Pending => {
                    inner = self
                        .settled
                        .wait(inner)
                        .expect("settlement cell mutex poisoned");
                }
                Status::Done => {
                    inner.status = Status::Retrieved;
                    return match inner.outcome {
                        Outcome::Failure(ref failure) => Err(Error::Failed(failure.clone())),
                        _ => match mem::take(&mut inner.outcome) {
                            Outcome::Value(value) => Ok(value),
                            _ => Err(Error::NotInitialized),
                        },
                    };
                }
                Status::TimedOut => return Err(Error::Timeout),
                Status::Retrieved => return Err(Error::AlreadyRetrieved),
            }
        }
    }

    /// Registers a raw thunk: appended while `Pending`, run immediately
    /// (after releasing the lock) when already `Done`.
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] on a poisoned cell, [`Error::AlreadyRetrieved`]
    /// on a consumed one; in both cases the thunk is dropped unrun.
    pub(crate) fn attach(&self, thunk: Thunk) -> Result<()> {
        let mut inner = self.lock();
        match inner.status {
            Status::Pending => {
                inner.continuations.push(thunk);
                Ok(())
            }
            Status::Done => {
                drop(inner);
                thunk();
                Ok(())
            }
            Status::TimedOut => Err(Error::Timeout),
            Status::Retrieved => Err(Error::AlreadyRetrieved),
        }
    }

    /// Clones the current outcome for continuation dispatch.
    pub(crate) fn snapshot(&self) -> Outcome<T>
    where
        T: Clone,
    {
        self.lock().outcome.clone()
    }

    /// Registers an outcome observer that is always invoked: on settlement
    /// for a pending cell, immediately for a settled one, and with a
    /// synthesized failure for a spent or poisoned cell.
    pub(crate) fn subscribe<F>(state: &Arc<Self>, callback: F)
    where
        T: Clone + Send + 'static,
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        let refusal = {
            let mut inner = state.lock();
            match inner.status {
                Status::Pending => {
                    let cell = Arc::clone(state);
                    inner
                        .continuations
                        .push(Box::new(move || callback(cell.snapshot())));
                    return;
                }
                Status::Done => None,
                Status::TimedOut => Some(Error::Timeout),
                Status::Retrieved => Some(Error::AlreadyRetrieved),
            }
        };
        match refusal {
            None => callback(state.snapshot()),
            Some(err) => callback(Outcome::Failure(Failure::from_error(err))),
        }
    }
}
