//! Continuation dispatch: launch policies, the executor contract, and the
//! adapters that unify callable shapes.
//!
//! Every `then` variant funnels into the same protocol: snapshot the
//! upstream outcome, apply an adapter for the callable's shape, settle the
//! downstream promise with whatever comes out. The adapter is chosen by
//! method name on [`Future`](crate::Future) — value-taking, outcome-taking,
//! zero-argument, or nested-future — and panics in user code are caught
//! here and converted into [`Failure`] outcomes, never unwound through the
//! cell machinery.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Failure;
use crate::future::Future;
use crate::launch;
use crate::outcome::Outcome;
use crate::promise::Promise;

/// Dispatch mode for a continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Launch {
    /// Run on a freshly spawned detached worker thread.
    #[default]
    Async,
    /// Run inline on whichever thread settles the upstream cell (or on the
    /// registering thread when the cell is already settled).
    Sync,
    /// Like `Async`, plus a secondary reaper worker that awaits the
    /// invocation with a bounded ceiling and discards its outcome. This is
    /// the fire-and-forget sink behind [`Future::finally`].
    Callback,
}

/// A unit of work accepted by an [`Executor`].
pub type Task = Box<dyn FnOnce() + Send>;

/// An externally supplied work scheduler.
///
/// The contract is minimal: accept a zero-argument unit of work and run it
/// at some later time. There is no return value and no failure channel —
/// work units generated by this crate catch everything themselves and route
/// failures into the downstream cell.
pub trait Executor: Send + Sync {
    /// Schedules `work` for later execution.
    fn submit(&self, work: Task);
}

/// Ceiling for the `Callback` reaper's wait. Long enough that correct
/// programs never hit it; a leak guard, not a semantic guarantee.
pub(crate) const CALLBACK_REAP_TIMEOUT: Duration = Duration::from_secs(60 * 60);

const MISSING_OUTCOME: &str = "upstream outcome was already consumed";

/// Runs `work` according to `(policy, executor)`. A supplied executor
/// always wins over the policy.
pub(crate) fn schedule(policy: Launch, executor: Option<Arc<dyn Executor>>, work: Task) {
    if let Some(executor) = executor {
        executor.submit(work);
        return;
    }
    match policy {
        Launch::Sync => work(),
        Launch::Callback => {
            let invocation = launch::spawn(work);
            launch::spawn_detached(move || {
                let _ = invocation.wait_for(CALLBACK_REAP_TIMEOUT);
                let _ = invocation.get();
            });
        }
        Launch::Async => launch::spawn_detached(work),
    }
}

/// Settles `downstream` with the result of `f`, converting a panic into a
/// captured failure.
pub(crate) fn settle_with<U, F>(downstream: &Promise<U>, f: F)
where
    F: FnOnce() -> U,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => downstream.set_value(value),
        Err(payload) => downstream.set_failure(Failure::from_panic(&*payload)),
    }
}

/// Adapter for value-taking callables: an upstream failure propagates
/// downstream without invoking `f`.
pub(crate) fn on_value<T, U, F>(f: F) -> impl FnOnce(Outcome<T>, Promise<U>) + Send
where
    F: FnOnce(T) -> U + Send + 'static,
{
    move |outcome, downstream| match outcome {
        Outcome::Value(value) => settle_with(&downstream, move || f(value)),
        Outcome::Failure(failure) => downstream.set_failure(failure),
        Outcome::Empty => downstream.set_failure(Failure::new(MISSING_OUTCOME)),
    }
}

/// Adapter for outcome-taking callables: always invoked, may absorb the
/// upstream failure.
pub(crate) fn on_outcome<T, U, F>(f: F) -> impl FnOnce(Outcome<T>, Promise<U>) + Send
where
    F: FnOnce(Outcome<T>) -> U + Send + 'static,
{
    move |outcome, downstream| settle_with(&downstream, move || f(outcome))
}

/// Adapter for zero-argument callables: always invoked, upstream outcome
/// ignored entirely.
pub(crate) fn on_unit<T, U, F>(f: F) -> impl FnOnce(Outcome<T>, Promise<U>) + Send
where
    F: FnOnce() -> U + Send + 'static,
{
    move |_outcome, downstream| settle_with(&downstream, f)
}

/// Adapter for callables returning a nested future: the returned handle is
/// flattened into the downstream cell (single level).
pub(crate) fn on_future<T, U, F>(f: F) -> impl FnOnce(Outcome<T>, Promise<U>) + Send
where
    F: FnOnce(T) -> Future<U> + Send + 'static,
    U: Clone + Send + 'static,
{
    move |outcome, downstream| match outcome {
        Outcome::Value(value) => match panic::catch_unwind(AssertUnwindSafe(move || f(value))) {
            Ok(inner) => inner.subscribe(move |outcome| downstream.set_outcome(outcome)),
            Err(payload) => downstream.set_failure(Failure::from_panic(&*payload)),
        },
        Outcome::Failure(failure) => downstream.set_failure(failure),
        Outcome::Empty => downstream.set_failure(Failure::new(MISSING_OUTCOME)),
    }
}
