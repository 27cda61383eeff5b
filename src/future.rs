//! The read end of a settlement cell: waiting, retrieval, and chaining.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::dispatch::{self, Executor, Launch, Task};
use crate::error::{Error, Failure, Result};
use crate::outcome::Outcome;
use crate::promise::Promise;
use crate::state::{SharedState, Status};

/// The consumer side of a promise.
///
/// A future is the single read end of its cell: it can block for the result
/// ([`get`](Self::get), [`wait`](Self::wait)), or register continuations
/// that run when the producer settles (the `then` family). Continuations
/// return fresh futures, so dependent computations chain:
///
/// ```
/// let promise = settle::Promise::new();
/// let doubled = promise.future().then(|x: i32| x * 2).unwrap();
///
/// promise.set_value(21);
/// assert_eq!(doubled.get().unwrap(), 42);
/// ```
///
/// A future is not clonable. A default-constructed future is detached
/// (`valid()` is false) and every operation on it reports
/// [`Error::NoState`].
pub struct Future<T> {
    state: Option<Arc<SharedState<T>>>,
}

impl<T> Future<T> {
    pub(crate) fn attached(state: Arc<SharedState<T>>) -> Self {
        Self { state: Some(state) }
    }

    pub(crate) fn detached() -> Self {
        Self { state: None }
    }

    /// Returns true while a cell is attached to this handle.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.state.is_some()
    }

    fn cell(&self) -> Result<&Arc<SharedState<T>>> {
        self.state.as_ref().ok_or(Error::NoState)
    }

    /// Blocks until the producer settles, then consumes the result.
    ///
    /// The first call on a settled cell moves the value out and flips the
    /// cell to [`Status::Retrieved`]. A captured failure is re-raised as
    /// [`Error::Failed`].
    ///
    /// # Errors
    ///
    /// [`Error::Failed`] for a failed computation, [`Error::Timeout`] for a
    /// poisoned cell, [`Error::AlreadyRetrieved`] for a second retrieval,
    /// [`Error::NoState`] for a detached handle.
    pub fn get(&self) -> Result<T> {
        self.cell()?.retrieve()
    }

    /// Blocks until the cell is settled. No timeout.
    pub fn wait(&self) -> Result<()> {
        self.cell()?.wait();
        Ok(())
    }

    /// Blocks until settlement or expiry of `timeout`.
    ///
    /// On expiry the cell is poisoned: the returned status is
    /// [`Status::TimedOut`] and subsequent `get` or `then` calls on this
    /// handle report [`Error::Timeout`]. Poisoning is local — upstream work
    /// already in flight keeps running, and its eventual settlement is
    /// silently discarded.
    pub fn wait_for(&self, timeout: Duration) -> Result<Status> {
        Ok(self.cell()?.wait_for(timeout))
    }

    /// Blocks until settlement or the absolute `deadline`; otherwise as
    /// [`wait_for`](Self::wait_for).
    pub fn wait_until(&self, deadline: Instant) -> Result<Status> {
        Ok(self.cell()?.wait_until(deadline))
    }
}

impl<T: Clone + Send + 'static> Future<T> {
    /// Chains a value-taking continuation with the default
    /// [`Launch::Async`] policy.
    ///
    /// `f` receives the unwrapped value. If the upstream settles with a
    /// failure, `f` is never invoked and the failure propagates to the
    /// returned future unchanged; use [`then_outcome`](Self::then_outcome)
    /// to observe failures.
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] / [`Error::AlreadyRetrieved`] when the upstream
    /// handle is poisoned or spent; the continuation is not registered.
    pub fn then<U, F>(&self, f: F) -> Result<Future<U>>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.then_with(Launch::Async, f)
    }

    /// Chains a value-taking continuation under an explicit launch policy.
    pub fn then_with<U, F>(&self, policy: Launch, f: F) -> Result<Future<U>>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.then_impl(policy, None, dispatch::on_value(f))
    }

    /// Chains a value-taking continuation onto an executor.
    ///
    /// The executor handle is owned: it may be stored until the upstream
    /// settles.
    pub fn then_on<U, F>(&self, executor: Arc<dyn Executor>, f: F) -> Result<Future<U>>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.then_impl(Launch::Async, Some(executor), dispatch::on_value(f))
    }

    /// Chains an outcome-taking continuation: `f` always runs and observes
    /// the upstream [`Outcome`], so it can absorb failures.
    pub fn then_outcome<U, F>(&self, f: F) -> Result<Future<U>>
    where
        U: Send + 'static,
        F: FnOnce(Outcome<T>) -> U + Send + 'static,
    {
        self.then_outcome_with(Launch::Async, f)
    }

    /// Outcome-taking continuation under an explicit launch policy.
    pub fn then_outcome_with<U, F>(&self, policy: Launch, f: F) -> Result<Future<U>>
    where
        U: Send + 'static,
        F: FnOnce(Outcome<T>) -> U + Send + 'static,
    {
        self.then_impl(policy, None, dispatch::on_outcome(f))
    }

    /// Outcome-taking continuation onto an executor.
    pub fn then_outcome_on<U, F>(&self, executor: Arc<dyn Executor>, f: F) -> Result<Future<U>>
    where
        U: Send + 'static,
        F: FnOnce(Outcome<T>) -> U + Send + 'static,
    {
        self.then_impl(Launch::Async, Some(executor), dispatch::on_outcome(f))
    }

    /// Chains a zero-argument continuation: `f` runs after settlement with
    /// no access to the upstream outcome, which is dropped.
    pub fn then_run<U, F>(&self, f: F) -> Result<Future<U>>
    where
        U: Send + 'static,
        F: FnOnce() -> U + Send + 'static,
    {
        self.then_run_with(Launch::Async, f)
    }

    /// Zero-argument continuation under an explicit launch policy.
    pub fn then_run_with<U, F>(&self, policy: Launch, f: F) -> Result<Future<U>>
    where
        U: Send + 'static,
        F: FnOnce() -> U + Send + 'static,
    {
        self.then_impl(policy, None, dispatch::on_unit(f))
    }

    /// Chains a continuation returning a nested future; the inner handle is
    /// flattened into the returned future (single level).
    ///
    /// Upstream failures propagate without invoking `f`, as with
    /// [`then`](Self::then).
    pub fn then_future<U, F>(&self, f: F) -> Result<Future<U>>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Future<U> + Send + 'static,
    {
        self.then_future_with(Launch::Async, f)
    }

    /// Nested-future continuation under an explicit launch policy.
    pub fn then_future_with<U, F>(&self, policy: Launch, f: F) -> Result<Future<U>>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Future<U> + Send + 'static,
    {
        self.then_impl(policy, None, dispatch::on_future(f))
    }

    /// Registers a fire-and-forget callback that runs once the cell
    /// settles, observing the outcome.
    ///
    /// Equivalent to an outcome-taking continuation under
    /// [`Launch::Callback`]: the invocation runs on a detached worker and a
    /// secondary reaper consumes the discarded downstream handle.
    pub fn finally<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        self.then_outcome_with(Launch::Callback, f).map(|_| ())
    }

    /// Registers an always-invoked outcome observer, consuming the handle.
    ///
    /// Unlike the `then` family this never refuses: a detached, poisoned,
    /// or spent handle delivers a synthesized failure outcome instead.
    pub(crate) fn subscribe<F>(self, callback: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        match self.state {
            Some(state) => SharedState::subscribe(&state, callback),
            None => callback(Outcome::Failure(Failure::from_error(Error::NoState))),
        }
    }

    /// The shared `then` protocol: build the downstream pair, then register
    /// a thunk that snapshots the upstream outcome and schedules the
    /// dispatcher per `(policy, executor)`. An already-settled upstream
    /// runs the thunk immediately on this thread.
    fn then_impl<U, D>(
        &self,
        policy: Launch,
        executor: Option<Arc<dyn Executor>>,
        dispatcher: D,
    ) -> Result<Future<U>>
    where
        U: Send + 'static,
        D: FnOnce(Outcome<T>, Promise<U>) + Send + 'static,
    {
        let state = self.cell()?;
        let downstream = Promise::new();
        let next = downstream.future();
        let upstream = Arc::clone(state);
        let work: Task = Box::new(move || dispatcher(upstream.snapshot(), downstream));
        state.attach(Box::new(move || dispatch::schedule(policy, executor, work)))?;
        Ok(next)
    }
}

impl<T> Default for Future<T> {
    /// A detached handle; `valid()` reports false.
    fn default() -> Self {
        Self::detached()
    }
}

impl<T> std::fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Future")
            .field("valid", &self.valid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[test]
    fn default_future_is_detached() {
        let future: Future<i32> = Future::default();
        assert!(!future.valid());
        assert!(matches!(future.get(), Err(Error::NoState)));
        assert!(matches!(future.wait(), Err(Error::NoState)));
        assert!(matches!(
            future.wait_for(Duration::from_millis(1)),
            Err(Error::NoState)
        ));
        assert!(matches!(future.then(|x: i32| x), Err(Error::NoState)));
    }

    #[test]
    fn chain_on_pre_settled_producer() {
        let promise = Promise::new();
        let future = promise.future();
        let chained = future
            .then(|x: i32| x + 2)
            .unwrap()
            .then(|y| y + 2)
            .unwrap()
            .then(|z| z + 2)
            .unwrap();
        promise.set_value(2);
        assert_eq!(chained.get().unwrap(), 8);
    }

    #[test]
    fn sync_policy_runs_on_settling_thread() {
        let future = crate::launch::ready(std::thread::current().id());
        let inline = future
            .then_with(Launch::Sync, |id| id == std::thread::current().id())
            .unwrap();
        assert!(inline.get().unwrap());
    }

    #[test]
    fn pre_settlement_registrations_run_in_fifo_order() {
        let promise = Promise::new();
        let future = promise.future();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut tails = Vec::new();
        for tag in 0..3 {
            let order = Arc::clone(&order);
            tails.push(
                future
                    .then_with(Launch::Sync, move |_: i32| {
                        order.lock().unwrap().push(tag);
                    })
                    .unwrap(),
            );
        }
        promise.set_value(0);
        for tail in &tails {
            tail.wait().unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn get_twice_reports_already_retrieved() {
        let future = crate::launch::ready(9);
        assert_eq!(future.get().unwrap(), 9);
        assert!(matches!(future.get(), Err(Error::AlreadyRetrieved)));
    }

    #[test]
    fn then_after_get_is_refused() {
        let future = crate::launch::ready(9);
        let _ = future.get();
        assert!(matches!(
            future.then(|x: i32| x),
            Err(Error::AlreadyRetrieved)
        ));
    }

    #[test]
    fn then_run_ignores_upstream_failure() {
        let upstream: Future<i32> = crate::launch::failed(Failure::new("boom"));
        let chained = upstream.then_run_with(Launch::Sync, || 5).unwrap();
        assert_eq!(chained.get().unwrap(), 5);
    }

    #[test]
    fn then_future_flattens() {
        let chained = crate::launch::ready(3)
            .then_future(|x| crate::launch::ready(x * 10))
            .unwrap();
        assert_eq!(chained.get().unwrap(), 30);
    }

    #[test]
    fn outcome_stage_observes_value() {
        let promise = Promise::new();
        let future = promise.future();
        let observed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&observed);
        let probe = future
            .then_outcome_with(Launch::Sync, move |outcome: Outcome<i32>| {
                flag.store(outcome.has_value(), Ordering::SeqCst);
            })
            .unwrap();
        promise.set_value(1);
        probe.wait().unwrap();
        assert!(observed.load(Ordering::SeqCst));
    }

    #[test]
    fn wait_for_reports_done_on_settled_cell() {
        let future = crate::launch::ready(1);
        assert_eq!(
            future.wait_for(Duration::from_millis(1)).unwrap(),
            Status::Done
        );
    }

    #[test]
    fn debug_shows_validity() {
        let future: Future<i32> = Future::default();
        assert_eq!(format!("{future:?}"), "Future { valid: false }");
    }
}
