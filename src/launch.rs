//! Eager constructors: run work now, hand back a future.

use std::thread;

use crate::dispatch::{self, Executor};
use crate::error::Failure;
use crate::future::Future;
use crate::promise::Promise;

/// Runs `f` on a freshly spawned detached worker thread and returns the
/// future for its result.
///
/// A panic in `f` is caught and settles the future with a captured
/// failure.
///
/// ```
/// let future = settle::spawn(|| 40 + 2);
/// assert_eq!(future.get().unwrap(), 42);
/// ```
pub fn spawn<R, F>(f: F) -> Future<R>
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    let producer = Promise::new();
    let future = producer.future();
    spawn_detached(move || dispatch::settle_with(&producer, f));
    future
}

/// Runs `f` on the supplied executor instead of a fresh thread.
pub fn spawn_on<R, F>(executor: &dyn Executor, f: F) -> Future<R>
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    let producer = Promise::new();
    let future = producer.future();
    executor.submit(Box::new(move || dispatch::settle_with(&producer, f)));
    future
}

/// Returns a future that is already settled with `value`.
///
/// For unit work, `ready(())` yields a valid `Future<()>`.
#[must_use]
pub fn ready<T>(value: T) -> Future<T> {
    let producer = Promise::new();
    let future = producer.future();
    producer.set_value(value);
    future
}

/// Returns a future that is already settled with a captured failure.
#[must_use]
pub fn failed<T>(failure: impl Into<Failure>) -> Future<T> {
    let producer = Promise::new();
    let future = producer.future();
    producer.set_failure(failure);
    future
}

/// Spawns a detached worker thread.
pub(crate) fn spawn_detached<F>(work: F)
where
    F: FnOnce() + Send + 'static,
{
    drop(thread::spawn(work));
}
