//! Settle: composable thread-backed promises.
//!
//! # Overview
//!
//! Settle is a synchronization primitive, not a runtime: a [`Promise`]
//! settles a shared cell exactly once, a [`Future`] retrieves the result or
//! chains continuations onto it, and aggregation combinators fan many cells
//! into one. Continuations run on a freshly spawned worker, inline on the
//! settling thread, or on an injected [`Executor`] — the enclosing program
//! decides how many OS threads exist.
//!
//! # Core Guarantees
//!
//! - **One-shot settlement**: the first `set_value`/`set_failure` wins;
//!   later calls are silently ignored
//! - **FIFO continuations**: continuations registered before settlement run
//!   in registration order; registered after, they run immediately on the
//!   registering thread
//! - **Failure isolation**: panics in user callables are caught and carried
//!   as [`Failure`] outcomes, re-raised at retrieval
//! - **Local poisoning**: a timed wait that expires poisons its own handle
//!   only; in-flight work keeps running and settles into the void
//! - **Ordered aggregation**: [`when_all`] emits outcomes in input index
//!   order regardless of completion order; [`when_any`] emits exactly one
//!   winner
//!
//! # Module Structure
//!
//! - [`outcome`]: the three-valued settlement payload
//! - [`promise`]: the write end
//! - [`future`]: the read end and the `then` chaining family
//! - [`dispatch`]: launch policies, the executor contract, callable adapters
//! - [`launch`]: eager constructors (`spawn`, `ready`, `failed`)
//! - [`aggregate`]: `when_any` / `when_all` combinators
//! - [`error`]: typed errors and captured failures
//!
//! # Example
//!
//! ```
//! use settle::{spawn, Launch};
//!
//! let future = spawn(|| 2)
//!     .then(|x| x + 2)
//!     .unwrap()
//!     .then_with(Launch::Sync, |x| x + 2)
//!     .unwrap();
//!
//! assert_eq!(future.get().unwrap(), 6);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod aggregate;
pub mod dispatch;
pub mod error;
pub mod future;
pub mod launch;
pub mod outcome;
pub mod promise;
mod state;

pub use aggregate::{when_all, when_all1, when_all2, when_all3, when_all4, when_all5, when_any};
pub use dispatch::{Executor, Launch, Task};
pub use error::{Error, Failure, Result};
pub use future::Future;
pub use launch::{failed, ready, spawn, spawn_on};
pub use outcome::Outcome;
pub use promise::Promise;
pub use state::Status;
