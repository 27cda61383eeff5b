#![allow(dead_code)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```ignore
//! mod common;
//! use common::*;
//! ```

use std::sync::mpsc;
use std::sync::{Arc, Mutex, Once};
use std::thread::JoinHandle;

use settle::{Executor, Task};

static INIT_LOGGING: Once = Once::new();

/// Initializes tracing output for tests once per process. Honors
/// `RUST_LOG`; silent by default.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A small channel-fed worker pool implementing the [`Executor`] contract,
/// standing in for whatever pool a real embedder injects.
pub struct TestPool {
    sender: Option<Mutex<mpsc::Sender<Task>>>,
    workers: Vec<JoinHandle<()>>,
}

impl TestPool {
    /// Starts `threads` workers draining a shared queue.
    pub fn new(threads: usize) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel::<Task>();
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = (0..threads)
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                std::thread::spawn(move || loop {
                    let work = {
                        let receiver = receiver.lock().expect("pool receiver poisoned");
                        receiver.recv()
                    };
                    match work {
                        Ok(work) => work(),
                        Err(_) => break,
                    }
                })
            })
            .collect();
        Arc::new(Self {
            sender: Some(Mutex::new(sender)),
            workers,
        })
    }
}

impl Executor for TestPool {
    fn submit(&self, work: Task) {
        self.sender
            .as_ref()
            .expect("pool already shut down")
            .lock()
            .expect("pool sender poisoned")
            .send(work)
            .expect("pool workers gone");
    }
}

impl Drop for TestPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
