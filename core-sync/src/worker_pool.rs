//! # Worker Pool
//!
//! A fixed number of workers draining one shared request queue and
//! publishing tagged results to one shared result queue.
//!
//! ## Overview
//!
//! - Both queues are unbounded; [`WorkerPool::submit`] never waits.
//! - A failing or panicking work item becomes a [`WorkResult::Error`]; the
//!   worker that ran it keeps going.
//! - Results arrive in completion order. Nothing pairs a result with the
//!   item that produced it, so callers should only count completions.
//! - Cancelling the pool token stops idle workers at once. A worker busy
//!   with an item finishes it, discards its result and exits; queued items
//!   never start.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut pool: WorkerPool<Vec<Album>, SyncError> = WorkerPool::spawn(6, token.child_token());
//! for artist in &artists {
//!     let catalog = Arc::clone(&catalog);
//!     let id = artist.id.clone();
//!     pool.submit(WorkItem::new(move || async move { fetch(catalog, id).await }))?;
//! }
//! for _ in 0..artists.len() {
//!     match pool.next_result().await { ... }
//! }
//! pool.shutdown().await;
//! ```

use core_async::sync::{mpsc, CancellationToken, Mutex};
use core_async::task::JoinHandle;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Outcome of one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkResult<T, E> {
    Ok(T),
    Error(E),
}

impl<T, E> WorkResult<T, E> {
    pub fn is_ok(&self) -> bool {
        matches!(self, WorkResult::Ok(_))
    }

    pub fn into_result(self) -> std::result::Result<T, E> {
        match self {
            WorkResult::Ok(value) => Ok(value),
            WorkResult::Error(error) => Err(error),
        }
    }
}

impl<T, E> From<std::result::Result<T, E>> for WorkResult<T, E> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => WorkResult::Ok(value),
            Err(error) => WorkResult::Error(error),
        }
    }
}

/// A work item panicked; carries the panic message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("work item panicked: {0}")]
pub struct WorkPanic(pub String);

/// The pool has shut down and accepts no more work.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("worker pool is closed")]
pub struct PoolClosed;

type Job<T, E> = Box<dyn FnOnce() -> BoxFuture<'static, std::result::Result<T, E>> + Send>;

/// Deferred unit of work. Nothing runs until a worker picks it up.
pub struct WorkItem<T, E> {
    job: Job<T, E>,
}

impl<T, E> WorkItem<T, E> {
    pub fn new<F, Fut>(job: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        Self {
            job: Box::new(move || job().boxed()),
        }
    }

    fn start(self) -> BoxFuture<'static, std::result::Result<T, E>> {
        (self.job)()
    }
}

impl<T, E> std::fmt::Debug for WorkItem<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WorkItem { .. }")
    }
}

pub struct WorkerPool<T, E> {
    requests: mpsc::UnboundedSender<WorkItem<T, E>>,
    results: mpsc::UnboundedReceiver<WorkResult<T, E>>,
    token: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

impl<T, E> WorkerPool<T, E>
where
    T: Send + 'static,
    E: From<WorkPanic> + Send + 'static,
{
    /// Starts `worker_count` workers (at least one). Cancelling `token`
    /// stops them.
    pub fn spawn(worker_count: usize, token: CancellationToken) -> Self {
        let (requests, request_rx) = mpsc::unbounded_channel::<WorkItem<T, E>>();
        let (result_tx, results) = mpsc::unbounded_channel();
        let request_rx = Arc::new(Mutex::new(request_rx));

        let workers = (0..worker_count.max(1))
            .map(|worker| {
                core_async::spawn(run_worker(
                    worker,
                    Arc::clone(&request_rx),
                    result_tx.clone(),
                    token.clone(),
                ))
            })
            .collect();

        debug!(workers = worker_count.max(1), "Worker pool started");

        Self {
            requests,
            results,
            token,
            workers,
        }
    }

    /// Queues a work item.
    pub fn submit(&self, item: WorkItem<T, E>) -> std::result::Result<(), PoolClosed> {
        self.requests.send(item).map_err(|_| PoolClosed)
    }

    /// Next result in completion order. `None` once every worker has
    /// stopped and all delivered results were taken.
    pub async fn next_result(&mut self) -> Option<WorkResult<T, E>> {
        self.results.recv().await
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops all workers and waits for them to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        for handle in self.workers.drain(..) {
            if let Err(e) = handle.await {
                warn!("Worker ended abnormally: {}", e);
            }
        }
        debug!("Worker pool stopped");
    }
}

impl<T, E> Drop for WorkerPool<T, E> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_worker<T, E>(
    worker: usize,
    requests: Arc<Mutex<mpsc::UnboundedReceiver<WorkItem<T, E>>>>,
    results: mpsc::UnboundedSender<WorkResult<T, E>>,
    token: CancellationToken,
) where
    T: Send + 'static,
    E: From<WorkPanic> + Send + 'static,
{
    loop {
        let item = {
            let mut queue = requests.lock().await;
            core_async::select! {
                biased;
                _ = token.cancelled() => None,
                item = queue.recv() => item,
            }
        };
        let Some(item) = item else {
            break;
        };

        // A started item always runs to completion; its result is dropped
        // when the pool was cancelled meanwhile.
        let outcome = AssertUnwindSafe(item.start()).catch_unwind().await;
        if token.is_cancelled() {
            break;
        }

        let result = match outcome {
            Ok(result) => WorkResult::from(result),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(worker, %message, "Work item panicked");
                WorkResult::Error(E::from(WorkPanic(message)))
            }
        };

        if results.send(result).is_err() {
            break;
        }
    }

    debug!(worker, "Worker exiting");
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
