//! Bounded-concurrency worker pool (C1).
//!
//! Two fan-out semantics over a list of independent, zero-argument, fallible
//! async tasks:
//!
//! - [`WorkerPool::run_until_first_error`] — fail-fast. The first task to
//!   return `Err` cancels every task that has not yet produced a result;
//!   tasks that were never started are simply never polled.
//! - [`WorkerPool::run_all`] — collect-all. Every task runs to completion
//!   regardless of peer failures; all errors are returned.
//!
//! Concurrency is bounded by a worker count clamped to at least 1. Tasks
//! must be independent: this pool does not serialize access to shared state,
//! so callers writing to shared mutable state need their own synchronization
//! ("Shared resources").

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::errors::CoreError;

type BoxedTask = Pin<Box<dyn Future<Output = Result<(), CoreError>> + Send>>;

/// A bounded-concurrency executor for independent fallible tasks.
#[derive(Clone)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Construct a pool with `workers` concurrent slots, clamped to >= 1
    /// ("Constructs with a worker count N (clamped to >= 1)").
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.workers
    }

    /// Run `tasks` with concurrency <= `self.workers`. Cancels outstanding
    /// tasks and returns immediately on the first error (or on `cancel`
    /// already being triggered). Returns `None` if every task succeeded.
    pub async fn run_until_first_error<I>(
        &self,
        cancel: CancellationToken,
        tasks: I,
    ) -> Option<CoreError>
    where
        I: IntoIterator<Item = BoxedTask>,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut join_set: JoinSet<Result<(), CoreError>> = JoinSet::new();
        let mut pending = tasks.into_iter();
        let mut first_error: Option<CoreError> = None;

        if cancel.is_cancelled() {
            return Some(CoreError::unavailable("context already cancelled"));
        }

        loop {
            // Top up in-flight work up to the semaphore's capacity while
            // there is still budget and no failure has been observed.
            while first_error.is_none() && !cancel.is_cancelled() {
                let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                    break;
                };
                match pending.next() {
                    Some(task) => {
                        let guarded = cancel.clone();
                        join_set.spawn(async move {
                            let result = tokio::select! {
                                _ = guarded.cancelled() => Err(CoreError::unavailable("cancelled")),
                                result = task => result,
                            };
                            drop(permit);
                            result
                        });
                    }
                    None => {
                        drop(permit);
                        break;
                    }
                }
            }

            if join_set.is_empty() {
                break;
            }

            match join_set.join_next().await {
                Some(Ok(Ok(()))) => {}
                Some(Ok(Err(err))) => {
                    first_error = Some(err);
                    cancel.cancel();
                }
                Some(Err(join_err)) => {
                    first_error = Some(CoreError::internal(format!(
                        "worker task panicked: {join_err}"
                    )));
                    cancel.cancel();
                }
                None => break,
            }
        }

        first_error
    }

    /// Run `tasks` with concurrency <= `self.workers`. Every task runs to
    /// completion; all errors are collected and returned in completion
    /// order. A cancelled `cancel` token surfaces as an `Unavailable` error
    /// for every task still pending when cancellation is observed.
    pub async fn run_all<I>(&self, cancel: CancellationToken, tasks: I) -> Vec<CoreError>
    where
        I: IntoIterator<Item = BoxedTask>,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut join_set: JoinSet<Result<(), CoreError>> = JoinSet::new();
        let mut pending = tasks.into_iter();
        let mut errors = Vec::new();

        loop {
            loop {
                let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                    break;
                };
                match pending.next() {
                    Some(task) => {
                        let guarded = cancel.clone();
                        join_set.spawn(async move {
                            let result = tokio::select! {
                                _ = guarded.cancelled() => Err(CoreError::unavailable("cancelled")),
                                result = task => result,
                            };
                            drop(permit);
                            result
                        });
                    }
                    None => {
                        drop(permit);
                        break;
                    }
                }
            }

            if join_set.is_empty() {
                break;
            }

            match join_set.join_next().await {
                Some(Ok(Ok(()))) => {}
                Some(Ok(Err(err))) => errors.push(err),
                Some(Err(join_err)) => {
                    errors.push(CoreError::internal(format!(
                        "worker task panicked: {join_err}"
                    )));
                }
                None => break,
            }
        }

        errors
    }
}

/// Box a fallible async closure's invocation into the shape the pool wants.
pub fn boxed<F>(fut: F) -> BoxedTask
where
    F: Future<Output = Result<(), CoreError>> + Send + 'static,
{
    Box::pin(fut)
}
