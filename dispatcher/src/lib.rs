#![deny(warnings)]
#![deny(
    clippy::all,
    clippy::default_trait_access,
    clippy::expl_impl_clone_on_copy,
    clippy::if_not_else,
    clippy::needless_continue,
    clippy::unseparated_literal_suffix,
    clippy::used_underscore_binding
)]
#![allow(clippy::match_ref_pats)]
#![allow(
    clippy::len_without_is_empty,
    clippy::redundant_field_names,
    clippy::too_many_arguments
)]
#![allow(clippy::new_without_default, clippy::new_ret_no_self)]
#![allow(clippy::mutex_atomic)]

//! A bounded worker pool onto which the traversal engine submits one job per
//! entry node. Jobs are never rejected: with all workers busy, a submission
//! simply queues behind `tokio::sync::Semaphore`'s own FIFO waiter list.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{oneshot, Semaphore};
use tokio_util::sync::CancellationToken;

/// Degree of parallelism for a `WorkDispatcher`.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    pub parallelism: usize,
}

impl Default for DispatcherConfig {
    /// Defaults to the host's CPU count, matching the engine's stated
    /// default of "implementation-defined, e.g. equal to CPU count".
    fn default() -> Self {
        DispatcherConfig {
            parallelism: num_cpus::get(),
        }
    }
}

/// A bounded worker pool. `enqueue` returns a receiver that yields exactly
/// one value (the job's error, if any) when the job completes.
#[derive(Clone)]
pub struct WorkDispatcher {
    semaphore: Arc<Semaphore>,
    executor: task_executor::Executor,
}

impl WorkDispatcher {
    pub fn new(executor: task_executor::Executor, config: DispatcherConfig) -> WorkDispatcher {
        let parallelism = config.parallelism.max(1);
        WorkDispatcher {
            semaphore: Arc::new(Semaphore::new(parallelism)),
            executor,
        }
    }

    /// Submits `job` for execution once a worker slot is available, and
    /// returns a completion channel.
    ///
    /// If `cancellation` is already cancelled by the time a slot frees up,
    /// the job is skipped entirely rather than run; a job already running is
    /// never interrupted by this dispatcher; that's left to the job itself
    /// to cooperate with `cancellation`.
    pub fn enqueue<F, E>(
        &self,
        cancellation: CancellationToken,
        job: F,
    ) -> oneshot::Receiver<Option<E>>
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Send + 'static,
    {
        let (done_sender, done_receiver) = oneshot::channel();
        let semaphore = Arc::clone(&self.semaphore);

        self.executor.native_spawn(async move {
            let permit = semaphore
                .acquire()
                .await
                .expect("WorkDispatcher's semaphore is never closed");

            let result = if cancellation.is_cancelled() {
                log::debug!("skipping dispatcher job: cancelled before a worker was free");
                None
            } else {
                job.await.err()
            };

            drop(permit);
            // The receiver may have already been dropped by a caller that
            // stopped waiting; that isn't this dispatcher's problem.
            let _ = done_sender.send(result);
        });

        done_receiver
    }
}
