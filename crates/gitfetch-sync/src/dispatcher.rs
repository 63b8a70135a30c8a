//! Bounded fan-out of fetch jobs over a fixed worker pool.
//!
//! The dispatcher owns the whole pool for one run: a bounded job queue shared
//! by every worker, and an unbounded completion queue that only workers write
//! to. Workers stop when they take an explicit [`WorkerMessage::Stop`] off the
//! queue, or when the queue closes.

use std::sync::Arc;

use gitfetch_types::{JobId, RepositoryPath, WorkerCount};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::SyncResult;
use crate::fetcher::RepoFetcher;
use crate::types::{FetchReport, JobOutcome, RepoOutcome};

#[derive(Debug)]
struct Job {
    id: JobId,
    path: RepositoryPath,
}

#[derive(Debug)]
enum WorkerMessage {
    Fetch(Job),
    Stop,
}

type JobQueue = Arc<Mutex<mpsc::Receiver<WorkerMessage>>>;

/// Runs one [`RepoFetcher`] job per repository across `W` workers.
pub struct FetchDispatcher<F> {
    fetcher: Arc<F>,
}

impl<F> Clone for FetchDispatcher<F> {
    fn clone(&self) -> Self {
        Self { fetcher: Arc::clone(&self.fetcher) }
    }
}

impl<F: RepoFetcher> FetchDispatcher<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher: Arc::new(fetcher) }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch every path, at most `workers` at a time.
    ///
    /// Returns exactly one outcome per input path, in input order. Duplicate
    /// paths are separate jobs. A `workers` value outside `1..=MAX_WORKERS` is
    /// the only error; everything that goes wrong inside a job is reported in its
    /// outcome instead.
    ///
    /// Once `cancel` fires no new job starts. Jobs already running finish, and
    /// every job that never started is reported as [`RepoOutcome::NotAttempted`].
    pub async fn fetch_all(
        &self,
        paths: Vec<RepositoryPath>,
        workers: i64,
        cancel: CancellationToken,
    ) -> SyncResult<FetchReport> {
        let workers = WorkerCount::try_from(workers)?.get();
        let total = paths.len();
        info!(repositories = total, workers, "starting fetch run");

        let (job_tx, job_rx) = mpsc::channel::<WorkerMessage>(workers.min(total).max(1));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<JobOutcome>();
        let queue: JobQueue = Arc::new(Mutex::new(job_rx));

        let handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&self.fetcher),
                    Arc::clone(&queue),
                    done_tx.clone(),
                    cancel.clone(),
                ))
            })
            .collect();
        drop(queue);
        drop(done_tx);

        let mut submitted = 0usize;
        for (index, path) in paths.iter().enumerate() {
            let job = WorkerMessage::Fetch(Job { id: JobId::new(index), path: path.clone() });
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(submitted, remaining = total - submitted, "cancelled before all jobs were submitted");
                    break;
                }
                sent = job_tx.send(job) => {
                    if sent.is_err() {
                        error!("every worker exited early");
                        break;
                    }
                    submitted += 1;
                }
            }
        }

        for _ in 0..workers {
            if job_tx.send(WorkerMessage::Stop).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        let mut slots: Vec<Option<JobOutcome>> = vec![None; total];
        while let Some(outcome) = done_rx.recv().await {
            let index = outcome.id.index();
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(outcome);
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "worker task failed");
            }
        }

        let outcomes = slots
            .into_iter()
            .zip(paths)
            .enumerate()
            .map(|(index, (slot, path))| {
                slot.unwrap_or_else(|| {
                    let outcome = if index >= submitted {
                        RepoOutcome::NotAttempted
                    } else {
                        RepoOutcome::Aborted { reason: "worker exited before reporting".into() }
                    };
                    JobOutcome::new(JobId::new(index), path, outcome)
                })
            })
            .collect();

        let report = FetchReport { outcomes };
        debug!(outcomes = report.len(), "fetch run complete");
        Ok(report)
    }
}

async fn run_worker<F: RepoFetcher>(
    worker: usize,
    fetcher: Arc<F>,
    queue: JobQueue,
    done: mpsc::UnboundedSender<JobOutcome>,
    cancel: CancellationToken,
) {
    loop {
        let message = queue.lock().await.recv().await;
        let job = match message {
            Some(WorkerMessage::Fetch(job)) => job,
            Some(WorkerMessage::Stop) | None => break,
        };

        let outcome = if cancel.is_cancelled() {
            debug!(worker, path = %job.path, "skipping job after cancellation");
            RepoOutcome::NotAttempted
        } else {
            let fetcher = Arc::clone(&fetcher);
            let path = job.path.clone();
            let token = cancel.clone();
            match tokio::task::spawn_blocking(move || fetcher.fetch_repository(&path, &token)).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(worker, path = %job.path, error = %e, "fetch task failed");
                    RepoOutcome::Aborted { reason: format!("fetch task failed: {e}") }
                }
            }
        };

        if done.send(JobOutcome::new(job.id, job.path, outcome)).is_err() {
            break;
        }
    }
    debug!(worker, "worker stopped");
}
