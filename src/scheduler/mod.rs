// src/scheduler/mod.rs

//! Staged verify scheduler.
//!
//! Stage 1 runs producers one at a time in discovery order and stops at the
//! first failure. Stage 2 runs only when every producer passed: all consumers
//! are dispatched at once and a semaphore caps how many run concurrently.
//! Every task's result ends up as a marker in a per-run
//! [`ScratchWorkspace`], from which the [`report`](crate::report) is built.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::discovery::Task;
use crate::errors::{DevstrapError, Result};
use crate::exec::{TaskExecutor, TaskOutcome};
use crate::report::{aggregate, RunSummary};
use crate::scratch::ScratchWorkspace;

pub mod stage;

pub use stage::{consumer_parallelism, Stages, FALLBACK_PARALLELISM};

pub struct StagedScheduler<E: TaskExecutor + 'static> {
    executor: Arc<E>,
    jobs: usize,
    cancel: CancellationToken,
}

impl<E: TaskExecutor + 'static> std::fmt::Debug for StagedScheduler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedScheduler")
            .field("jobs", &self.jobs)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<E: TaskExecutor + 'static> StagedScheduler<E> {
    pub fn new(executor: E, jobs: usize, cancel: CancellationToken) -> Self {
        Self {
            executor: Arc::new(executor),
            jobs: jobs.max(1),
            cancel,
        }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Run both stages over `tasks` and aggregate the result.
    ///
    /// Returns [`DevstrapError::Interrupted`] (and no summary) if the
    /// cancellation token fires; partial results are discarded with the
    /// scratch workspace.
    pub async fn run(&self, tasks: Vec<Task>) -> Result<RunSummary> {
        let stages = Stages::partition(tasks);
        let scratch = Arc::new(ScratchWorkspace::create()?);

        info!(
            producers = stages.producers.len(),
            consumers = stages.consumers.len(),
            jobs = self.jobs,
            "starting staged verify run"
        );

        let producer_failed = self.run_producers(&stages.producers, &scratch).await?;

        let consumers_executed = match &producer_failed {
            Some(producer) => {
                warn!(
                    producer = %producer,
                    skipped = stages.consumers.len(),
                    "producer failed; skipping consumer stage"
                );
                0
            }
            None => self.run_consumers(stages.consumers, &scratch).await?,
        };

        let summary = aggregate(&scratch, producer_failed, consumers_executed)?;
        info!(
            passed = summary.passed(),
            failed = summary.failed(),
            "verify run finished"
        );
        Ok(summary)
    }

    /// Stage 1. Returns the id of the first failing producer.
    async fn run_producers(
        &self,
        producers: &[Task],
        scratch: &ScratchWorkspace,
    ) -> Result<Option<String>> {
        for producer in producers {
            if self.cancel.is_cancelled() {
                return Err(DevstrapError::Interrupted { step: None });
            }

            debug!(task = %producer.id, "stage 1: running producer");
            match self.executor.execute(producer, scratch, &self.cancel).await? {
                TaskOutcome::Success => {}
                TaskOutcome::Failed(code) => {
                    error!(task = %producer.id, exit_code = code, "producer failed");
                    return Ok(Some(producer.id.clone()));
                }
            }
        }
        Ok(None)
    }

    /// Stage 2. Returns how many consumers ran to completion.
    async fn run_consumers(
        &self,
        consumers: Vec<Task>,
        scratch: &Arc<ScratchWorkspace>,
    ) -> Result<usize> {
        let semaphore = Arc::new(Semaphore::new(self.jobs));
        // Cancelled on an internal worker error; the parent token is left alone.
        let stage_cancel = self.cancel.child_token();
        let mut workers = JoinSet::new();

        for task in consumers {
            let semaphore = Arc::clone(&semaphore);
            let executor = Arc::clone(&self.executor);
            let scratch = Arc::clone(scratch);
            let cancel = stage_cancel.clone();

            workers.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return Err(DevstrapError::Other(e.into())),
                };
                if cancel.is_cancelled() {
                    return Err(DevstrapError::Interrupted { step: None });
                }
                debug!(task = %task.id, "stage 2: running consumer");
                executor.execute(&task, &scratch, &cancel).await
            });
        }

        let mut executed = 0;
        let mut first_error: Option<DevstrapError> = None;

        while let Some(joined) = workers.join_next().await {
            let result = joined
                .map_err(|e| DevstrapError::Other(anyhow::Error::from(e)))
                .and_then(|r| r);
            match result {
                Ok(_) => executed += 1,
                Err(err) if err.is_interrupted() => {}
                Err(err) => {
                    if first_error.is_none() {
                        error!(error = %err, "consumer worker failed; stopping remaining consumers");
                        stage_cancel.cancel();
                        first_error = Some(err);
                    }
                }
            }
        }

        if self.cancel.is_cancelled() {
            return Err(DevstrapError::Interrupted { step: None });
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(executed),
        }
    }
}
