// src/workflow/step_runner.rs

//! Checkpointed execution of named workflow steps.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::checkpoint::{CheckpointStore, StepStatus};
use crate::errors::{DevstrapError, Result};

/// Whether a failing step aborts the workflow or is tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Fatal,
    Degraded,
}

/// What happened to a step that did not abort the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepReport {
    /// Already COMPLETED in an earlier invocation; the action was not run.
    Skipped,
    Completed,
    /// The action failed on the degraded path; the reason is kept for the
    /// final summary.
    Degraded { reason: String },
}

/// Runs steps exactly once across invocations, recording each transition in
/// the injected [`CheckpointStore`].
///
/// Per step: PENDING -> IN_PROGRESS -> COMPLETED | FAILED | DEGRADED.
/// Whatever way the action ends, only the step being run is updated.
#[derive(Debug)]
pub struct StepRunner<S: CheckpointStore> {
    store: S,
    cancel: CancellationToken,
}

impl<S: CheckpointStore> StepRunner<S> {
    pub fn new(store: S, cancel: CancellationToken) -> Self {
        Self { store, cancel }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run a hard prerequisite. A failure is recorded as FAILED and returned
    /// as [`DevstrapError::StepFailed`].
    pub async fn run_step<F, Fut>(&mut self, name: &str, action: F) -> Result<StepReport>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        self.execute(name, StepKind::Fatal, action).await
    }

    /// Run an optional check. A failure is recorded as DEGRADED and reported
    /// as [`StepReport::Degraded`] so the workflow can continue.
    pub async fn run_step_degraded<F, Fut>(&mut self, name: &str, action: F) -> Result<StepReport>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        self.execute(name, StepKind::Degraded, action).await
    }

    pub async fn execute<F, Fut>(
        &mut self,
        name: &str,
        kind: StepKind,
        action: F,
    ) -> Result<StepReport>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if self.store.get(name) == StepStatus::Completed {
            info!(step = %name, "already completed; skipping");
            return Ok(StepReport::Skipped);
        }

        // Nothing has started yet, so no checkpoint is touched.
        if self.cancel.is_cancelled() {
            return Err(DevstrapError::Interrupted { step: None });
        }

        self.store.set(name, StepStatus::InProgress)?;
        info!(step = %name, ?kind, "step started");

        let cancel = self.cancel.clone();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DevstrapError::Interrupted { step: None }),
            res = action() => res,
        };

        // A child killed by the same Ctrl-C may exit before the token branch
        // wins; any failure after cancellation counts as the interrupt.
        let outcome = match outcome {
            Err(_) if self.cancel.is_cancelled() => {
                Err(DevstrapError::Interrupted { step: None })
            }
            other => other,
        };

        match outcome {
            Ok(()) => {
                self.store.set(name, StepStatus::Completed)?;
                info!(step = %name, "step completed");
                Ok(StepReport::Completed)
            }
            Err(DevstrapError::Interrupted { .. }) => {
                self.record(name, StepStatus::Failed);
                warn!(step = %name, "step interrupted; recorded as failed");
                Err(DevstrapError::Interrupted {
                    step: Some(name.to_string()),
                })
            }
            Err(err) => match kind {
                StepKind::Fatal => {
                    self.record(name, StepStatus::Failed);
                    error!(step = %name, error = %err, exit_code = err.exit_code(), "step failed");
                    Err(DevstrapError::StepFailed {
                        step: name.to_string(),
                        source: Box::new(err),
                    })
                }
                StepKind::Degraded => {
                    self.record(name, StepStatus::Degraded);
                    warn!(step = %name, error = %err, "optional step failed; continuing degraded");
                    Ok(StepReport::Degraded {
                        reason: err.to_string(),
                    })
                }
            },
        }
    }

    /// Record a failure status without letting a store error mask the
    /// failure being reported.
    fn record(&mut self, name: &str, status: StepStatus) {
        if let Err(err) = self.store.set(name, status) {
            error!(step = %name, %status, error = %err, "could not record step status");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpointStore;

    fn runner() -> StepRunner<MemoryCheckpointStore> {
        StepRunner::new(MemoryCheckpointStore::new(), CancellationToken::new())
    }

    fn failure() -> DevstrapError {
        DevstrapError::CommandFailed {
            command: "false".to_string(),
            code: 2,
        }
    }

    #[tokio::test]
    async fn completed_step_is_not_run_again() {
        let mut runner = runner();
        let mut runs = 0;

        runner.run_step("tools", || async { Ok(()) }).await.unwrap();
        let report = runner
            .run_step("tools", || {
                runs += 1;
                async { Ok(()) }
            })
            .await
            .unwrap();

        assert_eq!(report, StepReport::Skipped);
        assert_eq!(runs, 0);
    }

    /// Records every `set` so tests can check the full transition sequence.
    #[derive(Debug, Default)]
    struct HistoryStore {
        inner: MemoryCheckpointStore,
        history: Vec<(String, StepStatus)>,
    }

    impl CheckpointStore for HistoryStore {
        fn get(&self, name: &str) -> StepStatus {
            self.inner.get(name)
        }

        fn set(&mut self, name: &str, status: StepStatus) -> Result<()> {
            self.history.push((name.to_string(), status));
            self.inner.set(name, status)
        }

        fn reset(&mut self) -> Result<()> {
            self.inner.reset()
        }

        fn entries(&self) -> Result<Vec<(String, StepStatus)>> {
            self.inner.entries()
        }
    }

    #[tokio::test]
    async fn transitions_pass_through_in_progress() {
        let mut runner = StepRunner::new(HistoryStore::default(), CancellationToken::new());

        runner.run_step("tools", || async { Ok(()) }).await.unwrap();
        let err = runner
            .run_step("services", || async { Err(failure()) })
            .await
            .unwrap_err();

        assert!(matches!(err, DevstrapError::StepFailed { ref step, .. } if step == "services"));
        assert_eq!(err.exit_code(), 2);

        let expected: Vec<(String, StepStatus)> = vec![
            ("tools".into(), StepStatus::InProgress),
            ("tools".into(), StepStatus::Completed),
            ("services".into(), StepStatus::InProgress),
            ("services".into(), StepStatus::Failed),
        ];
        assert_eq!(runner.store().history, expected);
    }

    #[tokio::test]
    async fn degraded_failure_is_recorded_and_swallowed() {
        let mut runner = runner();

        let report = runner
            .run_step_degraded("smoke", || async { Err(failure()) })
            .await
            .unwrap();

        assert!(matches!(report, StepReport::Degraded { .. }));
        assert_eq!(runner.store().get("smoke"), StepStatus::Degraded);
    }

    #[tokio::test]
    async fn interrupt_marks_only_the_running_step() {
        let cancel = CancellationToken::new();
        let mut runner = StepRunner::new(MemoryCheckpointStore::new(), cancel.clone());

        runner.run_step("tools", || async { Ok(()) }).await.unwrap();
        let err = runner
            .run_step("install", || async move {
                cancel.cancel();
                std::future::pending::<Result<()>>().await
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DevstrapError::Interrupted { step: Some(ref s) } if s == "install"));
        assert_eq!(runner.store().get("tools"), StepStatus::Completed);
        assert_eq!(runner.store().get("install"), StepStatus::Failed);
    }

    /// The child sees the signal too and exits on its own before the runner
    /// notices the token.
    fn killed_by_signal() -> DevstrapError {
        DevstrapError::CommandFailed {
            command: "sleep 30".to_string(),
            code: -1,
        }
    }

    #[tokio::test]
    async fn signal_killed_command_counts_as_interrupt_on_fatal_path() {
        let cancel = CancellationToken::new();
        let mut runner = StepRunner::new(MemoryCheckpointStore::new(), cancel.clone());

        let err = runner
            .run_step("install", || async move {
                cancel.cancel();
                Err(killed_by_signal())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DevstrapError::Interrupted { step: Some(ref s) } if s == "install"));
        assert_eq!(err.exit_code(), crate::errors::INTERRUPT_EXIT_CODE);
        assert_eq!(runner.store().get("install"), StepStatus::Failed);
    }

    #[tokio::test]
    async fn signal_killed_command_counts_as_interrupt_on_degraded_path() {
        let cancel = CancellationToken::new();
        let mut runner = StepRunner::new(MemoryCheckpointStore::new(), cancel.clone());

        let err = runner
            .run_step_degraded("smoke", || async move {
                cancel.cancel();
                Err(killed_by_signal())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DevstrapError::Interrupted { step: Some(ref s) } if s == "smoke"));
        assert_eq!(runner.store().get("smoke"), StepStatus::Failed);
    }

    #[tokio::test]
    async fn cancelled_before_start_touches_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut runner = StepRunner::new(MemoryCheckpointStore::new(), cancel);

        let err = runner.run_step("tools", || async { Ok(()) }).await.unwrap_err();

        assert!(err.is_interrupted());
        assert!(runner.store().entries().unwrap().is_empty());
    }
}
