// src/workflow/mod.rs

//! Bootstrap workflow.
//!
//! [`run_workflow`] walks the configured `[[step]]` list in order through a
//! [`StepRunner`]. Each step runs its shell command, optionally under
//! [`retry_with_backoff`], then optionally waits on a readiness probe.

pub mod handler;
pub mod readiness;
pub mod retry;
pub mod step_runner;

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::checkpoint::CheckpointStore;
use crate::config::StepConfig;
use crate::errors::Result;
use crate::exec::{probe, run_shell};

pub use readiness::poll_until_ready;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use step_runner::{StepKind, StepReport, StepRunner};

/// Outcome of a bootstrap run that did not abort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowReport {
    /// Steps whose action ran and succeeded in this invocation.
    pub completed: Vec<String>,
    /// Steps already COMPLETED by an earlier invocation.
    pub skipped: Vec<String>,
    /// Optional steps that failed, with the reason.
    pub degraded: Vec<(String, String)>,
}

impl WorkflowReport {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for name in &self.skipped {
            out.push_str(&format!("SKIPPED: {name} (already completed)\n"));
        }
        for name in &self.completed {
            out.push_str(&format!("COMPLETED: {name}\n"));
        }
        for (name, reason) in &self.degraded {
            out.push_str(&format!("DEGRADED: {name} ({reason})\n"));
        }

        if self.is_degraded() {
            out.push_str(&format!(
                "bootstrap: OK with {} degraded step(s); checkpoints kept\n",
                self.degraded.len()
            ));
            out.push_str(
                "  rerun `devstrap bootstrap` to retry only the degraded steps, \
                 or `devstrap reset` first to run every step again\n",
            );
        } else {
            out.push_str("bootstrap: OK\n");
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}

/// Run every step in `steps` through `runner`, in order.
///
/// Stops at the first fatal failure or interrupt and returns it; the runner
/// has already recorded the failing step. After a run with no degraded steps
/// the checkpoint store is cleared so the next invocation starts clean.
pub async fn run_workflow<S: CheckpointStore>(
    runner: &mut StepRunner<S>,
    steps: &[StepConfig],
    policy: &RetryPolicy,
    root: &Path,
) -> Result<WorkflowReport> {
    let cancel = runner.cancel_token().clone();
    let mut report = WorkflowReport::default();

    for step in steps {
        let kind = if step.degraded {
            StepKind::Degraded
        } else {
            StepKind::Fatal
        };

        let outcome = runner
            .execute(&step.name, kind, || perform_step(step, policy, root, &cancel))
            .await?;

        match outcome {
            StepReport::Skipped => report.skipped.push(step.name.clone()),
            StepReport::Completed => report.completed.push(step.name.clone()),
            StepReport::Degraded { reason } => report.degraded.push((step.name.clone(), reason)),
        }
    }

    if report.is_degraded() {
        warn!(
            degraded = report.degraded.len(),
            "bootstrap finished with degraded steps; keeping checkpoints"
        );
    } else {
        runner.store_mut().reset()?;
        info!(steps = steps.len(), "bootstrap finished; checkpoints cleared");
    }

    Ok(report)
}

async fn perform_step(
    step: &StepConfig,
    policy: &RetryPolicy,
    root: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    if step.retry {
        retry_with_backoff(policy, &step.cmd, cancel, || run_shell(&step.cmd, root, cancel)).await?;
    } else {
        run_shell(&step.cmd, root, cancel).await?;
    }

    if let Some(ready_cmd) = &step.ready_cmd {
        poll_until_ready(
            ready_cmd,
            step.ready_attempts,
            step.ready_interval(),
            cancel,
            || probe(ready_cmd, root, cancel),
        )
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_notes_degraded_limitation() {
        let report = WorkflowReport {
            completed: vec!["check-tools".to_string()],
            skipped: vec!["install".to_string()],
            degraded: vec![("smoke-test".to_string(), "exit 3".to_string())],
        };

        let text = report.render();
        assert!(text.contains("SKIPPED: install"));
        assert!(text.contains("COMPLETED: check-tools"));
        assert!(text.contains("DEGRADED: smoke-test (exit 3)"));
        assert!(text.contains("OK with 1 degraded step(s)"));
        assert!(text.contains("`devstrap reset`"));
    }

    #[test]
    fn clean_report_is_plain_ok() {
        let report = WorkflowReport {
            completed: vec!["a".to_string()],
            ..Default::default()
        };
        assert!(report.render().ends_with("bootstrap: OK\n"));
    }
}
