// src/report.rs

//! Aggregation of one verify run into a single report and exit status.

use std::fmt::Write as _;

use crate::errors::Result;
use crate::scratch::{Marker, ScratchWorkspace};

/// A failed task with its retained output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub task: String,
    pub exit_code: i32,
    pub log: String,
}

/// Everything the operator (or CI) needs to know about a verify run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub successes: Vec<String>,
    pub failures: Vec<TaskFailure>,
    /// The producer whose failure stopped the run, if any.
    pub producer_failed: Option<String>,
    /// Consumers that ran to completion; 0 when the consumer stage was skipped.
    pub consumers_executed: usize,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.successes.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.producer_failed.is_none()
    }

    /// 0 when everything passed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn failure_for(&self, task: &str) -> Option<&TaskFailure> {
        self.failures.iter().find(|f| f.task == task)
    }

    /// Human-readable report; failed tasks include their full log.
    pub fn render(&self) -> String {
        let mut out = String::new();

        for task in &self.successes {
            let _ = writeln!(out, "SUCCESS: {task}");
        }

        for failure in &self.failures {
            let _ = writeln!(out, "FAILURE: {} (exit {})", failure.task, failure.exit_code);
            let _ = writeln!(out, "----- begin log: {} -----", failure.task);
            out.push_str(&failure.log);
            if !failure.log.ends_with('\n') {
                out.push('\n');
            }
            let _ = writeln!(out, "----- end log: {} -----", failure.task);
        }

        if let Some(producer) = &self.producer_failed {
            let _ = writeln!(
                out,
                "producer '{producer}' failed; consumer stage skipped ({} consumers executed)",
                self.consumers_executed
            );
        }

        let _ = writeln!(
            out,
            "verify: {} passed, {} failed -> {}",
            self.passed(),
            self.failed(),
            if self.is_success() { "OK" } else { "FAILED" }
        );

        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}

/// Build the run summary from every marker in `scratch`.
pub fn aggregate(
    scratch: &ScratchWorkspace,
    producer_failed: Option<String>,
    consumers_executed: usize,
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        producer_failed,
        consumers_executed,
        ..RunSummary::default()
    };

    for marker in scratch.markers()? {
        match marker {
            Marker::Success { task } => summary.successes.push(task),
            Marker::Failure {
                task,
                exit_code,
                log,
            } => summary.failures.push(TaskFailure {
                task,
                exit_code,
                log,
            }),
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            successes: vec!["L".to_string(), "A".to_string()],
            failures: vec![TaskFailure {
                task: "S".to_string(),
                exit_code: 7,
                log: "lint: 3 problems".to_string(),
            }],
            producer_failed: None,
            consumers_executed: 2,
        }
    }

    #[test]
    fn render_inlines_failure_logs() {
        let text = summary().render();

        assert!(text.contains("SUCCESS: L\n"));
        assert!(text.contains("SUCCESS: A\n"));
        assert!(text.contains("FAILURE: S (exit 7)\n"));
        assert!(text.contains("lint: 3 problems\n----- end log: S -----"));
        assert!(text.ends_with("verify: 2 passed, 1 failed -> FAILED\n"));
    }

    #[test]
    fn producer_failure_alone_fails_the_run() {
        let summary = RunSummary {
            producer_failed: Some("libs/shared".to_string()),
            ..RunSummary::default()
        };

        assert_eq!(summary.exit_code(), 1);
        assert!(summary
            .render()
            .contains("producer 'libs/shared' failed; consumer stage skipped (0 consumers executed)"));
    }

    #[test]
    fn empty_run_is_success() {
        assert_eq!(RunSummary::default().exit_code(), 0);
    }
}
