// src/checkpoint/mod.rs

//! Persisted step status.
//!
//! - [`file`] keeps checkpoints in a TOML file under the workspace root and
//!   replaces it atomically on every write.
//! - [`memory`] keeps them in process memory (tests, throwaway runs).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

pub mod file;
pub mod memory;

pub use file::FileCheckpointStore;
pub use memory::MemoryCheckpointStore;

/// Status of a named bootstrap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    InProgress,
    /// Terminal; the step is skipped by later invocations.
    Completed,
    Failed,
    Degraded,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "PENDING",
            StepStatus::InProgress => "IN_PROGRESS",
            StepStatus::Completed => "COMPLETED",
            StepStatus::Failed => "FAILED",
            StepStatus::Degraded => "DEGRADED",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage for step checkpoints.
///
/// One writer at a time; no locking beyond that.
pub trait CheckpointStore: Send + Sync {
    /// Current status of `name`; [`StepStatus::Pending`] when unknown or when
    /// the backing store cannot be read.
    fn get(&self, name: &str) -> StepStatus;

    /// Record `status` for `name`. Setting the same value twice is a no-op.
    fn set(&mut self, name: &str, status: StepStatus) -> Result<()>;

    /// Drop every checkpoint.
    fn reset(&mut self) -> Result<()>;

    /// All recorded checkpoints in first-recorded order.
    fn entries(&self) -> Result<Vec<(String, StepStatus)>>;
}

impl<S: CheckpointStore + ?Sized> CheckpointStore for Box<S> {
    fn get(&self, name: &str) -> StepStatus {
        (**self).get(name)
    }

    fn set(&mut self, name: &str, status: StepStatus) -> Result<()> {
        (**self).set(name, status)
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn entries(&self) -> Result<Vec<(String, StepStatus)>> {
        (**self).entries()
    }
}

/// Render checkpoint entries as the `status` table.
pub fn render_status(entries: &[(String, StepStatus)]) -> String {
    if entries.is_empty() {
        return "no checkpoints recorded (next bootstrap starts from the first step)\n"
            .to_string();
    }

    let width = entries.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, status) in entries {
        out.push_str(&format!("{name:<width$}  {status}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table_aligns_names() {
        let table = render_status(&[
            ("tools".to_string(), StepStatus::Completed),
            ("start-services".to_string(), StepStatus::Failed),
        ]);

        assert_eq!(
            table,
            "tools           COMPLETED\nstart-services  FAILED\n"
        );
    }

    #[test]
    fn empty_status_table_says_so() {
        assert!(render_status(&[]).starts_with("no checkpoints recorded"));
    }
}
