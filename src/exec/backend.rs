// src/exec/backend.rs

//! Pluggable per-task executor abstraction.
//!
//! The scheduler talks to a `TaskExecutor` instead of spawning processes
//! itself, so tests can swap in a scripted executor while production uses
//! [`ProcessExecutor`](super::ProcessExecutor).

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::discovery::Task;
use crate::errors::Result;
use crate::scratch::ScratchWorkspace;

/// Outcome of one task's verify action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(i32),
}

impl TaskOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Runs a task's verify action and records its marker.
///
/// Contract for implementations:
/// - write exactly one marker into `scratch` (success or failure) before
///   returning `Ok`;
/// - only touch scratch files addressed by the task's own key;
/// - return `Err(Interrupted)` without a marker when `cancel` fires.
pub trait TaskExecutor: Send + Sync {
    fn execute<'a>(
        &'a self,
        task: &'a Task,
        scratch: &'a ScratchWorkspace,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + 'a>>;
}
