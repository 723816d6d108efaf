// src/exec/task_runner.rs

//! Verify-task runner backed by real OS processes.

use std::fs::File;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::process::Stdio;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::discovery::Task;
use crate::errors::{DevstrapError, Result};
use crate::exec::backend::{TaskExecutor, TaskOutcome};
use crate::exec::command::{shell_command, wait_or_cancel, CommandExit};
use crate::scratch::ScratchWorkspace;

/// Exit code recorded when the verify process could not even be started.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// Runs each task's command in its own process, with combined stdout and
/// stderr captured into the task's scratch log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl TaskExecutor for ProcessExecutor {
    fn execute<'a>(
        &'a self,
        task: &'a Task,
        scratch: &'a ScratchWorkspace,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + 'a>> {
        Box::pin(run_task(task, scratch, cancel))
    }
}

async fn run_task(
    task: &Task,
    scratch: &ScratchWorkspace,
    cancel: &CancellationToken,
) -> Result<TaskOutcome> {
    info!(
        task = %task.id,
        role = %task.role,
        cmd = %task.command,
        dir = %task.dir.display(),
        "starting verify process"
    );

    let log_path = scratch.log_path(task);
    let log = File::create(&log_path)?;
    let log_err = log.try_clone()?;

    let spawned = shell_command(&task.command)
        .current_dir(&task.dir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn();

    let child = match spawned {
        Ok(child) => child,
        Err(err) => {
            error!(task = %task.id, error = %err, "failed to spawn verify process");
            let mut log = File::options().append(true).open(&log_path)?;
            writeln!(log, "devstrap: failed to start `{}`: {err}", task.command)?;
            scratch.mark_failure(task, SPAWN_FAILURE_EXIT_CODE)?;
            return Ok(TaskOutcome::Failed(SPAWN_FAILURE_EXIT_CODE));
        }
    };

    match wait_or_cancel(child, &task.command, cancel).await? {
        CommandExit::Exited(0) => {
            scratch.mark_success(task)?;
            info!(task = %task.id, "verify passed");
            Ok(TaskOutcome::Success)
        }
        CommandExit::Exited(code) => {
            scratch.mark_failure(task, code)?;
            warn!(task = %task.id, exit_code = code, "verify failed");
            Ok(TaskOutcome::Failed(code))
        }
        CommandExit::Cancelled => Err(DevstrapError::Interrupted { step: None }),
    }
}
