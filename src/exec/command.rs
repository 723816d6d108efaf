// src/exec/command.rs

//! Shell command helpers shared by bootstrap steps and verify tasks.

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{DevstrapError, Result};

/// How a spawned command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandExit {
    /// The process exited; signal deaths are reported as `-1`.
    Exited(i32),
    /// The cancellation token fired and the process was killed.
    Cancelled,
}

/// Build a shell command appropriate for the platform.
pub fn shell_command(cmd: &str) -> Command {
    let mut c = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };
    c.kill_on_drop(true);
    c
}

/// Wait for `child` to exit, killing it if `cancel` fires first.
///
/// The exit code is read straight from the wait result so nothing else can
/// observe (or overwrite) it in between.
pub async fn wait_or_cancel(
    mut child: Child,
    label: &str,
    cancel: &CancellationToken,
) -> Result<CommandExit> {
    tokio::select! {
        status_res = child.wait() => {
            let status = status_res?;
            let code = status.code().unwrap_or(-1);
            debug!(command = %label, exit_code = code, "process exited");
            Ok(CommandExit::Exited(code))
        }

        _ = cancel.cancelled() => {
            info!(command = %label, "cancellation requested; killing process");
            if let Err(e) = child.kill().await {
                warn!(command = %label, error = %e, "failed to kill child process on cancellation");
            }
            Ok(CommandExit::Cancelled)
        }
    }
}

/// Run `cmd` in `cwd` with the operator's terminal attached.
///
/// Non-zero exit becomes [`DevstrapError::CommandFailed`]; cancellation
/// becomes [`DevstrapError::Interrupted`].
pub async fn run_shell(cmd: &str, cwd: &Path, cancel: &CancellationToken) -> Result<()> {
    info!(command = %cmd, "running");

    let child = shell_command(cmd)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()?;

    match wait_or_cancel(child, cmd, cancel).await? {
        CommandExit::Exited(0) => Ok(()),
        CommandExit::Exited(code) => Err(DevstrapError::CommandFailed {
            command: cmd.to_string(),
            code,
        }),
        CommandExit::Cancelled => Err(DevstrapError::Interrupted { step: None }),
    }
}

/// Run a readiness probe silently; `Ok(true)` iff it exits 0.
pub async fn probe(cmd: &str, cwd: &Path, cancel: &CancellationToken) -> Result<bool> {
    let child = shell_command(cmd)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    match wait_or_cancel(child, cmd, cancel).await? {
        CommandExit::Exited(code) => Ok(code == 0),
        CommandExit::Cancelled => Err(DevstrapError::Interrupted { step: None }),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn non_zero_exit_reports_command_and_code() {
        let cancel = CancellationToken::new();
        let err = run_shell("exit 3", Path::new("."), &cancel)
            .await
            .unwrap_err();

        match err {
            DevstrapError::CommandFailed { command, code } => {
                assert_eq!(command, "exit 3");
                assert_eq!(code, 3);
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn probe_maps_exit_status_to_bool() {
        let cancel = CancellationToken::new();
        assert!(probe("true", Path::new("."), &cancel).await.unwrap());
        assert!(!probe("false", Path::new("."), &cancel).await.unwrap());
    }

    #[tokio::test]
    async fn cancellation_kills_running_process() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_shell("sleep 30", Path::new("."), &cancel),
        )
        .await
        .expect("sleep was not killed");

        assert!(result.unwrap_err().is_interrupted());
    }
}
