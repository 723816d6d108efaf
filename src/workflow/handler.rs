// src/workflow/handler.rs

//! Process-wide interrupt wiring and fatal-error reporting.

use std::fmt::Write as _;
use std::path::Path;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::errors::DevstrapError;

/// Listen for Ctrl-C (and SIGTERM on unix) and cancel `cancel` on the first
/// one. Call once per process.
pub fn install(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => return,
            signal = wait_for_signal() => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for interrupt signals");
                    return;
                }
            }
        }
        info!("interrupt received; stopping");
        cancel.cancel();
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Commands that inspect, resume or restart the bootstrap workflow.
pub fn resume_guidance(config_path: &Path) -> String {
    let config = config_path.display();
    let mut out = String::new();
    let _ = writeln!(out, "next steps:");
    let _ = writeln!(out, "  inspect:  devstrap --config {config} status");
    let _ = writeln!(out, "  resume:   devstrap --config {config} bootstrap");
    let _ = writeln!(out, "  restart:  devstrap --config {config} reset && devstrap --config {config} bootstrap");
    out
}

/// Operator-facing description of a bootstrap failure, including resume
/// guidance.
pub fn describe_fatal(err: &DevstrapError, config_path: &Path, checkpoint_path: &Path) -> String {
    let mut out = String::new();

    match err {
        DevstrapError::Interrupted { step } => {
            let step = step.as_deref().unwrap_or("(between steps)");
            let _ = writeln!(out, "bootstrap interrupted during step '{step}'");
        }
        DevstrapError::StepFailed { step, source } => {
            let _ = writeln!(out, "bootstrap failed at step '{step}'");
            let _ = writeln!(out, "  error:      {source}");
        }
        other => {
            let _ = writeln!(out, "bootstrap failed: {other}");
        }
    }

    if let Some(command) = err.failing_command() {
        let _ = writeln!(out, "  command:    {command}");
    }
    let _ = writeln!(out, "  checkpoint: {}", checkpoint_path.display());
    let _ = writeln!(out, "  exit code:  {}", err.exit_code());
    out.push_str(&resume_guidance(config_path));
    out
}

/// Print the failure report to stderr and return the exit code to terminate
/// with.
pub fn report_fatal(err: &DevstrapError, config_path: &Path, checkpoint_path: &Path) -> i32 {
    eprint!("{}", describe_fatal(err, config_path, checkpoint_path));
    err.exit_code()
}
