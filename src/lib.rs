// src/lib.rs

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod report;
pub mod scheduler;
pub mod scratch;
pub mod workflow;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::checkpoint::{render_status, CheckpointStore, FileCheckpointStore};
use crate::cli::{CliArgs, Command};
use crate::config::{load_and_validate, load_or_default, ConfigFile};
use crate::discovery::{TaskProvider, WorkspaceTaskProvider};
use crate::errors::{DevstrapError, INTERRUPT_EXIT_CODE};
use crate::exec::ProcessExecutor;
use crate::fs::RealFileSystem;
use crate::scheduler::{consumer_parallelism, Stages, StagedScheduler};
use crate::workflow::{handler, run_workflow, StepRunner};

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// Errors are reserved for problems outside any workflow (unreadable or
/// invalid config, unusable checkpoint file); step and task failures are
/// reported here and mapped to an exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let root = workspace_root(args.root.as_deref(), &config_path);
    debug!(config = %config_path.display(), root = %root.display(), "resolved paths");

    match args.command {
        Command::Bootstrap => {
            let cfg = load_and_validate(&config_path)?;
            bootstrap(&cfg, &config_path, &root).await
        }
        Command::Status => {
            let cfg = load_or_default(&config_path)?;
            let store = FileCheckpointStore::in_workspace(&root, &cfg.checkpoint.path);
            print!("{}", render_status(&store.entries()?));
            Ok(0)
        }
        Command::Reset => {
            let cfg = load_or_default(&config_path)?;
            let mut store = FileCheckpointStore::in_workspace(&root, &cfg.checkpoint.path);
            store.reset()?;
            println!("checkpoints cleared ({})", store.path().display());
            Ok(0)
        }
        Command::Verify { jobs, list } => {
            let cfg = load_or_default(&config_path)?;
            verify(&cfg, &root, jobs, list).await
        }
    }
}

async fn bootstrap(cfg: &ConfigFile, config_path: &Path, root: &Path) -> Result<i32> {
    if cfg.steps.is_empty() {
        return Err(DevstrapError::ConfigError(format!(
            "{} declares no [[step]] entries; nothing to bootstrap",
            config_path.display()
        ))
        .into());
    }

    let cancel = CancellationToken::new();
    let _signals = handler::install(cancel.clone());

    let store = FileCheckpointStore::in_workspace(root, &cfg.checkpoint.path);
    let checkpoint_path = store.path().to_path_buf();
    let mut runner = StepRunner::new(store, cancel.clone());

    info!(steps = cfg.steps.len(), checkpoint = %checkpoint_path.display(), "starting bootstrap");
    let result = run_workflow(&mut runner, &cfg.steps, &cfg.retry.policy(), root).await;
    cancel.cancel();

    match result {
        Ok(report) => {
            report.print();
            Ok(0)
        }
        Err(err) => Ok(handler::report_fatal(&err, config_path, &checkpoint_path)),
    }
}

async fn verify(cfg: &ConfigFile, root: &Path, jobs: Option<usize>, list: bool) -> Result<i32> {
    let provider = WorkspaceTaskProvider::new(RealFileSystem, root, &cfg.verify)?;
    let tasks = provider.discover()?;

    if list {
        let stages = Stages::partition(tasks);
        if stages.is_empty() {
            println!("no tasks discovered under {}", root.display());
        } else {
            print!("{}", stages.describe());
        }
        return Ok(0);
    }

    if tasks.is_empty() {
        println!("no tasks discovered under {}; nothing to verify", root.display());
        return Ok(0);
    }

    let cancel = CancellationToken::new();
    let _signals = handler::install(cancel.clone());

    let parallelism = consumer_parallelism(jobs.or(cfg.verify.jobs));
    let scheduler = StagedScheduler::new(ProcessExecutor::new(), parallelism, cancel.clone());

    let result = scheduler.run(tasks).await;
    let interrupted = cancel.is_cancelled();
    cancel.cancel();

    match result {
        Ok(summary) => {
            summary.print();
            Ok(summary.exit_code())
        }
        Err(err) if err.is_interrupted() || interrupted => {
            eprintln!("verify interrupted; partial results discarded");
            Ok(INTERRUPT_EXIT_CODE)
        }
        Err(err) => Err(err.into()),
    }
}

/// `--root` if given, else the directory holding the config file.
///
/// - For "configs/Devstrap.toml" this is "configs".
/// - For a bare "Devstrap.toml" (empty parent) it is the current directory.
pub fn workspace_root(explicit: Option<&str>, config_path: &Path) -> PathBuf {
    match explicit {
        Some(dir) => PathBuf::from(dir),
        None => config_root_dir(config_path),
    }
}

fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_wins() {
        let root = workspace_root(Some("/srv/ws"), Path::new("configs/Devstrap.toml"));
        assert_eq!(root, PathBuf::from("/srv/ws"));
    }

    #[test]
    fn root_defaults_to_config_directory() {
        let root = workspace_root(None, Path::new("configs/Devstrap.toml"));
        assert_eq!(root, PathBuf::from("configs"));
    }
}
