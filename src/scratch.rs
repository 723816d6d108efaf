// src/scratch.rs

//! Per-run scratch workspace for verify task markers and logs.
//!
//! Every file is addressed by the task's [`Task::key`], so concurrent workers
//! never touch the same path:
//!
//! - `<key>.log`: combined stdout/stderr while the task runs
//! - `<key>.ok`: success marker (the log is deleted)
//! - `<key>.fail`: failure marker carrying the exit code (the log is kept)
//!
//! The directory is removed when the workspace is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::debug;

use crate::discovery::Task;
use crate::errors::Result;

const SUCCESS_EXT: &str = "ok";
const FAILURE_EXT: &str = "fail";
const LOG_EXT: &str = "log";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MarkerFile {
    task: String,
    exit_code: i32,
}

/// A marker read back from the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Success {
        task: String,
    },
    Failure {
        task: String,
        exit_code: i32,
        log: String,
    },
}

#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
}

impl ScratchWorkspace {
    /// Create a fresh, empty workspace in the system temp directory.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("devstrap-verify-")
            .tempdir()?;
        debug!(path = %dir.path().display(), "created scratch workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn log_path(&self, task: &Task) -> PathBuf {
        self.file_for(task, LOG_EXT)
    }

    /// Record success and discard the task's log.
    pub fn mark_success(&self, task: &Task) -> Result<()> {
        self.write_marker(task, SUCCESS_EXT, 0)?;
        match fs::remove_file(self.log_path(task)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Record failure with `exit_code`; the log stays for the report.
    pub fn mark_failure(&self, task: &Task, exit_code: i32) -> Result<()> {
        self.write_marker(task, FAILURE_EXT, exit_code)
    }

    /// Every marker written so far, successes and failures alike, ordered by
    /// task key.
    pub fn markers(&self) -> Result<Vec<Marker>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(self.path())?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        paths.sort();

        let mut markers = Vec::new();
        for path in paths {
            let ext = path.extension().and_then(|e| e.to_str());
            match ext {
                Some(SUCCESS_EXT) => {
                    let marker = read_marker(&path)?;
                    markers.push(Marker::Success { task: marker.task });
                }
                Some(FAILURE_EXT) => {
                    let marker = read_marker(&path)?;
                    let log = fs::read_to_string(path.with_extension(LOG_EXT))
                        .unwrap_or_else(|_| "(no output captured)\n".to_string());
                    markers.push(Marker::Failure {
                        task: marker.task,
                        exit_code: marker.exit_code,
                        log,
                    });
                }
                _ => {}
            }
        }

        Ok(markers)
    }

    fn file_for(&self, task: &Task, ext: &str) -> PathBuf {
        self.path().join(format!("{}.{ext}", task.key()))
    }

    fn write_marker(&self, task: &Task, ext: &str, exit_code: i32) -> Result<()> {
        let marker = MarkerFile {
            task: task.id.clone(),
            exit_code,
        };
        fs::write(self.file_for(task, ext), toml::to_string(&marker)?)?;
        Ok(())
    }
}

fn read_marker(path: &Path) -> Result<MarkerFile> {
    let contents = fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}
