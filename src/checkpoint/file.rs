// src/checkpoint/file.rs

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{CheckpointStore, StepStatus};
use crate::errors::Result;

/// On-disk layout:
///
/// ```toml
/// [[step]]
/// name = "check-tools"
/// status = "COMPLETED"
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointDocument {
    #[serde(default)]
    step: Vec<CheckpointEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointEntry {
    name: String,
    status: StepStatus,
}

/// Checkpoints persisted to a TOML file.
///
/// Every `set` rewrites the whole file through a temp file in the same
/// directory followed by a rename, so readers only ever see the old or the new
/// document.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `relative` under the workspace `root`.
    pub fn in_workspace(root: &Path, relative: &str) -> Self {
        Self::new(root.join(relative))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CheckpointDocument> {
        if !self.path.exists() {
            return Ok(CheckpointDocument::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn save(&self, doc: &CheckpointDocument) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let rendered = toml::to_string(doc)?;
        let mut staging = NamedTempFile::new_in(&parent)?;
        staging.write_all(rendered.as_bytes())?;
        staging.as_file().sync_all()?;
        staging.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), entries = doc.step.len(), "checkpoint file replaced");
        Ok(())
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn get(&self, name: &str) -> StepStatus {
        match self.load() {
            Ok(doc) => doc
                .step
                .iter()
                .find(|e| e.name == name)
                .map(|e| e.status)
                .unwrap_or(StepStatus::Pending),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "unreadable checkpoint file; treating step as pending"
                );
                StepStatus::Pending
            }
        }
    }

    fn set(&mut self, name: &str, status: StepStatus) -> Result<()> {
        let mut doc = self.load()?;

        match doc.step.iter_mut().find(|e| e.name == name) {
            Some(entry) if entry.status == status => return Ok(()),
            Some(entry) => entry.status = status,
            None => doc.step.push(CheckpointEntry {
                name: name.to_string(),
                status,
            }),
        }

        self.save(&doc)
    }

    fn reset(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "checkpoints cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn entries(&self) -> Result<Vec<(String, StepStatus)>> {
        Ok(self
            .load()?
            .step
            .into_iter()
            .map(|e| (e.name, e.status))
            .collect())
    }
}
