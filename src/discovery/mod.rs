// src/discovery/mod.rs

//! Discovery of verifiable sub-projects.
//!
//! - [`manifest`] decides whether a manifest declares the verify capability.
//! - [`workspace`] walks the category directories through a [`FileSystem`]
//!   and produces [`Task`]s.
//!
//! [`FileSystem`]: crate::fs::FileSystem

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::{DevstrapError, Result};

pub mod manifest;
pub mod workspace;

pub use manifest::{ManifestReader, PackageJsonManifest};
pub use workspace::WorkspaceTaskProvider;

/// Scheduling role of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRole {
    /// Builds artifacts other tasks depend on; runs first, sequentially.
    Producer,
    /// Everything else; runs concurrently after all producers passed.
    Consumer,
}

impl fmt::Display for TaskRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskRole::Producer => f.write_str("producer"),
            TaskRole::Consumer => f.write_str("consumer"),
        }
    }
}

/// A discovered unit of verification work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Directory relative to the workspace root, `/`-separated.
    pub id: String,
    pub dir: PathBuf,
    /// Shell command that verifies the task, run inside `dir`.
    pub command: String,
    pub role: TaskRole,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        dir: impl Into<PathBuf>,
        command: impl Into<String>,
        role: TaskRole,
    ) -> Self {
        Self {
            id: id.into(),
            dir: dir.into(),
            command: command.into(),
            role,
        }
    }

    /// File-name-safe form of `id`, used for scratch files.
    ///
    /// Separators and `%` are percent-encoded, so distinct ids never share a
    /// key.
    pub fn key(&self) -> String {
        let mut key = String::with_capacity(self.id.len());
        for c in self.id.chars() {
            match c {
                '%' => key.push_str("%25"),
                '/' => key.push_str("%2F"),
                '\\' => key.push_str("%5C"),
                other => key.push(other),
            }
        }
        key
    }
}

/// Source of tasks for a scheduler run.
pub trait TaskProvider {
    /// Discover tasks in discovery order. Called once per scheduler run.
    fn discover(&self) -> Result<Vec<Task>>;
}

/// Role for a task id given the producer allow-list.
///
/// Matching is on whole path components: `shared` matches `libs/shared`
/// but not `libs/preshared`.
pub fn role_for(id: &str, producers: &[String]) -> TaskRole {
    let id_path = Path::new(id);
    if producers
        .iter()
        .any(|suffix| !suffix.is_empty() && id_path.ends_with(suffix.trim_matches('/')))
    {
        TaskRole::Producer
    } else {
        TaskRole::Consumer
    }
}

/// Compile directory-name skip patterns.
pub fn build_skip_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            DevstrapError::ConfigError(format!("invalid skip pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| DevstrapError::ConfigError(format!("building skip patterns: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_suffix_matches_whole_components() {
        let producers = vec!["libs/shared".to_string(), "proto".to_string()];

        assert_eq!(role_for("libs/shared", &producers), TaskRole::Producer);
        assert_eq!(role_for("apis/proto", &producers), TaskRole::Producer);
        assert_eq!(role_for("libs/preshared", &producers), TaskRole::Consumer);
        assert_eq!(role_for("services/web", &producers), TaskRole::Consumer);
    }

    #[test]
    fn task_key_has_no_separators() {
        let task = Task::new("services/api/gateway", "/w", "true", TaskRole::Consumer);
        assert_eq!(task.key(), "services%2Fapi%2Fgateway");
    }

    #[test]
    fn keys_of_look_alike_ids_differ() {
        let ids = ["libs/a/b", "libs/a__b", "libs/a%2Fb", "libs\\a/b"];
        let keys: std::collections::HashSet<String> = ids
            .iter()
            .map(|id| Task::new(*id, "/w", "true", TaskRole::Consumer).key())
            .collect();
        assert_eq!(keys.len(), ids.len());
    }

    #[test]
    fn bad_skip_pattern_is_config_error() {
        let err = build_skip_set(&["[".to_string()]).unwrap_err();
        assert!(matches!(err, DevstrapError::ConfigError(_)));
    }
}
