// src/discovery/workspace.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};

use globset::GlobSet;
use tracing::{debug, info, warn};

use crate::config::VerifySection;
use crate::discovery::manifest::{ManifestReader, PackageJsonManifest};
use crate::discovery::{build_skip_set, role_for, Task, TaskProvider, TaskRole};
use crate::errors::Result;
use crate::fs::FileSystem;

/// Finds tasks under the workspace's category directories (and optionally
/// the root itself).
///
/// A directory is a task iff it holds the manifest and the manifest declares
/// the capability. Qualifying directories are not descended into further;
/// directories matching a skip pattern are never entered.
pub struct WorkspaceTaskProvider<F: FileSystem> {
    fs: F,
    root: PathBuf,
    settings: VerifySection,
    skip: GlobSet,
    reader: Box<dyn ManifestReader>,
}

impl<F: FileSystem> fmt::Debug for WorkspaceTaskProvider<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceTaskProvider")
            .field("root", &self.root)
            .field("categories", &self.settings.categories)
            .field("reader", &self.reader)
            .finish_non_exhaustive()
    }
}

impl<F: FileSystem> WorkspaceTaskProvider<F> {
    pub fn new(fs: F, root: impl Into<PathBuf>, settings: &VerifySection) -> Result<Self> {
        Ok(Self {
            fs,
            root: root.into(),
            settings: settings.clone(),
            skip: build_skip_set(&settings.skip)?,
            reader: Box::new(PackageJsonManifest),
        })
    }

    /// Swap the manifest parser (e.g. for non-npm workspaces).
    pub fn with_reader(mut self, reader: impl ManifestReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    fn scan(&self, dir: &Path, depth: usize, out: &mut Vec<Task>) {
        let entries = match self.fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "cannot list directory; skipping");
                return;
            }
        };

        for entry in entries {
            if !self.fs.is_dir(&entry) || self.is_skipped(&entry) {
                continue;
            }

            if self.qualifies(&entry) {
                out.push(self.task_for(&entry));
            } else if depth < self.settings.max_depth {
                self.scan(&entry, depth + 1, out);
            }
        }
    }

    fn is_skipped(&self, dir: &Path) -> bool {
        let skipped = dir
            .file_name()
            .is_some_and(|name| self.skip.is_match(Path::new(name)));
        if skipped {
            debug!(dir = %dir.display(), "skip pattern matched; not descending");
        }
        skipped
    }

    fn qualifies(&self, dir: &Path) -> bool {
        let manifest = dir.join(&self.settings.manifest);
        if !self.fs.is_file(&manifest) {
            return false;
        }

        let contents = match self.fs.read_to_string(&manifest) {
            Ok(c) => c,
            Err(err) => {
                warn!(manifest = %manifest.display(), error = %err, "cannot read manifest; ignoring directory");
                return false;
            }
        };

        match self.reader.declares(&contents, &self.settings.capability) {
            Ok(declared) => {
                if !declared {
                    debug!(
                        manifest = %manifest.display(),
                        capability = %self.settings.capability,
                        "manifest lacks capability; ignoring directory"
                    );
                }
                declared
            }
            Err(err) => {
                warn!(manifest = %manifest.display(), error = %err, "unparsable manifest; ignoring directory");
                false
            }
        }
    }

    fn task_for(&self, dir: &Path) -> Task {
        let id = self.id_for(dir);
        let role = role_for(&id, &self.settings.producers);
        debug!(task = %id, %role, "discovered task");
        Task::new(id, dir, self.settings.command.clone(), role)
    }

    fn id_for(&self, dir: &Path) -> String {
        let relative: Vec<String> = dir
            .strip_prefix(&self.root)
            .unwrap_or(dir)
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if relative.is_empty() {
            self.root_id()
        } else {
            relative.join("/")
        }
    }

    fn root_id(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string())
    }
}

impl<F: FileSystem> TaskProvider for WorkspaceTaskProvider<F> {
    fn discover(&self) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();

        for category in &self.settings.categories {
            let dir = self.root.join(category);
            if !self.fs.is_dir(&dir) {
                debug!(category = %category, "category directory missing; skipping");
                continue;
            }
            self.scan(&dir, 1, &mut tasks);
        }

        if self.settings.include_root && self.qualifies(&self.root) {
            tasks.push(self.task_for(&self.root));
        }

        info!(
            total = tasks.len(),
            producers = tasks.iter().filter(|t| t.role == TaskRole::Producer).count(),
            "task discovery finished"
        );
        Ok(tasks)
    }
}
