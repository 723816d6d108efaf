#![allow(dead_code)]

pub use devstrap_test_utils::init_tracing;

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A throwaway workspace on the real filesystem.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp workspace"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write workspace file");
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap_or_default()
    }

    /// A sub-project whose `package.json` declares a `verify` script.
    pub fn add_project(&self, relative: &str) {
        self.write(&format!("{relative}/package.json"), &package_json(true));
    }
}

/// `package.json` contents, with or without a `verify` script.
pub fn package_json(with_verify: bool) -> String {
    if with_verify {
        r#"{ "name": "pkg", "scripts": { "build": "tsc", "verify": "npm test" } }"#.to_string()
    } else {
        r#"{ "name": "pkg", "scripts": { "build": "tsc" } }"#.to_string()
    }
}
