// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::workflow::retry::RetryPolicy;

/// Configuration exactly as read from `Devstrap.toml`.
///
/// ```toml
/// [retry]
/// max_attempts = 3
/// base_delay_secs = 2
///
/// [[step]]
/// name = "check-tools"
/// cmd = "docker --version"
///
/// [[step]]
/// name = "smoke-test"
/// cmd = "./scripts/smoke.sh"
/// degraded = true
///
/// [verify]
/// producers = ["libs/shared"]
/// ```
///
/// Every section is optional. Convert into [`ConfigFile`] with `TryFrom` to
/// get a validated config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub retry: RetrySection,

    #[serde(default)]
    pub checkpoint: CheckpointSection,

    /// Bootstrap phases from `[[step]]`, in execution order.
    #[serde(default, rename = "step")]
    pub steps: Vec<StepConfig>,

    #[serde(default)]
    pub verify: VerifySection,
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(raw)`, so holders can rely on
/// unique step names, sane retry bounds and compilable skip patterns.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub retry: RetrySection,
    pub checkpoint: CheckpointSection,
    pub steps: Vec<StepConfig>,
    pub verify: VerifySection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            retry: raw.retry,
            checkpoint: raw.checkpoint,
            steps: raw.steps,
            verify: raw.verify,
        }
    }
}

/// `[retry]` section: parameters for every retried step.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,

    /// Upper bound for the random jitter added to each backoff delay.
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_secs() -> u64 {
    2
}

fn default_jitter_max_ms() -> u64 {
    1000
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
            jitter_max_ms: default_jitter_max_ms(),
        }
    }
}

impl RetrySection {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_secs(self.base_delay_secs),
            jitter_bound: Duration::from_millis(self.jitter_max_ms),
        }
    }
}

/// `[checkpoint]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointSection {
    /// Checkpoint file, relative to the workspace root.
    #[serde(default = "default_checkpoint_path")]
    pub path: String,
}

fn default_checkpoint_path() -> String {
    ".devstrap/checkpoints.toml".to_string()
}

impl Default for CheckpointSection {
    fn default() -> Self {
        Self {
            path: default_checkpoint_path(),
        }
    }
}

/// One `[[step]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    /// Unique step name; this is the checkpoint key.
    pub name: String,

    /// Shell command that performs the step.
    pub cmd: String,

    /// Failure is recorded as DEGRADED and the workflow keeps going.
    #[serde(default)]
    pub degraded: bool,

    /// Wrap `cmd` in the retry engine (for network/service dependent work).
    #[serde(default)]
    pub retry: bool,

    /// Optional probe polled after `cmd` succeeds until it exits 0.
    #[serde(default)]
    pub ready_cmd: Option<String>,

    #[serde(default = "default_ready_attempts")]
    pub ready_attempts: u32,

    #[serde(default = "default_ready_interval_secs")]
    pub ready_interval_secs: u64,
}

fn default_ready_attempts() -> u32 {
    30
}

fn default_ready_interval_secs() -> u64 {
    2
}

impl StepConfig {
    pub fn ready_interval(&self) -> Duration {
        Duration::from_secs(self.ready_interval_secs)
    }
}

/// `[verify]` section: task discovery and scheduling.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifySection {
    /// Category directories scanned for sub-projects, in scan order.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Whether the workspace root itself may be a task.
    #[serde(default = "default_true")]
    pub include_root: bool,

    /// Manifest file name looked up in each candidate directory.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Capability the manifest must declare (a `scripts` entry).
    #[serde(default = "default_capability")]
    pub capability: String,

    /// Command run in the task directory to verify it.
    #[serde(default = "default_command")]
    pub command: String,

    /// Path suffixes of tasks that other tasks build on.
    #[serde(default)]
    pub producers: Vec<String>,

    /// Directory-name globs never descended into.
    #[serde(default = "default_skip")]
    pub skip: Vec<String>,

    /// How deep below each category directory to look.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Consumer concurrency; defaults to the number of logical CPUs.
    #[serde(default)]
    pub jobs: Option<usize>,
}

fn default_categories() -> Vec<String> {
    vec!["libs".to_string(), "services".to_string(), "apis".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_manifest() -> String {
    "package.json".to_string()
}

fn default_capability() -> String {
    "verify".to_string()
}

fn default_command() -> String {
    "npm run verify".to_string()
}

fn default_skip() -> Vec<String> {
    ["node_modules", ".git", "target", "dist"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_depth() -> usize {
    2
}

impl Default for VerifySection {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            include_root: default_true(),
            manifest: default_manifest(),
            capability: default_capability(),
            command: default_command(),
            producers: Vec::new(),
            skip: default_skip(),
            max_depth: default_max_depth(),
            jobs: None,
        }
    }
}
