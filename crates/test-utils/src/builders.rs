use devstrap::config::{ConfigFile, RawConfigFile, StepConfig};
use devstrap::discovery::{Task, TaskRole};
use devstrap::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
#[derive(Debug, Default)]
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: StepConfig) -> Self {
        self.config.steps.push(step);
        self
    }

    /// Override `[retry]`; tests usually pass zero delays.
    pub fn with_retry(mut self, max_attempts: u32, base_delay_secs: u64, jitter_max_ms: u64) -> Self {
        self.config.retry.max_attempts = max_attempts;
        self.config.retry.base_delay_secs = base_delay_secs;
        self.config.retry.jitter_max_ms = jitter_max_ms;
        self
    }

    pub fn with_checkpoint_path(mut self, path: &str) -> Self {
        self.config.checkpoint.path = path.to_string();
        self
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.config.verify.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_producer(mut self, suffix: &str) -> Self {
        self.config.verify.producers.push(suffix.to_string());
        self
    }

    pub fn with_verify_command(mut self, command: &str) -> Self {
        self.config.verify.command = command.to_string();
        self
    }

    pub fn include_root(mut self, include: bool) -> Self {
        self.config.verify.include_root = include;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("failed to build valid config from builder")
    }
}

/// Builder for one `[[step]]` entry.
#[derive(Debug)]
pub struct StepConfigBuilder {
    step: StepConfig,
}

impl StepConfigBuilder {
    pub fn new(name: &str, cmd: &str) -> Self {
        Self {
            step: StepConfig {
                name: name.to_string(),
                cmd: cmd.to_string(),
                degraded: false,
                retry: false,
                ready_cmd: None,
                ready_attempts: 30,
                ready_interval_secs: 2,
            },
        }
    }

    pub fn degraded(mut self) -> Self {
        self.step.degraded = true;
        self
    }

    pub fn retry(mut self) -> Self {
        self.step.retry = true;
        self
    }

    /// Poll `cmd` up to `attempts` times with no wait in between.
    pub fn ready(mut self, cmd: &str, attempts: u32) -> Self {
        self.step.ready_cmd = Some(cmd.to_string());
        self.step.ready_attempts = attempts;
        self.step.ready_interval_secs = 0;
        self
    }

    pub fn build(self) -> StepConfig {
        self.step
    }
}

/// A producer task whose directory is the current one.
pub fn producer(id: &str) -> Task {
    Task::new(id, ".", "true", TaskRole::Producer)
}

/// A consumer task whose directory is the current one.
pub fn consumer(id: &str) -> Task {
    Task::new(id, ".", "true", TaskRole::Consumer)
}
