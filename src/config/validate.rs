// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::discovery::build_skip_set;
use crate::errors::{DevstrapError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DevstrapError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_retry(cfg)?;
    validate_steps(cfg)?;
    validate_verify(cfg)?;
    Ok(())
}

fn validate_retry(cfg: &RawConfigFile) -> Result<()> {
    if cfg.retry.max_attempts == 0 {
        return Err(DevstrapError::ConfigError(
            "[retry].max_attempts must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.checkpoint.path.trim().is_empty() {
        return Err(DevstrapError::ConfigError(
            "[checkpoint].path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_steps(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();

    for step in &cfg.steps {
        if step.name.trim().is_empty() {
            return Err(DevstrapError::ConfigError(
                "every [[step]] needs a non-empty `name`".to_string(),
            ));
        }
        if !seen.insert(step.name.as_str()) {
            return Err(DevstrapError::ConfigError(format!(
                "duplicate step name '{}'",
                step.name
            )));
        }
        if step.cmd.trim().is_empty() {
            return Err(DevstrapError::ConfigError(format!(
                "step '{}' has an empty `cmd`",
                step.name
            )));
        }
        if step.ready_cmd.is_some() && step.ready_attempts == 0 {
            return Err(DevstrapError::ConfigError(format!(
                "step '{}': `ready_attempts` must be >= 1",
                step.name
            )));
        }
    }

    Ok(())
}

fn validate_verify(cfg: &RawConfigFile) -> Result<()> {
    let verify = &cfg.verify;

    if verify.manifest.trim().is_empty() {
        return Err(DevstrapError::ConfigError(
            "[verify].manifest must not be empty".to_string(),
        ));
    }
    if verify.command.trim().is_empty() {
        return Err(DevstrapError::ConfigError(
            "[verify].command must not be empty".to_string(),
        ));
    }
    if verify.jobs == Some(0) {
        return Err(DevstrapError::ConfigError(
            "[verify].jobs must be >= 1 (got 0)".to_string(),
        ));
    }

    build_skip_set(&verify.skip)?;
    Ok(())
}
