// src/errors.rs

//! Crate-wide error type and exit-code mapping.

use thiserror::Error;

/// Exit status used when the process is stopped by Ctrl-C / SIGTERM.
pub const INTERRUPT_EXIT_CODE: i32 = 130;

#[derive(Error, Debug)]
pub enum DevstrapError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// A shell command ran to completion with a non-zero exit status.
    #[error("command `{command}` exited with code {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("`{action}` still failing after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        action: String,
        attempts: u32,
        source: Box<DevstrapError>,
    },

    #[error("`{probe}` did not report ready after {attempts} poll(s)")]
    NotReady { probe: String, attempts: u32 },

    #[error("step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        source: Box<DevstrapError>,
    },

    #[error("interrupted while running {}", .step.as_deref().unwrap_or("(no step)"))]
    Interrupted { step: Option<String> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DevstrapError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, DevstrapError::Interrupted { .. })
    }

    /// Process exit status for this error.
    ///
    /// Command failures keep the command's own exit code so automation can
    /// tell failures apart; wrapped errors defer to their source.
    pub fn exit_code(&self) -> i32 {
        match self {
            DevstrapError::CommandFailed { code, .. } if *code > 0 => *code,
            DevstrapError::RetriesExhausted { source, .. }
            | DevstrapError::StepFailed { source, .. } => source.exit_code(),
            DevstrapError::Interrupted { .. } => INTERRUPT_EXIT_CODE,
            _ => 1,
        }
    }

    /// The innermost command line responsible for this error, if any.
    pub fn failing_command(&self) -> Option<&str> {
        match self {
            DevstrapError::CommandFailed { command, .. } => Some(command),
            DevstrapError::NotReady { probe, .. } => Some(probe),
            DevstrapError::RetriesExhausted { source, .. }
            | DevstrapError::StepFailed { source, .. } => source.failing_command(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DevstrapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failure_keeps_command_exit_code() {
        let err = DevstrapError::StepFailed {
            step: "start-services".to_string(),
            source: Box::new(DevstrapError::RetriesExhausted {
                action: "docker compose up -d".to_string(),
                attempts: 3,
                source: Box::new(DevstrapError::CommandFailed {
                    command: "docker compose up -d".to_string(),
                    code: 14,
                }),
            }),
        };

        assert_eq!(err.exit_code(), 14);
        assert_eq!(err.failing_command(), Some("docker compose up -d"));
    }

    #[test]
    fn signal_killed_command_maps_to_generic_failure() {
        let err = DevstrapError::CommandFailed {
            command: "sleep 100".to_string(),
            code: -1,
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn interrupt_has_distinct_exit_code() {
        let err = DevstrapError::Interrupted {
            step: Some("install".to_string()),
        };
        assert_eq!(err.exit_code(), INTERRUPT_EXIT_CODE);
        assert!(err.to_string().contains("install"));
    }
}
