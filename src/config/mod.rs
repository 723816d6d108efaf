// src/config/mod.rs

//! Configuration loading and validation for devstrap.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate step definitions and verify settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{
    CheckpointSection, ConfigFile, RawConfigFile, RetrySection, StepConfig, VerifySection,
};
