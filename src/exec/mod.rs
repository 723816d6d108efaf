// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] builds shell commands and waits on them with cancellation
//!   (used by bootstrap steps and readiness probes).
//! - [`backend`] defines the `TaskExecutor` trait the scheduler dispatches
//!   verify tasks to.
//! - [`task_runner`] is the production `TaskExecutor`: one OS process per
//!   task with output captured into the scratch workspace.

pub mod backend;
pub mod command;
pub mod task_runner;

pub use backend::{TaskExecutor, TaskOutcome};
pub use command::{probe, run_shell, shell_command, wait_or_cancel, CommandExit};
pub use task_runner::ProcessExecutor;
