// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `devstrap`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "devstrap",
    version,
    about = "Resumable workspace bootstrap and staged cross-project verification.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, global = true, value_name = "PATH", default_value = "Devstrap.toml")]
    pub config: String,

    /// Workspace root. Defaults to the directory containing the config file.
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEVSTRAP_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the bootstrap workflow, resuming after the last completed step.
    Bootstrap,
    /// Show the checkpoint state of every recorded step.
    Status,
    /// Clear all checkpoints so the next bootstrap starts from scratch.
    Reset,
    /// Discover sub-projects and run their verify action in stages.
    Verify {
        /// Maximum number of consumer tasks running at once.
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<usize>,

        /// Print discovered tasks and their roles without running anything.
        #[arg(long)]
        list: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
