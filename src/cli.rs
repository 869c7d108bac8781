// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;
use crate::types::RegistrationPolicy;

/// Command-line arguments for `treewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "treewatch",
    version,
    about = "Watch directory trees recursively and print every change.",
    long_about = None
)]
pub struct CliArgs {
    /// Directories to watch. Overrides `[watch].roots` from the config.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Path to the config file (TOML).
    ///
    /// Optional when PATHs are given on the command line.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// What to do when a subdirectory cannot be watched.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub policy: Option<PolicyArg>,

    /// Print the watch tree after every event.
    #[arg(long)]
    pub dump: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TREEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config and roots, print them, and exit without watching.
    #[arg(long)]
    pub dry_run: bool,
}

/// Registration policy as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum PolicyArg {
    Strict,
    BestEffort,
}

impl From<PolicyArg> for RegistrationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Strict => RegistrationPolicy::Strict,
            PolicyArg::BestEffort => RegistrationPolicy::BestEffort,
        }
    }
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
