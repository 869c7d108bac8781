// src/logging.rs

//! Log setup for the `treewatch` binary.
//!
//! Level selection, first match wins:
//! 1. `--log-level`
//! 2. `TREEWATCH_LOG`, which takes full `EnvFilter` directives, e.g.
//!    `treewatch=debug,notify=warn`
//! 3. `info`
//!
//! Logs go to stderr so stdout stays one line per event.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "TREEWATCH_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV).ok().as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(directive(level)));
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => {
            EnvFilter::try_new(spec).with_context(|| format!("invalid {LOG_ENV}={spec:?}"))
        }
        None => Ok(EnvFilter::new("info")),
    }
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_wins_over_env() {
        let filter = build_filter(Some(LogLevel::Trace), Some("error")).unwrap();
        assert_eq!(filter.to_string().to_lowercase(), "trace");
    }

    #[test]
    fn env_directives_are_used_verbatim() {
        let filter = build_filter(None, Some(" treewatch=debug ")).unwrap();
        assert_eq!(filter.to_string().to_lowercase(), "treewatch=debug");
    }

    #[test]
    fn empty_env_falls_back_to_info() {
        for env in [Some(""), None] {
            let filter = build_filter(None, env).unwrap();
            assert_eq!(filter.to_string().to_lowercase(), "info");
        }
    }

    #[test]
    fn malformed_env_is_reported() {
        assert!(build_filter(None, Some("treewatch=loud")).is_err());
    }
}
