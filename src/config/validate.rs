// src/config/validate.rs

use std::path::PathBuf;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TreeWatchError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TreeWatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.watch))
    }
}

impl ConfigFile {
    /// Replace the configured roots (e.g. with paths from the command line)
    /// and re-check them.
    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Result<Self> {
        validate_roots(&roots)?;
        self.watch.roots = roots;
        Ok(self)
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_roots(&cfg.watch.roots)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    // registration_policy is strongly typed and validated during
    // deserialization.
    if cfg.config.event_capacity == 0 {
        return Err(TreeWatchError::ConfigError(
            "[config].event_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

/// Roots must be distinct and must not nest: a root inside another root's
/// tree would be rejected as a duplicate watch, or not, depending on order.
fn validate_roots(roots: &[PathBuf]) -> Result<()> {
    for (i, a) in roots.iter().enumerate() {
        for b in roots.iter().skip(i + 1) {
            if a == b {
                return Err(TreeWatchError::ConfigError(format!(
                    "root {:?} is listed more than once",
                    a
                )));
            }
            if a.starts_with(b) || b.starts_with(a) {
                return Err(TreeWatchError::ConfigError(format!(
                    "roots {:?} and {:?} overlap; list only the outer one",
                    a, b
                )));
            }
        }
    }
    Ok(())
}
