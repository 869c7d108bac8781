// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// Relative `[watch].roots` are resolved against the directory holding the
/// file. No semantic validation happens here; use [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let mut config: RawConfigFile = toml::from_str(&contents)?;

    let base = config_root_dir(path);
    for root in config.watch.roots.iter_mut() {
        if root.is_relative() {
            *root = base.join(&*root);
        }
    }

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `Treewatch.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Treewatch.toml")
}

/// Directory that relative roots are resolved against.
///
/// A bare filename like "Treewatch.toml" has an empty parent; fall back to
/// the current working directory then.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
