// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeWatchError {
    #[error("cannot watch path twice: {0:?}")]
    DuplicateWatch(PathBuf),

    #[error("cannot remove unknown watch: {0:?}")]
    UnknownWatch(PathBuf),

    #[error("failed to register watch on {path:?}: {source}")]
    Registration {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to unregister watch on {path:?}: {source}")]
    Unregistration {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("watcher has been closed")]
    Closed,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TreeWatchError>;
