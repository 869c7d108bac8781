// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::RegistrationPolicy;
use crate::watcher::WatcherOptions;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// registration_policy = "strict"
/// event_capacity = 1
///
/// [watch]
/// roots = ["src", "docs"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"strict"` (default) or `"best_effort"`.
    ///
    /// - `"strict"`: a directory that cannot be registered fails the whole
    ///   `watch` call and nothing stays registered.
    /// - `"best_effort"`: that directory's subtree is skipped with a warning.
    #[serde(default)]
    pub registration_policy: RegistrationPolicy,

    /// How many events (and, separately, errors) may wait for the consumer
    /// before the dispatcher blocks.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            registration_policy: RegistrationPolicy::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchSection {
    /// Directories to watch recursively. Relative paths are resolved
    /// against the config file's directory by the loader.
    #[serde(default)]
    pub roots: Vec<PathBuf>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub watch: WatchSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, watch: WatchSection) -> Self {
        Self { config, watch }
    }

    pub fn watcher_options(&self) -> WatcherOptions {
        WatcherOptions {
            policy: self.config.registration_policy,
            event_capacity: self.config.event_capacity,
        }
    }
}
