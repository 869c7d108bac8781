use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// What `watch` does when a directory below the requested root cannot be
/// registered with the primitive watcher.
///
/// - `Strict`: undo everything the call registered and report the first
///   failure (default).
/// - `BestEffort`: log the failure, skip that directory's subtree and carry
///   on with the rest of the walk.
///
/// Directories discovered later by the dispatcher are always registered
/// best-effort; there is no caller to report a failure to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    Strict,
    BestEffort,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        RegistrationPolicy::Strict
    }
}

impl FromStr for RegistrationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "strict" => Ok(RegistrationPolicy::Strict),
            "best_effort" => Ok(RegistrationPolicy::BestEffort),
            other => Err(format!(
                "invalid registration_policy: {other} (expected \"strict\" or \"best_effort\")"
            )),
        }
    }
}

impl fmt::Display for RegistrationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationPolicy::Strict => f.write_str("strict"),
            RegistrationPolicy::BestEffort => f.write_str("best_effort"),
        }
    }
}

/// Whether an invalidation may remove a root entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidateMode {
    /// Triggered by a raw event. Roots are never removed.
    Implicit,
    /// Triggered by `remove_watch`. The target itself is removed even if it
    /// is (or was) a root.
    Explicit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_both_spellings() {
        assert_eq!("strict".parse(), Ok(RegistrationPolicy::Strict));
        assert_eq!("best-effort".parse(), Ok(RegistrationPolicy::BestEffort));
        assert_eq!(" Best_Effort ".parse(), Ok(RegistrationPolicy::BestEffort));
        assert!("sometimes".parse::<RegistrationPolicy>().is_err());
    }

    #[test]
    fn policy_display_matches_config_spelling() {
        assert_eq!(RegistrationPolicy::BestEffort.to_string(), "best_effort");
        assert_eq!(RegistrationPolicy::default(), RegistrationPolicy::Strict);
    }
}
