// tests/config_loading.rs

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use tempfile::{tempdir, NamedTempFile};

use treewatch::config::{load_and_validate, load_from_path};
use treewatch::errors::TreeWatchError;
use treewatch::RegistrationPolicy;

type TestResult = Result<(), Box<dyn Error>>;

fn config_file(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[test]
fn full_config_is_loaded_and_relative_roots_resolved() -> TestResult {
    let file = config_file(
        r#"
[config]
registration_policy = "best_effort"
event_capacity = 16

[watch]
roots = ["src", "/abs/docs"]
"#,
    )?;

    let cfg = load_and_validate(file.path())?;
    let base = file.path().parent().expect("temp file has a parent");

    assert_eq!(cfg.config.registration_policy, RegistrationPolicy::BestEffort);
    assert_eq!(cfg.config.event_capacity, 16);
    assert_eq!(
        cfg.watch.roots,
        vec![base.join("src"), PathBuf::from("/abs/docs")]
    );

    let options = cfg.watcher_options();
    assert_eq!(options.policy, RegistrationPolicy::BestEffort);
    assert_eq!(options.event_capacity, 16);
    Ok(())
}

#[test]
fn empty_file_gives_defaults() -> TestResult {
    let file = config_file("")?;
    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.config.registration_policy, RegistrationPolicy::Strict);
    assert_eq!(cfg.config.event_capacity, 1);
    assert!(cfg.watch.roots.is_empty());
    Ok(())
}

#[test]
fn unknown_policy_is_a_toml_error() -> TestResult {
    let file = config_file("[config]\nregistration_policy = \"sometimes\"\n")?;
    let err = load_from_path(file.path()).unwrap_err();
    assert!(matches!(err, TreeWatchError::TomlError(_)), "{err:?}");
    Ok(())
}

#[test]
fn zero_capacity_is_rejected() -> TestResult {
    let file = config_file("[config]\nevent_capacity = 0\n")?;

    // Parses fine; validation is what refuses it.
    load_from_path(file.path())?;
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, TreeWatchError::ConfigError(ref msg) if msg.contains("event_capacity")));
    Ok(())
}

#[test]
fn nested_roots_are_rejected() -> TestResult {
    let file = config_file("[watch]\nroots = [\"/w\", \"/w/a\"]\n")?;
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, TreeWatchError::ConfigError(ref msg) if msg.contains("overlap")));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() -> TestResult {
    let dir = tempdir()?;
    let err = load_and_validate(dir.path().join("Treewatch.toml")).unwrap_err();
    assert!(matches!(err, TreeWatchError::IoError(_)), "{err:?}");
    Ok(())
}

#[test]
fn cli_roots_replace_configured_ones() -> TestResult {
    let file = config_file("[watch]\nroots = [\"/w\"]\n")?;
    let cfg = load_and_validate(file.path())?;

    let cfg = cfg.with_roots(vec![PathBuf::from("/x"), PathBuf::from("/y")])?;
    assert_eq!(cfg.watch.roots, vec![PathBuf::from("/x"), PathBuf::from("/y")]);

    let err = cfg
        .with_roots(vec![PathBuf::from("/x"), PathBuf::from("/x")])
        .unwrap_err();
    assert!(matches!(err, TreeWatchError::ConfigError(_)));
    Ok(())
}
