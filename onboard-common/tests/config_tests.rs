//! Tests for bootstrap configuration and root folder resolution
//!
//! Note: Uses serial_test to prevent environment variable races. Tests that
//! touch ONBOARD_ROOT_FOLDER are marked #[serial].

use onboard_common::config::{
    resolve_database_path, resolve_root_folder, ConfigSource, TomlConfig, DATABASE_FILE_NAME,
    ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn test_defaults_when_sections_missing() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let config = TomlConfig::load(&path).expect("empty file is valid");
    assert!(config.root_folder.is_none());
    assert!(config.database_path.is_none());
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.analytics.default_interval_minutes, 60);
    assert_eq!(config.analytics.utc_offset_minutes, 0);
}

#[test]
fn test_full_config_parses() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
root_folder = "/srv/onboard"
database_path = "/srv/onboard/cohort.db"

[logging]
level = "debug"

[analytics]
default_interval_minutes = 30
utc_offset_minutes = 330
"#,
    );

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/onboard")));
    assert_eq!(config.database_path, Some(PathBuf::from("/srv/onboard/cohort.db")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.analytics.default_interval_minutes, 30);
    assert_eq!(config.analytics.utc_offset_minutes, 330);
}

#[test]
fn test_out_of_range_offset_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[analytics]\nutc_offset_minutes = 900\n");

    let err = TomlConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("utc_offset_minutes"), "got: {}", err);
}

#[test]
fn test_malformed_toml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "root_folder = [unterminated");

    let err = TomlConfig::load(&path).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"), "got: {}", err);
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    assert!(TomlConfig::load_with_source(Some(&missing)).is_err());
}

#[test]
fn test_missing_default_file_reports_defaults_source() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("onboard").join("config.toml");

    let (config, source) = TomlConfig::load_from_candidate(Some(missing.clone())).unwrap();
    assert_eq!(source, ConfigSource::Missing(missing));
    assert!(source.is_default());
    assert_eq!(config.logging.level, "info");

    let (_, source) = TomlConfig::load_from_candidate(None).unwrap();
    assert_eq!(source, ConfigSource::NoConfigDir);
}

#[test]
fn test_existing_file_reports_file_source() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[logging]\nlevel = \"warn\"\n");

    let (config, source) = TomlConfig::load_from_candidate(Some(path.clone())).unwrap();
    assert_eq!(source, ConfigSource::File(path.clone()));
    assert!(!source.is_default());
    assert_eq!(config.logging.level, "warn");

    let (_, explicit) = TomlConfig::load_with_source(Some(&path)).unwrap();
    assert_eq!(explicit, ConfigSource::File(path));
}

#[test]
#[serial]
fn test_cli_argument_wins_over_everything() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };

    let resolved = resolve_root_folder(Some(Path::new("/from/cli")), &config);
    assert_eq!(resolved, PathBuf::from("/from/cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_environment_wins_over_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };

    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/from/env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_toml_used_without_cli_or_environment() {
    env::remove_var(ROOT_FOLDER_ENV);
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };

    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/from/toml"));
}

#[test]
#[serial]
fn test_compiled_default_is_non_empty() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolved = resolve_root_folder(None, &TomlConfig::default());
    assert!(!resolved.as_os_str().is_empty());
    assert!(resolved.to_string_lossy().contains("onboard"));
}

#[test]
fn test_database_path_resolution_order() {
    let root = Path::new("/data/root");
    let mut config = TomlConfig::default();

    assert_eq!(
        resolve_database_path(None, root, &config),
        root.join(DATABASE_FILE_NAME)
    );

    config.database_path = Some(PathBuf::from("/data/custom.db"));
    assert_eq!(
        resolve_database_path(None, root, &config),
        PathBuf::from("/data/custom.db")
    );

    assert_eq!(
        resolve_database_path(Some(Path::new("/cli.db")), root, &config),
        PathBuf::from("/cli.db")
    );
}
