//! Config file resolution and parsing
//!
//! Tests that touch LPP_CONFIG are marked #[serial] so they never run in
//! parallel with each other.

use std::env;
use std::fs;

use lpp_common::config::{load_config, resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use serial_test::serial;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_cli_path_wins_over_env() {
    let dir = TempDir::new().unwrap();
    let cli = write_config(&dir, "cli.toml", "[server]\nport = 6001\n");
    let from_env = write_config(&dir, "env.toml", "[server]\nport = 6002\n");
    env::set_var(CONFIG_ENV_VAR, &from_env);

    let config = load_config(Some(&cli)).unwrap().config;
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.server.port, 6001);
}

#[test]
#[serial]
fn test_env_var_used_without_cli() {
    let dir = TempDir::new().unwrap();
    let from_env = write_config(&dir, "env.toml", "[logging]\nlevel = \"debug\"\n");
    env::set_var(CONFIG_ENV_VAR, &from_env);

    let resolved = resolve_config_path(None).unwrap();
    let loaded = load_config(None).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(from_env.clone()));
    assert_eq!(loaded.source, Some(from_env));
    assert_eq!(loaded.config.logging.level, "debug");
    assert_eq!(loaded.config.server.port, 5000);
}

#[test]
#[serial]
fn test_explicit_missing_file_is_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    assert!(load_config(Some(&missing)).is_err());

    env::set_var(CONFIG_ENV_VAR, &missing);
    let result = load_config(None);
    env::remove_var(CONFIG_ENV_VAR);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_invalid_toml_is_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "bad.toml", "[server\nport = ");

    let err = load_config(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("bad.toml"));
}

#[test]
#[serial]
fn test_invalid_values_rejected_on_load() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "fraction.toml", "[training]\ntest_fraction = 1.5\n");

    assert!(load_config(Some(&path)).is_err());
}

#[test]
fn test_full_file() {
    let config: TomlConfig = toml::from_str(
        r#"
        artifacts_dir = "models"

        [server]
        host = "0.0.0.0"
        port = 8000

        [defaults]
        ram_gb = 8
        cpu = "i3"

        [cleaning]
        min_price = 2500
        junk_phrases = ["outlet"]
        "#,
    )
    .unwrap();

    assert_eq!(config.artifacts_dir, std::path::PathBuf::from("models"));
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.defaults.ram_gb, 8.0);
    assert_eq!(config.defaults.storage_gb, 512.0);
    assert_eq!(config.defaults.cpu, "i3");
    assert_eq!(config.defaults.gpu, "integrated");
    assert_eq!(config.cleaning.min_price, 2500.0);
    assert_eq!(config.cleaning.max_price, 300_000.0);
    assert_eq!(config.cleaning.junk_phrases, vec!["outlet".to_string()]);
    assert!(config.validate().is_ok());
}
