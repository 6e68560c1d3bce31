//! Tests for config module

use std::path::PathBuf;

use entclust::cluster::Strategy;
use entclust::config::Config;
use serial_test::serial;
use tempfile::TempDir;

const ENV_VARS: [&str; 7] = [
    "ENTCLUST_INPUT",
    "ENTCLUST_OUTPUT_DIR",
    "ENTCLUST_STRATEGY",
    "ENTCLUST_SEED",
    "ENTCLUST_REQUIRE_NAMES",
    "ENTCLUST_LOG_LEVEL",
    "ENTCLUST_LOG_FORMAT",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

#[test]
fn test_config_file_exists() {
    let config_path = std::path::Path::new("config.toml");
    assert!(
        config_path.exists(),
        "config.toml should exist in project root"
    );
}

#[test]
fn test_shipped_config_parses_and_validates() {
    let config = Config::from_file(std::path::Path::new("config.toml")).unwrap();
    config.validate().unwrap();

    assert_eq!(config.input.paths, vec![PathBuf::from("data/entities")]);
    assert_eq!(config.output.dir, PathBuf::from("output"));
    assert_eq!(config.clustering.strategy, Strategy::Layered);
    assert_eq!(config.clustering.allowed_type_prefixes, ["GPE", "LOC", "ORG", "PER"]);
    assert_eq!(config.clustering.geo_loc_label, "GeoLoc");
    assert_eq!(config.clustering.seed, None);
}

#[test]
fn test_from_file_reports_parse_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[clustering]\nstrategy = \"sideways\"\n").unwrap();

    let err = Config::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML config file"));
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    std::env::set_var("ENTCLUST_OUTPUT_DIR", "/tmp/entclust-out");
    std::env::set_var("ENTCLUST_STRATEGY", "legacy");
    std::env::set_var("ENTCLUST_SEED", "42");
    std::env::set_var("ENTCLUST_REQUIRE_NAMES", "false");
    std::env::set_var("ENTCLUST_LOG_FORMAT", "json");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.output.dir, PathBuf::from("/tmp/entclust-out"));
    assert_eq!(config.clustering.strategy, Strategy::Baseline);
    assert_eq!(config.clustering.seed, Some(42));
    assert!(!config.clustering.require_names);
    assert_eq!(config.logging.format, "json");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_env_rejects_bad_values() {
    clear_env();
    std::env::set_var("ENTCLUST_SEED", "not-a-number");
    let result = Config::from_env();
    clear_env();
    assert!(result.is_err());

    std::env::set_var("ENTCLUST_STRATEGY", "sideways");
    let result = Config::from_env();
    clear_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_env_defaults() {
    clear_env();
    let config = Config::from_env().unwrap();
    assert!(config.input.paths.is_empty());
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.clustering.cluster_id_suffix_len, 10);
}
