use super::*;
use std::fs;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert!(config.connections.is_empty());
    assert_eq!(config.connection, "default");
    assert_eq!(config.precheck, "allow");
    assert!(!config.dry_run);
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
connections:
  default:
    path: ./warehouse.duckdb
  scratch:
    path: ":memory:"
connection: scratch
precheck: condition
dry_run: true
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.connections.len(), 2);
    assert_eq!(config.connection, "scratch");
    assert_eq!(config.precheck, "condition");
    assert!(config.dry_run);
    assert_eq!(
        config.get_connection("default").unwrap().path,
        "./warehouse.duckdb"
    );
}

#[test]
fn test_unknown_keys_rejected() {
    assert!(serde_yaml::from_str::<Config>("dryrun: true").is_err());
}

#[test]
fn test_default_connection_falls_back_to_memory() {
    let config = Config::default();
    assert_eq!(config.get_connection("default").unwrap().path, ":memory:");
}

#[test]
fn test_unknown_connection_lists_available() {
    let config: Config =
        serde_yaml::from_str("connections:\n  main: {path: a.duckdb}\n  aux: {path: b.duckdb}")
            .unwrap();
    let err = config.get_connection("missing").unwrap_err();
    assert!(err.to_string().contains("aux, main"));
}

#[test]
fn test_load_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tidemark.yml"), "precheck: exception\n").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.precheck, "exception");
}

#[test]
fn test_load_from_dir_yaml_extension() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tidemark.yaml"), "dry_run: true\n").unwrap();
    assert!(Config::load_from_dir(dir.path()).unwrap().dry_run);
}

#[test]
fn test_load_from_dir_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_empty_precheck_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tidemark.yml");
    fs::write(&path, "precheck: ''\n").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}
