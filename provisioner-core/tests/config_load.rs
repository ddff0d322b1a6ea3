//! Config loading error messages and path resolution.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use provisioner_core::{config, ConfigError, SensitiveField};
use std::path::PathBuf;

#[test]
fn load_missing_file_returns_not_found() {
    let dir = assert_fs::TempDir::new().unwrap();
    let err = config::load(&dir.path().join("provisioner.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("provisioner.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().unwrap();
    let file = dir.child("provisioner.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .unwrap();

    let err = config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("provisioner.yaml"));
}

#[test]
fn load_rejects_empty_id() {
    let dir = assert_fs::TempDir::new().unwrap();
    let file = dir.child("provisioner.yaml");
    file.write_str("id: \"\"\n").unwrap();

    let err = config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
}

#[test]
fn load_resolves_relative_role_paths_against_config_dir() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("roles/web/tasks/main.yml")
        .write_str("- debug: msg=hi\n")
        .unwrap();
    let file = dir.child("provisioner.yaml");
    file.write_str(
        "id: web\n\
         role_paths: [roles/web, /abs/roles/db]\n\
         roles:\n  - role: web\n    vars:\n      port: 80\n\
         requirements:\n  collections: [community.general]\n\
         sensitive: [requirements]\n",
    )
    .unwrap();
    file.assert(predicate::path::exists());

    let config = config::load(file.path()).unwrap();
    assert_eq!(config.id.0, "web");
    assert_eq!(config.remote_path, "/var/ansible");
    assert_eq!(config.role_paths[0], dir.path().join("roles/web"));
    assert_eq!(config.role_paths[1], PathBuf::from("/abs/roles/db"));
    assert!(config.role_paths[0].join("tasks/main.yml").exists());

    let roles = config.roles.unwrap();
    assert_eq!(roles[0].name(), Some("web"));
    assert!(config.requirements.is_some());
    assert!(config.sensitive.contains(&SensitiveField::Requirements));
}
