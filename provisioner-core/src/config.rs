//! YAML provisioner configuration.
//!
//! # File layout
//!
//! ```yaml
//! id: main
//! remote_path: /var/ansible        # optional
//! role_paths: [roles/web]          # relative to this file
//! clean: true                      # optional, default true
//! ansible_install_command: ...     # optional
//! requirements: { roles: [...] }   # optional, any YAML
//! roles: [{ role: web, vars: {...} }]
//! pre_tasks: [...]
//! tasks: [...]
//! post_tasks: [...]
//! vars: {...}
//! triggers: [...]                  # extra fingerprint values, verbatim
//! revision: "3"                    # bump to force a re-run
//! sensitive: [playbook]            # playbook | requirements | install_command
//! ```
//!
//! # Environment
//!
//! - `PROVISIONER_FORCE`: truthy value forces the run step on next evaluation.
//! - `PROVISIONER_STATE_DIR`: overrides `~/.provisioner/state`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{io_err, ConfigError};
use crate::types::{ProvisionId, Role, Secrecy};

pub const DEFAULT_REMOTE_PATH: &str = "/var/ansible";
pub const DEFAULT_CONFIG_FILE: &str = "provisioner.yaml";
pub const FORCE_ENV: &str = "PROVISIONER_FORCE";
pub const STATE_DIR_ENV: &str = "PROVISIONER_STATE_DIR";

/// Inputs that may be marked secret in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitiveField {
    Playbook,
    Requirements,
    InstallCommand,
}

/// How to reach the target host. Only handed through to collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<PathBuf>,
}

/// A single provisioner instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionerConfig {
    pub id: ProvisionId,
    #[serde(default = "default_remote_path")]
    pub remote_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionConfig>,
    #[serde(default)]
    pub role_paths: Vec<PathBuf>,
    #[serde(default = "default_clean")]
    pub clean: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ansible_install_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_tasks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_tasks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<Mapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default)]
    pub sensitive: Vec<SensitiveField>,
}

fn default_remote_path() -> String {
    DEFAULT_REMOTE_PATH.to_string()
}

fn default_clean() -> bool {
    true
}

impl ProvisionerConfig {
    /// Minimal configuration: default remote path, no roles, cleaning enabled.
    pub fn new(id: impl Into<ProvisionId>) -> Self {
        Self {
            id: id.into(),
            remote_path: default_remote_path(),
            connection: None,
            role_paths: vec![],
            clean: default_clean(),
            ansible_install_command: None,
            requirements: None,
            roles: None,
            pre_tasks: None,
            post_tasks: None,
            tasks: None,
            vars: None,
            triggers: None,
            revision: None,
            sensitive: vec![],
        }
    }

    pub fn secrecy(&self, field: SensitiveField) -> Secrecy {
        if self.sensitive.contains(&field) {
            Secrecy::Secret
        } else {
            Secrecy::Public
        }
    }

    /// Reject values that would produce broken shell text.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.0.trim().is_empty() {
            return Err(ConfigError::Invalid("`id` must not be empty".into()));
        }
        if self.remote_path.is_empty() {
            return Err(ConfigError::Invalid("`remote_path` must not be empty".into()));
        }
        if self.remote_path.contains('"') || self.id.0.contains('\'') {
            return Err(ConfigError::Invalid(
                "`remote_path` must not contain `\"` and `id` must not contain `'`".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load a configuration file.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with
/// path + line context) if malformed. Relative `role_paths` are resolved
/// against the file's directory.
pub fn load(path: &Path) -> Result<ProvisionerConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let mut config: ProvisionerConfig =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
    config.validate()?;

    let base = path.parent().unwrap_or(Path::new(""));
    config.role_paths = config
        .role_paths
        .into_iter()
        .map(|p| if p.is_relative() { base.join(p) } else { p })
        .collect();
    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// `1`, `true`, `yes`, `on` (any case) are truthy; everything else is not.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Whether `PROVISIONER_FORCE` is set to a truthy value.
pub fn force_from_env() -> bool {
    std::env::var(FORCE_ENV)
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

/// `<home>/.provisioner/state`: pure, no I/O.
pub fn state_dir_at(home: &Path) -> PathBuf {
    home.join(".provisioner").join("state")
}

/// `PROVISIONER_STATE_DIR`, falling back to `~/.provisioner/state`.
pub fn default_state_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(STATE_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| state_dir_at(&home))
        .ok_or(ConfigError::HomeNotFound)
}
