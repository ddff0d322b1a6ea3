//! Error types for provisioner-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from loading a provisioner configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, unreadable file, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse provisioner config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration file did not exist at the expected path.
    #[error("provisioner config not found at {path}")]
    NotFound { path: PathBuf },

    /// A field parsed but its value cannot be used.
    #[error("invalid provisioner config: {0}")]
    Invalid(String),

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.provisioner/`.
    #[error("cannot determine home directory; set $HOME or {}", crate::config::STATE_DIR_ENV)]
    HomeNotFound,
}

/// Failure reported by a remote collaborator (executor or copier).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {host} failed: {reason}")]
    Connection { host: String, reason: String },

    #[error("copy of {local} to {remote} failed: {reason}")]
    Copy {
        local: PathBuf,
        remote: String,
        reason: String,
    },

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
