//! Error types for provisioner-sync.

use std::path::PathBuf;

use thiserror::Error;

use provisioner_core::{ConfigError, TransportError};
use provisioner_renderer::RenderError;

use crate::state::TriggerState;

/// All errors that can arise from planning, change detection and apply.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the document serializer.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An error from configuration loading.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A remote collaborator failed before a step could report an exit status.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk failure (missing role path, unreadable entry, loop).
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// YAML conversion of a document into a trigger value.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error (trigger state, secret hashing).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A remote step exited non-zero after exhausting its retries.
    #[error("remote step '{step}' failed with exit status {status}")]
    RemoteExecution { step: String, status: i32 },

    /// A step failed after the init step of the same apply went through.
    /// `progress` records what did complete; persist it so the next apply
    /// resumes instead of repeating finished steps.
    #[error("apply interrupted: {source}")]
    Interrupted {
        source: Box<SyncError>,
        progress: Box<TriggerState>,
    },
}

impl SyncError {
    /// State covering the steps that completed before the failure.
    pub fn progress(&self) -> Option<&TriggerState> {
        match self {
            SyncError::Interrupted { progress, .. } => Some(&**progress),
            _ => None,
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Walk`].
pub(crate) fn walk_err(path: impl Into<PathBuf>, source: walkdir::Error) -> SyncError {
    SyncError::Walk {
        path: path.into(),
        source,
    }
}
