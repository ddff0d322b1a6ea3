//! Contracts for the remote collaborators.
//!
//! Nothing in this workspace talks to a host directly. Callers plug in an
//! SSH executor and a directory sync mechanism through these traits.

use std::path::Path;

use crate::config::ConnectionConfig;
use crate::error::TransportError;

/// Outcome of running one script on the target host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub exit_status: i32,
    /// Stable identity of the executed step, as assigned by the executor.
    pub identity: String,
    pub stdout: String,
    pub stderr: String,
}

impl Execution {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Runs a script under a POSIX shell with `set -eu`, heredoc and
/// NUL-delimited `find`/`read` support.
pub trait RemoteExecutor {
    fn run(&self, connection: &ConnectionConfig, script: &str)
        -> Result<Execution, TransportError>;
}

/// Pushes a local directory tree under a remote path.
pub trait RemoteCopy {
    fn copy(
        &self,
        connection: &ConnectionConfig,
        local: &Path,
        remote: &str,
    ) -> Result<(), TransportError>;
}
