//! Provisioner core library: domain types, configuration, collaborator contracts.
//!
//! - [`types`]: newtypes, secrecy wrapper, playbook document, role copies
//! - [`config`]: YAML configuration and environment flags
//! - [`transport`]: remote executor / copy traits
//! - [`error`]: [`ConfigError`], [`TransportError`]

pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use config::{ConnectionConfig, ProvisionerConfig, SensitiveField};
pub use error::{ConfigError, TransportError};
pub use transport::{Execution, RemoteCopy, RemoteExecutor};
pub use types::{
    Play, Playbook, ProvisionId, Role, RoleCopy, RoleFile, RoleFileKind, Secrecy, Sensitive,
    Trigger,
};
