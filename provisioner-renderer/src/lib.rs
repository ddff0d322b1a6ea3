//! # provisioner-renderer
//!
//! Text generation for the remote host: idempotent shell scripts
//! ([`commands`]) and the playbook document ([`playbook`]).

pub mod commands;
pub mod error;
pub mod playbook;

pub use commands::{
    build_clean_command, build_file_write_command, build_remote_path_init_command,
    build_run_command, concat_commands, RunCommand, BACKOFF_FUNCTION,
};
pub use error::RenderError;
pub use playbook::{make_playbook_output, to_yaml, PlaybookInputs};
