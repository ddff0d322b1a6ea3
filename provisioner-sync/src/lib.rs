//! # provisioner-sync
//!
//! Change detection and step orchestration.
//!
//! Call [`Plan::build`] to compute documents, scripts, role copies and the
//! trigger fingerprint for a configuration, [`detect_changes`] to compare it
//! with the recorded [`TriggerState`], and [`apply`] to drive the remote
//! steps through a [`provisioner_core::RemoteExecutor`] and
//! [`provisioner_core::RemoteCopy`].

pub mod diff;
pub mod error;
pub mod hasher;
pub mod pipeline;
pub mod plan;
pub mod roles;
pub mod state;
pub mod triggers;

pub use diff::{detect_changes, diff_triggers, ChangeReport, StepChange};
pub use error::SyncError;
pub use hasher::{directory_hash, file_hash, string_hash};
pub use pipeline::{apply, ApplyOutcome, StepOutcome};
pub use plan::{build_init_script, Plan, PlanOptions};
pub use roles::{gather_roles_files, make_role_copies, RoleFiles};
pub use state::TriggerState;
pub use triggers::{make_triggers, TriggerInputs};
