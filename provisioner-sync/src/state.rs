//! Trigger state: what was last applied for a provisioner.
//!
//! Persists a [`TriggerState`] JSON document at `<state_dir>/<id>.json`.
//! Writes go to a `.tmp` sibling first and are renamed into place.
//!
//! Every function has two forms:
//! - `fn_at(dir: &Path, …)`: explicit state directory; used in tests
//! - `fn(…)`: resolves the directory via `PROVISIONER_STATE_DIR` / home

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use provisioner_core::config;
use provisioner_core::types::{ProvisionId, Trigger};

use crate::error::{io_err, SyncError};
use crate::plan::Plan;

/// Last recorded state of one provisioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerState {
    pub recorded_at: DateTime<Utc>,
    pub init_identity: String,
    /// Hash of the init script that was executed.
    pub init_hash: String,
    /// Role copy resource id -> directory hash at last sync.
    #[serde(default)]
    pub copies: BTreeMap<String, String>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

impl TriggerState {
    /// State describing `plan` as fully applied under `init_identity`.
    pub fn from_plan(plan: &Plan, init_identity: &str) -> Result<Self, SyncError> {
        Ok(Self {
            recorded_at: Utc::now(),
            init_identity: init_identity.to_string(),
            init_hash: plan.init_hash(),
            copies: plan
                .role_copies
                .iter()
                .map(|rc| (rc.resource_id.clone(), rc.hash.clone()))
                .collect(),
            triggers: plan.compose_triggers(init_identity)?,
        })
    }
}

/// `<dir>/<id>.json`: pure, no I/O.
pub fn state_path_at(dir: &Path, id: &ProvisionId) -> PathBuf {
    dir.join(format!("{}.json", id.0))
}

/// Load the recorded state, or `None` if nothing was recorded yet.
pub fn load_at(dir: &Path, id: &ProvisionId) -> Result<Option<TriggerState>, SyncError> {
    let path = state_path_at(dir, id);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(Some(serde_json::from_str(&contents)?))
}

/// `load_at` convenience wrapper.
pub fn load(id: &ProvisionId) -> Result<Option<TriggerState>, SyncError> {
    load_at(&config::default_state_dir()?, id)
}

/// Save the state atomically.
pub fn save_at(dir: &Path, id: &ProvisionId, state: &TriggerState) -> Result<(), SyncError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let path = state_path_at(dir, id);
    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    tracing::debug!("recorded state: {}", path.display());
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(id: &ProvisionId, state: &TriggerState) -> Result<(), SyncError> {
    save_at(&config::default_state_dir()?, id, state)
}
