//! Trigger fingerprint composition.
//!
//! Token order (changing it invalidates every recorded fingerprint):
//! 1. caller-supplied triggers, verbatim
//! 2. `remote-path:<path>`
//! 3. requirements value, or `requirements-secret:<sha256>`
//! 4. playbook value, or `playbook-secret:<sha256>`
//! 5. `init-id:<identity>`, then init script text or `init-cmd-secret:<sha256>`
//! 6. `<resource_id>:<hash>` per role copy
//! 7. `revision:<stamp>` when configured
//! 8. `forced-at:<timestamp>` when forced

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_yaml::Value;

use provisioner_core::types::{Playbook, RoleCopy, Sensitive, Trigger};

use crate::error::SyncError;
use crate::hasher::string_hash;

/// Everything the run step's fingerprint depends on.
#[derive(Debug, Clone)]
pub struct TriggerInputs<'a> {
    pub remote_path: &'a str,
    pub input_triggers: Option<&'a [Value]>,
    pub requirements: Option<Sensitive<&'a Value>>,
    pub document: Sensitive<&'a Playbook>,
    pub init_identity: &'a str,
    pub init_command: Sensitive<&'a str>,
    pub role_copies: &'a [RoleCopy],
    pub revision: Option<&'a str>,
    pub forced_at: Option<DateTime<Utc>>,
}

/// Compose the ordered trigger sequence.
///
/// Any value not known to be public is replaced by a hash-tagged token.
pub fn make_triggers(inputs: &TriggerInputs<'_>) -> Result<Vec<Trigger>, SyncError> {
    let mut triggers = Vec::new();

    if let Some(extra) = inputs.input_triggers {
        triggers.extend(extra.iter().cloned().map(Trigger::from_value));
    }

    triggers.push(Trigger::Token(format!("remote-path:{}", inputs.remote_path)));

    if let Some(requirements) = &inputs.requirements {
        triggers.push(match requirements.public_value() {
            Some(value) => Trigger::from_value((*value).clone()),
            None => redacted("requirements", &json_hash(requirements.expose())?),
        });
    }

    triggers.push(match inputs.document.public_value() {
        Some(playbook) => Trigger::from_value(serde_yaml::to_value(playbook)?),
        None => redacted("playbook", &json_hash(inputs.document.expose())?),
    });

    triggers.push(Trigger::Token(format!("init-id:{}", inputs.init_identity)));
    triggers.push(match inputs.init_command.public_value() {
        Some(script) => Trigger::Token((*script).to_string()),
        None => redacted("init-cmd", &string_hash(inputs.init_command.expose())),
    });

    triggers.extend(inputs.role_copies.iter().map(|rc| Trigger::Token(rc.token())));

    if let Some(revision) = inputs.revision {
        triggers.push(Trigger::Token(format!("revision:{revision}")));
    }
    if let Some(at) = inputs.forced_at {
        triggers.push(Trigger::Token(format!(
            "forced-at:{}",
            at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )));
    }

    Ok(triggers)
}

fn redacted(label: &str, hash: &str) -> Trigger {
    Trigger::Token(format!("{label}-secret:{hash}"))
}

fn json_hash<T: Serialize + ?Sized>(value: &T) -> Result<String, SyncError> {
    Ok(string_hash(&serde_json::to_string(value)?))
}
