//! Change detection against the recorded [`TriggerState`].

use similar::TextDiff;

use provisioner_core::types::Trigger;

use crate::error::SyncError;
use crate::plan::Plan;
use crate::state::TriggerState;

/// Whether one step would execute on the next apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepChange {
    pub step: String,
    pub changed: bool,
}

/// Per-step decisions plus the trigger diff for the run step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeReport {
    pub init: StepChange,
    pub copies: Vec<StepChange>,
    pub run: StepChange,
    /// Unified diff of the run step fingerprint; empty when unchanged.
    pub trigger_diff: String,
}

impl ChangeReport {
    pub fn any_changed(&self) -> bool {
        self.init.changed || self.run.changed || self.copies.iter().any(|c| c.changed)
    }
}

/// Compare `plan` with the previously recorded state.
///
/// The run step's fingerprint is recomposed with the recorded init identity
/// so only real input changes show up. With no previous state every step
/// is reported as changed.
pub fn detect_changes(
    plan: &Plan,
    previous: Option<&TriggerState>,
) -> Result<ChangeReport, SyncError> {
    let Some(previous) = previous else {
        return Ok(ChangeReport {
            init: StepChange {
                step: plan.init_step.clone(),
                changed: true,
            },
            copies: plan
                .role_copies
                .iter()
                .map(|rc| StepChange {
                    step: rc.resource_id.clone(),
                    changed: true,
                })
                .collect(),
            run: StepChange {
                step: plan.run_step.clone(),
                changed: true,
            },
            trigger_diff: diff_triggers(&[], &plan.triggers)?,
        });
    };

    let current = plan.compose_triggers(&previous.init_identity)?;
    let run_changed = current != previous.triggers;
    let trigger_diff = if run_changed {
        diff_triggers(&previous.triggers, &current)?
    } else {
        String::new()
    };

    Ok(ChangeReport {
        init: StepChange {
            step: plan.init_step.clone(),
            changed: plan.init_hash() != previous.init_hash,
        },
        copies: plan
            .role_copies
            .iter()
            .map(|rc| StepChange {
                step: rc.resource_id.clone(),
                changed: previous.copies.get(&rc.resource_id) != Some(&rc.hash),
            })
            .collect(),
        run: StepChange {
            step: plan.run_step.clone(),
            changed: run_changed,
        },
        trigger_diff,
    })
}

/// Unified diff of two trigger sequences, one JSON-encoded token per line.
pub fn diff_triggers(previous: &[Trigger], current: &[Trigger]) -> Result<String, SyncError> {
    let old = render_lines(previous)?;
    let new = render_lines(current)?;
    if old == new {
        return Ok(String::new());
    }
    Ok(TextDiff::from_lines(&old, &new)
        .unified_diff()
        .header("a/triggers", "b/triggers")
        .context_radius(3)
        .to_string())
}

fn render_lines(triggers: &[Trigger]) -> Result<String, SyncError> {
    let mut out = String::new();
    for trigger in triggers {
        out.push_str(&serde_json::to_string(trigger)?);
        out.push('\n');
    }
    Ok(out)
}
