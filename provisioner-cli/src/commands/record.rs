//! `provisioner record`: record the current plan after an external apply.

use anyhow::{Context, Result};
use clap::Args;

use provisioner_sync::{state, TriggerState};

use super::{plan_with_state, ConfigArg};

/// Arguments for `provisioner record`.
#[derive(Args, Debug)]
pub struct RecordArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Identity reported by the init step; defaults to the recorded one,
    /// or `<id>-init`.
    #[arg(long)]
    pub init_identity: Option<String>,
}

impl RecordArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;
        let (plan, previous) = plan_with_state(&config)?;
        let identity = self
            .init_identity
            .or_else(|| previous.map(|s| s.init_identity))
            .unwrap_or_else(|| plan.init_step.clone());

        let recorded = TriggerState::from_plan(&plan, &identity)
            .with_context(|| format!("failed to compose state for '{}'", config.id))?;
        state::save(&config.id, &recorded)
            .with_context(|| format!("failed to record state for '{}'", config.id))?;

        println!(
            "✓ '{}' recorded ({} trigger(s), {} role cop{})",
            config.id,
            recorded.triggers.len(),
            recorded.copies.len(),
            if recorded.copies.len() == 1 { "y" } else { "ies" }
        );
        Ok(())
    }
}
