//! `provisioner triggers`: print the run step's fingerprint.

use anyhow::{Context, Result};
use clap::Args;

use super::{plan_with_state, ConfigArg};

/// Arguments for `provisioner triggers`.
#[derive(Args, Debug)]
pub struct TriggersArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Emit the sequence as one JSON array.
    #[arg(long)]
    pub json: bool,
}

impl TriggersArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;
        let (plan, _) = plan_with_state(&config)?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&plan.triggers)
                    .context("failed to serialize triggers")?
            );
            return Ok(());
        }

        for trigger in &plan.triggers {
            println!(
                "{}",
                serde_json::to_string(trigger).context("failed to serialize trigger")?
            );
        }
        Ok(())
    }
}
