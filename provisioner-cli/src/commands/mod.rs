pub mod diff;
pub mod files;
pub mod hash;
pub mod plan;
pub mod record;
pub mod triggers;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use provisioner_core::config::{self, DEFAULT_CONFIG_FILE};
use provisioner_core::ProvisionerConfig;
use provisioner_sync::{state, Plan, PlanOptions, TriggerState};

/// `--config` flag shared by every command that reads a provisioner file.
#[derive(Args, Debug, Clone)]
pub struct ConfigArg {
    /// Provisioner configuration file.
    #[arg(short, long = "config", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

impl ConfigArg {
    pub fn load(&self) -> Result<ProvisionerConfig> {
        let loaded = config::load(&self.config)
            .with_context(|| format!("failed to load {}", self.config.display()))?;
        tracing::debug!("loaded provisioner '{}'", loaded.id);
        Ok(loaded)
    }
}

/// Load the recorded state for `config` (if any) and build a plan whose
/// trigger sequence uses the recorded init identity.
pub fn plan_with_state(config: &ProvisionerConfig) -> Result<(Plan, Option<TriggerState>)> {
    let previous = state::load(&config.id)
        .with_context(|| format!("failed to load recorded state for '{}'", config.id))?;
    let options = PlanOptions {
        force: config::force_from_env(),
        init_identity: previous.as_ref().map(|s| s.init_identity.clone()),
    };
    let plan = Plan::build(config, &options)
        .with_context(|| format!("failed to build plan for '{}'", config.id))?;
    Ok((plan, previous))
}
