//! `provisioner plan`: print the generated scripts.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use provisioner_core::config;
use provisioner_sync::{Plan, PlanOptions};

use super::ConfigArg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScriptKind {
    Init,
    Run,
    All,
}

/// Arguments for `provisioner plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Which script to print.
    #[arg(long, value_enum, default_value = "all")]
    pub script: ScriptKind,

    /// Print secret init scripts verbatim.
    #[arg(long)]
    pub show_secrets: bool,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;
        let options = PlanOptions {
            force: config::force_from_env(),
            init_identity: None,
        };
        let plan = Plan::build(&config, &options)
            .with_context(|| format!("failed to build plan for '{}'", config.id))?;

        match self.script {
            ScriptKind::Init => print!("{}", init_text(&plan, self.show_secrets)),
            ScriptKind::Run => print!("{}", plan.run_script),
            ScriptKind::All => {
                println!("# {}", plan.init_step);
                print!("{}", init_text(&plan, self.show_secrets));
                for copy in &plan.role_copies {
                    println!(
                        "# {}: {} -> {} ({})",
                        copy.resource_id,
                        copy.role_path.display(),
                        plan.remote_path,
                        copy.hash
                    );
                }
                println!("# {}", plan.run_step);
                print!("{}", plan.run_script);
            }
        }
        Ok(())
    }
}

fn init_text(plan: &Plan, show_secrets: bool) -> String {
    match plan.init_script.public_value() {
        Some(script) => script.clone(),
        None if show_secrets => plan.init_script.expose().clone(),
        None => format!("<redacted init-cmd-secret:{}>\n", plan.init_hash()),
    }
}
