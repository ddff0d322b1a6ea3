//! `provisioner diff`: which steps would execute, and why.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use provisioner_sync::{detect_changes, StepChange};

use super::{plan_with_state, ConfigArg};

/// Arguments for `provisioner diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub config: ConfigArg,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;
        let (plan, previous) = plan_with_state(&config)?;
        let report = detect_changes(&plan, previous.as_ref())
            .with_context(|| format!("change detection failed for '{}'", config.id))?;

        if previous.is_none() {
            println!("No recorded state for '{}'; every step runs.", config.id);
        }
        print_step(&report.init);
        for copy in &report.copies {
            print_step(copy);
        }
        print_step(&report.run);

        if !report.any_changed() {
            println!("No differences for '{}'.", config.id);
            return Ok(());
        }

        for line in report.trigger_diff.lines() {
            if line.starts_with("+++") || line.starts_with("---") {
                println!("{}", line.bold());
            } else if line.starts_with('+') {
                println!("{}", line.green());
            } else if line.starts_with('-') {
                println!("{}", line.red());
            } else if line.starts_with("@@") {
                println!("{}", line.cyan());
            } else {
                println!("{line}");
            }
        }
        Ok(())
    }
}

fn print_step(change: &StepChange) {
    let label = if change.changed {
        "CHANGED".yellow().bold()
    } else {
        "UNCHANGED".green()
    };
    println!("{:<10} {}", label, change.step);
}
