//! Provisioner: change detection for remote Ansible provisioning.
//!
//! # Usage
//!
//! ```text
//! provisioner plan [-c FILE] [--script init|run|all] [--show-secrets]
//! provisioner triggers [-c FILE] [--json]
//! provisioner diff [-c FILE]
//! provisioner record [-c FILE] [--init-identity ID]
//! provisioner hash <DIR>
//! provisioner files <ROLE_PATH>...
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, files::FilesArgs, hash::HashArgs, plan::PlanArgs, record::RecordArgs,
    triggers::TriggersArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "provisioner",
    version,
    about = "Compute, fingerprint and diff Ansible provisioning steps for a remote host",
    long_about = None,
)]
struct Cli {
    /// Log debug detail to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the generated init and run scripts.
    Plan(PlanArgs),

    /// Print the run step's trigger sequence.
    Triggers(TriggersArgs),

    /// Compare the current plan against the recorded state.
    Diff(DiffArgs),

    /// Record the current plan as applied.
    Record(RecordArgs),

    /// Print the content hash of a directory.
    Hash(HashArgs),

    /// List the role file keys collected from role paths.
    Files(FilesArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Plan(args) => args.run(),
        Commands::Triggers(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Record(args) => args.run(),
        Commands::Hash(args) => args.run(),
        Commands::Files(args) => args.run(),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
