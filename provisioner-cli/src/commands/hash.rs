//! `provisioner hash <DIR>`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use provisioner_sync::directory_hash;

/// Arguments for `provisioner hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Directory to hash.
    pub dir: PathBuf,
}

impl HashArgs {
    pub fn run(self) -> Result<()> {
        let hash = directory_hash(&self.dir)
            .with_context(|| format!("failed to hash {}", self.dir.display()))?;
        println!("{hash}");
        Ok(())
    }
}
