//! `provisioner files <ROLE_PATH>...`: keys the clean step keeps.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use provisioner_core::RoleFileKind;
use provisioner_sync::gather_roles_files;

/// Arguments for `provisioner files`.
#[derive(Args, Debug)]
pub struct FilesArgs {
    /// Role directories; later paths win on key collisions.
    #[arg(required = true)]
    pub role_paths: Vec<PathBuf>,
}

impl FilesArgs {
    pub fn run(self) -> Result<()> {
        let files = gather_roles_files(self.role_paths.as_slice())
            .context("failed to collect role files")?;
        for (key, file) in &files {
            let kind = match file.kind {
                RoleFileKind::File => "file",
                RoleFileKind::Symlink => "symlink",
            };
            println!("{key}\t{kind}\t{}", file.source.display());
        }
        Ok(())
    }
}
