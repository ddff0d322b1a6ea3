//! Role directory collection and role copies.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use provisioner_core::types::{ProvisionId, RoleCopy, RoleFile, RoleFileKind};

use crate::error::{io_err, walk_err, SyncError};
use crate::hasher::directory_hash;

/// Role files keyed by their path relative to the parent of their role root.
pub type RoleFiles = BTreeMap<String, RoleFile>;

/// Walk every role path and collect regular files and symlinks.
///
/// Keys are `/`-separated and include the role directory name, matching
/// where the copy lands under the remote path. A key seen in a later role
/// path replaces the earlier entry.
pub fn gather_roles_files<P: AsRef<Path>>(role_paths: &[P]) -> Result<RoleFiles, SyncError> {
    let mut files = RoleFiles::new();
    for role_path in role_paths {
        let root = normalize(role_path.as_ref())?;
        let parent = root.parent().unwrap_or(Path::new("/")).to_path_buf();

        for entry in WalkDir::new(&root) {
            let entry = entry.map_err(|e| walk_err(&root, e))?;
            let file_type = entry.file_type();
            let kind = if file_type.is_file() {
                RoleFileKind::File
            } else if file_type.is_symlink() {
                RoleFileKind::Symlink
            } else {
                continue;
            };

            let key = relative_key(entry.path(), &parent);
            if let Some(previous) = files.get(&key) {
                tracing::debug!(
                    "{key}: {} replaces {}",
                    entry.path().display(),
                    previous.source.display()
                );
            }
            files.insert(
                key.clone(),
                RoleFile {
                    key,
                    source: entry.path().to_path_buf(),
                    kind,
                },
            );
        }
    }
    Ok(files)
}

/// One [`RoleCopy`] per role path, in input order, each carrying the hash of
/// its whole directory tree.
pub fn make_role_copies<P: AsRef<Path>>(
    id: &ProvisionId,
    role_paths: &[P],
) -> Result<Vec<RoleCopy>, SyncError> {
    role_paths
        .iter()
        .enumerate()
        .map(|(index, role_path)| {
            let role_path = role_path.as_ref();
            Ok(RoleCopy {
                resource_id: id.role_copy(index),
                role_path: role_path.to_path_buf(),
                hash: directory_hash(role_path)?,
            })
        })
        .collect()
}

/// Absolute, lexically cleaned form of `path` (no `.`, `..` or trailing `/`).
fn normalize(path: &Path) -> Result<PathBuf, SyncError> {
    let absolute = std::path::absolute(path).map_err(|e| io_err(path, e))?;
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

fn relative_key(path: &Path, parent: &Path) -> String {
    path.strip_prefix(parent)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
