//! SHA-256 content hashing for strings, files and directory trees.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{io_err, walk_err, SyncError};

const READ_CHUNK: usize = 64 * 1024;

/// Hex SHA-256 of the UTF-8 bytes of `input`.
pub fn string_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hex SHA-256 of the file at `path`, streamed in fixed-size chunks.
pub fn file_hash(path: &Path) -> Result<String, SyncError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut buf).map_err(|e| io_err(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hash of every regular file under `path`.
///
/// File digests are sorted before being combined, so the result depends
/// only on the set of file contents, never on enumeration order. Symlinks
/// and other non-regular entries are ignored.
pub fn directory_hash(path: &Path) -> Result<String, SyncError> {
    let mut hashes = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry.map_err(|e| walk_err(path, e))?;
        if entry.file_type().is_file() {
            hashes.push(file_hash(entry.path())?);
        }
    }
    hashes.sort();
    tracing::debug!("hashed {} file(s) under {}", hashes.len(), path.display());
    Ok(string_hash(&hashes.concat()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    // sha256("") and sha256("abc")
    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[rstest]
    #[case("", EMPTY)]
    #[case("abc", ABC)]
    #[case(
        "hello",
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    )]
    fn string_hash_known_vectors(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(string_hash(input), expected);
    }

    #[test]
    fn file_hash_matches_string_hash() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("f");
        fs::write(&path, "abc").unwrap();
        assert_eq!(file_hash(&path).unwrap(), ABC);
    }

    #[test]
    fn file_hash_streams_large_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big");
        let content = "x".repeat(READ_CHUNK * 3 + 17);
        fs::write(&path, &content).unwrap();
        assert_eq!(file_hash(&path).unwrap(), string_hash(&content));
    }

    #[test]
    fn file_hash_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = file_hash(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }), "got: {err}");
    }

    #[test]
    fn empty_directory_hashes_empty_string() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(directory_hash(tmp.path()).unwrap(), string_hash(""));
    }

    #[test]
    fn directory_hash_combines_sorted_file_hashes() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        fs::write(tmp.path().join("a/b/one"), "abc").unwrap();
        fs::write(tmp.path().join("two"), "").unwrap();

        let mut parts = [ABC, EMPTY];
        parts.sort();
        assert_eq!(
            directory_hash(tmp.path()).unwrap(),
            string_hash(&parts.concat())
        );
    }

    #[test]
    fn directory_hash_ignores_names_and_layout() {
        let left = TempDir::new().unwrap();
        let right = TempDir::new().unwrap();
        fs::write(left.path().join("z.yml"), "first").unwrap();
        fs::write(left.path().join("a.yml"), "second").unwrap();
        fs::create_dir_all(right.path().join("nested")).unwrap();
        fs::write(right.path().join("nested/0.yml"), "second").unwrap();
        fs::write(right.path().join("1.yml"), "first").unwrap();

        assert_eq!(
            directory_hash(left.path()).unwrap(),
            directory_hash(right.path()).unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn directory_hash_skips_symlinks() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("real"), "abc").unwrap();
        let before = directory_hash(tmp.path()).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("link"))
            .unwrap();
        assert_eq!(directory_hash(tmp.path()).unwrap(), before);
    }

    #[test]
    fn directory_hash_missing_dir_is_walk_error() {
        let tmp = TempDir::new().unwrap();
        let err = directory_hash(&tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, SyncError::Walk { .. }), "got: {err}");
    }
}
