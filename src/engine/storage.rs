//! Storage for run results and evidences
//!
//! The engine only needs three capabilities from the filesystem: idempotent
//! directory creation, an existence probe and a full-content write that
//! reports how many bytes landed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Storage collaborator used by the orchestrator and evidence registry
pub trait Storage: Send + Sync {
    /// Create `parent/child` if absent and return its path
    fn ensure_directory(&self, parent: &Path, child: &str) -> io::Result<PathBuf>;

    /// Whether any filesystem entry exists at `path`
    fn exists(&self, path: &Path) -> bool;

    /// Write `bytes` to a new file at `path`, returning the number of bytes written
    fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<usize>;
}

/// Local filesystem storage
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn ensure_directory(&self, parent: &Path, child: &str) -> io::Result<PathBuf> {
        let target = parent.join(child);
        if !target.is_dir() {
            fs::create_dir_all(&target)?;
        }
        Ok(target)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<usize> {
        let mut file = fs::File::create(path)?;
        let mut written = 0;
        while written < bytes.len() {
            match file.write(&bytes[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        file.flush()?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_directory_is_idempotent() {
        let dir = tempdir().unwrap();
        let first = FsStorage.ensure_directory(dir.path(), "evidences").unwrap();
        let second = FsStorage.ensure_directory(dir.path(), "evidences").unwrap();
        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[test]
    fn test_ensure_directory_fails_over_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("details"), "x").unwrap();
        assert!(FsStorage.ensure_directory(dir.path(), "details").is_err());
    }

    #[test]
    fn test_write_file_reports_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        assert_eq!(FsStorage.write_file(&path, b"hello").unwrap(), 5);
        assert!(FsStorage.exists(&path));
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }
}
