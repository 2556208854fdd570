//! Evidence registry
//!
//! Evidences are files captured while a scenario runs. Each registration
//! gets a fresh id and is stored at `<evidences dir>/<id>/<name>`.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use super::command::Command;
use super::context::ScenarioContext;
use crate::common::{Error, Result};

/// Kind of captured content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EvidenceKind {
    Text,
    Binary,
}

/// A persisted artifact of a scenario execution
#[derive(Debug, Clone, Serialize)]
pub struct Evidence {
    pub id: Uuid,
    /// Command the evidence belongs to, if any
    pub command_id: Option<Uuid>,
    pub kind: EvidenceKind,
    pub name: String,
    pub path: PathBuf,
}

impl ScenarioContext {
    /// Store text evidence and register it
    pub fn register_text_evidence(
        &mut self,
        name: &str,
        contents: &str,
        command: Option<&dyn Command>,
    ) -> Result<Uuid> {
        if name.is_empty() {
            return Err(Error::required("name"));
        }
        if contents.is_empty() {
            return Err(Error::required("contents"));
        }
        self.register_evidence(EvidenceKind::Text, name, contents.as_bytes(), command)
    }

    /// Store binary evidence and register it
    ///
    /// `None` contents are rejected; an empty slice is accepted.
    pub fn register_binary_evidence(
        &mut self,
        name: &str,
        contents: Option<&[u8]>,
        command: Option<&dyn Command>,
    ) -> Result<Uuid> {
        if name.is_empty() {
            return Err(Error::required("name"));
        }
        let contents = contents.ok_or_else(|| Error::required("contents"))?;
        self.register_evidence(EvidenceKind::Binary, name, contents, command)
    }

    fn register_evidence(
        &mut self,
        kind: EvidenceKind,
        name: &str,
        contents: &[u8],
        command: Option<&dyn Command>,
    ) -> Result<Uuid> {
        if !is_plain_file_name(name) {
            return Err(Error::InvalidEvidenceName(name.to_string()));
        }
        let evidences_dir = self
            .dirs()
            .map(|d| d.evidences_dir.clone())
            .ok_or(Error::NotProvisioned("evidences"))?;

        let id = Uuid::new_v4();
        let path = evidences_dir.join(id.to_string()).join(name);
        tracing::debug!(?kind, path = %path.display(), "registering evidence");

        // Check-then-act: only sound while scenarios run one at a time.
        if self.storage.exists(&path) {
            tracing::error!(path = %path.display(), "evidence path already exists");
            return Err(Error::AlreadyExists { path });
        }

        self.storage
            .ensure_directory(&evidences_dir, &id.to_string())
            .map_err(|e| Error::provisioning(evidences_dir.join(id.to_string()), e))?;

        let written = self.storage.write_file(&path, contents)?;
        if written != contents.len() {
            tracing::error!(
                path = %path.display(),
                written,
                expected = contents.len(),
                "incomplete evidence write"
            );
            return Err(Error::IncompleteWrite {
                path,
                written,
                expected: contents.len(),
            });
        }

        let evidence = Evidence {
            id,
            command_id: command.map(|c| c.id()),
            kind,
            name: name.to_string(),
            path,
        };
        self.evidences.insert(id, evidence);
        Ok(id)
    }

    /// First evidence owned by the given command
    pub fn find_evidence_by_command(&self, command: &dyn Command) -> Result<&Evidence> {
        let command_id = command.id();
        self.evidences
            .values()
            .find(|e| e.command_id == Some(command_id))
            .ok_or_else(|| Error::EvidenceNotFound(format!("command {command_id}")))
    }

    /// Evidence with the given id
    pub fn find_evidence(&self, id: Uuid) -> Result<&Evidence> {
        self.evidences
            .get(&id)
            .ok_or_else(|| Error::EvidenceNotFound(id.to_string()))
    }
}

/// Whether `name` is exactly one normal path component
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::GlobalContext;
    use crate::engine::storage::{FsStorage, Storage};
    use std::io;
    use std::sync::Arc;
    use tempfile::tempdir;

    const FILE_NAME: &str = "dummy.txt";

    struct FixedCommand(Uuid);

    impl Command for FixedCommand {
        fn id(&self) -> Uuid {
            self.0
        }

        fn execute(&self, _gc: &GlobalContext, _sc: &mut ScenarioContext) {}
    }

    /// Storage that drops the last byte of every write
    struct ShortWrite;

    impl Storage for ShortWrite {
        fn ensure_directory(&self, parent: &Path, child: &str) -> io::Result<PathBuf> {
            FsStorage.ensure_directory(parent, child)
        }

        fn exists(&self, path: &Path) -> bool {
            FsStorage.exists(path)
        }

        fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<usize> {
            let cut = bytes.len().saturating_sub(1);
            FsStorage.write_file(path, &bytes[..cut])
        }
    }

    /// Storage that claims every path is taken
    struct Occupied;

    impl Storage for Occupied {
        fn ensure_directory(&self, parent: &Path, child: &str) -> io::Result<PathBuf> {
            Ok(parent.join(child))
        }

        fn exists(&self, _path: &Path) -> bool {
            true
        }

        fn write_file(&self, _path: &Path, bytes: &[u8]) -> io::Result<usize> {
            Ok(bytes.len())
        }
    }

    /// Filesystem storage where another writer creates each file first
    struct Preoccupied;

    impl Storage for Preoccupied {
        fn ensure_directory(&self, parent: &Path, child: &str) -> io::Result<PathBuf> {
            FsStorage.ensure_directory(parent, child)
        }

        fn exists(&self, path: &Path) -> bool {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, "earlier").unwrap();
            FsStorage.exists(path)
        }

        fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<usize> {
            FsStorage.write_file(path, bytes)
        }
    }

    #[test]
    fn test_register_text_evidence() {
        let dir = tempdir().unwrap();
        let mut sc = ScenarioContext::new("dummy").with_evidences_dir(dir.path());

        let id = sc
            .register_text_evidence(FILE_NAME, "{\"prop\": \"あ\"}", None)
            .unwrap();

        assert_eq!(sc.evidence_count(), 1);
        let evidence = sc.find_evidence(id).unwrap();
        assert_eq!(evidence.name, FILE_NAME);
        assert_eq!(evidence.kind, EvidenceKind::Text);
        assert_eq!(evidence.path, dir.path().join(id.to_string()).join(FILE_NAME));
        assert!(evidence.path.ends_with(format!("{id}/{FILE_NAME}")));
        assert_eq!(evidence.command_id, None);
        assert_eq!(
            std::fs::read_to_string(&evidence.path).unwrap(),
            "{\"prop\": \"あ\"}"
        );
    }

    #[test]
    fn test_register_text_evidence_requires_contents() {
        let dir = tempdir().unwrap();
        let mut sc = ScenarioContext::new("dummy").with_evidences_dir(dir.path());

        let err = sc.register_text_evidence(FILE_NAME, "", None).unwrap_err();
        assert_eq!(err.to_string(), "contents required");
        assert_eq!(sc.evidence_count(), 0);
    }

    #[test]
    fn test_register_evidence_requires_name() {
        let dir = tempdir().unwrap();
        let mut sc = ScenarioContext::new("dummy").with_evidences_dir(dir.path());

        let err = sc.register_text_evidence("", "text", None).unwrap_err();
        assert_eq!(err.to_string(), "name required");
        let err = sc.register_binary_evidence("", Some(b"x".as_slice()), None).unwrap_err();
        assert_eq!(err.to_string(), "name required");
    }

    #[test]
    fn test_register_binary_evidence() {
        let dir = tempdir().unwrap();
        let mut sc = ScenarioContext::new("dummy").with_evidences_dir(dir.path());
        let command = FixedCommand(Uuid::new_v4());

        let id = sc
            .register_binary_evidence("shot.png", Some(&[0x89u8, 0x50, 0x4e, 0x47][..]), Some(&command as &dyn Command))
            .unwrap();

        let evidence = sc.find_evidence(id).unwrap();
        assert_eq!(evidence.kind, EvidenceKind::Binary);
        assert_eq!(evidence.command_id, Some(command.0));
        assert_eq!(std::fs::read(&evidence.path).unwrap().len(), 4);
    }

    #[test]
    fn test_register_binary_evidence_rejects_none() {
        let dir = tempdir().unwrap();
        let mut sc = ScenarioContext::new("dummy").with_evidences_dir(dir.path());

        let err = sc.register_binary_evidence(FILE_NAME, None, None).unwrap_err();
        assert_eq!(err.to_string(), "contents required");
        assert_eq!(sc.evidence_count(), 0);
    }

    #[test]
    fn test_register_binary_evidence_accepts_empty() {
        let dir = tempdir().unwrap();
        let mut sc = ScenarioContext::new("dummy").with_evidences_dir(dir.path());

        let id = sc.register_binary_evidence("empty.bin", Some(&[0u8; 0][..]), None).unwrap();
        assert_eq!(sc.evidence_count(), 1);
        assert_eq!(std::fs::read(&sc.find_evidence(id).unwrap().path).unwrap().len(), 0);
    }

    #[test]
    fn test_same_name_twice_gets_distinct_paths() {
        let dir = tempdir().unwrap();
        let mut sc = ScenarioContext::new("dummy").with_evidences_dir(dir.path());

        let first = sc.register_text_evidence(FILE_NAME, "one", None).unwrap();
        let second = sc.register_text_evidence(FILE_NAME, "two", None).unwrap();
        assert_ne!(first, second);
        assert_ne!(
            sc.find_evidence(first).unwrap().path,
            sc.find_evidence(second).unwrap().path
        );
    }

    #[test]
    fn test_existing_path_is_rejected() {
        let dir = tempdir().unwrap();
        let mut sc = ScenarioContext::with_storage("dummy", Arc::new(Occupied))
            .with_evidences_dir(dir.path());

        let err = sc.register_text_evidence(FILE_NAME, "text", None).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert_eq!(sc.evidence_count(), 0);
    }

    #[test]
    fn test_short_write_is_not_registered() {
        let dir = tempdir().unwrap();
        let mut sc = ScenarioContext::with_storage("dummy", Arc::new(ShortWrite))
            .with_evidences_dir(dir.path());

        let err = sc.register_text_evidence(FILE_NAME, "text", None).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompleteWrite { written: 3, expected: 4, .. }
        ));
        assert_eq!(sc.evidence_count(), 0);
    }

    #[test]
    fn test_existing_file_on_disk_is_rejected() {
        let dir = tempdir().unwrap();
        let mut sc = ScenarioContext::with_storage("dummy", Arc::new(Preoccupied))
            .with_evidences_dir(dir.path());

        let err = sc.register_text_evidence(FILE_NAME, "text", None).unwrap_err();
        let path = match err {
            Error::AlreadyExists { path } => path,
            other => panic!("Expected AlreadyExists, got {:?}", other),
        };
        assert!(path.starts_with(dir.path()));
        assert!(path.ends_with(FILE_NAME));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier");
        assert_eq!(sc.evidence_count(), 0);
    }

    #[test]
    fn test_path_like_names_are_rejected() {
        let dir = tempdir().unwrap();
        let mut sc = ScenarioContext::new("dummy").with_evidences_dir(dir.path());

        for name in ["../x", "a/../../y", "a/b.txt", "/etc/passwd", ".", ".."] {
            let err = sc.register_text_evidence(name, "text", None).unwrap_err();
            assert!(
                matches!(err, Error::InvalidEvidenceName(ref n) if n == name),
                "{name} accepted"
            );
        }
        let err = sc.register_binary_evidence("../x", Some(b"x".as_slice()), None).unwrap_err();
        assert!(matches!(err, Error::InvalidEvidenceName(_)));

        assert_eq!(sc.evidence_count(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unprovisioned_context() {
        let mut sc = ScenarioContext::new("dummy");
        assert!(matches!(
            sc.register_text_evidence(FILE_NAME, "text", None),
            Err(Error::NotProvisioned("evidences"))
        ));
    }

    #[test]
    fn test_find_by_command() {
        let dir = tempdir().unwrap();
        let mut sc = ScenarioContext::new("dummy").with_evidences_dir(dir.path());
        let owner = FixedCommand(Uuid::new_v4());
        let stranger = FixedCommand(Uuid::new_v4());

        assert!(matches!(
            sc.find_evidence_by_command(&owner),
            Err(Error::EvidenceNotFound(_))
        ));

        sc.register_text_evidence("unowned.txt", "a", None).unwrap();
        let id = sc.register_text_evidence("owned.txt", "b", Some(&owner as &dyn Command)).unwrap();

        assert_eq!(sc.find_evidence_by_command(&owner).unwrap().id, id);
        assert!(sc.find_evidence_by_command(&stranger).is_err());
        assert!(sc.find_evidence(Uuid::new_v4()).is_err());
    }
}
