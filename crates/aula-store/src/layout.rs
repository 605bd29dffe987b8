use crate::StoreError;
use aula_schema::RoomKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Current store format version. Incremented on incompatible layout changes.
pub const STORE_FORMAT_VERSION: u32 = 2;
const VERSION_FILE: &str = "version";

/// Directory layout for the Aula flat-file store.
///
/// One file per logical entity: pending requests, pending change requests,
/// approved reservations split by room kind, the approval audit log, the
/// room catalog, room-status overrides, and a per-recipient outbox
/// directory. Created lazily on [`initialize`](Self::initialize).
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreVersion {
    format_version: u32,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn requests_file(&self) -> PathBuf {
        self.root.join("requests.txt")
    }

    #[inline]
    pub fn changes_file(&self) -> PathBuf {
        self.root.join("changes.txt")
    }

    #[inline]
    pub fn approved_file(&self, kind: RoomKind) -> PathBuf {
        match kind {
            RoomKind::Lecture => self.root.join("approved_lecture.txt"),
            RoomKind::Lab => self.root.join("approved_lab.txt"),
        }
    }

    /// Append-only audit trail of every approval.
    #[inline]
    pub fn approved_log_file(&self) -> PathBuf {
        self.root.join("approved_log.txt")
    }

    #[inline]
    pub fn rooms_file(&self) -> PathBuf {
        self.root.join("rooms.txt")
    }

    #[inline]
    pub fn room_status_file(&self) -> PathBuf {
        self.root.join("room_status.txt")
    }

    #[inline]
    pub fn outbox_dir(&self) -> PathBuf {
        self.root.join("outbox")
    }

    #[inline]
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(".lock")
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(self.outbox_dir())?;

        let version_path = self.root.join(VERSION_FILE);
        if version_path.exists() {
            self.verify_version()?;
        } else {
            let ver = StoreVersion {
                format_version: STORE_FORMAT_VERSION,
            };
            let content = serde_json::to_string_pretty(&ver)?;
            let mut tmp = NamedTempFile::new_in(&self.root)?;
            tmp.write_all(content.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&version_path)
                .map_err(|e| StoreError::Io(e.error))?;
            crate::fsync_dir(&self.root)?;
        }

        Ok(())
    }

    pub fn verify_version(&self) -> Result<(), StoreError> {
        let version_path = self.root.join(VERSION_FILE);
        let content = fs::read_to_string(&version_path)?;
        let ver: StoreVersion = serde_json::from_str(&content)?;

        if ver.format_version != STORE_FORMAT_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: STORE_FORMAT_VERSION,
                found: ver.format_version,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_correct() {
        let layout = StoreLayout::new("/tmp/aula-test");
        assert_eq!(
            layout.requests_file(),
            PathBuf::from("/tmp/aula-test/requests.txt")
        );
        assert_eq!(
            layout.changes_file(),
            PathBuf::from("/tmp/aula-test/changes.txt")
        );
        assert_eq!(
            layout.approved_file(RoomKind::Lecture),
            PathBuf::from("/tmp/aula-test/approved_lecture.txt")
        );
        assert_eq!(
            layout.approved_file(RoomKind::Lab),
            PathBuf::from("/tmp/aula-test/approved_lab.txt")
        );
        assert_eq!(
            layout.outbox_dir(),
            PathBuf::from("/tmp/aula-test/outbox")
        );
    }

    #[test]
    fn initialize_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();

        assert!(layout.root().is_dir());
        assert!(layout.outbox_dir().is_dir());
    }

    #[test]
    fn initialize_writes_version() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();
        layout.verify_version().unwrap();
    }

    #[test]
    fn initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();
        layout.initialize().unwrap();
        layout.verify_version().unwrap();
    }

    #[test]
    fn initialize_rejects_foreign_version() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        fs::create_dir_all(layout.root()).unwrap();
        fs::write(
            layout.root().join("version"),
            r#"{"format_version": 99}"#,
        )
        .unwrap();
        assert!(matches!(
            layout.initialize(),
            Err(StoreError::VersionMismatch { .. })
        ));
    }
}
