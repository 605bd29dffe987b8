//! Sparse room-status overrides. A room with no entry is available.

use crate::linefile::LineFile;
use crate::{StoreError, StoreLayout};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Available,
    Unavailable,
}

impl RoomStatus {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "AVAILABLE" => Some(RoomStatus::Available),
            "UNAVAILABLE" => Some(RoomStatus::Unavailable),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomStatus::Available => write!(f, "AVAILABLE"),
            RoomStatus::Unavailable => write!(f, "UNAVAILABLE"),
        }
    }
}

pub struct RoomStatusStore {
    path: PathBuf,
    overrides: Mutex<BTreeMap<String, RoomStatus>>,
}

impl RoomStatusStore {
    pub fn open(layout: &StoreLayout) -> Result<Self, StoreError> {
        let path = layout.room_status_file();
        let mut overrides = BTreeMap::new();
        for line in LineFile::new(&path).lines()? {
            let mut fields = line.splitn(2, ',');
            let room = fields.next().unwrap_or("").trim();
            let status = fields.next().and_then(RoomStatus::parse);
            match status {
                Some(s) if !room.is_empty() => {
                    overrides.insert(room.to_owned(), s);
                }
                _ => warn!("skipping malformed room status line: {line}"),
            }
        }
        Ok(Self {
            path,
            overrides: Mutex::new(overrides),
        })
    }

    /// The effective status of a room; absence of an override means
    /// available.
    pub fn status(&self, room: &str) -> RoomStatus {
        self.overrides
            .lock()
            .expect("status lock poisoned")
            .get(room.trim())
            .copied()
            .unwrap_or(RoomStatus::Available)
    }

    pub fn is_available(&self, room: &str) -> bool {
        self.status(room) == RoomStatus::Available
    }

    pub fn set(&self, room: &str, status: RoomStatus) -> Result<(), StoreError> {
        let mut overrides = self.overrides.lock().expect("status lock poisoned");
        overrides.insert(room.trim().to_owned(), status);
        let lines: Vec<String> = overrides
            .iter()
            .map(|(room, status)| format!("{room},{status}"))
            .collect();
        LineFile::new(&self.path).write_all(&lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_status() -> (tempfile::TempDir, RoomStatusStore) {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();
        (dir, RoomStatusStore::open(&layout).unwrap())
    }

    #[test]
    fn absent_override_means_available() {
        let (_dir, store) = test_status();
        assert_eq!(store.status("908"), RoomStatus::Available);
        assert!(store.is_available("908"));
    }

    #[test]
    fn set_and_read_back() {
        let (_dir, store) = test_status();
        store.set("912", RoomStatus::Unavailable).unwrap();
        assert_eq!(store.status("912"), RoomStatus::Unavailable);
        assert!(!store.is_available("912"));
        store.set("912", RoomStatus::Available).unwrap();
        assert!(store.is_available("912"));
    }

    #[test]
    fn overrides_survive_reopen() {
        let (dir, store) = test_status();
        store.set("915", RoomStatus::Unavailable).unwrap();
        drop(store);

        let layout = StoreLayout::new(dir.path());
        let reopened = RoomStatusStore::open(&layout).unwrap();
        assert_eq!(reopened.status("915"), RoomStatus::Unavailable);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let (dir, _store) = test_status();
        std::fs::write(dir.path().join("room_status.txt"), "912\nbad,WHAT\n913,UNAVAILABLE\n")
            .unwrap();
        let layout = StoreLayout::new(dir.path());
        let reopened = RoomStatusStore::open(&layout).unwrap();
        assert_eq!(reopened.status("913"), RoomStatus::Unavailable);
        assert_eq!(reopened.status("912"), RoomStatus::Available);
    }
}
