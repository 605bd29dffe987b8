//! Room catalog: definitions of bookable lecture rooms and labs.
//!
//! The catalog keeps an in-memory map loaded at construction and rewrites
//! the whole file on every mutation. Writes are serialized by the catalog's
//! own mutex, independent of the reservation store lock.

use crate::linefile::LineFile;
use crate::{StoreError, StoreLayout};
use aula_schema::{Classroom, RoomKind};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, warn};

const DEFAULT_CAPACITY: u32 = 30;

pub struct Catalog {
    path: PathBuf,
    rooms: Mutex<BTreeMap<String, Classroom>>,
}

impl Catalog {
    /// Load the catalog, seeding the default room set when the file is
    /// absent.
    pub fn open(layout: &StoreLayout) -> Result<Self, StoreError> {
        let path = layout.rooms_file();
        let catalog = Self {
            path,
            rooms: Mutex::new(BTreeMap::new()),
        };
        if !catalog.path.exists() {
            catalog.seed_defaults()?;
        }
        catalog.refresh()?;
        Ok(catalog)
    }

    fn seed_defaults(&self) -> Result<(), StoreError> {
        let mut lines = vec![
            "# room definitions".to_owned(),
            "# format: name,kind,capacity".to_owned(),
        ];
        for name in ["908", "912", "913", "914"] {
            lines.push(format!("{name},{},{DEFAULT_CAPACITY}", RoomKind::Lecture));
        }
        for name in ["911", "915", "916", "918"] {
            lines.push(format!("{name},{},{DEFAULT_CAPACITY}", RoomKind::Lab));
        }
        LineFile::new(&self.path).write_all(&lines)?;
        info!("seeded default room catalog at {}", self.path.display());
        Ok(())
    }

    /// Re-read the catalog file, replacing the in-memory map.
    pub fn refresh(&self) -> Result<(), StoreError> {
        let mut loaded = BTreeMap::new();
        for line in LineFile::new(&self.path).lines()? {
            if line.trim_start().starts_with('#') {
                continue;
            }
            match Classroom::decode(&line) {
                Ok(room) => {
                    loaded.insert(room.name.to_string(), room);
                }
                Err(e) => warn!("skipping malformed catalog line: {e}"),
            }
        }
        let mut rooms = self.rooms.lock().expect("catalog lock poisoned");
        *rooms = loaded;
        Ok(())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.rooms
            .lock()
            .expect("catalog lock poisoned")
            .contains_key(name.trim())
    }

    pub fn get(&self, name: &str) -> Option<Classroom> {
        self.rooms
            .lock()
            .expect("catalog lock poisoned")
            .get(name.trim())
            .cloned()
    }

    pub fn all(&self) -> Vec<Classroom> {
        self.rooms
            .lock()
            .expect("catalog lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn all_of(&self, kind: RoomKind) -> Vec<Classroom> {
        self.rooms
            .lock()
            .expect("catalog lock poisoned")
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }

    /// The admission ceiling for a room: half its capacity, rounded down.
    pub fn allowed_capacity(&self, name: &str) -> Option<u32> {
        self.get(name).map(|r| r.allowed_capacity())
    }

    pub fn insert(&self, room: Classroom) -> Result<(), StoreError> {
        if room.capacity == 0 {
            return Err(StoreError::InvalidCapacity(room.capacity));
        }
        let mut rooms = self.rooms.lock().expect("catalog lock poisoned");
        if rooms.contains_key(room.name.as_str()) {
            return Err(StoreError::DuplicateRoom(room.name.to_string()));
        }
        rooms.insert(room.name.to_string(), room);
        self.save(&rooms)
    }

    pub fn update_capacity(&self, name: &str, capacity: u32) -> Result<(), StoreError> {
        if capacity == 0 {
            return Err(StoreError::InvalidCapacity(capacity));
        }
        let mut rooms = self.rooms.lock().expect("catalog lock poisoned");
        let room = rooms
            .get_mut(name.trim())
            .ok_or_else(|| StoreError::RoomNotFound(name.trim().to_owned()))?;
        room.capacity = capacity;
        info!("room {} capacity set to {capacity}", name.trim());
        self.save(&rooms)
    }

    /// Remove a room definition. The caller (the engine) is responsible for
    /// checking that no approved reservation still references it.
    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().expect("catalog lock poisoned");
        if rooms.remove(name.trim()).is_none() {
            return Err(StoreError::RoomNotFound(name.trim().to_owned()));
        }
        self.save(&rooms)
    }

    fn save(&self, rooms: &BTreeMap<String, Classroom>) -> Result<(), StoreError> {
        let mut lines = vec![
            "# room definitions".to_owned(),
            "# format: name,kind,capacity".to_owned(),
        ];
        lines.extend(rooms.values().map(Classroom::encode));
        LineFile::new(&self.path).write_all(&lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_schema::RoomName;

    fn test_catalog() -> (tempfile::TempDir, Catalog) {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();
        (dir, Catalog::open(&layout).unwrap())
    }

    #[test]
    fn defaults_are_seeded() {
        let (_dir, catalog) = test_catalog();
        assert!(catalog.exists("908"));
        assert!(catalog.exists("911"));
        assert_eq!(catalog.all().len(), 8);
        assert_eq!(catalog.all_of(RoomKind::Lecture).len(), 4);
        assert_eq!(catalog.all_of(RoomKind::Lab).len(), 4);
    }

    #[test]
    fn allowed_capacity_is_half() {
        let (_dir, catalog) = test_catalog();
        assert_eq!(catalog.allowed_capacity("908"), Some(15));
        assert_eq!(catalog.allowed_capacity("nope"), None);
    }

    #[test]
    fn insert_and_get() {
        let (_dir, catalog) = test_catalog();
        catalog
            .insert(Classroom {
                name: RoomName::new("920"),
                kind: RoomKind::Lab,
                capacity: 24,
            })
            .unwrap();
        let room = catalog.get("920").unwrap();
        assert_eq!(room.capacity, 24);
        assert_eq!(room.kind, RoomKind::Lab);
    }

    #[test]
    fn insert_duplicate_fails() {
        let (_dir, catalog) = test_catalog();
        let dup = Classroom {
            name: RoomName::new("908"),
            kind: RoomKind::Lecture,
            capacity: 10,
        };
        assert!(matches!(
            catalog.insert(dup),
            Err(StoreError::DuplicateRoom(_))
        ));
    }

    #[test]
    fn insert_zero_capacity_fails() {
        let (_dir, catalog) = test_catalog();
        let bad = Classroom {
            name: RoomName::new("921"),
            kind: RoomKind::Lab,
            capacity: 0,
        };
        assert!(matches!(
            catalog.insert(bad),
            Err(StoreError::InvalidCapacity(0))
        ));
    }

    #[test]
    fn update_capacity_persists() {
        let (dir, catalog) = test_catalog();
        catalog.update_capacity("908", 40).unwrap();
        assert_eq!(catalog.allowed_capacity("908"), Some(20));

        // A fresh catalog sees the change
        let layout = StoreLayout::new(dir.path());
        let reloaded = Catalog::open(&layout).unwrap();
        assert_eq!(reloaded.get("908").unwrap().capacity, 40);
    }

    #[test]
    fn update_capacity_unknown_room_fails() {
        let (_dir, catalog) = test_catalog();
        assert!(matches!(
            catalog.update_capacity("999", 10),
            Err(StoreError::RoomNotFound(_))
        ));
    }

    #[test]
    fn remove_room() {
        let (_dir, catalog) = test_catalog();
        catalog.remove("913").unwrap();
        assert!(!catalog.exists("913"));
        assert!(matches!(
            catalog.remove("913"),
            Err(StoreError::RoomNotFound(_))
        ));
    }

    #[test]
    fn refresh_picks_up_external_edits() {
        let (dir, catalog) = test_catalog();
        std::fs::write(dir.path().join("rooms.txt"), "101,CLASS,30\n").unwrap();
        catalog.refresh().unwrap();
        assert!(catalog.exists("101"));
        assert!(!catalog.exists("908"));
        // Legacy CLASS token decodes as a lecture room
        assert_eq!(catalog.get("101").unwrap().kind, RoomKind::Lecture);
    }
}
