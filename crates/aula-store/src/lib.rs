//! Flat-file storage layer for the Aula reservation engine.
//!
//! This crate provides the persistence layer: a `StoreLayout` describing the
//! data directory, the atomic `LineFile` engine (every mutation is a
//! copy-then-atomic-rename so no reader ever observes a half-written file),
//! the `ReservationStore` for pending/change/approved records, the room
//! `Catalog`, sparse `RoomStatusStore` overrides, and the per-recipient
//! offline notification `Outbox`.

pub mod catalog;
pub mod layout;
pub mod linefile;
pub mod outbox;
pub mod reservations;
pub mod status;

pub use catalog::Catalog;
pub use layout::{StoreLayout, STORE_FORMAT_VERSION};
pub use linefile::LineFile;
pub use outbox::{validate_recipient_id, Outbox};
pub use reservations::{Removed, ReservationStore};
pub use status::{RoomStatus, RoomStatusStore};

use std::path::Path;
use thiserror::Error;

/// Fsync a directory to ensure that a preceding `rename()` is durable.
///
/// On Linux with ext4 `data=ordered` (the default), renames are usually
/// durable without an explicit dir fsync, but POSIX does not guarantee this.
/// Calling `fsync()` on the parent directory makes the rename durable on
/// all filesystems and mount configurations.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record codec error: {0}")]
    Codec(#[from] aula_schema::SchemaError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("room not found: {0}")]
    RoomNotFound(String),
    #[error("room already exists: {0}")]
    DuplicateRoom(String),
    #[error("invalid capacity {0}: must be greater than zero")]
    InvalidCapacity(u32),
    #[error("invalid recipient id: {0}")]
    InvalidRecipient(String),
    #[error("lock acquisition failed: {0}")]
    LockFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display_room_not_found() {
        let e = StoreError::RoomNotFound("919".to_owned());
        assert!(e.to_string().contains("919"));
    }

    #[test]
    fn store_error_display_duplicate_room() {
        let e = StoreError::DuplicateRoom("908".to_owned());
        assert!(e.to_string().contains("908"));
    }

    #[test]
    fn store_error_display_version_mismatch() {
        let e = StoreError::VersionMismatch {
            expected: 2,
            found: 1,
        };
        let msg = e.to_string();
        assert!(msg.contains('2'));
        assert!(msg.contains('1'));
    }

    #[test]
    fn store_error_display_invalid_capacity() {
        let e = StoreError::InvalidCapacity(0);
        assert!(e.to_string().contains("greater than zero"));
    }

    #[test]
    fn store_error_display_invalid_recipient() {
        let e = StoreError::InvalidRecipient("../etc".to_owned());
        assert!(e.to_string().contains("../etc"));
    }
}
