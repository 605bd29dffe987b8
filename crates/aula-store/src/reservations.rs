//! Durable records for pending requests, pending change requests, and
//! approved reservations.
//!
//! All methods operate on single files and are individually atomic; the
//! cross-file invariant (one live record per booking key) is enforced by
//! the engine, which calls these under its global store lock.

use crate::layout::StoreLayout;
use crate::linefile::LineFile;
use crate::StoreError;
use aula_schema::{ChangeRecord, RequestStatus, Reservation, RoomKind};
use tracing::warn;

/// A record removed from a store file, together with its verbatim line so
/// a compensating rollback can restore it byte-identical.
#[derive(Debug, Clone)]
pub struct Removed<T> {
    pub line: String,
    pub record: T,
}

pub struct ReservationStore {
    layout: StoreLayout,
}

impl ReservationStore {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    fn requests_file(&self) -> LineFile {
        LineFile::new(self.layout.requests_file())
    }

    fn changes_file(&self) -> LineFile {
        LineFile::new(self.layout.changes_file())
    }

    fn approved_file(&self, kind: RoomKind) -> LineFile {
        LineFile::new(self.layout.approved_file(kind))
    }

    fn log_file(&self) -> LineFile {
        LineFile::new(self.layout.approved_log_file())
    }

    pub fn append_pending(&self, record: &Reservation) -> Result<(), StoreError> {
        self.requests_file().append(&record.encode())
    }

    pub fn append_change(&self, record: &ChangeRecord) -> Result<(), StoreError> {
        self.changes_file().append(&record.encode())
    }

    pub fn append_approved(&self, kind: RoomKind, record: &Reservation) -> Result<(), StoreError> {
        self.approved_file(kind).append(&record.encode())
    }

    /// Append to the approval audit trail.
    pub fn append_log(&self, record: &Reservation) -> Result<(), StoreError> {
        self.log_file().append(&record.encode())
    }

    /// Re-insert a previously removed line verbatim (compensating rollback).
    pub fn restore_approved(&self, kind: RoomKind, line: &str) -> Result<(), StoreError> {
        self.approved_file(kind).append(line)
    }

    /// Re-insert a previously removed pending line verbatim.
    pub fn restore_pending(&self, line: &str) -> Result<(), StoreError> {
        self.requests_file().append(line)
    }

    /// All decodable pending requests. Corrupt lines are skipped with a
    /// warning, matching how older releases tolerated them.
    pub fn pending(&self) -> Result<Vec<Reservation>, StoreError> {
        let mut out = Vec::new();
        for line in self.requests_file().lines()? {
            match Reservation::decode(&line) {
                Ok(r) => out.push(r),
                Err(e) => warn!("skipping corrupt pending record: {e}"),
            }
        }
        Ok(out)
    }

    /// All decodable change requests. Legacy short records are skipped
    /// with a warning.
    pub fn changes(&self) -> Result<Vec<ChangeRecord>, StoreError> {
        let mut out = Vec::new();
        for line in self.changes_file().lines()? {
            match ChangeRecord::decode(&line) {
                Ok(r) => out.push(r),
                Err(e) => warn!("skipping legacy change record: {e}"),
            }
        }
        Ok(out)
    }

    pub fn approved(&self, kind: RoomKind) -> Result<Vec<Reservation>, StoreError> {
        let mut out = Vec::new();
        for line in self.approved_file(kind).lines()? {
            match Reservation::decode(&line) {
                Ok(r) => out.push(r),
                Err(e) => warn!("skipping corrupt approved record: {e}"),
            }
        }
        Ok(out)
    }

    /// Whether any live record occupies (room, date, slot). Scans pending
    /// requests, pending change requests, and both approved files; slot
    /// labels are normalized before comparison.
    pub fn slot_taken(&self, room: &str, date: &str, slot: &str) -> Result<bool, StoreError> {
        if self.pending()?.iter().any(|r| r.occupies(room, date, slot)) {
            return Ok(true);
        }
        if self.changes()?.iter().any(|c| c.occupies(room, date, slot)) {
            return Ok(true);
        }
        for kind in [RoomKind::Lecture, RoomKind::Lab] {
            let hit = self.approved(kind)?.iter().any(|r| {
                r.status == RequestStatus::Approved && r.occupies(room, date, slot)
            });
            if hit {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Remove pending requests matching the predicate; returns the first
    /// removed record with its verbatim line.
    pub fn take_pending_where<F>(&self, mut pred: F) -> Result<Option<Removed<Reservation>>, StoreError>
    where
        F: FnMut(&Reservation) -> bool,
    {
        let removed = self
            .requests_file()
            .remove_where(|line| Reservation::decode(line).is_ok_and(|r| pred(&r)))?;
        Self::first_removed(removed, |l| Reservation::decode(l))
    }

    /// Remove change requests matching the predicate.
    pub fn take_change_where<F>(&self, mut pred: F) -> Result<Option<Removed<ChangeRecord>>, StoreError>
    where
        F: FnMut(&ChangeRecord) -> bool,
    {
        let removed = self
            .changes_file()
            .remove_where(|line| ChangeRecord::decode(line).is_ok_and(|c| pred(&c)))?;
        Self::first_removed(removed, |l| ChangeRecord::decode(l))
    }

    /// Remove approved reservations of the given kind matching the predicate.
    pub fn take_approved_where<F>(
        &self,
        kind: RoomKind,
        mut pred: F,
    ) -> Result<Option<Removed<Reservation>>, StoreError>
    where
        F: FnMut(&Reservation) -> bool,
    {
        let removed = self
            .approved_file(kind)
            .remove_where(|line| Reservation::decode(line).is_ok_and(|r| pred(&r)))?;
        Self::first_removed(removed, |l| Reservation::decode(l))
    }

    fn first_removed<T, D>(
        removed: Vec<String>,
        decode: D,
    ) -> Result<Option<Removed<T>>, StoreError>
    where
        D: Fn(&str) -> Result<T, aula_schema::SchemaError>,
    {
        match removed.into_iter().next() {
            Some(line) => {
                let record = decode(&line)?;
                Ok(Some(Removed { line, record }))
            }
            None => Ok(None),
        }
    }

    /// Whether any approved reservation references the room. Used to block
    /// catalog deletion.
    pub fn references_room(&self, room: &str) -> Result<bool, StoreError> {
        for kind in [RoomKind::Lecture, RoomKind::Lab] {
            if self.approved(kind)?.iter().any(|r| r.room == room.trim()) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Total approved headcount for a room on a date, across all slots.
    pub fn reserved_count(&self, room: &str, date: &str) -> Result<u32, StoreError> {
        let mut total = 0;
        for kind in [RoomKind::Lecture, RoomKind::Lab] {
            total += self
                .approved(kind)?
                .iter()
                .filter(|r| r.room == room.trim() && r.date == date.trim())
                .map(|r| r.count)
                .sum::<u32>();
        }
        Ok(total)
    }
}
