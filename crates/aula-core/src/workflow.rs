//! The approval workflow engine.
//!
//! `Engine` drives the reservation lifecycle: submit, approve, reject,
//! cancel, and the two change flows. Every store mutation and every
//! consistency-sensitive read runs under one global mutex (the store lock);
//! catalog lookups happen before that lock is acquired, never nested inside
//! it, so the catalog mutex and the store lock cannot deadlock against each
//! other. Compound mutations (change approval, full change) keep the
//! verbatim removed line in memory and restore it if a later step fails.

use crate::admission::Admission;
use crate::identity::Directory;
use crate::lifecycle::{validate_transition, RequestState};
use crate::notify::Dispatcher;
use crate::{EngineError, RuleViolation};
use aula_schema::{
    normalize_slot, same_slot, ChangeRecord, Classroom, Notification, NotifyKind, RequestStatus,
    Reservation, RoomKind, RoomName, UserId,
};
use aula_store::{
    validate_recipient_id, Catalog, ReservationStore, RoomStatus, RoomStatusStore, StoreError,
    StoreLayout,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// A new reservation submission.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub requester: String,
    pub owner: UserId,
    pub room: String,
    pub date: String,
    pub weekday: String,
    pub slot: String,
    pub purpose: String,
    pub role: String,
    pub count: u32,
}

/// Composite key locating a pending request or pending change record.
#[derive(Debug, Clone)]
pub struct PendingRef {
    pub owner: UserId,
    pub requester: String,
    pub room: String,
    pub date: String,
    pub weekday: String,
    pub slot: String,
}

/// A cancellation of an approved reservation. An empty `date` matches any
/// date, preserved from the historical protocol.
#[derive(Debug, Clone)]
pub struct CancelRequest {
    pub requested_by: UserId,
    pub owner: UserId,
    pub requester: String,
    pub room: String,
    pub date: String,
    pub weekday: String,
    pub slot: String,
}

/// Key of the approved reservation a change request supersedes.
#[derive(Debug, Clone)]
pub struct OriginalRef {
    pub room: String,
    pub date: String,
    pub weekday: String,
    pub slot: String,
}

/// A single-slot change submission: propose one new booking for an
/// existing approved reservation.
#[derive(Debug, Clone)]
pub struct ChangeSubmission {
    pub owner: UserId,
    pub requester: String,
    pub original: OriginalRef,
    pub room: String,
    pub date: String,
    pub weekday: String,
    pub slot: String,
    pub count: u32,
}

/// One proposed booking in a full change request.
#[derive(Debug, Clone)]
pub struct ChangeCandidate {
    pub room: String,
    pub date: String,
    pub weekday: String,
    pub slot: String,
    pub purpose: String,
    pub role: String,
    pub count: u32,
}

enum BackupSource {
    Approved(RoomKind),
    Pending,
}

pub struct Engine {
    store: ReservationStore,
    admission: Admission,
    catalog: Arc<Catalog>,
    status: Arc<RoomStatusStore>,
    dispatcher: Arc<Dispatcher>,
    directory: Arc<dyn Directory>,
    store_lock: Mutex<()>,
}

impl Engine {
    pub fn new(
        layout: &StoreLayout,
        catalog: Arc<Catalog>,
        status: Arc<RoomStatusStore>,
        dispatcher: Arc<Dispatcher>,
        directory: Arc<dyn Directory>,
    ) -> Self {
        Self {
            store: ReservationStore::new(layout.clone()),
            admission: Admission::new(Arc::clone(&catalog), Arc::clone(&status)),
            catalog,
            status,
            dispatcher,
            directory,
            store_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.store_lock.lock().expect("store lock poisoned")
    }

    fn require_staff(&self, id: &UserId) -> Result<(), EngineError> {
        if self.directory.is_staff(id.as_str()) {
            Ok(())
        } else {
            Err(EngineError::AuthorizationDenied(id.to_string()))
        }
    }

    /// Submit a new reservation request. On success a PENDING record
    /// exists; on failure the specific violation is returned and nothing
    /// is written.
    pub fn submit(&self, req: &SubmitRequest) -> Result<(), EngineError> {
        validate_submit_fields(req)?;
        self.admission.check_date(&req.date)?;
        // Catalog lookups before the store lock
        let room = self.admission.check_room(&req.room)?;
        self.admission.check_capacity(&room, req.count)?;

        let record = Reservation {
            requester: req.requester.trim().to_owned(),
            room: RoomName::new(req.room.trim()),
            date: req.date.trim().to_owned(),
            weekday: req.weekday.trim().to_owned(),
            slot: req.slot.trim().to_owned(),
            purpose: req.purpose.trim().to_owned(),
            role: req.role.trim().to_owned(),
            status: RequestStatus::Pending,
            count: req.count,
            owner: req.owner.clone(),
        };

        let _guard = self.lock();
        self.admission
            .check_conflict(&self.store, &req.room, &req.date, &req.slot)?;
        self.store.append_pending(&record)?;
        info!(
            "pending request recorded: {} {} {} slot {}",
            record.requester,
            record.room,
            record.date,
            normalize_slot(&record.slot)
        );
        Ok(())
    }

    /// Approve a pending request or a pending change request located by
    /// its composite key.
    pub fn approve(&self, key: &PendingRef, approved_by: &UserId) -> Result<(), EngineError> {
        self.require_staff(approved_by)?;
        // Room-kind lookups (new room and, for changes, the original room)
        // happen before the store lock is acquired.
        let rooms = self.catalog.all();

        let guard = self.lock();

        if let Some(taken) = self.store.take_pending_where(|r| {
            r.requester == key.requester.trim()
                && r.room == key.room.trim()
                && r.date == key.date.trim()
                && r.weekday == key.weekday.trim()
                && same_slot(&r.slot, &key.slot)
        })? {
            validate_transition(RequestState::Pending, RequestState::Approved)?;
            let owner = effective_owner(&taken.record.owner, &key.owner);
            let approved = Reservation {
                requester: self.resolve_name(&owner, &taken.record.requester),
                status: RequestStatus::Approved,
                owner: owner.clone(),
                ..taken.record
            };
            let kind = kind_of(&rooms, approved.room.as_str());
            self.store.append_approved(kind, &approved)?;
            self.store.append_log(&approved)?;
            drop(guard);

            info!(
                "approved: {} {} {} slot {} ({} participants)",
                approved.requester,
                approved.room,
                approved.date,
                normalize_slot(&approved.slot),
                approved.count
            );
            self.emit(&owner, NotifyKind::Approved, &approved.room, &approved.date,
                &approved.weekday, &approved.slot);
            return Ok(());
        }

        let Some(taken) = self.store.take_change_where(|c| {
            c.owner == key.owner
                && same_slot(&c.slot, &key.slot)
                && c.date == key.date.trim()
                && c.weekday == key.weekday.trim()
                && c.room == key.room.trim()
                && c.requester == key.requester.trim()
        })?
        else {
            return Err(RuleViolation::NotFound(format!(
                "no pending request for {} {} {} slot {}",
                key.requester,
                key.room.trim(),
                key.date.trim(),
                normalize_slot(&key.slot)
            ))
            .into());
        };

        validate_transition(RequestState::PendingChange, RequestState::Approved)?;
        let change = taken.record;
        let owner = change.owner.clone();
        let new_kind = kind_of(&rooms, change.room.as_str());
        let orig_kind = kind_of(&rooms, change.orig_room.as_str());

        // Delete the superseded original, keeping its verbatim line for
        // rollback. Absence is tolerated: the original may itself have been
        // removed by an earlier full-change submission.
        let backup = self.store.take_approved_where(orig_kind, |r| {
            r.requester == change.requester
                && r.occupies(change.orig_room.as_str(), &change.orig_date, &change.orig_slot)
                && r.weekday == change.orig_weekday
        })?;
        if backup.is_none() {
            debug!(
                "change approval: original {} {} slot {} already gone",
                change.orig_room, change.orig_date, change.orig_slot
            );
        }

        let approved = Reservation {
            requester: self.resolve_name(&owner, &change.requester),
            room: change.room.clone(),
            date: change.date.clone(),
            weekday: change.weekday.clone(),
            slot: change.slot.clone(),
            purpose: change.purpose.clone(),
            role: change.role.clone(),
            status: RequestStatus::Approved,
            count: change.count,
            owner: owner.clone(),
        };

        if let Err(e) = self.store.append_approved(new_kind, &approved) {
            // Compensating rollback: the original comes back verbatim. The
            // change-record deletion above is not undone here.
            if let Some(b) = &backup {
                if let Err(re) = self.store.restore_approved(orig_kind, &b.line) {
                    error!("rollback of superseded reservation failed: {re}");
                }
            }
            warn!("change approval failed while inserting new reservation: {e}");
            return Err(e.into());
        }
        self.store.append_log(&approved)?;
        drop(guard);

        info!(
            "change approved: {} now {} {} slot {}",
            approved.requester,
            approved.room,
            approved.date,
            normalize_slot(&approved.slot)
        );
        self.emit(&owner, NotifyKind::ChangeApproved, &approved.room, &approved.date,
            &approved.weekday, &approved.slot);
        Ok(())
    }

    /// Reject a pending request or pending change request.
    pub fn reject(&self, key: &PendingRef, rejected_by: &UserId) -> Result<(), EngineError> {
        self.require_staff(rejected_by)?;

        let guard = self.lock();

        if let Some(taken) = self.store.take_pending_where(|r| {
            r.requester == key.requester.trim()
                && r.room == key.room.trim()
                && r.date == key.date.trim()
                && r.weekday == key.weekday.trim()
                && same_slot(&r.slot, &key.slot)
        })? {
            validate_transition(RequestState::Pending, RequestState::Rejected)?;
            let owner = effective_owner(&taken.record.owner, &key.owner);
            drop(guard);
            info!("rejected: {} {} {} slot {}", key.requester, key.room, key.date, key.slot);
            self.emit(&owner, NotifyKind::Rejected, &key.room, &key.date, &key.weekday, &key.slot);
            return Ok(());
        }

        let Some(taken) = self.store.take_change_where(|c| {
            c.owner == key.owner
                && same_slot(&c.slot, &key.slot)
                && c.date == key.date.trim()
                && c.weekday == key.weekday.trim()
                && c.room == key.room.trim()
                && c.requester == key.requester.trim()
        })?
        else {
            return Err(RuleViolation::NotFound(format!(
                "no pending request for {} {} {} slot {}",
                key.requester,
                key.room.trim(),
                key.date.trim(),
                normalize_slot(&key.slot)
            ))
            .into());
        };

        validate_transition(RequestState::PendingChange, RequestState::Rejected)?;
        let owner = taken.record.owner.clone();
        drop(guard);
        info!(
            "change rejected: {} {} {} slot {} (original unchanged)",
            key.requester, key.room, key.date, key.slot
        );
        self.emit(&owner, NotifyKind::ChangeRejected, &key.room, &key.date, &key.weekday, &key.slot);
        Ok(())
    }

    /// Cancel an approved reservation. The owner is notified only when
    /// somebody else cancelled; self-cancellation stays silent.
    pub fn cancel(&self, req: &CancelRequest) -> Result<(), EngineError> {
        let rooms = self.catalog.all();
        let kind = kind_of(&rooms, req.room.trim());

        let guard = self.lock();
        let Some(taken) = self.store.take_approved_where(kind, |r| {
            (r.requester == req.requester.trim()
                || (!req.owner.as_str().is_empty() && r.owner == req.owner))
                && r.room == req.room.trim()
                && (req.date.trim().is_empty() || r.date == req.date.trim())
                && r.weekday == req.weekday.trim()
                && same_slot(&r.slot, &req.slot)
        })?
        else {
            return Err(RuleViolation::NotFound(format!(
                "no approved reservation for {} {} slot {}",
                req.room.trim(),
                req.weekday.trim(),
                normalize_slot(&req.slot)
            ))
            .into());
        };
        validate_transition(RequestState::Approved, RequestState::Cancelled)?;
        drop(guard);

        let record = taken.record;
        info!(
            "cancelled: {} {} {} slot {} ({} participants)",
            record.requester,
            record.room,
            record.date,
            normalize_slot(&record.slot),
            record.count
        );

        let owner = effective_owner(&record.owner, &req.owner);
        if req.requested_by != owner {
            self.emit(&owner, NotifyKind::Cancelled, &record.room, &record.date,
                &record.weekday, &record.slot);
        } else {
            debug!("self-cancellation by {owner}, no notification");
        }
        Ok(())
    }

    /// Submit a single-slot change request. The original reservation stays
    /// in place until the change is approved.
    pub fn change_request(&self, sub: &ChangeSubmission) -> Result<(), EngineError> {
        for field in [&sub.requester, &sub.room, &sub.date, &sub.weekday, &sub.slot] {
            check_field(field)?;
        }
        let rooms = self.catalog.all();
        let orig_kind = kind_of(&rooms, sub.original.room.trim());

        let _guard = self.lock();

        // Purpose and role carry over from the original, which must still
        // be approved.
        let original = self
            .store
            .approved(orig_kind)?
            .into_iter()
            .find(|r| {
                (r.requester == sub.requester.trim() || r.owner == sub.owner)
                    && r.occupies(&sub.original.room, &sub.original.date, &sub.original.slot)
                    && r.weekday == sub.original.weekday.trim()
            })
            .ok_or_else(|| {
                RuleViolation::NotFound(format!(
                    "no approved reservation for {} {} slot {}",
                    sub.original.room.trim(),
                    sub.original.date.trim(),
                    normalize_slot(&sub.original.slot)
                ))
            })?;

        // A same-owner resubmission is a duplicate; anything else holding
        // the slot is a conflict.
        let duplicate = self.store.changes()?.into_iter().any(|c| {
            c.owner == sub.owner && c.occupies(&sub.room, &sub.date, &sub.slot)
        });
        if duplicate {
            return Err(RuleViolation::Duplicate(format!(
                "change request already pending for {} {} slot {}",
                sub.room.trim(),
                sub.date.trim(),
                normalize_slot(&sub.slot)
            ))
            .into());
        }
        self.admission
            .check_conflict(&self.store, &sub.room, &sub.date, &sub.slot)?;

        let record = ChangeRecord {
            owner: sub.owner.clone(),
            slot: sub.slot.trim().to_owned(),
            date: sub.date.trim().to_owned(),
            weekday: sub.weekday.trim().to_owned(),
            room: RoomName::new(sub.room.trim()),
            requester: sub.requester.trim().to_owned(),
            purpose: original.purpose,
            role: original.role,
            orig_slot: sub.original.slot.trim().to_owned(),
            orig_date: sub.original.date.trim().to_owned(),
            orig_weekday: sub.original.weekday.trim().to_owned(),
            orig_room: RoomName::new(sub.original.room.trim()),
            count: sub.count,
        };
        self.store.append_change(&record)?;
        info!(
            "change request recorded: {} wants {} {} slot {}",
            record.requester, record.room, record.date, record.slot
        );
        Ok(())
    }

    /// Submit a full change: validate every candidate slot up front,
    /// remove the original reservation, and insert each candidate as a
    /// pending change record. If any insertion fails after the removal,
    /// the original is restored verbatim before the error is returned.
    pub fn change_request_full(
        &self,
        owner: &UserId,
        requester: &str,
        original: &OriginalRef,
        candidates: &[ChangeCandidate],
    ) -> Result<(), EngineError> {
        if candidates.is_empty() {
            return Err(EngineError::InvalidInput(
                "change request needs at least one candidate slot".to_owned(),
            ));
        }
        check_field(requester)?;
        for cand in candidates {
            for value in [
                &cand.room,
                &cand.date,
                &cand.weekday,
                &cand.slot,
                &cand.purpose,
                &cand.role,
            ] {
                check_field(value)?;
            }
        }
        let rooms = self.catalog.all();
        let orig_kind = kind_of(&rooms, original.room.trim());

        let _guard = self.lock();

        // Fail fast on the first conflicting candidate, before anything is
        // mutated.
        for cand in candidates {
            if self.store.slot_taken(&cand.room, &cand.date, &cand.slot)? {
                return Err(RuleViolation::Conflict {
                    room: cand.room.trim().to_owned(),
                    date: cand.date.trim().to_owned(),
                    slot: normalize_slot(&cand.slot).to_owned(),
                }
                .into());
            }
        }

        // Locate and remove the original, keeping its verbatim line. It may
        // live in the approved file of its kind or still be pending.
        let matches = |r: &Reservation| {
            (r.requester == requester.trim()
                || (!owner.as_str().is_empty() && r.owner == *owner))
                && r.occupies(&original.room, &original.date, &original.slot)
                && r.weekday == original.weekday.trim()
        };
        let (backup, source) = match self.store.take_approved_where(orig_kind, matches)? {
            Some(b) => (b, BackupSource::Approved(orig_kind)),
            None => match self.store.take_pending_where(matches)? {
                Some(b) => (b, BackupSource::Pending),
                None => {
                    return Err(RuleViolation::NotFound(format!(
                        "no reservation for {} {} slot {}",
                        original.room.trim(),
                        original.date.trim(),
                        normalize_slot(&original.slot)
                    ))
                    .into())
                }
            },
        };

        for cand in candidates {
            let record = ChangeRecord {
                owner: owner.clone(),
                slot: cand.slot.trim().to_owned(),
                date: cand.date.trim().to_owned(),
                weekday: cand.weekday.trim().to_owned(),
                room: RoomName::new(cand.room.trim()),
                requester: requester.trim().to_owned(),
                purpose: cand.purpose.trim().to_owned(),
                role: cand.role.trim().to_owned(),
                orig_slot: original.slot.trim().to_owned(),
                orig_date: original.date.trim().to_owned(),
                orig_weekday: original.weekday.trim().to_owned(),
                orig_room: RoomName::new(original.room.trim()),
                count: cand.count,
            };
            if let Err(e) = self.store.append_change(&record) {
                let restored = match source {
                    BackupSource::Approved(kind) => {
                        self.store.restore_approved(kind, &backup.line)
                    }
                    BackupSource::Pending => self.store.restore_pending(&backup.line),
                };
                if let Err(re) = restored {
                    error!("rollback of removed reservation failed: {re}");
                }
                warn!("full change failed while inserting candidates: {e}");
                return Err(e.into());
            }
        }

        info!(
            "full change recorded: {} candidates replace {} {} slot {}",
            candidates.len(),
            original.room.trim(),
            original.date.trim(),
            normalize_slot(&original.slot)
        );
        Ok(())
    }

    // ---- queries -------------------------------------------------------

    pub fn pending_requests(&self) -> Result<Vec<Reservation>, EngineError> {
        let _guard = self.lock();
        Ok(self.store.pending()?)
    }

    pub fn change_requests(&self) -> Result<Vec<ChangeRecord>, EngineError> {
        let _guard = self.lock();
        Ok(self.store.changes()?)
    }

    pub fn approved_reservations(&self, kind: RoomKind) -> Result<Vec<Reservation>, EngineError> {
        let _guard = self.lock();
        Ok(self.store.approved(kind)?)
    }

    /// Everything a user owns or requested, pending and approved.
    pub fn reservations_for(&self, user: &str) -> Result<Vec<Reservation>, EngineError> {
        let _guard = self.lock();
        let user = user.trim();
        let mut out: Vec<Reservation> = self
            .store
            .pending()?
            .into_iter()
            .filter(|r| r.requester == user || r.owner == user)
            .collect();
        for kind in [RoomKind::Lecture, RoomKind::Lab] {
            out.extend(
                self.store
                    .approved(kind)?
                    .into_iter()
                    .filter(|r| r.requester == user || r.owner == user),
            );
        }
        Ok(out)
    }

    /// Requests awaiting a decision: plain pending plus pending changes.
    pub fn pending_count(&self) -> Result<usize, EngineError> {
        let _guard = self.lock();
        Ok(self.store.pending()?.len() + self.store.changes()?.len())
    }

    /// Total approved headcount for a room on a date.
    pub fn reserved_count(&self, room: &str, date: &str) -> Result<u32, EngineError> {
        let _guard = self.lock();
        Ok(self.store.reserved_count(room, date)?)
    }

    /// Current room catalog snapshot.
    pub fn rooms(&self) -> Vec<Classroom> {
        self.catalog.all()
    }

    // ---- room administration -------------------------------------------

    pub fn add_room(&self, room: Classroom, by: &UserId) -> Result<(), EngineError> {
        self.require_staff(by)?;
        self.catalog.insert(room).map_err(catalog_error)
    }

    pub fn update_room_capacity(
        &self,
        name: &str,
        capacity: u32,
        by: &UserId,
    ) -> Result<(), EngineError> {
        self.require_staff(by)?;
        self.catalog
            .update_capacity(name, capacity)
            .map_err(catalog_error)
    }

    /// Remove a room definition. Blocked while any approved reservation
    /// still references it.
    pub fn remove_room(&self, name: &str, by: &UserId) -> Result<(), EngineError> {
        self.require_staff(by)?;
        {
            let _guard = self.lock();
            if self.store.references_room(name)? {
                return Err(RuleViolation::RoomInUse(name.trim().to_owned()).into());
            }
        }
        self.catalog.remove(name).map_err(catalog_error)
    }

    pub fn set_room_status(
        &self,
        room: &str,
        status: RoomStatus,
        by: &UserId,
    ) -> Result<(), EngineError> {
        self.require_staff(by)?;
        if !self.catalog.exists(room) {
            return Err(RuleViolation::RoomNotFound(room.trim().to_owned()).into());
        }
        self.status.set(room, status)?;
        Ok(())
    }

    pub fn room_status(&self, room: &str) -> RoomStatus {
        self.status.status(room)
    }

    // ---- internals ------------------------------------------------------

    fn resolve_name(&self, owner: &UserId, fallback: &str) -> String {
        self.directory
            .display_name(owner.as_str())
            .unwrap_or_else(|| fallback.to_owned())
    }

    fn emit(
        &self,
        owner: &UserId,
        kind: NotifyKind,
        room: &str,
        date: &str,
        weekday: &str,
        slot: &str,
    ) {
        let slot = normalize_slot(slot).to_owned();
        let message = match kind {
            NotifyKind::Approved => {
                format!("{room} {date}({weekday}) slot {slot} reservation approved")
            }
            NotifyKind::ChangeApproved => {
                format!("{room} {date}({weekday}) slot {slot} reservation change approved")
            }
            NotifyKind::Rejected => {
                format!("{room} {date}({weekday}) slot {slot} reservation rejected")
            }
            NotifyKind::ChangeRejected => {
                format!("{room} {date}({weekday}) slot {slot} reservation change rejected")
            }
            NotifyKind::Cancelled => {
                format!("reservation cancelled by staff: {room} {date}({weekday}) slot {slot}")
            }
        };
        let notification = Notification {
            recipient: owner.clone(),
            kind,
            room: RoomName::new(room.trim()),
            date: date.to_owned(),
            weekday: weekday.to_owned(),
            slot,
            message,
        };
        if let Err(e) = self.dispatcher.notify(&notification) {
            warn!("notification delivery for {owner} failed: {e}");
        }
    }
}

/// Room-kind lookup against a catalog snapshot taken before the store lock.
/// Rooms missing from the catalog fall back to the lab file.
fn kind_of(rooms: &[Classroom], name: &str) -> RoomKind {
    rooms
        .iter()
        .find(|r| r.name == name.trim())
        .map_or(RoomKind::Lab, |r| r.kind)
}

/// Keys of v1 records have no owner; fall back to the caller-supplied id.
fn effective_owner(record_owner: &UserId, key_owner: &UserId) -> UserId {
    if record_owner.as_str().is_empty() {
        key_owner.clone()
    } else {
        record_owner.clone()
    }
}

/// Flat-file fields must not contain the record separator.
fn check_field(value: &str) -> Result<(), EngineError> {
    if value.contains(',') || value.contains('\n') {
        return Err(EngineError::InvalidInput(format!(
            "field may not contain commas or newlines: {value:?}"
        )));
    }
    Ok(())
}

fn validate_submit_fields(req: &SubmitRequest) -> Result<(), EngineError> {
    for (label, value) in [
        ("requester", req.requester.trim()),
        ("room", req.room.trim()),
        ("weekday", req.weekday.trim()),
        ("slot", req.slot.trim()),
    ] {
        if value.is_empty() {
            return Err(EngineError::InvalidInput(format!("{label} must not be empty")));
        }
    }
    for value in [
        &req.requester,
        &req.room,
        &req.date,
        &req.weekday,
        &req.slot,
        &req.purpose,
        &req.role,
    ] {
        check_field(value)?;
    }
    if req.count == 0 {
        return Err(EngineError::InvalidInput(
            "participant count must be at least 1".to_owned(),
        ));
    }
    validate_recipient_id(req.owner.as_str())
        .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
    Ok(())
}

fn catalog_error(e: StoreError) -> EngineError {
    match e {
        StoreError::RoomNotFound(name) => RuleViolation::RoomNotFound(name).into(),
        StoreError::DuplicateRoom(name) => {
            RuleViolation::Duplicate(format!("room {name} already exists")).into()
        }
        StoreError::InvalidCapacity(c) => EngineError::InvalidInput(format!(
            "invalid capacity {c}: must be greater than zero"
        )),
        other => other.into(),
    }
}
