//! Admission control: room, date, capacity, and conflict checks.
//!
//! Policy is first-submission-wins: a later submission for an occupied
//! (room, date, slot) key is rejected outright, with no queueing and no
//! priority.

use crate::{EngineError, RuleViolation};
use aula_schema::{parse_booking_date, Classroom};
use aula_store::{Catalog, ReservationStore, RoomStatusStore};
use chrono::NaiveDate;
use std::sync::Arc;

pub struct Admission {
    catalog: Arc<Catalog>,
    status: Arc<RoomStatusStore>,
}

impl Admission {
    pub fn new(catalog: Arc<Catalog>, status: Arc<RoomStatusStore>) -> Self {
        Self { catalog, status }
    }

    /// The room must exist in the catalog and must not be overridden
    /// unavailable. Returns the definition so callers can reuse it without
    /// touching the catalog again while holding the store lock.
    pub fn check_room(&self, room: &str) -> Result<Classroom, EngineError> {
        let def = self
            .catalog
            .get(room)
            .ok_or_else(|| RuleViolation::RoomNotFound(room.trim().to_owned()))?;
        if !self.status.is_available(room) {
            return Err(RuleViolation::RoomUnavailable(room.trim().to_owned()).into());
        }
        Ok(def)
    }

    /// The requested headcount must not exceed half the room's capacity.
    pub fn check_capacity(&self, room: &Classroom, requested: u32) -> Result<(), EngineError> {
        let allowed = room.allowed_capacity();
        if requested > allowed {
            return Err(RuleViolation::CapacityExceeded {
                room: room.name.to_string(),
                requested,
                allowed,
            }
            .into());
        }
        Ok(())
    }

    /// The booking date must parse and be at least one day ahead.
    pub fn check_date(&self, date: &str) -> Result<NaiveDate, EngineError> {
        check_date_against(date, chrono::Local::now().date_naive())
    }

    /// Any live record at (room, date, slot) is a conflict. Must be called
    /// with the store lock held.
    pub fn check_conflict(
        &self,
        store: &ReservationStore,
        room: &str,
        date: &str,
        slot: &str,
    ) -> Result<(), EngineError> {
        if store.slot_taken(room, date, slot)? {
            return Err(RuleViolation::Conflict {
                room: room.trim().to_owned(),
                date: date.trim().to_owned(),
                slot: aula_schema::normalize_slot(slot).to_owned(),
            }
            .into());
        }
        Ok(())
    }
}

/// Date rule against an explicit "today", for deterministic tests.
pub fn check_date_against(date: &str, today: NaiveDate) -> Result<NaiveDate, EngineError> {
    let parsed =
        parse_booking_date(date).map_err(|_| EngineError::InvalidInput(format!(
            "malformed date '{}' (expected YYYY-MM-DD)",
            date.trim()
        )))?;
    if parsed < aula_schema::earliest_allowed(today) {
        return Err(RuleViolation::InvalidDate(date.trim().to_owned()).into());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_store::StoreLayout;

    fn setup() -> (tempfile::TempDir, Admission, ReservationStore) {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();
        let catalog = Arc::new(Catalog::open(&layout).unwrap());
        let status = Arc::new(RoomStatusStore::open(&layout).unwrap());
        let store = ReservationStore::new(layout);
        (dir, Admission::new(catalog, status), store)
    }

    #[test]
    fn check_room_accepts_catalog_room() {
        let (_dir, admission, _store) = setup();
        let def = admission.check_room("908").unwrap();
        assert_eq!(def.capacity, 30);
    }

    #[test]
    fn check_room_rejects_unknown() {
        let (_dir, admission, _store) = setup();
        let err = admission.check_room("999").unwrap_err();
        assert_eq!(err.kind(), "ROOM_NOT_FOUND");
    }

    #[test]
    fn check_room_rejects_unavailable_override() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();
        let catalog = Arc::new(Catalog::open(&layout).unwrap());
        let status = Arc::new(RoomStatusStore::open(&layout).unwrap());
        status.set("912", aula_store::RoomStatus::Unavailable).unwrap();
        let admission = Admission::new(catalog, status);

        let err = admission.check_room("912").unwrap_err();
        assert_eq!(err.kind(), "ROOM_UNAVAILABLE");
        assert!(admission.check_room("908").is_ok());
    }

    #[test]
    fn capacity_ceiling_is_half() {
        let (_dir, admission, _store) = setup();
        let room = admission.check_room("908").unwrap();
        assert!(admission.check_capacity(&room, 15).is_ok());
        let err = admission.check_capacity(&room, 16).unwrap_err();
        assert_eq!(err.kind(), "CAPACITY_EXCEEDED");
    }

    #[test]
    fn date_must_be_tomorrow_or_later() {
        let today = NaiveDate::from_ymd_opt(2030, 3, 9).unwrap();
        assert!(check_date_against("2030-03-10", today).is_ok());
        assert!(check_date_against("2030-06-01", today).is_ok());

        let err = check_date_against("2030-03-09", today).unwrap_err();
        assert_eq!(err.kind(), "INVALID_DATE");
        let err = check_date_against("2030-03-08", today).unwrap_err();
        assert_eq!(err.kind(), "INVALID_DATE");
    }

    #[test]
    fn malformed_date_is_invalid_input() {
        let today = NaiveDate::from_ymd_opt(2030, 3, 9).unwrap();
        let err = check_date_against("soon", today).unwrap_err();
        assert_eq!(err.kind(), "INVALID_INPUT");
    }

    #[test]
    fn conflict_detected_against_live_records() {
        let (_dir, admission, store) = setup();
        assert!(admission
            .check_conflict(&store, "908", "2030-03-10", "1")
            .is_ok());

        store
            .append_pending(&aula_schema::Reservation {
                requester: "alice".to_owned(),
                room: aula_schema::RoomName::new("908"),
                date: "2030-03-10".to_owned(),
                weekday: "Mon".to_owned(),
                slot: "1".to_owned(),
                purpose: "study".to_owned(),
                role: "student".to_owned(),
                status: aula_schema::RequestStatus::Pending,
                count: 5,
                owner: aula_schema::UserId::new("S100"),
            })
            .unwrap();

        let err = admission
            .check_conflict(&store, "908", "2030-03-10", "1 (09:00-10:00)")
            .unwrap_err();
        assert_eq!(err.kind(), "CONFLICT");
    }
}
