//! Record types, line codecs, and booking-key rules for Aula.
//!
//! This crate defines the schema layer: string-id newtypes (`UserId`,
//! `RoomName`), the comma-separated record shapes stored on disk
//! (`Reservation`, `ChangeRecord`, `Classroom`, `Notification`) with a
//! versioned decoder that tries the newest field layout first, and the
//! slot/date rules shared by admission control and the workflow.

pub mod record;
pub mod slot;
pub mod types;

pub use record::{
    ChangeRecord, Classroom, Notification, NotifyKind, RequestStatus, Reservation, RoomKind,
};
pub use slot::{earliest_allowed, normalize_slot, parse_booking_date, same_slot};
pub use types::{RoomName, UserId};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed record ({expected} fields expected, got {got}): {line}")]
    FieldCount {
        expected: &'static str,
        got: usize,
        line: String,
    },
    #[error("unknown room kind: {0}")]
    UnknownKind(String),
    #[error("unknown status token: {0}")]
    UnknownStatus(String),
    #[error("unknown notification kind: {0}")]
    UnknownNotifyKind(String),
    #[error("invalid participant count '{0}'")]
    InvalidCount(String),
    #[error("invalid capacity '{0}'")]
    InvalidCapacity(String),
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
}
