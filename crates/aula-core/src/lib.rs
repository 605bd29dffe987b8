//! Core reservation engine for Aula.
//!
//! This crate ties together the schema and store layers into the `Engine` —
//! the central API for submitting, approving, rejecting, cancelling, and
//! changing reservations. It also provides admission control, the request
//! lifecycle state machine, the notification dispatcher with live/offline
//! routing, the identity trait, and the process-exclusive store lock.

pub mod admission;
pub mod concurrency;
pub mod identity;
pub mod lifecycle;
pub mod notify;
pub mod workflow;

pub use admission::Admission;
pub use concurrency::{install_signal_handler, shutdown_requested, StoreLock};
pub use identity::{Directory, StaticDirectory};
pub use lifecycle::{validate_transition, RequestState};
pub use notify::{Channel, Dispatcher};
pub use workflow::{
    CancelRequest, ChangeCandidate, ChangeSubmission, Engine, OriginalRef, PendingRef,
    SubmitRequest,
};

use aula_store::StoreError;
use thiserror::Error;

/// A business-rule violation: detected locally, returned as a typed result,
/// never aborts the handling context.
#[derive(Debug, Error)]
pub enum RuleViolation {
    #[error("slot already booked: {room} {date} slot {slot}")]
    Conflict {
        room: String,
        date: String,
        slot: String,
    },
    #[error("{requested} participants exceed the admission ceiling of {allowed} for room {room}")]
    CapacityExceeded {
        room: String,
        requested: u32,
        allowed: u32,
    },
    #[error("room not found: {0}")]
    RoomNotFound(String),
    #[error("room unavailable: {0}")]
    RoomUnavailable(String),
    #[error("reservations must be made at least one day ahead (got {0})")]
    InvalidDate(String),
    #[error("duplicate: {0}")]
    Duplicate(String),
    #[error("no matching record: {0}")]
    NotFound(String),
    #[error("room {0} still has approved reservations")]
    RoomInUse(String),
}

impl RuleViolation {
    /// Stable token used in protocol error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            RuleViolation::Conflict { .. } => "CONFLICT",
            RuleViolation::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            RuleViolation::RoomNotFound(_) => "ROOM_NOT_FOUND",
            RuleViolation::RoomUnavailable(_) => "ROOM_UNAVAILABLE",
            RuleViolation::InvalidDate(_) => "INVALID_DATE",
            RuleViolation::Duplicate(_) => "DUPLICATE",
            RuleViolation::NotFound(_) => "NOT_FOUND",
            RuleViolation::RoomInUse(_) => "ROOM_IN_USE",
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("authorization denied for {0}")]
    AuthorizationDenied(String),
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl EngineError {
    /// Stable token used in protocol error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidInput(_) => "INVALID_INPUT",
            EngineError::AuthorizationDenied(_) => "ACCESS_DENIED",
            EngineError::Rule(v) => v.kind(),
            EngineError::Store(_) => "STORAGE",
            EngineError::InvalidTransition { .. } => "STATE",
            EngineError::Unexpected(_) => "UNEXPECTED",
        }
    }
}
