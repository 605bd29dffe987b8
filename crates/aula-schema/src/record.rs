//! On-disk record shapes and their comma-separated line codecs.
//!
//! Every store file is one record per line, comma-separated. The decoder
//! for each shape tries the newest field layout first and falls back to
//! older layouts by field count, so files written by earlier releases keep
//! loading. Encoding always writes the newest layout.

use crate::slot::same_slot;
use crate::types::{RoomName, UserId};
use crate::SchemaError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoomKind {
    Lecture,
    Lab,
}

impl RoomKind {
    /// Parse a kind token. `CLASS` is the legacy spelling of `LECTURE`.
    pub fn parse(token: &str) -> Result<Self, SchemaError> {
        match token.trim() {
            "LECTURE" | "CLASS" => Ok(RoomKind::Lecture),
            "LAB" => Ok(RoomKind::Lab),
            other => Err(SchemaError::UnknownKind(other.to_owned())),
        }
    }
}

impl std::fmt::Display for RoomKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomKind::Lecture => write!(f, "LECTURE"),
            RoomKind::Lab => write!(f, "LAB"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Approved,
}

impl RequestStatus {
    /// Parse a status token. `RESERVED` is the legacy spelling of `APPROVED`.
    pub fn parse(token: &str) -> Result<Self, SchemaError> {
        match token.trim() {
            "PENDING" => Ok(RequestStatus::Pending),
            "APPROVED" | "RESERVED" => Ok(RequestStatus::Approved),
            other => Err(SchemaError::UnknownStatus(other.to_owned())),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "PENDING"),
            RequestStatus::Approved => write!(f, "APPROVED"),
        }
    }
}

/// A bookable room as stored in the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classroom {
    pub name: RoomName,
    pub kind: RoomKind,
    pub capacity: u32,
}

impl Classroom {
    /// The admission ceiling: half the declared capacity, rounded down.
    pub fn allowed_capacity(&self) -> u32 {
        self.capacity / 2
    }

    pub fn encode(&self) -> String {
        format!("{},{},{}", self.name, self.kind, self.capacity)
    }

    pub fn decode(line: &str) -> Result<Self, SchemaError> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 3 {
            return Err(SchemaError::FieldCount {
                expected: "3",
                got: fields.len(),
                line: line.to_owned(),
            });
        }
        let capacity: u32 = fields[2]
            .trim()
            .parse()
            .map_err(|_| SchemaError::InvalidCapacity(fields[2].trim().to_owned()))?;
        Ok(Self {
            name: RoomName::new(fields[0].trim()),
            kind: RoomKind::parse(fields[1])?,
            capacity,
        })
    }
}

/// A reservation record: a pending request or an approved reservation.
///
/// Current layout (v2, 10 fields):
/// `requester,room,date,weekday,slot,purpose,role,status,count,owner_id`.
/// The legacy layout (v1, 9 fields) lacks the trailing owner id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub requester: String,
    pub room: RoomName,
    pub date: String,
    pub weekday: String,
    pub slot: String,
    pub purpose: String,
    pub role: String,
    pub status: RequestStatus,
    pub count: u32,
    /// Account id of the owner. Empty for v1 records.
    pub owner: UserId,
}

impl Reservation {
    pub fn encode(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            self.requester,
            self.room,
            self.date,
            self.weekday,
            self.slot,
            self.purpose,
            self.role,
            self.status,
            self.count,
            self.owner
        )
    }

    pub fn decode(line: &str) -> Result<Self, SchemaError> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 9 {
            return Err(SchemaError::FieldCount {
                expected: "9 or 10",
                got: fields.len(),
                line: line.to_owned(),
            });
        }
        let count: u32 = fields[8]
            .trim()
            .parse()
            .map_err(|_| SchemaError::InvalidCount(fields[8].trim().to_owned()))?;
        let owner = if fields.len() >= 10 {
            UserId::new(fields[9].trim())
        } else {
            UserId::new("")
        };
        Ok(Self {
            requester: fields[0].trim().to_owned(),
            room: RoomName::new(fields[1].trim()),
            date: fields[2].trim().to_owned(),
            weekday: fields[3].trim().to_owned(),
            slot: fields[4].trim().to_owned(),
            purpose: fields[5].trim().to_owned(),
            role: fields[6].trim().to_owned(),
            status: RequestStatus::parse(fields[7])?,
            count,
            owner,
        })
    }

    /// True when the record occupies the given (room, date, slot) key,
    /// with slot labels compared after normalization.
    pub fn occupies(&self, room: &str, date: &str, slot: &str) -> bool {
        self.room == room.trim() && self.date == date.trim() && same_slot(&self.slot, slot)
    }
}

/// A pending change request: the proposed new booking plus the key of the
/// approved reservation it would supersede.
///
/// Layout (13 fields):
/// `owner,slot,date,weekday,room,requester,purpose,role,orig_slot,orig_date,orig_weekday,orig_room,count`.
/// Older, shorter change records are skipped by scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub owner: UserId,
    pub slot: String,
    pub date: String,
    pub weekday: String,
    pub room: RoomName,
    pub requester: String,
    pub purpose: String,
    pub role: String,
    pub orig_slot: String,
    pub orig_date: String,
    pub orig_weekday: String,
    pub orig_room: RoomName,
    pub count: u32,
}

impl ChangeRecord {
    pub fn encode(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.owner,
            self.slot,
            self.date,
            self.weekday,
            self.room,
            self.requester,
            self.purpose,
            self.role,
            self.orig_slot,
            self.orig_date,
            self.orig_weekday,
            self.orig_room,
            self.count
        )
    }

    pub fn decode(line: &str) -> Result<Self, SchemaError> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 13 {
            return Err(SchemaError::FieldCount {
                expected: "13",
                got: fields.len(),
                line: line.to_owned(),
            });
        }
        let count: u32 = fields[12]
            .trim()
            .parse()
            .map_err(|_| SchemaError::InvalidCount(fields[12].trim().to_owned()))?;
        Ok(Self {
            owner: UserId::new(fields[0].trim()),
            slot: fields[1].trim().to_owned(),
            date: fields[2].trim().to_owned(),
            weekday: fields[3].trim().to_owned(),
            room: RoomName::new(fields[4].trim()),
            requester: fields[5].trim().to_owned(),
            purpose: fields[6].trim().to_owned(),
            role: fields[7].trim().to_owned(),
            orig_slot: fields[8].trim().to_owned(),
            orig_date: fields[9].trim().to_owned(),
            orig_weekday: fields[10].trim().to_owned(),
            orig_room: RoomName::new(fields[11].trim()),
            count,
        })
    }

    /// True when the proposed new booking occupies the given key.
    pub fn occupies(&self, room: &str, date: &str, slot: &str) -> bool {
        self.room == room.trim() && self.date == date.trim() && same_slot(&self.slot, slot)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotifyKind {
    Approved,
    Rejected,
    ChangeApproved,
    ChangeRejected,
    Cancelled,
}

impl NotifyKind {
    pub fn parse(token: &str) -> Result<Self, SchemaError> {
        match token.trim() {
            "APPROVED" => Ok(NotifyKind::Approved),
            "REJECTED" => Ok(NotifyKind::Rejected),
            "CHANGE_APPROVED" => Ok(NotifyKind::ChangeApproved),
            "CHANGE_REJECTED" => Ok(NotifyKind::ChangeRejected),
            "CANCELLED" => Ok(NotifyKind::Cancelled),
            other => Err(SchemaError::UnknownNotifyKind(other.to_owned())),
        }
    }
}

impl std::fmt::Display for NotifyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyKind::Approved => write!(f, "APPROVED"),
            NotifyKind::Rejected => write!(f, "REJECTED"),
            NotifyKind::ChangeApproved => write!(f, "CHANGE_APPROVED"),
            NotifyKind::ChangeRejected => write!(f, "CHANGE_REJECTED"),
            NotifyKind::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A workflow outcome notification addressed to one recipient.
///
/// Stored layout puts the free-text message last and decodes with a bounded
/// split, so messages may contain commas:
/// `recipient,kind,room,date,weekday,slot,message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: UserId,
    pub kind: NotifyKind,
    pub room: RoomName,
    pub date: String,
    pub weekday: String,
    pub slot: String,
    pub message: String,
}

impl Notification {
    pub fn encode(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            self.recipient, self.kind, self.room, self.date, self.weekday, self.slot, self.message
        )
    }

    pub fn decode(line: &str) -> Result<Self, SchemaError> {
        let fields: Vec<&str> = line.splitn(7, ',').collect();
        if fields.len() < 7 {
            return Err(SchemaError::FieldCount {
                expected: "7",
                got: fields.len(),
                line: line.to_owned(),
            });
        }
        Ok(Self {
            recipient: UserId::new(fields[0].trim()),
            kind: NotifyKind::parse(fields[1])?,
            room: RoomName::new(fields[2].trim()),
            date: fields[3].trim().to_owned(),
            weekday: fields[4].trim().to_owned(),
            slot: fields[5].trim().to_owned(),
            message: fields[6].trim().to_owned(),
        })
    }

    /// The line pushed to a connected client.
    pub fn wire_line(&self) -> String {
        format!(
            "NOTIFY,{},{},{},{},{},{}",
            self.kind, self.room, self.date, self.weekday, self.slot, self.message
        )
    }
}
