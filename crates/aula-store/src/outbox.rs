//! Per-recipient offline notification queue.
//!
//! One file per recipient under `outbox/`, appended in arrival order and
//! deleted wholesale after a successful drain. The queue is unbounded and
//! entries never expire.

use crate::linefile::LineFile;
use crate::{StoreError, StoreLayout};
use aula_schema::Notification;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Recipient ids become file names, so they are restricted to a safe
/// character set.
pub fn validate_recipient_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() || id.len() > 64 {
        return Err(StoreError::InvalidRecipient(
            "recipient id must be 1-64 characters".to_owned(),
        ));
    }
    if !id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(StoreError::InvalidRecipient(id.to_owned()));
    }
    Ok(())
}

pub struct Outbox {
    dir: PathBuf,
}

impl Outbox {
    pub fn new(layout: &StoreLayout) -> Self {
        Self {
            dir: layout.outbox_dir(),
        }
    }

    fn queue_path(&self, recipient: &str) -> PathBuf {
        self.dir.join(format!("{recipient}.txt"))
    }

    /// Append a notification to the recipient's queue.
    pub fn push(&self, notification: &Notification) -> Result<(), StoreError> {
        validate_recipient_id(notification.recipient.as_str())?;
        LineFile::new(self.queue_path(notification.recipient.as_str()))
            .append(&notification.encode())
    }

    /// Number of queued notifications for a recipient.
    pub fn len(&self, recipient: &str) -> Result<usize, StoreError> {
        validate_recipient_id(recipient)?;
        Ok(LineFile::new(self.queue_path(recipient)).lines()?.len())
    }

    pub fn is_empty(&self, recipient: &str) -> Result<bool, StoreError> {
        Ok(self.len(recipient)? == 0)
    }

    /// Remove and return the recipient's queue in FIFO order. Undecodable
    /// entries are dropped with a warning.
    pub fn take(&self, recipient: &str) -> Result<Vec<Notification>, StoreError> {
        validate_recipient_id(recipient)?;
        let path = self.queue_path(recipient);
        let lines = LineFile::new(&path).lines()?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        let mut out = Vec::with_capacity(lines.len());
        for line in lines {
            match Notification::decode(&line) {
                Ok(n) => out.push(n),
                Err(e) => warn!("dropping corrupt queued notification for {recipient}: {e}"),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_schema::{NotifyKind, RoomName, UserId};

    fn test_outbox() -> (tempfile::TempDir, Outbox) {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();
        (dir, Outbox::new(&layout))
    }

    fn note(recipient: &str, slot: &str) -> Notification {
        Notification {
            recipient: UserId::new(recipient),
            kind: NotifyKind::Approved,
            room: RoomName::new("908"),
            date: "2030-03-10".to_owned(),
            weekday: "Mon".to_owned(),
            slot: slot.to_owned(),
            message: format!("slot {slot} approved"),
        }
    }

    #[test]
    fn push_and_take_fifo() {
        let (_dir, outbox) = test_outbox();
        outbox.push(&note("S100", "1")).unwrap();
        outbox.push(&note("S100", "2")).unwrap();
        outbox.push(&note("S100", "3")).unwrap();

        let drained = outbox.take("S100").unwrap();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0].slot, "1");
        assert_eq!(drained[2].slot, "3");
    }

    #[test]
    fn take_clears_queue() {
        let (_dir, outbox) = test_outbox();
        outbox.push(&note("S100", "1")).unwrap();
        assert_eq!(outbox.len("S100").unwrap(), 1);

        outbox.take("S100").unwrap();
        assert!(outbox.is_empty("S100").unwrap());
        assert!(outbox.take("S100").unwrap().is_empty());
    }

    #[test]
    fn queues_are_per_recipient() {
        let (_dir, outbox) = test_outbox();
        outbox.push(&note("S100", "1")).unwrap();
        outbox.push(&note("S200", "2")).unwrap();

        assert_eq!(outbox.take("S100").unwrap().len(), 1);
        assert_eq!(outbox.len("S200").unwrap(), 1);
    }

    #[test]
    fn take_of_empty_queue_is_noop() {
        let (_dir, outbox) = test_outbox();
        assert!(outbox.take("S999").unwrap().is_empty());
    }

    #[test]
    fn recipient_id_validation() {
        assert!(validate_recipient_id("S100").is_ok());
        assert!(validate_recipient_id("user_1-a").is_ok());
        assert!(validate_recipient_id("").is_err());
        assert!(validate_recipient_id("has space").is_err());
        assert!(validate_recipient_id("../escape").is_err());
        assert!(validate_recipient_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn corrupt_entries_are_dropped() {
        let (dir, outbox) = test_outbox();
        outbox.push(&note("S100", "1")).unwrap();
        let path = dir.path().join("outbox").join("S100.txt");
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("garbage line\n");
        std::fs::write(&path, content).unwrap();

        let drained = outbox.take("S100").unwrap();
        assert_eq!(drained.len(), 1);
    }
}
