//! Notification dispatch: live delivery to registered channels or durable
//! queueing for offline recipients.
//!
//! Routing is an explicit choice between two sinks. The live sink pushes to
//! every channel registered for the recipient, fire-and-forget; the queue
//! sink appends to the per-recipient outbox. Selection happens per event,
//! by recipient presence at that moment. Per-recipient ordering is FIFO;
//! there is no ordering across recipients and no redelivery of a live push
//! lost to a crash.

use crate::EngineError;
use aula_schema::Notification;
use aula_store::Outbox;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A live delivery path to one connected session.
pub trait Channel: Send + Sync {
    fn push(&self, line: &str) -> std::io::Result<()>;
}

trait Sink {
    fn accept(&self, notification: &Notification) -> Result<(), EngineError>;
}

/// Immediate delivery to a set of live channels. No ack, no retry; a
/// failed push is logged and dropped.
struct LiveSink<'a> {
    channels: &'a [Arc<dyn Channel>],
}

impl Sink for LiveSink<'_> {
    fn accept(&self, notification: &Notification) -> Result<(), EngineError> {
        let line = notification.wire_line();
        for channel in self.channels {
            if let Err(e) = channel.push(&line) {
                warn!(
                    "live delivery to {} failed: {e}",
                    notification.recipient.as_str()
                );
            }
        }
        Ok(())
    }
}

/// Durable queueing for recipients with no live channel.
struct QueueSink<'a> {
    outbox: &'a Outbox,
}

impl Sink for QueueSink<'_> {
    fn accept(&self, notification: &Notification) -> Result<(), EngineError> {
        self.outbox.push(notification)?;
        debug!("queued notification for {}", notification.recipient.as_str());
        Ok(())
    }
}

pub struct Dispatcher {
    channels: Mutex<HashMap<String, Vec<Arc<dyn Channel>>>>,
    outbox: Outbox,
    pacing: Duration,
}

impl Dispatcher {
    pub fn new(outbox: Outbox) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            outbox,
            pacing: Duration::from_millis(100),
        }
    }

    /// Interval between messages when draining an offline queue.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn register(&self, id: &str, channel: Arc<dyn Channel>) {
        let mut channels = self.channels.lock().expect("dispatcher lock poisoned");
        channels.entry(id.to_owned()).or_default().push(channel);
    }

    /// Remove one previously registered channel, compared by identity.
    pub fn unregister(&self, id: &str, channel: &Arc<dyn Channel>) {
        let mut channels = self.channels.lock().expect("dispatcher lock poisoned");
        if let Some(list) = channels.get_mut(id) {
            list.retain(|c| !Arc::ptr_eq(c, channel));
            if list.is_empty() {
                channels.remove(id);
            }
        }
    }

    pub fn has_live_channel(&self, id: &str) -> bool {
        self.channels
            .lock()
            .expect("dispatcher lock poisoned")
            .get(id)
            .is_some_and(|list| !list.is_empty())
    }

    /// Deliver an event: live if the recipient has a channel right now,
    /// queued otherwise.
    pub fn notify(&self, notification: &Notification) -> Result<(), EngineError> {
        let recipient = notification.recipient.as_str();
        let live: Vec<Arc<dyn Channel>> = {
            let channels = self.channels.lock().expect("dispatcher lock poisoned");
            channels.get(recipient).cloned().unwrap_or_default()
        };

        if live.is_empty() {
            QueueSink {
                outbox: &self.outbox,
            }
            .accept(notification)
        } else {
            LiveSink { channels: &live }.accept(notification)
        }
    }

    /// Register a channel for a connecting recipient, then drain their
    /// offline queue FIFO, one message per pacing interval. Returns the
    /// number of messages delivered from the queue.
    pub fn on_connect(&self, id: &str, channel: Arc<dyn Channel>) -> Result<usize, EngineError> {
        self.register(id, Arc::clone(&channel));

        let queued = self.outbox.take(id)?;
        if queued.is_empty() {
            return Ok(0);
        }

        info!("delivering {} queued notifications to {id}", queued.len());
        let mut delivered = 0;
        for (i, notification) in queued.iter().enumerate() {
            if i > 0 {
                std::thread::sleep(self.pacing);
            }
            match channel.push(&notification.wire_line()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("offline drain to {id} failed: {e}"),
            }
        }
        Ok(delivered)
    }
}
