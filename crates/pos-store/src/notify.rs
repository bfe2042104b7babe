//! Change notifications.
//!
//! Every successful write publishes an [`ChangeEvent::Update`]; a completed
//! restore publishes [`ChangeEvent::Restore`]. Delivery is best-effort: no
//! acknowledgement, no retry, and a subscriber that falls behind loses the
//! oldest events.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

/// Default notifier buffer size.
pub const DEFAULT_CAPACITY: usize = 64;

/// A change published by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChangeEvent {
    /// A key was written.
    Update {
        /// The key written.
        key: String,
        /// The value written.
        value: Value,
        /// Write time in unix milliseconds.
        timestamp: i64,
    },
    /// The whole store was replaced from a backup.
    Restore {
        /// Restore time in unix milliseconds.
        timestamp: i64,
    },
}

/// Publish/subscribe bus for [`ChangeEvent`]s.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Option<broadcast::Sender<ChangeEvent>>,
}

impl Notifier {
    /// Create a notifier buffering up to `capacity` events per subscriber.
    /// A capacity of zero disables notifications.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let tx = (capacity > 0).then(|| broadcast::channel(capacity).0);
        Self { tx }
    }

    /// Whether notifications are enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Subscribe to future events. `None` when notifications are disabled.
    #[must_use]
    pub fn subscribe(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
        self.tx.as_ref().map(broadcast::Sender::subscribe)
    }

    /// Publish an event. Without subscribers this does nothing.
    pub fn publish(&self, event: ChangeEvent) {
        if let Some(tx) = &self.tx {
            trace!(?event, "publishing change");
            // No receivers is not an error.
            let _ = tx.send(event);
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
