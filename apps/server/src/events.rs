//! Server-sent event bus. Notifications from the ledger are published here
//! and fanned out to every `/api/events` subscriber.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use finanzas_core::notifications::{LogNotificationSink, Notification, NotificationSink};

pub const NOTIFICATION: &str = "notification";
pub const SYNC_CYCLE_COMPLETE: &str = "sync:cycle-complete";

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerEvent {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ServerEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    pub fn with_payload(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload: Some(payload),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Publishing with no subscriber drops the event.
    pub fn publish(&self, event: ServerEvent) {
        if self.sender.send(event).is_err() {
            debug!("No event subscribers connected");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for EventBus {
    fn notify(&self, notification: Notification) {
        LogNotificationSink.notify(notification.clone());
        match serde_json::to_value(&notification) {
            Ok(payload) => self.publish(ServerEvent::with_payload(NOTIFICATION, payload)),
            Err(err) => debug!("Unserializable notification: {}", err),
        }
    }
}
