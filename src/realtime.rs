use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Role, RoleSet};
use crate::workflow::ports::Broadcaster;

/// Audience of a live event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Topic {
    User(Uuid),
    Role(Role),
}

impl Topic {
    /// Whether a client signed in as `user_id` with `roles` should receive events on this topic.
    pub fn admits(&self, user_id: Uuid, roles: &RoleSet) -> bool {
        match self {
            Topic::User(id) => *id == user_id,
            Topic::Role(role) => roles.contains(*role),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveEvent {
    pub topic: Topic,
    pub name: String,
    pub message: String,
    pub leave_request_id: Option<i64>,
    pub at: DateTime<Utc>,
}

impl LiveEvent {
    pub fn new(topic: Topic, name: &str, message: impl Into<String>) -> Self {
        Self {
            topic,
            name: name.to_string(),
            message: message.into(),
            leave_request_id: None,
            at: Utc::now(),
        }
    }

    pub fn about(mut self, leave_request_id: i64) -> Self {
        self.leave_request_id = Some(leave_request_id);
        self
    }
}

/// In-process fan-out of live events to every connected SSE stream.
/// Each stream filters by topic; nothing is buffered for absent clients.
pub struct EventHub {
    tx: broadcast::Sender<LiveEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Broadcaster for EventHub {
    fn publish(&self, event: LiveEvent) {
        let name = event.name.clone();
        // Send only fails when nobody is connected.
        if self.tx.send(event).is_err() {
            tracing::trace!(event = %name, "No live subscribers");
        }
    }
}
