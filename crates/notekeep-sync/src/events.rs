//! Sync events and the broadcast bus that carries them.
//!
//! The controller emits an event whenever a local collection is replaced by
//! server truth or a mutation settles. Views subscribe independently; a slow
//! subscriber lags and loses old events rather than blocking the controller.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::mutation::MutationRecord;

/// Notification published by the sync controller.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SyncEvent {
    /// The note collection was replaced by a fresh fetch.
    NotesReloaded { count: usize },
    /// The tag collection was replaced by a fresh fetch.
    TagsReloaded { count: usize },
    /// A tag was created, renamed, or deleted. Embedded tag snapshots in
    /// loaded notes stay stale until the next full load.
    TagsChanged,
    /// A mutation reached a terminal state.
    MutationSettled { record: MutationRecord },
}

impl SyncEvent {
    /// Short event name for logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::NotesReloaded { .. } => "notes.reloaded",
            SyncEvent::TagsReloaded { .. } => "tags.reloaded",
            SyncEvent::TagsChanged => "tags.changed",
            SyncEvent::MutationSettled { .. } => "mutation.settled",
        }
    }
}

/// Broadcast channel for sync events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. Dropped silently when nobody listens.
    pub fn emit(&self, event: SyncEvent) {
        tracing::debug!(
            event_type = event.event_type(),
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.emit(SyncEvent::NotesReloaded { count: 3 });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, SyncEvent::NotesReloaded { count: 3 }));
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new(8);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(SyncEvent::TagsChanged);

        assert!(matches!(rx1.recv().await.unwrap(), SyncEvent::TagsChanged));
        assert!(matches!(rx2.recv().await.unwrap(), SyncEvent::TagsChanged));
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new(8);
        bus.emit(SyncEvent::TagsReloaded { count: 0 });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(SyncEvent::NotesReloaded { count: 2 }).unwrap();
        assert_eq!(json["type"], "NotesReloaded");
        assert_eq!(json["count"], 2);
    }
}
