//! Notifications the bridge broadcasts to the application

use std::sync::Arc;

use flume::{Receiver, Sender};
use ndef_types::{NfcStatus, Tag};
use parking_lot::RwLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum BridgeEvent {
    /// The application signalled readiness, launch-time tags follow this
    DeviceReady,
    /// Tag from the persistent tag listener
    Tag { tag: Tag },
    /// Tag from the persistent ndef listener
    Ndef { tag: Tag },
    StateChange { status: NfcStatus },
}

impl BridgeEvent {
    /// Event name as seen by web hosts
    pub fn name(&self) -> &'static str {
        match self {
            BridgeEvent::DeviceReady => "deviceready",
            BridgeEvent::Tag { .. } => "ndef-tag",
            BridgeEvent::Ndef { .. } => "ndef",
            BridgeEvent::StateChange { .. } => "nfcstatechange",
        }
    }

    pub fn tag(&self) -> Option<&Tag> {
        match self {
            BridgeEvent::Tag { tag } | BridgeEvent::Ndef { tag } => Some(tag),
            _ => None,
        }
    }
}

/// Broadcasts every event to all current subscribers
#[derive(Debug, Clone, Default)]
pub struct EventBus(Arc<RwLock<Vec<Sender<BridgeEvent>>>>);

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<BridgeEvent> {
        let (sender, receiver) = flume::unbounded();
        self.0.write().push(sender);
        receiver
    }

    pub fn dispatch(&self, event: BridgeEvent) {
        debug!("dispatch {}", event.name());

        // subscribers whose receiver was dropped are removed here
        self.0
            .write()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let tag = Tag::new("01", vec![]);
        assert_eq!(BridgeEvent::DeviceReady.name(), "deviceready");
        assert_eq!(BridgeEvent::Tag { tag: tag.clone() }.name(), "ndef-tag");
        assert_eq!(BridgeEvent::Ndef { tag }.name(), "ndef");
        assert_eq!(
            BridgeEvent::StateChange {
                status: NfcStatus::NfcOk
            }
            .name(),
            "nfcstatechange"
        );
    }

    #[test]
    fn test_dispatch_reaches_every_subscriber() {
        let bus = EventBus::new();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.dispatch(BridgeEvent::DeviceReady);

        assert_eq!(first.try_recv().unwrap(), BridgeEvent::DeviceReady);
        assert_eq!(second.try_recv().unwrap(), BridgeEvent::DeviceReady);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.dispatch(BridgeEvent::DeviceReady);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.len(), 1);
    }
}
