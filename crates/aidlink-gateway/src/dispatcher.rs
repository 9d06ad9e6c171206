use std::sync::Arc;

use tokio::sync::broadcast;

use aidlink_types::events::StoreEvent;

/// Fan-out point for store-change notifications. Write handlers publish
/// here; every gateway connection holds a receiver and re-queries the
/// store to ship fresh snapshots to its client.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    tx: broadcast::Sender<StoreEvent>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner { tx }),
        }
    }

    /// Subscribe to store changes. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.tx.subscribe()
    }

    /// Publish a store change to all connected sessions. Delivery is
    /// best-effort: with no receivers the event is dropped.
    pub fn publish(&self, event: StoreEvent) {
        let _ = self.inner.tx.send(event);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let dispatcher = Dispatcher::new();
        let mut rx = dispatcher.subscribe();

        dispatcher.publish(StoreEvent::ChatsChanged);

        match rx.recv().await.unwrap() {
            StoreEvent::ChatsChanged => {}
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        let dispatcher = Dispatcher::new();
        dispatcher.publish(StoreEvent::BoardsChanged);
    }
}
