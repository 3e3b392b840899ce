use log::{debug, warn};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::types::ArtifactEvent;

/// Best-effort fan-out of artifact events to live observers.
///
/// Backed by a `tokio::sync::broadcast` channel: `broadcast` returns without
/// waiting on any observer, a slow observer lags and skips events rather than
/// blocking the ingestion path, and a dropped receiver simply stops counting.
/// Events reach each observer in the order they were broadcast.
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<ArtifactEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register a new observer. The returned connection is the subscription;
    /// dropping it is the unsubscribe.
    pub fn subscribe(&self) -> ObserverConnection {
        let connection = ObserverConnection {
            id: Uuid::new_v4(),
            receiver: self.tx.subscribe(),
        };
        debug!("Observer {} subscribed", connection.id);
        connection
    }

    /// Publish one event to every currently-subscribed observer.
    ///
    /// Zero observers is a no-op, not an error.
    pub fn broadcast(&self, event: ArtifactEvent) {
        match self.tx.send(event) {
            Ok(n) => debug!("Broadcast reached {} observer(s)", n),
            Err(_) => debug!("No observers connected, event dropped"),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live subscription to broadcast events.
pub struct ObserverConnection {
    pub id: Uuid,
    receiver: broadcast::Receiver<ArtifactEvent>,
}

impl ObserverConnection {
    /// Receive the next event, or `None` once the broadcaster is gone.
    ///
    /// A lagged observer (send rate beyond the channel capacity) skips the
    /// missed events and keeps receiving; the skip is logged, not surfaced.
    pub async fn recv(&mut self) -> Option<ArtifactEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Observer {} lagged, skipped {} event(s)", self.id, n);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
