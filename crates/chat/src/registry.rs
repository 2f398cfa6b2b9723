//! Connection registry: routing key -> live subscriber set.
//!
//! The registry references connections, it never owns them: the lifecycle
//! manager is responsible for removing a connection from every key it
//! subscribed to when it dies.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::events::ServerEvent;
use crate::scope::RoutingKey;

/// Outbound event queue of a single connection.
pub type EventSender = mpsc::Sender<ServerEvent>;

/// Process-local identity of a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle to a live connection: identity plus its outbound queue.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    user_id: i64,
    sender: EventSender,
}

impl ConnectionHandle {
    pub fn new(user_id: i64, sender: EventSender) -> Self {
        Self {
            id: ConnectionId::new(),
            user_id,
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Queue an event without blocking; the dispatcher interprets failures.
    pub(crate) fn push(&self, event: ServerEvent) -> Result<(), mpsc::error::TrySendError<ServerEvent>> {
        self.sender.try_send(event)
    }
}

/// Thread-safe mapping from routing key to the set of subscribed connections.
#[derive(Default)]
pub struct ConnectionRegistry {
    topics: RwLock<HashMap<RoutingKey, HashMap<ConnectionId, ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection to a key. Subscribing the same connection to
    /// the same key twice is idempotent.
    pub async fn subscribe(&self, key: &RoutingKey, handle: &ConnectionHandle) {
        let mut topics = self.topics.write().await;
        topics
            .entry(key.clone())
            .or_default()
            .insert(handle.id(), handle.clone());
    }

    /// Remove a connection from a key. Unsubscribing a connection that is
    /// not present is a no-op.
    pub async fn unsubscribe(&self, key: &RoutingKey, id: ConnectionId) {
        let mut topics = self.topics.write().await;
        if let Some(subscribers) = topics.get_mut(key) {
            subscribers.remove(&id);
            if subscribers.is_empty() {
                topics.remove(key);
            }
        }
    }

    /// Point-in-time snapshot of a key's subscribers. Iterating the snapshot
    /// during fan-out is never invalidated by concurrent mutations.
    pub async fn subscribers(&self, key: &RoutingKey) -> Vec<ConnectionHandle> {
        let topics = self.topics.read().await;
        topics
            .get(key)
            .map(|subscribers| subscribers.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of subscribers currently registered for a key.
    pub async fn subscriber_count(&self, key: &RoutingKey) -> usize {
        let topics = self.topics.read().await;
        topics.get(key).map(|s| s.len()).unwrap_or(0)
    }
}
