//! Per-connection lifecycle: subscribe on open, tear down exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::registry::{ConnectionHandle, ConnectionId, ConnectionRegistry};
use crate::scope::RoutingKey;

/// Owns a live connection's registry membership.
///
/// State machine: `Connecting -> Open -> Closed`. `Connecting` is the
/// handshake authorization performed before this struct exists; `open`
/// enters `Open` by subscribing the handle to its keys; `close` enters
/// `Closed` and unsubscribes every key exactly once, even when an error
/// path and an explicit close race.
pub struct ConnectionLifecycle {
    registry: Arc<ConnectionRegistry>,
    handle: ConnectionHandle,
    keys: Vec<RoutingKey>,
    closed: AtomicBool,
}

impl ConnectionLifecycle {
    /// Subscribe `handle` to each key and return the open connection.
    pub async fn open(
        registry: Arc<ConnectionRegistry>,
        handle: ConnectionHandle,
        keys: Vec<RoutingKey>,
    ) -> Self {
        for key in &keys {
            registry.subscribe(key, &handle).await;
        }

        info!(
            connection_id = %handle.id(),
            user_id = handle.user_id(),
            groups = keys.len(),
            "connection open"
        );

        Self {
            registry,
            handle,
            keys,
            closed: AtomicBool::new(false),
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn user_id(&self) -> i64 {
        self.handle.user_id()
    }

    pub fn keys(&self) -> &[RoutingKey] {
        &self.keys
    }

    /// Remove the connection from every subscribed key. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        for key in &self.keys {
            self.registry.unsubscribe(key, self.handle.id()).await;
        }

        info!(
            connection_id = %self.handle.id(),
            user_id = self.handle.user_id(),
            "connection closed"
        );
    }
}
