//! Fan-out dispatcher: push one message to every live subscriber of a key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::events::{MessageEvent, ServerEvent};
use crate::registry::ConnectionRegistry;
use crate::scope::RoutingKey;

type KeyLocks = Arc<StdMutex<HashMap<RoutingKey, Arc<Mutex<()>>>>>;

/// Delivers messages to the current subscribers of a routing key.
///
/// Dispatches on the same key are serialized through [`DispatchGuard`]s:
/// the guard for message N+1 cannot be acquired before message N's guard
/// drops, so a single connection never observes two messages of one key
/// out of creation order. Different keys dispatch independently.
pub struct FanoutDispatcher {
    registry: Arc<ConnectionRegistry>,
    key_locks: KeyLocks,
}

/// Exclusive dispatch slot for one routing key.
///
/// The caller holds the guard across persist and push so storage order
/// and push order agree. Dropping the guard releases the slot and prunes
/// the key's lock entry once nothing else holds or waits on it.
pub struct DispatchGuard {
    key: RoutingKey,
    locks: KeyLocks,
    _permit: OwnedMutexGuard<()>,
}

impl DispatchGuard {
    pub fn key(&self) -> &RoutingKey {
        &self.key
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Two references left means the map entry and our own permit:
        // nobody else holds or waits on this key.
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 2)
        {
            locks.remove(&self.key);
        }
    }
}

impl FanoutDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            key_locks: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Acquire the key's dispatch slot. Slots are granted in request
    /// order; the push phase for a later message cannot start before an
    /// earlier guard on the same key drops.
    pub async fn acquire(&self, key: &RoutingKey) -> DispatchGuard {
        let lock = {
            let mut locks = self
                .key_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            locks.entry(key.clone()).or_default().clone()
        };

        DispatchGuard {
            key: key.clone(),
            locks: self.key_locks.clone(),
            _permit: lock.lock_owned().await,
        }
    }

    /// Push `event` to every subscriber of the guard's key; returns how
    /// many accepted the push.
    ///
    /// Failures are isolated per connection: a full queue is logged and
    /// skipped, a closed queue additionally drops that subscription. An
    /// empty subscriber set simply returns zero, the message stays
    /// retrievable via history.
    pub async fn dispatch(&self, guard: &DispatchGuard, event: &MessageEvent) -> usize {
        let key = guard.key();

        let subscribers = self.registry.subscribers(key).await;
        if subscribers.is_empty() {
            debug!(group = %key, message_id = event.message_id, "no live subscribers");
            return 0;
        }

        let mut delivered = 0;
        for subscriber in subscribers {
            match subscriber.push(ServerEvent::Message {
                message: event.clone(),
            }) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        group = %key,
                        connection_id = %subscriber.id(),
                        user_id = subscriber.user_id(),
                        message_id = event.message_id,
                        "subscriber queue full, push dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(
                        group = %key,
                        connection_id = %subscriber.id(),
                        user_id = subscriber.user_id(),
                        "subscriber gone, dropping its subscription"
                    );
                    self.registry.unsubscribe(key, subscriber.id()).await;
                }
            }
        }

        debug!(group = %key, message_id = event.message_id, delivered, "fan-out complete");
        delivered
    }

    #[cfg(test)]
    fn key_lock_count(&self) -> usize {
        self.key_locks.lock().unwrap().len()
    }
}
