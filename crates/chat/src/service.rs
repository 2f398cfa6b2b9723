//! Chat service: the submit and history entry points the gateway calls.

use std::sync::Arc;

use tracing::warn;

use guildhall_database::{
    ChatMessage, ChatResult, MessageCursor, MessagePage, MessageRepository, NewMessage,
};

use crate::dispatch::FanoutDispatcher;
use crate::events::MessageEvent;
use crate::lifecycle::ConnectionLifecycle;
use crate::membership::MembershipStore;
use crate::registry::{ConnectionHandle, ConnectionRegistry, EventSender};
use crate::scope::{RoutingKey, ScopeRequest, ScopeResolver};

/// Orchestrates a submission: resolve -> persist -> fan out.
///
/// Resolution failures abort before anything is stored. Persistence
/// failures surface to the caller. Delivery failures never do: once the
/// message is durable the submission has succeeded, and unreachable
/// subscribers catch up via history.
#[derive(Clone)]
pub struct ChatService<M> {
    resolver: ScopeResolver<M>,
    messages: MessageRepository,
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<FanoutDispatcher>,
}

impl<M: MembershipStore> ChatService<M> {
    pub fn new(membership: M, messages: MessageRepository) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Arc::new(FanoutDispatcher::new(registry.clone()));
        Self {
            resolver: ScopeResolver::new(membership),
            messages,
            registry,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Persist a message and deliver it to the scope's live subscribers.
    pub async fn submit(
        &self,
        requester_id: i64,
        request: &ScopeRequest,
        content: &str,
    ) -> ChatResult<ChatMessage> {
        let key = self.resolver.resolve(requester_id, request).await?;

        let new = NewMessage {
            sender_id: requester_id,
            recipient_id: match key {
                RoutingKey::Direct(..) => request.target_id,
                _ => None,
            },
            guild_id: match key {
                RoutingKey::Guild(id) => Some(id),
                _ => None,
            },
            scope_kind: key.kind(),
            content: content.to_string(),
        };

        // The key's dispatch slot is held across persist and push, so
        // storage order and push order agree even under concurrent
        // submits to the same key.
        let guard = self.dispatcher.acquire(&key).await;

        // Durable before any fan-out: a crash past this point never loses
        // the message.
        let mut message = self.messages.create(&new).await?;

        let event = MessageEvent::from(&message);
        let delivered = self.dispatcher.dispatch(&guard, &event).await;
        drop(guard);

        if delivered > 0 {
            message.delivered = true;
            if let Err(error) = self.messages.mark_delivered(message.id).await {
                // The message is already accepted and pushed; the flag is a
                // best-effort signal.
                warn!(message_id = message.id, %error, "failed to persist delivered flag");
            }
        }

        Ok(message)
    }

    /// Paginated history for a scope, oldest first.
    pub async fn history(
        &self,
        requester_id: i64,
        request: &ScopeRequest,
        page_token: Option<&str>,
    ) -> ChatResult<MessagePage> {
        let key = self.resolver.resolve(requester_id, request).await?;
        let cursor = page_token.map(MessageCursor::decode).transpose()?;

        match key {
            RoutingKey::Direct(a, b) => self.messages.list_direct(a, b, cursor.as_ref()).await,
            RoutingKey::Guild(id) => self.messages.list_guild(id, cursor.as_ref()).await,
            RoutingKey::Global => self.messages.list_global(cursor.as_ref()).await,
        }
    }

    /// Authorize a live connection's handshake and subscribe it to its
    /// scope. The returned lifecycle owns the registry membership.
    pub async fn connect(
        &self,
        user_id: i64,
        request: &ScopeRequest,
        sender: EventSender,
    ) -> ChatResult<ConnectionLifecycle> {
        let key = self.resolver.resolve(user_id, request).await?;
        let handle = ConnectionHandle::new(user_id, sender);
        Ok(ConnectionLifecycle::open(self.registry.clone(), handle, vec![key]).await)
    }
}
