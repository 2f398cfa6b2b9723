//! Wire events exchanged over a live chat connection.

use serde::{Deserialize, Serialize};

use guildhall_database::ChatMessage;

/// Events received from a connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Heartbeat to keep the connection alive.
    Ping,
    /// Post a message into the connection's scope.
    Message { content: String },
}

/// Events pushed to a connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent once after a successful handshake.
    Hello { user_id: i64, group: String },
    Pong,
    Message { message: MessageEvent },
    Error { message: String },
}

/// A chat message as delivered to live subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message_id: i64,
    pub sender_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<i64>,
    pub scope_kind: String,
    pub content: String,
    pub created_at: String,
}

impl From<&ChatMessage> for MessageEvent {
    fn from(message: &ChatMessage) -> Self {
        Self {
            message_id: message.id,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            guild_id: message.guild_id,
            scope_kind: message.scope_kind.clone(),
            content: message.content.clone(),
            created_at: message.created_at.clone(),
        }
    }
}
