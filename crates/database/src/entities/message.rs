//! Chat message entity, scope kinds, and history cursors.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::types::ChatError;

/// The logical chat channel a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Direct,
    Guild,
    Global,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Guild => "guild",
            Self::Global => "global",
        }
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScopeKind {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "guild" => Ok(Self::Guild),
            "global" => Ok(Self::Global),
            other => Err(ChatError::InvalidScope(format!(
                "unknown scope kind '{other}'"
            ))),
        }
    }
}

/// A persisted chat message.
///
/// Exactly one of `recipient_id` / `guild_id` is set for direct/guild scopes;
/// global messages carry neither (enforced by a table CHECK constraint).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: Option<i64>,
    pub guild_id: Option<i64>,
    pub scope_kind: String,
    pub content: String,
    pub created_at: String,
    /// Weak liveness signal: set once any live subscriber accepted the
    /// fan-out push. Not a per-recipient receipt.
    pub delivered: bool,
}

/// Insert payload for a chat message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub recipient_id: Option<i64>,
    pub guild_id: Option<i64>,
    pub scope_kind: ScopeKind,
    pub content: String,
}

/// Keyset cursor for message history: the `(created_at, id)` of the last row
/// the previous page returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCursor {
    pub created_at: String,
    pub id: i64,
}

impl MessageCursor {
    pub fn encode(&self) -> String {
        // Serializing two owned fields cannot fail.
        let json = serde_json::to_vec(self).expect("cursor serialization");
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(token: &str) -> Result<Self, ChatError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| ChatError::InvalidPageToken)?;
        serde_json::from_slice(&bytes).map_err(|_| ChatError::InvalidPageToken)
    }
}

/// One page of message history plus the cursor for the next page, if any.
#[derive(Debug, Clone)]
pub struct MessagePage {
    pub messages: Vec<ChatMessage>,
    pub next_cursor: Option<MessageCursor>,
}
