//! Scope resolution: canonical routing keys and sender authorization.

use serde::{Deserialize, Serialize};

use guildhall_database::{ChatError, ChatResult, ScopeKind};

use crate::membership::MembershipStore;

/// A client's description of the chat channel it wants to reach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeRequest {
    pub kind: ScopeKind,
    #[serde(default)]
    pub target_id: Option<i64>,
}

impl ScopeRequest {
    pub fn direct(target_id: i64) -> Self {
        Self {
            kind: ScopeKind::Direct,
            target_id: Some(target_id),
        }
    }

    pub fn guild(guild_id: i64) -> Self {
        Self {
            kind: ScopeKind::Guild,
            target_id: Some(guild_id),
        }
    }

    pub fn global() -> Self {
        Self {
            kind: ScopeKind::Global,
            target_id: None,
        }
    }
}

/// Canonical identifier for a chat scope.
///
/// Two semantically identical requests always produce the same key: the
/// direct variant stores the participant pair sorted ascending, so both
/// sides of a conversation resolve to one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutingKey {
    Direct(i64, i64),
    Guild(i64),
    Global,
}

impl RoutingKey {
    /// Key for the direct conversation between two users, order-insensitive.
    pub fn direct(user_a: i64, user_b: i64) -> Self {
        if user_a <= user_b {
            Self::Direct(user_a, user_b)
        } else {
            Self::Direct(user_b, user_a)
        }
    }

    pub fn kind(&self) -> ScopeKind {
        match self {
            Self::Direct(..) => ScopeKind::Direct,
            Self::Guild(_) => ScopeKind::Guild,
            Self::Global => ScopeKind::Global,
        }
    }

    /// Group name understood by every connected peer.
    pub fn group_name(&self) -> String {
        match self {
            Self::Direct(a, b) => format!("chat.direct.{a}-{b}"),
            Self::Guild(id) => format!("chat.guild.{id}"),
            Self::Global => "chat.global".to_string(),
        }
    }
}

impl std::fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.group_name())
    }
}

/// Derives a routing key from a chat request and authorizes the requester
/// against current membership state.
///
/// Reads are point-in-time snapshots per request; nothing is cached across
/// calls, so a kicked guild member loses posting rights immediately.
#[derive(Clone)]
pub struct ScopeResolver<M> {
    membership: M,
}

impl<M: MembershipStore> ScopeResolver<M> {
    pub fn new(membership: M) -> Self {
        Self { membership }
    }

    /// Resolve and authorize. Has no side effects: a failed resolution never
    /// touches storage or the registry.
    pub async fn resolve(&self, requester_id: i64, request: &ScopeRequest) -> ChatResult<RoutingKey> {
        match request.kind {
            ScopeKind::Direct => {
                let target = request.target_id.ok_or_else(|| {
                    ChatError::InvalidScope("direct scope requires a target user id".to_string())
                })?;
                if !self.membership.user_exists(target).await? {
                    return Err(ChatError::UserNotFound);
                }
                // Friendship status governs discovery, not messaging
                // eligibility: no friendship gate here.
                Ok(RoutingKey::direct(requester_id, target))
            }
            ScopeKind::Guild => {
                let guild_id = request.target_id.ok_or_else(|| {
                    ChatError::InvalidScope("guild scope requires a guild id".to_string())
                })?;
                if !self.membership.guild_exists(guild_id).await? {
                    return Err(ChatError::GuildNotFound);
                }
                if !self.membership.is_member(guild_id, requester_id).await? {
                    return Err(ChatError::Forbidden);
                }
                Ok(RoutingKey::Guild(guild_id))
            }
            ScopeKind::Global => {
                if request.target_id.is_some() {
                    return Err(ChatError::InvalidScope(
                        "global scope takes no target id".to_string(),
                    ));
                }
                Ok(RoutingKey::Global)
            }
        }
    }
}
