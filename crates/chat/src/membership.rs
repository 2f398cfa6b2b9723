//! Read-only view over membership state used for chat authorization.
//!
//! Guild membership and user existence are owned by the social features;
//! the chat core only ever reads them, once per request.

use guildhall_database::{ChatError, ChatResult, GuildRepository, UserRepository};
use sqlx::SqlitePool;

#[allow(async_fn_in_trait)]
pub trait MembershipStore: Send + Sync {
    async fn user_exists(&self, id: i64) -> ChatResult<bool>;
    async fn guild_exists(&self, id: i64) -> ChatResult<bool>;
    async fn is_member(&self, guild_id: i64, user_id: i64) -> ChatResult<bool>;
}

/// Membership reads backed by the SQLite repositories.
#[derive(Clone)]
pub struct SqliteMembershipStore {
    users: UserRepository,
    guilds: GuildRepository,
}

impl SqliteMembershipStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            guilds: GuildRepository::new(pool),
        }
    }
}

impl MembershipStore for SqliteMembershipStore {
    async fn user_exists(&self, id: i64) -> ChatResult<bool> {
        self.users
            .exists(id)
            .await
            .map_err(|e| ChatError::Database(e.to_string()))
    }

    async fn guild_exists(&self, id: i64) -> ChatResult<bool> {
        self.guilds
            .exists(id)
            .await
            .map_err(|e| ChatError::Database(e.to_string()))
    }

    async fn is_member(&self, guild_id: i64, user_id: i64) -> ChatResult<bool> {
        self.guilds
            .is_member(guild_id, user_id)
            .await
            .map_err(|e| ChatError::Database(e.to_string()))
    }
}
