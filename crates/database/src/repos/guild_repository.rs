//! Repository for guilds and guild membership.
//!
//! Membership rows are the authorization source the chat core reads per
//! request; every query here is a point-in-time snapshot, nothing is cached.

use sqlx::SqlitePool;
use tracing::info;

use crate::entities::guild::{Guild, GuildMember, GuildRole};
use crate::types::{SocialError, SocialResult};

#[derive(Clone)]
pub struct GuildRepository {
    pool: SqlitePool,
}

impl GuildRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a guild; the creator becomes its leader and first member.
    pub async fn create(&self, name: &str, description: &str, leader_id: i64) -> SocialResult<Guild> {
        let now = crate::now_timestamp();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO guilds (name, description, leader_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(description)
        .bind(leader_id)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let guild_id = result.last_insert_rowid();

        sqlx::query(
            "INSERT INTO guild_members (guild_id, user_id, role, joined_at) VALUES (?, ?, ?, ?)",
        )
        .bind(guild_id)
        .bind(leader_id)
        .bind(GuildRole::Leader.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(guild_id, leader_id, name, "created guild");

        Ok(Guild {
            id: guild_id,
            name: name.to_string(),
            description: description.to_string(),
            leader_id,
            created_at: now,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> SocialResult<Option<Guild>> {
        let guild = sqlx::query_as::<_, Guild>(
            "SELECT id, name, description, leader_id, created_at FROM guilds WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(guild)
    }

    pub async fn exists(&self, id: i64) -> SocialResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM guilds WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn is_member(&self, guild_id: i64, user_id: i64) -> SocialResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM guild_members WHERE guild_id = ? AND user_id = ?")
                .bind(guild_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    /// Add a user to a guild. Joining twice is a no-op.
    pub async fn join(&self, guild_id: i64, user_id: i64) -> SocialResult<()> {
        if !self.exists(guild_id).await? {
            return Err(SocialError::GuildNotFound);
        }

        sqlx::query(
            "INSERT OR IGNORE INTO guild_members (guild_id, user_id, role, joined_at) VALUES (?, ?, ?, ?)",
        )
        .bind(guild_id)
        .bind(user_id)
        .bind(GuildRole::Member.as_str())
        .bind(crate::now_timestamp())
        .execute(&self.pool)
        .await?;

        info!(guild_id, user_id, "user joined guild");
        Ok(())
    }

    pub async fn leave(&self, guild_id: i64, user_id: i64) -> SocialResult<()> {
        if !self.exists(guild_id).await? {
            return Err(SocialError::GuildNotFound);
        }

        let result = sqlx::query("DELETE FROM guild_members WHERE guild_id = ? AND user_id = ?")
            .bind(guild_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SocialError::NotMember);
        }

        info!(guild_id, user_id, "user left guild");
        Ok(())
    }

    /// Promote a member to officer. Leaders are never promoted away from
    /// their role and missing membership rows are ignored.
    pub async fn promote(&self, guild_id: i64, member_id: i64) -> SocialResult<()> {
        sqlx::query(
            "UPDATE guild_members SET role = ? WHERE guild_id = ? AND user_id = ? AND role != ?",
        )
        .bind(GuildRole::Officer.as_str())
        .bind(guild_id)
        .bind(member_id)
        .bind(GuildRole::Leader.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Demote back to member. Missing membership rows are ignored.
    pub async fn demote(&self, guild_id: i64, member_id: i64) -> SocialResult<()> {
        sqlx::query(
            "UPDATE guild_members SET role = ? WHERE guild_id = ? AND user_id = ? AND role != ?",
        )
        .bind(GuildRole::Member.as_str())
        .bind(guild_id)
        .bind(member_id)
        .bind(GuildRole::Member.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove a member. The leader cannot be removed; missing membership
    /// rows are ignored.
    pub async fn remove(&self, guild_id: i64, member_id: i64) -> SocialResult<()> {
        let leader_id: Option<i64> = sqlx::query_scalar("SELECT leader_id FROM guilds WHERE id = ?")
            .bind(guild_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(leader_id) = leader_id else {
            return Err(SocialError::GuildNotFound);
        };

        if leader_id == member_id {
            return Ok(());
        }

        sqlx::query("DELETE FROM guild_members WHERE guild_id = ? AND user_id = ?")
            .bind(guild_id)
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn members(&self, guild_id: i64) -> SocialResult<Vec<GuildMember>> {
        let members = sqlx::query_as::<_, GuildMember>(
            "SELECT id, guild_id, user_id, role, joined_at FROM guild_members WHERE guild_id = ? ORDER BY joined_at ASC",
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }
}
