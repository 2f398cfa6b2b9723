//! Repository for friend requests and friendships.
//!
//! Friendship status governs discovery, not messaging eligibility; the chat
//! core never consults this table when routing direct messages.

use sqlx::SqlitePool;
use tracing::info;

use crate::entities::friend::{Friend, FriendStatus};
use crate::entities::user::User;
use crate::types::{SocialError, SocialResult};

#[derive(Clone)]
pub struct FriendRepository {
    pool: SqlitePool,
}

impl FriendRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pending friend request from `user_id` to `recipient_id`.
    pub async fn create_request(&self, user_id: i64, recipient_id: i64) -> SocialResult<Friend> {
        let recipient: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
            .bind(recipient_id)
            .fetch_optional(&self.pool)
            .await?;
        if recipient.is_none() {
            return Err(SocialError::UserNotFound);
        }

        let now = crate::now_timestamp();
        let result = sqlx::query(
            "INSERT INTO friends (user_id, friend_id, status, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(recipient_id)
        .bind(FriendStatus::Pending.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(request_id = id, user_id, recipient_id, "friend request sent");

        Ok(Friend {
            id,
            user_id,
            friend_id: recipient_id,
            status: FriendStatus::Pending.as_str().to_string(),
            created_at: now,
        })
    }

    /// Accept a pending request. Only the recipient may accept.
    pub async fn accept(&self, request_id: i64, recipient_id: i64) -> SocialResult<()> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM friends WHERE id = ? AND friend_id = ?")
                .bind(request_id)
                .bind(recipient_id)
                .fetch_optional(&self.pool)
                .await?;

        match status.as_deref() {
            None => Err(SocialError::RequestNotFound),
            Some(s) if s != FriendStatus::Pending.as_str() => Err(SocialError::RequestNotPending),
            Some(_) => {
                sqlx::query("UPDATE friends SET status = ? WHERE id = ?")
                    .bind(FriendStatus::Accepted.as_str())
                    .bind(request_id)
                    .execute(&self.pool)
                    .await?;
                info!(request_id, recipient_id, "friend request accepted");
                Ok(())
            }
        }
    }

    /// Decline (delete) a request addressed to `recipient_id`.
    pub async fn decline(&self, request_id: i64, recipient_id: i64) -> SocialResult<()> {
        let result = sqlx::query("DELETE FROM friends WHERE id = ? AND friend_id = ?")
            .bind(request_id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SocialError::RequestNotFound);
        }
        info!(request_id, recipient_id, "friend request declined");
        Ok(())
    }

    /// Accepted friends of a user, either direction of the edge.
    pub async fn list_accepted(&self, user_id: i64) -> SocialResult<Vec<User>> {
        if !user_exists(&self.pool, user_id).await? {
            return Err(SocialError::UserNotFound);
        }

        let friends = sqlx::query_as::<_, User>(
            r#"
            SELECT DISTINCT u.id, u.username, u.created_at
            FROM users u
            JOIN friends f ON (f.user_id = u.id OR f.friend_id = u.id)
            WHERE f.status = 'accepted'
              AND (f.user_id = ? OR f.friend_id = ?)
              AND u.id != ?
            ORDER BY u.id ASC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friends)
    }
}

async fn user_exists(pool: &SqlitePool, id: i64) -> SocialResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}
