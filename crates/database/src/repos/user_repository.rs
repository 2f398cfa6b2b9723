//! Repository for user lookups.

use sqlx::SqlitePool;
use tracing::info;

use crate::entities::user::User;
use crate::types::SocialResult;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, username: &str) -> SocialResult<User> {
        let now = crate::now_timestamp();
        let result = sqlx::query("INSERT INTO users (username, created_at) VALUES (?, ?)")
            .bind(username)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        info!(user_id = id, username, "created user");

        Ok(User {
            id,
            username: username.to_string(),
            created_at: now,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> SocialResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn exists(&self, id: i64) -> SocialResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}
