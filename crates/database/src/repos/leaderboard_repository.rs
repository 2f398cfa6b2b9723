//! Repository for leaderboard entries.

use sqlx::SqlitePool;
use tracing::info;

use crate::entities::leaderboard::LeaderboardEntry;
use crate::types::{SocialError, SocialResult};

#[derive(Clone)]
pub struct LeaderboardRepository {
    pool: SqlitePool,
}

impl LeaderboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        player_id: i64,
        gamename: &str,
        score: i64,
    ) -> SocialResult<LeaderboardEntry> {
        let player: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;
        if player.is_none() {
            return Err(SocialError::UserNotFound);
        }

        let now = crate::now_timestamp();
        let result = sqlx::query(
            "INSERT INTO leaderboard_entries (player_id, gamename, score, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(player_id)
        .bind(gamename)
        .bind(score)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(entry_id = id, player_id, gamename, score, "leaderboard entry created");

        Ok(LeaderboardEntry {
            id,
            player_id,
            gamename: gamename.to_string(),
            score,
            created_at: now,
        })
    }

    pub async fn update(
        &self,
        id: i64,
        gamename: Option<&str>,
        score: i64,
    ) -> SocialResult<LeaderboardEntry> {
        let result = sqlx::query(
            "UPDATE leaderboard_entries SET score = ?, gamename = COALESCE(?, gamename) WHERE id = ?",
        )
        .bind(score)
        .bind(gamename)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SocialError::EntryNotFound);
        }

        let entry = sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT id, player_id, gamename, score, created_at FROM leaderboard_entries WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }
}
