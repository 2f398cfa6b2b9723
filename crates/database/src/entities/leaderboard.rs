//! Leaderboard entry entity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub player_id: i64,
    pub gamename: String,
    pub score: i64,
    pub created_at: String,
}
