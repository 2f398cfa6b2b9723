//! Guildhall Database Crate
//!
//! SQLite persistence for the Guildhall backend: connection management,
//! embedded migrations, entities, and repository implementations.

use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;

pub use repos::{
    FriendRepository, GuildRepository, LeaderboardRepository, MessageRepository, UserRepository,
};

pub use entities::{
    friend::{Friend, FriendStatus},
    guild::{Guild, GuildMember, GuildRole},
    leaderboard::LeaderboardEntry,
    message::{ChatMessage, MessageCursor, MessagePage, NewMessage, ScopeKind},
    user::User,
};

pub use types::{
    errors::{ChatError, SocialError},
    ChatResult, SocialResult,
};

/// Current UTC timestamp in fixed-precision RFC 3339.
///
/// Micro-second precision with a `Z` suffix keeps the strings a constant
/// width, so lexicographic order matches chronological order and the
/// `(created_at, id)` keyset cursor stays monotonic.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Initialize the database pool and apply migrations.
pub async fn initialize_database(
    config: &guildhall_config::DatabaseConfig,
) -> anyhow::Result<SqlitePool> {
    let pool = prepare_database(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_fixed_width_and_ordered() {
        let a = now_timestamp();
        let b = now_timestamp();
        assert_eq!(a.len(), b.len());
        assert!(a <= b);
        assert!(a.ends_with('Z'));
    }
}
