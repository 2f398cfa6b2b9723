//! Error types for the persistence and chat layers

use thiserror::Error;

/// Errors raised by chat scope resolution, persistence, and history queries.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("user not found")]
    UserNotFound,

    #[error("guild not found")]
    GuildNotFound,

    #[error("not a member of this guild")]
    Forbidden,

    #[error("invalid chat scope: {0}")]
    InvalidScope(String),

    #[error("invalid page token")]
    InvalidPageToken,

    #[error("database error: {0}")]
    Database(String),
}

/// Errors raised by the social features (guilds, friends, leaderboard).
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("user not found")]
    UserNotFound,

    #[error("guild not found")]
    GuildNotFound,

    #[error("leaderboard entry not found")]
    EntryNotFound,

    #[error("friend request not found")]
    RequestNotFound,

    #[error("friend request is not pending")]
    RequestNotPending,

    #[error("not a member of this guild")]
    NotMember,

    #[error("already exists")]
    AlreadyExists,

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for ChatError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<sqlx::Error> for SocialError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            // Duplicate guild names and repeated friend requests land on
            // UNIQUE constraints; surface those as a conflict, not a
            // storage failure.
            if db.is_unique_violation() {
                return Self::AlreadyExists;
            }
        }
        Self::Database(err.to_string())
    }
}
