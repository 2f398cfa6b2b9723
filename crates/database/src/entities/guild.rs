//! Guild and guild membership entities.

use serde::{Deserialize, Serialize};

use crate::types::SocialError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Guild {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub leader_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GuildMember {
    pub id: i64,
    pub guild_id: i64,
    pub user_id: i64,
    pub role: String,
    pub joined_at: String,
}

/// Member roles, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuildRole {
    Member,
    Officer,
    Leader,
}

impl GuildRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Officer => "officer",
            Self::Leader => "leader",
        }
    }
}

impl std::fmt::Display for GuildRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GuildRole {
    type Err = SocialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "officer" => Ok(Self::Officer),
            "leader" => Ok(Self::Leader),
            other => Err(SocialError::InvalidAction(format!(
                "unknown guild role '{other}'"
            ))),
        }
    }
}
