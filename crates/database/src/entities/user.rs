//! User entity.
//!
//! Identity and authentication live outside this backend; this table only
//! records which player ids exist so chat targets and foreign keys resolve.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}
