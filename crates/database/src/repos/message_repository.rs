//! Repository for chat message persistence and history queries.
//!
//! This is the system of record for chat: a message is durably inserted
//! before any fan-out is attempted, and history pages are walked with a
//! `(created_at, id)` keyset so concurrent inserts can never duplicate or
//! skip rows across pages.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::entities::message::{ChatMessage, MessageCursor, MessagePage, NewMessage};
use crate::types::ChatResult;

const SELECT_COLUMNS: &str =
    "id, sender_id, recipient_id, guild_id, scope_kind, content, created_at, delivered";

#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
    page_size: i64,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool, page_size: i64) -> Self {
        Self { pool, page_size }
    }

    /// Persist a message. Durable once this returns.
    pub async fn create(&self, new: &NewMessage) -> ChatResult<ChatMessage> {
        let now = crate::now_timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO messages (sender_id, recipient_id, guild_id, scope_kind, content, created_at, delivered)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(new.sender_id)
        .bind(new.recipient_id)
        .bind(new.guild_id)
        .bind(new.scope_kind.as_str())
        .bind(&new.content)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();

        info!(
            message_id = id,
            sender_id = new.sender_id,
            scope_kind = %new.scope_kind,
            "persisted chat message"
        );

        Ok(ChatMessage {
            id,
            sender_id: new.sender_id,
            recipient_id: new.recipient_id,
            guild_id: new.guild_id,
            scope_kind: new.scope_kind.as_str().to_string(),
            content: new.content.clone(),
            created_at: now,
            delivered: false,
        })
    }

    /// Flag a message as having reached at least one live subscriber.
    pub async fn mark_delivered(&self, id: i64) -> ChatResult<()> {
        sqlx::query("UPDATE messages SET delivered = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!(message_id = id, "marked message delivered");
        Ok(())
    }

    /// Direct history between two users, either direction, ascending.
    pub async fn list_direct(
        &self,
        user_a: i64,
        user_b: i64,
        cursor: Option<&MessageCursor>,
    ) -> ChatResult<MessagePage> {
        let (after_created, after_id) = cursor_bounds(cursor);
        let rows = sqlx::query_as::<_, ChatMessage>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM messages
            WHERE scope_kind = 'direct'
              AND ((sender_id = ?1 AND recipient_id = ?2) OR (sender_id = ?2 AND recipient_id = ?1))
              AND (created_at > ?3 OR (created_at = ?3 AND id > ?4))
            ORDER BY created_at ASC, id ASC
            LIMIT ?5
            "#
        ))
        .bind(user_a)
        .bind(user_b)
        .bind(after_created)
        .bind(after_id)
        .bind(self.page_size + 1)
        .fetch_all(&self.pool)
        .await?;

        Ok(self.page_from_rows(rows))
    }

    /// Guild history, ascending.
    pub async fn list_guild(
        &self,
        guild_id: i64,
        cursor: Option<&MessageCursor>,
    ) -> ChatResult<MessagePage> {
        let (after_created, after_id) = cursor_bounds(cursor);
        let rows = sqlx::query_as::<_, ChatMessage>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM messages
            WHERE scope_kind = 'guild' AND guild_id = ?1
              AND (created_at > ?2 OR (created_at = ?2 AND id > ?3))
            ORDER BY created_at ASC, id ASC
            LIMIT ?4
            "#
        ))
        .bind(guild_id)
        .bind(after_created)
        .bind(after_id)
        .bind(self.page_size + 1)
        .fetch_all(&self.pool)
        .await?;

        Ok(self.page_from_rows(rows))
    }

    /// Global history, ascending.
    pub async fn list_global(&self, cursor: Option<&MessageCursor>) -> ChatResult<MessagePage> {
        let (after_created, after_id) = cursor_bounds(cursor);
        let rows = sqlx::query_as::<_, ChatMessage>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM messages
            WHERE scope_kind = 'global'
              AND (created_at > ?1 OR (created_at = ?1 AND id > ?2))
            ORDER BY created_at ASC, id ASC
            LIMIT ?3
            "#
        ))
        .bind(after_created)
        .bind(after_id)
        .bind(self.page_size + 1)
        .fetch_all(&self.pool)
        .await?;

        Ok(self.page_from_rows(rows))
    }

    /// Fetch a single message by id.
    pub async fn find_by_id(&self, id: i64) -> ChatResult<Option<ChatMessage>> {
        let row = sqlx::query_as::<_, ChatMessage>(&format!(
            "SELECT {SELECT_COLUMNS} FROM messages WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // One extra row is fetched to decide whether a next page exists; the
    // cursor points at the last row actually returned.
    fn page_from_rows(&self, mut rows: Vec<ChatMessage>) -> MessagePage {
        let has_more = rows.len() as i64 > self.page_size;
        if has_more {
            rows.truncate(self.page_size as usize);
        }
        let next_cursor = if has_more {
            rows.last().map(|last| MessageCursor {
                created_at: last.created_at.clone(),
                id: last.id,
            })
        } else {
            None
        };
        MessagePage {
            messages: rows,
            next_cursor,
        }
    }
}

// An absent cursor becomes the lowest possible bound: every timestamp sorts
// after the empty string, so the predicate matches from the beginning.
fn cursor_bounds(cursor: Option<&MessageCursor>) -> (String, i64) {
    match cursor {
        Some(c) => (c.created_at.clone(), c.id),
        None => (String::new(), 0),
    }
}
