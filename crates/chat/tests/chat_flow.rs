//! End-to-end tests for the chat subsystem against a real SQLite store.

use guildhall_chat::{ChatService, ScopeRequest, ServerEvent, SqliteMembershipStore};
use guildhall_config::DatabaseConfig;
use guildhall_database::{
    prepare_database, run_migrations, ChatError, GuildRepository, MessageRepository,
    UserRepository,
};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::sync::mpsc;

struct TestContext {
    _temp_dir: TempDir,
    pool: SqlitePool,
}

impl TestContext {
    async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("chat_flow.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 5,
        };

        let pool = prepare_database(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let users = UserRepository::new(pool.clone());
        for name in ["ayla", "bren", "cole", "dara", "elio", "fenn", "gale"] {
            users.create(name).await.unwrap();
        }

        // Guild 10 does not exist; guild 1 is led by user 1 with member 3.
        let guilds = GuildRepository::new(pool.clone());
        guilds.create("night watch", "keeps the walls", 1).await.unwrap();
        guilds.join(1, 3).await.unwrap();

        Self {
            _temp_dir: temp_dir,
            pool,
        }
    }

    fn service(&self, page_size: i64) -> ChatService<SqliteMembershipStore> {
        ChatService::new(
            SqliteMembershipStore::new(self.pool.clone()),
            MessageRepository::new(self.pool.clone(), page_size),
        )
    }

    async fn message_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn guild_submission_from_non_member_is_forbidden_and_unstored() {
    let ctx = TestContext::new().await;
    let chat = ctx.service(25);

    let err = chat
        .submit(5, &ScopeRequest::guild(1), "let me in")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Forbidden));
    assert_eq!(ctx.message_count().await, 0);
}

#[tokio::test]
async fn submission_to_unknown_guild_is_not_found_and_unstored() {
    let ctx = TestContext::new().await;
    let chat = ctx.service(25);

    let err = chat
        .submit(3, &ScopeRequest::guild(10), "anyone here?")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::GuildNotFound));
    assert_eq!(ctx.message_count().await, 0);
}

#[tokio::test]
async fn direct_message_reaches_the_recipients_live_connection() {
    let ctx = TestContext::new().await;
    let chat = ctx.service(25);

    // User 7 opens a connection for the 3<->7 conversation.
    let (tx, mut rx) = mpsc::channel(16);
    let connection = chat
        .connect(7, &ScopeRequest::direct(3), tx)
        .await
        .unwrap();

    let message = chat
        .submit(3, &ScopeRequest::direct(7), "hi")
        .await
        .unwrap();
    assert_eq!(message.scope_kind, "direct");
    assert!(message.delivered);

    match rx.recv().await.unwrap() {
        ServerEvent::Message { message: event } => {
            assert_eq!(event.message_id, message.id);
            assert_eq!(event.sender_id, 3);
            assert_eq!(event.recipient_id, Some(7));
            assert_eq!(event.content, "hi");
        }
        other => panic!("unexpected event {other:?}"),
    }

    connection.close().await;

    // History is visible from both participants' perspective.
    let from_sender = chat
        .history(3, &ScopeRequest::direct(7), None)
        .await
        .unwrap();
    let from_recipient = chat
        .history(7, &ScopeRequest::direct(3), None)
        .await
        .unwrap();
    assert_eq!(from_sender.messages.len(), 1);
    assert_eq!(from_recipient.messages.len(), 1);
    assert_eq!(from_recipient.messages[0].id, message.id);
}

#[tokio::test]
async fn closed_connection_no_longer_receives_messages() {
    let ctx = TestContext::new().await;
    let chat = ctx.service(25);

    let (tx, mut rx) = mpsc::channel(16);
    let connection = chat.connect(2, &ScopeRequest::global(), tx).await.unwrap();
    connection.close().await;

    let message = chat
        .submit(4, &ScopeRequest::global(), "anyone?")
        .await
        .unwrap();
    assert!(!message.delivered);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn global_submission_with_no_listeners_is_persisted_undelivered() {
    let ctx = TestContext::new().await;
    let chat = ctx.service(25);

    let message = chat
        .submit(4, &ScopeRequest::global(), "hello world")
        .await
        .unwrap();
    assert!(!message.delivered);

    let page = chat
        .history(4, &ScopeRequest::global(), None)
        .await
        .unwrap();
    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.messages[0].id, message.id);
    assert!(!page.messages[0].delivered);
}

#[tokio::test]
async fn guild_fanout_skips_other_guilds_and_direct_scopes() {
    let ctx = TestContext::new().await;
    let chat = ctx.service(25);

    let (guild_tx, mut guild_rx) = mpsc::channel(16);
    let guild_conn = chat
        .connect(3, &ScopeRequest::guild(1), guild_tx)
        .await
        .unwrap();

    let (global_tx, mut global_rx) = mpsc::channel(16);
    let global_conn = chat
        .connect(5, &ScopeRequest::global(), global_tx)
        .await
        .unwrap();

    chat.submit(1, &ScopeRequest::guild(1), "guild only")
        .await
        .unwrap();

    match guild_rx.recv().await.unwrap() {
        ServerEvent::Message { message } => {
            assert_eq!(message.guild_id, Some(1));
            assert_eq!(message.content, "guild only");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(global_rx.try_recv().is_err());

    guild_conn.close().await;
    global_conn.close().await;
}

#[tokio::test]
async fn concurrent_submits_reach_a_subscriber_in_creation_order() {
    let ctx = TestContext::new().await;
    let chat = ctx.service(25);

    let (tx, mut rx) = mpsc::channel(64);
    let connection = chat.connect(5, &ScopeRequest::global(), tx).await.unwrap();

    let mut tasks = Vec::new();
    for sender in 1..=4 {
        let chat = chat.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..5 {
                chat.submit(sender, &ScopeRequest::global(), &format!("{sender}-{i}"))
                    .await
                    .unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // Every received event must follow its predecessor in storage order.
    let mut last: Option<(String, i64)> = None;
    for _ in 0..20 {
        match rx.recv().await.unwrap() {
            ServerEvent::Message { message } => {
                let next = (message.created_at.clone(), message.message_id);
                if let Some(previous) = &last {
                    assert!(
                        *previous < next,
                        "delivered out of creation order: {previous:?} then {next:?}"
                    );
                }
                last = Some(next);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    connection.close().await;
}

#[tokio::test]
async fn history_pages_are_stable_under_interleaved_inserts() {
    let ctx = TestContext::new().await;
    let chat = ctx.service(2);

    for i in 0..5 {
        chat.submit(4, &ScopeRequest::global(), &format!("msg {i}"))
            .await
            .unwrap();
    }

    let mut seen = Vec::new();

    let first = chat
        .history(4, &ScopeRequest::global(), None)
        .await
        .unwrap();
    assert_eq!(first.messages.len(), 2);
    seen.extend(first.messages.iter().map(|m| m.id));
    let token = first.next_cursor.unwrap().encode();

    // New inserts between page fetches must not duplicate or skip rows
    // already returned.
    chat.submit(4, &ScopeRequest::global(), "late arrival")
        .await
        .unwrap();

    let mut token = Some(token);
    while let Some(t) = token {
        let page = chat
            .history(4, &ScopeRequest::global(), Some(&t))
            .await
            .unwrap();
        seen.extend(page.messages.iter().map(|m| m.id));
        token = page.next_cursor.map(|c| c.encode());
    }

    assert_eq!(seen.len(), 6);
    let mut sorted = seen.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted, seen, "pages must be ascending with no duplicates");
}

#[tokio::test]
async fn malformed_page_token_is_rejected() {
    let ctx = TestContext::new().await;
    let chat = ctx.service(25);

    let err = chat
        .history(4, &ScopeRequest::global(), Some("@@not-base64@@"))
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::InvalidPageToken));
}
