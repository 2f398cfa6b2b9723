//! Integration tests for the REST surface, driven through the router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use guildhall_config::{ChatConfig, DatabaseConfig};
use guildhall_database::{prepare_database, run_migrations, UserRepository};
use guildhall_gateway::{create_router, GatewayState};

struct TestContext {
    _temp_dir: TempDir,
    router: Router,
}

impl TestContext {
    async fn new() -> Self {
        Self::with_chat_config(ChatConfig::default()).await
    }

    async fn with_chat_config(chat_config: ChatConfig) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("api_tests.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 5,
        };

        let pool = prepare_database(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let users = UserRepository::new(pool.clone());
        for name in ["ayla", "bren", "cole", "dara", "elio"] {
            users.create(name).await.unwrap();
        }

        let router = create_router(GatewayState::new(pool, &chat_config));
        Self {
            _temp_dir: temp_dir,
            router,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        user_id: Option<i64>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = user_id {
            builder = builder.header("x-user-id", id.to_string());
        }

        let request = match body {
            Some(value) => builder
                .header("content-type", "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn message_submission_requires_caller_identity() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx
        .send(
            "POST",
            "/api/messages",
            None,
            Some(json!({ "kind": "global", "content": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("x-user-id"));
}

#[tokio::test]
async fn global_message_round_trips_through_history() {
    let ctx = TestContext::new().await;

    let (status, message) = ctx
        .send(
            "POST",
            "/api/messages",
            Some(1),
            Some(json!({ "kind": "global", "content": "hello world" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["scope_kind"], "global");
    // No live connections, so the push acknowledgment stays unset.
    assert_eq!(message["delivered"], false);

    let (status, history) = ctx
        .send("GET", "/api/messages/global", Some(2), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let messages = history["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "hello world");
    assert!(history.get("next_page_token").is_none());
}

#[tokio::test]
async fn direct_history_is_shared_between_both_participants() {
    let ctx = TestContext::new().await;

    ctx.send(
        "POST",
        "/api/messages",
        Some(1),
        Some(json!({ "kind": "direct", "target_id": 2, "content": "hey" })),
    )
    .await;
    ctx.send(
        "POST",
        "/api/messages",
        Some(2),
        Some(json!({ "kind": "direct", "target_id": 1, "content": "hey back" })),
    )
    .await;

    let (_, from_one) = ctx
        .send("GET", "/api/messages/direct/2", Some(1), None)
        .await;
    let (_, from_two) = ctx
        .send("GET", "/api/messages/direct/1", Some(2), None)
        .await;

    assert_eq!(from_one["messages"].as_array().unwrap().len(), 2);
    assert_eq!(from_one, from_two);

    // A third user's conversation with either participant is separate.
    let (_, from_three) = ctx
        .send("GET", "/api/messages/direct/1", Some(3), None)
        .await;
    assert!(from_three["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn direct_message_to_unknown_user_is_not_found() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx
        .send(
            "POST",
            "/api/messages",
            Some(1),
            Some(json!({ "kind": "direct", "target_id": 404, "content": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guild_chat_is_gated_on_membership() {
    let ctx = TestContext::new().await;

    let (status, guild) = ctx
        .send(
            "POST",
            "/api/guilds",
            Some(1),
            Some(json!({ "name": "night watch", "description": "keeps the walls" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let guild_id = guild["id"].as_i64().unwrap();

    let (status, _) = ctx
        .send("POST", &format!("/api/guilds/{guild_id}/join"), Some(2), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Member posts fine.
    let (status, _) = ctx
        .send(
            "POST",
            "/api/messages",
            Some(2),
            Some(json!({ "kind": "guild", "target_id": guild_id, "content": "o/" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Non-member is refused, and sees no history either.
    let (status, _) = ctx
        .send(
            "POST",
            "/api/messages",
            Some(3),
            Some(json!({ "kind": "guild", "target_id": guild_id, "content": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            "GET",
            &format!("/api/messages/guild/{guild_id}"),
            Some(3),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unknown guild.
    let (status, _) = ctx
        .send(
            "POST",
            "/api/messages",
            Some(1),
            Some(json!({ "kind": "guild", "target_id": 999, "content": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guild_membership_management_is_leader_only() {
    let ctx = TestContext::new().await;

    let (_, guild) = ctx
        .send(
            "POST",
            "/api/guilds",
            Some(1),
            Some(json!({ "name": "night watch" })),
        )
        .await;
    let guild_id = guild["id"].as_i64().unwrap();

    ctx.send("POST", &format!("/api/guilds/{guild_id}/join"), Some(2), None)
        .await;
    ctx.send("POST", &format!("/api/guilds/{guild_id}/join"), Some(3), None)
        .await;

    // A regular member cannot manage.
    let (status, _) = ctx
        .send(
            "PUT",
            &format!("/api/guilds/{guild_id}/members"),
            Some(2),
            Some(json!({ "member_id": 3, "action": "promote" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The leader promotes, and the roster reflects it.
    let (status, _) = ctx
        .send(
            "PUT",
            &format!("/api/guilds/{guild_id}/members"),
            Some(1),
            Some(json!({ "member_id": 2, "action": "promote" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, members) = ctx
        .send("GET", &format!("/api/guilds/{guild_id}/members"), Some(1), None)
        .await;
    let roster = members.as_array().unwrap();
    assert_eq!(roster.len(), 3);
    let role_of = |user_id: i64| {
        roster
            .iter()
            .find(|m| m["user_id"] == user_id)
            .map(|m| m["role"].as_str().unwrap().to_string())
            .unwrap()
    };
    assert_eq!(role_of(1), "leader");
    assert_eq!(role_of(2), "officer");
    assert_eq!(role_of(3), "member");

    // The leader cannot be promoted away from leadership or removed.
    ctx.send(
        "PUT",
        &format!("/api/guilds/{guild_id}/members"),
        Some(1),
        Some(json!({ "member_id": 1, "action": "promote" })),
    )
    .await;
    ctx.send(
        "PUT",
        &format!("/api/guilds/{guild_id}/members"),
        Some(1),
        Some(json!({ "member_id": 1, "action": "remove" })),
    )
    .await;
    let (_, members) = ctx
        .send("GET", &format!("/api/guilds/{guild_id}/members"), Some(1), None)
        .await;
    let roster = members.as_array().unwrap();
    assert_eq!(roster.len(), 3);
    assert!(roster
        .iter()
        .any(|m| m["user_id"] == 1 && m["role"] == "leader"));

    // Removing a member works.
    let (status, _) = ctx
        .send(
            "PUT",
            &format!("/api/guilds/{guild_id}/members"),
            Some(1),
            Some(json!({ "member_id": 3, "action": "remove" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, members) = ctx
        .send("GET", &format!("/api/guilds/{guild_id}/members"), Some(1), None)
        .await;
    assert_eq!(members.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_guild_names_and_friend_requests_are_conflicts() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .send(
            "POST",
            "/api/guilds",
            Some(1),
            Some(json!({ "name": "night watch" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = ctx
        .send(
            "POST",
            "/api/guilds",
            Some(2),
            Some(json!({ "name": "night watch" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already exists");

    ctx.send(
        "POST",
        "/api/friends/requests",
        Some(1),
        Some(json!({ "recipient_id": 2 })),
    )
    .await;
    let (status, _) = ctx
        .send(
            "POST",
            "/api/friends/requests",
            Some(1),
            Some(json!({ "recipient_id": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn leaving_a_guild_requires_membership() {
    let ctx = TestContext::new().await;

    let (_, guild) = ctx
        .send(
            "POST",
            "/api/guilds",
            Some(1),
            Some(json!({ "name": "night watch" })),
        )
        .await;
    let guild_id = guild["id"].as_i64().unwrap();

    let (status, _) = ctx
        .send("DELETE", &format!("/api/guilds/{guild_id}/leave"), Some(2), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.send("POST", &format!("/api/guilds/{guild_id}/join"), Some(2), None)
        .await;
    let (status, _) = ctx
        .send("DELETE", &format!("/api/guilds/{guild_id}/leave"), Some(2), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn friend_request_lifecycle() {
    let ctx = TestContext::new().await;

    let (status, request) = ctx
        .send(
            "POST",
            "/api/friends/requests",
            Some(1),
            Some(json!({ "recipient_id": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    let request_id = request["id"].as_i64().unwrap();

    // Only the recipient may accept.
    let (status, _) = ctx
        .send(
            "PUT",
            &format!("/api/friends/requests/{request_id}/accept"),
            Some(3),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(
            "PUT",
            &format!("/api/friends/requests/{request_id}/accept"),
            Some(2),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Accepting twice is refused: the request is no longer pending.
    let (status, _) = ctx
        .send(
            "PUT",
            &format!("/api/friends/requests/{request_id}/accept"),
            Some(2),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Both sides see the friendship.
    let (_, friends_of_one) = ctx.send("GET", "/api/friends/1", Some(1), None).await;
    let (_, friends_of_two) = ctx.send("GET", "/api/friends/2", Some(2), None).await;
    assert_eq!(friends_of_one.as_array().unwrap()[0]["id"], 2);
    assert_eq!(friends_of_two.as_array().unwrap()[0]["id"], 1);
}

#[tokio::test]
async fn friend_request_to_unknown_user_or_unknown_request_is_not_found() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .send(
            "POST",
            "/api/friends/requests",
            Some(1),
            Some(json!({ "recipient_id": 404 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send("DELETE", "/api/friends/requests/999", Some(1), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn leaderboard_entries_are_created_and_updated() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .send(
            "POST",
            "/api/leaderboard",
            Some(1),
            Some(json!({ "player_id": 404, "gamename": "skirmish", "score": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, entry) = ctx
        .send(
            "POST",
            "/api/leaderboard",
            Some(1),
            Some(json!({ "player_id": 1, "gamename": "skirmish", "score": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let entry_id = entry["id"].as_i64().unwrap();

    let (status, updated) = ctx
        .send(
            "PUT",
            &format!("/api/leaderboard/{entry_id}"),
            Some(1),
            Some(json!({ "score": 25 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["score"], 25);
    assert_eq!(updated["gamename"], "skirmish");

    let (status, _) = ctx
        .send(
            "PUT",
            "/api/leaderboard/999",
            Some(1),
            Some(json!({ "score": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn history_pagination_walks_every_message_once() {
    let chat_config = ChatConfig {
        history_page_size: 3,
        ..ChatConfig::default()
    };
    let ctx = TestContext::with_chat_config(chat_config).await;

    for i in 0..7 {
        ctx.send(
            "POST",
            "/api/messages",
            Some(1),
            Some(json!({ "kind": "global", "content": format!("msg {i}") })),
        )
        .await;
    }

    let mut contents = Vec::new();
    let mut uri = "/api/messages/global".to_string();
    loop {
        let (status, page) = ctx.send("GET", &uri, Some(2), None).await;
        assert_eq!(status, StatusCode::OK);
        for message in page["messages"].as_array().unwrap() {
            contents.push(message["content"].as_str().unwrap().to_string());
        }
        match page.get("next_page_token").and_then(Value::as_str) {
            Some(token) => uri = format!("/api/messages/global?page_token={token}"),
            None => break,
        }
    }

    let expected: Vec<String> = (0..7).map(|i| format!("msg {i}")).collect();
    assert_eq!(contents, expected);
}

#[tokio::test]
async fn malformed_page_token_is_a_bad_request() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx
        .send(
            "GET",
            "/api/messages/global?page_token=%40%40nope%40%40",
            Some(1),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid page token");
}

#[tokio::test]
async fn websocket_handshake_requires_caller_identity() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.send("GET", "/ws?kind=global", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("x-user-id"));
}

#[tokio::test]
async fn global_scope_rejects_a_target_id() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx
        .send(
            "POST",
            "/api/messages",
            Some(1),
            Some(json!({ "kind": "global", "target_id": 2, "content": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
