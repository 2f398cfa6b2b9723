//! Chat REST endpoints: message submission and scope history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use guildhall_chat::{ScopeKind, ScopeRequest};
use guildhall_database::{ChatMessage, MessagePage};

use crate::auth::UserId;
use crate::error::ApiError;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    pub kind: ScopeKind,
    #[serde(default)]
    pub target_id: Option<i64>,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl From<MessagePage> for HistoryResponse {
    fn from(page: MessagePage) -> Self {
        Self {
            messages: page.messages,
            next_page_token: page.next_cursor.map(|cursor| cursor.encode()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page_token: Option<String>,
}

pub async fn submit(
    State(state): State<GatewayState>,
    UserId(user_id): UserId,
    Json(body): Json<SubmitMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
    let request = ScopeRequest {
        kind: body.kind,
        target_id: body.target_id,
    };
    let message = state.chat.submit(user_id, &request, &body.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn direct_history(
    State(state): State<GatewayState>,
    UserId(user_id): UserId,
    Path(other_user_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let page = state
        .chat
        .history(
            user_id,
            &ScopeRequest::direct(other_user_id),
            query.page_token.as_deref(),
        )
        .await?;
    Ok(Json(page.into()))
}

pub async fn guild_history(
    State(state): State<GatewayState>,
    UserId(user_id): UserId,
    Path(guild_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let page = state
        .chat
        .history(
            user_id,
            &ScopeRequest::guild(guild_id),
            query.page_token.as_deref(),
        )
        .await?;
    Ok(Json(page.into()))
}

pub async fn global_history(
    State(state): State<GatewayState>,
    UserId(user_id): UserId,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let page = state
        .chat
        .history(user_id, &ScopeRequest::global(), query.page_token.as_deref())
        .await?;
    Ok(Json(page.into()))
}
