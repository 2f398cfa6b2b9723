//! Friend request and friendship endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use guildhall_database::{Friend, User};

use crate::auth::UserId;
use crate::error::ApiError;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct FriendRequestBody {
    pub recipient_id: i64,
}

pub async fn request(
    State(state): State<GatewayState>,
    UserId(user_id): UserId,
    Json(body): Json<FriendRequestBody>,
) -> Result<(StatusCode, Json<Friend>), ApiError> {
    let request = state
        .friends
        .create_request(user_id, body.recipient_id)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn accept(
    State(state): State<GatewayState>,
    UserId(user_id): UserId,
    Path(request_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.friends.accept(request_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn decline(
    State(state): State<GatewayState>,
    UserId(user_id): UserId,
    Path(request_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.friends.decline(request_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list(
    State(state): State<GatewayState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.friends.list_accepted(user_id).await?))
}
