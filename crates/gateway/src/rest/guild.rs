//! Guild endpoints: creation, membership, and leader-driven management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use guildhall_database::{Guild, GuildMember};

use crate::auth::UserId;
use crate::error::ApiError;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct CreateGuildRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManageAction {
    Promote,
    Demote,
    Remove,
}

#[derive(Debug, Deserialize)]
pub struct ManageMemberRequest {
    pub member_id: i64,
    pub action: ManageAction,
}

pub async fn create(
    State(state): State<GatewayState>,
    UserId(user_id): UserId,
    Json(body): Json<CreateGuildRequest>,
) -> Result<(StatusCode, Json<Guild>), ApiError> {
    let guild = state
        .guilds
        .create(&body.name, &body.description, user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(guild)))
}

pub async fn join(
    State(state): State<GatewayState>,
    UserId(user_id): UserId,
    Path(guild_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.guilds.join(guild_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn leave(
    State(state): State<GatewayState>,
    UserId(user_id): UserId,
    Path(guild_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.guilds.leave(guild_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn members(
    State(state): State<GatewayState>,
    Path(guild_id): Path<i64>,
) -> Result<Json<Vec<GuildMember>>, ApiError> {
    if state.guilds.find_by_id(guild_id).await?.is_none() {
        return Err(ApiError::not_found("guild not found"));
    }
    Ok(Json(state.guilds.members(guild_id).await?))
}

/// Promote, demote, or remove a member. Only the guild leader may manage.
pub async fn manage(
    State(state): State<GatewayState>,
    UserId(user_id): UserId,
    Path(guild_id): Path<i64>,
    Json(body): Json<ManageMemberRequest>,
) -> Result<StatusCode, ApiError> {
    let guild = state
        .guilds
        .find_by_id(guild_id)
        .await?
        .ok_or_else(|| ApiError::not_found("guild not found"))?;

    if guild.leader_id != user_id {
        return Err(ApiError::forbidden("only the guild leader may manage members"));
    }

    match body.action {
        ManageAction::Promote => state.guilds.promote(guild_id, body.member_id).await?,
        ManageAction::Demote => state.guilds.demote(guild_id, body.member_id).await?,
        ManageAction::Remove => state.guilds.remove(guild_id, body.member_id).await?,
    }

    Ok(StatusCode::NO_CONTENT)
}
