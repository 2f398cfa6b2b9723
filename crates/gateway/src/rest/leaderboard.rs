//! Leaderboard endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use guildhall_database::LeaderboardEntry;

use crate::error::ApiError;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub player_id: i64,
    pub gamename: String,
    pub score: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
    #[serde(default)]
    pub gamename: Option<String>,
    pub score: i64,
}

pub async fn create(
    State(state): State<GatewayState>,
    Json(body): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<LeaderboardEntry>), ApiError> {
    let entry = state
        .leaderboard
        .create(body.player_id, &body.gamename, body.score)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update(
    State(state): State<GatewayState>,
    Path(entry_id): Path<i64>,
    Json(body): Json<UpdateEntryRequest>,
) -> Result<Json<LeaderboardEntry>, ApiError> {
    let entry = state
        .leaderboard
        .update(entry_id, body.gamename.as_deref(), body.score)
        .await?;
    Ok(Json(entry))
}
