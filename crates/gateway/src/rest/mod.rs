//! REST routes.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::GatewayState;

pub mod friend;
pub mod guild;
pub mod health;
pub mod leaderboard;
pub mod message;

pub fn router() -> Router<GatewayState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/messages", post(message::submit))
        .route("/api/messages/direct/:user_id", get(message::direct_history))
        .route("/api/messages/guild/:guild_id", get(message::guild_history))
        .route("/api/messages/global", get(message::global_history))
        .route("/api/leaderboard", post(leaderboard::create))
        .route("/api/leaderboard/:id", put(leaderboard::update))
        .route("/api/friends/requests", post(friend::request))
        .route("/api/friends/requests/:id/accept", put(friend::accept))
        .route("/api/friends/requests/:id", delete(friend::decline))
        .route("/api/friends/:user_id", get(friend::list))
        .route("/api/guilds", post(guild::create))
        .route("/api/guilds/:id/join", post(guild::join))
        .route("/api/guilds/:id/leave", delete(guild::leave))
        .route("/api/guilds/:id/members", get(guild::members).put(guild::manage))
}
