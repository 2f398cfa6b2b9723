//! Guildhall Gateway Crate
//!
//! The HTTP surface of the backend: REST routes for messages, guilds,
//! friends, and the leaderboard, plus the WebSocket route for live chat
//! connections. Handlers translate between the wire and the chat service
//! and repositories; no business rules live here.

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub mod auth;
pub mod error;
pub mod rest;
pub mod state;
pub mod websocket;

pub use error::ApiError;
pub use state::GatewayState;

pub fn create_router(state: GatewayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(rest::router())
        .route("/ws", get(websocket::chat_socket))
        .layer(cors)
        .with_state(state)
}
