//! WebSocket endpoint for live chat connections.
//!
//! The handshake resolves and authorizes the requested scope before the
//! upgrade completes; an unauthorized request is refused with the usual
//! JSON error response. After the upgrade, one writer task drains the
//! connection's outbound queue while the read loop handles inbound
//! `ping` and `message` frames.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

use guildhall_chat::{ClientEvent, ConnectionLifecycle, ScopeKind, ScopeRequest, ServerEvent};

use crate::auth::UserId;
use crate::error::ApiError;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub kind: ScopeKind,
    #[serde(default)]
    pub target_id: Option<i64>,
}

/// Caller identity comes from the same `x-user-id` header as the REST
/// routes; the query string only names the scope.
pub async fn chat_socket(
    State(state): State<GatewayState>,
    UserId(user_id): UserId,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let request = ScopeRequest {
        kind: params.kind,
        target_id: params.target_id,
    };

    let (out_tx, out_rx) = mpsc::channel(state.connection_buffer);
    let lifecycle = state
        .chat
        .connect(user_id, &request, out_tx.clone())
        .await?;

    Ok(ws.on_upgrade(move |socket| {
        handle_socket(state, socket, lifecycle, request, out_tx, out_rx)
    }))
}

async fn handle_socket(
    state: GatewayState,
    socket: WebSocket,
    lifecycle: ConnectionLifecycle,
    request: ScopeRequest,
    out_tx: mpsc::Sender<ServerEvent>,
    mut out_rx: mpsc::Receiver<ServerEvent>,
) {
    let (mut sink, mut stream) = socket.split();

    let group = lifecycle
        .keys()
        .first()
        .map(|key| key.group_name())
        .unwrap_or_default();
    let _ = out_tx
        .send(ServerEvent::Hello {
            user_id: lifecycle.user_id(),
            group,
        })
        .await;

    let mut writer = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut writer => break,
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    handle_client_event(&state, &lifecycle, &request, &out_tx, &text).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    debug!(
                        connection_id = %lifecycle.connection_id(),
                        %error,
                        "websocket read failed"
                    );
                    break;
                }
            },
        }
    }

    lifecycle.close().await;
    writer.abort();
}

async fn handle_client_event(
    state: &GatewayState,
    lifecycle: &ConnectionLifecycle,
    request: &ScopeRequest,
    out_tx: &mpsc::Sender<ServerEvent>,
    text: &str,
) {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(ClientEvent::Ping) => {
            let _ = out_tx.send(ServerEvent::Pong).await;
        }
        Ok(ClientEvent::Message { content }) => {
            if let Err(error) = state
                .chat
                .submit(lifecycle.user_id(), request, &content)
                .await
            {
                let _ = out_tx
                    .send(ServerEvent::Error {
                        message: error.to_string(),
                    })
                    .await;
            }
        }
        Err(_) => {
            let _ = out_tx
                .send(ServerEvent::Error {
                    message: "malformed event".to_string(),
                })
                .await;
        }
    }
}
