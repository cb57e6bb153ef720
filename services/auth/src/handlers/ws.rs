use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use skypipe_auth_types::bearer::{BearerRejection, bearer_from_headers};

use crate::handlers::extract::{AuthRejection, authenticate};
use crate::infra::registry::{ConnectionHandle, ConnectionRegistry};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

// ── GET /ws ───────────────────────────────────────────────────────────────────

/// Authenticate, then upgrade. The token comes from the `Authorization`
/// header or, for browser clients that cannot set headers, `?token=`.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let token = match bearer_from_headers(&headers) {
        Ok(token) => token,
        Err(BearerRejection::Missing) => match query.token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => return AuthRejection::Bearer(BearerRejection::Missing).into_response(),
        },
        Err(rejection) => return AuthRejection::Bearer(rejection).into_response(),
    };
    let user = match authenticate(&state, &token).await {
        Ok(user) => user,
        Err(rejection) => return rejection.into_response(),
    };
    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return rejection.into_response(),
    };

    let registry = state.registry.clone();
    upgrade.on_upgrade(move |socket| run_socket(socket, registry, user.id))
}

/// Forward queued events to the client until either side goes away.
async fn run_socket(socket: WebSocket, registry: ConnectionRegistry, user_id: Uuid) {
    let (handle, mut events) = ConnectionHandle::channel();
    let connection_id = handle.id;
    if registry.register(user_id, handle).is_some() {
        debug!(%user_id, "replaced previous socket");
    }
    info!(%user_id, %connection_id, "socket connected");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(payload) => {
                    if sink.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                // Replaced by a newer connection.
                None => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = sink.close().await;
    registry.remove_connection(user_id, connection_id);
    info!(%user_id, %connection_id, "socket closed");
}
