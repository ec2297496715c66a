use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::driver::{GeoPoint, VehicleClass};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Rider,
    Driver,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WsQuery {
    pub role: Role,
    pub id: Uuid,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum InboundMessage {
    Location {
        lat: f64,
        lng: f64,
        vehicle_class: VehicleClass,
    },
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, params: WsQuery) {
    let WsQuery { role, id } = params;
    let (mut sender, mut receiver) = socket.split();

    let mut rx = state.connections.register(id);
    let handle = match state.connections.sender(id) {
        Some(handle) => handle,
        None => return,
    };

    info!(identity = %id, role = ?role, "websocket client connected");

    let send_task = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            let json = match serde_json::to_string(&envelope) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if role != Role::Driver {
                continue;
            }

            let Message::Text(text) = message else {
                continue;
            };

            if let Ok(InboundMessage::Location {
                lat,
                lng,
                vehicle_class,
            }) = serde_json::from_str(&text)
            {
                recv_state
                    .directory
                    .upsert_presence(id, GeoPoint { lat, lng }, vehicle_class);
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.connections.unregister(id, &handle);

    // A dropped driver socket takes the driver out of matching.
    if role == Role::Driver && state.directory.set_online(id, false).is_ok() {
        state
            .metrics
            .online_drivers
            .set(state.directory.online_count() as i64);
    }

    info!(identity = %id, "websocket client disconnected");
}
