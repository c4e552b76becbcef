use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, timeout, Duration};

use crate::{
    api::AppState,
    constants::{WS_CLIENT_TIMEOUT_SECS, WS_HEARTBEAT_INTERVAL_SECS},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub address: String,
}

fn connected_payload(display_name: &str) -> String {
    serde_json::json!({
        "type": "connected",
        "message": format!("Connected to event stream as {display_name}")
    })
    .to_string()
}

/// WebSocket handler for prompts, alerts and chat updates
pub async fn handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Response> {
    let address = query.address.trim().to_ascii_lowercase();
    let identity = state.lobby.lock().await.identity(&address).await?;
    let display_name = identity.display_name();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, address, display_name)))
}

async fn handle_socket(socket: WebSocket, state: AppState, address: String, display_name: String) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.notifications.subscribe();

    let _ = sender
        .send(Message::Text(connected_payload(&display_name).into()))
        .await;

    let recipient = address.clone();
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = interval(Duration::from_secs(WS_HEARTBEAT_INTERVAL_SECS));

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
                result = rx.recv() => {
                    match result {
                        Ok(notification) if notification.is_for(&recipient) => {
                            let json = serde_json::to_string(&notification).unwrap_or_default();
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!("Event stream for {} skipped {} event(s)", recipient, skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        loop {
            let next_msg =
                timeout(Duration::from_secs(WS_CLIENT_TIMEOUT_SECS), receiver.next()).await;
            let msg = match next_msg {
                Ok(Some(Ok(msg))) => msg,
                Ok(Some(Err(_))) | Ok(None) => break,
                Err(_) => {
                    tracing::info!("WebSocket client timeout");
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received: {}", text);
                }
                Message::Close(_) => {
                    tracing::info!("Client disconnected");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    tracing::info!("WebSocket connection closed for {}", address);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_payload_has_type() {
        let payload = connected_payload("anon0");
        assert!(payload.contains("\"type\":\"connected\""));
        assert!(payload.contains("anon0"));
    }
}
