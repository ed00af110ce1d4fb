//! Connection handling logic for WebSocket clients.
//!
//! This module contains the per-connection lifecycle: WebSocket handshake
//! (resolving the player identity from the upgrade request), the read pump
//! that decodes inbound envelopes onto the hub's shared channel, the write
//! pump that drains the connection's outbound channel, and cleanup.

use crate::{
    connection::ConnectionManager,
    error::{GameError, ServerError},
    messaging::{ClientPackage, Envelope, Player, ServerResponse},
};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::handshake::server::{ErrorResponse, Request, Response},
    tungstenite::http::StatusCode,
    tungstenite::Message,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Resolves the player identity from the upgrade request's query string.
///
/// Clients connect with `?token=<player-uuid>&name=<username>`; the token
/// stands in for a real credential check, which belongs to the auth
/// collaborator, not this server.
fn parse_identity(query: Option<&str>) -> Option<Player> {
    let query = query?;
    let mut token = None;
    let mut name = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("token", value)) => token = Some(value),
            Some(("name", value)) => name = Some(value),
            _ => {}
        }
    }

    let id = Uuid::parse_str(token?).ok()?;
    Some(Player {
        id,
        username: name?.to_string(),
    })
}

/// Handles a single client connection from handshake to cleanup.
///
/// # Connection flow
///
/// 1. Accept the WebSocket upgrade, rejecting it with 400 when the query
///    string carries no usable identity
/// 2. Register the connection and bind the player (evicting a stale
///    connection on reconnect)
/// 3. Run the read and write pumps until either side ends
/// 4. Remove the connection and its player mapping
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    connection_manager: Arc<ConnectionManager>,
    inbound_tx: mpsc::Sender<ClientPackage>,
) -> Result<(), ServerError> {
    let mut identity: Option<Player> = None;
    let callback = |request: &Request, response: Response| match parse_identity(request.uri().query())
    {
        Some(player) => {
            identity = Some(player);
            Ok(response)
        }
        None => {
            let mut rejection = ErrorResponse::new(Some(
                "token and name query parameters are required".to_string(),
            ));
            *rejection.status_mut() = StatusCode::BAD_REQUEST;
            Err(rejection)
        }
    };

    let ws_stream = accept_hdr_async(stream, callback)
        .await
        .map_err(|e| ServerError::Network(format!("WebSocket handshake failed: {e}")))?;
    let player = identity
        .ok_or_else(|| ServerError::Internal("Handshake accepted without identity".to_string()))?;

    let (ws_sender, mut ws_receiver) = ws_stream.split();
    let ws_sender = Arc::new(tokio::sync::Mutex::new(ws_sender));

    let connection_id = connection_manager.add_connection(addr).await;
    connection_manager
        .bind_player(connection_id, player.clone())
        .await;
    let mut outbound_rx = connection_manager.register_outbound(connection_id).await;
    info!(
        "🎮 Player {} ({}) connected as connection {}",
        player.username, player.id, connection_id
    );

    // Write pump: drains the connection's outbound channel onto the socket.
    // Ends when the channel closes (connection removed) or the socket dies.
    let outgoing_task = {
        let ws_sender = ws_sender.clone();
        async move {
            while let Some(response) = outbound_rx.recv().await {
                let text = match serde_json::to_string(&response) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode response: {e}");
                        continue;
                    }
                };
                let mut ws_sender = ws_sender.lock().await;
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    };

    // Read pump: decodes envelopes and forwards them to the hub. Malformed
    // JSON earns the client an error response, not a disconnect.
    let incoming_task = {
        let connection_manager = connection_manager.clone();
        let ws_sender = ws_sender.clone();
        async move {
            while let Some(message) = ws_receiver.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        let envelope = match serde_json::from_str::<Envelope>(text.as_str()) {
                            Ok(envelope) => envelope,
                            Err(e) => {
                                debug!("Connection {}: undecodable message: {e}", connection_id);
                                let error = GameError::InvalidPayload(
                                    "message was not a valid JSON envelope".to_string(),
                                );
                                let _ = connection_manager
                                    .push_to_connection(
                                        connection_id,
                                        ServerResponse::error("error", &error),
                                    )
                                    .await;
                                continue;
                            }
                        };

                        let package = ClientPackage {
                            message: envelope,
                            connection_id,
                        };
                        if inbound_tx.send(package).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        let mut ws_sender = ws_sender.lock().await;
                        let _ = ws_sender.send(Message::Pong(data)).await;
                    }
                    Ok(Message::Close(_)) => {
                        debug!("🔌 Connection {} requested close", connection_id);
                        break;
                    }
                    Err(e) => {
                        warn!("WebSocket error on connection {}: {e}", connection_id);
                        break;
                    }
                    _ => {}
                }
            }
        }
    };

    // Run both pumps until one side finishes.
    tokio::select! {
        _ = incoming_task => {},
        _ = outgoing_task => {},
    }

    connection_manager.remove_connection(connection_id).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_and_name_from_query() {
        let id = Uuid::new_v4();
        let query = format!("token={id}&name=Nova");
        let player = parse_identity(Some(&query)).unwrap();
        assert_eq!(player.id, id);
        assert_eq!(player.username, "Nova");

        // order independent
        let query = format!("name=Nova&token={id}");
        assert!(parse_identity(Some(&query)).is_some());
    }

    #[test]
    fn rejects_missing_or_malformed_identity() {
        assert!(parse_identity(None).is_none());
        assert!(parse_identity(Some("")).is_none());
        assert!(parse_identity(Some("token=not-a-uuid&name=X")).is_none());
        let id = Uuid::new_v4();
        assert!(parse_identity(Some(&format!("token={id}"))).is_none());
        assert!(parse_identity(Some("name=OnlyName")).is_none());
    }
}
