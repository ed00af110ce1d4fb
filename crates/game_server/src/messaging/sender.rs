//! Outbound message dispatch.
//!
//! Sessions, the hub and the matchmaking queue never talk to sockets; they
//! push [`ServerResponse`] values through the [`MessageDispatcher`] seam.
//! The connection manager supplies the concrete implementation, backed by
//! per-connection bounded channels with a non-blocking send, so a slow
//! client sheds messages instead of stalling the simulation.

use super::types::{Player, ServerResponse};
use crate::connection::ConnectionId;
use crate::error::GameError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Delivery failures reported by the dispatcher.
///
/// None of these blocks or crashes the caller; they are logged and, where a
/// client is still reachable, surfaced as an error response.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("player {0} has no active connection")]
    PlayerNotConnected(Uuid),

    #[error("connection {0} has no outbound channel")]
    MissingChannel(ConnectionId),

    #[error("outbound buffer full for connection {0}")]
    BufferFull(ConnectionId),

    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),
}

/// Abstract boundary through which core components push outbound messages
/// without knowing about transport details.
pub trait MessageDispatcher: Send + Sync {
    /// Queues a message for the connection currently mapped to `player_id`.
    fn send_to_player(
        &self,
        player_id: Uuid,
        response: ServerResponse,
    ) -> Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send + '_>>;

    /// Queues a message for a specific connection, bypassing player lookup.
    fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        response: ServerResponse,
    ) -> Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send + '_>>;
}

/// Unified sender handed to every core component.
///
/// Wraps the dispatcher with the small amount of shared behavior the
/// components want: broadcast with a failed-recipient count and
/// acknowledgement helpers that build the response envelope.
#[derive(Clone)]
pub struct MessageSender {
    dispatcher: Arc<dyn MessageDispatcher>,
}

impl MessageSender {
    pub fn new(dispatcher: Arc<dyn MessageDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub async fn send_to_player(
        &self,
        player_id: Uuid,
        response: ServerResponse,
    ) -> Result<(), DispatchError> {
        self.dispatcher.send_to_player(player_id, response).await
    }

    pub async fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        response: ServerResponse,
    ) -> Result<(), DispatchError> {
        self.dispatcher
            .send_to_connection(connection_id, response)
            .await
    }

    /// Sends `response` to every player in the list.
    ///
    /// Individual delivery failures are logged and counted, never
    /// propagated; the return value is the number of players the message
    /// could not be queued for.
    pub async fn broadcast_to_players(
        &self,
        players: &[Player],
        response: &ServerResponse,
    ) -> usize {
        let mut failed = 0;
        for player in players {
            if let Err(e) = self
                .dispatcher
                .send_to_player(player.id, response.clone())
                .await
            {
                warn!("Broadcast to player {} failed: {}", player.id, e);
                failed += 1;
            }
        }
        failed
    }

    /// Acknowledges `action` on `connection_id` with a success response.
    pub async fn respond_success(
        &self,
        connection_id: ConnectionId,
        action: &str,
        payload: serde_json::Value,
    ) {
        if let Err(e) = self
            .send_to_connection(connection_id, ServerResponse::success(action, payload))
            .await
        {
            warn!(
                "Failed to deliver '{}' ack to connection {}: {}",
                action, connection_id, e
            );
        }
    }

    /// Reports a [`GameError`] for `action` back to `connection_id`.
    pub async fn respond_error(
        &self,
        connection_id: ConnectionId,
        action: &str,
        error: &GameError,
    ) {
        if let Err(e) = self
            .send_to_connection(connection_id, ServerResponse::error(action, error))
            .await
        {
            warn!(
                "Failed to deliver '{}' error to connection {}: {}",
                action, connection_id, e
            );
        }
    }
}

impl std::fmt::Debug for MessageSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSender").finish_non_exhaustive()
    }
}
