//! Connection manager for tracking and managing client connections.
//!
//! The manager owns the connection-to-player and player-to-connection
//! maps and every connection's bounded outbound channel. All outbound
//! sends are non-blocking: a full buffer means the message is dropped and
//! an error reported, never a stalled sender. That shed-load policy is
//! deliberate; a slow client loses pushes instead of holding up the
//! simulation.

use super::{client::ClientConnection, ConnectionId};
use crate::messaging::{DispatchError, Player, ServerResponse};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Central manager for all client connections.
///
/// Uses `RwLock<HashMap>` storage with atomic connection ID generation.
/// The player map is kept in lockstep with the connection map: binding a
/// player to a new connection evicts any stale connection still mapped to
/// that player.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Map of connection ID to client connection information
    connections: RwLock<HashMap<ConnectionId, ClientConnection>>,

    /// Map of player ID to the connection currently carrying that player
    player_connections: RwLock<HashMap<Uuid, ConnectionId>>,

    /// Atomic counter for generating unique connection IDs
    next_id: AtomicUsize,

    /// Capacity of each per-connection outbound channel
    outbound_capacity: usize,
}

impl ConnectionManager {
    pub fn new(outbound_capacity: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            player_connections: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            outbound_capacity: outbound_capacity.max(1),
        }
    }

    /// Adds a new connection and returns its unique ID.
    pub async fn add_connection(&self, remote_addr: SocketAddr) -> ConnectionId {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, ClientConnection::new(remote_addr));
        info!("🔗 Connection {} from {}", connection_id, remote_addr);
        connection_id
    }

    /// Creates the connection's outbound channel and returns the receiver
    /// for its write pump. Replaces any previous channel for the ID.
    pub async fn register_outbound(
        &self,
        connection_id: ConnectionId,
    ) -> mpsc::Receiver<ServerResponse> {
        let (tx, rx) = mpsc::channel(self.outbound_capacity);
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&connection_id) {
            connection.outbound = Some(tx);
        }
        rx
    }

    /// Binds a resolved player identity to a connection.
    ///
    /// Reconnect safety: if the player is already mapped to a different
    /// connection, that stale connection is torn down first; its outbound
    /// channel closes (ending its write pump) and its mapping disappears
    /// before the new one is installed, so later sends reach only the new
    /// connection.
    pub async fn bind_player(&self, connection_id: ConnectionId, player: Player) {
        let stale = {
            let mut player_connections = self.player_connections.write().await;
            let stale = player_connections
                .get(&player.id)
                .copied()
                .filter(|&existing| existing != connection_id);
            player_connections.insert(player.id, connection_id);
            stale
        };

        if let Some(stale_id) = stale {
            warn!(
                "Player {} reconnected on connection {}; evicting stale connection {}",
                player.id, connection_id, stale_id
            );
            let mut connections = self.connections.write().await;
            connections.remove(&stale_id);
        }

        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&connection_id) {
            connection.player = Some(player);
        }
    }

    /// Resolves the player bound to a connection.
    pub async fn player_for_connection(&self, connection_id: ConnectionId) -> Option<Player> {
        let connections = self.connections.read().await;
        connections.get(&connection_id).and_then(|c| c.player.clone())
    }

    /// Resolves the connection currently carrying a player.
    pub async fn connection_for_player(&self, player_id: Uuid) -> Option<ConnectionId> {
        let player_connections = self.player_connections.read().await;
        player_connections.get(&player_id).copied()
    }

    /// Removes a connection and, if it is still the player's current one,
    /// the player mapping with it.
    pub async fn remove_connection(&self, connection_id: ConnectionId) {
        let removed = {
            let mut connections = self.connections.write().await;
            connections.remove(&connection_id)
        };
        let Some(connection) = removed else {
            return;
        };
        info!(
            "❌ Connection {} from {} disconnected",
            connection_id, connection.remote_addr
        );

        if let Some(player) = connection.player {
            let mut player_connections = self.player_connections.write().await;
            if player_connections.get(&player.id) == Some(&connection_id) {
                player_connections.remove(&player.id);
            }
        }
    }

    /// Queues a message on a connection's outbound channel without
    /// blocking. A missing channel or a full buffer is an error for the
    /// caller to report, not a reason to wait.
    pub async fn push_to_connection(
        &self,
        connection_id: ConnectionId,
        response: ServerResponse,
    ) -> Result<(), DispatchError> {
        let sender = {
            let connections = self.connections.read().await;
            let connection = connections
                .get(&connection_id)
                .ok_or(DispatchError::MissingChannel(connection_id))?;
            connection
                .outbound
                .clone()
                .ok_or(DispatchError::MissingChannel(connection_id))?
        };

        sender.try_send(response).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DispatchError::BufferFull(connection_id),
            mpsc::error::TrySendError::Closed(_) => DispatchError::ConnectionClosed(connection_id),
        })
    }

    /// Queues a message for the connection currently mapped to a player.
    pub async fn push_to_player(
        &self,
        player_id: Uuid,
        response: ServerResponse,
    ) -> Result<(), DispatchError> {
        let connection_id = self
            .connection_for_player(player_id)
            .await
            .ok_or(DispatchError::PlayerNotConnected(player_id))?;
        self.push_to_connection(connection_id, response).await
    }

    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }
}
