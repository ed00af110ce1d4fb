//! Dispatcher implementation backed by the connection manager.
//!
//! Bridges the abstract [`MessageDispatcher`] seam the core components
//! send through to the concrete connection bookkeeping, so sessions, the
//! hub and the queue never see sockets or channels.

use super::manager::ConnectionManager;
use super::ConnectionId;
use crate::messaging::{DispatchError, MessageDispatcher, ServerResponse};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

/// [`MessageDispatcher`] over the live connection maps.
#[derive(Clone, Debug)]
pub struct ConnectionResponseSender {
    connection_manager: Arc<ConnectionManager>,
}

impl ConnectionResponseSender {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }
}

impl MessageDispatcher for ConnectionResponseSender {
    /// Queues a message for the connection currently mapped to the player.
    ///
    /// The send is non-blocking end to end: resolving the connection takes
    /// the read lock briefly, and the queue insert is a `try_send`.
    fn send_to_player(
        &self,
        player_id: Uuid,
        response: ServerResponse,
    ) -> Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send + '_>> {
        let connection_manager = self.connection_manager.clone();
        Box::pin(async move { connection_manager.push_to_player(player_id, response).await })
    }

    fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        response: ServerResponse,
    ) -> Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send + '_>> {
        let connection_manager = self.connection_manager.clone();
        Box::pin(async move {
            connection_manager
                .push_to_connection(connection_id, response)
                .await
        })
    }
}
