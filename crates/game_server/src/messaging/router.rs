//! The message hub: routing for every inbound client package.
//!
//! One long-running task `select`s over three channels: the shared inbound
//! package channel fed by every connection's read pump, the matched-players
//! channel and the queue-status channel from matchmaking. Game actions are
//! forwarded into the session named by their payload; menu actions drive
//! the matchmaking queue; matchmaking events fan out as pushes to the
//! affected players.

use super::sender::MessageSender;
use super::types::{Action, ClientPackage, Player};
use crate::connection::ConnectionManager;
use crate::error::GameError;
use crate::matchmaking::{QueueStatus, QueueSystem};
use crate::session::SessionRegistry;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Core concurrent message orchestrator.
///
/// Constructed once by the server with every collaborator injected; owns
/// its receivers for the duration of [`MessageHub::run`].
pub struct MessageHub {
    inbound_rx: mpsc::Receiver<ClientPackage>,
    matched_rx: mpsc::Receiver<Vec<Player>>,
    status_rx: mpsc::Receiver<QueueStatus>,
    registry: Arc<SessionRegistry>,
    queue_system: Arc<QueueSystem>,
    connection_manager: Arc<ConnectionManager>,
    sender: MessageSender,
    shutdown_rx: watch::Receiver<bool>,
}

impl MessageHub {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inbound_rx: mpsc::Receiver<ClientPackage>,
        matched_rx: mpsc::Receiver<Vec<Player>>,
        status_rx: mpsc::Receiver<QueueStatus>,
        registry: Arc<SessionRegistry>,
        queue_system: Arc<QueueSystem>,
        connection_manager: Arc<ConnectionManager>,
        sender: MessageSender,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            inbound_rx,
            matched_rx,
            status_rx,
            registry,
            queue_system,
            connection_manager,
            sender,
            shutdown_rx,
        }
    }

    /// Runs the hub until shutdown or until every input channel closes.
    pub async fn run(mut self) {
        info!("📮 Message hub running");
        loop {
            tokio::select! {
                package = self.inbound_rx.recv() => match package {
                    Some(package) => self.handle_package(package).await,
                    None => break,
                },
                matched = self.matched_rx.recv() => match matched {
                    Some(players) => self.handle_matched(players).await,
                    None => break,
                },
                status = self.status_rx.recv() => match status {
                    Some(status) => self.handle_queue_status(status).await,
                    None => break,
                },
                _ = self.shutdown_rx.changed() => break,
            }
        }
        info!("📮 Message hub stopped");
    }

    /// Classifies one inbound package as a game action, a menu action or
    /// junk, and dispatches it.
    async fn handle_package(&self, package: ClientPackage) {
        match Action::parse(&package.message.action) {
            Some(action) if action.is_game_action() => self.route_to_session(package).await,
            Some(Action::FindGame) => self.handle_find_game(package).await,
            Some(Action::LeaveQueue) => self.handle_leave_queue(package).await,
            _ => {
                let error =
                    GameError::InvalidPayload(format!("unknown action '{}'", package.message.action));
                debug!("Connection {}: {}", package.connection_id, error);
                self.sender
                    .respond_error(package.connection_id, &package.message.action, &error)
                    .await;
            }
        }
    }

    /// Forwards a game action verbatim into the session named by its
    /// payload.
    ///
    /// The forward is an awaited send into the session's buffered channel;
    /// if the room falls behind, the hub waits here rather than dropping
    /// the package. This is the routing layer's one backpressure point.
    async fn route_to_session(&self, package: ClientPackage) {
        let session_id = match package.message.session_id() {
            Ok(session_id) => session_id,
            Err(e) => {
                self.sender
                    .respond_error(package.connection_id, &package.message.action, &e)
                    .await;
                return;
            }
        };

        let Some(session) = self.registry.get(session_id).await else {
            self.sender
                .respond_error(
                    package.connection_id,
                    &package.message.action,
                    &GameError::SessionNotFound(session_id),
                )
                .await;
            return;
        };

        if session.message_channel().send(package).await.is_err() {
            warn!("Session {} channel closed; package dropped", session_id);
        }
    }

    /// `find_game`: resolve the player behind the connection and enqueue
    /// them for matching.
    async fn handle_find_game(&self, package: ClientPackage) {
        let Some(player) = self
            .connection_manager
            .player_for_connection(package.connection_id)
            .await
        else {
            self.sender
                .respond_error(
                    package.connection_id,
                    &package.message.action,
                    &GameError::UnknownConnection(package.connection_id),
                )
                .await;
            return;
        };

        self.queue_system.join(player).await;
        self.sender
            .respond_success(
                package.connection_id,
                &package.message.action,
                json!({ "queued": true }),
            )
            .await;
    }

    /// `leave_queue`: resolve the player and drop them from the queue.
    async fn handle_leave_queue(&self, package: ClientPackage) {
        let Some(player) = self
            .connection_manager
            .player_for_connection(package.connection_id)
            .await
        else {
            self.sender
                .respond_error(
                    package.connection_id,
                    &package.message.action,
                    &GameError::UnknownConnection(package.connection_id),
                )
                .await;
            return;
        };

        self.queue_system.leave(player.id).await;
        self.sender
            .respond_success(
                package.connection_id,
                &package.message.action,
                json!({ "queued": false }),
            )
            .await;
    }

    /// A full match arrived: spin up the session and tell every matched
    /// player where to go.
    async fn handle_matched(&self, players: Vec<Player>) {
        let session = self.registry.create_session(&players).await;

        for player in &players {
            if let Err(e) = self
                .sender
                .send_to_player(
                    player.id,
                    super::types::ServerResponse::success(
                        Action::GameFound.as_str(),
                        json!({ "session_id": session.id() }),
                    ),
                )
                .await
            {
                warn!(
                    "Failed to notify player {} of session {}: {}",
                    player.id,
                    session.id(),
                    e
                );
            }
        }
    }

    /// Pushes the waiting count to everyone still in the queue.
    async fn handle_queue_status(&self, status: QueueStatus) {
        let response = super::types::ServerResponse::success(
            Action::QueueStatus.as_str(),
            json!({ "current": status.current, "total": status.total }),
        );
        let failed = self
            .sender
            .broadcast_to_players(&status.players, &response)
            .await;
        if failed > 0 {
            debug!("Queue status missed {} player(s)", failed);
        }
    }
}

impl std::fmt::Debug for MessageHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHub").finish_non_exhaustive()
    }
}
