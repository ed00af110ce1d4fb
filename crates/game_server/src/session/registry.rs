//! Session registry: session ID to live session.
//!
//! The registry is the single owner of session lifecycles. Sessions are
//! created here (on a completed match), looked up by the hub for routing,
//! and removed only through explicit teardown.

use super::Session;
use crate::config::ServerConfig;
use crate::messaging::{MessageSender, Player};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Thread-safe map of running sessions.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    config: ServerConfig,
    sender: MessageSender,
}

impl SessionRegistry {
    pub fn new(config: ServerConfig, sender: MessageSender) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            sender,
        }
    }

    /// Creates a session for a matched group: constructs it, adds every
    /// player, starts its loops and registers it by ID.
    pub async fn create_session(&self, players: &[Player]) -> Arc<Session> {
        let session = Session::spawn(self.config.clone(), self.sender.clone());
        for player in players {
            session.add_player(player.id, &player.username);
        }

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id(), session.clone());
        info!(
            "🆕 Session {} created for {} player(s)",
            session.id(),
            players.len()
        );
        session
    }

    pub async fn get(&self, session_id: Uuid) -> Option<Arc<Session>> {
        let sessions = self.sessions.read().await;
        sessions.get(&session_id).cloned()
    }

    /// Shuts a session down and drops it from the registry.
    ///
    /// Nothing calls this automatically yet; finished-room teardown is an
    /// explicit extension point.
    pub async fn remove(&self, session_id: Uuid) -> bool {
        let session = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(&session_id)
        };
        match session {
            Some(session) => {
                session.shutdown();
                true
            }
            None => false,
        }
    }

    /// Shuts down every registered session and empties the registry. Used
    /// during server shutdown.
    pub async fn shutdown_all(&self) {
        let drained: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, session)| session).collect()
        };
        for session in drained {
            session.shutdown();
        }
    }

    pub async fn len(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}
