//! Core game server implementation.
//!
//! This module contains the main [`GameServer`] struct: the single place
//! where the connection manager, matchmaking queue, session registry and
//! message hub are constructed and wired together, plus the TCP accept
//! loop that feeds them. One instance is built at process start and
//! threaded through explicitly; there is no global registry.

use crate::{
    config::ServerConfig,
    connection::{ConnectionManager, ConnectionResponseSender},
    error::ServerError,
    matchmaking::QueueSystem,
    messaging::{ClientPackage, MessageHub, MessageSender},
    server::handlers::handle_connection,
    session::SessionRegistry,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::time::Duration;
use tracing::{error, info, warn};

/// Capacity of the shared inbound channel between connections and the hub.
const INBOUND_CHANNEL_CAPACITY: usize = 100;

/// The core game server structure.
///
/// `GameServer` owns the routing layer (hub + matchmaking queue + session
/// registry) and the network edge (accept loop + per-connection pumps).
/// Lifecycle is explicit: [`GameServer::start`] runs until
/// [`GameServer::shutdown`] is called.
pub struct GameServer {
    /// Server configuration settings
    config: ServerConfig,

    /// Manager for client connections and outbound channels
    connection_manager: Arc<ConnectionManager>,

    /// Registry of running game sessions
    registry: Arc<SessionRegistry>,

    /// Matchmaking queue
    queue_system: Arc<QueueSystem>,

    /// Unified sender every component pushes outbound messages through
    sender: MessageSender,

    /// Sender half of the shared inbound package channel
    inbound_tx: mpsc::Sender<ClientPackage>,

    /// Receiver half, consumed by the hub when routing starts
    inbound_rx: Mutex<Option<mpsc::Receiver<ClientPackage>>>,

    /// Broadcast used to stop the hub and the accept loop
    shutdown_tx: watch::Sender<bool>,

    routing_started: AtomicBool,
}

impl GameServer {
    /// Creates a new game server with the specified configuration.
    ///
    /// All components are constructed and wired here; nothing runs until
    /// [`GameServer::start`] (or [`GameServer::start_routing`] in tests
    /// that skip the network edge).
    pub fn new(config: ServerConfig) -> Self {
        let connection_manager = Arc::new(ConnectionManager::new(
            config.gameplay.outbound_channel_capacity,
        ));
        let sender = MessageSender::new(Arc::new(ConnectionResponseSender::new(
            connection_manager.clone(),
        )));
        let registry = Arc::new(SessionRegistry::new(config.clone(), sender.clone()));
        let queue_system = Arc::new(QueueSystem::new(
            config.match_size,
            Duration::from_millis(config.queue_poll_interval_ms.max(1)),
        ));
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            connection_manager,
            registry,
            queue_system,
            sender,
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
            shutdown_tx,
            routing_started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn connection_manager(&self) -> &Arc<ConnectionManager> {
        &self.connection_manager
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn sender(&self) -> &MessageSender {
        &self.sender
    }

    /// Sender half of the shared inbound channel, one clone per
    /// connection read pump.
    pub fn inbound_channel(&self) -> mpsc::Sender<ClientPackage> {
        self.inbound_tx.clone()
    }

    /// Starts the matchmaking queue and the message hub. Idempotent.
    ///
    /// Split out from [`GameServer::start`] so tests can drive the routing
    /// layer through the inbound channel without opening sockets.
    pub fn start_routing(&self) {
        if self.routing_started.swap(true, Ordering::SeqCst) {
            return;
        }

        self.queue_system.start();
        let (Some(inbound_rx), Some(matched_rx), Some(status_rx)) = (
            self.inbound_rx.lock().unwrap().take(),
            self.queue_system.take_matched_rx(),
            self.queue_system.take_status_rx(),
        ) else {
            error!("Routing channels already taken; hub not started");
            return;
        };

        let hub = MessageHub::new(
            inbound_rx,
            matched_rx,
            status_rx,
            self.registry.clone(),
            self.queue_system.clone(),
            self.connection_manager.clone(),
            self.sender.clone(),
            self.shutdown_tx.subscribe(),
        );
        tokio::spawn(hub.run());
    }

    /// Starts the server: routing layer plus the TCP accept loop. Runs
    /// until [`GameServer::shutdown`] is called.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_routing();

        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Network(format!("Failed to bind {}: {e}", self.config.bind_address)))?;
        info!("🚀 Game server listening on {}", self.config.bind_address);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!("Accept failed: {e}");
                            continue;
                        }
                    };

                    if self.connection_manager.connection_count().await >= self.config.max_connections {
                        warn!("Connection limit reached; rejecting {addr}");
                        drop(stream);
                        continue;
                    }

                    let connection_manager = self.connection_manager.clone();
                    let inbound_tx = self.inbound_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, addr, connection_manager, inbound_tx).await
                        {
                            warn!("Connection from {addr} ended with error: {e}");
                        }
                    });
                }
                _ = shutdown_rx.changed() => break,
            }
        }

        info!("🛑 Accept loop stopped");
        Ok(())
    }

    /// Stops the accept loop and the hub, then shuts down every session.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        self.registry.shutdown_all().await;
        info!("✅ Game server shutdown complete");
    }
}

impl std::fmt::Debug for GameServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameServer")
            .field("bind_address", &self.config.bind_address)
            .finish_non_exhaustive()
    }
}
