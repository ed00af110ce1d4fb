//! Client connection representation.

use crate::messaging::{Player, ServerResponse};
use std::net::SocketAddr;
use std::time::SystemTime;
use tokio::sync::mpsc;

/// State tracked for one connected client.
///
/// The outbound sender is the connection's bounded write queue; dropping it
/// (by removing the connection) closes the channel and ends the
/// connection's write pump.
#[derive(Debug)]
pub struct ClientConnection {
    /// The player identity bound to this connection, once resolved
    pub player: Option<Player>,

    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this connection was established
    pub connected_at: SystemTime,

    /// Sender half of the connection's outbound message channel
    pub(super) outbound: Option<mpsc::Sender<ServerResponse>>,
}

impl ClientConnection {
    /// Creates a new connection record with no player bound yet and no
    /// outbound channel registered.
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            player: None,
            remote_addr,
            connected_at: SystemTime::now(),
            outbound: None,
        }
    }
}
