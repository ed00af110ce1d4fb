//! Connection management for client connections.
//!
//! This module handles the lifecycle of client connections: connection
//! tracking, player identity binding (including reconnect eviction), and
//! the per-connection outbound channels everything server-to-client flows
//! through.

pub mod client;
pub mod manager;
pub mod response;

pub use manager::ConnectionManager;
pub use response::ConnectionResponseSender;

/// Type alias for connection identifiers.
///
/// Connection IDs are used to uniquely identify client connections
/// throughout their lifecycle on the server.
pub type ConnectionId = usize;
