//! Server configuration types and defaults.
//!
//! This module contains the server configuration structure and default values
//! used to initialize and customize server behavior.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Configuration structure for the game server.
///
/// Contains all parameters for server behavior: network settings, the
/// simulation tick, matchmaking and gameplay tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections allowed
    pub max_connections: usize,

    /// Connection timeout in seconds
    pub connection_timeout: u64,

    /// Simulation tick interval in milliseconds
    pub tick_interval_ms: u64,

    /// Number of players per matched game
    pub match_size: usize,

    /// How often the matchmaking queue is scanned, in milliseconds
    pub queue_poll_interval_ms: u64,

    /// Gameplay tuning constants
    pub gameplay: GameplayConfig,
}

/// Gameplay constants shared by sessions and their handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameplayConfig {
    /// Speed multiplier given to newly spawned player entities
    pub default_speed: f64,

    /// Maximum distance at which the interact action reaches a target
    pub interact_range: f64,

    /// Cooldown applied to an interacted target entity, in milliseconds
    pub target_cooldown_ms: u64,

    /// Cooldown applied to the acting player's entity, in milliseconds
    pub player_cooldown_ms: u64,

    /// Capacity of each session's inbound message channel
    pub session_channel_capacity: usize,

    /// Capacity of each connection's outbound message channel
    pub outbound_channel_capacity: usize,
}

impl ServerConfig {
    /// Tick duration in seconds, the `delta_time` handed to systems.
    ///
    /// Derived from the configured tick rate rather than measured wall
    /// clock, so simulation stays deterministic for a given entity state.
    pub fn tick_delta_seconds(&self) -> f64 {
        self.tick_interval_ms as f64 / 1000.0
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".parse().expect("Invalid default bind address"),
            max_connections: 1000,
            connection_timeout: 60,
            tick_interval_ms: 50, // 20 ticks per second by default
            match_size: 2,
            queue_poll_interval_ms: 1000,
            gameplay: GameplayConfig::default(),
        }
    }
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            default_speed: 1.0,
            interact_range: 1.0,
            target_cooldown_ms: 100,
            player_cooldown_ms: 1000,
            session_channel_capacity: 100,
            outbound_channel_capacity: 32,
        }
    }
}
