//! Configuration management for the Cosmic Void game server.
//!
//! This module handles loading, validation, and conversion of server
//! configuration from TOML files and command-line arguments.

use game_server::{GameplayConfig, ServerConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

fn default_max_connections() -> usize {
    1000
}

fn default_connection_timeout() -> u64 {
    60
}

fn default_tick_interval() -> u64 {
    50 // 20 ticks per second
}

fn default_match_size() -> usize {
    2
}

fn default_queue_poll_interval() -> u64 {
    1000
}

fn default_speed() -> f64 {
    1.0
}

fn default_interact_range() -> f64 {
    1.0
}

fn default_target_cooldown() -> u64 {
    100
}

fn default_player_cooldown() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration settings
    pub server: ServerSettings,
    /// Matchmaking configuration settings
    #[serde(default)]
    pub matchmaking: MatchmakingSettings,
    /// Gameplay tuning settings
    #[serde(default)]
    pub gameplay: GameplaySettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server-specific configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Network address to bind the server to (e.g., "127.0.0.1:8080")
    pub bind_address: String,
    /// Maximum number of concurrent client connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
    /// Simulation tick interval in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

/// Matchmaking queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchmakingSettings {
    /// Players per matched game
    #[serde(default = "default_match_size")]
    pub match_size: usize,
    /// How often the queue is scanned, in milliseconds
    #[serde(default = "default_queue_poll_interval")]
    pub queue_poll_interval_ms: u64,
}

/// Gameplay tuning constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameplaySettings {
    /// Speed multiplier for newly spawned players
    #[serde(default = "default_speed")]
    pub default_speed: f64,
    /// Maximum interact distance in world units
    #[serde(default = "default_interact_range")]
    pub interact_range: f64,
    /// Cooldown on an interacted target, in milliseconds
    #[serde(default = "default_target_cooldown")]
    pub target_cooldown_ms: u64,
    /// Cooldown on the acting player, in milliseconds
    #[serde(default = "default_player_cooldown")]
    pub player_cooldown_ms: u64,
}

/// Logging configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn or error
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to emit logs as JSON
    #[serde(default)]
    pub json_format: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            match_size: default_match_size(),
            queue_poll_interval_ms: default_queue_poll_interval(),
        }
    }
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            default_speed: default_speed(),
            interact_range: default_interact_range(),
            target_cooldown_ms: default_target_cooldown(),
            player_cooldown_ms: default_player_cooldown(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            matchmaking: MatchmakingSettings::default(),
            gameplay: GameplaySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file, creating the file with
    /// default contents when it does not exist yet.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                let config: AppConfig = toml::from_str(&contents)?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = AppConfig::default();
                let contents = toml::to_string_pretty(&config)?;
                tokio::fs::write(path, contents).await?;
                info!(
                    "📝 No config found; wrote defaults to {}",
                    path.display()
                );
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Validates the merged configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.server
            .bind_address
            .parse::<SocketAddr>()
            .map_err(|_| format!("invalid bind address '{}'", self.server.bind_address))?;

        if self.server.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be at least 1".to_string());
        }
        if self.matchmaking.match_size == 0 {
            return Err("match_size must be at least 1".to_string());
        }
        if self.gameplay.interact_range <= 0.0 {
            return Err("interact_range must be positive".to_string());
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.as_str()) {
            return Err(format!("invalid log level '{}'", self.logging.level));
        }

        Ok(())
    }

    /// Converts the application configuration into the library's
    /// [`ServerConfig`].
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        let bind_address: SocketAddr = self.server.bind_address.parse()?;
        let defaults = GameplayConfig::default();

        Ok(ServerConfig {
            bind_address,
            max_connections: self.server.max_connections,
            connection_timeout: self.server.connection_timeout,
            tick_interval_ms: self.server.tick_interval_ms,
            match_size: self.matchmaking.match_size,
            queue_poll_interval_ms: self.matchmaking.queue_poll_interval_ms,
            gameplay: GameplayConfig {
                default_speed: self.gameplay.default_speed,
                interact_range: self.gameplay.interact_range,
                target_cooldown_ms: self.gameplay.target_cooldown_ms,
                player_cooldown_ms: self.gameplay.player_cooldown_ms,
                ..defaults
            },
        })
    }
}
