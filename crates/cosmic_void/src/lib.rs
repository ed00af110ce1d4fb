//! # Cosmic Void Game Server - Main Entry Point
//!
//! Real-time multiplayer game backend: matchmaking, tick-based room
//! simulation over an entity-component-system world, and WebSocket
//! messaging. This entry point handles CLI parsing, configuration loading
//! and application lifecycle management.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! cosmic_void
//!
//! # Specify custom configuration
//! cosmic_void --config production.toml
//!
//! # Override specific settings
//! cosmic_void --bind 0.0.0.0:8080 --match-size 4 --log-level debug
//!
//! # JSON logging for production
//! cosmic_void --json-logs
//! ```
//!
//! ## Configuration
//!
//! The server loads configuration from a TOML file (default:
//! `config.toml`). If the file doesn't exist, a default configuration is
//! created.
//!
//! ## Signal Handling
//!
//! The server shuts down gracefully on SIGINT (Ctrl+C) and, on Unix
//! systems, SIGTERM.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Main entry point for the Cosmic Void game server.
///
/// Handles the complete application lifecycle:
/// 1. Command-line argument parsing
/// 2. Configuration loading and validation
/// 3. Logging system initialization
/// 4. Application creation and execution
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments first
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();

    // Setup logging before anything else
    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    // Create and run application
    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {e:?}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

// Re-export main types for potential library usage
pub use config::{GameplaySettings, LoggingSettings, MatchmakingSettings, ServerSettings};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let server_config = config
            .to_server_config()
            .expect("Default config should convert to ServerConfig");
        assert_eq!(server_config.max_connections, 1000);
        assert_eq!(server_config.tick_interval_ms, 50);
        assert_eq!(server_config.match_size, 2);
        assert_eq!(server_config.gameplay.interact_range, 1.0);
    }

    #[tokio::test]
    async fn test_config_validation() {
        let mut config = AppConfig::default();

        config.server.bind_address = "invalid".to_string();
        assert!(config.validate().is_err());

        config.server.bind_address = "127.0.0.1:8080".to_string();
        config.matchmaking.match_size = 0;
        assert!(config.validate().is_err());

        config.matchmaking.match_size = 2;
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.toml");

        // First load creates the file with defaults.
        let created = AppConfig::load_from_file(&path)
            .await
            .expect("Failed to create default config");
        assert!(path.exists());
        assert_eq!(created.server.bind_address, "127.0.0.1:8080");

        // Second load reads it back.
        let loaded = AppConfig::load_from_file(&path)
            .await
            .expect("Failed to read config back");
        assert_eq!(loaded.matchmaking.match_size, created.matchmaking.match_size);
        assert_eq!(loaded.logging.level, created.logging.level);
    }

    #[tokio::test]
    async fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("partial.toml");
        tokio::fs::write(
            &path,
            "[server]\nbind_address = \"0.0.0.0:9000\"\ntick_interval_ms = 16\n",
        )
        .await
        .expect("Failed to write partial config");

        let config = AppConfig::load_from_file(&path)
            .await
            .expect("Failed to load partial config");
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.server.tick_interval_ms, 16);
        // Unspecified sections fall back to defaults.
        assert_eq!(config.matchmaking.match_size, 2);
        assert_eq!(config.gameplay.interact_range, 1.0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_cli_parsing() {
        let args = CliArgs {
            config_path: PathBuf::from("test.toml"),
            bind_address: Some("127.0.0.1:9000".to_string()),
            log_level: Some("debug".to_string()),
            match_size: Some(4),
            json_logs: true,
        };

        assert_eq!(args.config_path, PathBuf::from("test.toml"));
        assert_eq!(args.bind_address, Some("127.0.0.1:9000".to_string()));
        assert_eq!(args.log_level, Some("debug".to_string()));
        assert_eq!(args.match_size, Some(4));
        assert!(args.json_logs);
    }
}
