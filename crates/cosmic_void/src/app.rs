//! Main application logic and lifecycle management.
//!
//! This module contains the core `Application` struct that orchestrates
//! server startup, runtime monitoring and graceful shutdown.

use crate::{cli::CliArgs, config::AppConfig, logging::display_banner, signals};
use game_server::GameServer;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Main application struct.
///
/// Manages the complete lifecycle of the server: configuration loading
/// with CLI overrides, server construction, and shutdown coordination.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Game server instance
    server: Arc<GameServer>,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating defaults if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate the merged configuration
    /// 4. Display the startup banner
    /// 5. Construct the game server
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        // Apply CLI overrides
        if let Some(bind_address) = args.bind_address {
            config.server.bind_address = bind_address;
        }
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if let Some(match_size) = args.match_size {
            config.matchmaking.match_size = match_size;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let server_config = config.to_server_config()?;
        let server = Arc::new(GameServer::new(server_config));

        info!(
            "📂 Config: {} | Match size: {} | Tick: {}ms",
            args.config_path.display(),
            config.matchmaking.match_size,
            config.server.tick_interval_ms
        );

        Ok(Self { config, server })
    }

    /// Runs the application until a shutdown signal arrives.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Cosmic Void Game Server");
        self.log_configuration_summary();

        // Start server in background
        let server_handle = {
            let server = self.server.clone();
            tokio::spawn(async move {
                match server.start().await {
                    Ok(()) => info!("✅ Server completed successfully"),
                    Err(e) => {
                        error!("❌ Server error: {e:?}");
                        std::process::exit(1);
                    }
                }
            })
        };

        info!("✅ Cosmic Void Server is now running!");
        info!(
            "🎮 Ready to accept connections on {}",
            self.config.server.bind_address
        );
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        signals::wait_for_shutdown().await?;

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");
        self.server.shutdown().await;

        if let Err(e) =
            tokio::time::timeout(tokio::time::Duration::from_secs(8), server_handle).await
        {
            warn!("⏰ Server task did not complete within timeout: {e:?}");
        } else {
            info!("✅ Server task completed gracefully");
        }

        info!("✅ Cosmic Void Game Server shutdown complete");
        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  👥 Max connections: {}", self.config.server.max_connections);
        info!("  ⏱️ Tick interval: {}ms", self.config.server.tick_interval_ms);
        info!("  🎯 Match size: {}", self.config.matchmaking.match_size);
        info!(
            "  🚪 Interact range: {} units",
            self.config.gameplay.interact_range
        );
    }
}
