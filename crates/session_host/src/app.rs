//! Main application logic and lifecycle management.
//!
//! [`Application`] merges CLI overrides into the loaded configuration, builds
//! the [`DemoSession`] and runs the tick loop until a shutdown signal arrives.

use crate::{cli::CliArgs, config::AppConfig, logging::display_banner, session::DemoSession, signals::wait_for_shutdown_signal};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    session: DemoSession,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Load the flight scene and enable lock arbitration
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(player) = args.player {
            config.player.name = player;
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let session = DemoSession::new(&config, Instant::now())?;
        info!(
            "🚀 Joined session as {} | tick: {}ms | buffer: {} bytes",
            config.player.name, config.simulation.tick_interval_ms, config.proto.buffer_capacity
        );

        Ok(Self { config, session })
    }

    /// Runs the tick loop until a shutdown signal, then leaves the session.
    pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting session tick loop");

        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.simulation.tick_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let shutdown = wait_for_shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.session.tick(Instant::now());
                }
                result = &mut shutdown => {
                    if let Err(e) = result {
                        error!("❌ Signal handling failed: {e}");
                    }
                    break;
                }
            }
        }

        info!("🛑 Shutting down session...");
        let stats = self.session.shutdown();
        info!("📊 Final Session Statistics:");
        info!("  - Ticks run: {}", stats.ticks);
        info!("  - Vessels in scene: {}", stats.vessels);
        info!("  - Vessels removed: {}", stats.removed_vessels);
        for (kind, count) in &stats.messages {
            info!("  - {} messages sent: {}", kind, count);
        }
        info!("  - Proto bytes sent: {}", stats.proto_bytes);
        info!("✅ Session ended gracefully");

        Ok(())
    }
}
