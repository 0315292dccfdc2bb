//! # Vessel Sync Session Host - Main Entry Point
//!
//! Runs one participant of a multiplayer flight session on top of the
//! `vessel_sync` core. The host owns a simulated flight scene, a scripted
//! remote participant and a logging transport, and drives the core from a
//! single-threaded tick loop.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! session-host
//!
//! # Specify custom configuration
//! session-host --config session.toml
//!
//! # Override specific settings
//! session-host --player Valentina --log-level debug
//!
//! # JSON logging
//! session-host --json-logs
//! ```
//!
//! ## Configuration
//!
//! The host loads configuration from a TOML file (default: `config.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Signal Handling
//!
//! The session shuts down gracefully on SIGINT (Ctrl+C) and SIGTERM, releasing
//! every lock the local player holds.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod session;
mod signals;
mod transport;

use app::Application;
use cli::CliArgs;

/// Main entry point for the session host.
///
/// 1. Command-line argument parsing
/// 2. Configuration loading (for logging settings)
/// 3. Logging system initialization
/// 4. Application creation and execution
///
/// Exits the process with code 1 on startup or runtime failure.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let mut config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
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

pub use config::{AppConfig, LoggingSettings, PlayerSettings, PositionSettings, SimulationSettings};
pub use session::{DemoSession, SessionStats};
pub use transport::{LoggingTransport, SessionClock};
