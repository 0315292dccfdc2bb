//! Logging system setup and configuration.
//!
//! Initializes the tracing subscriber with either human-readable or JSON
//! output, optionally mirrored to a log file.

use crate::config::LoggingSettings;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the logging system with the specified configuration.
///
/// `RUST_LOG` takes precedence over the configured level. `json_format` is the
/// CLI override and wins over `config.json_format` when set.
pub fn setup_logging(config: &LoggingSettings, json_format: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = config.level.as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_file = match &config.file_path {
        Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter);

    if json_format || config.json_format {
        registry
            .with(fmt::layer().json().with_file(false).with_line_number(false).with_thread_names(true))
            .with(log_file.map(|file| fmt::layer().json().with_ansi(false).with_writer(Mutex::new(file))))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_ansi(true).with_file(false).with_line_number(false).with_thread_names(true))
            .with(log_file.map(|file| fmt::layer().with_ansi(false).with_writer(Mutex::new(file))))
            .try_init()?;
    }

    info!("🔧 Logging initialized with level: {}", log_level);
    Ok(())
}

/// Displays the startup banner.
pub fn display_banner() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("UNK");
    info!("╔══════════════════════════════════════════╗");
    info!("║          🛰️  VESSEL SYNC HOST  🛰️          ║");
    info!("║                 v{:<10}              ║", version);
    info!("║                                          ║");
    info!("║  🔒 Advisory vessel locks                ║");
    info!("║  📈 Snapshot interpolation               ║");
    info!("║  📦 Proto vessel transmission            ║");
    info!("╚══════════════════════════════════════════╝");
}
