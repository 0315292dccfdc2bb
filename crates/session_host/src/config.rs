//! Configuration management for the session host.
//!
//! Loads and validates the host configuration from a TOML file. Sections that
//! belong to the synchronization core reuse its own configuration structs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use vessel_sync::{LockSystemConfig, ProtoConfig, MAX_PROTO_BYTES};

fn default_player_name() -> String {
    "player".to_string()
}

fn default_snapshot_interval_ms() -> u64 {
    500
}

fn default_tick_interval() -> u64 {
    50 // 20 ticks per second
}

fn default_debris_count() -> usize {
    3
}

fn default_remote_player() -> String {
    "remote".to_string()
}

fn default_remote_leave_at_secs() -> f64 {
    10.0
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Local participant identity
    #[serde(default)]
    pub player: PlayerSettings,
    /// Lock arbitration routine intervals
    #[serde(default)]
    pub locks: LockSystemConfig,
    /// Serialization buffer and full-state broadcast settings
    #[serde(default)]
    pub proto: ProtoConfig,
    /// Remote position snapshot settings
    #[serde(default)]
    pub position: PositionSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Simulated flight scene settings
    #[serde(default)]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Display name recorded as lock holder
    #[serde(default = "default_player_name")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSettings {
    /// Interval between snapshots sent by the scripted remote participant
    #[serde(default = "default_snapshot_interval_ms")]
    pub snapshot_interval_ms: u64,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
    /// Optional file path for log output (None means stdout only)
    pub file_path: Option<String>,
}

/// Simulated flight scene driven by the tick loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Tick interval in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Debris vessels orbiting near the active vessel
    #[serde(default = "default_debris_count")]
    pub debris_count: usize,
    /// Name of the scripted remote participant
    #[serde(default = "default_remote_player")]
    pub remote_player: String,
    /// Simulation time (seconds) at which the remote participant leaves
    #[serde(default = "default_remote_leave_at_secs")]
    pub remote_leave_at_secs: f64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            name: default_player_name(),
        }
    }
}

impl Default for PositionSettings {
    fn default() -> Self {
        Self {
            snapshot_interval_ms: default_snapshot_interval_ms(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            debris_count: default_debris_count(),
            remote_player: default_remote_player(),
            remote_leave_at_secs: default_remote_leave_at_secs(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file
    /// at the specified path and returns the default configuration.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if self.player.name.trim().is_empty() {
            return Err("Player name cannot be empty".to_string());
        }

        let intervals = [
            ("locks.reclaim_interval_ms", self.locks.reclaim_interval_ms),
            ("locks.secondary_locks_interval_ms", self.locks.secondary_locks_interval_ms),
            ("locks.spectate_message_interval_ms", self.locks.spectate_message_interval_ms),
            ("proto.broadcast_interval_ms", self.proto.broadcast_interval_ms),
            ("position.snapshot_interval_ms", self.position.snapshot_interval_ms),
            ("simulation.tick_interval_ms", self.simulation.tick_interval_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(format!("{name} must be greater than zero"));
        }

        if self.proto.buffer_capacity == 0 || self.proto.buffer_capacity > MAX_PROTO_BYTES {
            return Err(format!(
                "proto.buffer_capacity must be between 1 and {MAX_PROTO_BYTES}, got {}",
                self.proto.buffer_capacity
            ));
        }

        if self.simulation.remote_player.trim().is_empty() {
            return Err("Remote player name cannot be empty".to_string());
        }
        if self.simulation.remote_player == self.player.name {
            return Err("Remote player name must differ from the local player name".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}
