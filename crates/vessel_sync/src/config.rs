//! Tunables of the synchronization core.
//!
//! Both structs deserialize from the host's TOML sections and fall back to
//! the reference constants for missing keys.

use crate::proto::MAX_PROTO_BYTES;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lock arbitration timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSystemConfig {
    /// Interval of the reclaim-control routine
    pub reclaim_interval_ms: u64,
    /// Interval of the secondary vessel update-lock routine
    pub secondary_locks_interval_ms: u64,
    /// Interval of the spectating status-line refresh
    pub spectate_message_interval_ms: u64,
    /// Time after a scene load before routines start acting
    pub scene_settle_ms: u64,
    /// How long each spectating status line stays on screen
    pub spectate_message_duration_ms: u64,
}

impl Default for LockSystemConfig {
    fn default() -> Self {
        Self {
            reclaim_interval_ms: 3000,
            secondary_locks_interval_ms: 1000,
            spectate_message_interval_ms: 1000,
            scene_settle_ms: 1000,
            spectate_message_duration_ms: 2000,
        }
    }
}

impl LockSystemConfig {
    pub fn reclaim_interval(&self) -> Duration {
        Duration::from_millis(self.reclaim_interval_ms)
    }

    pub fn secondary_locks_interval(&self) -> Duration {
        Duration::from_millis(self.secondary_locks_interval_ms)
    }

    pub fn spectate_message_interval(&self) -> Duration {
        Duration::from_millis(self.spectate_message_interval_ms)
    }

    pub fn scene_settle(&self) -> Duration {
        Duration::from_millis(self.scene_settle_ms)
    }

    pub fn spectate_message_duration(&self) -> Duration {
        Duration::from_millis(self.spectate_message_duration_ms)
    }
}

/// Full-state transmission settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtoConfig {
    /// Capacity of the shared serialization buffer, capped at 10,000,000 bytes
    pub buffer_capacity: usize,
    /// Interval between periodic full-state broadcasts of update-locked vessels
    pub broadcast_interval_ms: u64,
}

impl Default for ProtoConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: MAX_PROTO_BYTES,
            broadcast_interval_ms: 2500,
        }
    }
}

impl ProtoConfig {
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let locks = LockSystemConfig::default();
        assert_eq!(locks.reclaim_interval(), Duration::from_secs(3));
        assert_eq!(locks.secondary_locks_interval(), Duration::from_secs(1));
        assert_eq!(locks.spectate_message_duration(), Duration::from_secs(2));
        assert_eq!(ProtoConfig::default().buffer_capacity, 10_000_000);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: LockSystemConfig = serde_json::from_str(r#"{"reclaim_interval_ms": 500}"#).unwrap();
        assert_eq!(config.reclaim_interval_ms, 500);
        assert_eq!(config.scene_settle_ms, 1000);
    }
}
