//! In-process transport and clock used by the host.
//!
//! The host has no network peer: outgoing messages are logged and counted
//! per kind, and simulation time advances with the wall clock.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, trace};
use vessel_sync::{LockAction, MessageSink, SimulationClock, VesselCliMsg};

/// Message sink that logs every outgoing message.
#[derive(Debug, Default)]
pub struct LoggingTransport {
    counts: Mutex<BTreeMap<&'static str, usize>>,
    bytes_sent: Mutex<usize>,
    last_game_time: Mutex<Option<f64>>,
}

impl LoggingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages queued so far, per message kind.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        self.counts.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.counts
            .lock()
            .map(|c| c.get(kind).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Simulation time stamped on the latest proto or fairing message.
    pub fn last_game_time(&self) -> Option<f64> {
        self.last_game_time.lock().map(|t| *t).unwrap_or(None)
    }

    /// Total proto payload bytes queued.
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent.lock().map(|b| *b).unwrap_or(0)
    }
}

impl MessageSink for LoggingTransport {
    fn queue_outgoing(&self, message: VesselCliMsg) {
        match &message {
            VesselCliMsg::Lock(msg) => {
                let verb = match msg.action {
                    LockAction::Acquire { force: true } => "force-acquired",
                    LockAction::Acquire { force: false } => "acquired",
                    LockAction::Release => "released",
                };
                debug!("🔐 {} {} {:?} lock on {}", msg.player, verb, msg.lock_type, msg.vessel_id);
            }
            VesselCliMsg::Proto(msg) => {
                trace!(vessel_id = %msg.vessel_id, num_bytes = msg.num_bytes, force_reload = msg.force_reload, "📦 Proto vessel queued");
                if let Ok(mut bytes) = self.bytes_sent.lock() {
                    *bytes += msg.num_bytes;
                }
            }
            VesselCliMsg::Fairing(msg) => {
                debug!("🪂 Fairing of part {} deployed on {}", msg.part_flight_id, msg.vessel_id);
            }
        }

        let game_time = match &message {
            VesselCliMsg::Proto(msg) => Some(msg.game_time),
            VesselCliMsg::Fairing(msg) => Some(msg.game_time),
            VesselCliMsg::Lock(_) => None,
        };
        if let (Some(game_time), Ok(mut last)) = (game_time, self.last_game_time.lock()) {
            *last = Some(game_time);
        }

        if let Ok(mut counts) = self.counts.lock() {
            *counts.entry(message.kind()).or_insert(0) += 1;
        }
    }
}

/// Universal time in seconds since `started`, offset by `epoch`.
///
/// The host advances it once per tick, so every message queued during a tick
/// carries that tick's time.
#[derive(Debug)]
pub struct SessionClock {
    started: Instant,
    epoch: f64,
    /// `f64` bits of the time of the current tick
    current: AtomicU64,
}

impl SessionClock {
    pub fn new(started: Instant, epoch: f64) -> Self {
        Self {
            started,
            epoch,
            current: AtomicU64::new(epoch.to_bits()),
        }
    }

    /// Universal time at an arbitrary instant.
    pub fn universal_time_at(&self, now: Instant) -> f64 {
        self.epoch + now.saturating_duration_since(self.started).as_secs_f64()
    }

    /// Moves the clock to `now` and returns the new universal time.
    pub fn advance_to(&self, now: Instant) -> f64 {
        let ut = self.universal_time_at(now);
        self.current.store(ut.to_bits(), Ordering::Relaxed);
        ut
    }
}

impl SimulationClock for SessionClock {
    fn universal_time(&self) -> f64 {
        f64::from_bits(self.current.load(Ordering::Relaxed))
    }
}
