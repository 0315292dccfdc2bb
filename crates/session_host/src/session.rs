//! Simulated flight session driven by the host tick loop.
//!
//! The session owns a small flight scene around the home world: the local
//! player's active vessel (with a payload fairing), a few debris fragments in
//! a nearby orbit, a landed fragment at the launch site inside the safety
//! bubble, and a station flown by a scripted remote participant.
//!
//! Each tick runs, in order:
//!
//! 1. the remote participant's step: a position snapshot every snapshot
//!    interval, or its departure once the configured time is reached
//! 2. the lock arbitration loop
//! 3. orbit propagation of every vessel the local player broadcasts
//! 4. the periodic full-state broadcast of those vessels
//! 5. interpolation of every remotely-updated vessel
//! 6. removal of vessels put on the kill list
//! 7. the scripted fairing deployment

use crate::config::AppConfig;
use crate::transport::{LoggingTransport, SessionClock};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use vessel_sync::{
    CelestialBody, FlightScene, IdentityProvider, JsonVesselSerializer, KillList, LockAction, LockMsgData, LockSystem,
    LockType, LogScreenMessages, Orbit, OrbitError, Part, PlayerName, QuaternionD, SerializationBuffer, Situation,
    SphericalSafetyBubble, StaticIdentity, TrackingInputLocks, Vector3d, Vessel, VesselFairingsMessageSender, VesselId,
    VesselLockSystem, VesselPositionStore, VesselPositionUpdate, VesselProtoMessageSender, VesselType,
};

/// Launch site coordinates on the home world (degrees, meters).
const LAUNCH_SITE: [f64; 3] = [-0.0972, -74.5577, 70.0];
const SAFETY_BUBBLE_RADIUS: f64 = 100.0;
const ACTIVE_ORBIT_ALTITUDE: f64 = 100_000.0;
const REMOTE_ORBIT_ALTITUDE: f64 = 250_000.0;
/// Angular spacing of the debris trailing the active vessel (radians).
const DEBRIS_SPACING: f64 = 1.0e-4;
const FAIRING_FLIGHT_ID: u32 = 2;
const FAIRING_DEPLOY_AT_SECS: f64 = 5.0;

/// The scripted participant sharing the session.
#[derive(Debug)]
struct RemoteParticipant {
    name: PlayerName,
    vessel_id: VesselId,
    /// Authoritative trajectory the remote participant simulates
    orbit: Orbit,
    leave_at: f64,
    next_snapshot_at: f64,
    snapshot_interval: f64,
}

/// Counters reported when the session ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub ticks: u64,
    pub vessels: usize,
    pub locks_held: usize,
    pub removed_vessels: usize,
    pub messages: BTreeMap<&'static str, usize>,
    pub proto_bytes: usize,
}

pub struct DemoSession {
    scene: FlightScene,
    arbitration: VesselLockSystem,
    positions: VesselPositionStore,
    proto_sender: VesselProtoMessageSender,
    fairings: VesselFairingsMessageSender,
    kill_list: Arc<KillList>,
    transport: Arc<LoggingTransport>,
    clock: Arc<SessionClock>,
    remote: Option<RemoteParticipant>,
    broadcast_interval: Duration,
    last_broadcast: Instant,
    fairing_deployed: bool,
    ticks: u64,
    removed_vessels: usize,
}

impl DemoSession {
    /// Builds the scene that finished loading at `loaded_at` and enables the
    /// lock arbitration loop.
    pub fn new(config: &AppConfig, loaded_at: Instant) -> Result<Self, OrbitError> {
        let transport = Arc::new(LoggingTransport::new());
        let clock = Arc::new(SessionClock::new(loaded_at, 0.0));
        let kill_list = Arc::new(KillList::new());
        let identity = StaticIdentity(PlayerName::new(config.player.name.clone()));

        let body = Arc::new(CelestialBody::kerbin());
        let [lat, lon, alt] = LAUNCH_SITE;
        let launch_site = body.world_surface_position(lat, lon, alt, 0.0);
        let bubble = Arc::new(SphericalSafetyBubble::new(launch_site, SAFETY_BUBBLE_RADIUS));

        let mut scene = FlightScene::new(loaded_at);

        let active_orbit = circular_orbit(&body, body.radius + ACTIVE_ORBIT_ALTITUDE, 0.0)?;
        let mut active = Vessel::new(VesselId::new(), "Kerbal X", VesselType::Ship, active_orbit);
        active.parts = vec![
            Part::new(1, "mk1pod"),
            Part::new(FAIRING_FLIGHT_ID, "fairingSize2"),
            Part::new(3, "liquidEngine"),
        ];
        let active_id = active.id;
        scene.insert(active);

        for i in 0..config.simulation.debris_count {
            let phase = -DEBRIS_SPACING * (i + 1) as f64;
            let orbit = circular_orbit(&body, body.radius + ACTIVE_ORBIT_ALTITUDE, phase)?;
            let name = format!("Kerbal X Debris {}", i + 1);
            scene.insert(Vessel::new(VesselId::new(), name, VesselType::Debris, orbit));
        }

        scene.insert(landed_vessel(&body, "Launch Clamp", launch_site)?);

        let remote_orbit = circular_orbit(&body, body.radius + REMOTE_ORBIT_ALTITUDE, 0.0)?;
        let remote_vessel = Vessel::new(VesselId::new(), "Remote Station", VesselType::Station, remote_orbit.clone());
        let remote = RemoteParticipant {
            name: PlayerName::new(config.simulation.remote_player.clone()),
            vessel_id: remote_vessel.id,
            orbit: remote_orbit,
            leave_at: config.simulation.remote_leave_at_secs,
            next_snapshot_at: 0.0,
            snapshot_interval: Duration::from_millis(config.position.snapshot_interval_ms).as_secs_f64(),
        };
        scene.insert(remote_vessel);

        scene.set_active_vessel(active_id);
        scene.set_ready(true);

        let mut lock_system = LockSystem::new(identity.player_name(), transport.clone());
        for lock_type in [LockType::Control, LockType::Update] {
            lock_system.apply_remote(&LockMsgData {
                vessel_id: remote.vessel_id,
                lock_type,
                player: remote.name.clone(),
                action: LockAction::Acquire { force: false },
            });
        }

        let mut arbitration = VesselLockSystem::new(
            config.locks.clone(),
            lock_system,
            bubble,
            Arc::new(LogScreenMessages::default()),
            Arc::new(TrackingInputLocks::default()),
        );
        arbitration.enable(loaded_at);

        let proto_sender = VesselProtoMessageSender::new(
            Arc::new(SerializationBuffer::new(config.proto.buffer_capacity)),
            Box::new(JsonVesselSerializer),
            transport.clone(),
            kill_list.clone(),
            clock.clone(),
        );
        let fairings = VesselFairingsMessageSender::new(transport.clone(), clock.clone());

        info!(
            "🌍 Scene loaded with {} vessels, {} flying {}",
            scene.len(),
            remote.name,
            remote.vessel_id
        );

        Ok(Self {
            scene,
            arbitration,
            positions: VesselPositionStore::new(),
            proto_sender,
            fairings,
            kill_list,
            transport,
            clock,
            remote: Some(remote),
            broadcast_interval: config.proto.broadcast_interval(),
            last_broadcast: loaded_at,
            fairing_deployed: false,
            ticks: 0,
            removed_vessels: 0,
        })
    }

    pub fn scene(&self) -> &FlightScene {
        &self.scene
    }

    pub fn arbitration(&self) -> &VesselLockSystem {
        &self.arbitration
    }

    pub fn transport(&self) -> &LoggingTransport {
        &self.transport
    }

    /// Vessel flown by the remote participant, while it is connected.
    pub fn remote_vessel_id(&self) -> Option<VesselId> {
        self.remote.as_ref().map(|r| r.vessel_id)
    }

    pub fn kill_list(&self) -> &KillList {
        &self.kill_list
    }

    /// Makes `vessel_id` the active vessel. The arbitration loop reacts on
    /// the next tick.
    pub fn switch_to(&mut self, vessel_id: VesselId) -> bool {
        self.scene.set_active_vessel(vessel_id)
    }

    /// Runs one frame at `now`.
    pub fn tick(&mut self, now: Instant) {
        let ut = self.clock.advance_to(now);
        self.ticks += 1;

        self.step_remote(ut);
        self.arbitration.tick(&self.scene, now);
        self.propagate_owned_vessels(ut);

        if now.saturating_duration_since(self.last_broadcast) >= self.broadcast_interval {
            self.last_broadcast = now;
            self.broadcast_owned_vessels();
        }

        self.positions.apply_all(&mut self.scene, self.arbitration.lock_system(), ut);
        self.remove_killed_vessels();
        self.deploy_fairing(ut);
    }

    fn step_remote(&mut self, ut: f64) {
        let Some(remote) = self.remote.as_mut() else {
            return;
        };

        if ut >= remote.leave_at {
            self.remote_leaves();
            return;
        }

        if ut < remote.next_snapshot_at {
            return;
        }
        remote.next_snapshot_at = ut + remote.snapshot_interval;

        let (position, velocity) = remote.orbit.state_at_ut(ut);
        match Orbit::from_state_vectors(position, velocity, remote.orbit.reference_body().clone(), ut) {
            Ok(orbit) => {
                let snapshot = VesselPositionUpdate::new(remote.vessel_id, orbit, QuaternionD::identity());
                self.positions.push(snapshot);
            }
            Err(e) => warn!("Remote snapshot dropped: {}", e),
        }
    }

    /// The remote participant disconnects: its locks are dropped and its
    /// vessel is no longer interpolated.
    pub fn remote_leaves(&mut self) {
        let Some(remote) = self.remote.take() else {
            return;
        };
        let released = self.arbitration.lock_system_mut().remove_player(&remote.name);
        self.positions.remove(remote.vessel_id);
        info!("👋 {} left the session, {} locks released", remote.name, released);
    }

    fn propagate_owned_vessels(&mut self, ut: f64) {
        let locks = self.arbitration.lock_system();
        for vessel in self.scene.vessels_mut() {
            if !locks.holds(vessel.id, LockType::Update) || vessel.landed_or_splashed() || vessel.is_dead() {
                continue;
            }
            let position = vessel.orbit.position_at_ut(ut);
            let [latitude, longitude, altitude] = vessel.main_body().lat_lon_alt(position, ut);
            vessel.position = position;
            vessel.latitude = latitude;
            vessel.longitude = longitude;
            vessel.altitude = altitude;
            vessel.height_from_terrain = altitude;
        }
    }

    fn broadcast_owned_vessels(&self) {
        let locks = self.arbitration.lock_system();
        let owned = self.scene.vessels().filter(|v| locks.holds(v.id, LockType::Update));
        self.proto_sender.send_vessel_messages(owned);
    }

    fn remove_killed_vessels(&mut self) {
        for (vessel_id, reason) in self.kill_list.drain() {
            if self.scene.remove(vessel_id).is_some() {
                self.removed_vessels += 1;
            }
            self.arbitration.lock_system_mut().remove_vessel(vessel_id);
            self.positions.remove(vessel_id);
            info!("💥 Removed vessel {}: {}", vessel_id, reason);
        }
    }

    fn deploy_fairing(&mut self, ut: f64) {
        if self.fairing_deployed || ut < FAIRING_DEPLOY_AT_SECS {
            return;
        }
        let Some(active_id) = self.scene.active_vessel_id() else {
            return;
        };
        if !self.arbitration.lock_system().holds(active_id, LockType::Control) {
            return;
        }
        let Some(part) = self
            .scene
            .get_mut(active_id)
            .and_then(|v| v.parts.iter_mut().find(|p| p.flight_id == FAIRING_FLIGHT_ID))
        else {
            return;
        };
        part.fairing_deployed = true;
        self.fairing_deployed = true;
        debug!(vessel_id = %active_id, "Fairing deployed");
        self.fairings.send_fairing_deployed(self.scene.get(active_id), FAIRING_FLIGHT_ID);
    }

    pub fn stats(&self) -> SessionStats {
        let player = self.arbitration.lock_system().player();
        SessionStats {
            ticks: self.ticks,
            vessels: self.scene.len(),
            locks_held: self.arbitration.lock_system().ledger().locks_held_by(player).len(),
            removed_vessels: self.removed_vessels,
            messages: self.transport.counts(),
            proto_bytes: self.transport.bytes_sent(),
        }
    }

    /// Leaves the session: stops the arbitration loop and releases every lock.
    pub fn shutdown(&mut self) -> SessionStats {
        self.arbitration.disable();
        self.stats()
    }
}

/// Circular equatorial orbit of radius `radius`, at angle `phase` from the
/// x axis at UT 0.
fn circular_orbit(body: &Arc<CelestialBody>, radius: f64, phase: f64) -> Result<Orbit, OrbitError> {
    let speed = (body.gravitational_parameter / radius).sqrt();
    let position = Vector3d::new(radius * phase.cos(), radius * phase.sin(), 0.0);
    let velocity = Vector3d::new(-speed * phase.sin(), speed * phase.cos(), 0.0);
    Orbit::from_state_vectors(position, velocity, body.clone(), 0.0)
}

/// Vessel resting on the surface at `world_position`, co-rotating with the body.
fn landed_vessel(body: &Arc<CelestialBody>, name: &str, world_position: Vector3d) -> Result<Vessel, OrbitError> {
    let relative = world_position - body.position;
    let omega = std::f64::consts::TAU / body.rotation_period;
    let velocity = Vector3d::new(-omega * relative.y, omega * relative.x, 0.0);
    let orbit = Orbit::from_state_vectors(relative, velocity, body.clone(), 0.0)?;

    let mut vessel = Vessel::new(VesselId::new(), name, VesselType::Debris, orbit);
    vessel.landed = true;
    vessel.situation = Situation::Landed;
    vessel.height_from_terrain = 0.0;
    Ok(vessel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (DemoSession, Instant) {
        let mut config = AppConfig::default();
        config.player.name = "alice".to_string();
        config.simulation.remote_player = "bob".to_string();
        config.simulation.remote_leave_at_secs = 4.0;
        let loaded_at = Instant::now();
        (DemoSession::new(&config, loaded_at).unwrap(), loaded_at)
    }

    fn at(loaded_at: Instant, ms: u64) -> Instant {
        loaded_at + Duration::from_millis(ms)
    }

    #[test]
    fn test_local_player_takes_active_and_nearby_vessels() {
        let (mut session, loaded_at) = session();
        session.tick(at(loaded_at, 1500));

        let locks = session.arbitration().lock_system();
        let active = session.scene().active_vessel_id().unwrap();
        assert!(locks.holds(active, LockType::Control));
        assert!(locks.holds(active, LockType::Update));

        for vessel in session.scene().vessels() {
            if vessel.vessel_type == VesselType::Debris && !vessel.landed {
                assert!(locks.holds(vessel.id, LockType::Update), "debris {} not owned", vessel.id);
            }
            if vessel.landed {
                assert!(!locks.update_lock_exists(vessel.id));
            }
        }
        let remote = session.remote_vessel_id().unwrap();
        assert_eq!(locks.update_lock_owner(remote), Some(&PlayerName::from("bob")));
    }

    #[test]
    fn test_remote_vessel_is_interpolated_until_remote_leaves() {
        let (mut session, loaded_at) = session();
        session.tick(at(loaded_at, 1500));
        let remote = session.remote_vessel_id().unwrap();
        let before = session.scene().get(remote).unwrap().position;

        session.tick(at(loaded_at, 2100));
        let after = session.scene().get(remote).unwrap().position;
        assert_ne!(before, after);

        session.tick(at(loaded_at, 4100));
        assert!(session.remote_vessel_id().is_none());
        assert!(!session.arbitration().lock_system().control_lock_exists(remote));

        session.tick(at(loaded_at, 5200));
        assert!(session.arbitration().lock_system().holds(remote, LockType::Update));
    }

    #[test]
    fn test_switching_to_remote_vessel_spectates_then_reclaims() {
        let (mut session, loaded_at) = session();
        session.tick(at(loaded_at, 1500));
        let remote = session.remote_vessel_id().unwrap();

        session.switch_to(remote);
        session.tick(at(loaded_at, 1600));
        assert!(session.arbitration().is_spectating());

        session.remote_leaves();
        session.tick(at(loaded_at, 3100));
        assert!(!session.arbitration().is_spectating());
        assert!(session.arbitration().lock_system().holds(remote, LockType::Control));
    }

    #[test]
    fn test_broadcast_and_fairing_are_sent() {
        let (mut session, loaded_at) = session();
        session.tick(at(loaded_at, 1500));
        session.tick(at(loaded_at, 2600));
        assert!(session.transport().count("proto") >= 1);
        let stamped = session.transport().last_game_time().unwrap();
        assert!((stamped - 2.6).abs() < 1e-9, "proto stamped at {stamped}");
        assert!(session.transport().bytes_sent() > 0);

        session.tick(at(loaded_at, 5100));
        assert_eq!(session.transport().count("fairing"), 1);
        let stamped = session.transport().last_game_time().unwrap();
        assert!((stamped - 5.1).abs() < 1e-9, "fairing stamped at {stamped}");
        session.tick(at(loaded_at, 5200));
        assert_eq!(session.transport().count("fairing"), 1);
    }

    #[test]
    fn test_shutdown_releases_every_lock() {
        let (mut session, loaded_at) = session();
        session.tick(at(loaded_at, 1500));
        assert!(session.stats().locks_held > 0);

        let stats = session.shutdown();
        assert_eq!(stats.locks_held, 0);
        assert!(!session.arbitration().is_enabled());
        assert!(stats.messages.get("lock").copied().unwrap_or(0) > 0);
    }
}
