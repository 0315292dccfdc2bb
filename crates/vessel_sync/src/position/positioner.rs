//! # Position Interpolation Engine
//!
//! Pure blending of two snapshots of the same vessel into the state to
//! display at a fraction `percentage` of the interval between them.
//!
//! ## Rules
//!
//! - The reference body switches discretely at the midpoint; blending two
//!   frames is meaningless.
//! - Orbits are blended in Cartesian state-vector space, each snapshot taken
//!   at its own epoch, and rebuilt from the blended position, velocity and
//!   epoch. Averaging classical elements is unstable near zero eccentricity
//!   or inclination.
//! - Loaded EVA kerbals blend latitude, longitude and altitude directly.
//! - Unloaded vessels take the target's raw geodetic coordinates.
//! - Loaded vessels at or below flying blend between the two surface positions;
//!   higher ones follow the rebuilt orbit at the current universal time so they
//!   do not drift once time runs past the snapshot window.
//! - Static pressure and terrain height come from the target snapshot.

use super::snapshot::VesselPositionUpdate;
use crate::math::{lerp, CelestialBody, Orbit, QuaternionD, Vector3d};
use crate::vessel::Vessel;
use std::sync::Arc;
use tracing::debug;

/// Fields to write back to a vessel. `None` leaves the vessel's value alone.
#[derive(Debug, Clone)]
pub struct VesselDisplayState {
    pub reference_body: Arc<CelestialBody>,
    pub orbit: Orbit,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub landed: Option<bool>,
    pub splashed: Option<bool>,
    pub srf_rel_rotation: Option<QuaternionD>,
    pub rotation: Option<QuaternionD>,
    pub position: Option<Vector3d>,
    pub static_pressure_kpa: Option<f64>,
    pub height_from_terrain: Option<f64>,
}

impl VesselDisplayState {
    fn new(reference_body: Arc<CelestialBody>, orbit: Orbit) -> Self {
        Self {
            reference_body,
            orbit,
            latitude: None,
            longitude: None,
            altitude: None,
            landed: None,
            splashed: None,
            srf_rel_rotation: None,
            rotation: None,
            position: None,
            static_pressure_kpa: None,
            height_from_terrain: None,
        }
    }

    pub fn apply_to(self, vessel: &mut Vessel) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        vessel.orbit = self.orbit;
        set(&mut vessel.latitude, self.latitude);
        set(&mut vessel.longitude, self.longitude);
        set(&mut vessel.altitude, self.altitude);
        set(&mut vessel.landed, self.landed);
        set(&mut vessel.splashed, self.splashed);
        set(&mut vessel.srf_rel_rotation, self.srf_rel_rotation);
        set(&mut vessel.rotation, self.rotation);
        set(&mut vessel.position, self.position);
        set(&mut vessel.static_pressure_kpa, self.static_pressure_kpa);
        set(&mut vessel.height_from_terrain, self.height_from_terrain);
    }
}

/// Clamps `percentage` to [0, 1] (NaN counts as 0). When both snapshots share
/// an epoch the interval is degenerate and the result snaps to the nearer end.
pub fn effective_percentage(update: &VesselPositionUpdate, target: &VesselPositionUpdate, percentage: f64) -> f64 {
    let t = if percentage.is_nan() { 0.0 } else { percentage.clamp(0.0, 1.0) };
    if update.orbit.epoch() == target.orbit.epoch() {
        if t < 0.5 {
            0.0
        } else {
            1.0
        }
    } else {
        t
    }
}

/// Computes what `vessel` should display between `update` and `target`.
///
/// Returns `None` when there is no vessel. Neither snapshot is modified.
pub fn interpolate(
    vessel: Option<&Vessel>,
    update: &VesselPositionUpdate,
    target: &VesselPositionUpdate,
    percentage: f64,
    universal_time: f64,
) -> Option<VesselDisplayState> {
    let vessel = vessel?;
    let t = effective_percentage(update, target, percentage);
    let early = t < 0.5;
    let body = if early { &update.body } else { &target.body };
    let orbit = interpolate_orbit(update, target, body, t);
    let mut state = VesselDisplayState::new(body.clone(), orbit);

    if vessel.is_eva() && vessel.loaded {
        let latitude = lerp(update.lat_lon_alt[0], target.lat_lon_alt[0], t);
        let longitude = lerp(update.lat_lon_alt[1], target.lat_lon_alt[1], t);
        let altitude = lerp(update.lat_lon_alt[2], target.lat_lon_alt[2], t);
        let landed = if early { update.landed } else { target.landed };
        let splashed = if early { update.splashed } else { target.splashed };
        let srf_rel_rotation = QuaternionD::slerp(update.surface_rel_rotation, target.surface_rel_rotation, t);

        state.latitude = Some(latitude);
        state.longitude = Some(longitude);
        state.altitude = Some(altitude);
        state.landed = Some(landed);
        state.splashed = Some(splashed);
        state.srf_rel_rotation = Some(srf_rel_rotation);
        state.rotation = Some(body.rotation_at_ut(universal_time) * srf_rel_rotation);

        // Kerbals walk slowly enough that the surface point is good enough
        if landed || splashed || vessel.situation.is_below_flight_threshold() {
            state.position = Some(body.world_surface_position(latitude, longitude, altitude, universal_time));
        }
        return Some(state);
    }

    state.static_pressure_kpa = Some(body.static_pressure_kpa(target.lat_lon_alt[2]));
    state.height_from_terrain = Some(target.height_from_terrain);

    if !vessel.loaded {
        let [latitude, longitude, altitude] = target.lat_lon_alt;
        state.latitude = Some(latitude);
        state.longitude = Some(longitude);
        state.altitude = Some(altitude);
        if vessel.landed_or_splashed() {
            state.position = Some(body.world_surface_position(latitude, longitude, altitude, universal_time));
        }
        return Some(state);
    }

    let srf_rel_rotation = QuaternionD::slerp(update.surface_rel_rotation, target.surface_rel_rotation, t);
    state.srf_rel_rotation = Some(srf_rel_rotation);
    state.rotation = Some(body.rotation_at_ut(universal_time) * srf_rel_rotation);

    if vessel.situation.is_below_flight_threshold() {
        state.landed = Some(if early { update.landed } else { target.landed });
        state.splashed = Some(if early { update.splashed } else { target.splashed });
        state.position = Some(Vector3d::lerp(update.lat_lon_alt_pos, target.lat_lon_alt_pos, t));
    } else {
        // Evaluated at the current time, not the blended epoch
        state.position = Some(state.orbit.position_at_ut(universal_time));
    }
    Some(state)
}

/// Interpolates and writes the result into `vessel`. An absent vessel is a
/// no-op.
pub fn set_vessel_position(
    vessel: Option<&mut Vessel>,
    update: &VesselPositionUpdate,
    target: &VesselPositionUpdate,
    percentage: f64,
    universal_time: f64,
) {
    let Some(vessel) = vessel else {
        return;
    };
    if let Some(state) = interpolate(Some(&*vessel), update, target, percentage, universal_time) {
        state.apply_to(vessel);
    }
}

/// Blends the two orbits in state-vector space. Velocities are moved from
/// each orbit's own reference body into the snapshot's frame.
fn interpolate_orbit(
    update: &VesselPositionUpdate,
    target: &VesselPositionUpdate,
    body: &Arc<CelestialBody>,
    t: f64,
) -> Orbit {
    let start_time = update.orbit.epoch();
    let target_time = target.orbit.epoch();

    let (current_pos, current_orbital_vel) = update.orbit.state_at_epoch();
    let (target_pos, target_orbital_vel) = target.orbit.state_at_epoch();

    let current_vel = current_orbital_vel + update.orbit.reference_body().frame_vel_at_ut(start_time)
        - update.body.frame_vel_at_ut(start_time);
    let target_vel = target_orbital_vel + target.orbit.reference_body().frame_vel_at_ut(target_time)
        - target.body.frame_vel_at_ut(target_time);

    let lerped_pos = Vector3d::lerp(current_pos, target_pos, t);
    let lerped_vel = Vector3d::lerp(current_vel, target_vel, t);
    let lerp_time = lerp(start_time, target_time, t);

    match Orbit::from_state_vectors(lerped_pos, lerped_vel, body.clone(), lerp_time) {
        Ok(orbit) => orbit,
        Err(e) => {
            debug!(vessel_id = %target.vessel_id, "Orbit interpolation failed ({}), using nearest snapshot", e);
            if t < 0.5 {
                update.orbit.clone()
            } else {
                target.orbit.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{circular_orbit, home_body, sample_vessel};
    use crate::types::{Situation, VesselId, VesselType};

    const EPS: f64 = 1e-6;

    fn snapshot(id: VesselId, radius: f64, epoch: f64) -> VesselPositionUpdate {
        VesselPositionUpdate::new(id, circular_orbit(&home_body(), radius, epoch), QuaternionD::identity())
    }

    #[test]
    fn test_interpolating_snapshot_with_itself_is_identity() {
        let mut vessel = sample_vessel("Probe");
        vessel.situation = Situation::Flying;
        let snap = snapshot(vessel.id, 700_000.0, 10.0).with_surface_flags(true, false);

        for t in [0.0, 0.3, 0.5, 1.0] {
            let state = interpolate(Some(&vessel), &snap, &snap, t, 10.0).unwrap();
            let (pos, vel) = state.orbit.state_at_epoch();
            let (expected_pos, expected_vel) = snap.orbit.state_at_epoch();
            assert!(pos.distance(expected_pos) < EPS);
            assert!(vel.distance(expected_vel) < EPS);
            assert_eq!(state.orbit.epoch(), snap.orbit.epoch());
            assert!(state.position.unwrap().distance(snap.lat_lon_alt_pos) < EPS);
            assert_eq!(state.landed, Some(true));
            assert!(state.srf_rel_rotation.unwrap().angle_to(snap.surface_rel_rotation) < EPS);
        }
    }

    #[test]
    fn test_unloaded_vessel_with_itself_is_identity() {
        let mut vessel = sample_vessel("Far away");
        vessel.loaded = false;
        let mut snap = snapshot(vessel.id, 720_000.0, 10.0).with_height_from_terrain(50.0);
        snap.lat_lon_alt = [-3.5, 120.0, 20_000.0];

        for t in [0.0, 0.3, 0.5, 1.0] {
            let state = interpolate(Some(&vessel), &snap, &snap, t, 10.0).unwrap();
            let (pos, vel) = state.orbit.state_at_epoch();
            let (expected_pos, expected_vel) = snap.orbit.state_at_epoch();
            assert!(pos.distance(expected_pos) < EPS);
            assert!(vel.distance(expected_vel) < EPS);
            assert_eq!(state.latitude, Some(-3.5));
            assert_eq!(state.longitude, Some(120.0));
            assert_eq!(state.altitude, Some(20_000.0));
            assert_eq!(state.height_from_terrain, Some(50.0));
            assert!(state.position.is_none());
        }
    }

    #[test]
    fn test_orbiting_vessel_with_itself_is_identity() {
        let vessel = sample_vessel("Station");
        let rotation = QuaternionD::from_axis_angle(Vector3d::new(0.0, 0.0, 1.0), 0.4);
        let snap = VesselPositionUpdate::new(vessel.id, circular_orbit(&home_body(), 750_000.0, 10.0), rotation);

        for (t, ut) in [(0.0, 10.0), (0.5, 25.0), (1.0, 90.0)] {
            let state = interpolate(Some(&vessel), &snap, &snap, t, ut).unwrap();
            assert_eq!(state.orbit.epoch(), snap.orbit.epoch());
            let expected = snap.orbit.position_at_ut(ut);
            assert!(state.position.unwrap().distance(expected) < 1e-3, "t = {t}");
            assert!(state.srf_rel_rotation.unwrap().angle_to(snap.surface_rel_rotation) < EPS);
            assert!(state.landed.is_none());
        }
    }

    #[test]
    fn test_eva_with_itself_is_identity() {
        let mut vessel = sample_vessel("Jeb");
        vessel.vessel_type = VesselType::Eva;
        vessel.situation = Situation::Landed;
        let rotation = QuaternionD::from_axis_angle(Vector3d::new(1.0, 0.0, 0.0), 1.1);
        let mut snap = VesselPositionUpdate::new(vessel.id, circular_orbit(&home_body(), 700_000.0, 10.0), rotation)
            .with_surface_flags(true, false);
        snap.lat_lon_alt = [0.1, -74.5, 70.0];

        for t in [0.0, 0.3, 0.5, 1.0] {
            let state = interpolate(Some(&vessel), &snap, &snap, t, 10.0).unwrap();
            assert!((state.latitude.unwrap() - 0.1).abs() < EPS);
            assert!((state.longitude.unwrap() + 74.5).abs() < EPS);
            assert!((state.altitude.unwrap() - 70.0).abs() < EPS);
            assert_eq!((state.landed, state.splashed), (Some(true), Some(false)));
            assert!(state.srf_rel_rotation.unwrap().angle_to(snap.surface_rel_rotation) < EPS);
            let body = home_body();
            let expected = body.world_surface_position(0.1, -74.5, 70.0, 10.0);
            assert!(state.position.unwrap().distance(expected) < 1e-3);
        }
    }

    #[test]
    fn test_discrete_fields_follow_endpoints() {
        let mut vessel = sample_vessel("Rover");
        vessel.situation = Situation::Landed;
        let other_body = Arc::new(CelestialBody::new("Mun", 6.5138398e10, 200_000.0));
        let a = snapshot(vessel.id, 700_000.0, 0.0).with_surface_flags(true, false);
        let b = VesselPositionUpdate::new(
            vessel.id,
            circular_orbit(&other_body, 250_000.0, 10.0),
            QuaternionD::identity(),
        )
        .with_surface_flags(false, true);

        let start = interpolate(Some(&vessel), &a, &b, 0.0, 0.0).unwrap();
        assert_eq!(start.reference_body.name, "Kerbin");
        assert_eq!((start.landed, start.splashed), (Some(true), Some(false)));

        let end = interpolate(Some(&vessel), &a, &b, 1.0, 10.0).unwrap();
        assert_eq!(end.reference_body.name, "Mun");
        assert_eq!((end.landed, end.splashed), (Some(false), Some(true)));
    }

    #[test]
    fn test_unloaded_vessel_takes_target_coordinates() {
        let mut vessel = sample_vessel("Far away");
        vessel.loaded = false;
        let a = snapshot(vessel.id, 700_000.0, 0.0);
        let b = snapshot(vessel.id, 710_000.0, 10.0).with_height_from_terrain(1234.0);

        let state = interpolate(Some(&vessel), &a, &b, 0.25, 5.0).unwrap();
        assert_eq!(state.latitude, Some(b.lat_lon_alt[0]));
        assert_eq!(state.altitude, Some(b.lat_lon_alt[2]));
        assert_eq!(state.height_from_terrain, Some(1234.0));
        assert!(state.position.is_none());
        assert!(state.rotation.is_none());
    }

    #[test]
    fn test_orbital_vessel_follows_orbit_at_current_time() {
        let vessel = sample_vessel("Station");
        let a = snapshot(vessel.id, 700_000.0, 0.0);
        let b = snapshot(vessel.id, 700_000.0, 10.0);

        let state = interpolate(Some(&vessel), &a, &b, 0.5, 60.0).unwrap();
        assert_eq!(state.orbit.epoch(), 5.0);
        let expected = state.orbit.position_at_ut(60.0);
        assert!(state.position.unwrap().distance(expected) < EPS);
    }

    #[test]
    fn test_eva_lerps_coordinates_without_environment() {
        let mut vessel = sample_vessel("Jeb");
        vessel.vessel_type = VesselType::Eva;
        vessel.situation = Situation::Landed;
        let mut a = snapshot(vessel.id, 700_000.0, 0.0);
        let mut b = snapshot(vessel.id, 700_000.0, 10.0);
        a.lat_lon_alt = [0.0, 10.0, 100.0];
        b.lat_lon_alt = [2.0, 20.0, 200.0];

        let state = interpolate(Some(&vessel), &a, &b, 0.5, 5.0).unwrap();
        assert!((state.latitude.unwrap() - 1.0).abs() < EPS);
        assert!((state.longitude.unwrap() - 15.0).abs() < EPS);
        assert!((state.altitude.unwrap() - 150.0).abs() < EPS);
        assert!(state.position.is_some());
        assert!(state.static_pressure_kpa.is_none());
        assert!(state.height_from_terrain.is_none());
    }

    #[test]
    fn test_identical_epochs_snap_to_nearest_end() {
        let vessel = sample_vessel("Probe");
        let a = snapshot(vessel.id, 700_000.0, 5.0);
        let b = snapshot(vessel.id, 800_000.0, 5.0);

        assert_eq!(effective_percentage(&a, &b, 0.2), 0.0);
        assert_eq!(effective_percentage(&a, &b, 0.7), 1.0);
        assert_eq!(effective_percentage(&a, &b, f64::NAN), 0.0);

        let state = interpolate(Some(&vessel), &a, &b, 0.7, 5.0).unwrap();
        let (pos, _) = state.orbit.state_at_epoch();
        assert!((pos.magnitude() - 800_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_absent_vessel_is_noop() {
        let a = snapshot(VesselId::new(), 700_000.0, 0.0);
        assert!(interpolate(None, &a, &a, 0.5, 0.0).is_none());
        set_vessel_position(None, &a, &a, 0.5, 0.0);
    }

    #[test]
    fn test_set_vessel_position_writes_back() {
        let mut vessel = sample_vessel("Probe");
        let a = snapshot(vessel.id, 700_000.0, 0.0);
        let b = snapshot(vessel.id, 720_000.0, 10.0);

        set_vessel_position(Some(&mut vessel), &a, &b, 1.0, 10.0);
        assert_eq!(vessel.orbit.epoch(), 10.0);
        assert!(vessel.position.distance(b.orbit.position_at_ut(10.0)) < 1e-3);
    }
}
