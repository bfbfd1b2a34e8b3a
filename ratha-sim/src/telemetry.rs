//! Per-tick telemetry snapshots for rendering and remote status.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sensors::SensorArray;
use crate::vehicle::Vehicle;

/// Everything external collaborators need to render or monitor one
/// tick of the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleTelemetry {
    pub tick: u64,
    pub pos_x: f32,
    pub pos_y: f32,
    pub heading: f32,
    /// Heading as a 0-360 degree compass value.
    pub gyro: f32,
    pub speed: f32,
    pub rpm: f32,
    pub velocity: f32,
    pub battery: f32,
    pub crashed: bool,
    /// Per-sensor distances keyed by sensor name.
    pub distances: BTreeMap<String, f32>,
}

impl VehicleTelemetry {
    /// Snapshot the vehicle and sensor state for one tick.
    pub fn capture(tick: u64, vehicle: &Vehicle, sensors: &SensorArray) -> Self {
        let distances = sensors
            .distances()
            .map(|(name, d)| (name.to_string(), d))
            .collect();
        Self {
            tick,
            pos_x: vehicle.position().x,
            pos_y: vehicle.position().y,
            heading: vehicle.heading(),
            gyro: vehicle.gyro(),
            speed: vehicle.speed(),
            rpm: vehicle.rpm(),
            velocity: vehicle.velocity(),
            battery: vehicle.battery(),
            crashed: vehicle.crashed(),
            distances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Arena, WorldMap};
    use crate::vehicle::VehicleConfig;

    #[test]
    fn test_capture_includes_all_sensors() {
        let map = WorldMap::new(Arena::new(2000.0, 2000.0, 0.0), Vec::new());
        let vehicle = Vehicle::new(VehicleConfig {
            start: crate::core::Vec2::new(1000.0, 1000.0),
            ..Default::default()
        });
        let mut sensors = SensorArray::with_default_mounts(vehicle.config());
        sensors.update(&map, vehicle.position(), vehicle.heading());

        let snapshot = VehicleTelemetry::capture(7, &vehicle, &sensors);
        assert_eq!(snapshot.tick, 7);
        assert_eq!(snapshot.distances.len(), 4);
        assert!(snapshot.distances.contains_key("front"));
        assert!(!snapshot.crashed);
    }

    #[test]
    fn test_serializes_to_json() {
        let map = WorldMap::new(Arena::new(2000.0, 2000.0, 0.0), Vec::new());
        let vehicle = Vehicle::new(VehicleConfig::default());
        let mut sensors = SensorArray::with_default_mounts(vehicle.config());
        sensors.update(&map, vehicle.position(), vehicle.heading());

        let snapshot = VehicleTelemetry::capture(0, &vehicle, &sensors);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"gyro\""));
        assert!(json.contains("\"front\""));
    }
}
