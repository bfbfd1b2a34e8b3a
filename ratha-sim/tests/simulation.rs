//! Cross-module scenarios: dynamics, sensors and planning together.

use ratha_sim::map::{Arena, Obstacle, WorldMap};
use ratha_sim::planning::{find_path, OccupancyGrid};
use ratha_sim::sensors::SensorArray;
use ratha_sim::vehicle::{DriveCommand, Vehicle, VehicleConfig};
use ratha_sim::Vec2;

/// Run one simulation tick in the canonical order: dynamics first,
/// then sensor recomputation at the new pose.
fn tick(vehicle: &mut Vehicle, sensors: &mut SensorArray, map: &WorldMap) {
    let front = sensors.distance("front");
    let rear = sensors.distance("rear");
    vehicle.step(map, front, rear);
    sensors.update(map, vehicle.position(), vehicle.heading());
}

#[test]
fn soft_brake_fires_before_hard_collision() {
    // One square obstacle 100 units ahead of the front sensor.
    let config = VehicleConfig {
        start: Vec2::new(500.0, 500.0),
        ..Default::default()
    };
    let sensor_x = 500.0 + config.hitbox_width / 2.0;
    let map = WorldMap::new(
        Arena::new(2000.0, 2000.0, 0.0),
        vec![Obstacle::Rect {
            x: sensor_x + 100.0,
            y: 480.0,
            size: 40.0,
        }],
    );

    let mut vehicle = Vehicle::new(config);
    let mut sensors = SensorArray::with_default_mounts(vehicle.config());
    sensors.update(&map, vehicle.position(), vehicle.heading());
    assert!((sensors.distance("front") - 100.0).abs() < 1e-2);

    vehicle.apply_command(DriveCommand::Forward);

    let mut braked = false;
    for _ in 0..300 {
        tick(&mut vehicle, &mut sensors, &map);
        assert!(!vehicle.crashed(), "soft brake must prevent the crash");
        if sensors.distance("front") < 25.0 && vehicle.velocity() < vehicle.config().max_speed {
            braked = true;
        }
    }
    assert!(braked, "velocity should be capped inside the brake window");

    // The preserved clearance settles at the configured safety gap.
    assert!(sensors.distance("front") >= vehicle.config().safety_gap - 1e-2);
}

#[test]
fn sensor_tracks_obstacle_while_turning() {
    let map = WorldMap::new(
        Arena::new(2000.0, 2000.0, 0.0),
        vec![Obstacle::Circle {
            x: 1000.0,
            y: 500.0,
            radius: 30.0,
        }],
    );
    let mut vehicle = Vehicle::new(VehicleConfig {
        start: Vec2::new(500.0, 500.0),
        ..Default::default()
    });
    let mut sensors = SensorArray::with_default_mounts(vehicle.config());
    sensors.update(&map, vehicle.position(), vehicle.heading());

    // Facing the circle head-on: 500 - 20 (mount) - 30 (radius) = 450,
    // beyond the front range, so the sensor reads max range.
    assert!((sensors.distance("front") - 350.0).abs() < 1e-2);

    // Drive closer, then the reading shrinks below max range.
    vehicle.apply_command(DriveCommand::Forward);
    for _ in 0..60 {
        tick(&mut vehicle, &mut sensors, &map);
    }
    assert!(sensors.distance("front") < 350.0);
}

#[test]
fn planned_path_avoids_rasterized_obstacles() {
    let map = WorldMap::new(
        Arena::new(800.0, 600.0, 0.0),
        vec![
            Obstacle::Rect {
                x: 320.0,
                y: 0.0,
                size: 40.0,
            },
            Obstacle::Rect {
                x: 320.0,
                y: 40.0,
                size: 40.0,
            },
            Obstacle::Rect {
                x: 320.0,
                y: 80.0,
                size: 40.0,
            },
        ],
    );
    let grid = OccupancyGrid::from_map(&map, 40.0);
    let path = find_path(&grid, (2, 1), (15, 1));
    assert!(!path.is_empty());

    // No waypoint's 2x2 block touches the wall cells.
    for cell in &path {
        assert!(grid.is_traversable(*cell));
    }
    // The detour is longer than the straight Manhattan run.
    assert!(path.len() > 14);
}
