//! # Ratha-Sim: 2D Ground Vehicle Simulation Core
//!
//! Simulates a car-like vehicle inside a bounded arena populated with
//! rectangular and circular obstacles. The crate provides the full
//! simulation core; rendering, map editing and network transport are
//! left to the embedding application.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ratha_sim::map::{Arena, Obstacle, WorldMap};
//! use ratha_sim::sensors::SensorArray;
//! use ratha_sim::vehicle::{DriveCommand, Vehicle, VehicleConfig};
//!
//! let map = WorldMap::new(
//!     Arena::new(800.0, 600.0, 10.0),
//!     vec![Obstacle::Rect { x: 400.0, y: 100.0, size: 40.0 }],
//! );
//! let mut vehicle = Vehicle::new(VehicleConfig::default());
//! let mut sensors = SensorArray::with_default_mounts(&vehicle.config());
//!
//! vehicle.apply_command(DriveCommand::Forward);
//! for _ in 0..60 {
//!     let (front, rear) = (sensors.distance("front"), sensors.distance("rear"));
//!     vehicle.step(&map, front, rear);
//!     sensors.update(&map, vehicle.position(), vehicle.heading());
//! }
//! ```
//!
//! ## Coordinate Frame
//!
//! Screen convention: X-right, Y-down, heading in radians with 0 pointing
//! along +X and positive rotation clockwise. Distances are in arena units
//! (pixels), velocities in units per tick.
//!
//! ## Architecture
//!
//! - [`core`]: math helpers and the `Vec2` primitive
//! - [`geometry`]: ray-shape intersection and oriented-box support
//! - [`map`]: obstacle set, arena bounds and target marker
//! - [`vehicle`]: bicycle-model dynamics with collision resolution
//! - [`sensors`]: reflective ray-casting range sensors
//! - [`planning`]: occupancy grid derivation and A* search
//! - [`telemetry`]: per-tick state snapshots

pub mod core;
pub mod geometry;
pub mod map;
pub mod planning;
pub mod sensors;
pub mod telemetry;
pub mod vehicle;

pub use crate::core::{normalize_angle, Vec2};
pub use map::{Arena, Obstacle, Target, WorldMap};
pub use planning::{find_path, GridCell, OccupancyGrid};
pub use sensors::{RaySegment, SensorArray, SensorMount, SensorReading};
pub use telemetry::VehicleTelemetry;
pub use vehicle::{DriveCommand, Vehicle, VehicleConfig};
