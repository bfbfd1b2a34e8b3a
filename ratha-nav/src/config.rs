//! Configuration loading for RathaNav

use crate::error::Result;
use ratha_sim::map::{Arena, Obstacle, Target, WorldMap};
use ratha_sim::sensors::{SensorArray, SensorMount};
use ratha_sim::vehicle::VehicleConfig;
use ratha_sim::Vec2;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize, Default)]
pub struct RathaConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub vehicle: VehicleParams,
    #[serde(default)]
    pub sensors: SensorParams,
    #[serde(default)]
    pub map: MapParams,
    #[serde(default)]
    pub follower: FollowerParams,
    #[serde(default)]
    pub interpreter: InterpreterParams,
}

/// Tick scheduling settings
#[derive(Clone, Debug, Deserialize)]
pub struct SimulationConfig {
    /// Simulation ticks per second of scaled time (default: 60)
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,

    /// Safety limit on the run length in ticks (default: 36000)
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

/// Vehicle physical parameters
#[derive(Clone, Debug, Deserialize)]
pub struct VehicleParams {
    /// Distance between axles (default: 50.0)
    #[serde(default = "default_wheel_base")]
    pub wheel_base: f32,

    /// Velocity clamp in units per tick (default: 5.0)
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,

    /// Acceleration per tick while driving (default: 0.2)
    #[serde(default = "default_accel_rate")]
    pub accel_rate: f32,

    /// Friction decay per idle tick (default: 0.05)
    #[serde(default = "default_decel_rate")]
    pub decel_rate: f32,

    /// Steering bound in degrees (default: 60.0)
    #[serde(default = "default_max_steering_deg")]
    pub max_steering_deg: f32,

    /// Steering ramp rate in radians per tick (default: 0.015)
    #[serde(default = "default_steer_rate")]
    pub steer_rate: f32,

    /// Collision hitbox width (default: 40.0)
    #[serde(default = "default_hitbox_width")]
    pub hitbox_width: f32,

    /// Collision hitbox height (default: 20.0)
    #[serde(default = "default_hitbox_height")]
    pub hitbox_height: f32,

    /// Clearance preserved by the pre-emptive brake (default: 20.0)
    #[serde(default = "default_safety_gap")]
    pub safety_gap: f32,

    /// Spawn X position (default: 100.0)
    #[serde(default = "default_start_x")]
    pub start_x: f32,

    /// Spawn Y position (default: 100.0)
    #[serde(default = "default_start_y")]
    pub start_y: f32,

    /// Spawn heading in degrees (default: 0.0)
    #[serde(default)]
    pub start_heading_deg: f32,
}

/// Sensor fit parameters
#[derive(Clone, Debug, Deserialize)]
pub struct SensorParams {
    /// Reflection depth limit per cast (default: 3)
    #[serde(default = "default_max_bounces")]
    pub max_bounces: usize,

    /// Explicit mounts; empty uses the stock front/left/right/rear fit
    #[serde(default)]
    pub mounts: Vec<MountParams>,
}

/// One sensor mount in the vehicle-local frame
#[derive(Clone, Debug, Deserialize)]
pub struct MountParams {
    pub name: String,
    pub x: f32,
    pub y: f32,
    /// Cast angle relative to the heading, in degrees
    pub angle_deg: f32,
    pub range: f32,
}

/// Arena and obstacle layout
#[derive(Clone, Debug, Deserialize)]
pub struct MapParams {
    /// Arena width (default: 800.0)
    #[serde(default = "default_arena_width")]
    pub width: f32,

    /// Arena height (default: 600.0)
    #[serde(default = "default_arena_height")]
    pub height: f32,

    /// Border margin the vehicle may not cross (default: 10.0)
    #[serde(default = "default_arena_margin")]
    pub margin: f32,

    /// Pathfinding cell size, the obstacle placement granularity
    /// (default: 40.0)
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,

    /// Placed obstacles
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,

    /// Optional goal marker
    #[serde(default)]
    pub target: Option<Target>,
}

/// Path follower tuning
#[derive(Clone, Debug, Deserialize)]
pub struct FollowerParams {
    /// Heading error tolerance in radians (default: 0.1)
    #[serde(default = "default_heading_tolerance")]
    pub heading_tolerance: f32,

    /// Ticks suspended between discrete commands (default: 3)
    #[serde(default = "default_suspend_ticks")]
    pub suspend_ticks: u32,
}

/// Sequence interpreter tuning
#[derive(Clone, Debug, Deserialize)]
pub struct InterpreterParams {
    /// Iteration bound for `while` steps (default: 10000)
    #[serde(default = "default_max_while_iterations")]
    pub max_while_iterations: u32,

    /// Nesting bound for `call` steps (default: 8)
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: u32,

    /// Directory of sequence program files (default: "sequences")
    #[serde(default = "default_sequence_dir")]
    pub sequence_dir: String,
}

// Default value functions
fn default_tick_hz() -> u32 {
    60
}
fn default_max_ticks() -> u64 {
    36_000
}
fn default_wheel_base() -> f32 {
    50.0
}
fn default_max_speed() -> f32 {
    5.0
}
fn default_accel_rate() -> f32 {
    0.2
}
fn default_decel_rate() -> f32 {
    0.05
}
fn default_max_steering_deg() -> f32 {
    60.0
}
fn default_steer_rate() -> f32 {
    0.015
}
fn default_hitbox_width() -> f32 {
    40.0
}
fn default_hitbox_height() -> f32 {
    20.0
}
fn default_safety_gap() -> f32 {
    20.0
}
fn default_start_x() -> f32 {
    100.0
}
fn default_start_y() -> f32 {
    100.0
}
fn default_max_bounces() -> usize {
    3
}
fn default_arena_width() -> f32 {
    800.0
}
fn default_arena_height() -> f32 {
    600.0
}
fn default_arena_margin() -> f32 {
    10.0
}
fn default_cell_size() -> f32 {
    40.0
}
fn default_heading_tolerance() -> f32 {
    0.1
}
fn default_suspend_ticks() -> u32 {
    3
}
fn default_max_while_iterations() -> u32 {
    10_000
}
fn default_max_call_depth() -> u32 {
    8
}
fn default_sequence_dir() -> String {
    "sequences".to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            max_ticks: default_max_ticks(),
        }
    }
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            wheel_base: default_wheel_base(),
            max_speed: default_max_speed(),
            accel_rate: default_accel_rate(),
            decel_rate: default_decel_rate(),
            max_steering_deg: default_max_steering_deg(),
            steer_rate: default_steer_rate(),
            hitbox_width: default_hitbox_width(),
            hitbox_height: default_hitbox_height(),
            safety_gap: default_safety_gap(),
            start_x: default_start_x(),
            start_y: default_start_y(),
            start_heading_deg: 0.0,
        }
    }
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            max_bounces: default_max_bounces(),
            mounts: Vec::new(),
        }
    }
}

impl Default for MapParams {
    fn default() -> Self {
        Self {
            width: default_arena_width(),
            height: default_arena_height(),
            margin: default_arena_margin(),
            cell_size: default_cell_size(),
            obstacles: Vec::new(),
            target: None,
        }
    }
}

impl Default for FollowerParams {
    fn default() -> Self {
        Self {
            heading_tolerance: default_heading_tolerance(),
            suspend_ticks: default_suspend_ticks(),
        }
    }
}

impl Default for InterpreterParams {
    fn default() -> Self {
        Self {
            max_while_iterations: default_max_while_iterations(),
            max_call_depth: default_max_call_depth(),
            sequence_dir: default_sequence_dir(),
        }
    }
}

impl RathaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RathaConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Build the core vehicle configuration
    pub fn vehicle_config(&self) -> VehicleConfig {
        let v = &self.vehicle;
        VehicleConfig {
            wheel_base: v.wheel_base,
            max_speed: v.max_speed,
            accel_rate: v.accel_rate,
            decel_rate: v.decel_rate,
            max_steering: v.max_steering_deg.to_radians(),
            steer_rate: v.steer_rate,
            hitbox_width: v.hitbox_width,
            hitbox_height: v.hitbox_height,
            safety_gap: v.safety_gap,
            start: Vec2::new(v.start_x, v.start_y),
            start_heading: v.start_heading_deg.to_radians(),
            ..VehicleConfig::default()
        }
    }

    /// Build the sensor array; an empty mount list selects the stock fit
    pub fn sensor_array(&self) -> SensorArray {
        if self.sensors.mounts.is_empty() {
            return SensorArray::with_default_mounts(&self.vehicle_config());
        }
        let mounts = self
            .sensors
            .mounts
            .iter()
            .map(|m| SensorMount {
                name: m.name.clone(),
                offset: Vec2::new(m.x, m.y),
                angle: m.angle_deg.to_radians(),
                range: m.range,
            })
            .collect();
        SensorArray::new(mounts, self.sensors.max_bounces)
    }

    /// Build the world map
    pub fn world_map(&self) -> WorldMap {
        let mut map = WorldMap::new(
            Arena::new(self.map.width, self.map.height, self.map.margin),
            self.map.obstacles.clone(),
        );
        map.target = self.map.target;
        map
    }
}
