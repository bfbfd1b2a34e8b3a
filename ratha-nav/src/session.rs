//! The simulation session: one struct owning every component, driven
//! by a single cooperative tick.
//!
//! Tick ordering guarantee: vehicle dynamics (motion + collision)
//! complete before the sensor recomputation, which completes before
//! any controller reads sensor values; controllers therefore always
//! act on fully-resolved state and their commands take effect on the
//! next tick. Telemetry is emitted last and its failures never stall
//! the tick.

use std::path::Path;

use ratha_sim::map::WorldMap;
use ratha_sim::planning::{find_path, GridCell, OccupancyGrid};
use ratha_sim::sensors::SensorArray;
use ratha_sim::telemetry::VehicleTelemetry;
use ratha_sim::vehicle::{DriveCommand, Vehicle};
use tracing::{error, info, warn};

use crate::config::RathaConfig;
use crate::follower::{FollowerConfig, PathFollower};
use crate::sequences::{InterpreterConfig, SequenceInterpreter, SequenceLibrary, SequenceStep};

/// Receives one telemetry snapshot per tick. Implementations talk to
/// excluded collaborators (status pages, log files); their failures
/// are logged and swallowed.
pub trait TelemetrySink {
    fn send(&mut self, telemetry: &VehicleTelemetry) -> std::io::Result<()>;
}

/// Serializes snapshots into the tracing stream.
#[derive(Debug, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn send(&mut self, telemetry: &VehicleTelemetry) -> std::io::Result<()> {
        let line = serde_json::to_string(telemetry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tracing::debug!(target: "ratha_nav::telemetry", "{}", line);
        Ok(())
    }
}

/// Discards snapshots.
#[derive(Debug, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn send(&mut self, _telemetry: &VehicleTelemetry) -> std::io::Result<()> {
        Ok(())
    }
}

/// Everything one simulated drive needs, with no process-wide state.
pub struct Session {
    map: WorldMap,
    vehicle: Vehicle,
    sensors: SensorArray,
    follower: PathFollower,
    interpreter: SequenceInterpreter,
    library: SequenceLibrary,
    sink: Box<dyn TelemetrySink>,
    cell_size: f32,
    tick: u64,
    goal_reached: bool,
}

impl Session {
    /// Build a session from configuration, with telemetry going to the
    /// log.
    pub fn from_config(config: &RathaConfig) -> Self {
        let map = config.world_map();
        let vehicle = Vehicle::new(config.vehicle_config());
        let mut sensors = config.sensor_array();
        sensors.update(&map, vehicle.position(), vehicle.heading());

        Self {
            map,
            vehicle,
            sensors,
            follower: PathFollower::new(FollowerConfig {
                heading_tolerance: config.follower.heading_tolerance,
                suspend_ticks: config.follower.suspend_ticks,
            }),
            interpreter: SequenceInterpreter::new(InterpreterConfig {
                max_while_iterations: config.interpreter.max_while_iterations,
                max_call_depth: config.interpreter.max_call_depth,
                tick_hz: config.simulation.tick_hz,
            }),
            library: SequenceLibrary::new(),
            sink: Box::new(LogSink),
            cell_size: config.map.cell_size,
            tick: 0,
            goal_reached: false,
        }
    }

    /// Replace the telemetry sink.
    pub fn set_sink(&mut self, sink: Box<dyn TelemetrySink>) {
        self.sink = sink;
    }

    /// Load sequence programs from a directory into the library.
    pub fn load_sequences(&mut self, dir: &Path) {
        if let Err(e) = self.library.load_dir(dir) {
            warn!("could not read sequence directory {:?}: {}", dir, e);
        }
    }

    /// Register a program directly.
    pub fn add_sequence(&mut self, name: impl Into<String>, steps: Vec<SequenceStep>) {
        self.library.insert(name, steps);
    }

    /// Apply an external drive command (manual control input).
    pub fn command(&mut self, cmd: DriveCommand) {
        self.vehicle.apply_command(cmd);
    }

    /// Set or clear the fixed-speed override.
    pub fn set_fixed_speed(&mut self, speed: Option<f32>) {
        self.vehicle.set_fixed_speed(speed);
    }

    /// Replace the obstacle map (external editor operation) and refresh
    /// the sensors against it.
    pub fn set_map(&mut self, map: WorldMap) {
        self.map = map;
        self.sensors
            .update(&self.map, self.vehicle.position(), self.vehicle.heading());
    }

    /// Reset the vehicle to its spawn pose.
    pub fn reset(&mut self) {
        self.vehicle.reset();
        self.follower.clear();
        self.interpreter.abort();
        self.goal_reached = false;
        self.sensors
            .update(&self.map, self.vehicle.position(), self.vehicle.heading());
    }

    /// Plan a path from the vehicle's cell to `goal` and begin
    /// following it. Returns false when no route exists; an empty path
    /// means "do nothing".
    pub fn follow_path_to(&mut self, goal: GridCell) -> bool {
        let grid = OccupancyGrid::from_map(&self.map, self.cell_size);
        let Some(start) = grid.cell_at(self.vehicle.position()) else {
            warn!("vehicle is outside the grid, cannot plan");
            return false;
        };
        let path = find_path(&grid, start, goal);
        if path.is_empty() {
            info!("no route from {:?} to {:?}", start, goal);
            return false;
        }
        self.follower.set_path(path, self.cell_size);
        self.follower.is_active()
    }

    /// Begin executing a named sequence program. A request while one
    /// is running is a no-op.
    pub fn run_sequence(&mut self, name: &str) {
        self.interpreter.start(name, &self.library);
    }

    /// Advance the simulation one tick and emit telemetry.
    pub fn tick(&mut self) -> VehicleTelemetry {
        // 1. Dynamics, using the previous tick's sensor readings for
        // the pre-emptive brake.
        let front = self.sensors.distance("front");
        let rear = self.sensors.distance("rear");
        self.vehicle.step(&self.map, front, rear);

        // 2. Sensors recompute at the resolved pose.
        self.sensors
            .update(&self.map, self.vehicle.position(), self.vehicle.heading());

        // 3. Controllers decide the next tick's commands.
        if let Some(cmd) = self
            .follower
            .tick(self.vehicle.position(), self.vehicle.heading())
        {
            self.vehicle.apply_command(cmd);
        }
        match self.interpreter.tick(&self.sensors, &self.library) {
            Ok(Some(cmd)) => self.vehicle.apply_command(cmd),
            Ok(None) => {}
            Err(e) => error!("sequence aborted: {}", e),
        }

        // 4. Goal detection.
        if !self.goal_reached {
            if let Some(target) = &self.map.target {
                if target.intersects_aabb(&self.vehicle.hitbox_aabb()) {
                    info!("target reached at tick {}", self.tick);
                    self.goal_reached = true;
                }
            }
        }

        // 5. Telemetry; failures must never stall the tick.
        let telemetry = VehicleTelemetry::capture(self.tick, &self.vehicle, &self.sensors);
        if let Err(e) = self.sink.send(&telemetry) {
            warn!("telemetry send failed: {}", e);
        }

        self.tick += 1;
        telemetry
    }

    /// Is any autonomous controller currently driving?
    pub fn autopilot_active(&self) -> bool {
        self.follower.is_active() || self.interpreter.is_running()
    }

    pub fn goal_reached(&self) -> bool {
        self.goal_reached
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn sensors(&self) -> &SensorArray {
        &self.sensors
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub fn ticks_elapsed(&self) -> u64 {
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RathaConfig;
    use ratha_sim::map::Obstacle;

    fn open_session() -> Session {
        let config: RathaConfig = toml::from_str(
            r#"
            [map]
            width = 800.0
            height = 600.0
            margin = 0.0
            [vehicle]
            start_x = 100.0
            start_y = 100.0
            "#,
        )
        .unwrap();
        let mut session = Session::from_config(&config);
        session.set_sink(Box::new(NullSink));
        session
    }

    #[test]
    fn test_manual_command_moves_vehicle() {
        let mut session = open_session();
        session.command(DriveCommand::Forward);
        for _ in 0..30 {
            session.tick();
        }
        assert!(session.vehicle().position().x > 100.0);
    }

    #[test]
    fn test_tick_emits_telemetry() {
        let mut session = open_session();
        let telemetry = session.tick();
        assert_eq!(telemetry.tick, 0);
        assert_eq!(telemetry.distances.len(), 4);
        assert_eq!(session.ticks_elapsed(), 1);
    }

    #[test]
    fn test_follow_path_rejects_unreachable_goal() {
        let config: RathaConfig = toml::from_str(
            r#"
            [map]
            margin = 0.0
            [[map.obstacles]]
            kind = "rect"
            x = 400.0
            y = 200.0
            size = 40.0
            "#,
        )
        .unwrap();
        let mut session = Session::from_config(&config);
        session.set_sink(Box::new(NullSink));
        // The goal cell itself is blocked by the obstacle.
        assert!(!session.follow_path_to((10, 5)));
        assert!(!session.autopilot_active());
    }

    #[test]
    fn test_reset_clears_controllers() {
        let mut session = open_session();
        assert!(session.follow_path_to((8, 2)));
        assert!(session.autopilot_active());
        session.reset();
        assert!(!session.autopilot_active());
        assert_eq!(session.vehicle().position().x, 100.0);
    }

    #[test]
    fn test_unknown_sequence_is_noop() {
        let mut session = open_session();
        session.run_sequence("missing");
        assert!(!session.autopilot_active());
    }

    #[test]
    fn test_map_swap_refreshes_sensors() {
        let mut session = open_session();
        let far = session.sensors().distance("front");
        let mut map = session.map().clone();
        map.obstacles.push(Obstacle::Rect {
            x: 170.0,
            y: 80.0,
            size: 40.0,
        });
        session.set_map(map);
        assert!(session.sensors().distance("front") < far);
    }
}
