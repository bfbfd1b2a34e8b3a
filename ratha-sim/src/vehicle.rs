//! Bicycle-model vehicle dynamics with collision resolution.
//!
//! The vehicle integrates one tick at a time: linear acceleration from
//! the active drive input, steering ramp or latched override, angular
//! rate from the bicycle relation, then a predicted pose that is only
//! committed when its oriented hitbox stays inside the arena and clear
//! of every obstacle. A rejected move zeroes the motion state and sets
//! the `crashed` flag until a move succeeds again.

use log::debug;

use crate::core::{normalize_angle, Vec2};
use crate::geometry::{rotated_corners, Aabb};
use crate::map::WorldMap;

/// Velocities below this snap to zero when no input is active.
const VELOCITY_SNAP: f32 = 0.01;

/// Discrete drive command, optionally carrying a steering angle in
/// degrees for `Left`/`Right`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveCommand {
    Forward,
    Backward,
    Left(Option<f32>),
    Right(Option<f32>),
    Stop,
    Straight,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Drive {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Turn {
    Left,
    Right,
}

/// Latched input state; each command replaces the previous one, like
/// the key map it descends from.
#[derive(Debug, Clone, Copy, Default)]
struct InputState {
    drive: Option<Drive>,
    turn: Option<Turn>,
}

/// Physical and tuning parameters of the vehicle.
#[derive(Debug, Clone)]
pub struct VehicleConfig {
    /// Visual body width (along the heading axis).
    pub body_width: f32,
    /// Visual body height (across the heading axis).
    pub body_height: f32,
    /// Collision hitbox width; may be smaller than the body.
    pub hitbox_width: f32,
    /// Collision hitbox height.
    pub hitbox_height: f32,
    /// Distance between axles for the bicycle model.
    pub wheel_base: f32,
    /// Velocity clamp, units per tick.
    pub max_speed: f32,
    /// Acceleration applied while a drive input is active.
    pub accel_rate: f32,
    /// Friction-like decay applied when idle.
    pub decel_rate: f32,
    /// Steering angle bound in radians.
    pub max_steering: f32,
    /// Steering ramp/relax rate in radians per tick.
    pub steer_rate: f32,
    /// RPM reported at `max_speed`.
    pub max_rpm: f32,
    /// Clearance the pre-emptive brake preserves toward the nearest
    /// forward/rear obstacle.
    pub safety_gap: f32,
    /// Battery drained per unit of rpm per tick.
    pub battery_rate: f32,
    /// Spawn position (hitbox center).
    pub start: Vec2,
    /// Spawn heading in radians.
    pub start_heading: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            body_width: 75.0,
            body_height: 40.0,
            hitbox_width: 40.0,
            hitbox_height: 20.0,
            wheel_base: 50.0,
            max_speed: 5.0,
            accel_rate: 0.2,
            decel_rate: 0.05,
            max_steering: 60.0_f32.to_radians(),
            steer_rate: 0.015,
            max_rpm: 5000.0,
            safety_gap: 20.0,
            battery_rate: 1e-7,
            start: Vec2::new(100.0, 100.0),
            start_heading: 0.0,
        }
    }
}

/// The simulated vehicle. Owned by the session loop and mutated once
/// per tick through [`Vehicle::step`].
#[derive(Debug, Clone)]
pub struct Vehicle {
    config: VehicleConfig,
    pos: Vec2,
    heading: f32,
    velocity: f32,
    acceleration: f32,
    steering_angle: f32,
    steering_override: bool,
    fixed_speed: Option<f32>,
    crashed: bool,
    battery: f32,
    input: InputState,
    speed: f32,
    rpm: f32,
    gyro: f32,
}

impl Vehicle {
    pub fn new(config: VehicleConfig) -> Self {
        let pos = config.start;
        let heading = normalize_angle(config.start_heading);
        Self {
            config,
            pos,
            heading,
            velocity: 0.0,
            acceleration: 0.0,
            steering_angle: 0.0,
            steering_override: false,
            fixed_speed: None,
            crashed: false,
            battery: 1.0,
            input: InputState::default(),
            speed: 0.0,
            rpm: 0.0,
            gyro: 0.0,
        }
    }

    /// Restore the spawn pose and zero all motion state.
    pub fn reset(&mut self) {
        self.pos = self.config.start;
        self.heading = normalize_angle(self.config.start_heading);
        self.velocity = 0.0;
        self.acceleration = 0.0;
        self.steering_angle = 0.0;
        self.steering_override = false;
        self.crashed = false;
        self.battery = 1.0;
        self.input = InputState::default();
        self.speed = 0.0;
        self.rpm = 0.0;
        self.gyro = self.heading.to_degrees().rem_euclid(360.0);
    }

    /// Latch a drive command. Each command replaces the previous input;
    /// a numeric `Left`/`Right` sets the steering angle directly and
    /// freezes relaxation until `Straight` or a plain turn supersedes it.
    pub fn apply_command(&mut self, cmd: DriveCommand) {
        match cmd {
            DriveCommand::Forward => {
                self.input = InputState {
                    drive: Some(Drive::Forward),
                    turn: None,
                };
            }
            DriveCommand::Backward => {
                self.input = InputState {
                    drive: Some(Drive::Backward),
                    turn: None,
                };
            }
            DriveCommand::Left(None) => {
                self.input = InputState {
                    drive: None,
                    turn: Some(Turn::Left),
                };
                self.steering_override = false;
            }
            DriveCommand::Right(None) => {
                self.input = InputState {
                    drive: None,
                    turn: Some(Turn::Right),
                };
                self.steering_override = false;
            }
            DriveCommand::Left(Some(degrees)) => {
                self.input = InputState::default();
                self.steering_angle = (-degrees.to_radians())
                    .clamp(-self.config.max_steering, self.config.max_steering);
                self.steering_override = true;
            }
            DriveCommand::Right(Some(degrees)) => {
                self.input = InputState::default();
                self.steering_angle = degrees
                    .to_radians()
                    .clamp(-self.config.max_steering, self.config.max_steering);
                self.steering_override = true;
            }
            DriveCommand::Stop => {
                self.input = InputState::default();
            }
            DriveCommand::Straight => {
                self.input = InputState::default();
                self.steering_angle = 0.0;
                self.steering_override = false;
            }
        }
    }

    /// Fixed-speed override; `Some(v)` pins the velocity magnitude while
    /// a drive input is active, `None` restores acceleration control.
    pub fn set_fixed_speed(&mut self, speed: Option<f32>) {
        self.fixed_speed = speed.filter(|s| *s > 0.0);
    }

    /// Advance one tick. `front_distance`/`rear_distance` are the most
    /// recent sensor readings used by the pre-emptive brake; pass
    /// `f32::INFINITY` when no sensor covers a direction.
    pub fn step(&mut self, map: &WorldMap, front_distance: f32, rear_distance: f32) {
        // 1. Linear acceleration. Steering input alone also rolls the
        // vehicle forward.
        self.acceleration = match self.input.drive {
            Some(Drive::Forward) => self.config.accel_rate,
            Some(Drive::Backward) => -self.config.accel_rate,
            None if self.input.turn.is_some() => self.config.accel_rate,
            None => {
                if self.velocity > 0.0 {
                    -self.config.decel_rate
                } else if self.velocity < 0.0 {
                    self.config.decel_rate
                } else {
                    0.0
                }
            }
        };

        match (self.fixed_speed, self.input.drive) {
            (Some(s), Some(Drive::Forward)) => {
                self.velocity = s.min(self.config.max_speed);
            }
            (Some(s), Some(Drive::Backward)) => {
                self.velocity = -s.min(self.config.max_speed);
            }
            _ => self.velocity += self.acceleration,
        }
        self.velocity = self
            .velocity
            .clamp(-self.config.max_speed, self.config.max_speed);
        if self.velocity.abs() < VELOCITY_SNAP
            && self.input.drive.is_none()
            && self.input.turn.is_none()
        {
            self.velocity = 0.0;
        }

        // Pre-emptive brake: cap the velocity so this tick's motion
        // still preserves the safety gap toward the nearest forward or
        // rear obstacle. Distinct from the hard collision check below.
        let gap = self.config.safety_gap;
        if self.velocity > 0.0 && front_distance - self.velocity < gap {
            let capped = (front_distance - gap).max(0.0);
            if capped < self.velocity {
                debug!(
                    "soft brake: front {:.1}, velocity {:.2} -> {:.2}",
                    front_distance, self.velocity, capped
                );
                self.velocity = capped;
            }
        } else if self.velocity < 0.0 && rear_distance + self.velocity < gap {
            let capped = (rear_distance - gap).max(0.0);
            if capped < -self.velocity {
                debug!(
                    "soft brake: rear {:.1}, velocity {:.2} -> {:.2}",
                    rear_distance, self.velocity, -capped
                );
                self.velocity = -capped;
            }
        }

        // 2. Steering ramp, or relaxation toward center. A latched
        // override freezes relaxation.
        match self.input.turn {
            Some(Turn::Left) => {
                self.steering_angle =
                    (self.steering_angle - self.config.steer_rate).max(-self.config.max_steering);
            }
            Some(Turn::Right) => {
                self.steering_angle =
                    (self.steering_angle + self.config.steer_rate).min(self.config.max_steering);
            }
            None if !self.steering_override => {
                if self.steering_angle > 0.0 {
                    self.steering_angle =
                        (self.steering_angle - self.config.steer_rate).max(0.0);
                } else if self.steering_angle < 0.0 {
                    self.steering_angle =
                        (self.steering_angle + self.config.steer_rate).min(0.0);
                }
            }
            None => {}
        }

        // 3. Bicycle model: no rotation while stationary.
        let angular_rate = if self.velocity != 0.0 {
            (self.velocity / self.config.wheel_base) * self.steering_angle.tan()
        } else {
            0.0
        };

        // 4. Predicted pose.
        let new_heading = normalize_angle(self.heading + angular_rate);
        let next = self.pos + Vec2::from_angle(self.heading) * self.velocity;

        // 5. Hard collision check against the oriented hitbox.
        let corners = rotated_corners(
            next,
            self.config.hitbox_width,
            self.config.hitbox_height,
            new_heading,
        );
        let bbox = Aabb::from_points(&corners);
        if map.arena.contains(&bbox) && !map.any_obstacle_intersects(&bbox) {
            self.pos = next;
            self.heading = new_heading;
            self.crashed = false;
        } else {
            debug!(
                "move rejected at ({:.1}, {:.1}), heading {:.2}",
                next.x, next.y, new_heading
            );
            self.velocity = 0.0;
            self.acceleration = 0.0;
            self.crashed = true;
        }

        // Derived telemetry.
        self.speed = (self.velocity * 60.0).abs();
        self.rpm = (self.velocity / self.config.max_speed * self.config.max_rpm).abs();
        self.gyro = self.heading.to_degrees().rem_euclid(360.0);
        self.battery = (self.battery - self.rpm * self.config.battery_rate).max(0.0);
    }

    /// Axis-aligned bounds of the oriented hitbox at the current pose.
    pub fn hitbox_aabb(&self) -> Aabb {
        let corners = rotated_corners(
            self.pos,
            self.config.hitbox_width,
            self.config.hitbox_height,
            self.heading,
        );
        Aabb::from_points(&corners)
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    /// Hitbox center position.
    pub fn position(&self) -> Vec2 {
        self.pos
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn steering_angle(&self) -> f32 {
        self.steering_angle
    }

    pub fn steering_override(&self) -> bool {
        self.steering_override
    }

    pub fn crashed(&self) -> bool {
        self.crashed
    }

    pub fn battery(&self) -> f32 {
        self.battery
    }

    /// Display speed, `|velocity| * 60`.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn rpm(&self) -> f32 {
        self.rpm
    }

    /// Heading as a 0-360 degree compass value.
    pub fn gyro(&self) -> f32 {
        self.gyro
    }
}
