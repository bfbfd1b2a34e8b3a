//! Waypoint path follower.
//!
//! Consumes a grid-cell path and drives the vehicle cell by cell with
//! discrete commands: rotate in place until the bearing error is
//! within tolerance, then drive forward until within half a cell of
//! the waypoint center. Every command is followed by a short timed
//! suspension and a `Stop`, so the simulation keeps ticking between
//! bursts and sensor state stays fresh.

use ratha_sim::core::angle_diff;
use ratha_sim::planning::GridCell;
use ratha_sim::vehicle::DriveCommand;
use ratha_sim::Vec2;
use tracing::{debug, info, warn};

/// Configuration for path following.
#[derive(Clone, Debug)]
pub struct FollowerConfig {
    /// Heading error below which rotation stops (radians)
    pub heading_tolerance: f32,
    /// Ticks to suspend after each discrete command
    pub suspend_ticks: u32,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            heading_tolerance: 0.1,
            suspend_ticks: 3,
        }
    }
}

/// Phase of the follower state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FollowPhase {
    /// Rotating toward the current waypoint
    Turning,
    /// Driving toward the current waypoint
    Driving,
}

/// Drives the vehicle along a planned cell path.
///
/// Only one follow operation may be active at a time; setting a new
/// path while one is running is a no-op.
pub struct PathFollower {
    config: FollowerConfig,
    path: Vec<GridCell>,
    cell_size: f32,
    next_index: usize,
    phase: FollowPhase,
    /// Remaining suspension ticks before the next command
    wait: u32,
    /// A movement command was just issued; the next emission is `Stop`
    braking: bool,
    active: bool,
}

impl PathFollower {
    pub fn new(config: FollowerConfig) -> Self {
        Self {
            config,
            path: Vec::new(),
            cell_size: 1.0,
            next_index: 0,
            phase: FollowPhase::Turning,
            wait: 0,
            braking: false,
            active: false,
        }
    }

    /// Begin following a path of grid cells. Paths shorter than two
    /// waypoints are ignored; a request while a follow is running is
    /// rejected.
    pub fn set_path(&mut self, path: Vec<GridCell>, cell_size: f32) {
        if self.active {
            warn!("set_path: follow already in progress, ignoring request");
            return;
        }
        if path.len() < 2 {
            debug!("set_path: {} waypoint(s), nothing to follow", path.len());
            return;
        }
        info!("set_path: following {} waypoints", path.len());
        self.path = path;
        self.cell_size = cell_size;
        // The first cell is the vehicle's own; head for the second.
        self.next_index = 1;
        self.phase = FollowPhase::Turning;
        self.wait = 0;
        self.braking = false;
        self.active = true;
    }

    /// Is a follow operation running?
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Abandon the current path.
    pub fn clear(&mut self) {
        self.active = false;
        self.path.clear();
        self.next_index = 0;
        self.wait = 0;
        self.braking = false;
    }

    /// Advance one tick; returns the command to issue, if any.
    ///
    /// `position` is the vehicle's hitbox center and `heading` its
    /// current orientation, both read after this tick's dynamics and
    /// sensor updates.
    pub fn tick(&mut self, position: Vec2, heading: f32) -> Option<DriveCommand> {
        if !self.active {
            return None;
        }

        if self.wait > 0 {
            self.wait -= 1;
            return None;
        }

        if self.braking {
            self.braking = false;
            self.wait = self.config.suspend_ticks;
            return Some(DriveCommand::Stop);
        }

        let target = self.waypoint_center(self.path[self.next_index]);

        match self.phase {
            FollowPhase::Turning => {
                let bearing = (target.y - position.y).atan2(target.x - position.x);
                let error = angle_diff(heading, bearing);
                if error.abs() <= self.config.heading_tolerance {
                    debug!(
                        "waypoint {}: aligned (error {:.3} rad)",
                        self.next_index, error
                    );
                    self.phase = FollowPhase::Driving;
                    return Some(DriveCommand::Stop);
                }
                self.braking = true;
                self.wait = self.config.suspend_ticks;
                Some(if error > 0.0 {
                    DriveCommand::Right(None)
                } else {
                    DriveCommand::Left(None)
                })
            }
            FollowPhase::Driving => {
                let distance = position.distance(&target);
                if distance <= self.cell_size / 2.0 {
                    debug!(
                        "waypoint {} reached (distance {:.1})",
                        self.next_index, distance
                    );
                    self.next_index += 1;
                    if self.next_index >= self.path.len() {
                        info!("path complete");
                        self.clear();
                    } else {
                        self.phase = FollowPhase::Turning;
                    }
                    return Some(DriveCommand::Stop);
                }
                self.braking = true;
                self.wait = self.config.suspend_ticks;
                Some(DriveCommand::Forward)
            }
        }
    }

    fn waypoint_center(&self, cell: GridCell) -> Vec2 {
        Vec2::new(
            (cell.0 as f32 + 0.5) * self.cell_size,
            (cell.1 as f32 + 0.5) * self.cell_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follower() -> PathFollower {
        PathFollower::new(FollowerConfig::default())
    }

    #[test]
    fn test_short_path_is_noop() {
        let mut f = follower();
        f.set_path(vec![(0, 0)], 40.0);
        assert!(!f.is_active());
        assert!(f.tick(Vec2::zero(), 0.0).is_none());
    }

    #[test]
    fn test_reentrancy_guard() {
        let mut f = follower();
        f.set_path(vec![(0, 0), (5, 0)], 40.0);
        assert!(f.is_active());
        let first_target = 1;
        f.set_path(vec![(0, 0), (0, 9)], 40.0);
        // The running follow is untouched.
        assert_eq!(f.next_index, first_target);
        assert_eq!(f.path, vec![(0, 0), (5, 0)]);
    }

    #[test]
    fn test_aligned_vehicle_drives_forward() {
        let mut f = follower();
        f.set_path(vec![(0, 0), (5, 0)], 40.0);

        // Facing the waypoint dead-on: alignment stop, then forward.
        let pos = Vec2::new(20.0, 20.0);
        assert_eq!(f.tick(pos, 0.0), Some(DriveCommand::Stop));
        assert_eq!(f.tick(pos, 0.0), Some(DriveCommand::Forward));
        // Suspension, then the brake pulse.
        for _ in 0..3 {
            assert_eq!(f.tick(pos, 0.0), None);
        }
        assert_eq!(f.tick(pos, 0.0), Some(DriveCommand::Stop));
    }

    #[test]
    fn test_misaligned_vehicle_turns_first() {
        let mut f = follower();
        f.set_path(vec![(0, 0), (0, 5)], 40.0);

        // Waypoint is straight down (+y) but the vehicle faces +x:
        // bearing error is +PI/2, so it turns right.
        let pos = Vec2::new(20.0, 20.0);
        assert_eq!(f.tick(pos, 0.0), Some(DriveCommand::Right(None)));
    }

    #[test]
    fn test_arrival_advances_and_completes() {
        let mut f = follower();
        f.set_path(vec![(0, 0), (1, 0)], 40.0);

        // Standing on the final waypoint center: aligned, then arrival
        // ends the follow.
        let pos = Vec2::new(60.0, 20.0);
        assert_eq!(f.tick(pos, 0.0), Some(DriveCommand::Stop));
        assert_eq!(f.tick(pos, 0.0), Some(DriveCommand::Stop));
        assert!(!f.is_active(), "autopilot flag cleared after last waypoint");
        assert!(f.tick(pos, 0.0).is_none());
    }
}
