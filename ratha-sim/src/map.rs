//! Obstacle set, arena bounds and the optional target marker.
//!
//! Obstacles are shared read-only between the collision resolver, the
//! sensor array and the path planner; only external editor operations
//! replace the list.

use serde::{Deserialize, Serialize};

use crate::core::Vec2;
use crate::geometry::{self, Aabb, RayHit};

/// A placed obstacle. Rectangles are the editor's square placement unit;
/// circles come from round map features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Obstacle {
    Rect { x: f32, y: f32, size: f32 },
    Circle { x: f32, y: f32, radius: f32 },
}

impl Obstacle {
    /// Does this obstacle overlap the given box?
    pub fn intersects_aabb(&self, bbox: &Aabb) -> bool {
        match *self {
            Obstacle::Rect { x, y, size } => {
                bbox.overlaps(&Aabb::new(x, y, x + size, y + size))
            }
            Obstacle::Circle { x, y, radius } => {
                let nearest_x = x.clamp(bbox.min.x, bbox.max.x);
                let nearest_y = y.clamp(bbox.min.y, bbox.max.y);
                let dx = x - nearest_x;
                let dy = y - nearest_y;
                dx * dx + dy * dy <= radius * radius
            }
        }
    }

    /// Nearest forward intersection of a ray with this obstacle.
    pub fn raycast(&self, origin: Vec2, angle: f32) -> Option<RayHit> {
        match *self {
            Obstacle::Rect { x, y, size } => {
                geometry::ray_rect_intersection(origin, angle, x, y, size, size)
            }
            Obstacle::Circle { x, y, radius } => {
                geometry::ray_circle_intersection(origin, angle, x, y, radius)
            }
        }
    }

    /// Axis-aligned bounds of the obstacle footprint.
    pub fn bounds(&self) -> Aabb {
        match *self {
            Obstacle::Rect { x, y, size } => Aabb::new(x, y, x + size, y + size),
            Obstacle::Circle { x, y, radius } => {
                Aabb::new(x - radius, y - radius, x + radius, y + radius)
            }
        }
    }
}

/// Goal marker; driving the hitbox onto it ends a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl Target {
    pub fn intersects_aabb(&self, bbox: &Aabb) -> bool {
        bbox.overlaps(&Aabb::new(self.x, self.y, self.x + self.size, self.y + self.size))
    }
}

/// Rectangular driving area with a border margin the vehicle may not
/// cross.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    /// Is the box fully inside the arena, honoring the margin?
    pub fn contains(&self, bbox: &Aabb) -> bool {
        bbox.min.x >= self.margin
            && bbox.min.y >= self.margin
            && bbox.max.x <= self.width - self.margin
            && bbox.max.y <= self.height - self.margin
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(800.0, 600.0, 10.0)
    }
}

/// The shared world: arena bounds, obstacle list and an optional target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldMap {
    pub arena: Arena,
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub target: Option<Target>,
}

impl WorldMap {
    pub fn new(arena: Arena, obstacles: Vec<Obstacle>) -> Self {
        Self {
            arena,
            obstacles,
            target: None,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    /// Does any obstacle overlap the given box?
    pub fn any_obstacle_intersects(&self, bbox: &Aabb) -> bool {
        self.obstacles.iter().any(|o| o.intersects_aabb(bbox))
    }

    /// Nearest obstacle hit along a ray, if any.
    pub fn raycast(&self, origin: Vec2, angle: f32) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        for obstacle in &self.obstacles {
            if let Some(hit) = obstacle.raycast(origin, angle) {
                if best.as_ref().map_or(true, |b| hit.t < b.t) {
                    best = Some(hit);
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rect_obstacle_overlap() {
        let o = Obstacle::Rect {
            x: 100.0,
            y: 100.0,
            size: 40.0,
        };
        assert!(o.intersects_aabb(&Aabb::new(130.0, 130.0, 160.0, 160.0)));
        assert!(!o.intersects_aabb(&Aabb::new(141.0, 100.0, 160.0, 120.0)));
    }

    #[test]
    fn test_circle_obstacle_overlap() {
        let o = Obstacle::Circle {
            x: 100.0,
            y: 100.0,
            radius: 10.0,
        };
        // Box corner closest point is (105, 105): distance ~7.07 < 10.
        assert!(o.intersects_aabb(&Aabb::new(105.0, 105.0, 120.0, 120.0)));
        // Corner at (108, 108): distance ~11.3 > 10.
        assert!(!o.intersects_aabb(&Aabb::new(108.0, 108.0, 120.0, 120.0)));
    }

    #[test]
    fn test_map_raycast_picks_nearest() {
        let map = WorldMap::new(
            Arena::default(),
            vec![
                Obstacle::Rect {
                    x: 200.0,
                    y: -20.0,
                    size: 40.0,
                },
                Obstacle::Rect {
                    x: 100.0,
                    y: -20.0,
                    size: 40.0,
                },
            ],
        );
        let hit = map.raycast(Vec2::zero(), 0.0).expect("hit");
        assert_relative_eq!(hit.t, 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_arena_margin() {
        let arena = Arena::new(800.0, 600.0, 10.0);
        assert!(arena.contains(&Aabb::new(10.0, 10.0, 790.0, 590.0)));
        assert!(!arena.contains(&Aabb::new(5.0, 10.0, 100.0, 100.0)));
    }
}
