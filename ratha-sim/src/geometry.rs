//! Ray-shape intersection and oriented-box support.
//!
//! The sensor array and the collision resolver both go through this
//! module. All intersection tests only consider the forward ray
//! direction; a shape exactly touching the ray origin does not report
//! a self-hit (roots below [`EPSILON`] are discarded).

use crate::core::Vec2;

/// Boundary-coincidence tolerance in arena units.
pub const EPSILON: f32 = 1e-3;

/// Result of a successful ray intersection.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Distance along the ray to the hit point.
    pub t: f32,
    /// Outward unit normal of the struck surface.
    pub normal: Vec2,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Construct from explicit corner coordinates.
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    /// Smallest box enclosing all `points`.
    pub fn from_points(points: &[Vec2]) -> Self {
        let mut min = Vec2::new(f32::INFINITY, f32::INFINITY);
        let mut max = Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Closed-interval overlap test against another box.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }
}

/// Intersect a ray with an axis-aligned rectangle using the slab method.
///
/// Returns the smallest intersection distance `>= EPSILON` together with
/// the outward normal of the struck face, or `None` when the ray misses.
/// A ray starting inside the rectangle reports the exit face.
pub fn ray_rect_intersection(
    origin: Vec2,
    angle: f32,
    rx: f32,
    ry: f32,
    rw: f32,
    rh: f32,
) -> Option<RayHit> {
    let dir = Vec2::from_angle(angle);

    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;

    if dir.x.abs() > EPSILON {
        let tx1 = (rx - origin.x) / dir.x;
        let tx2 = (rx + rw - origin.x) / dir.x;
        tmin = tmin.max(tx1.min(tx2));
        tmax = tmax.min(tx1.max(tx2));
    } else if origin.x < rx || origin.x > rx + rw {
        return None;
    }

    if dir.y.abs() > EPSILON {
        let ty1 = (ry - origin.y) / dir.y;
        let ty2 = (ry + rh - origin.y) / dir.y;
        tmin = tmin.max(ty1.min(ty2));
        tmax = tmax.min(ty1.max(ty2));
    } else if origin.y < ry || origin.y > ry + rh {
        return None;
    }

    if tmax < EPSILON || tmin > tmax {
        return None;
    }

    let t = if tmin >= EPSILON { tmin } else { tmax };

    let hit = origin + dir * t;
    let normal = if (hit.x - rx).abs() < EPSILON {
        Vec2::new(-1.0, 0.0)
    } else if (hit.x - (rx + rw)).abs() < EPSILON {
        Vec2::new(1.0, 0.0)
    } else if (hit.y - ry).abs() < EPSILON {
        Vec2::new(0.0, -1.0)
    } else {
        Vec2::new(0.0, 1.0)
    };

    Some(RayHit { t, normal })
}

/// Intersect a ray with a circle via the quadratic solve.
///
/// Selects the smaller root `>= EPSILON`; the normal is the unit vector
/// from the circle center through the hit point.
pub fn ray_circle_intersection(
    origin: Vec2,
    angle: f32,
    cx: f32,
    cy: f32,
    radius: f32,
) -> Option<RayHit> {
    let dir = Vec2::from_angle(angle);
    let oc = origin - Vec2::new(cx, cy);

    // Unit direction, so a = 1.
    let b = 2.0 * oc.dot(&dir);
    let c = oc.dot(&oc) - radius * radius;
    let disc = b * b - 4.0 * c;
    if disc < 0.0 {
        return None;
    }

    let sqrt_disc = disc.sqrt();
    let t0 = (-b - sqrt_disc) / 2.0;
    let t1 = (-b + sqrt_disc) / 2.0;

    let t = if t0 >= EPSILON {
        t0
    } else if t1 >= EPSILON {
        t1
    } else {
        return None;
    };

    let hit = origin + dir * t;
    let normal = Vec2::new((hit.x - cx) / radius, (hit.y - cy) / radius);

    Some(RayHit { t, normal })
}

/// Corners of a `w` x `h` rectangle centered on `center`, rotated about
/// its own center by `heading` radians.
///
/// Order: front-left, front-right, rear-right, rear-left in the local
/// frame before rotation.
pub fn rotated_corners(center: Vec2, w: f32, h: f32, heading: f32) -> [Vec2; 4] {
    let hw = w / 2.0;
    let hh = h / 2.0;
    let local = [
        Vec2::new(-hw, -hh),
        Vec2::new(hw, -hh),
        Vec2::new(hw, hh),
        Vec2::new(-hw, hh),
    ];
    let mut out = [Vec2::zero(); 4];
    for (i, corner) in local.iter().enumerate() {
        out[i] = center + corner.rotated(heading);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn test_ray_hits_rect_face() {
        // Ray along +X from the origin into a square 100 units ahead.
        let hit = ray_rect_intersection(Vec2::zero(), 0.0, 100.0, -20.0, 40.0, 40.0)
            .expect("should hit");
        assert_relative_eq!(hit.t, 100.0, epsilon = 1e-3);
        assert_relative_eq!(hit.normal.x, -1.0);
        assert_relative_eq!(hit.normal.y, 0.0);
    }

    #[test]
    fn test_ray_misses_rect() {
        let hit = ray_rect_intersection(Vec2::zero(), PI, 100.0, -20.0, 40.0, 40.0);
        assert!(hit.is_none());
    }

    #[test]
    fn test_ray_parallel_outside_slab() {
        // Horizontal ray entirely above the rectangle.
        let hit = ray_rect_intersection(Vec2::new(0.0, -50.0), 0.0, 100.0, 0.0, 40.0, 40.0);
        assert!(hit.is_none());
    }

    #[test]
    fn test_origin_on_boundary_no_self_hit() {
        // Origin exactly on the left face, pointing away.
        let hit = ray_rect_intersection(Vec2::new(100.0, 0.0), PI, 100.0, -20.0, 40.0, 40.0);
        assert!(hit.is_none());
    }

    #[test]
    fn test_ray_from_inside_reports_exit_face() {
        let hit = ray_rect_intersection(Vec2::new(120.0, 0.0), 0.0, 100.0, -20.0, 40.0, 40.0)
            .expect("should exit");
        assert_relative_eq!(hit.t, 20.0, epsilon = 1e-3);
        assert_relative_eq!(hit.normal.x, 1.0);
    }

    #[test]
    fn test_ray_hits_top_face() {
        let hit = ray_rect_intersection(Vec2::new(120.0, -100.0), FRAC_PI_2, 100.0, 0.0, 40.0, 40.0)
            .expect("should hit");
        assert_relative_eq!(hit.t, 100.0, epsilon = 1e-3);
        assert_relative_eq!(hit.normal.y, -1.0);
    }

    #[test]
    fn test_ray_circle_head_on() {
        let hit = ray_circle_intersection(Vec2::zero(), 0.0, 100.0, 0.0, 20.0).expect("hit");
        assert_relative_eq!(hit.t, 80.0, epsilon = 1e-3);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_ray_circle_behind_origin() {
        let hit = ray_circle_intersection(Vec2::zero(), 0.0, -100.0, 0.0, 20.0);
        assert!(hit.is_none());
    }

    #[test]
    fn test_ray_circle_tangent_origin_no_self_hit() {
        // Origin on the circle boundary, ray along the tangent.
        let hit = ray_circle_intersection(Vec2::new(80.0, 0.0), FRAC_PI_2, 100.0, 0.0, 20.0);
        assert!(hit.is_none());
    }

    #[test]
    fn test_rotated_corners_identity() {
        let corners = rotated_corners(Vec2::new(10.0, 10.0), 4.0, 2.0, 0.0);
        assert_relative_eq!(corners[0].x, 8.0);
        assert_relative_eq!(corners[0].y, 9.0);
        assert_relative_eq!(corners[2].x, 12.0);
        assert_relative_eq!(corners[2].y, 11.0);
    }

    #[test]
    fn test_rotated_corners_quarter_turn_swaps_extents() {
        let corners = rotated_corners(Vec2::zero(), 4.0, 2.0, FRAC_PI_2);
        let aabb = Aabb::from_points(&corners);
        assert_relative_eq!(aabb.width(), 2.0, epsilon = 1e-5);
        assert_relative_eq!(aabb.height(), 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rotated_aabb_grows_at_diagonal() {
        let corners = rotated_corners(Vec2::zero(), 4.0, 4.0, FRAC_PI_4);
        let aabb = Aabb::from_points(&corners);
        let expected = 4.0 * (2.0_f32).sqrt();
        assert_relative_eq!(aabb.width(), expected, epsilon = 1e-4);
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(5.0, 5.0, 15.0, 15.0);
        let c = Aabb::new(11.0, 0.0, 20.0, 10.0);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
