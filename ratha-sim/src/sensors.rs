//! Reflective ray-casting range sensors.
//!
//! Each sensor is mounted at a vehicle-local offset with a local cast
//! angle; both are rotated into world space at evaluation time. A cast
//! marches a bounded, possibly-reflected ray through the obstacle set:
//! on a hit the ray continues along the surface tangent closest in
//! angle to the incoming direction, modelling a grazing return rather
//! than a specular bounce.

use log::trace;

use crate::core::Vec2;
use crate::map::WorldMap;
use crate::vehicle::VehicleConfig;

/// Nudge past a hit point before continuing the march, so the same
/// surface is not struck again.
const REFLECT_NUDGE: f32 = 1e-2;

/// A sensor's mounting description in the vehicle's local, unrotated
/// frame (x forward, y to the right, origin at the hitbox center).
#[derive(Debug, Clone)]
pub struct SensorMount {
    /// Sensor name used for lookups (`front`, `left`, ...).
    pub name: String,
    /// Mount point relative to the hitbox center.
    pub offset: Vec2,
    /// Cast direction relative to the vehicle heading.
    pub angle: f32,
    /// Maximum range in arena units.
    pub range: f32,
}

/// One straight piece of a (possibly reflected) sensor ray.
#[derive(Debug, Clone, Copy)]
pub struct RaySegment {
    pub origin: Vec2,
    pub angle: f32,
    pub length: f32,
}

/// Result of evaluating one sensor for one tick.
#[derive(Debug, Clone)]
pub struct SensorReading {
    /// Distance to the first hit, or the full range when nothing was
    /// struck. Only the first segment counts toward the distance.
    pub distance: f32,
    /// The complete segment chain, for visualization and coverage.
    pub path: Vec<RaySegment>,
}

impl SensorReading {
    fn out_of_range(origin: Vec2, angle: f32, range: f32) -> Self {
        Self {
            distance: range,
            path: vec![RaySegment {
                origin,
                angle,
                length: range,
            }],
        }
    }
}

/// The vehicle's sensor fit. Readings are recomputed every tick and
/// never persisted.
#[derive(Debug, Clone)]
pub struct SensorArray {
    mounts: Vec<SensorMount>,
    max_bounces: usize,
    readings: Vec<SensorReading>,
}

impl SensorArray {
    /// Create an array from explicit mounts.
    pub fn new(mounts: Vec<SensorMount>, max_bounces: usize) -> Self {
        let readings = mounts
            .iter()
            .map(|m| SensorReading::out_of_range(Vec2::zero(), m.angle, m.range))
            .collect();
        Self {
            mounts,
            max_bounces,
            readings,
        }
    }

    /// The stock fit: a long-range forward sensor plus short-range
    /// side and rear sensors at the hitbox edges.
    pub fn with_default_mounts(config: &VehicleConfig) -> Self {
        let hw = config.hitbox_width / 2.0;
        let hh = config.hitbox_height / 2.0;
        let mounts = vec![
            SensorMount {
                name: "front".to_string(),
                offset: Vec2::new(hw, 0.0),
                angle: 0.0,
                range: 350.0,
            },
            SensorMount {
                name: "left".to_string(),
                offset: Vec2::new(0.0, -hh),
                angle: -std::f32::consts::FRAC_PI_2,
                range: 150.0,
            },
            SensorMount {
                name: "right".to_string(),
                offset: Vec2::new(0.0, hh),
                angle: std::f32::consts::FRAC_PI_2,
                range: 150.0,
            },
            SensorMount {
                name: "rear".to_string(),
                offset: Vec2::new(-hw, 0.0),
                angle: std::f32::consts::PI,
                range: 150.0,
            },
        ];
        Self::new(mounts, 3)
    }

    /// Recompute every sensor against the obstacle set at the given
    /// vehicle pose. Sensors are independent and mutate nothing else.
    pub fn update(&mut self, map: &WorldMap, center: Vec2, heading: f32) {
        for (i, mount) in self.mounts.iter().enumerate() {
            let origin = center + mount.offset.rotated(heading);
            let angle = heading + mount.angle;
            self.readings[i] = cast_reflective(map, origin, angle, mount.range, self.max_bounces);
            trace!(
                "sensor {} reads {:.1} over {} segment(s)",
                mount.name,
                self.readings[i].distance,
                self.readings[i].path.len()
            );
        }
    }

    /// Reading for a named sensor.
    pub fn reading(&self, name: &str) -> Option<&SensorReading> {
        self.mounts
            .iter()
            .position(|m| m.name == name)
            .map(|i| &self.readings[i])
    }

    /// Distance for a named sensor; unknown names read as unobstructed.
    pub fn distance(&self, name: &str) -> f32 {
        self.reading(name).map_or(f32::INFINITY, |r| r.distance)
    }

    /// Iterate over `(name, distance)` pairs in mount order.
    pub fn distances(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        self.mounts
            .iter()
            .zip(self.readings.iter())
            .map(|(m, r)| (m.name.as_str(), r.distance))
    }

    pub fn mounts(&self) -> &[SensorMount] {
        &self.mounts
    }
}

/// March a bounded reflective ray through the obstacle set.
///
/// Each bounce continues along the hit surface's tangent nearest in
/// angle to the incoming ray, from a point nudged just past the hit,
/// with the length budget reduced by the consumed distance.
fn cast_reflective(
    map: &WorldMap,
    origin: Vec2,
    angle: f32,
    range: f32,
    max_bounces: usize,
) -> SensorReading {
    let mut path = Vec::new();
    let mut origin = origin;
    let mut angle = angle;
    let mut remaining = range;
    let mut distance = None;

    for bounce in 0..=max_bounces {
        let hit = match map.raycast(origin, angle) {
            Some(hit) if hit.t <= remaining => hit,
            _ => {
                // Terminal segment: nothing within the remaining budget.
                path.push(RaySegment {
                    origin,
                    angle,
                    length: remaining,
                });
                if distance.is_none() {
                    distance = Some(range);
                }
                break;
            }
        };

        path.push(RaySegment {
            origin,
            angle,
            length: hit.t,
        });
        if distance.is_none() {
            distance = Some(hit.t);
        }

        if bounce == max_bounces {
            break;
        }

        // Grazing reflection: of the two surface tangents, continue
        // along the one deviating least from the incoming direction.
        let incoming = Vec2::from_angle(angle);
        let tangent_a = Vec2::new(-hit.normal.y, hit.normal.x);
        let tangent_b = Vec2::new(hit.normal.y, -hit.normal.x);
        let tangent = if incoming.dot(&tangent_a) >= incoming.dot(&tangent_b) {
            tangent_a
        } else {
            tangent_b
        };

        let hit_point = origin + incoming * hit.t;
        remaining -= hit.t;
        if remaining <= REFLECT_NUDGE {
            break;
        }
        origin = hit_point + tangent * REFLECT_NUDGE;
        angle = tangent.y.atan2(tangent.x);
        remaining -= REFLECT_NUDGE;
    }

    SensorReading {
        distance: distance.unwrap_or(range),
        path,
    }
}
