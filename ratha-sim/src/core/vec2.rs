//! 2D vector primitive used throughout the simulation.

use serde::{Deserialize, Serialize};

/// A 2D point or direction in arena units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate (rightward)
    pub x: f32,
    /// Y coordinate (downward)
    pub y: f32,
}

impl Vec2 {
    /// Create a new vector.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    #[inline]
    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Unit vector pointing along `angle` radians.
    #[inline]
    pub fn from_angle(angle: f32) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self { x: cos_a, y: sin_a }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: &Vec2) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Vector length.
    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Dot product.
    #[inline]
    pub fn dot(&self, other: &Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Rotate this vector by `angle` radians about the origin.
    #[inline]
    pub fn rotated(&self, angle: f32) -> Vec2 {
        let (sin_a, cos_a) = angle.sin_cos();
        Vec2::new(
            self.x * cos_a - self.y * sin_a,
            self.x * sin_a + self.y * cos_a,
        )
    }
}

impl Default for Vec2 {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, scale: f32) -> Vec2 {
        Vec2::new(self.x * scale, self.y * scale)
    }
}
