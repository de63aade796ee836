//! Planar geometry. The whole match plays out on a flat field.

use std::ops::{Add, AddAssign, Mul, Sub};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A point or direction on the playing field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Vec2 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0);
    /// Unit vector pointing along +y, the heading of an unrotated marker.
    pub const UP: Self = Self::new(0.0, 1.0);

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    /// Direction of +y rotated counter-clockwise by `degrees`.
    #[must_use]
    pub fn from_heading(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(-sin, cos)
    }

    /// Moves toward `target` by at most `max_step`, never overshooting.
    #[must_use]
    pub fn move_towards(self, target: Self, max_step: f32) -> Self {
        let offset = target - self;
        let len = offset.length();
        if len <= max_step || len <= f32::EPSILON {
            target
        } else {
            self + offset * (max_step / len)
        }
    }

    /// A uniformly jittered copy of this point within `±half_extent` on each axis.
    pub fn jittered<R: Rng + ?Sized>(self, rng: &mut R, half_extent: f32) -> Self {
        if half_extent <= 0.0 {
            return self;
        }
        Self::new(
            self.x + rng.gen_range(-half_extent..=half_extent),
            self.y + rng.gen_range(-half_extent..=half_extent),
        )
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}
