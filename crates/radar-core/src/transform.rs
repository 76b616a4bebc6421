//! World-space to radar-space transforms.
//!
//! The game stores an entity's heading as the (cos θ, sin θ) pair of its
//! rotation matrix:
//!
//! ```text
//! [cos θ  -sin θ]
//! [sin θ   cos θ]
//! ```
//!
//! Radar space is centered on the rotation holder and screen-oriented: the
//! holder faces up (negative y), x grows to the right and y grows downward.

use serde::{Deserialize, Serialize};

/// Accepted length of a (cos, sin) pair read from memory
const ROTATION_LENGTH_RANGE: std::ops::RangeInclusive<f32> = 0.5..=2.0;

/// Heading as read from memory. Not re-normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub cos: f32,
    pub sin: f32,
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation { cos: 1.0, sin: 0.0 };

    pub fn new(cos: f32, sin: f32) -> Self {
        Self { cos, sin }
    }

    /// Whether the pair looks like a rotation rather than unrelated memory.
    ///
    /// Stored values drift a little from unit length, so only pairs far
    /// from it (or non-finite) are refused.
    pub fn is_plausible(&self) -> bool {
        let length = self.cos.hypot(self.sin);
        length.is_finite() && ROTATION_LENGTH_RANGE.contains(&length)
    }

    /// Heading angle in radians
    pub fn heading(&self) -> f32 {
        self.sin.atan2(self.cos)
    }

    pub fn angle_degrees(&self) -> f32 {
        self.heading().to_degrees()
    }

    /// Facing direction in world space.
    ///
    /// The y component is negated: `to_radar_space` already flips one axis
    /// for positions, and directions pass through the same transform.
    pub fn forward_vector(&self) -> (f32, f32) {
        (self.cos, -self.sin)
    }

    /// Transform a world-space delta into this rotation's radar frame.
    pub fn to_radar_space(&self, world_dx: f32, world_dy: f32) -> (f32, f32) {
        let local_x = self.cos * world_dx - self.sin * world_dy;
        let local_y = self.sin * world_dx + self.cos * world_dy;

        (-local_y, -local_x)
    }

    /// Transform a world-space direction into this rotation's radar frame.
    ///
    /// Identical to `to_radar_space`: the mapping is linear, so directions
    /// and position deltas share it.
    pub fn transform_direction_to_radar(&self, dir_x: f32, dir_y: f32) -> (f32, f32) {
        self.to_radar_space(dir_x, dir_y)
    }
}

/// Scale a vector to unit length, or `None` if it has no length.
pub fn normalize(x: f32, y: f32) -> Option<(f32, f32)> {
    let length = x.hypot(y);
    if length > f32::EPSILON && length.is_finite() {
        Some((x / length, y / length))
    } else {
        None
    }
}
