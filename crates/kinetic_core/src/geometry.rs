//! Geometry snapshots and transform deltas
//!
//! A [`BoundingBox`] is what the host reports for an element at one instant.
//! A [`TransformDelta`] is the translate/scale pair that makes one box look
//! like another, which is the "Invert" half of FLIP.

/// Axis-aligned element geometry in the host's coordinate space
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Create a bounding box. Negative sizes are clamped to zero.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// The zeroed box reported for detached elements
    pub const fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.width == 0.0 && self.height == 0.0
    }

    /// Point at fractional position (`fx`, `fy`) inside the box
    ///
    /// `(0, 0)` is the top-left corner, `(0.5, 0.5)` the center.
    pub fn point_at(&self, fx: f32, fy: f32) -> (f32, f32) {
        (self.x + self.width * fx, self.y + self.height * fy)
    }

    pub fn center(&self) -> (f32, f32) {
        self.point_at(0.5, 0.5)
    }
}

/// Translate + scale that, applied to one box, reproduces another
///
/// Translation is expressed relative to the top-left corner. Scale is a ratio
/// of sizes, so `1.0` means unchanged.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransformDelta {
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for TransformDelta {
    fn default() -> Self {
        Self::identity()
    }
}

impl TransformDelta {
    pub const fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// The delta that makes `to` look like `from`
    ///
    /// A zero-sized `to` axis yields a scale of `1.0` on that axis instead of
    /// an infinite ratio.
    pub fn between(from: &BoundingBox, to: &BoundingBox) -> Self {
        Self {
            x: from.x - to.x,
            y: from.y - to.y,
            scale_x: size_ratio(from.width, to.width),
            scale_y: size_ratio(from.height, to.height),
        }
    }

    /// Apply `self` first, then `next`
    pub fn then(&self, next: &TransformDelta) -> Self {
        Self {
            x: self.x + next.x,
            y: self.y + next.y,
            scale_x: self.scale_x * next.scale_x,
            scale_y: self.scale_y * next.scale_y,
        }
    }

    /// The delta that undoes `self`
    pub fn inverse(&self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            scale_x: if self.scale_x != 0.0 { 1.0 / self.scale_x } else { 1.0 },
            scale_y: if self.scale_y != 0.0 { 1.0 / self.scale_y } else { 1.0 },
        }
    }

    /// Transform a box with a top-left transform origin
    pub fn apply(&self, bounds: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            bounds.x + self.x,
            bounds.y + self.y,
            bounds.width * self.scale_x,
            bounds.height * self.scale_y,
        )
    }

    /// Whether the delta is visible beyond the given noise thresholds
    ///
    /// `position` is in host units, `scale` is a fraction (0.01 = 1%).
    pub fn exceeds(&self, position: f32, scale: f32) -> bool {
        self.x.abs() > position
            || self.y.abs() > position
            || (self.scale_x - 1.0).abs() > scale
            || (self.scale_y - 1.0).abs() > scale
    }

    pub fn is_identity(&self, epsilon: f32) -> bool {
        !self.exceeds(epsilon, epsilon)
    }
}

fn size_ratio(from: f32, to: f32) -> f32 {
    if to.abs() <= f32::EPSILON {
        1.0
    } else {
        from / to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_size_is_clamped() {
        let b = BoundingBox::new(5.0, 5.0, -3.0, 10.0);
        assert_eq!(b.width, 0.0);
        assert_eq!(b.height, 10.0);
    }

    #[test]
    fn test_delta_reproduces_source_geometry() {
        let a = BoundingBox::new(10.0, 20.0, 100.0, 50.0);
        let b = BoundingBox::new(40.0, 0.0, 200.0, 25.0);
        let delta = TransformDelta::between(&a, &b);

        assert_eq!(delta.x, -30.0);
        assert_eq!(delta.y, 20.0);
        assert_eq!(delta.scale_x, 0.5);
        assert_eq!(delta.scale_y, 2.0);
        assert_eq!(delta.apply(&b), a);
    }

    #[test]
    fn test_round_trip_is_identity() {
        let a = BoundingBox::new(3.0, 7.5, 120.0, 33.0);
        let b = BoundingBox::new(-12.0, 90.0, 64.0, 81.0);
        let there = TransformDelta::between(&a, &b);
        let back = TransformDelta::between(&b, &a);
        let composed = there.then(&back);

        assert!(composed.is_identity(1e-4), "{composed:?}");
    }

    #[test]
    fn test_zero_sized_target_keeps_unit_scale() {
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let delta = TransformDelta::between(&a, &BoundingBox::zero());
        assert_eq!(delta.scale_x, 1.0);
        assert_eq!(delta.scale_y, 1.0);
    }

    #[test]
    fn test_exceeds_thresholds() {
        let jitter = TransformDelta {
            x: 0.4,
            y: -0.9,
            scale_x: 1.005,
            scale_y: 0.996,
        };
        assert!(!jitter.exceeds(1.0, 0.01));

        let moved = TransformDelta { x: 1.5, ..jitter };
        assert!(moved.exceeds(1.0, 0.01));

        let grown = TransformDelta {
            scale_y: 1.02,
            ..jitter
        };
        assert!(grown.exceeds(1.0, 0.01));
    }

    #[test]
    fn test_inverse_undoes_delta() {
        let delta = TransformDelta {
            x: 4.0,
            y: -2.0,
            scale_x: 2.0,
            scale_y: 0.25,
        };
        let inv = delta.inverse();
        assert_eq!(inv.x, -4.0);
        assert_eq!(inv.scale_x, 0.5);
        assert_eq!(inv.scale_y, 4.0);
    }
}
