//! Collision shapes and the narrow-phase overlap predicates.
//!
//! Three shapes exist in the world: circles, axis-aligned rectangles, and
//! capsules. Capsules participate in the narrow phase as circles of their
//! radius; rectangles collide with circles via the clamped-closest-point
//! test and with each other as AABB overlap.
//!
//! The central primitive is [`signed_gap`]: the signed separation between
//! two placed colliders along their center-to-center axis. A strictly
//! negative gap is an overlap; exact touch (`gap == 0`) is not.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// Geometric shape of a collider, in local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Circle with the given radius.
    Circle {
        /// Radius in world units.
        radius: f64,
    },
    /// Axis-aligned rectangle centered on the collider position.
    Rect {
        /// Full width along the x-axis.
        width: f64,
        /// Full height along the y-axis.
        height: f64,
    },
    /// Capsule standing on the collider position. The narrow phase treats it
    /// as a circle of `radius`; `height` exists for vision/render consumers.
    Capsule {
        /// Radius of the capsule body.
        radius: f64,
        /// Full height of the capsule.
        height: f64,
    },
}

impl Shape {
    /// The circle radius this shape presents to the narrow phase, or `None`
    /// for rectangles.
    #[inline]
    pub fn circle_radius(self) -> Option<f64> {
        match self {
            Shape::Circle { radius } | Shape::Capsule { radius, .. } => Some(radius),
            Shape::Rect { .. } => None,
        }
    }

    /// Half-extents of the axis-aligned bounding box.
    #[inline]
    pub fn half_extents(self) -> Vec2 {
        match self {
            Shape::Circle { radius } | Shape::Capsule { radius, .. } => Vec2::new(radius, radius),
            Shape::Rect { width, height } => Vec2::new(width / 2.0, height / 2.0),
        }
    }

    /// Radius of the smallest circle containing the bounding box. Used for
    /// conservative broad-phase queries.
    #[inline]
    pub fn bounding_radius(self) -> f64 {
        self.half_extents().length()
    }
}

// ---------------------------------------------------------------------------
// Collider
// ---------------------------------------------------------------------------

/// A shape plus its offset from the owning entity's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// The geometric shape.
    pub shape: Shape,
    /// Offset of the shape center from the entity position.
    pub offset: Vec2,
}

impl Collider {
    /// A circle collider with no offset.
    pub fn circle(radius: f64) -> Self {
        Self {
            shape: Shape::Circle { radius },
            offset: Vec2::ZERO,
        }
    }

    /// A rectangle collider with no offset.
    pub fn rect(width: f64, height: f64) -> Self {
        Self {
            shape: Shape::Rect { width, height },
            offset: Vec2::ZERO,
        }
    }

    /// A capsule collider with no offset.
    pub fn capsule(radius: f64, height: f64) -> Self {
        Self {
            shape: Shape::Capsule { radius, height },
            offset: Vec2::ZERO,
        }
    }

    /// World-space center of this collider for an entity at `position`.
    #[inline]
    pub fn center(&self, position: Vec2) -> Vec2 {
        position + self.offset
    }
}

// ---------------------------------------------------------------------------
// Narrow phase
// ---------------------------------------------------------------------------

/// Signed gap between two placed colliders.
///
/// Negative values are penetration depth along the center-to-center axis;
/// zero is exact touch; positive is clear separation. Overlap is strictly
/// `gap < 0`.
pub fn signed_gap(pos_a: Vec2, col_a: &Collider, pos_b: Vec2, col_b: &Collider) -> f64 {
    let ca = col_a.center(pos_a);
    let cb = col_b.center(pos_b);

    match (col_a.shape.circle_radius(), col_b.shape.circle_radius()) {
        (Some(ra), Some(rb)) => ca.distance(cb) - (ra + rb),
        (Some(ra), None) => circle_rect_gap(ca, ra, cb, col_b.shape.half_extents()),
        (None, Some(rb)) => circle_rect_gap(cb, rb, ca, col_a.shape.half_extents()),
        (None, None) => rect_rect_gap(ca, col_a.shape.half_extents(), cb, col_b.shape.half_extents()),
    }
}

/// Whether two placed colliders overlap. Exact touch is not a collision.
#[inline]
pub fn overlaps(pos_a: Vec2, col_a: &Collider, pos_b: Vec2, col_b: &Collider) -> bool {
    signed_gap(pos_a, col_a, pos_b, col_b) < 0.0
}

/// Clamped-closest-point distance from a circle to a rectangle, minus the
/// circle radius. A circle center inside the rectangle reports `-radius`.
fn circle_rect_gap(circle_center: Vec2, radius: f64, rect_center: Vec2, half: Vec2) -> f64 {
    let min = rect_center - half;
    let max = rect_center + half;
    let closest = circle_center.clamp(min, max);
    circle_center.distance(closest) - radius
}

/// AABB separation: the larger of the per-axis gaps, negated so that overlap
/// on both axes yields a negative value of magnitude `min(overlap_x, overlap_y)`.
fn rect_rect_gap(ca: Vec2, half_a: Vec2, cb: Vec2, half_b: Vec2) -> f64 {
    let overlap_x = (half_a.x + half_b.x) - (ca.x - cb.x).abs();
    let overlap_y = (half_a.y + half_b.y) - (ca.y - cb.y).abs();
    -overlap_x.min(overlap_y)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
