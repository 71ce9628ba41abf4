//! Movement state: commanded intents, forced movement, waypoints.
//!
//! The motion *controller* lives in the simulation crate; this module is the
//! data it operates on. Commanded motion derives per-tick velocity from the
//! intent; forced movement (dashes, knockbacks) overrides commanded motion
//! entirely while it runs and is not cancelled by CC.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::entity::EntityId;
use crate::math::Vec2;

// ---------------------------------------------------------------------------
// MovementIntent
// ---------------------------------------------------------------------------

/// What the entity is trying to do under its own power.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum MovementIntent {
    /// Hold position.
    #[default]
    None,
    /// Walk to a point.
    MoveTo(Vec2),
    /// Walk to a point, attacking targets of opportunity on the way.
    AttackMoveTo(Vec2),
    /// Pursue and attack a specific entity.
    AttackTarget(EntityId),
}

// ---------------------------------------------------------------------------
// ForcedMovement
// ---------------------------------------------------------------------------

/// The flavor of a forced displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForcedMovementKind {
    /// Self-initiated dash; not refused by knockback immunity.
    Dash,
    /// Hostile displacement; refused by holders of the knockback
    /// immunity tag.
    Knockback,
}

/// An in-flight dash or knockback.
///
/// Overrides commanded motion while active. Expires when either the distance
/// or the duration is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForcedMovement {
    /// Unit travel direction.
    pub direction: Vec2,
    /// World units left to travel.
    pub remaining_distance: f64,
    /// Seconds left before the movement ends regardless of distance.
    pub remaining_duration: f64,
    /// Dash or knockback.
    pub kind: ForcedMovementKind,
}

impl ForcedMovement {
    /// Whether the movement still has distance and time left.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining_distance > 0.0 && self.remaining_duration > 0.0
    }
}

// ---------------------------------------------------------------------------
// MotionState
// ---------------------------------------------------------------------------

/// Per-entity movement state for entities that move under their own power.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionState {
    /// Current commanded intent.
    pub intent: MovementIntent,
    /// Active forced movement, if any.
    pub forced: Option<ForcedMovement>,
    /// Remaining waypoints from the path provider, front first.
    pub waypoints: VecDeque<Vec2>,
    /// The destination the current waypoint list was computed for. Used to
    /// decide when the target has drifted far enough to re-path.
    pub path_goal: Option<Vec2>,
    /// Velocity applied during the last integration step.
    pub velocity: Vec2,
    /// Walk speed for entities without a stat sheet (minions, jungle
    /// monsters). Champions derive speed from stats instead.
    pub base_speed: f64,
}

impl MotionState {
    /// Drop the commanded intent and path, keeping forced movement running.
    pub fn clear_command(&mut self) {
        self.intent = MovementIntent::None;
        self.waypoints.clear();
        self.path_goal = None;
        self.velocity = Vec2::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
