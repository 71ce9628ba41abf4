//! The motion controller: commanded movement, forced movement, pathing.
//!
//! Per tick the controller derives a velocity for every entity with a
//! [`MotionState`] from its intent and CC status, then integrates. Forced
//! movement (dash/knockback) overrides commanded motion entirely and is NOT
//! cancelled by CC; `can_move == false` only zeroes the commanded velocity
//! for the tick.
//!
//! Pathing is a consumed interface: any [`PathProvider`] returning finite
//! waypoint lists works. A champion re-paths only when the goal drifts more
//! than [`REPATH_DRIFT`] from what the current path was computed for, or
//! when the waypoint queue runs dry. A `None` path stops the champion until
//! the next command.

use riftline_world::entity::EntityId;
use riftline_world::math::Vec2;
use riftline_world::motion::{ForcedMovement, ForcedMovementKind, MovementIntent};
use riftline_world::records::ImmunityTag;
use riftline_world::store::World;

use riftline_catalog::map::MapBounds;
use riftline_catalog::Catalog;

use crate::effect::cc_status;
use crate::stats::StatSheet;

/// Goal drift beyond which the current waypoint list is recomputed.
pub const REPATH_DRIFT: f64 = 100.0;

/// Distance at which a waypoint counts as reached.
const WAYPOINT_ARRIVE: f64 = 4.0;

/// Fraction of attack range at which pursuit stops.
const PURSUIT_RANGE_FACTOR: f64 = 0.9;

// ---------------------------------------------------------------------------
// PathProvider
// ---------------------------------------------------------------------------

/// The pathing dependency. The core mandates no algorithm; any monotonic
/// grid-based pathfinder producing finite waypoint lists is acceptable.
pub trait PathProvider {
    /// A waypoint list from `from` to `to`, or `None` when unreachable.
    fn find_path(&self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>>;
}

/// Straight-line provider: a single waypoint at the goal. The default for
/// open maps and the provider the test suites run on.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectPath;

impl PathProvider for DirectPath {
    fn find_path(&self, _from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
        Some(vec![to])
    }
}

// ---------------------------------------------------------------------------
// Forced movement entry point
// ---------------------------------------------------------------------------

/// Try to start a forced movement on an entity.
///
/// Knockbacks are refused by [`ImmunityTag::Knockback`] holders; dashes are
/// always accepted. An already-running forced movement is replaced (the new
/// impulse wins).
pub fn push_forced(world: &mut World, target: EntityId, forced: ForcedMovement) -> bool {
    let Some(record) = world.get_mut(target) else {
        return false;
    };
    if forced.kind == ForcedMovementKind::Knockback {
        if let Some(damageable) = record.damageable.as_ref() {
            if damageable.is_immune_to(ImmunityTag::Knockback) {
                return false;
            }
        }
    }
    let Some(motion) = record.motion.as_mut() else {
        return false;
    };
    motion.forced = Some(forced);
    true
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Advance commanded and forced movement for every motioned entity and
/// integrate positions. Projectiles fly in their own module; zones do not
/// move.
pub fn drive(
    world: &mut World,
    catalog: &Catalog,
    provider: &dyn PathProvider,
    bounds: &MapBounds,
    dt: f64,
) {
    for id in world.ids() {
        let Some(record) = world.get(id) else { continue };
        if record.dead || record.motion.is_none() {
            continue;
        }

        // Derived inputs before taking the mutable borrow.
        let position = record.position;
        let cc = record
            .damageable
            .as_ref()
            .map(|d| cc_status(&d.effects, catalog))
            .unwrap_or_default();
        let speed = match record.champion.as_deref() {
            Some(state) => match catalog.champion(state.champion) {
                Ok(def) => StatSheet::derive(state, def).move_speed,
                Err(_) => 0.0,
            },
            None => record.motion.as_ref().map_or(0.0, |m| m.base_speed),
        };
        let attack_stop_range = record.champion.as_deref().and_then(|state| {
            catalog
                .champion(state.champion)
                .ok()
                .map(|def| StatSheet::derive(state, def).attack_range * PURSUIT_RANGE_FACTOR)
        });
        let target_pos = match record.motion.as_ref().map(|m| m.intent) {
            Some(MovementIntent::AttackTarget(target)) => world
                .get(target)
                .filter(|t| !t.dead)
                .map(|t| t.position),
            _ => None,
        };

        let Some(record) = world.get_mut(id) else { continue };
        let Some(motion) = record.motion.as_mut() else { continue };

        // Forced movement overrides everything and ignores CC.
        if let Some(mut forced) = motion.forced.take() {
            if forced.is_active() {
                let forced_speed = forced.remaining_distance / forced.remaining_duration;
                let step = (forced_speed * dt).min(forced.remaining_distance);
                record.position += forced.direction * step;
                forced.remaining_distance -= step;
                forced.remaining_duration -= dt;
                motion.velocity = Vec2::ZERO;
                if forced.is_active() {
                    motion.forced = Some(forced);
                }
                record.position = bounds.clamp(record.position);
                continue;
            }
        }

        // Rooted/stunned: commanded velocity is zeroed for the tick, the
        // command itself survives.
        if !cc.can_move {
            motion.velocity = Vec2::ZERO;
            continue;
        }

        let goal = match motion.intent {
            MovementIntent::None => {
                motion.velocity = Vec2::ZERO;
                continue;
            }
            MovementIntent::MoveTo(p) | MovementIntent::AttackMoveTo(p) => Some(p),
            MovementIntent::AttackTarget(_) => match target_pos {
                Some(p) => {
                    // Close enough to swing: hold position and face the target.
                    if let Some(stop) = attack_stop_range {
                        if position.distance(p) <= stop {
                            motion.velocity = Vec2::ZERO;
                            motion.waypoints.clear();
                            motion.path_goal = None;
                            record.facing = (p - position).angle();
                            continue;
                        }
                    }
                    Some(p)
                }
                None => {
                    // Target gone; drop the command.
                    motion.clear_command();
                    continue;
                }
            },
        };
        let Some(goal) = goal else { continue };

        // Re-path when the goal drifted or the queue ran dry.
        let needs_path = match motion.path_goal {
            Some(previous) => previous.distance(goal) > REPATH_DRIFT || motion.waypoints.is_empty(),
            None => true,
        };
        if needs_path {
            motion.waypoints.clear();
            match provider.find_path(position, goal) {
                Some(path) => {
                    motion.waypoints.extend(path);
                    motion.path_goal = Some(goal);
                }
                None => {
                    // Unreachable: stop until the next command.
                    motion.clear_command();
                    continue;
                }
            }
        }

        // Walk the waypoint queue.
        while let Some(&next) = motion.waypoints.front() {
            if position.distance(next) <= WAYPOINT_ARRIVE {
                motion.waypoints.pop_front();
            } else {
                break;
            }
        }
        let Some(&next) = motion.waypoints.front() else {
            // Arrived.
            if matches!(motion.intent, MovementIntent::MoveTo(_) | MovementIntent::AttackMoveTo(_))
            {
                motion.intent = MovementIntent::None;
            }
            motion.velocity = Vec2::ZERO;
            motion.path_goal = None;
            continue;
        };

        let to_next = next - position;
        let distance = to_next.length();
        let dir = to_next.normalized_or_zero();
        let step = (speed * dt).min(distance);
        motion.velocity = dir * speed;
        record.position += dir * step;
        record.position = bounds.clamp(record.position);
        if dir != Vec2::ZERO {
            record.facing = dir.angle();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
