//! The priority filter: how often each visible entity is sent to a client.
//!
//! Priority derives from entity kind and distance to the client's champion.
//! Champions, structures and projectiles inside the critical distance are
//! `Critical`; everything else falls into High/Medium/Low distance bands.
//! Cadence is overridden for entities new to the client, entities whose
//! authoritative position drifted past the movement threshold since the
//! last delta (regardless of band -- this closes the frozen-entity desync),
//! and entities that hit the liveness ceiling. A client with no champion
//! receives every visible entity every tick.

use serde::{Deserialize, Serialize};

use riftline_world::records::EntityKind;

use riftline_catalog::config::SessionConfig;

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Send-frequency band for one entity/client pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// Sent every tick.
    Critical,
    /// Sent every 2 ticks.
    High,
    /// Sent every 5 ticks.
    Medium,
    /// Sent every 15 ticks.
    Low,
}

impl Priority {
    /// The band's send interval in ticks.
    #[inline]
    pub fn cadence(self) -> u64 {
        match self {
            Priority::Critical => 1,
            Priority::High => 2,
            Priority::Medium => 5,
            Priority::Low => 15,
        }
    }
}

/// Kinds eligible for the Critical band.
#[inline]
fn is_critical_kind(kind: EntityKind) -> bool {
    kind == EntityKind::Champion || kind == EntityKind::Projectile || kind.is_structure()
}

/// Classify one entity for one client by kind and distance to the client's
/// champion.
pub fn classify(kind: EntityKind, distance: f64, config: &SessionConfig) -> Priority {
    if is_critical_kind(kind) && distance <= config.priority_critical_distance {
        return Priority::Critical;
    }
    if distance <= config.priority_high_distance {
        Priority::High
    } else if distance <= config.priority_medium_distance {
        Priority::Medium
    } else {
        Priority::Low
    }
}

// ---------------------------------------------------------------------------
// Send decision
// ---------------------------------------------------------------------------

/// Everything the cadence decision needs about one entity this tick.
#[derive(Debug, Clone, Copy)]
pub struct SendContext {
    /// Never sent to this client before.
    pub is_new: bool,
    /// Authoritative position drift since the last delta exceeds the
    /// movement threshold.
    pub moved_past_threshold: bool,
    /// Ticks since this entity was last sent to this client.
    pub ticks_since_sent: u64,
    /// The client has no live champion (dead or disconnected player).
    pub no_champion: bool,
}

/// Whether the entity is sent this tick.
pub fn should_send(priority: Priority, ctx: SendContext, config: &SessionConfig) -> bool {
    if ctx.is_new || ctx.no_champion || ctx.moved_past_threshold {
        return true;
    }
    if ctx.ticks_since_sent >= u64::from(config.max_ticks_without_update) {
        return true;
    }
    ctx.ticks_since_sent >= priority.cadence()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
