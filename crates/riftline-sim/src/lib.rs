//! Riftline simulation -- the deterministic gameplay core.
//!
//! Everything between the entity store and the network edge: the spatial
//! grid and collision resolution, the motion controller, stat derivation,
//! effects and CC, damage, the animation-keyframed action scheduler,
//! ability execution, projectiles and zones, the event bus, and reward
//! bookkeeping.
//!
//! The session crate owns the tick loop that sequences these modules; each
//! module here is a set of free functions over the
//! [`World`](riftline_world::store::World), dispatching on entity kind tags
//! rather than trait objects, so the whole simulation stays single-writer
//! and deterministic.
//!
//! # Determinism
//!
//! - Entity iteration is slot-ordered, never hash-map-ordered.
//! - Grid query results are id-sorted before use.
//! - Every random choice draws from the session
//!   [`SessionRng`](riftline_world::rng::SessionRng).
//! - The scheduler breaks trigger-time ties by `(entity, insertion order)`.

#![deny(unsafe_code)]

pub mod ability;
pub mod collision;
pub mod damage;
pub mod death;
pub mod effect;
pub mod events;
pub mod grid;
pub mod motion;
pub mod projectile;
pub mod reward;
pub mod scheduler;
pub mod stats;
pub mod upkeep;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::ability::{cast, execute_actions, CastFailReason};
    pub use crate::collision::{resolve, CollisionReport};
    pub use crate::damage::{deal_damage, mitigate, DamageOutcome, Penetration};
    pub use crate::death::{process_deaths, process_respawns};
    pub use crate::effect::{apply_effect, cc_status, update_effects, CcStatus};
    pub use crate::events::{EventBus, EventSink, GameEvent};
    pub use crate::grid::SpatialGrid;
    pub use crate::motion::{DirectPath, PathProvider};
    pub use crate::scheduler::{
        ActionKind, ActionPayload, ActionScheduler, CastSnapshot, ScheduledAction, TargetSelection,
    };
    pub use crate::stats::{derived, StatSheet};
}
