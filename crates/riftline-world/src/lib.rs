//! Riftline world model -- entity records, shapes, ids, and the session PRNG.
//!
//! This crate is the shared vocabulary of the Riftline server core: 2D math,
//! collision shapes, generational entity ids, the entity store, and the
//! composition-based entity data model (a tagged [`records::EntityRecord`]
//! with optional damageable/champion/projectile/zone/ward sub-records).
//!
//! Higher layers hold [`entity::EntityId`] handles; the
//! [`store::World`] owns every record for the lifetime of a session.
//!
//! # Quick Start
//!
//! ```
//! use riftline_world::prelude::*;
//!
//! let mut world = World::new();
//! let id = world.insert(EntityRecord::new(
//!     EntityKind::Minion,
//!     Team::Blue,
//!     Vec2::new(100.0, 50.0),
//!     Collider::circle(20.0),
//! ));
//!
//! assert!(world.contains(id));
//! assert_eq!(world.get(id).unwrap().kind, EntityKind::Minion);
//! ```

#![deny(unsafe_code)]

pub mod champion;
pub mod entity;
pub mod ids;
pub mod math;
pub mod motion;
pub mod records;
pub mod rng;
pub mod shape;
pub mod store;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by world-model operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity} does not exist (stale or never allocated)")]
    StaleEntity {
        /// The offending handle.
        entity: entity::EntityId,
    },

    /// A pairwise operation was asked for the same entity twice.
    #[error("pairwise access requires two distinct entities, got {entity} twice")]
    SameEntityPair {
        /// The duplicated handle.
        entity: entity::EntityId,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::champion::{
        AbilitySlot, AbilitySlotState, ChampionState, ModSource, PassiveState, StatKind,
        StatModifier, ABILITY_SLOTS, INVENTORY_SLOTS, MAX_LEVEL, MIN_LEVEL,
    };
    pub use crate::entity::{EntityAllocator, EntityId};
    pub use crate::ids::{
        AbilityId, AnimationId, ChampionId, EffectId, ItemId, PassiveId, PlayerId, SoundId, VfxId,
    };
    pub use crate::math::Vec2;
    pub use crate::motion::{ForcedMovement, ForcedMovementKind, MotionState, MovementIntent};
    pub use crate::records::{
        ActiveEffect, Damageable, DamageKind, DamageTemplate, EntityKind, EntityRecord,
        ImmunityTag, ProjectileAim, ProjectileState, RecentDamage, Shield, Team, WardState,
        ZoneState,
    };
    pub use crate::rng::SessionRng;
    pub use crate::shape::{overlaps, signed_gap, Collider, Shape};
    pub use crate::store::World;
    pub use crate::WorldError;
}
