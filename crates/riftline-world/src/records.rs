//! Entity records: the shared data model for every live object.
//!
//! All live objects share an [`EntityRecord`] -- id, kind tag, team, pose,
//! collider, mass. Kinds that can take damage additionally carry a
//! [`Damageable`] sub-record; champions carry a
//! [`ChampionState`](crate::champion::ChampionState); projectiles, zones and
//! wards each have their own small sub-record. Shared behavior is free
//! functions dispatching on the kind tag, not an inheritance tree.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;

use crate::champion::ChampionState;
use crate::entity::EntityId;
use crate::ids::{AbilityId, EffectId};
use crate::math::Vec2;
use crate::motion::MotionState;
use crate::shape::Collider;

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// The faction an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Team {
    /// The blue side.
    Blue,
    /// The red side.
    Red,
    /// Jungle camps and other unaligned entities.
    Neutral,
}

impl Team {
    /// Whether `other` is a hostile team. Neutral is hostile to both sides
    /// but not to itself.
    #[inline]
    pub fn is_hostile_to(self, other: Team) -> bool {
        self != other
    }

    /// The opposing player team, or `None` for neutral.
    pub fn opponent(self) -> Option<Team> {
        match self {
            Team::Blue => Some(Team::Red),
            Team::Red => Some(Team::Blue),
            Team::Neutral => None,
        }
    }
}

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// The kind tag shared by every entity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A player-controlled champion.
    Champion,
    /// A lane minion.
    Minion,
    /// A defensive tower.
    Tower,
    /// An inhibitor structure.
    Inhibitor,
    /// The team nexus; destroying it ends the game.
    Nexus,
    /// A neutral jungle monster camp.
    JungleCamp,
    /// An in-flight projectile.
    Projectile,
    /// A vision ward.
    Ward,
    /// A persistent ground zone.
    Zone,
}

impl EntityKind {
    /// Towers, inhibitors and nexuses are structures: immobile, infinite
    /// mass, always visible to their own team.
    #[inline]
    pub fn is_structure(self) -> bool {
        matches!(self, EntityKind::Tower | EntityKind::Inhibitor | EntityKind::Nexus)
    }

    /// Whether this kind participates in collision resolution by default.
    /// Projectiles, wards and zones overlap freely.
    #[inline]
    pub fn default_collidable(self) -> bool {
        !matches!(self, EntityKind::Projectile | EntityKind::Ward | EntityKind::Zone)
    }
}

// ---------------------------------------------------------------------------
// Damage vocabulary
// ---------------------------------------------------------------------------

/// The three damage lanes. Physical is reduced by armor, magical by magic
/// resist, true damage by nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageKind {
    /// Reduced by armor.
    Physical,
    /// Reduced by magic resist.
    Magical,
    /// Bypasses all reduction.
    True,
}

/// A raw damage amount plus its lane, before resistances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageTemplate {
    /// Raw pre-mitigation amount.
    pub amount: f64,
    /// Which lane the damage travels on.
    pub kind: DamageKind,
}

// ---------------------------------------------------------------------------
// Shields and immunities
// ---------------------------------------------------------------------------

/// One entry in a damageable entity's shield stack.
///
/// Shields absorb damage before health, oldest entry first. An entry with
/// `amount == 0` or `remaining <= 0` is dropped at the end of the effect
/// update for the tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    /// Absorption remaining.
    pub amount: f64,
    /// Seconds until the shield expires.
    pub remaining: f64,
    /// The effect that granted the shield.
    pub source: EffectId,
}

/// Tags that make an entity ignore whole classes of hostile interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImmunityTag {
    /// New knockback/dash impulses are refused; an already-running forced
    /// movement is unaffected.
    Knockback,
    /// Crowd-control effects are refused on application.
    CrowdControl,
}

// ---------------------------------------------------------------------------
// Active effects
// ---------------------------------------------------------------------------

/// One recent damage contribution, kept for kill credit and the assist
/// window. Pruned as entries age past the combat timeout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecentDamage {
    /// Who dealt the damage.
    pub source: EntityId,
    /// Simulation time of the hit.
    pub at: f64,
}

/// A live instance of a catalog effect on an entity.
///
/// The definition (category, CC kind, stat mods, stacking policy) lives in
/// the catalog; the instance tracks only time and stacks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    /// Which effect definition this instantiates.
    pub effect: EffectId,
    /// Seconds until the effect falls off.
    pub remaining: f64,
    /// Seconds until the next periodic payload, for DoT/HoT effects.
    pub next_tick_in: f64,
    /// Current stack count (1 for non-stacking effects).
    pub stacks: u32,
    /// The entity that applied the effect.
    pub source: EntityId,
}

// ---------------------------------------------------------------------------
// Damageable
// ---------------------------------------------------------------------------

/// Sub-record for entities that can take damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Damageable {
    /// Current health. Invariant: `0 <= health <= max_health`.
    pub health: f64,
    /// Maximum health.
    pub max_health: f64,
    /// Armor; reduces physical damage.
    pub armor: f64,
    /// Magic resist; reduces magical damage.
    pub magic_resist: f64,
    /// Active shields, oldest first.
    pub shields: SmallVec<[Shield; 2]>,
    /// Immunity tags currently held.
    pub immunities: BTreeSet<ImmunityTag>,
    /// Active effect instances.
    pub effects: Vec<ActiveEffect>,
    /// Recent damage contributions, newest last.
    pub recent_damagers: Vec<RecentDamage>,
}

impl Damageable {
    /// A full-health damageable block with the given pools and resists.
    pub fn new(max_health: f64, armor: f64, magic_resist: f64) -> Self {
        Self {
            health: max_health,
            max_health,
            armor,
            magic_resist,
            shields: SmallVec::new(),
            immunities: BTreeSet::new(),
            effects: Vec::new(),
            recent_damagers: Vec::new(),
        }
    }

    /// Total absorption remaining across the shield stack.
    pub fn total_shield(&self) -> f64 {
        self.shields.iter().map(|s| s.amount).sum()
    }

    /// Whether the entity holds the given immunity tag.
    #[inline]
    pub fn is_immune_to(&self, tag: ImmunityTag) -> bool {
        self.immunities.contains(&tag)
    }
}

// ---------------------------------------------------------------------------
// Projectile / zone / ward sub-records
// ---------------------------------------------------------------------------

/// How a projectile steers: a fixed direction or a homing target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileAim {
    /// Straight flight along a unit direction.
    Direction(Vec2),
    /// Homing on a target entity; expires if the target disappears.
    Target(EntityId),
}

/// Sub-record for in-flight projectiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    /// Where the projectile was spawned (the caster position at fire time).
    pub origin: Vec2,
    /// Steering mode.
    pub aim: ProjectileAim,
    /// Flight speed in units per second.
    pub speed: f64,
    /// Seconds of flight remaining before despawn.
    pub remaining_ttl: f64,
    /// Whether the projectile keeps flying through targets it hits.
    pub piercing: bool,
    /// Effects applied to each target hit.
    pub on_hit_effects: SmallVec<[EffectId; 2]>,
    /// Damage dealt to each target hit, if any.
    pub damage: Option<DamageTemplate>,
    /// The ability that fired the projectile; drives affect-flag gating.
    /// `None` falls back to the default flags.
    pub ability: Option<AbilityId>,
    /// Targets already struck; piercing projectiles never hit twice.
    pub already_hit: Vec<EntityId>,
}

/// Sub-record for persistent ground zones. The zone's circle is its collider;
/// the zone owns its tick timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    /// Seconds until the zone expires.
    pub remaining: f64,
    /// Interval between periodic payloads; `None` applies on entry only.
    pub tick_interval: Option<f64>,
    /// Seconds until the next periodic payload.
    pub next_tick_in: f64,
    /// Damage applied per tick to hostile entities inside.
    pub damage: Option<DamageTemplate>,
    /// Effect applied per tick to hostile entities inside.
    pub effect: Option<EffectId>,
}

/// Sub-record for vision wards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WardState {
    /// Seconds of ward lifetime remaining.
    pub remaining: f64,
    /// The player that placed the ward, for the per-player ward cap.
    pub placed_by: crate::ids::PlayerId,
}

// ---------------------------------------------------------------------------
// EntityRecord
// ---------------------------------------------------------------------------

/// The record shared by every live object in a session.
///
/// Invariants: the id is unique across the session; a dead entity keeps its
/// id until the end-of-tick removal commit; `position` is always finite
/// (collision resolution clamps and logs rather than letting NaN escape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Unique, stable id. Assigned by the store on insert.
    pub id: EntityId,
    /// Kind tag driving behavior dispatch.
    pub kind: EntityKind,
    /// Owning team.
    pub team: Team,
    /// World position.
    pub position: Vec2,
    /// Facing angle in radians.
    pub facing: f64,
    /// Collision shape and offset.
    pub collider: Collider,
    /// Mass for separation weighting. `f64::INFINITY` for structures.
    pub mass: f64,
    /// Whether the entity takes part in collision resolution.
    pub collidable: bool,
    /// Phased out of collision but still simulated (e.g. mid-dash passthrough).
    pub intangible: bool,
    /// Set when health reaches zero; the record survives until end of tick.
    pub dead: bool,
    /// How far this entity grants vision for its team. Zero for kinds that
    /// are not vision sources.
    pub sight_range: f64,
    /// The entity that created this one (projectiles, zones, wards).
    pub owner: Option<EntityId>,
    /// Damage-taking extension.
    pub damageable: Option<Damageable>,
    /// Champion extension.
    pub champion: Option<Box<ChampionState>>,
    /// Projectile extension.
    pub projectile: Option<ProjectileState>,
    /// Zone extension.
    pub zone: Option<ZoneState>,
    /// Ward extension.
    pub ward: Option<WardState>,
    /// Movement state for entities that move under their own power.
    pub motion: Option<MotionState>,
}

impl EntityRecord {
    /// A minimal record of the given kind at a position. The id is a
    /// placeholder until the store assigns a real one on insert.
    pub fn new(kind: EntityKind, team: Team, position: Vec2, collider: Collider) -> Self {
        Self {
            id: EntityId::new(u32::MAX, u32::MAX),
            kind,
            team,
            position,
            facing: 0.0,
            collider,
            mass: if kind.is_structure() { f64::INFINITY } else { 1.0 },
            collidable: kind.default_collidable(),
            intangible: false,
            dead: false,
            sight_range: 0.0,
            owner: None,
            damageable: None,
            champion: None,
            projectile: None,
            zone: None,
            ward: None,
            motion: None,
        }
    }

    /// Whether the entity is alive and participates in collision.
    #[inline]
    pub fn blocks_collision(&self) -> bool {
        self.collidable && !self.dead && !self.intangible
    }

    /// Whether the entity has infinite mass and never yields ground.
    #[inline]
    pub fn is_immovable(&self) -> bool {
        self.mass.is_infinite()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
