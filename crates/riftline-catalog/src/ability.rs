//! Ability definitions.
//!
//! Ability behavior variety (charge, channel, toggle, transform, ammo,
//! recast, empowered) is a set of optional sub-records composed on the
//! definition, not a class tree; execution switches on which sub-records are
//! populated.

use serde::{Deserialize, Serialize};

use riftline_world::ids::{AbilityId, AnimationId, EffectId};
use riftline_world::records::DamageTemplate;

// ---------------------------------------------------------------------------
// Targeting
// ---------------------------------------------------------------------------

/// How an ability selects its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    /// Applies to the caster instantly on cast (cannot be interrupted after
    /// the resource is spent).
    SelfCast,
    /// Requires a hostile unit target.
    TargetEnemy,
    /// Requires a friendly unit target.
    TargetAlly,
    /// Requires any unit target.
    TargetAny,
    /// Fired along a direction; hits what it meets.
    Skillshot,
    /// Cast at a ground point.
    GroundTarget,
    /// No target; centered on the caster.
    NoTarget,
}

/// Per-kind gates on what an ability can affect. Champions, minions and
/// jungle monsters default on; towers and wards default off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectFlags {
    /// May hit champions.
    pub champions: bool,
    /// May hit lane minions.
    pub minions: bool,
    /// May hit towers and other structures.
    pub towers: bool,
    /// May hit jungle monsters.
    pub jungle: bool,
    /// May hit wards.
    pub wards: bool,
}

impl Default for AffectFlags {
    fn default() -> Self {
        Self {
            champions: true,
            minions: true,
            towers: false,
            jungle: true,
            wards: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Area shape
// ---------------------------------------------------------------------------

/// The area an ability covers at its point of application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AbilityShape {
    /// Exactly the selected unit.
    Single,
    /// A line from the caster.
    Line {
        /// Length of the line.
        length: f64,
        /// Full width of the line.
        width: f64,
    },
    /// A cone opening from the caster along the aim direction.
    Cone {
        /// Cone reach.
        radius: f64,
        /// Full opening angle in radians.
        angle: f64,
    },
    /// A circle around the application point.
    Circle {
        /// Circle radius.
        radius: f64,
    },
    /// A rectangle centered on the application point.
    Rect {
        /// Full width.
        width: f64,
        /// Full height.
        height: f64,
    },
}

// ---------------------------------------------------------------------------
// Per-rank data
// ---------------------------------------------------------------------------

/// The numbers that change as an ability ranks up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityRank {
    /// Resource cost to cast.
    pub cost: f64,
    /// Cooldown in seconds.
    pub cooldown: f64,
    /// Damage dealt to each target, if the ability damages.
    pub damage: Option<DamageTemplate>,
}

// ---------------------------------------------------------------------------
// Behavior sub-records
// ---------------------------------------------------------------------------

/// Charge-up behavior: the cast is held and released.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeSpec {
    /// Maximum seconds the cast can be held before it auto-releases.
    pub max_hold: f64,
}

/// Channeled behavior: the effect persists while the caster channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Full channel duration.
    pub duration: f64,
    /// Interval between channel payloads, if periodic.
    pub tick_interval: Option<f64>,
}

/// Toggle behavior: on/off with a resource drain while on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToggleSpec {
    /// Resource drained per second while toggled on.
    pub drain_per_second: f64,
}

/// Transform behavior: swaps the kit to an alternate form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    /// The ability this slot becomes in the alternate form.
    pub alternate: AbilityId,
}

/// Ammo behavior: stores casts up to a cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmmoSpec {
    /// Maximum stored charges.
    pub max_charges: u32,
    /// Seconds to regenerate one charge.
    pub recharge_time: f64,
}

/// Recast behavior: a follow-up cast inside a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecastSpec {
    /// Seconds after the first cast during which recasting is allowed.
    pub window: f64,
    /// Number of follow-up casts allowed.
    pub max_recasts: u32,
}

/// Empowered behavior: the cast consumes passive stacks for a bonus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmpoweredSpec {
    /// Passive stacks required to empower the cast.
    pub threshold_stacks: u32,
}

// ---------------------------------------------------------------------------
// Projectile / zone payloads
// ---------------------------------------------------------------------------

/// Parameters for the projectile a `Projectile` keyframe spawns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    /// Flight speed in units per second.
    pub speed: f64,
    /// Maximum flight time in seconds.
    pub ttl: f64,
    /// Collision radius of the projectile body.
    pub radius: f64,
    /// Whether the projectile continues after its first hit.
    pub piercing: bool,
}

/// Parameters for the ground zone an `Effect` keyframe grounds when present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    /// Zone radius.
    pub radius: f64,
    /// Zone lifetime in seconds.
    pub duration: f64,
    /// Interval between zone payloads; `None` applies on entry only.
    pub tick_interval: Option<f64>,
    /// Damage per zone tick.
    pub damage: Option<DamageTemplate>,
}

// ---------------------------------------------------------------------------
// AbilityDef
// ---------------------------------------------------------------------------

/// A read-only ability definition from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDef {
    /// Catalog id.
    pub id: AbilityId,
    /// Display name.
    pub name: String,
    /// Targeting mode.
    pub target_type: TargetType,
    /// Maximum rank (1-5 for basics, 1-3 for ultimates).
    pub max_rank: u8,
    /// Per-rank numbers; index `rank - 1`.
    pub ranks: Vec<AbilityRank>,
    /// Area covered at the application point.
    pub shape: AbilityShape,
    /// Maximum cast range from the caster.
    pub range: f64,
    /// The cast animation whose keyframes drive execution.
    pub animation: AnimationId,
    /// Whether playback speed scales with the caster's cast speed.
    pub cast_speed_scaled: bool,
    /// What the ability is allowed to hit.
    pub affects: AffectFlags,
    /// Effects applied to each target hit.
    pub applies_effects: Vec<EffectId>,
    /// Projectile parameters for `Projectile` keyframes.
    pub projectile: Option<ProjectileSpec>,
    /// Zone parameters; when set, `Effect` keyframes ground a zone carrying
    /// the keyframe's effect instead of applying it directly.
    pub zone: Option<ZoneSpec>,
    /// Charge-up sub-record.
    pub charge: Option<ChargeSpec>,
    /// Channel sub-record.
    pub channel: Option<ChannelSpec>,
    /// Toggle sub-record.
    pub toggle: Option<ToggleSpec>,
    /// Transform sub-record.
    pub transform: Option<TransformSpec>,
    /// Ammo sub-record.
    pub ammo: Option<AmmoSpec>,
    /// Recast sub-record.
    pub recast: Option<RecastSpec>,
    /// Empowered sub-record.
    pub empowered: Option<EmpoweredSpec>,
}

impl AbilityDef {
    /// A single-target damage ability with uniform per-rank numbers.
    /// Content files and tests compose richer definitions from this.
    pub fn new(
        id: AbilityId,
        name: &str,
        target_type: TargetType,
        range: f64,
        animation: AnimationId,
    ) -> Self {
        Self {
            id,
            name: name.to_owned(),
            target_type,
            max_rank: 5,
            ranks: Vec::new(),
            shape: AbilityShape::Single,
            range,
            animation,
            cast_speed_scaled: false,
            affects: AffectFlags::default(),
            applies_effects: Vec::new(),
            projectile: None,
            zone: None,
            charge: None,
            channel: None,
            toggle: None,
            transform: None,
            ammo: None,
            recast: None,
            empowered: None,
        }
    }

    /// Per-rank data for a learned rank (1-based). `None` when the rank is
    /// zero or beyond the table.
    pub fn rank_data(&self, rank: u8) -> Option<&AbilityRank> {
        if rank == 0 {
            return None;
        }
        self.ranks.get(rank as usize - 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affect_flags_defaults() {
        let flags = AffectFlags::default();
        assert!(flags.champions);
        assert!(flags.minions);
        assert!(flags.jungle);
        assert!(!flags.towers);
        assert!(!flags.wards);
    }

    #[test]
    fn rank_data_bounds() {
        let mut def = AbilityDef::new(
            AbilityId(1),
            "bolt",
            TargetType::TargetEnemy,
            600.0,
            AnimationId(1),
        );
        def.ranks = vec![
            AbilityRank {
                cost: 40.0,
                cooldown: 8.0,
                damage: None,
            },
            AbilityRank {
                cost: 45.0,
                cooldown: 7.0,
                damage: None,
            },
        ];
        assert!(def.rank_data(0).is_none());
        assert_eq!(def.rank_data(1).unwrap().cost, 40.0);
        assert_eq!(def.rank_data(2).unwrap().cooldown, 7.0);
        assert!(def.rank_data(3).is_none());
    }
}
