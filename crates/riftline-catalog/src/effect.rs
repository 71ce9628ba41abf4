//! Effect definitions: buffs, debuffs, CC, DoT/HoT, shields, auras.

use serde::{Deserialize, Serialize};

use riftline_world::champion::StatKind;
use riftline_world::ids::EffectId;
use riftline_world::records::DamageTemplate;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Broad classification of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectCategory {
    /// Beneficial stat or state change.
    Buff,
    /// Hostile stat or state change.
    Debuff,
    /// Crowd control; carries a [`CcKind`].
    Cc,
    /// Damage over time.
    Dot,
    /// Healing over time.
    Hot,
    /// Grants a shield on application.
    Shield,
    /// Team-wide area effect maintained by its source.
    Aura,
}

/// The specific crowd-control flavor of a CC effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CcKind {
    /// No movement, attacks, or casts.
    Stun,
    /// No casts.
    Silence,
    /// No movement.
    Root,
    /// No mobility abilities (dashes); walking allowed.
    Ground,
    /// No basic attacks.
    Disarm,
    /// Airborne: no movement, attacks, or casts; not cleansable by design.
    Knockup,
}

// ---------------------------------------------------------------------------
// Stacking
// ---------------------------------------------------------------------------

/// What happens when an effect is applied to an entity that already has it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackPolicy {
    /// Reset the remaining duration to the definition's duration.
    Refresh,
    /// Add the new duration onto the remaining time.
    Extend,
    /// Increment the stack count up to the cap, refreshing duration.
    Stack(u32),
    /// Drop the old instance and apply the new one.
    Replace,
    /// Keep the old instance; the new application is discarded.
    Ignore,
}

/// Where an effect's duration comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DurationSource {
    /// A fixed number of seconds.
    Fixed(f64),
    /// Scales with the rank of the applying ability.
    PerRank {
        /// Duration at rank 1.
        base: f64,
        /// Added per rank above 1.
        per_rank: f64,
    },
}

impl DurationSource {
    /// Resolve the duration for an application at the given ability rank.
    /// Rank 0 (not rank-driven) resolves `PerRank` at its base.
    pub fn resolve(self, rank: u8) -> f64 {
        match self {
            DurationSource::Fixed(d) => d,
            DurationSource::PerRank { base, per_rank } => {
                base + per_rank * rank.saturating_sub(1) as f64
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Stat modification template
// ---------------------------------------------------------------------------

/// A stat adjustment carried by an effect definition. The live instance adds
/// the source when it lands on a champion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModTemplate {
    /// Which stat is adjusted.
    pub stat: StatKind,
    /// Flat adjustment.
    pub flat: f64,
    /// Percent adjustment (0.1 = +10%), applied after all flats.
    pub percent: f64,
}

// ---------------------------------------------------------------------------
// EffectDef
// ---------------------------------------------------------------------------

/// A read-only effect definition from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDef {
    /// Catalog id.
    pub id: EffectId,
    /// Display name.
    pub name: String,
    /// Broad category.
    pub category: EffectCategory,
    /// CC flavor, for `Cc`-category effects.
    pub cc: Option<CcKind>,
    /// Stat adjustments while the effect is active.
    pub stat_mods: Vec<StatModTemplate>,
    /// Interval between periodic payloads; `None` for non-periodic effects.
    pub tick_interval: Option<f64>,
    /// Damage dealt on each periodic tick (DoT).
    pub periodic_damage: Option<DamageTemplate>,
    /// Health restored on each periodic tick (HoT).
    pub periodic_heal: Option<f64>,
    /// Shield amount granted on application (Shield category).
    pub shield_amount: Option<f64>,
    /// Whether cleanse-type abilities can remove it.
    pub cleansable: bool,
    /// Whether the effect survives its holder's death.
    pub persists_through_death: bool,
    /// Behavior when re-applied while active.
    pub stacking: StackPolicy,
    /// Where the duration comes from.
    pub duration: DurationSource,
}

impl EffectDef {
    /// A minimal definition: fixed duration, refresh stacking, no payload.
    /// Builder-style setters fill in the rest; content files and tests
    /// compose definitions from this.
    pub fn new(id: EffectId, name: &str, category: EffectCategory, duration: f64) -> Self {
        Self {
            id,
            name: name.to_owned(),
            category,
            cc: None,
            stat_mods: Vec::new(),
            tick_interval: None,
            periodic_damage: None,
            periodic_heal: None,
            shield_amount: None,
            cleansable: true,
            persists_through_death: false,
            stacking: StackPolicy::Refresh,
            duration: DurationSource::Fixed(duration),
        }
    }

    /// Set the CC kind (and category, if the caller forgot).
    pub fn with_cc(mut self, cc: CcKind) -> Self {
        self.cc = Some(cc);
        self
    }

    /// Add a stat modification.
    pub fn with_stat_mod(mut self, stat: StatKind, flat: f64, percent: f64) -> Self {
        self.stat_mods.push(StatModTemplate { stat, flat, percent });
        self
    }

    /// Set a periodic payload interval.
    pub fn with_tick_interval(mut self, interval: f64) -> Self {
        self.tick_interval = Some(interval);
        self
    }

    /// Set periodic damage (DoT).
    pub fn with_periodic_damage(mut self, damage: DamageTemplate) -> Self {
        self.periodic_damage = Some(damage);
        self
    }

    /// Set a shield amount (Shield category).
    pub fn with_shield(mut self, amount: f64) -> Self {
        self.shield_amount = Some(amount);
        self
    }

    /// Set the stacking policy.
    pub fn with_stacking(mut self, stacking: StackPolicy) -> Self {
        self.stacking = stacking;
        self
    }

    /// Mark the effect as surviving death.
    pub fn persists(mut self) -> Self {
        self.persists_through_death = true;
        self
    }

    /// Mark the effect as uncleansable.
    pub fn uncleansable(mut self) -> Self {
        self.cleansable = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use riftline_world::records::DamageKind;

    #[test]
    fn duration_resolution() {
        assert_eq!(DurationSource::Fixed(2.5).resolve(3), 2.5);
        let scaling = DurationSource::PerRank {
            base: 1.0,
            per_rank: 0.5,
        };
        assert_eq!(scaling.resolve(1), 1.0);
        assert_eq!(scaling.resolve(3), 2.0);
        // Rank 0 resolves at base rather than underflowing.
        assert_eq!(scaling.resolve(0), 1.0);
    }

    #[test]
    fn builder_composition() {
        let def = EffectDef::new(EffectId(7), "ignite", EffectCategory::Dot, 4.0)
            .with_tick_interval(1.0)
            .with_periodic_damage(DamageTemplate {
                amount: 20.0,
                kind: DamageKind::True,
            })
            .uncleansable();
        assert_eq!(def.tick_interval, Some(1.0));
        assert!(!def.cleansable);
        assert!(def.periodic_damage.is_some());
        assert_eq!(def.stacking, StackPolicy::Refresh);
    }
}
