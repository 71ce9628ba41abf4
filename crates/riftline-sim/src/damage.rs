//! Damage computation and application.
//!
//! The mitigation curve is `100 / (100 + resist)` for non-negative resist
//! and `2 - 100 / (100 - resist)` for negative resist (amplification).
//! Percent and flat penetration are applied to the resist before the curve;
//! a configurable ceiling caps total mitigation. True damage skips the
//! curve entirely. Applied damage is absorbed by shields oldest-first, then
//! health.

use riftline_world::entity::EntityId;
use riftline_world::records::{DamageKind, DamageTemplate, Damageable, RecentDamage};
use riftline_world::store::World;

use riftline_catalog::config::SessionConfig;

use crate::events::{EventBus, GameEvent};
use crate::stats::StatSheet;

// ---------------------------------------------------------------------------
// Penetration
// ---------------------------------------------------------------------------

/// Resist penetration carried by a damage source.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Penetration {
    /// Fraction of resist ignored, applied first (0.3 = ignore 30%).
    pub percent: f64,
    /// Flat resist subtracted after the percent cut.
    pub flat: f64,
}

// ---------------------------------------------------------------------------
// Mitigation
// ---------------------------------------------------------------------------

/// The reduction multiplier for a given effective resist.
#[inline]
pub fn reduction_multiplier(resist: f64) -> f64 {
    if resist >= 0.0 {
        100.0 / (100.0 + resist)
    } else {
        2.0 - 100.0 / (100.0 - resist)
    }
}

/// Post-mitigation amount for a template against the given resists.
///
/// `resist_cap` bounds the maximum fraction mitigated: a cap of 0.9 means
/// the multiplier never drops below 0.1.
pub fn mitigate(
    template: DamageTemplate,
    armor: f64,
    magic_resist: f64,
    pen: Penetration,
    resist_cap: f64,
) -> f64 {
    let resist = match template.kind {
        DamageKind::Physical => armor,
        DamageKind::Magical => magic_resist,
        DamageKind::True => return template.amount,
    };
    let effective = resist * (1.0 - pen.percent) - pen.flat;
    let multiplier = reduction_multiplier(effective).max(1.0 - resist_cap);
    template.amount * multiplier
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// How one post-mitigation amount landed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageOutcome {
    /// Portion absorbed by shields.
    pub to_shields: f64,
    /// Portion taken from health.
    pub to_health: f64,
}

impl DamageOutcome {
    /// Total absorbed. Always `to_shields + to_health`.
    #[inline]
    pub fn absorbed(&self) -> f64 {
        self.to_shields + self.to_health
    }
}

/// Soak a post-mitigation amount into shields (oldest first) then health.
pub fn absorb(damageable: &mut Damageable, mut amount: f64) -> DamageOutcome {
    let mut outcome = DamageOutcome::default();
    for shield in damageable.shields.iter_mut() {
        if amount <= 0.0 {
            break;
        }
        let soaked = shield.amount.min(amount);
        shield.amount -= soaked;
        amount -= soaked;
        outcome.to_shields += soaked;
    }
    // Spent shields linger until the end of the effect update.
    let from_health = damageable.health.min(amount);
    damageable.health -= from_health;
    outcome.to_health = from_health;
    outcome
}

/// Full damage pipeline from one entity to another: derive the target's
/// resists (champion modifiers included), mitigate, absorb, stamp combat
/// state, and publish [`GameEvent::DamageDealt`].
///
/// Returns `None` when the target cannot take damage (no damageable record,
/// already dead).
#[allow(clippy::too_many_arguments)]
pub fn deal_damage(
    world: &mut World,
    catalog: &riftline_catalog::Catalog,
    config: &SessionConfig,
    events: &mut EventBus,
    source: EntityId,
    target: EntityId,
    template: DamageTemplate,
    pen: Penetration,
    crit: bool,
    now: f64,
) -> Option<DamageOutcome> {
    // Stamp the attacker into combat first; the borrow on the target comes
    // after.
    if let Some(attacker) = world.get_mut(source).and_then(|r| r.champion.as_deref_mut()) {
        attacker.combat_timer = config.combat_timeout_s;
    }

    let record = world.get_mut(target)?;
    if record.dead {
        return None;
    }

    // Champions derive their resists through the modifier pipeline; plain
    // damageables read them off the record.
    let (armor, magic_resist) = match record.champion.as_deref() {
        Some(state) => match catalog.champion(state.champion) {
            Ok(def) => {
                let sheet = StatSheet::derive(state, def);
                (sheet.armor, sheet.magic_resist)
            }
            Err(_) => {
                let d = record.damageable.as_ref()?;
                (d.armor, d.magic_resist)
            }
        },
        None => {
            let d = record.damageable.as_ref()?;
            (d.armor, d.magic_resist)
        }
    };

    let mut amount = mitigate(template, armor, magic_resist, pen, config.resist_cap);
    if crit {
        amount *= config.crit_multiplier;
    }

    let damageable = record.damageable.as_mut()?;
    let outcome = absorb(damageable, amount);
    damageable.recent_damagers.push(RecentDamage { source, at: now });
    damageable
        .recent_damagers
        .retain(|r| now - r.at <= config.combat_timeout_s);

    if let Some(champion) = record.champion.as_deref_mut() {
        champion.combat_timer = config.combat_timeout_s;
        // Damage breaks an in-progress recall.
        champion.recall_remaining = None;
    }

    events.publish(GameEvent::DamageDealt {
        source,
        target,
        amount: outcome.absorbed(),
        to_shields: outcome.to_shields,
        to_health: outcome.to_health,
        kind: template.kind,
        crit,
    });
    Some(outcome)
}

/// Heal an entity, clamped to max health.
pub fn heal(world: &mut World, target: EntityId, amount: f64) -> f64 {
    let Some(damageable) = world.get_mut(target).and_then(|r| {
        if r.dead {
            None
        } else {
            r.damageable.as_mut()
        }
    }) else {
        return 0.0;
    };
    let healed = (damageable.max_health - damageable.health).min(amount).max(0.0);
    damageable.health += healed;
    healed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
