//! Effect application, duration bookkeeping, and CC status derivation.
//!
//! Application dispatches on the definition's stacking policy. Periodic
//! effects advance a `next_tick_in` timer; the payloads they produce are
//! collected by [`update_effects`] and applied by the caller after the
//! iteration (damage application needs the whole world, the update only
//! needs one record). Expired shields and effects are dropped at the end of
//! the update.

use tracing::debug;

use riftline_world::champion::{ModSource, StatModifier};
use riftline_world::entity::EntityId;
use riftline_world::ids::EffectId;
use riftline_world::records::{
    ActiveEffect, DamageTemplate, EntityRecord, ImmunityTag, Shield,
};

use riftline_catalog::effect::{CcKind, EffectCategory, EffectDef, StackPolicy};
use riftline_catalog::Catalog;

// ---------------------------------------------------------------------------
// CC status
// ---------------------------------------------------------------------------

/// Action capability derived from an entity's active effects.
///
/// This is a pure function of `(active effects, effect definitions)`; it is
/// never stored on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcStatus {
    /// Commanded movement allowed.
    pub can_move: bool,
    /// Basic attacks allowed.
    pub can_attack: bool,
    /// Ability casts allowed.
    pub can_cast: bool,
    /// Mobility abilities (dashes) allowed.
    pub can_use_mobility: bool,
    /// A stun or knockup is active.
    pub is_stunned: bool,
    /// A silence is active.
    pub is_silenced: bool,
    /// A root is active.
    pub is_rooted: bool,
    /// A grounding effect is active.
    pub is_grounded: bool,
    /// A disarm is active.
    pub is_disarmed: bool,
}

impl Default for CcStatus {
    fn default() -> Self {
        Self {
            can_move: true,
            can_attack: true,
            can_cast: true,
            can_use_mobility: true,
            is_stunned: false,
            is_silenced: false,
            is_rooted: false,
            is_grounded: false,
            is_disarmed: false,
        }
    }
}

impl CcStatus {
    /// Whether a hard CC is active -- the kinds that interrupt an
    /// in-flight cast.
    #[inline]
    pub fn interrupts_casts(&self) -> bool {
        self.is_stunned || self.is_silenced
    }
}

/// Derive the CC status for a set of active effects.
///
/// Effects whose definition is missing from the catalog contribute nothing
/// (the application path already logged the miss).
pub fn cc_status(effects: &[ActiveEffect], catalog: &Catalog) -> CcStatus {
    let mut status = CcStatus::default();
    for active in effects {
        let Ok(def) = catalog.effect(active.effect) else {
            continue;
        };
        let Some(cc) = def.cc else { continue };
        match cc {
            CcKind::Stun | CcKind::Knockup => {
                status.is_stunned = true;
                status.can_move = false;
                status.can_attack = false;
                status.can_cast = false;
                status.can_use_mobility = false;
            }
            CcKind::Silence => {
                status.is_silenced = true;
                status.can_cast = false;
            }
            CcKind::Root => {
                status.is_rooted = true;
                status.can_move = false;
                status.can_use_mobility = false;
            }
            CcKind::Ground => {
                status.is_grounded = true;
                status.can_use_mobility = false;
            }
            CcKind::Disarm => {
                status.is_disarmed = true;
                status.can_attack = false;
            }
        }
    }
    status
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Result of one application attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    /// A new instance landed.
    Applied,
    /// An existing instance was refreshed/extended/stacked/replaced.
    Merged,
    /// The application was discarded (Ignore policy or immunity).
    Refused,
}

/// Apply an effect to a record, dispatching on the stacking policy.
///
/// CC effects are refused outright by [`ImmunityTag::CrowdControl`]. Stat
/// modifiers land on champion targets per instance -- and again per stack,
/// so stack counts scale the modifier naturally; removal clears everything
/// from the effect's source at once.
pub fn apply_effect(
    record: &mut EntityRecord,
    def: &EffectDef,
    source: EntityId,
    rank: u8,
) -> ApplyResult {
    let duration = def.duration.resolve(rank);
    let entity = record.id;

    // Phase 1: mutate the damageable block and note what modifier work the
    // champion side needs.
    let (result, add_modifiers, reset_modifiers) = {
        let Some(damageable) = record.damageable.as_mut() else {
            return ApplyResult::Refused;
        };
        if def.category == EffectCategory::Cc
            && damageable.is_immune_to(ImmunityTag::CrowdControl)
        {
            debug!(entity = %entity, effect = %def.id, "CC refused by immunity");
            return ApplyResult::Refused;
        }

        match damageable.effects.iter().position(|e| e.effect == def.id) {
            None => {
                damageable.effects.push(ActiveEffect {
                    effect: def.id,
                    remaining: duration,
                    next_tick_in: def.tick_interval.unwrap_or(0.0),
                    stacks: 1,
                    source,
                });
                (ApplyResult::Applied, true, false)
            }
            Some(index) => {
                let active = &mut damageable.effects[index];
                match def.stacking {
                    StackPolicy::Refresh => {
                        active.remaining = duration;
                        active.source = source;
                        (ApplyResult::Merged, false, false)
                    }
                    StackPolicy::Extend => {
                        active.remaining += duration;
                        active.source = source;
                        (ApplyResult::Merged, false, false)
                    }
                    StackPolicy::Stack(max) => {
                        active.remaining = duration;
                        active.source = source;
                        let grew = active.stacks < max;
                        if grew {
                            active.stacks += 1;
                        }
                        (ApplyResult::Merged, grew, false)
                    }
                    StackPolicy::Replace => {
                        active.remaining = duration;
                        active.next_tick_in = def.tick_interval.unwrap_or(0.0);
                        active.stacks = 1;
                        active.source = source;
                        (ApplyResult::Merged, true, true)
                    }
                    StackPolicy::Ignore => (ApplyResult::Refused, false, false),
                }
            }
        }
    };
    if result == ApplyResult::Refused {
        return result;
    }

    // Phase 2: champion stat modifiers.
    if reset_modifiers {
        clear_modifiers(record, def.id);
    }
    if add_modifiers {
        push_modifiers(record, def);
    }

    // Shield effects grant a shield stack entry per successful application.
    if let (Some(amount), Some(damageable)) = (def.shield_amount, record.damageable.as_mut()) {
        damageable.shields.push(Shield {
            amount,
            remaining: duration,
            source: def.id,
        });
    }
    result
}

fn push_modifiers(record: &mut EntityRecord, def: &EffectDef) {
    if let Some(champion) = record.champion.as_mut() {
        for template in &def.stat_mods {
            champion.modifiers.push(StatModifier {
                stat: template.stat,
                flat: template.flat,
                percent: template.percent,
                source: ModSource::Effect(def.id),
            });
        }
    }
}

fn clear_modifiers(record: &mut EntityRecord, effect: EffectId) {
    if let Some(champion) = record.champion.as_mut() {
        champion.remove_modifiers_from(ModSource::Effect(effect));
    }
}

// ---------------------------------------------------------------------------
// Per-tick update
// ---------------------------------------------------------------------------

/// A periodic payload produced by the duration update, applied by the
/// caller once iteration is done.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingPeriodic {
    /// Who takes the payload.
    pub target: EntityId,
    /// Who applied the effect.
    pub source: EntityId,
    /// The effect that ticked.
    pub effect: EffectId,
    /// DoT damage, if the effect deals any.
    pub damage: Option<DamageTemplate>,
    /// HoT healing, if the effect heals.
    pub heal: Option<f64>,
}

/// Advance effect and shield durations on one record by `dt`.
///
/// Returns the periodic payloads that came due. Expired effects drop their
/// stat modifiers; shields with no amount or time left are removed at the
/// end of the update.
pub fn update_effects(
    record: &mut EntityRecord,
    catalog: &Catalog,
    dt: f64,
) -> Vec<PendingPeriodic> {
    let id = record.id;
    let mut periodic = Vec::new();
    let mut expired: Vec<EffectId> = Vec::new();

    if let Some(damageable) = record.damageable.as_mut() {
        for active in damageable.effects.iter_mut() {
            active.remaining -= dt;
            let Ok(def) = catalog.effect(active.effect) else {
                continue;
            };
            if let Some(interval) = def.tick_interval {
                active.next_tick_in -= dt;
                while active.next_tick_in <= 0.0 && active.remaining > -dt {
                    periodic.push(PendingPeriodic {
                        target: id,
                        source: active.source,
                        effect: active.effect,
                        damage: def.periodic_damage.map(|d| DamageTemplate {
                            amount: d.amount * active.stacks as f64,
                            kind: d.kind,
                        }),
                        heal: def.periodic_heal.map(|h| h * active.stacks as f64),
                    });
                    active.next_tick_in += interval;
                }
            }
            if active.remaining <= 0.0 {
                expired.push(active.effect);
            }
        }
        damageable.effects.retain(|e| e.remaining > 0.0);

        // Shield upkeep happens at the end of the effect update.
        for shield in damageable.shields.iter_mut() {
            shield.remaining -= dt;
        }
        damageable.shields.retain(|s| s.amount > 0.0 && s.remaining > 0.0);
    }

    for effect in expired {
        clear_modifiers(record, effect);
    }
    periodic
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
