//! Champion stat derivation.
//!
//! Derivation is pure and idempotent: every read recomputes
//! `base + growth * (level - 1)`, then applies the champion's modifier list
//! flat-first, percent-second. Callers that need several stats in one tick
//! take a [`StatSheet`] snapshot; the sheet is the permitted per-tick cache
//! and is simply re-derived whenever the modifier list or level changes.

use riftline_world::champion::{ChampionState, StatKind};

use riftline_catalog::champion::ChampionDef;

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive one stat for a champion: base/growth from the definition, then
/// flat modifiers, then percent modifiers.
pub fn derived(state: &ChampionState, def: &ChampionDef, kind: StatKind) -> f64 {
    let base = def.stats.value_at(kind, state.level);
    let mut flat = 0.0;
    let mut percent = 0.0;
    for modifier in &state.modifiers {
        if modifier.stat == kind {
            flat += modifier.flat;
            percent += modifier.percent;
        }
    }
    (base + flat) * (1.0 + percent)
}

// ---------------------------------------------------------------------------
// StatSheet
// ---------------------------------------------------------------------------

/// All derived stats for one champion at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatSheet {
    /// Maximum health pool.
    pub max_health: f64,
    /// Maximum resource pool.
    pub max_resource: f64,
    /// Basic-attack damage.
    pub attack_damage: f64,
    /// Ability scaling power.
    pub ability_power: f64,
    /// Physical reduction.
    pub armor: f64,
    /// Magical reduction.
    pub magic_resist: f64,
    /// Attacks per second. Clamped non-negative.
    pub attack_speed: f64,
    /// Units per second. Clamped non-negative (slows cannot reverse walking).
    pub move_speed: f64,
    /// Health per second.
    pub health_regen: f64,
    /// Resource per second.
    pub resource_regen: f64,
    /// Critical strike chance in `[0, 1]`.
    pub crit_chance: f64,
    /// Basic-attack range.
    pub attack_range: f64,
    /// Cast-speed bonus over 1.0.
    pub cast_speed: f64,
}

impl StatSheet {
    /// Snapshot every stat for the champion.
    pub fn derive(state: &ChampionState, def: &ChampionDef) -> Self {
        Self {
            max_health: derived(state, def, StatKind::MaxHealth),
            max_resource: derived(state, def, StatKind::MaxResource),
            attack_damage: derived(state, def, StatKind::AttackDamage),
            ability_power: derived(state, def, StatKind::AbilityPower),
            armor: derived(state, def, StatKind::Armor),
            magic_resist: derived(state, def, StatKind::MagicResist),
            attack_speed: derived(state, def, StatKind::AttackSpeed).max(0.0),
            move_speed: derived(state, def, StatKind::MoveSpeed).max(0.0),
            health_regen: derived(state, def, StatKind::HealthRegen),
            resource_regen: derived(state, def, StatKind::ResourceRegen),
            crit_chance: derived(state, def, StatKind::CritChance).clamp(0.0, 1.0),
            attack_range: derived(state, def, StatKind::AttackRange),
            cast_speed: derived(state, def, StatKind::CastSpeed),
        }
    }

    /// Playback speed multiplier for cast animations flagged to scale.
    #[inline]
    pub fn cast_playback_speed(&self) -> f64 {
        (1.0 + self.cast_speed).max(0.1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use riftline_catalog::content::{demo_catalog, WARDEN};
    use riftline_world::champion::{ModSource, StatModifier};
    use riftline_world::ids::{EffectId, ItemId, PassiveId};

    fn warden_state(level: u8) -> ChampionState {
        let catalog = demo_catalog();
        let def = catalog.champion(WARDEN).unwrap();
        let mut state = ChampionState::new(WARDEN, def.abilities, PassiveId(1));
        state.level = level;
        state
    }

    #[test]
    fn base_plus_growth() {
        let catalog = demo_catalog();
        let def = catalog.champion(WARDEN).unwrap();
        let state = warden_state(1);
        assert_eq!(derived(&state, def, StatKind::MaxHealth), 640.0);

        let state = warden_state(10);
        assert_eq!(derived(&state, def, StatKind::MaxHealth), 640.0 + 9.0 * 96.0);
    }

    #[test]
    fn flat_before_percent() {
        let catalog = demo_catalog();
        let def = catalog.champion(WARDEN).unwrap();
        let mut state = warden_state(1);
        // Base AD 62. +8 flat then +50% => (62 + 8) * 1.5 = 105.
        state.modifiers.push(StatModifier {
            stat: StatKind::AttackDamage,
            flat: 8.0,
            percent: 0.0,
            source: ModSource::Item(ItemId(1)),
        });
        state.modifiers.push(StatModifier {
            stat: StatKind::AttackDamage,
            flat: 0.0,
            percent: 0.5,
            source: ModSource::Effect(EffectId(9)),
        });
        assert_eq!(derived(&state, def, StatKind::AttackDamage), 105.0);
    }

    #[test]
    fn derivation_is_idempotent() {
        let catalog = demo_catalog();
        let def = catalog.champion(WARDEN).unwrap();
        let state = warden_state(7);
        let first = StatSheet::derive(&state, def);
        let second = StatSheet::derive(&state, def);
        assert_eq!(first, second);
    }

    #[test]
    fn slows_cannot_reverse_movement() {
        let catalog = demo_catalog();
        let def = catalog.champion(WARDEN).unwrap();
        let mut state = warden_state(1);
        state.modifiers.push(StatModifier {
            stat: StatKind::MoveSpeed,
            flat: 0.0,
            percent: -2.0,
            source: ModSource::Effect(EffectId(2)),
        });
        let sheet = StatSheet::derive(&state, def);
        assert_eq!(sheet.move_speed, 0.0);
    }
}
