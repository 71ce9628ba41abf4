//! Per-tick timer upkeep: cooldowns, regen, effect durations, recall.
//!
//! This is step 2 of the tick: advance every per-entity clock before the
//! scheduler fires. Periodic effect payloads are returned rather than
//! applied inline because damage application needs the whole world.

use riftline_world::entity::EntityId;
use riftline_world::store::World;

use riftline_catalog::config::SessionConfig;
use riftline_catalog::Catalog;

use crate::effect::{update_effects, PendingPeriodic};
use crate::stats::StatSheet;

/// What the upkeep pass produced for the caller to act on.
#[derive(Debug, Default)]
pub struct UpkeepOutcome {
    /// Periodic DoT/HoT payloads that came due, in entity order.
    pub periodic: Vec<PendingPeriodic>,
    /// Champions whose recall channel completed this tick.
    pub completed_recalls: Vec<EntityId>,
}

/// Advance cooldowns, resource/health regen, combat timers, effect and
/// shield durations, passive clocks and recall channels by `dt`.
pub fn advance_timers(
    world: &mut World,
    catalog: &Catalog,
    config: &SessionConfig,
    dt: f64,
) -> UpkeepOutcome {
    let mut outcome = UpkeepOutcome::default();

    for id in world.ids() {
        let Some(record) = world.get_mut(id) else { continue };

        // Effect and shield durations run for every damageable, dead ones
        // included (persists-through-death effects keep ticking).
        outcome
            .periodic
            .append(&mut update_effects(record, catalog, dt));

        let Some(record) = world.get_mut(id) else { continue };
        if record.dead {
            continue;
        }

        // Champion clocks and regen.
        let sheet = match record.champion.as_deref() {
            Some(state) => catalog
                .champion(state.champion)
                .ok()
                .map(|def| StatSheet::derive(state, def)),
            None => None,
        };
        if let (Some(champion), Some(sheet)) = (record.champion.as_deref_mut(), sheet) {
            for slot in champion.slots.iter_mut() {
                slot.cooldown_remaining = (slot.cooldown_remaining - dt).max(0.0);
            }
            champion.attack_cooldown = (champion.attack_cooldown - dt).max(0.0);
            champion.combat_timer = (champion.combat_timer - dt).max(0.0);
            champion.passive.timer = (champion.passive.timer - dt).max(0.0);
            champion.passive.internal_cooldown =
                (champion.passive.internal_cooldown - dt).max(0.0);

            // Out-of-combat regen runs faster.
            let regen_scale = if champion.combat_timer <= 0.0 {
                config.ooc_regen_multiplier
            } else {
                1.0
            };
            champion.resource =
                (champion.resource + sheet.resource_regen * regen_scale * dt)
                    .min(sheet.max_resource);

            // Toggled abilities drain resource while on; an empty pool
            // switches them off.
            for slot in champion.slots.iter_mut() {
                if !slot.toggled {
                    continue;
                }
                let Some(drain) = catalog
                    .ability(slot.ability)
                    .ok()
                    .and_then(|d| d.toggle.map(|t| t.drain_per_second))
                else {
                    continue;
                };
                champion.resource -= drain * dt;
                if champion.resource <= 0.0 {
                    champion.resource = 0.0;
                    slot.toggled = false;
                }
            }

            if let Some(remaining) = champion.recall_remaining {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    champion.recall_remaining = None;
                    outcome.completed_recalls.push(id);
                } else {
                    champion.recall_remaining = Some(remaining);
                }
            }

            let health_regen = sheet.health_regen * regen_scale * dt;
            if let Some(damageable) = record.damageable.as_mut() {
                damageable.health = (damageable.health + health_regen).min(damageable.max_health);
            }
        }
    }
    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use riftline_catalog::content::{demo_catalog, WARDEN};
    use riftline_world::champion::{AbilitySlot, ChampionState};
    use riftline_world::prelude::*;

    fn spawn(world: &mut World, catalog: &Catalog) -> EntityId {
        let def = catalog.champion(WARDEN).unwrap();
        let mut record =
            EntityRecord::new(EntityKind::Champion, Team::Blue, Vec2::ZERO, def.collider);
        record.damageable = Some(Damageable::new(640.0, 34.0, 32.0));
        record.champion = Some(Box::new(ChampionState::new(
            WARDEN,
            def.abilities,
            def.passive,
        )));
        world.insert(record)
    }

    #[test]
    fn cooldowns_tick_down_and_floor_at_zero() {
        let catalog = demo_catalog();
        let config = SessionConfig::default();
        let mut world = World::new();
        let id = spawn(&mut world, &catalog);
        world
            .get_mut(id)
            .unwrap()
            .champion
            .as_deref_mut()
            .unwrap()
            .slot_mut(AbilitySlot::Q)
            .cooldown_remaining = 0.5;

        advance_timers(&mut world, &catalog, &config, 0.3);
        let champ = world.get(id).unwrap().champion.as_deref().unwrap();
        assert!((champ.slot(AbilitySlot::Q).cooldown_remaining - 0.2).abs() < 1e-9);

        advance_timers(&mut world, &catalog, &config, 1.0);
        let champ = world.get(id).unwrap().champion.as_deref().unwrap();
        assert_eq!(champ.slot(AbilitySlot::Q).cooldown_remaining, 0.0);
    }

    #[test]
    fn out_of_combat_regen_is_faster() {
        let catalog = demo_catalog();
        let config = SessionConfig::default();
        let mut world = World::new();

        let resting = spawn(&mut world, &catalog);
        let fighting = spawn(&mut world, &catalog);
        for id in [resting, fighting] {
            let champ = world.get_mut(id).unwrap().champion.as_deref_mut().unwrap();
            champ.resource = 0.0;
        }
        world
            .get_mut(fighting)
            .unwrap()
            .champion
            .as_deref_mut()
            .unwrap()
            .combat_timer = 5.0;

        advance_timers(&mut world, &catalog, &config, 1.0);

        let rest_mana = world
            .get(resting)
            .unwrap()
            .champion
            .as_deref()
            .unwrap()
            .resource;
        let fight_mana = world
            .get(fighting)
            .unwrap()
            .champion
            .as_deref()
            .unwrap()
            .resource;
        // 1.4/s base; 2.5x out of combat.
        assert!((rest_mana - 3.5).abs() < 1e-9);
        assert!((fight_mana - 1.4).abs() < 1e-9);
    }

    #[test]
    fn recall_completes_after_its_channel() {
        let catalog = demo_catalog();
        let config = SessionConfig::default();
        let mut world = World::new();
        let id = spawn(&mut world, &catalog);
        world
            .get_mut(id)
            .unwrap()
            .champion
            .as_deref_mut()
            .unwrap()
            .recall_remaining = Some(0.25);

        let first = advance_timers(&mut world, &catalog, &config, 0.2);
        assert!(first.completed_recalls.is_empty());
        let second = advance_timers(&mut world, &catalog, &config, 0.2);
        assert_eq!(second.completed_recalls, vec![id]);
    }

    #[test]
    fn toggles_drain_and_switch_off_when_dry() {
        let mut catalog = demo_catalog();
        catalog
            .abilities
            .get_mut(&riftline_catalog::content::PIERCING_BOLT)
            .unwrap()
            .toggle = Some(riftline_catalog::ability::ToggleSpec {
            drain_per_second: 50.0,
        });
        let config = SessionConfig::default();
        let mut world = World::new();
        let id = spawn(&mut world, &catalog);
        {
            let champ = world.get_mut(id).unwrap().champion.as_deref_mut().unwrap();
            champ.resource = 30.0;
            champ.slot_mut(AbilitySlot::Q).rank = 1;
            champ.slot_mut(AbilitySlot::Q).toggled = true;
            // Keep regen out of the arithmetic.
            champ.combat_timer = 100.0;
        }

        advance_timers(&mut world, &catalog, &config, 0.5);
        let champ = world.get(id).unwrap().champion.as_deref().unwrap();
        assert!(champ.slot(AbilitySlot::Q).toggled);
        assert!(champ.resource < 30.0);

        advance_timers(&mut world, &catalog, &config, 1.0);
        let champ = world.get(id).unwrap().champion.as_deref().unwrap();
        assert_eq!(champ.resource, 0.0);
        assert!(!champ.slot(AbilitySlot::Q).toggled);
    }

    #[test]
    fn health_clamps_at_max() {
        let catalog = demo_catalog();
        let config = SessionConfig::default();
        let mut world = World::new();
        let id = spawn(&mut world, &catalog);
        // Already at full health; a long rest must not overfill.
        advance_timers(&mut world, &catalog, &config, 100.0);
        let damageable = world.get(id).unwrap().damageable.as_ref().unwrap();
        assert_eq!(damageable.health, damageable.max_health);
    }
}
