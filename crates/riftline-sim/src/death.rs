//! Death transitions and respawns.
//!
//! An entity dropping to zero health enters the dead state on the tick it
//! happened: its pending scheduled actions are cancelled (actions that
//! already fired this tick stay fired), its commanded movement drops, and
//! only effects flagged persists-through-death survive. Champions start a
//! respawn timer; everything else is queued for end-of-tick removal.

use riftline_world::champion::ModSource;
use riftline_world::entity::EntityId;
use riftline_world::math::Vec2;
use riftline_world::records::{EntityKind, Team};
use riftline_world::store::World;

use riftline_catalog::config::SessionConfig;
use riftline_catalog::Catalog;

use crate::events::{EventBus, GameEvent};
use crate::scheduler::ActionScheduler;
use crate::stats::StatSheet;

/// Process entities that hit zero health this tick.
pub fn process_deaths(
    world: &mut World,
    catalog: &Catalog,
    scheduler: &mut ActionScheduler,
    events: &mut EventBus,
    config: &SessionConfig,
    now: f64,
) {
    for id in world.ids() {
        let Some(record) = world.get(id) else { continue };
        let Some(damageable) = record.damageable.as_ref() else {
            continue;
        };
        if record.dead || damageable.health > 0.0 {
            continue;
        }

        // Kill credit: the most recent damager inside the assist window.
        let killer = damageable
            .recent_damagers
            .iter()
            .rev()
            .find(|r| now - r.at <= config.combat_timeout_s)
            .map(|r| r.source);
        let kind = record.kind;
        let team = record.team;

        // Pending actions owned by the dying entity are cancelled; actions
        // that fired earlier this tick are already gone from the scheduler.
        scheduler.cancel(id, None);

        let Some(record) = world.get_mut(id) else { continue };
        record.dead = true;
        if let Some(motion) = record.motion.as_mut() {
            motion.clear_command();
            motion.forced = None;
        }

        // Drop everything that does not persist through death.
        let mut dropped = Vec::new();
        if let Some(damageable) = record.damageable.as_mut() {
            damageable.effects.retain(|active| {
                let persists = catalog
                    .effect(active.effect)
                    .map(|def| def.persists_through_death)
                    .unwrap_or(false);
                if !persists {
                    dropped.push(active.effect);
                }
                persists
            });
            damageable.shields.clear();
        }
        if let Some(champion) = record.champion.as_deref_mut() {
            for effect in &dropped {
                champion.remove_modifiers_from(ModSource::Effect(*effect));
            }
            let respawn = (config.respawn_base_s
                + config.respawn_per_level_s * champion.level as f64)
                .min(config.respawn_cap_s);
            champion.respawn_timer = Some(respawn);
            champion.recall_remaining = None;
        }

        if kind.is_structure() {
            events.publish(GameEvent::StructureDestroyed {
                structure: id,
                team,
                by: killer,
            });
        }
        events.publish(GameEvent::EntityKilled { victim: id, killer });

        // Champions stay in the world for respawn; everything else goes at
        // end of tick.
        if kind != EntityKind::Champion {
            world.mark_removed(id);
        }
    }
}

/// Advance respawn timers and bring champions back at their team's spawn.
pub fn process_respawns(
    world: &mut World,
    catalog: &Catalog,
    dt: f64,
    spawn_point: impl Fn(Team) -> Vec2,
) {
    for id in world.ids() {
        let Some(record) = world.get(id) else { continue };
        if record.kind != EntityKind::Champion || !record.dead {
            continue;
        }
        let Some(state) = record.champion.as_deref() else {
            continue;
        };
        let Some(timer) = state.respawn_timer else {
            continue;
        };
        let timer = timer - dt;
        let team = record.team;

        if timer > 0.0 {
            if let Some(champion) = world
                .get_mut(id)
                .and_then(|r| r.champion.as_deref_mut())
            {
                champion.respawn_timer = Some(timer);
            }
            continue;
        }

        // Respawn: full pools, home position, cleared combat state.
        let sheet = world
            .get(id)
            .and_then(|r| r.champion.as_deref().map(|s| (s.champion, s.clone())))
            .and_then(|(champ_id, state)| {
                catalog
                    .champion(champ_id)
                    .ok()
                    .map(|def| StatSheet::derive(&state, def))
            });
        let Some(record) = world.get_mut(id) else { continue };
        record.dead = false;
        record.position = spawn_point(team);
        if let Some(champion) = record.champion.as_deref_mut() {
            champion.respawn_timer = None;
            champion.combat_timer = 0.0;
            champion.attack_cooldown = 0.0;
        }
        if let Some(damageable) = record.damageable.as_mut() {
            if let Some(sheet) = &sheet {
                damageable.max_health = sheet.max_health;
            }
            damageable.health = damageable.max_health;
            damageable.recent_damagers.clear();
        }
        if let (Some(champion), Some(sheet)) = (record.champion.as_deref_mut(), sheet) {
            champion.resource = sheet.max_resource;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
