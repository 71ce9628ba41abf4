//! Reward bookkeeping: gold and experience attribution.
//!
//! Consumes the tick's buffered kill events synchronously (events never
//! survive the tick) and credits bounties and experience. Kill credit goes
//! to the most recent damager; assists go to other champions in the
//! victim's recent-damager list inside the assist window; experience is
//! split among the killing team's live champions within share range.

use riftline_world::entity::EntityId;
use riftline_world::records::EntityKind;
use riftline_world::store::World;

use riftline_catalog::config::SessionConfig;
use riftline_catalog::Catalog;

use crate::events::{EventBus, GameEvent};
use crate::stats::StatSheet;

/// Bounty for a champion takedown.
pub const KILL_GOLD: u32 = 300;
/// Gold for an assist inside the window.
pub const ASSIST_GOLD: u32 = 150;
/// Gold for a lane minion.
pub const MINION_GOLD: u32 = 21;
/// Gold for a jungle monster.
pub const JUNGLE_GOLD: u32 = 35;
/// Gold for a destroyed structure.
pub const STRUCTURE_GOLD: u32 = 250;
/// Experience for a lane minion.
pub const MINION_XP: f64 = 60.0;
/// Experience for a jungle monster.
pub const JUNGLE_XP: f64 = 80.0;

/// Experience needed to go from `level` to `level + 1`.
pub fn xp_to_next(level: u8) -> f64 {
    180.0 + 100.0 * level as f64
}

/// Settle the tick's kills. Reads the buffered events, then credits gold
/// and experience (publishing `GoldEarned`/`XpEarned`/`LevelUp` into the
/// same tick's buffer).
pub fn settle(
    world: &mut World,
    catalog: &Catalog,
    config: &SessionConfig,
    events: &mut EventBus,
    now: f64,
) {
    let kills: Vec<(EntityId, Option<EntityId>)> = events
        .buffered()
        .iter()
        .filter_map(|event| match event {
            GameEvent::EntityKilled { victim, killer } => Some((*victim, *killer)),
            _ => None,
        })
        .collect();

    for (victim, killer) in kills {
        let Some(victim_record) = world.get(victim) else {
            continue;
        };
        let victim_kind = victim_record.kind;
        let victim_pos = victim_record.position;
        let victim_level = victim_record
            .champion
            .as_deref()
            .map(|c| c.level)
            .unwrap_or(1);
        let assists: Vec<EntityId> = victim_record
            .damageable
            .as_ref()
            .map(|d| {
                d.recent_damagers
                    .iter()
                    .filter(|r| now - r.at <= config.combat_timeout_s)
                    .map(|r| r.source)
                    .filter(|&s| Some(s) != killer)
                    .collect()
            })
            .unwrap_or_default();

        let killer_champion = killer.filter(|&k| {
            world
                .get(k)
                .map(|r| r.kind == EntityKind::Champion && !r.dead)
                .unwrap_or(false)
        });

        // -- gold ------------------------------------------------------------
        let bounty = match victim_kind {
            EntityKind::Champion => KILL_GOLD,
            EntityKind::Minion => MINION_GOLD,
            EntityKind::JungleCamp => JUNGLE_GOLD,
            EntityKind::Tower | EntityKind::Inhibitor | EntityKind::Nexus => STRUCTURE_GOLD,
            _ => 0,
        };
        if bounty > 0 {
            if let Some(killer) = killer_champion {
                grant_gold(world, events, killer, bounty);
            }
        }
        if victim_kind == EntityKind::Champion {
            let mut credited: Vec<EntityId> = Vec::new();
            for assist in assists {
                if credited.contains(&assist) {
                    continue;
                }
                let is_champion = world
                    .get(assist)
                    .map(|r| r.kind == EntityKind::Champion)
                    .unwrap_or(false);
                if is_champion {
                    grant_gold(world, events, assist, ASSIST_GOLD);
                    credited.push(assist);
                }
            }
        }

        // -- experience ------------------------------------------------------
        let base_xp = match victim_kind {
            EntityKind::Champion => {
                let killer_level = killer_champion
                    .and_then(|k| world.get(k))
                    .and_then(|r| r.champion.as_deref().map(|c| c.level))
                    .unwrap_or(1);
                config.kill_base_xp
                    + config.xp_level_diff_bonus
                        * f64::from(victim_level.saturating_sub(killer_level))
            }
            EntityKind::Minion => MINION_XP,
            EntityKind::JungleCamp => JUNGLE_XP,
            _ => 0.0,
        };
        if base_xp <= 0.0 {
            continue;
        }
        let Some(killer_team) = killer.and_then(|k| world.get(k)).map(|r| r.team) else {
            continue;
        };
        let sharers: Vec<EntityId> = world
            .iter()
            .filter(|r| {
                r.kind == EntityKind::Champion
                    && !r.dead
                    && r.team == killer_team
                    && r.position.distance(victim_pos) <= config.xp_share_range
            })
            .map(|r| r.id)
            .collect();
        if sharers.is_empty() {
            continue;
        }
        let per_sharer = base_xp / sharers.len() as f64;
        for sharer in sharers {
            grant_xp(world, catalog, events, sharer, per_sharer);
        }
    }
}

/// Credit gold and publish the event.
pub fn grant_gold(world: &mut World, events: &mut EventBus, champion: EntityId, amount: u32) {
    let Some(state) = world
        .get_mut(champion)
        .and_then(|r| r.champion.as_deref_mut())
    else {
        return;
    };
    state.gold = state.gold.saturating_add(amount);
    events.publish(GameEvent::GoldEarned { champion, amount });
}

/// Credit experience, levelling up as thresholds pass. Level-ups re-derive
/// max pools so the growth lands immediately.
pub fn grant_xp(
    world: &mut World,
    catalog: &Catalog,
    events: &mut EventBus,
    champion: EntityId,
    amount: f64,
) {
    let Some(record) = world.get_mut(champion) else {
        return;
    };
    let Some(state) = record.champion.as_deref_mut() else {
        return;
    };
    state.xp += amount;
    let mut leveled = false;
    while state.level < riftline_world::champion::MAX_LEVEL {
        let needed = xp_to_next(state.level);
        if state.xp < needed {
            break;
        }
        state.xp -= needed;
        state.level += 1;
        leveled = true;
        events.publish(GameEvent::LevelUp {
            champion,
            level: state.level,
        });
    }
    events.publish(GameEvent::XpEarned { champion, amount });

    // Growth raises max pools; current health/resource keep their value.
    if leveled {
        if let Ok(def) = catalog.champion(state.champion) {
            let sheet = StatSheet::derive(state, def);
            if let Some(damageable) = record.damageable.as_mut() {
                damageable.max_health = sheet.max_health;
                damageable.health = damageable.health.min(sheet.max_health);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
