//! Projectile flight and zone ticking.
//!
//! Projectiles integrate along their aim each tick, expire on TTL, and test
//! for hits against hostile bodies; non-piercing projectiles despawn on
//! first contact, piercing ones remember who they already struck. Zones do
//! not move; they burn down their lifetime and fire their payload on a tick
//! timer they own.
//!
//! Entity removal is deferred through the store's removal queue, so nothing
//! despawns mid-iteration.

use riftline_world::entity::EntityId;
use riftline_world::math::Vec2;
use riftline_world::records::{DamageTemplate, EntityKind, ProjectileAim};
use riftline_world::shape::overlaps;
use riftline_world::store::World;

use riftline_catalog::ability::AffectFlags;
use riftline_catalog::config::SessionConfig;
use riftline_catalog::Catalog;

use crate::ability::affects_kind;
use crate::damage::{deal_damage, Penetration};
use crate::effect::{apply_effect, ApplyResult};
use crate::events::{EventBus, GameEvent};
use crate::grid::SpatialGrid;

// ---------------------------------------------------------------------------
// Projectiles
// ---------------------------------------------------------------------------

/// Integrate every projectile and apply its hits.
///
/// The grid passed in is the previous rebuild; queries widen by one flight
/// step so fast projectiles cannot tunnel past the candidate set.
pub fn advance_projectiles(
    world: &mut World,
    catalog: &Catalog,
    config: &SessionConfig,
    grid: &SpatialGrid,
    events: &mut EventBus,
    dt: f64,
    now: f64,
) {
    for id in world.ids() {
        let Some(record) = world.get(id) else { continue };
        if record.kind != EntityKind::Projectile || record.dead {
            continue;
        }
        let Some(state) = record.projectile.clone() else {
            continue;
        };
        let team = record.team;
        let owner = record.owner.unwrap_or(id);
        let position = record.position;
        let collider = record.collider;

        // Aim resolution. A homing projectile whose target vanished expires.
        let direction = match state.aim {
            ProjectileAim::Direction(d) => d,
            ProjectileAim::Target(target) => match world.get(target).filter(|t| !t.dead) {
                Some(t) => (t.position - position).normalized_or_zero(),
                None => {
                    world.mark_removed(id);
                    continue;
                }
            },
        };

        let step = state.speed * dt;
        let new_position = position + direction * step;
        let new_ttl = state.remaining_ttl - dt;

        {
            let Some(record) = world.get_mut(id) else { continue };
            record.position = new_position;
            record.facing = direction.angle();
            if let Some(proj) = record.projectile.as_mut() {
                proj.remaining_ttl = new_ttl;
            }
        }

        if new_ttl <= 0.0 {
            world.mark_removed(id);
            continue;
        }

        // Hit scan around the new position, widened by the flight step.
        let affects = state
            .ability
            .and_then(|a| catalog.ability(a).ok())
            .map(|def| def.affects)
            .unwrap_or_else(AffectFlags::default);
        let candidates = grid.nearby(
            new_position,
            collider.shape.bounding_radius() + grid.max_bounding_radius() + step,
            |cid| world.get(cid).map(|r| r.collider.center(r.position)),
        );

        let mut struck = Vec::new();
        for candidate in candidates {
            if candidate == id || candidate == owner {
                continue;
            }
            let Some(target) = world.get(candidate) else { continue };
            if target.dead
                || target.damageable.is_none()
                || !team.is_hostile_to(target.team)
                || !affects_kind(affects, target.kind)
                || state.already_hit.contains(&candidate)
            {
                continue;
            }
            if overlaps(new_position, &collider, target.position, &target.collider) {
                struck.push(candidate);
            }
        }

        let mut despawned = false;
        for target in struck {
            if let Some(damage) = state.damage {
                deal_damage(
                    world,
                    catalog,
                    config,
                    events,
                    owner,
                    target,
                    damage,
                    Penetration::default(),
                    false,
                    now,
                );
            }
            for effect_id in &state.on_hit_effects {
                let Ok(effect_def) = catalog.effect(*effect_id) else {
                    continue;
                };
                let Some(target_record) = world.get_mut(target) else {
                    continue;
                };
                if apply_effect(target_record, effect_def, owner, 1) != ApplyResult::Refused {
                    events.publish(GameEvent::EffectApplied {
                        target,
                        effect: *effect_id,
                        source: owner,
                    });
                }
            }
            if state.piercing {
                if let Some(proj) = world.get_mut(id).and_then(|r| r.projectile.as_mut()) {
                    proj.already_hit.push(target);
                }
            } else {
                world.mark_removed(id);
                despawned = true;
                break;
            }
        }
        if despawned {
            continue;
        }
    }
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

/// Burn zone lifetimes and fire due zone payloads.
pub fn advance_zones(
    world: &mut World,
    catalog: &Catalog,
    config: &SessionConfig,
    grid: &SpatialGrid,
    events: &mut EventBus,
    dt: f64,
    now: f64,
) {
    struct DueZone {
        owner: EntityId,
        center: Vec2,
        radius: f64,
        damage: Option<DamageTemplate>,
        effect: Option<riftline_world::ids::EffectId>,
        fires: u32,
        team: riftline_world::records::Team,
    }

    let mut due = Vec::new();
    for id in world.ids() {
        let Some(record) = world.get_mut(id) else { continue };
        if record.kind != EntityKind::Zone {
            continue;
        }
        let center = record.position;
        let team = record.team;
        let owner = record.owner.unwrap_or(id);
        let radius = record.collider.shape.bounding_radius();
        let Some(zone) = record.zone.as_mut() else { continue };

        zone.remaining -= dt;
        let expired = zone.remaining <= 0.0;

        let mut fires = 0u32;
        match zone.tick_interval {
            Some(interval) => {
                zone.next_tick_in -= dt;
                while zone.next_tick_in <= 0.0 {
                    fires += 1;
                    zone.next_tick_in += interval;
                }
            }
            None => {
                // One-shot zones apply on grounding, then never again.
                if zone.next_tick_in <= 0.0 {
                    fires = 1;
                    zone.next_tick_in = f64::INFINITY;
                }
            }
        }

        if fires > 0 {
            due.push(DueZone {
                owner,
                center,
                radius,
                damage: zone.damage,
                effect: zone.effect,
                fires,
                team,
            });
        }
        if expired {
            world.mark_removed(id);
        }
    }

    for zone in due {
        let targets: Vec<EntityId> = grid
            .nearby(zone.center, zone.radius + grid.max_bounding_radius(), |cid| {
                world.get(cid).map(|r| r.position)
            })
            .into_iter()
            .filter(|&cid| {
                let Some(target) = world.get(cid) else { return false };
                !target.dead
                    && target.damageable.is_some()
                    && zone.team.is_hostile_to(target.team)
                    && affects_kind(AffectFlags::default(), target.kind)
                    && target.position.distance(zone.center) <= zone.radius
            })
            .collect();

        for _ in 0..zone.fires {
            for &target in &targets {
                if let Some(damage) = zone.damage {
                    deal_damage(
                        world,
                        catalog,
                        config,
                        events,
                        zone.owner,
                        target,
                        damage,
                        Penetration::default(),
                        false,
                        now,
                    );
                }
                if let Some(effect_id) = zone.effect {
                    let Ok(effect_def) = catalog.effect(effect_id) else {
                        continue;
                    };
                    let Some(target_record) = world.get_mut(target) else {
                        continue;
                    };
                    if apply_effect(target_record, effect_def, zone.owner, 1)
                        != ApplyResult::Refused
                    {
                        events.publish(GameEvent::EffectApplied {
                            target,
                            effect: effect_id,
                            source: zone.owner,
                        });
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
