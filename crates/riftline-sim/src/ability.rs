//! Ability casting and deferred-action execution.
//!
//! Casting validates prerequisites and, on commit, spends the resource and
//! starts the cooldown immediately -- then defers the actual effects to the
//! cast animation's keyframes via the scheduler. Self-targeted instant
//! abilities bypass the scheduler entirely so a shield can never be
//! interrupted after the resource is spent.
//!
//! Interruption runs before the scheduler fires each tick: a hard CC
//! applied on the same tick as a due keyframe wins, and the cast's pending
//! actions are removed.

use tracing::{debug, warn};

use riftline_world::champion::AbilitySlot;
use riftline_world::entity::EntityId;
use riftline_world::math::Vec2;
use riftline_world::records::{
    EntityKind, EntityRecord, ProjectileAim, ProjectileState, ZoneState,
};
use riftline_world::rng::SessionRng;
use riftline_world::shape::Collider;
use riftline_world::store::World;

use riftline_catalog::ability::{AbilityDef, AbilityShape, AffectFlags, TargetType};
use riftline_catalog::animation::KeyframeTrigger;
use riftline_catalog::config::SessionConfig;
use riftline_catalog::Catalog;

use crate::damage::{deal_damage, Penetration};
use crate::effect::{apply_effect, cc_status, ApplyResult};
use crate::events::{EventBus, GameEvent};
use crate::grid::SpatialGrid;
use crate::scheduler::{
    ActionKind, ActionPayload, ActionScheduler, CastSnapshot, ScheduledAction, TargetSelection,
};
use crate::stats::StatSheet;

/// Basic attacks land if the target is still within this factor of attack
/// range when the swing keyframe fires.
const ATTACK_LEASH_FACTOR: f64 = 1.5;

// ---------------------------------------------------------------------------
// Cast results
// ---------------------------------------------------------------------------

/// Why a cast was refused. A structured result, not an error surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastFailReason {
    /// The caster is dead or mid-removal.
    DeadCaster,
    /// The caster is not a champion.
    NotAChampion,
    /// The slot's ability id is missing from the catalog.
    UnknownAbility,
    /// The slot has rank 0.
    NotLearned,
    /// Cooldown has not elapsed.
    OnCooldown,
    /// Not enough mana/energy.
    InsufficientResource,
    /// CC currently forbids casting.
    CcPrevented,
    /// The selection does not fit the ability's target type, or the target
    /// is gone/ineligible.
    InvalidTarget,
    /// The selection is beyond cast range.
    OutOfRange,
}

// ---------------------------------------------------------------------------
// Casting
// ---------------------------------------------------------------------------

/// Attempt to cast the ability in `slot`.
///
/// On success the resource is spent, the cooldown started, an
/// [`GameEvent::AbilityCast`] published, and either the effects applied
/// immediately (self-cast) or the keyframes scheduled.
pub fn cast(
    world: &mut World,
    catalog: &Catalog,
    scheduler: &mut ActionScheduler,
    events: &mut EventBus,
    caster: EntityId,
    slot: AbilitySlot,
    target: TargetSelection,
    now: f64,
) -> Result<(), CastFailReason> {
    // -- validation (shared borrow) -----------------------------------------
    let record = world.get(caster).ok_or(CastFailReason::DeadCaster)?;
    if record.dead {
        return Err(CastFailReason::DeadCaster);
    }
    let champion = record.champion.as_deref().ok_or(CastFailReason::NotAChampion)?;
    let slot_state = *champion.slot(slot);
    let def = catalog
        .ability(slot_state.ability)
        .map_err(|_| CastFailReason::UnknownAbility)?;
    if slot_state.rank == 0 {
        return Err(CastFailReason::NotLearned);
    }
    if slot_state.cooldown_remaining > 0.0 {
        return Err(CastFailReason::OnCooldown);
    }
    let rank = slot_state.rank.min(def.max_rank);
    let rank_data = *def.rank_data(rank).ok_or(CastFailReason::UnknownAbility)?;

    if let Some(damageable) = record.damageable.as_ref() {
        if !cc_status(&damageable.effects, catalog).can_cast {
            return Err(CastFailReason::CcPrevented);
        }
    }

    // Toggle abilities flip state instead of running the cast pipeline; the
    // resource drain while on is the upkeep step's business.
    if def.toggle.is_some() {
        let ability_id = def.id;
        let record = world.get_mut(caster).ok_or(CastFailReason::DeadCaster)?;
        let champion = record
            .champion
            .as_deref_mut()
            .ok_or(CastFailReason::NotAChampion)?;
        let slot_state = champion.slot_mut(slot);
        slot_state.toggled = !slot_state.toggled;
        events.publish(GameEvent::AbilityCast {
            caster,
            ability: ability_id,
            slot,
            target,
        });
        return Ok(());
    }

    if champion.resource < rank_data.cost {
        return Err(CastFailReason::InsufficientResource);
    }
    validate_target(world, record, def, target)?;

    let champ_def = catalog.champion(champion.champion).ok();
    let playback_speed = if def.cast_speed_scaled {
        champ_def
            .map(|d| StatSheet::derive(champion, d).cast_playback_speed())
            .unwrap_or(1.0)
    } else {
        1.0
    };
    let animation = catalog
        .animation(def.animation)
        .map_err(|_| CastFailReason::UnknownAbility)?;

    // -- commit (mutable borrow) --------------------------------------------
    let record = world.get_mut(caster).ok_or(CastFailReason::DeadCaster)?;
    let champion = record.champion.as_deref_mut().ok_or(CastFailReason::NotAChampion)?;
    champion.resource -= rank_data.cost;
    let slot_state = champion.slot_mut(slot);
    slot_state.cooldown_remaining = rank_data.cooldown;

    events.publish(GameEvent::AbilityCast {
        caster,
        ability: def.id,
        slot,
        target,
    });

    // Self-targeted instant abilities apply on cast; nothing to interrupt.
    if def.target_type == TargetType::SelfCast {
        for effect_id in &def.applies_effects {
            let Ok(effect_def) = catalog.effect(*effect_id) else {
                warn!(ability = %def.id, effect = %effect_id, "cast references missing effect");
                continue;
            };
            if apply_effect(record, effect_def, caster, rank) != ApplyResult::Refused {
                events.publish(GameEvent::EffectApplied {
                    target: caster,
                    effect: *effect_id,
                    source: caster,
                });
            }
        }
        return Ok(());
    }

    // Keyframed execution.
    let snapshot = CastSnapshot {
        ability: def.id,
        slot,
        rank,
        target,
    };
    for (time, keyframe) in animation.timed_keyframes(playback_speed) {
        let payload = match keyframe.trigger {
            KeyframeTrigger::Damage => ActionPayload::AbilityDamage(snapshot),
            KeyframeTrigger::Projectile => ActionPayload::SpawnProjectile(snapshot),
            KeyframeTrigger::Effect(effect) => ActionPayload::ApplyEffect {
                cast: snapshot,
                effect,
            },
            KeyframeTrigger::Sound(sound) => ActionPayload::Sound { sound },
            KeyframeTrigger::Vfx(vfx) => ActionPayload::Vfx { vfx },
        };
        scheduler.schedule(caster, now + time, payload);
    }
    Ok(())
}

fn validate_target(
    world: &World,
    caster: &EntityRecord,
    def: &AbilityDef,
    target: TargetSelection,
) -> Result<(), CastFailReason> {
    match def.target_type {
        TargetType::SelfCast | TargetType::NoTarget => Ok(()),
        TargetType::TargetEnemy | TargetType::TargetAlly | TargetType::TargetAny => {
            let TargetSelection::Unit(unit) = target else {
                return Err(CastFailReason::InvalidTarget);
            };
            let record = world.get(unit).ok_or(CastFailReason::InvalidTarget)?;
            if record.dead || !affects_kind(def.affects, record.kind) {
                return Err(CastFailReason::InvalidTarget);
            }
            let hostile = caster.team.is_hostile_to(record.team);
            let relation_ok = match def.target_type {
                TargetType::TargetEnemy => hostile,
                TargetType::TargetAlly => !hostile,
                _ => true,
            };
            if !relation_ok {
                return Err(CastFailReason::InvalidTarget);
            }
            if caster.position.distance(record.position) > def.range {
                return Err(CastFailReason::OutOfRange);
            }
            Ok(())
        }
        TargetType::Skillshot | TargetType::GroundTarget => {
            let TargetSelection::Point(point) = target else {
                return Err(CastFailReason::InvalidTarget);
            };
            if def.target_type == TargetType::GroundTarget
                && caster.position.distance(point) > def.range
            {
                return Err(CastFailReason::OutOfRange);
            }
            Ok(())
        }
    }
}

/// Whether an ability's affect flags allow hitting the given kind.
pub fn affects_kind(flags: AffectFlags, kind: EntityKind) -> bool {
    match kind {
        EntityKind::Champion => flags.champions,
        EntityKind::Minion => flags.minions,
        EntityKind::Tower | EntityKind::Inhibitor | EntityKind::Nexus => flags.towers,
        EntityKind::JungleCamp => flags.jungle,
        EntityKind::Ward => flags.wards,
        EntityKind::Projectile | EntityKind::Zone => false,
    }
}

// ---------------------------------------------------------------------------
// Basic attacks
// ---------------------------------------------------------------------------

/// Start basic-attack swings for champions whose attack-target intent has
/// closed to range. The swing's damage keyframe is scheduled through the
/// same scheduler as ability keyframes; playback speed is chosen so one
/// full swing takes `1 / attacks-per-second`.
pub fn drive_basic_attacks(
    world: &mut World,
    catalog: &Catalog,
    scheduler: &mut ActionScheduler,
    now: f64,
) {
    for id in world.ids() {
        let Some(record) = world.get(id) else { continue };
        if record.dead {
            continue;
        }
        let Some(champion) = record.champion.as_deref() else {
            continue;
        };
        let Some(motion) = record.motion.as_ref() else { continue };
        let riftline_world::motion::MovementIntent::AttackTarget(target) = motion.intent else {
            continue;
        };
        if champion.attack_cooldown > 0.0 {
            continue;
        }
        let Some(damageable) = record.damageable.as_ref() else {
            continue;
        };
        if !cc_status(&damageable.effects, catalog).can_attack {
            continue;
        }
        let Ok(champ_def) = catalog.champion(champion.champion) else {
            continue;
        };
        let sheet = StatSheet::derive(champion, champ_def);
        if sheet.attack_speed <= 0.0 {
            continue;
        }
        let Some(target_record) = world.get(target) else { continue };
        if target_record.dead || !record.team.is_hostile_to(target_record.team) {
            continue;
        }
        if record.position.distance(target_record.position) > sheet.attack_range {
            continue;
        }
        let Ok(animation) = catalog.animation(champ_def.basic_attack_animation) else {
            continue;
        };
        // One swing spans exactly one attack period.
        let playback_speed = animation.duration(1.0) * sheet.attack_speed;
        for (time, keyframe) in animation.timed_keyframes(playback_speed) {
            if keyframe.trigger == KeyframeTrigger::Damage {
                scheduler.schedule(id, now + time, ActionPayload::BasicAttack { target });
            }
        }
        let Some(champion) = world
            .get_mut(id)
            .and_then(|r| r.champion.as_deref_mut()) else {
            continue;
        };
        champion.attack_cooldown = 1.0 / sheet.attack_speed;
    }
}

// ---------------------------------------------------------------------------
// Interruption
// ---------------------------------------------------------------------------

/// Cancel pending cast actions invalidated by CC, before the scheduler
/// fires this tick. A stun applied on the same tick as a due keyframe wins
/// because this runs in the cooldown/effect step and the scheduler fires
/// afterwards.
pub fn cancel_interrupted(world: &mut World, catalog: &Catalog, scheduler: &mut ActionScheduler) {
    for id in world.ids() {
        if scheduler.pending_for(id) == 0 {
            continue;
        }
        let Some(record) = world.get_mut(id) else { continue };
        let Some(damageable) = record.damageable.as_ref() else {
            continue;
        };
        let status = cc_status(&damageable.effects, catalog);
        let stunned = status.is_stunned;
        let silenced = status.is_silenced;
        let disarmed = status.is_disarmed;

        if stunned || silenced {
            // Ability keyframes are interrupted.
            scheduler.cancel(id, Some(ActionKind::AbilityDamage));
            scheduler.cancel(id, Some(ActionKind::SpawnProjectile));
            scheduler.cancel(id, Some(ActionKind::ApplyEffect));
            scheduler.cancel(id, Some(ActionKind::Cosmetic));
            if let Some(champion) = record.champion.as_deref_mut() {
                for slot in champion.slots.iter_mut() {
                    slot.channeling = false;
                    slot.charging = false;
                }
            }
        }
        if stunned || disarmed {
            scheduler.cancel(id, Some(ActionKind::BasicAttack));
        }
    }
}

// ---------------------------------------------------------------------------
// Execution of due actions
// ---------------------------------------------------------------------------

/// Execute actions the scheduler fired this tick, in fire order.
///
/// Spawned projectiles start at the caster's position *at fire time*, aimed
/// at the target position captured at fire time.
#[allow(clippy::too_many_arguments)]
pub fn execute_actions(
    world: &mut World,
    catalog: &Catalog,
    config: &SessionConfig,
    grid: &SpatialGrid,
    events: &mut EventBus,
    rng: &mut SessionRng,
    actions: &[ScheduledAction],
    now: f64,
) {
    for action in actions {
        let caster = action.entity;
        match &action.payload {
            ActionPayload::BasicAttack { target } => {
                land_basic_attack(world, catalog, config, events, rng, caster, *target, now);
            }
            ActionPayload::AbilityDamage(cast) => {
                let Ok(def) = catalog.ability(cast.ability) else {
                    warn!(ability = %cast.ability, "fired damage for unknown ability");
                    continue;
                };
                let Some(damage) = def.rank_data(cast.rank).and_then(|r| r.damage) else {
                    continue;
                };
                for target in resolve_targets(world, grid, caster, def, cast.target) {
                    deal_damage(
                        world,
                        catalog,
                        config,
                        events,
                        caster,
                        target,
                        damage,
                        Penetration::default(),
                        false,
                        now,
                    );
                }
            }
            ActionPayload::SpawnProjectile(cast) => {
                spawn_projectile(world, catalog, events, caster, cast);
            }
            ActionPayload::ApplyEffect { cast, effect } => {
                let Ok(def) = catalog.ability(cast.ability) else {
                    warn!(ability = %cast.ability, "fired effect for unknown ability");
                    continue;
                };
                let Ok(effect_def) = catalog.effect(*effect) else {
                    warn!(effect = %effect, "fired unknown effect");
                    continue;
                };
                if let Some(zone_spec) = def.zone {
                    ground_zone(world, events, caster, cast, &zone_spec, *effect);
                    continue;
                }
                for target in resolve_targets(world, grid, caster, def, cast.target) {
                    let Some(record) = world.get_mut(target) else { continue };
                    if apply_effect(record, effect_def, caster, cast.rank) != ApplyResult::Refused {
                        events.publish(GameEvent::EffectApplied {
                            target,
                            effect: *effect,
                            source: caster,
                        });
                    }
                }
            }
            ActionPayload::Sound { sound } => {
                debug!(entity = %caster, sound = %sound, "sound cue");
            }
            ActionPayload::Vfx { vfx } => {
                debug!(entity = %caster, vfx = %vfx, "vfx cue");
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn land_basic_attack(
    world: &mut World,
    catalog: &Catalog,
    config: &SessionConfig,
    events: &mut EventBus,
    rng: &mut SessionRng,
    attacker: EntityId,
    target: EntityId,
    now: f64,
) {
    let Some(record) = world.get(attacker) else { return };
    if record.dead {
        return;
    }
    let Some(champion) = record.champion.as_deref() else {
        return;
    };
    let Ok(champ_def) = catalog.champion(champion.champion) else {
        return;
    };
    let sheet = StatSheet::derive(champion, champ_def);
    let Some(target_record) = world.get(target) else { return };
    if target_record.dead {
        return;
    }
    // The swing whiffs if the target broke the leash during the wind-up.
    if record.position.distance(target_record.position) > sheet.attack_range * ATTACK_LEASH_FACTOR
    {
        return;
    }
    let crit = sheet.crit_chance > 0.0 && rng.chance(sheet.crit_chance);
    deal_damage(
        world,
        catalog,
        config,
        events,
        attacker,
        target,
        riftline_world::records::DamageTemplate {
            amount: sheet.attack_damage,
            kind: riftline_world::records::DamageKind::Physical,
        },
        Penetration::default(),
        crit,
        now,
    );
}

fn spawn_projectile(
    world: &mut World,
    catalog: &Catalog,
    events: &mut EventBus,
    caster: EntityId,
    cast: &CastSnapshot,
) {
    let Ok(def) = catalog.ability(cast.ability) else {
        warn!(ability = %cast.ability, "projectile fired for unknown ability");
        return;
    };
    let Some(spec) = def.projectile else {
        warn!(ability = %cast.ability, "projectile keyframe on ability with no projectile spec");
        return;
    };
    let Some(caster_record) = world.get(caster) else { return };
    if caster_record.dead {
        return;
    }
    let origin = caster_record.position;
    let team = caster_record.team;

    // Aim captured at fire time: unit targets are homed, points are flown
    // toward where the point was.
    let aim = match cast.target {
        TargetSelection::Unit(unit) => ProjectileAim::Target(unit),
        TargetSelection::Point(point) => {
            ProjectileAim::Direction((point - origin).normalized_or_zero())
        }
        TargetSelection::None => ProjectileAim::Direction(Vec2::from_angle(caster_record.facing)),
    };

    let mut record = EntityRecord::new(
        EntityKind::Projectile,
        team,
        origin,
        Collider::circle(spec.radius),
    );
    record.owner = Some(caster);
    record.projectile = Some(ProjectileState {
        origin,
        aim,
        speed: spec.speed,
        remaining_ttl: spec.ttl,
        piercing: spec.piercing,
        on_hit_effects: def.applies_effects.iter().copied().collect(),
        damage: def.rank_data(cast.rank).and_then(|r| r.damage),
        ability: Some(def.id),
        already_hit: Vec::new(),
    });
    let projectile = world.insert(record);
    events.publish(GameEvent::ProjectileSpawned {
        projectile,
        caster,
        ability: Some(def.id),
    });
}

fn ground_zone(
    world: &mut World,
    events: &mut EventBus,
    caster: EntityId,
    cast: &CastSnapshot,
    spec: &riftline_catalog::ability::ZoneSpec,
    effect: riftline_world::ids::EffectId,
) {
    let Some(caster_record) = world.get(caster) else { return };
    let team = caster_record.team;
    let center = match cast.target {
        TargetSelection::Point(point) => point,
        TargetSelection::Unit(unit) => world
            .get(unit)
            .map(|r| r.position)
            .unwrap_or(caster_record.position),
        TargetSelection::None => caster_record.position,
    };
    let mut record = EntityRecord::new(EntityKind::Zone, team, center, Collider::circle(spec.radius));
    record.owner = Some(caster);
    record.zone = Some(ZoneState {
        remaining: spec.duration,
        tick_interval: spec.tick_interval,
        next_tick_in: spec.tick_interval.unwrap_or(0.0),
        damage: spec.damage,
        effect: Some(effect),
    });
    let zone = world.insert(record);
    events.publish(GameEvent::EffectApplied {
        target: zone,
        effect,
        source: caster,
    });
}

// ---------------------------------------------------------------------------
// Target resolution
// ---------------------------------------------------------------------------

/// Resolve the entities an ability touches at fire time.
///
/// Unit-target abilities resolve to the unit if it is still eligible; area
/// shapes gather candidates from the grid around the application point and
/// filter by team relation, affect flags, and shape membership. Results are
/// id-sorted for determinism.
pub fn resolve_targets(
    world: &World,
    grid: &SpatialGrid,
    caster: EntityId,
    def: &AbilityDef,
    target: TargetSelection,
) -> Vec<EntityId> {
    let Some(caster_record) = world.get(caster) else {
        return Vec::new();
    };
    let caster_team = caster_record.team;
    let caster_pos = caster_record.position;

    let wants_allies = def.target_type == TargetType::TargetAlly;
    let eligible = |record: &EntityRecord| -> bool {
        if record.dead || record.id == caster {
            return false;
        }
        if !affects_kind(def.affects, record.kind) {
            return false;
        }
        let hostile = caster_team.is_hostile_to(record.team);
        if wants_allies {
            !hostile
        } else {
            hostile
        }
    };

    match (def.shape, target) {
        (AbilityShape::Single, TargetSelection::Unit(unit)) => world
            .get(unit)
            .filter(|r| eligible(r))
            .map(|r| vec![r.id])
            .unwrap_or_default(),
        (AbilityShape::Single, _) => Vec::new(),
        (shape, target) => {
            let center = match target {
                TargetSelection::Point(point) => point,
                TargetSelection::Unit(unit) => {
                    world.get(unit).map(|r| r.position).unwrap_or(caster_pos)
                }
                TargetSelection::None => caster_pos,
            };
            let (query_center, query_radius) = match shape {
                AbilityShape::Circle { radius } => (center, radius),
                AbilityShape::Rect { width, height } => {
                    (center, Vec2::new(width, height).length() / 2.0)
                }
                AbilityShape::Cone { radius, .. } => (caster_pos, radius),
                AbilityShape::Line { length, width } => {
                    (caster_pos, length + width)
                }
                AbilityShape::Single => (center, 0.0),
            };
            // Widen by the largest body so big targets on the rim are seen.
            let margin = grid.max_bounding_radius();
            let mut hits: Vec<EntityId> = grid
                .nearby(query_center, query_radius + margin, |id| {
                    world.get(id).map(|r| r.position)
                })
                .into_iter()
                .filter(|&id| {
                    let Some(record) = world.get(id) else { return false };
                    eligible(record)
                        && in_shape(shape, caster_pos, center, record.position)
                })
                .collect();
            hits.sort_unstable();
            hits
        }
    }
}

/// Shape membership test for a target position.
fn in_shape(shape: AbilityShape, caster: Vec2, center: Vec2, target: Vec2) -> bool {
    match shape {
        AbilityShape::Single => false,
        AbilityShape::Circle { radius } => target.distance(center) <= radius,
        AbilityShape::Rect { width, height } => {
            (target.x - center.x).abs() <= width / 2.0
                && (target.y - center.y).abs() <= height / 2.0
        }
        AbilityShape::Cone { radius, angle } => {
            let to_target = target - caster;
            if to_target.length() > radius {
                return false;
            }
            let aim = (center - caster).normalized_or_zero();
            if aim == Vec2::ZERO {
                return true;
            }
            let dir = to_target.normalized_or_zero();
            dir.dot(aim) >= (angle / 2.0).cos()
        }
        AbilityShape::Line { length, width } => {
            let aim = (center - caster).normalized_or_zero();
            if aim == Vec2::ZERO {
                return false;
            }
            let to_target = target - caster;
            let along = to_target.dot(aim);
            if !(0.0..=length).contains(&along) {
                return false;
            }
            let lateral = (to_target - aim * along).length();
            lateral <= width / 2.0
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use riftline_catalog::content::{demo_catalog, WARDEN};
    use riftline_world::champion::ChampionState;
    use riftline_world::prelude::*;

    struct Rig {
        world: World,
        catalog: Catalog,
        scheduler: ActionScheduler,
        events: EventBus,
        config: SessionConfig,
        rng: SessionRng,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                world: World::new(),
                catalog: demo_catalog(),
                scheduler: ActionScheduler::new(),
                events: EventBus::default(),
                config: SessionConfig::default(),
                rng: SessionRng::new(7),
            }
        }

        fn spawn_champion(&mut self, team: Team, position: Vec2, learned: bool) -> EntityId {
            let def = self.catalog.champion(WARDEN).unwrap();
            let mut record =
                EntityRecord::new(EntityKind::Champion, team, position, def.collider);
            record.damageable = Some(Damageable::new(640.0, 34.0, 32.0));
            let mut state = ChampionState::new(WARDEN, def.abilities, def.passive);
            state.resource = 280.0;
            if learned {
                for slot in state.slots.iter_mut() {
                    slot.rank = 1;
                }
            }
            record.champion = Some(Box::new(state));
            record.motion = Some(MotionState::default());
            self.world.insert(record)
        }

        fn grid(&self) -> SpatialGrid {
            let mut grid = SpatialGrid::new(100.0);
            grid.rebuild(&self.world);
            grid
        }

        fn run_until(&mut self, now: f64) {
            let mut due = Vec::new();
            self.scheduler.advance_to(now, |a| due.push(a.clone()));
            let grid = self.grid();
            execute_actions(
                &mut self.world,
                &self.catalog,
                &self.config,
                &grid,
                &mut self.events,
                &mut self.rng,
                &due,
                now,
            );
        }
    }

    #[test]
    fn cast_commits_resource_and_cooldown_immediately() {
        let mut rig = Rig::new();
        let caster = rig.spawn_champion(Team::Blue, Vec2::ZERO, true);
        let victim = rig.spawn_champion(Team::Red, Vec2::new(300.0, 0.0), false);

        cast(
            &mut rig.world,
            &rig.catalog,
            &mut rig.scheduler,
            &mut rig.events,
            caster,
            AbilitySlot::R,
            TargetSelection::Unit(victim),
            0.0,
        )
        .unwrap();

        let champ = rig.world.get(caster).unwrap().champion.as_deref().unwrap();
        // Sunder rank 1: cost 100, cooldown 80.
        assert_eq!(champ.resource, 180.0);
        assert_eq!(champ.slot(AbilitySlot::R).cooldown_remaining, 80.0);
        // Damage has NOT landed yet; it rides the 0.3s keyframe.
        assert_eq!(
            rig.world
                .get(victim)
                .unwrap()
                .damageable
                .as_ref()
                .unwrap()
                .health,
            640.0
        );
        assert!(rig.scheduler.pending_for(caster) > 0);
    }

    #[test]
    fn keyframe_lands_damage_and_stun() {
        let mut rig = Rig::new();
        let caster = rig.spawn_champion(Team::Blue, Vec2::ZERO, true);
        let victim = rig.spawn_champion(Team::Red, Vec2::new(300.0, 0.0), false);

        cast(
            &mut rig.world,
            &rig.catalog,
            &mut rig.scheduler,
            &mut rig.events,
            caster,
            AbilitySlot::R,
            TargetSelection::Unit(victim),
            0.0,
        )
        .unwrap();

        rig.run_until(0.5);
        let damageable = rig.world.get(victim).unwrap().damageable.as_ref().unwrap();
        assert!(damageable.health < 640.0);
        assert!(damageable.effects.iter().any(|e| e.effect
            == riftline_catalog::content::STUN));
    }

    #[test]
    fn cooldown_gates_recast() {
        let mut rig = Rig::new();
        let caster = rig.spawn_champion(Team::Blue, Vec2::ZERO, true);
        let victim = rig.spawn_champion(Team::Red, Vec2::new(300.0, 0.0), false);

        let target = TargetSelection::Unit(victim);
        cast(
            &mut rig.world,
            &rig.catalog,
            &mut rig.scheduler,
            &mut rig.events,
            caster,
            AbilitySlot::R,
            target,
            0.0,
        )
        .unwrap();
        assert_eq!(
            cast(
                &mut rig.world,
                &rig.catalog,
                &mut rig.scheduler,
                &mut rig.events,
                caster,
                AbilitySlot::R,
                target,
                0.1,
            ),
            Err(CastFailReason::OnCooldown)
        );
    }

    #[test]
    fn unlearned_and_poor_casts_fail() {
        let mut rig = Rig::new();
        let caster = rig.spawn_champion(Team::Blue, Vec2::ZERO, false);
        assert_eq!(
            cast(
                &mut rig.world,
                &rig.catalog,
                &mut rig.scheduler,
                &mut rig.events,
                caster,
                AbilitySlot::Q,
                TargetSelection::Point(Vec2::new(500.0, 0.0)),
                0.0,
            ),
            Err(CastFailReason::NotLearned)
        );

        let broke = rig.spawn_champion(Team::Blue, Vec2::new(50.0, 0.0), true);
        rig.world
            .get_mut(broke)
            .unwrap()
            .champion
            .as_deref_mut()
            .unwrap()
            .resource = 0.0;
        assert_eq!(
            cast(
                &mut rig.world,
                &rig.catalog,
                &mut rig.scheduler,
                &mut rig.events,
                broke,
                AbilitySlot::Q,
                TargetSelection::Point(Vec2::new(500.0, 0.0)),
                0.0,
            ),
            Err(CastFailReason::InsufficientResource)
        );
    }

    #[test]
    fn out_of_range_unit_target_fails() {
        let mut rig = Rig::new();
        let caster = rig.spawn_champion(Team::Blue, Vec2::ZERO, true);
        let victim = rig.spawn_champion(Team::Red, Vec2::new(2000.0, 0.0), false);
        assert_eq!(
            cast(
                &mut rig.world,
                &rig.catalog,
                &mut rig.scheduler,
                &mut rig.events,
                caster,
                AbilitySlot::R,
                TargetSelection::Unit(victim),
                0.0,
            ),
            Err(CastFailReason::OutOfRange)
        );
    }

    #[test]
    fn self_cast_applies_immediately_and_schedules_nothing() {
        let mut rig = Rig::new();
        let caster = rig.spawn_champion(Team::Blue, Vec2::ZERO, true);
        cast(
            &mut rig.world,
            &rig.catalog,
            &mut rig.scheduler,
            &mut rig.events,
            caster,
            AbilitySlot::W,
            TargetSelection::None,
            0.0,
        )
        .unwrap();

        // Bulwark's barrier is up the moment the cast commits.
        let damageable = rig.world.get(caster).unwrap().damageable.as_ref().unwrap();
        assert_eq!(damageable.total_shield(), 80.0);
        assert_eq!(rig.scheduler.pending_for(caster), 0);
    }

    #[test]
    fn stun_before_keyframe_cancels_the_cast() {
        let mut rig = Rig::new();
        let caster = rig.spawn_champion(Team::Blue, Vec2::ZERO, true);
        let victim = rig.spawn_champion(Team::Red, Vec2::new(300.0, 0.0), false);

        cast(
            &mut rig.world,
            &rig.catalog,
            &mut rig.scheduler,
            &mut rig.events,
            caster,
            AbilitySlot::R,
            TargetSelection::Unit(victim),
            0.0,
        )
        .unwrap();

        // Stun the caster before the 0.3s damage keyframe.
        let stun_def = rig.catalog.effect(riftline_catalog::content::STUN).unwrap().clone();
        apply_effect(rig.world.get_mut(caster).unwrap(), &stun_def, victim, 1);
        cancel_interrupted(&mut rig.world, &rig.catalog, &mut rig.scheduler);

        rig.run_until(0.5);
        // No damage dealt, no stun on the victim; the cooldown stays spent.
        let damageable = rig.world.get(victim).unwrap().damageable.as_ref().unwrap();
        assert_eq!(damageable.health, 640.0);
        assert!(damageable.effects.is_empty());
        let champ = rig.world.get(caster).unwrap().champion.as_deref().unwrap();
        assert!(champ.slot(AbilitySlot::R).cooldown_remaining > 0.0);
    }

    #[test]
    fn projectile_spawns_at_fire_time_position() {
        let mut rig = Rig::new();
        let caster = rig.spawn_champion(Team::Blue, Vec2::ZERO, true);

        cast(
            &mut rig.world,
            &rig.catalog,
            &mut rig.scheduler,
            &mut rig.events,
            caster,
            AbilitySlot::Q,
            TargetSelection::Point(Vec2::new(900.0, 0.0)),
            0.0,
        )
        .unwrap();

        // Move the caster before the projectile keyframe fires.
        rig.world.get_mut(caster).unwrap().position = Vec2::new(0.0, 100.0);
        rig.run_until(0.5);

        let projectile = rig
            .world
            .iter()
            .find(|r| r.kind == EntityKind::Projectile)
            .expect("projectile spawned");
        assert_eq!(projectile.position, Vec2::new(0.0, 100.0));
        assert_eq!(projectile.team, Team::Blue);
    }

    #[test]
    fn nova_hits_only_eligible_targets_in_shape() {
        let mut rig = Rig::new();
        let caster = rig.spawn_champion(Team::Blue, Vec2::ZERO, true);
        let near_enemy = rig.spawn_champion(Team::Red, Vec2::new(200.0, 0.0), false);
        let far_enemy = rig.spawn_champion(Team::Red, Vec2::new(900.0, 0.0), false);
        let ally = rig.spawn_champion(Team::Blue, Vec2::new(100.0, 0.0), false);

        cast(
            &mut rig.world,
            &rig.catalog,
            &mut rig.scheduler,
            &mut rig.events,
            caster,
            AbilitySlot::E,
            TargetSelection::None,
            0.0,
        )
        .unwrap();
        rig.run_until(1.0);

        let health = |id: EntityId| {
            rig.world
                .get(id)
                .unwrap()
                .damageable
                .as_ref()
                .unwrap()
                .health
        };
        assert!(health(near_enemy) < 640.0);
        assert_eq!(health(far_enemy), 640.0);
        assert_eq!(health(ally), 640.0);
    }

    #[test]
    fn toggle_cast_flips_state_without_spending() {
        let mut rig = Rig::new();
        rig.catalog
            .abilities
            .get_mut(&riftline_catalog::content::PIERCING_BOLT)
            .unwrap()
            .toggle = Some(riftline_catalog::ability::ToggleSpec {
            drain_per_second: 10.0,
        });
        let caster = rig.spawn_champion(Team::Blue, Vec2::ZERO, true);

        cast(
            &mut rig.world,
            &rig.catalog,
            &mut rig.scheduler,
            &mut rig.events,
            caster,
            AbilitySlot::Q,
            TargetSelection::None,
            0.0,
        )
        .unwrap();

        let champ = rig.world.get(caster).unwrap().champion.as_deref().unwrap();
        assert!(champ.slot(AbilitySlot::Q).toggled);
        // No resource spent, no cooldown, nothing scheduled.
        assert_eq!(champ.resource, 280.0);
        assert_eq!(champ.slot(AbilitySlot::Q).cooldown_remaining, 0.0);
        assert_eq!(rig.scheduler.pending_for(caster), 0);

        // A second cast toggles it back off.
        cast(
            &mut rig.world,
            &rig.catalog,
            &mut rig.scheduler,
            &mut rig.events,
            caster,
            AbilitySlot::Q,
            TargetSelection::None,
            0.1,
        )
        .unwrap();
        let champ = rig.world.get(caster).unwrap().champion.as_deref().unwrap();
        assert!(!champ.slot(AbilitySlot::Q).toggled);
    }

    #[test]
    fn affect_flags_gate_kinds() {
        let flags = AffectFlags::default();
        assert!(affects_kind(flags, EntityKind::Champion));
        assert!(affects_kind(flags, EntityKind::Minion));
        assert!(affects_kind(flags, EntityKind::JungleCamp));
        assert!(!affects_kind(flags, EntityKind::Tower));
        assert!(!affects_kind(flags, EntityKind::Ward));
        assert!(!affects_kind(flags, EntityKind::Projectile));
    }
}
