//! Dirty-field delta encoding with per-client baselines.
//!
//! Each client connection keeps, per entity, the field snapshot it last
//! received and the tick it was sent. The encoder compares the current
//! authoritative state against that baseline with quantized floats (so
//! sub-epsilon jitter never produces a delta), emits only the changed
//! fields, and emits a creation record the first time an entity reaches a
//! client. Entities that left the visible set get a removal delta.
//!
//! Invariant: a delta referring to an entity id the client has never seen
//! is itself a creation record -- guaranteed because the first send for any
//! id always carries `created`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use riftline_world::champion::ABILITY_SLOTS;
use riftline_world::entity::EntityId;
use riftline_world::ids::{ChampionId, EffectId, ItemId, PlayerId};
use riftline_world::math::Vec2;
use riftline_world::motion::MovementIntent;
use riftline_world::records::{EntityKind, EntityRecord, Team};
use riftline_world::store::World;

use riftline_catalog::config::SessionConfig;
use riftline_sim::events::GameEvent;

use crate::priority::{classify, should_send, SendContext};
use crate::protocol::SequenceGate;

// ---------------------------------------------------------------------------
// Field snapshots
// ---------------------------------------------------------------------------

fn quantize(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}

/// Per-slot ability state as the client sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityFields {
    /// Current rank.
    pub rank: u8,
    /// Cooldown remaining, quantized.
    pub cooldown: f64,
    /// Behavior flags packed as (charging, channeling, toggled, transformed).
    pub flags: (bool, bool, bool, bool),
}

/// One active effect as the client sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectFields {
    /// The effect definition.
    pub effect: EffectId,
    /// Stack count.
    pub stacks: u32,
    /// Remaining duration, quantized.
    pub remaining: f64,
}

/// Entity state flags delivered to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateFlags {
    /// The entity is dead (awaiting respawn or removal).
    pub dead: bool,
    /// A recall channel is running.
    pub recalling: bool,
}

/// The comparable field set for one entity. Floats are quantized at
/// capture so comparison is plain equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    /// World position, quantized.
    pub position: Vec2,
    /// Facing, quantized.
    pub facing: f64,
    /// Current health, quantized. Zero for non-damageables.
    pub health: f64,
    /// Maximum health, quantized.
    pub max_health: f64,
    /// Total shielding, quantized.
    pub shields: f64,
    /// Current resource, quantized.
    pub resource: f64,
    /// Champion level.
    pub level: u8,
    /// Champion gold.
    pub gold: u32,
    /// Active effects in application order.
    pub effects: Vec<EffectFields>,
    /// Ability slots, for champions.
    pub abilities: Option<[AbilityFields; ABILITY_SLOTS]>,
    /// Inventory, for champions.
    pub items: Option<[Option<ItemId>; 6]>,
    /// Current attack target, if any.
    pub target: Option<EntityId>,
    /// State flags.
    pub flags: StateFlags,
    /// Passive stacks, for champions.
    pub passive_stacks: u32,
}

impl FieldSnapshot {
    /// Capture the client-facing fields from a record.
    pub fn capture(record: &EntityRecord, step: f64) -> Self {
        let damageable = record.damageable.as_ref();
        let champion = record.champion.as_deref();
        Self {
            position: Vec2::new(
                quantize(record.position.x, step),
                quantize(record.position.y, step),
            ),
            facing: quantize(record.facing, step),
            health: quantize(damageable.map_or(0.0, |d| d.health), step),
            max_health: quantize(damageable.map_or(0.0, |d| d.max_health), step),
            shields: quantize(damageable.map_or(0.0, |d| d.total_shield()), step),
            resource: quantize(champion.map_or(0.0, |c| c.resource), step),
            level: champion.map_or(0, |c| c.level),
            gold: champion.map_or(0, |c| c.gold),
            effects: damageable
                .map(|d| {
                    d.effects
                        .iter()
                        .map(|e| EffectFields {
                            effect: e.effect,
                            stacks: e.stacks,
                            remaining: quantize(e.remaining, step),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            abilities: champion.map(|c| {
                let mut slots = [AbilityFields {
                    rank: 0,
                    cooldown: 0.0,
                    flags: (false, false, false, false),
                }; ABILITY_SLOTS];
                for (out, slot) in slots.iter_mut().zip(c.slots.iter()) {
                    *out = AbilityFields {
                        rank: slot.rank,
                        cooldown: quantize(slot.cooldown_remaining, step),
                        flags: (slot.charging, slot.channeling, slot.toggled, slot.transformed),
                    };
                }
                slots
            }),
            items: champion.map(|c| c.inventory),
            target: record.motion.as_ref().and_then(|m| match m.intent {
                MovementIntent::AttackTarget(t) => Some(t),
                _ => None,
            }),
            flags: StateFlags {
                dead: record.dead,
                recalling: champion.is_some_and(|c| c.recall_remaining.is_some()),
            },
            passive_stacks: champion.map_or(0, |c| c.passive.stacks),
        }
    }
}

// ---------------------------------------------------------------------------
// Delta records
// ---------------------------------------------------------------------------

/// Immutable identity carried by a creation record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreationInfo {
    /// Kind tag.
    pub kind: EntityKind,
    /// Owning team.
    pub team: Team,
    /// Champion variant, for champion entities.
    pub champion: Option<ChampionId>,
}

/// The changed-field subset for one entity. `None` fields did not change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangedFields {
    /// Position, when moved.
    pub position: Option<Vec2>,
    /// Facing, when turned.
    pub facing: Option<f64>,
    /// Health, when changed.
    pub health: Option<f64>,
    /// Max health, when changed.
    pub max_health: Option<f64>,
    /// Shield total, when changed.
    pub shields: Option<f64>,
    /// Resource, when changed.
    pub resource: Option<f64>,
    /// Level, when changed.
    pub level: Option<u8>,
    /// Gold, when changed.
    pub gold: Option<u32>,
    /// Full effect list, when changed.
    pub effects: Option<Vec<EffectFields>>,
    /// Ability slots, when changed.
    pub abilities: Option<[AbilityFields; ABILITY_SLOTS]>,
    /// Inventory, when changed.
    pub items: Option<[Option<ItemId>; 6]>,
    /// Attack target, when changed (outer `Some` marks the change).
    pub target: Option<Option<EntityId>>,
    /// State flags, when changed.
    pub flags: Option<StateFlags>,
    /// Passive stacks, when changed.
    pub passive_stacks: Option<u32>,
}

impl ChangedFields {
    /// Every field set, for creation records and full resyncs.
    fn full(snapshot: &FieldSnapshot) -> Self {
        Self {
            position: Some(snapshot.position),
            facing: Some(snapshot.facing),
            health: Some(snapshot.health),
            max_health: Some(snapshot.max_health),
            shields: Some(snapshot.shields),
            resource: Some(snapshot.resource),
            level: Some(snapshot.level),
            gold: Some(snapshot.gold),
            effects: Some(snapshot.effects.clone()),
            abilities: snapshot.abilities,
            items: snapshot.items,
            target: Some(snapshot.target),
            flags: Some(snapshot.flags),
            passive_stacks: Some(snapshot.passive_stacks),
        }
    }

    /// Only the fields that differ between baseline and current.
    fn diff(previous: &FieldSnapshot, current: &FieldSnapshot) -> Self {
        let mut changed = Self::default();
        if previous.position != current.position {
            changed.position = Some(current.position);
        }
        if previous.facing != current.facing {
            changed.facing = Some(current.facing);
        }
        if previous.health != current.health {
            changed.health = Some(current.health);
        }
        if previous.max_health != current.max_health {
            changed.max_health = Some(current.max_health);
        }
        if previous.shields != current.shields {
            changed.shields = Some(current.shields);
        }
        if previous.resource != current.resource {
            changed.resource = Some(current.resource);
        }
        if previous.level != current.level {
            changed.level = Some(current.level);
        }
        if previous.gold != current.gold {
            changed.gold = Some(current.gold);
        }
        if previous.effects != current.effects {
            changed.effects = Some(current.effects.clone());
        }
        if previous.abilities != current.abilities {
            changed.abilities = current.abilities;
        }
        if previous.items != current.items {
            changed.items = current.items;
        }
        if previous.target != current.target {
            changed.target = Some(current.target);
        }
        if previous.flags != current.flags {
            changed.flags = Some(current.flags);
        }
        if previous.passive_stacks != current.passive_stacks {
            changed.passive_stacks = Some(current.passive_stacks);
        }
        changed
    }

    /// Whether any field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// One per-entity delta record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDelta {
    /// The entity this record describes.
    pub entity: EntityId,
    /// Present on the first delivery of this entity to this client.
    pub created: Option<CreationInfo>,
    /// The entity left the client's visible set; drop it client-side.
    pub removed: bool,
    /// Changed fields since the last send.
    pub fields: ChangedFields,
}

/// The per-tick message for one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Server tick number; strictly increasing per client.
    pub tick: u64,
    /// Entity deltas: live entities in ascending id order, then removals.
    pub deltas: Vec<EntityDelta>,
    /// Events whose involved entities are visible to this client.
    pub events: Vec<GameEvent>,
}

// ---------------------------------------------------------------------------
// ClientView
// ---------------------------------------------------------------------------

/// Baseline record for one entity on one connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SentState {
    snapshot: FieldSnapshot,
    tick: u64,
}

/// Per-connection delivery state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientView {
    /// The connected player.
    pub player: PlayerId,
    /// The player's team.
    pub team: Team,
    /// The player's champion entity, if spawned.
    pub champion: Option<EntityId>,
    /// Inbound sequence tracking.
    pub sequence: SequenceGate,
    /// Last tick the client acknowledged; hook for the lag-compensation
    /// history buffer (rewind itself is out of scope).
    pub last_acked_tick: Option<u64>,
    /// Per-entity baselines.
    baselines: BTreeMap<EntityId, SentState>,
}

impl ClientView {
    /// A fresh view for a connection.
    pub fn new(player: PlayerId, team: Team) -> Self {
        Self {
            player,
            team,
            champion: None,
            sequence: SequenceGate::default(),
            last_acked_tick: None,
            baselines: BTreeMap::new(),
        }
    }

    /// Whether this client has ever been sent the entity.
    pub fn knows(&self, entity: EntityId) -> bool {
        self.baselines.contains_key(&entity)
    }

    /// Drop all baselines, forcing creation records on the next update
    /// (used for resync after reconnect).
    pub fn reset_baselines(&mut self) {
        self.baselines.clear();
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Build one client's [`StateUpdate`] for the tick.
///
/// `visible` is the cached team vision for this client's team. Deltas come
/// out in ascending entity id order; removals follow the live deltas.
pub fn build_update(
    world: &World,
    visible: &BTreeSet<EntityId>,
    events: &[GameEvent],
    view: &mut ClientView,
    config: &SessionConfig,
    tick: u64,
) -> StateUpdate {
    let champion_pos = view
        .champion
        .and_then(|id| world.get(id))
        .filter(|r| !r.dead)
        .map(|r| r.position);

    let mut deltas = Vec::new();

    for &id in visible {
        let Some(record) = world.get(id) else { continue };
        let baseline = view.baselines.get(&id);
        let is_new = baseline.is_none();
        let moved_past_threshold = baseline
            .map(|b| b.snapshot.position.distance(record.position) > config.movement_threshold)
            .unwrap_or(false);
        let ticks_since_sent = baseline.map(|b| tick.saturating_sub(b.tick)).unwrap_or(0);

        let send = match champion_pos {
            Some(pos) => {
                let priority = classify(record.kind, pos.distance(record.position), config);
                should_send(
                    priority,
                    SendContext {
                        is_new,
                        moved_past_threshold,
                        ticks_since_sent,
                        no_champion: false,
                    },
                    config,
                )
            }
            None => true,
        };
        if !send {
            continue;
        }

        let snapshot = FieldSnapshot::capture(record, config.delta_quantize_step);
        let (created, fields) = match baseline {
            None => (
                Some(CreationInfo {
                    kind: record.kind,
                    team: record.team,
                    champion: record.champion.as_deref().map(|c| c.champion),
                }),
                ChangedFields::full(&snapshot),
            ),
            Some(previous) => (None, ChangedFields::diff(&previous.snapshot, &snapshot)),
        };
        deltas.push(EntityDelta {
            entity: id,
            created,
            removed: false,
            fields,
        });
        view.baselines.insert(id, SentState { snapshot, tick });
    }

    // Entities the client knows about that left the visible set.
    let gone: Vec<EntityId> = view
        .baselines
        .keys()
        .filter(|id| !visible.contains(id))
        .copied()
        .collect();
    for id in gone {
        view.baselines.remove(&id);
        deltas.push(EntityDelta {
            entity: id,
            created: None,
            removed: true,
            fields: ChangedFields::default(),
        });
    }

    let events = events
        .iter()
        .filter(|event| event.involved().iter().any(|id| visible.contains(id)))
        .cloned()
        .collect();

    StateUpdate {
        tick,
        deltas,
        events,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use riftline_world::prelude::*;

    fn minion(world: &mut World, position: Vec2) -> EntityId {
        let mut record = EntityRecord::new(
            EntityKind::Minion,
            Team::Red,
            position,
            Collider::circle(20.0),
        );
        record.damageable = Some(Damageable::new(100.0, 0.0, 0.0));
        world.insert(record)
    }

    fn champion(world: &mut World, team: Team, position: Vec2) -> EntityId {
        let mut record = EntityRecord::new(
            EntityKind::Champion,
            team,
            position,
            Collider::circle(25.0),
        );
        record.damageable = Some(Damageable::new(640.0, 34.0, 32.0));
        record.champion = Some(Box::new(ChampionState::new(
            ChampionId(1),
            [AbilityId(10), AbilityId(11), AbilityId(12), AbilityId(13)],
            PassiveId(1),
        )));
        world.insert(record)
    }

    fn visible_set(ids: &[EntityId]) -> BTreeSet<EntityId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn first_send_is_a_creation_record() {
        let mut world = World::new();
        let config = SessionConfig::default();
        let me = champion(&mut world, Team::Blue, Vec2::ZERO);
        let enemy = minion(&mut world, Vec2::new(100.0, 0.0));
        let mut view = ClientView::new(PlayerId(1), Team::Blue);
        view.champion = Some(me);

        let update = build_update(
            &world,
            &visible_set(&[me, enemy]),
            &[],
            &mut view,
            &config,
            1,
        );
        assert_eq!(update.tick, 1);
        assert_eq!(update.deltas.len(), 2);
        for delta in &update.deltas {
            assert!(delta.created.is_some(), "first contact must create");
            assert!(delta.fields.position.is_some());
        }
        assert!(view.knows(enemy));
    }

    #[test]
    fn unchanged_critical_entity_sends_empty_delta() {
        let mut world = World::new();
        let config = SessionConfig::default();
        let me = champion(&mut world, Team::Blue, Vec2::ZERO);
        let foe = champion(&mut world, Team::Red, Vec2::new(300.0, 0.0));
        let mut view = ClientView::new(PlayerId(1), Team::Blue);
        view.champion = Some(me);

        let visible = visible_set(&[me, foe]);
        build_update(&world, &visible, &[], &mut view, &config, 1);
        let update = build_update(&world, &visible, &[], &mut view, &config, 2);
        // Critical cadence is every tick; nothing changed so the deltas
        // carry no fields but no creation either.
        let foe_delta = update.deltas.iter().find(|d| d.entity == foe).unwrap();
        assert!(foe_delta.created.is_none());
        assert!(foe_delta.fields.is_empty());
    }

    #[test]
    fn changed_fields_only() {
        let mut world = World::new();
        let config = SessionConfig::default();
        let me = champion(&mut world, Team::Blue, Vec2::ZERO);
        let foe = champion(&mut world, Team::Red, Vec2::new(300.0, 0.0));
        let mut view = ClientView::new(PlayerId(1), Team::Blue);
        view.champion = Some(me);

        let visible = visible_set(&[me, foe]);
        build_update(&world, &visible, &[], &mut view, &config, 1);

        world
            .get_mut(foe)
            .unwrap()
            .damageable
            .as_mut()
            .unwrap()
            .health = 500.0;
        let update = build_update(&world, &visible, &[], &mut view, &config, 2);
        let delta = update.deltas.iter().find(|d| d.entity == foe).unwrap();
        assert_eq!(delta.fields.health, Some(500.0));
        assert!(delta.fields.position.is_none());
        assert!(delta.fields.gold.is_none());
    }

    #[test]
    fn quantization_swallows_jitter() {
        let mut world = World::new();
        let config = SessionConfig::default();
        let me = champion(&mut world, Team::Blue, Vec2::ZERO);
        let foe = champion(&mut world, Team::Red, Vec2::new(300.0, 0.0));
        let mut view = ClientView::new(PlayerId(1), Team::Blue);
        view.champion = Some(me);

        let visible = visible_set(&[me, foe]);
        build_update(&world, &visible, &[], &mut view, &config, 1);

        // Drift far below the quantize step.
        world.get_mut(foe).unwrap().position.x += 1e-7;
        let update = build_update(&world, &visible, &[], &mut view, &config, 2);
        let delta = update.deltas.iter().find(|d| d.entity == foe).unwrap();
        assert!(delta.fields.position.is_none());
    }

    #[test]
    fn leaving_vision_emits_removal_and_drops_baseline() {
        let mut world = World::new();
        let config = SessionConfig::default();
        let me = champion(&mut world, Team::Blue, Vec2::ZERO);
        let enemy = minion(&mut world, Vec2::new(100.0, 0.0));
        let mut view = ClientView::new(PlayerId(1), Team::Blue);
        view.champion = Some(me);

        build_update(
            &world,
            &visible_set(&[me, enemy]),
            &[],
            &mut view,
            &config,
            1,
        );
        let update = build_update(&world, &visible_set(&[me]), &[], &mut view, &config, 2);

        let removal = update.deltas.iter().find(|d| d.entity == enemy).unwrap();
        assert!(removal.removed);
        assert!(!view.knows(enemy));

        // Re-entering vision creates again (the client dropped its copy).
        let update = build_update(
            &world,
            &visible_set(&[me, enemy]),
            &[],
            &mut view,
            &config,
            3,
        );
        let delta = update.deltas.iter().find(|d| d.entity == enemy).unwrap();
        assert!(delta.created.is_some());
    }

    #[test]
    fn events_filter_by_vision() {
        let mut world = World::new();
        let config = SessionConfig::default();
        let me = champion(&mut world, Team::Blue, Vec2::ZERO);
        let seen = minion(&mut world, Vec2::new(100.0, 0.0));
        let unseen = minion(&mut world, Vec2::new(3000.0, 0.0));
        let mut view = ClientView::new(PlayerId(1), Team::Blue);
        view.champion = Some(me);

        let events = vec![
            GameEvent::EntityKilled {
                victim: seen,
                killer: Some(me),
            },
            GameEvent::EntityKilled {
                victim: unseen,
                killer: None,
            },
        ];
        let update = build_update(
            &world,
            &visible_set(&[me, seen]),
            &events,
            &mut view,
            &config,
            1,
        );
        assert_eq!(update.events.len(), 1);
    }

    #[test]
    fn dead_player_receives_everything() {
        let mut world = World::new();
        let config = SessionConfig::default();
        let me = champion(&mut world, Team::Blue, Vec2::ZERO);
        world.get_mut(me).unwrap().dead = true;
        // A far-away low-priority minion.
        let enemy = minion(&mut world, Vec2::new(3000.0, 0.0));
        let mut view = ClientView::new(PlayerId(1), Team::Blue);
        view.champion = Some(me);

        let visible = visible_set(&[me, enemy]);
        build_update(&world, &visible, &[], &mut view, &config, 1);
        // Tick 2: a live champion would hold the Low-band minion for 15
        // ticks; a dead player's client gets it every tick.
        let update = build_update(&world, &visible, &[], &mut view, &config, 2);
        assert!(update.deltas.iter().any(|d| d.entity == enemy));
    }
}
