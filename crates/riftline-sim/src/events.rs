//! The within-tick event bus.
//!
//! Simulation steps queue events as they happen; the publish step delivers
//! the whole buffer to every registered sink in publish order (within-tick
//! FIFO), and the delta pipeline reads the same buffer to build the
//! user-visible event list. Events are not persisted across ticks: reward
//! bookkeeping consumes them synchronously inside the tick that produced
//! them.

use serde::{Deserialize, Serialize};

use riftline_world::champion::AbilitySlot;
use riftline_world::entity::EntityId;
use riftline_world::ids::{AbilityId, EffectId};
use riftline_world::records::{DamageKind, Team};

use crate::scheduler::TargetSelection;

// ---------------------------------------------------------------------------
// GameEvent
// ---------------------------------------------------------------------------

/// Everything of note that can happen inside one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Damage landed on a damageable entity.
    DamageDealt {
        /// Damage source.
        source: EntityId,
        /// Damage recipient.
        target: EntityId,
        /// Post-mitigation amount actually absorbed.
        amount: f64,
        /// Portion absorbed by shields.
        to_shields: f64,
        /// Portion taken from health.
        to_health: f64,
        /// Damage lane.
        kind: DamageKind,
        /// Whether the hit was a critical strike.
        crit: bool,
    },
    /// An entity dropped to zero health.
    EntityKilled {
        /// The victim.
        victim: EntityId,
        /// Kill credit, if attributable.
        killer: Option<EntityId>,
    },
    /// A cast committed (resource spent, cooldown started).
    AbilityCast {
        /// The caster.
        caster: EntityId,
        /// The ability.
        ability: AbilityId,
        /// The slot it was cast from.
        slot: AbilitySlot,
        /// What it was aimed at.
        target: TargetSelection,
    },
    /// A projectile entity entered flight.
    ProjectileSpawned {
        /// The projectile entity.
        projectile: EntityId,
        /// Who fired it.
        caster: EntityId,
        /// The ability that fired it, if any.
        ability: Option<AbilityId>,
    },
    /// A tower, inhibitor or nexus fell.
    StructureDestroyed {
        /// The structure entity.
        structure: EntityId,
        /// The team that lost it.
        team: Team,
        /// Kill credit, if attributable.
        by: Option<EntityId>,
    },
    /// A champion reached a new level.
    LevelUp {
        /// The champion entity.
        champion: EntityId,
        /// The level reached.
        level: u8,
    },
    /// Gold credited to a champion.
    GoldEarned {
        /// The champion entity.
        champion: EntityId,
        /// Amount credited.
        amount: u32,
    },
    /// Experience credited to a champion.
    XpEarned {
        /// The champion entity.
        champion: EntityId,
        /// Amount credited.
        amount: f64,
    },
    /// An effect landed on an entity.
    EffectApplied {
        /// The recipient.
        target: EntityId,
        /// The effect definition.
        effect: EffectId,
        /// Who applied it.
        source: EntityId,
    },
}

impl GameEvent {
    /// The entities involved, for vision filtering of the client event list.
    pub fn involved(&self) -> Vec<EntityId> {
        match *self {
            GameEvent::DamageDealt { source, target, .. } => vec![source, target],
            GameEvent::EntityKilled { victim, killer } => {
                let mut v = vec![victim];
                v.extend(killer);
                v
            }
            GameEvent::AbilityCast { caster, .. } => vec![caster],
            GameEvent::ProjectileSpawned { projectile, caster, .. } => vec![projectile, caster],
            GameEvent::StructureDestroyed { structure, by, .. } => {
                let mut v = vec![structure];
                v.extend(by);
                v
            }
            GameEvent::LevelUp { champion, .. }
            | GameEvent::GoldEarned { champion, .. }
            | GameEvent::XpEarned { champion, .. } => vec![champion],
            GameEvent::EffectApplied { target, source, .. } => vec![target, source],
        }
    }
}

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// A subscriber registered at bus construction.
pub trait EventSink: Send {
    /// Called once per event, in publish order, during the publish step.
    fn on_event(&mut self, tick: u64, event: &GameEvent);
}

/// A sink wrapping a plain closure.
pub struct FnSink<F: FnMut(u64, &GameEvent) + Send>(pub F);

impl<F: FnMut(u64, &GameEvent) + Send> EventSink for FnSink<F> {
    fn on_event(&mut self, tick: u64, event: &GameEvent) {
        self.0(tick, event)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Publish/subscribe bus buffered within a tick.
pub struct EventBus {
    buffered: Vec<GameEvent>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffered", &self.buffered.len())
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventBus {
    /// A bus with the given sinks. Sinks cannot be added later; subscribers
    /// register at construction.
    pub fn new(sinks: Vec<Box<dyn EventSink>>) -> Self {
        Self {
            buffered: Vec::new(),
            sinks,
        }
    }

    /// Queue an event into the current tick's buffer.
    pub fn publish(&mut self, event: GameEvent) {
        self.buffered.push(event);
    }

    /// The events queued so far this tick, in publish order. Reward
    /// bookkeeping reads this before the flush.
    pub fn buffered(&self) -> &[GameEvent] {
        &self.buffered
    }

    /// Deliver the buffer to every sink in publish order, then return the
    /// published events and reset for the next tick.
    pub fn flush(&mut self, tick: u64) -> Vec<GameEvent> {
        for event in &self.buffered {
            for sink in self.sinks.iter_mut() {
                sink.on_event(tick, event);
            }
        }
        std::mem::take(&mut self.buffered)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn victim() -> EntityId {
        EntityId::new(1, 0)
    }

    #[test]
    fn flush_preserves_publish_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let mut bus = EventBus::new(vec![Box::new(FnSink(move |_tick, event: &GameEvent| {
            if let GameEvent::GoldEarned { amount, .. } = event {
                sink_seen.lock().unwrap().push(*amount);
            }
        }))]);

        for amount in [10, 20, 30] {
            bus.publish(GameEvent::GoldEarned {
                champion: victim(),
                amount,
            });
        }
        let published = bus.flush(5);
        assert_eq!(published.len(), 3);
        assert_eq!(*seen.lock().unwrap(), vec![10, 20, 30]);
        // The buffer resets per tick.
        assert!(bus.buffered().is_empty());
        assert!(bus.flush(6).is_empty());
    }

    #[test]
    fn buffered_is_readable_before_flush() {
        let mut bus = EventBus::default();
        bus.publish(GameEvent::EntityKilled {
            victim: victim(),
            killer: None,
        });
        assert_eq!(bus.buffered().len(), 1);
    }

    #[test]
    fn involved_entities() {
        let killed = GameEvent::EntityKilled {
            victim: victim(),
            killer: Some(EntityId::new(2, 0)),
        };
        assert_eq!(killed.involved().len(), 2);
    }
}
