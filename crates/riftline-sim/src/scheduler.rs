//! The animation-keyframed action scheduler.
//!
//! Ability execution defers its side effects (damage, projectile spawns,
//! effect application, zone grounding) to the keyframe times of the cast
//! animation. The scheduler is the multiset those deferred actions live in,
//! keyed by absolute trigger time.
//!
//! # Contract
//!
//! - [`ActionScheduler::schedule`] inserts in trigger-time order.
//! - [`ActionScheduler::advance`] fires every action whose trigger time is
//!   at or before the accumulated time, in non-decreasing time order (ties
//!   broken by `(entity_id, insertion_order)`), invoking the callback
//!   exactly once per action and removing it.
//! - [`ActionScheduler::cancel`] removes all pending actions owned by an
//!   entity, optionally restricted to one kind. A fired action can never be
//!   cancelled retroactively.
//!
//! Internally a sorted vector: insertion is O(n), tolerated because
//! per-entity pending actions are few. A secondary entity-id index makes
//! cancellation proportional to the owner's pending count.

use std::collections::BTreeMap;

use riftline_world::champion::AbilitySlot;
use riftline_world::entity::EntityId;
use riftline_world::ids::{AbilityId, EffectId, SoundId, VfxId};
use riftline_world::math::Vec2;

// ---------------------------------------------------------------------------
// Target selection
// ---------------------------------------------------------------------------

/// What a cast was aimed at, captured at cast time.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TargetSelection {
    /// No explicit target (self/no-target casts).
    None,
    /// A unit target.
    Unit(EntityId),
    /// A ground point or skillshot aim point.
    Point(Vec2),
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// The cast context an action carries to its fire time.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CastSnapshot {
    /// The ability that was cast.
    pub ability: AbilityId,
    /// The slot it was cast from.
    pub slot: AbilitySlot,
    /// The rank at cast time.
    pub rank: u8,
    /// The selection captured at cast time. Projectile aim is re-captured
    /// at fire time; this records what was selected.
    pub target: TargetSelection,
}

/// What a scheduled action does when it fires.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ActionPayload {
    /// Apply the ability's per-rank damage to the resolved targets.
    AbilityDamage(CastSnapshot),
    /// Land a basic attack on the captured target.
    BasicAttack {
        /// The attack target.
        target: EntityId,
    },
    /// Spawn the ability's projectile from the caster's position at fire time.
    SpawnProjectile(CastSnapshot),
    /// Apply an effect to the resolved targets (or ground a zone carrying
    /// it, when the ability defines a zone).
    ApplyEffect {
        /// Cast context.
        cast: CastSnapshot,
        /// The effect to apply.
        effect: EffectId,
    },
    /// Cosmetic sound cue; no simulation consequence.
    Sound {
        /// The cue id.
        sound: SoundId,
    },
    /// Cosmetic visual cue; no simulation consequence.
    Vfx {
        /// The cue id.
        vfx: VfxId,
    },
}

/// Coarse action classification used for kind-restricted cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ActionKind {
    /// Ability damage application.
    AbilityDamage,
    /// Basic-attack landing.
    BasicAttack,
    /// Projectile spawn.
    SpawnProjectile,
    /// Effect application / zone grounding.
    ApplyEffect,
    /// Cosmetic cue.
    Cosmetic,
}

impl ActionPayload {
    /// The kind used for cancellation filters.
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionPayload::AbilityDamage(_) => ActionKind::AbilityDamage,
            ActionPayload::BasicAttack { .. } => ActionKind::BasicAttack,
            ActionPayload::SpawnProjectile(_) => ActionKind::SpawnProjectile,
            ActionPayload::ApplyEffect { .. } => ActionKind::ApplyEffect,
            ActionPayload::Sound { .. } | ActionPayload::Vfx { .. } => ActionKind::Cosmetic,
        }
    }
}

// ---------------------------------------------------------------------------
// ScheduledAction
// ---------------------------------------------------------------------------

/// One pending deferred action.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScheduledAction {
    /// The entity that owns the action (cancellation key).
    pub entity: EntityId,
    /// Absolute simulation time at which the action fires.
    pub trigger_time: f64,
    /// What happens on fire.
    pub payload: ActionPayload,
    /// Insertion sequence; the final ordering tie-breaker.
    seq: u64,
}

impl ScheduledAction {
    fn sort_key(&self) -> (u64, u64, u64) {
        // total_cmp semantics via the raw bit trick are overkill here:
        // trigger times are finite by construction, so to_bits on the
        // non-negative range preserves order.
        (self.trigger_time.to_bits(), self.entity.to_raw(), self.seq)
    }
}

// ---------------------------------------------------------------------------
// ActionScheduler
// ---------------------------------------------------------------------------

/// The time-ordered multiset of pending actions.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct ActionScheduler {
    /// Pending actions sorted by `(trigger_time, entity, seq)`.
    pending: Vec<ScheduledAction>,
    /// Entity -> seq numbers of that entity's pending actions.
    by_entity: BTreeMap<EntityId, Vec<u64>>,
    /// Accumulated simulation time.
    now: f64,
    /// Next insertion sequence number.
    next_seq: u64,
}

impl ActionScheduler {
    /// A fresh scheduler at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated simulation time.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Number of pending actions.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of pending actions owned by one entity.
    pub fn pending_for(&self, entity: EntityId) -> usize {
        self.by_entity.get(&entity).map_or(0, |v| v.len())
    }

    /// Insert an action firing at absolute time `trigger_time`.
    ///
    /// Times in the past fire on the next [`advance`](Self::advance). Non-
    /// finite times are rejected by debug assertion and clamped to `now`.
    pub fn schedule(&mut self, entity: EntityId, trigger_time: f64, payload: ActionPayload) {
        debug_assert!(trigger_time.is_finite(), "non-finite trigger time");
        let trigger_time = if trigger_time.is_finite() {
            trigger_time.max(0.0)
        } else {
            self.now
        };
        let action = ScheduledAction {
            entity,
            trigger_time,
            payload,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        let key = action.sort_key();
        let pos = self
            .pending
            .partition_point(|existing| existing.sort_key() <= key);
        self.by_entity.entry(entity).or_default().push(action.seq);
        self.pending.insert(pos, action);
    }

    /// Advance accumulated time by `dt` and fire every due action in order,
    /// invoking `fire` exactly once per action.
    pub fn advance(&mut self, dt: f64, fire: impl FnMut(&ScheduledAction)) {
        self.advance_to(self.now + dt, fire);
    }

    /// Advance accumulated time to the absolute time `now` (computed by the
    /// tick loop as `tick * dt` to avoid accumulation drift).
    pub fn advance_to(&mut self, now: f64, mut fire: impl FnMut(&ScheduledAction)) {
        if now > self.now {
            self.now = now;
        }
        while let Some(front) = self.pending.first() {
            if front.trigger_time > self.now {
                break;
            }
            let action = self.pending.remove(0);
            self.unindex(&action);
            fire(&action);
        }
    }

    /// Remove all pending actions owned by `entity`, optionally restricted
    /// to one kind. Returns how many were removed. Actions that already
    /// fired are untouched (they no longer exist).
    pub fn cancel(&mut self, entity: EntityId, kind: Option<ActionKind>) -> usize {
        let Some(seqs) = self.by_entity.get(&entity) else {
            return 0;
        };
        let seqs: Vec<u64> = seqs.clone();
        let mut removed = 0;
        for seq in seqs {
            let Some(pos) = self.pending.iter().position(|a| a.seq == seq) else {
                continue;
            };
            if let Some(kind) = kind {
                if self.pending[pos].payload.kind() != kind {
                    continue;
                }
            }
            let action = self.pending.remove(pos);
            self.unindex(&action);
            removed += 1;
        }
        removed
    }

    /// Drop every pending action (session teardown).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.by_entity.clear();
    }

    fn unindex(&mut self, action: &ScheduledAction) {
        if let Some(seqs) = self.by_entity.get_mut(&action.entity) {
            seqs.retain(|&s| s != action.seq);
            if seqs.is_empty() {
                self.by_entity.remove(&action.entity);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
