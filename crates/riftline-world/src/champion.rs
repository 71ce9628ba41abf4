//! Champion extension: level, resource, ability slots, modifiers, inventory.

use serde::{Deserialize, Serialize};

use crate::ids::{AbilityId, ChampionId, EffectId, ItemId, PassiveId};

/// Number of ability slots per champion (Q/W/E/R).
pub const ABILITY_SLOTS: usize = 4;

/// Number of inventory slots per champion.
pub const INVENTORY_SLOTS: usize = 6;

/// Champion level bounds.
pub const MIN_LEVEL: u8 = 1;
/// Maximum champion level.
pub const MAX_LEVEL: u8 = 18;

// ---------------------------------------------------------------------------
// Stats vocabulary
// ---------------------------------------------------------------------------

/// The derived stats a champion carries. Derivation is
/// `base + growth * (level - 1)` with flat modifiers applied before percent
/// modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// Maximum health pool.
    MaxHealth,
    /// Maximum resource (mana/energy) pool.
    MaxResource,
    /// Basic-attack damage.
    AttackDamage,
    /// Ability scaling power.
    AbilityPower,
    /// Physical damage reduction.
    Armor,
    /// Magical damage reduction.
    MagicResist,
    /// Attacks per second.
    AttackSpeed,
    /// Movement speed in units per second.
    MoveSpeed,
    /// Health restored per second.
    HealthRegen,
    /// Resource restored per second.
    ResourceRegen,
    /// Chance in `[0, 1]` for a basic attack to crit.
    CritChance,
    /// Basic-attack range.
    AttackRange,
    /// Cast-animation speedup for abilities flagged to scale with it.
    /// Derives as a bonus over 1.0: a value of 0.25 plays casts 25% faster.
    CastSpeed,
}

/// Where a stat modifier came from, for removal when the source expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModSource {
    /// Granted by an active effect.
    Effect(EffectId),
    /// Granted by an inventory item.
    Item(ItemId),
    /// Granted by the champion passive.
    Passive(PassiveId),
}

/// A flat and/or percent adjustment to one stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    /// Which stat is adjusted.
    pub stat: StatKind,
    /// Added before percent scaling.
    pub flat: f64,
    /// Fractional increase applied after all flat modifiers (0.1 = +10%).
    pub percent: f64,
    /// The source, for bulk removal.
    pub source: ModSource,
}

// ---------------------------------------------------------------------------
// Ability slots
// ---------------------------------------------------------------------------

/// The four castable slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbilitySlot {
    /// First basic ability.
    Q,
    /// Second basic ability.
    W,
    /// Third basic ability.
    E,
    /// Ultimate.
    R,
}

impl AbilitySlot {
    /// All slots in Q/W/E/R order.
    pub const ALL: [AbilitySlot; ABILITY_SLOTS] = [
        AbilitySlot::Q,
        AbilitySlot::W,
        AbilitySlot::E,
        AbilitySlot::R,
    ];

    /// Array index for the slot.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            AbilitySlot::Q => 0,
            AbilitySlot::W => 1,
            AbilitySlot::E => 2,
            AbilitySlot::R => 3,
        }
    }
}

/// Per-slot runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilitySlotState {
    /// Which ability occupies the slot.
    pub ability: AbilityId,
    /// Rank 0 (unlearned) through 5.
    pub rank: u8,
    /// Seconds of cooldown remaining.
    pub cooldown_remaining: f64,
    /// Holding a charge-up (release fires).
    pub charging: bool,
    /// Mid-channel; interruptible by hard CC.
    pub channeling: bool,
    /// Toggle abilities: currently on.
    pub toggled: bool,
    /// Transform abilities: in the alternate form.
    pub transformed: bool,
}

impl AbilitySlotState {
    /// An unlearned slot holding the given ability.
    pub fn new(ability: AbilityId) -> Self {
        Self {
            ability,
            rank: 0,
            cooldown_remaining: 0.0,
            charging: false,
            channeling: false,
            toggled: false,
            transformed: false,
        }
    }

    /// Whether the slot can be cast as far as rank and cooldown go.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.rank > 0 && self.cooldown_remaining <= 0.0
    }
}

// ---------------------------------------------------------------------------
// Passive
// ---------------------------------------------------------------------------

/// Champion passive runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassiveState {
    /// Which passive.
    pub passive: PassiveId,
    /// Accumulated stacks.
    pub stacks: u32,
    /// Seconds until stacks decay or the passive window closes.
    pub timer: f64,
    /// Seconds until the passive may proc again.
    pub internal_cooldown: f64,
}

// ---------------------------------------------------------------------------
// ChampionState
// ---------------------------------------------------------------------------

/// The champion extension on an entity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionState {
    /// Which champion definition this instantiates.
    pub champion: ChampionId,
    /// Level 1-18.
    pub level: u8,
    /// Experience toward the next level.
    pub xp: f64,
    /// Gold available for items.
    pub gold: u32,
    /// Current resource (mana/energy).
    pub resource: f64,
    /// The four ability slots in Q/W/E/R order.
    pub slots: [AbilitySlotState; ABILITY_SLOTS],
    /// Live stat modifiers from effects, items and the passive.
    pub modifiers: Vec<StatModifier>,
    /// Item inventory.
    pub inventory: [Option<ItemId>; INVENTORY_SLOTS],
    /// Passive runtime state.
    pub passive: PassiveState,
    /// Seconds until the next basic attack may start.
    pub attack_cooldown: f64,
    /// Seconds left in combat; decays every tick, reset on dealing or taking
    /// damage. Out-of-combat regen applies at zero.
    pub combat_timer: f64,
    /// Seconds left on an in-progress recall channel. Taking damage cancels.
    pub recall_remaining: Option<f64>,
    /// Seconds until respawn, when dead.
    pub respawn_timer: Option<f64>,
}

impl ChampionState {
    /// A fresh level-1 champion with the given slot assignments and passive.
    pub fn new(
        champion: ChampionId,
        abilities: [AbilityId; ABILITY_SLOTS],
        passive: PassiveId,
    ) -> Self {
        Self {
            champion,
            level: MIN_LEVEL,
            xp: 0.0,
            gold: 0,
            resource: 0.0,
            slots: [
                AbilitySlotState::new(abilities[0]),
                AbilitySlotState::new(abilities[1]),
                AbilitySlotState::new(abilities[2]),
                AbilitySlotState::new(abilities[3]),
            ],
            modifiers: Vec::new(),
            inventory: [None; INVENTORY_SLOTS],
            passive: PassiveState {
                passive,
                stacks: 0,
                timer: 0.0,
                internal_cooldown: 0.0,
            },
            attack_cooldown: 0.0,
            combat_timer: 0.0,
            recall_remaining: None,
            respawn_timer: None,
        }
    }

    /// Shared access to one slot's state.
    #[inline]
    pub fn slot(&self, slot: AbilitySlot) -> &AbilitySlotState {
        &self.slots[slot.index()]
    }

    /// Mutable access to one slot's state.
    #[inline]
    pub fn slot_mut(&mut self, slot: AbilitySlot) -> &mut AbilitySlotState {
        &mut self.slots[slot.index()]
    }

    /// Remove every modifier granted by `source`.
    pub fn remove_modifiers_from(&mut self, source: ModSource) {
        self.modifiers.retain(|m| m.source != source);
    }

    /// First free inventory slot, if any.
    pub fn free_item_slot(&self) -> Option<usize> {
        self.inventory.iter().position(|s| s.is_none())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn champ() -> ChampionState {
        ChampionState::new(
            ChampionId(1),
            [AbilityId(10), AbilityId(11), AbilityId(12), AbilityId(13)],
            PassiveId(1),
        )
    }

    #[test]
    fn fresh_champion_is_level_one_with_unlearned_slots() {
        let c = champ();
        assert_eq!(c.level, MIN_LEVEL);
        for slot in AbilitySlot::ALL {
            assert!(!c.slot(slot).is_ready());
        }
    }

    #[test]
    fn slot_readiness() {
        let mut c = champ();
        c.slot_mut(AbilitySlot::Q).rank = 1;
        assert!(c.slot(AbilitySlot::Q).is_ready());
        c.slot_mut(AbilitySlot::Q).cooldown_remaining = 2.0;
        assert!(!c.slot(AbilitySlot::Q).is_ready());
    }

    #[test]
    fn modifier_removal_by_source() {
        let mut c = champ();
        c.modifiers.push(StatModifier {
            stat: StatKind::AttackDamage,
            flat: 10.0,
            percent: 0.0,
            source: ModSource::Item(ItemId(5)),
        });
        c.modifiers.push(StatModifier {
            stat: StatKind::Armor,
            flat: 20.0,
            percent: 0.0,
            source: ModSource::Effect(EffectId(3)),
        });
        c.remove_modifiers_from(ModSource::Item(ItemId(5)));
        assert_eq!(c.modifiers.len(), 1);
        assert_eq!(c.modifiers[0].stat, StatKind::Armor);
    }

    #[test]
    fn inventory_slots() {
        let mut c = champ();
        assert_eq!(c.free_item_slot(), Some(0));
        for s in c.inventory.iter_mut() {
            *s = Some(ItemId(1));
        }
        assert_eq!(c.free_item_slot(), None);
    }
}
