//! Riftline catalog -- the read-only content tables a session consumes.
//!
//! Champion, ability, effect, animation and item definitions plus map
//! geometry and configuration. Loaded once at session init (typically from
//! JSON); immutable afterwards and shared by every session in the process.
//!
//! Lookups return [`CatalogError`] for unknown ids. Per the error policy, a
//! catalog miss during play fails the operation that needed it (e.g. the
//! cast) and never crashes the session; a catalog that fails
//! [`Catalog::validate`] refuses to start a session at all.
//!
//! # Quick Start
//!
//! ```
//! use riftline_catalog::prelude::*;
//!
//! let catalog = riftline_catalog::content::demo_catalog();
//! catalog.validate().expect("demo content is well-formed");
//!
//! let warden = catalog.champion(ChampionId(1)).unwrap();
//! assert_eq!(warden.name, "Warden");
//! ```

#![deny(unsafe_code)]

pub mod ability;
pub mod animation;
pub mod champion;
pub mod config;
pub mod content;
pub mod effect;
pub mod item;
pub mod map;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use riftline_world::ids::{AbilityId, AnimationId, ChampionId, EffectId, ItemId};

use crate::ability::AbilityDef;
use crate::animation::AnimationDef;
use crate::champion::ChampionDef;
use crate::effect::EffectDef;
use crate::item::ItemDef;
use crate::map::MapGeometry;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by catalog loading and lookup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Unknown champion id.
    #[error("unknown champion {0}")]
    UnknownChampion(ChampionId),

    /// Unknown ability id.
    #[error("unknown ability {0}")]
    UnknownAbility(AbilityId),

    /// Unknown effect id.
    #[error("unknown effect {0}")]
    UnknownEffect(EffectId),

    /// Unknown animation id.
    #[error("unknown animation {0}")]
    UnknownAnimation(AnimationId),

    /// Unknown item id.
    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    /// A configuration key failed validation.
    #[error("invalid config {key}: {detail}")]
    InvalidConfig {
        /// Which knob.
        key: &'static str,
        /// What was wrong.
        detail: String,
    },

    /// The catalog JSON could not be parsed.
    #[error("malformed catalog: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A definition references an id that is not in the catalog.
    #[error("broken catalog reference: {detail}")]
    BrokenReference {
        /// Human-readable description of the dangling reference.
        detail: String,
    },
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The full set of read-only tables for one game mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Champion definitions.
    pub champions: BTreeMap<ChampionId, ChampionDef>,
    /// Ability definitions.
    pub abilities: BTreeMap<AbilityId, AbilityDef>,
    /// Effect definitions.
    pub effects: BTreeMap<EffectId, EffectDef>,
    /// Animation descriptors.
    pub animations: BTreeMap<AnimationId, AnimationDef>,
    /// Item definitions.
    pub items: BTreeMap<ItemId, ItemDef>,
    /// Map geometry.
    pub map: MapGeometry,
}

impl Catalog {
    /// An empty catalog over the given map. Content is inserted with the
    /// `insert_*` builders or deserialized whole via [`Catalog::from_json_str`].
    pub fn new(map: MapGeometry) -> Self {
        Self {
            champions: BTreeMap::new(),
            abilities: BTreeMap::new(),
            effects: BTreeMap::new(),
            animations: BTreeMap::new(),
            items: BTreeMap::new(),
            map,
        }
    }

    /// Parse a catalog from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Insert a champion definition.
    pub fn insert_champion(&mut self, def: ChampionDef) {
        self.champions.insert(def.id, def);
    }

    /// Insert an ability definition.
    pub fn insert_ability(&mut self, def: AbilityDef) {
        self.abilities.insert(def.id, def);
    }

    /// Insert an effect definition.
    pub fn insert_effect(&mut self, def: EffectDef) {
        self.effects.insert(def.id, def);
    }

    /// Insert an animation descriptor.
    pub fn insert_animation(&mut self, def: AnimationDef) {
        self.animations.insert(def.id, def);
    }

    /// Insert an item definition.
    pub fn insert_item(&mut self, def: ItemDef) {
        self.items.insert(def.id, def);
    }

    /// Look up a champion definition.
    pub fn champion(&self, id: ChampionId) -> Result<&ChampionDef, CatalogError> {
        self.champions.get(&id).ok_or(CatalogError::UnknownChampion(id))
    }

    /// Look up an ability definition.
    pub fn ability(&self, id: AbilityId) -> Result<&AbilityDef, CatalogError> {
        self.abilities.get(&id).ok_or(CatalogError::UnknownAbility(id))
    }

    /// Look up an effect definition.
    pub fn effect(&self, id: EffectId) -> Result<&EffectDef, CatalogError> {
        self.effects.get(&id).ok_or(CatalogError::UnknownEffect(id))
    }

    /// Look up an animation descriptor.
    pub fn animation(&self, id: AnimationId) -> Result<&AnimationDef, CatalogError> {
        self.animations.get(&id).ok_or(CatalogError::UnknownAnimation(id))
    }

    /// Look up an item definition.
    pub fn item(&self, id: ItemId) -> Result<&ItemDef, CatalogError> {
        self.items.get(&id).ok_or(CatalogError::UnknownItem(id))
    }

    /// Cross-reference validation, run once before the first session starts.
    ///
    /// Checks that every champion's ability slots, every ability's animation
    /// and applied effects, and every keyframed effect id resolve, and that
    /// per-rank tables cover `max_rank`.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for champ in self.champions.values() {
            for ability_id in champ.abilities {
                let ability = self.ability(ability_id).map_err(|_| {
                    CatalogError::BrokenReference {
                        detail: format!("{} references missing {}", champ.name, ability_id),
                    }
                })?;
                if ability.ranks.len() < ability.max_rank as usize {
                    return Err(CatalogError::BrokenReference {
                        detail: format!(
                            "{} has {} ranks but max_rank {}",
                            ability.name,
                            ability.ranks.len(),
                            ability.max_rank
                        ),
                    });
                }
            }
            self.animation(champ.basic_attack_animation).map_err(|_| {
                CatalogError::BrokenReference {
                    detail: format!("{} references a missing attack animation", champ.name),
                }
            })?;
        }
        for ability in self.abilities.values() {
            let animation = self.animation(ability.animation).map_err(|_| {
                CatalogError::BrokenReference {
                    detail: format!("{} references a missing animation", ability.name),
                }
            })?;
            for keyframe in &animation.keyframes {
                if let crate::animation::KeyframeTrigger::Effect(effect_id) = keyframe.trigger {
                    self.effect(effect_id).map_err(|_| CatalogError::BrokenReference {
                        detail: format!(
                            "{} keyframe references missing {}",
                            ability.name, effect_id
                        ),
                    })?;
                }
            }
            for effect_id in &ability.applies_effects {
                self.effect(*effect_id).map_err(|_| CatalogError::BrokenReference {
                    detail: format!("{} applies missing {}", ability.name, effect_id),
                })?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::ability::{
        AbilityDef, AbilityRank, AbilityShape, AffectFlags, AmmoSpec, ChannelSpec, ChargeSpec,
        EmpoweredSpec, ProjectileSpec, RecastSpec, TargetType, ToggleSpec, TransformSpec, ZoneSpec,
    };
    pub use crate::animation::{AnimationDef, Keyframe, KeyframeTrigger};
    pub use crate::champion::{ChampionDef, GrowthTable, StatLine};
    pub use crate::config::SessionConfig;
    pub use crate::effect::{
        CcKind, DurationSource, EffectCategory, EffectDef, StackPolicy, StatModTemplate,
    };
    pub use crate::item::ItemDef;
    pub use crate::map::{
        Bush, BushGroupDef, BushLayout, BushRect, BushSpread, Lane, MapBounds, MapGeometry,
    };
    pub use crate::{Catalog, CatalogError};
    pub use riftline_world::ids::{
        AbilityId, AnimationId, ChampionId, EffectId, ItemId, PassiveId, PlayerId, SoundId, VfxId,
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::demo_catalog;

    #[test]
    fn demo_content_validates() {
        assert!(demo_catalog().validate().is_ok());
    }

    #[test]
    fn unknown_lookups_fail_typed() {
        let catalog = demo_catalog();
        assert!(matches!(
            catalog.ability(AbilityId(9999)),
            Err(CatalogError::UnknownAbility(_))
        ));
        assert!(matches!(
            catalog.effect(EffectId(9999)),
            Err(CatalogError::UnknownEffect(_))
        ));
    }

    #[test]
    fn json_round_trip() {
        let catalog = demo_catalog();
        let json = serde_json::to_string(&catalog).unwrap();
        let back = Catalog::from_json_str(&json).unwrap();
        assert_eq!(catalog, back);
    }

    #[test]
    fn broken_reference_is_caught() {
        let mut catalog = demo_catalog();
        // Remove an animation a champion's abilities depend on.
        let victim = *catalog.animations.keys().next().unwrap();
        catalog.animations.remove(&victim);
        assert!(catalog.validate().is_err());
    }
}
