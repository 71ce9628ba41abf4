//! Champion definitions and the base/growth stat tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use riftline_world::champion::{StatKind, ABILITY_SLOTS};
use riftline_world::ids::{AbilityId, AnimationId, ChampionId, PassiveId};
use riftline_world::shape::Collider;

// ---------------------------------------------------------------------------
// Growth tables
// ---------------------------------------------------------------------------

/// One stat's base value and per-level growth.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatLine {
    /// Value at level 1.
    pub base: f64,
    /// Added per level above 1.
    pub growth: f64,
}

/// Base + growth lines for every stat a champion has. Stats without a line
/// derive as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GrowthTable(pub BTreeMap<StatKind, StatLine>);

impl GrowthTable {
    /// The stat line for a kind, zero if absent.
    pub fn line(&self, kind: StatKind) -> StatLine {
        self.0.get(&kind).copied().unwrap_or_default()
    }

    /// `base + growth * (level - 1)` for a kind. This is the pre-modifier
    /// stat; flat/percent modifiers are the simulation's business.
    pub fn value_at(&self, kind: StatKind, level: u8) -> f64 {
        let line = self.line(kind);
        line.base + line.growth * level.saturating_sub(1) as f64
    }

    /// Insert or replace a stat line (builder-style).
    pub fn with(mut self, kind: StatKind, base: f64, growth: f64) -> Self {
        self.0.insert(kind, StatLine { base, growth });
        self
    }
}

// ---------------------------------------------------------------------------
// ChampionDef
// ---------------------------------------------------------------------------

/// A read-only champion definition from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionDef {
    /// Catalog id.
    pub id: ChampionId,
    /// Display name.
    pub name: String,
    /// Base stats and per-level growth.
    pub stats: GrowthTable,
    /// Ability ids in Q/W/E/R order.
    pub abilities: [AbilityId; ABILITY_SLOTS],
    /// Champion passive.
    pub passive: PassiveId,
    /// Collision shape.
    pub collider: Collider,
    /// Basic-attack animation; playback scales with attack speed.
    pub basic_attack_animation: AnimationId,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
