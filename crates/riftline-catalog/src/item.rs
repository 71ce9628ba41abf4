//! Item definitions.

use serde::{Deserialize, Serialize};

use crate::effect::StatModTemplate;
use riftline_world::ids::ItemId;

/// A read-only item definition from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Catalog id.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Gold cost to buy.
    pub cost: u32,
    /// Gold returned on sale.
    pub sell_value: u32,
    /// Stat adjustments granted while held.
    pub modifiers: Vec<StatModTemplate>,
}

impl ItemDef {
    /// An item selling back at 70% of cost, the usual store ratio.
    pub fn new(id: ItemId, name: &str, cost: u32) -> Self {
        Self {
            id,
            name: name.to_owned(),
            cost,
            sell_value: (cost as f64 * 0.7) as u32,
            modifiers: Vec::new(),
        }
    }

    /// Add a stat modifier (builder-style).
    pub fn with_modifier(mut self, modifier: StatModTemplate) -> Self {
        self.modifiers.push(modifier);
        self
    }
}
