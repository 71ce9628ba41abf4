//! Session configuration knobs.
//!
//! Every tunable the core recognizes, with its default. Overrides are passed
//! in at session construction; per-tick changes are not supported. The only
//! validation with teeth is the tick rate, which must land in 20-125 Hz.

use serde::{Deserialize, Serialize};

use crate::CatalogError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// All recognized configuration keys. Defaults match the shipped balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Simulation tick rate in Hz. Valid range 20-125.
    pub tick_rate_hz: u32,
    /// Client-to-server interpolation delay in milliseconds.
    pub interp_delay_ms: f64,
    /// Seconds a disconnected player keeps their slot before removal.
    pub reconnect_grace_s: f64,
    /// Earliest second a surrender vote may start.
    pub surrender_earliest_s: f64,
    /// Seconds of inactivity before a player counts as AFK.
    pub afk_timeout_s: f64,
    /// Seconds a recall channel takes.
    pub recall_duration_s: f64,

    /// Champion sight range.
    pub sight_champion: f64,
    /// Ward sight range.
    pub sight_ward: f64,
    /// Ward lifetime in seconds.
    pub ward_duration_s: f64,
    /// Maximum simultaneous wards per player.
    pub max_wards_per_player: u32,
    /// Distance from a bush at which outside sources reveal its interior.
    pub bush_reveal_range: f64,

    /// Distance band: entities closer than this are Critical priority.
    pub priority_critical_distance: f64,
    /// Distance band: entities closer than this are High priority.
    pub priority_high_distance: f64,
    /// Distance band: entities closer than this are Medium priority.
    pub priority_medium_distance: f64,
    /// Liveness ceiling: an entity unsent for this many ticks sends anyway.
    pub max_ticks_without_update: u32,
    /// Authoritative-position drift that forces a send regardless of cadence.
    pub movement_threshold: f64,

    /// Seconds after dealing/taking damage an entity counts as in combat.
    pub combat_timeout_s: f64,
    /// Regen multiplier applied while out of combat.
    pub ooc_regen_multiplier: f64,
    /// Maximum fraction of damage resists may mitigate.
    pub resist_cap: f64,
    /// Damage multiplier on critical strikes.
    pub crit_multiplier: f64,

    /// Respawn time floor in seconds.
    pub respawn_base_s: f64,
    /// Respawn seconds added per champion level.
    pub respawn_per_level_s: f64,
    /// Respawn time ceiling in seconds.
    pub respawn_cap_s: f64,

    /// Radius within which nearby allies share kill experience.
    pub xp_share_range: f64,
    /// Base experience for a champion takedown.
    pub kill_base_xp: f64,
    /// Bonus experience per level the victim has over the killer.
    pub xp_level_diff_bonus: f64,

    /// Spatial grid cell size in world units.
    pub grid_cell_size: f64,
    /// Inputs drained per client per tick; excess drops oldest-first.
    pub max_inputs_per_tick: usize,
    /// Quantization step for float fields in delta comparison.
    pub delta_quantize_step: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 125,
            interp_delay_ms: 24.0,
            reconnect_grace_s: 300.0,
            surrender_earliest_s: 900.0,
            afk_timeout_s: 60.0,
            recall_duration_s: 8.0,

            sight_champion: 800.0,
            sight_ward: 600.0,
            ward_duration_s: 180.0,
            max_wards_per_player: 3,
            bush_reveal_range: 100.0,

            priority_critical_distance: 800.0,
            priority_high_distance: 1200.0,
            priority_medium_distance: 1600.0,
            max_ticks_without_update: 60,
            movement_threshold: 50.0,

            combat_timeout_s: 5.0,
            ooc_regen_multiplier: 2.5,
            resist_cap: 0.9,
            crit_multiplier: 2.0,

            respawn_base_s: 6.0,
            respawn_per_level_s: 2.0,
            respawn_cap_s: 60.0,

            xp_share_range: 1400.0,
            kill_base_xp: 140.0,
            xp_level_diff_bonus: 20.0,

            grid_cell_size: 100.0,
            max_inputs_per_tick: 32,
            delta_quantize_step: 0.01,
        }
    }
}

impl SessionConfig {
    /// Seconds per simulation tick.
    #[inline]
    pub fn tick_dt(&self) -> f64 {
        1.0 / self.tick_rate_hz as f64
    }

    /// Validate the configuration. Rejects tick rates outside 20-125 Hz and
    /// non-positive geometry knobs.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if !(20..=125).contains(&self.tick_rate_hz) {
            return Err(CatalogError::InvalidConfig {
                key: "tick_rate_hz",
                detail: format!("{} outside 20-125", self.tick_rate_hz),
            });
        }
        if self.grid_cell_size <= 0.0 {
            return Err(CatalogError::InvalidConfig {
                key: "grid_cell_size",
                detail: format!("{} must be positive", self.grid_cell_size),
            });
        }
        if self.delta_quantize_step <= 0.0 {
            return Err(CatalogError::InvalidConfig {
                key: "delta_quantize_step",
                detail: format!("{} must be positive", self.delta_quantize_step),
            });
        }
        if !(0.0..=1.0).contains(&self.resist_cap) {
            return Err(CatalogError::InvalidConfig {
                key: "resist_cap",
                detail: format!("{} outside [0, 1]", self.resist_cap),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
