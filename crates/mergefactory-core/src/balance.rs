//! Game balance: every tuning constant plus the pure level curves.
//!
//! A [`Balance`] value is immutable for the lifetime of a session. It is
//! deserializable with per-field defaults, so a balance file only needs to
//! list the keys it overrides (see the `mergefactory-data` crate).
//!
//! Production: `base_production_per_second * production_growth^(level - 1)`
//! Value:      `base_machine_cost * value_growth^(level - 1)`

use serde::{Deserialize, Serialize};

use crate::row_module::Rarity;

// ---------------------------------------------------------------------------
// Tier costs
// ---------------------------------------------------------------------------

/// Price of reaching each row-module rarity tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RarityCosts {
    pub common: f64,
    pub uncommon: f64,
    pub rare: f64,
    pub epic: f64,
}

impl RarityCosts {
    /// Cost of the given tier.
    pub fn get(&self, rarity: Rarity) -> f64 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Uncommon => self.uncommon,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
        }
    }
}

impl Default for RarityCosts {
    fn default() -> Self {
        Self {
            common: 100.0,
            uncommon: 500.0,
            rare: 2000.0,
            epic: 10000.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Balance
// ---------------------------------------------------------------------------

/// All game tuning constants in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    // -- Machine production --
    /// Level-1 output in currency per second.
    pub base_production_per_second: f64,
    /// Multiplier applied per level above 1.
    pub production_growth: f64,

    // -- Machine value --
    /// Purchase price of a level-1 machine.
    pub base_machine_cost: f64,
    pub value_growth: f64,
    pub scrap_refund_multiplier: f64,
    pub repair_cost_multiplier: f64,

    // -- Session timing (milliseconds) --
    /// Accumulated time that triggers a production tick.
    pub tick_interval_ms: f64,
    /// Upper bound on a single frame delta before accumulation.
    pub max_frame_delta_ms: f64,
    pub autosave_interval_ms: u64,
    pub disaster_check_interval_ms: u64,

    // -- Disasters --
    /// Probability that a gated disaster check produces a disaster.
    pub disaster_chance: f64,
    pub power_outage_min_ms: u64,
    pub power_outage_max_ms: u64,
    /// Floor applied after duration reduction.
    pub min_disaster_duration_ms: f64,
    /// Cap on the summed disaster-duration reduction across all rows.
    pub max_duration_reduction: f64,

    // -- Offline --
    pub offline_efficiency: f64,
    pub max_offline_hours: f64,
    /// Minimum time away before offline earnings are offered to the player.
    pub offline_notice_threshold_ms: u64,

    // -- Economy --
    pub starting_currency: f64,
    pub row_module_costs: RarityCosts,
    /// Reroll cost for row 0; row `n` costs `(n + 1)` times this.
    pub reroll_base_cost: f64,
}

impl Default for Balance {
    fn default() -> Self {
        Self {
            base_production_per_second: 1.0,
            production_growth: 2.5,
            base_machine_cost: 10.0,
            value_growth: 2.5,
            scrap_refund_multiplier: 0.5,
            repair_cost_multiplier: 0.5,
            tick_interval_ms: 100.0,
            max_frame_delta_ms: 100.0,
            autosave_interval_ms: 10_000,
            disaster_check_interval_ms: 30_000,
            disaster_chance: 0.15,
            power_outage_min_ms: 10_000,
            power_outage_max_ms: 30_000,
            min_disaster_duration_ms: 2_000.0,
            max_duration_reduction: 0.8,
            offline_efficiency: 0.5,
            max_offline_hours: 8.0,
            offline_notice_threshold_ms: 60_000,
            starting_currency: 50.0,
            row_module_costs: RarityCosts::default(),
            reroll_base_cost: 50.0,
        }
    }
}

/// `growth^(level - 1)`, with level 0 treated as level 1.
fn level_factor(growth: f64, level: u32) -> f64 {
    let exponent = level.saturating_sub(1).min(i32::MAX as u32) as i32;
    growth.powi(exponent)
}

impl Balance {
    /// Currency per second produced by one machine of `level`.
    pub fn production_rate(&self, level: u32) -> f64 {
        self.base_production_per_second * level_factor(self.production_growth, level)
    }

    /// Nominal worth of one machine of `level`, the basis for scrap and repair.
    pub fn machine_value(&self, level: u32) -> f64 {
        self.base_machine_cost * level_factor(self.value_growth, level)
    }

    pub fn scrap_refund(&self, level: u32) -> f64 {
        (self.machine_value(level) * self.scrap_refund_multiplier).floor()
    }

    pub fn repair_cost(&self, level: u32) -> f64 {
        (self.machine_value(level) * self.repair_cost_multiplier).floor()
    }

    /// Whether `currency` covers a new level-1 machine.
    pub fn can_buy_machine(&self, currency: f64) -> bool {
        currency >= self.base_machine_cost
    }

    /// Offline catch-up window cap in milliseconds.
    pub fn max_offline_ms(&self) -> u64 {
        (self.max_offline_hours * 3_600_000.0).max(0.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn level_one_values() {
        let b = Balance::default();
        assert_eq!(b.production_rate(1), 1.0);
        assert_eq!(b.machine_value(1), 10.0);
        assert_eq!(b.scrap_refund(1), 5.0);
        assert_eq!(b.repair_cost(1), 5.0);
    }

    #[test]
    fn consecutive_levels_grow_by_two_and_a_half() {
        let b = Balance::default();
        for level in 1..30 {
            assert!(approx(
                b.production_rate(level + 1),
                b.production_rate(level) * 2.5
            ));
            assert!(approx(b.machine_value(level + 1), b.machine_value(level) * 2.5));
        }
    }

    #[test]
    fn refunds_are_floored() {
        let b = Balance::default();
        // Level 2 value = 25, half = 12.5.
        assert_eq!(b.scrap_refund(2), 12.0);
        assert_eq!(b.repair_cost(2), 12.0);
        // Level 3 value = 62.5, half = 31.25.
        assert_eq!(b.scrap_refund(3), 31.0);
    }

    #[test]
    fn level_zero_clamps_to_level_one() {
        let b = Balance::default();
        assert_eq!(b.production_rate(0), b.production_rate(1));
    }

    #[test]
    fn tier_costs_lookup() {
        let costs = RarityCosts::default();
        assert_eq!(costs.get(Rarity::Common), 100.0);
        assert_eq!(costs.get(Rarity::Uncommon), 500.0);
        assert_eq!(costs.get(Rarity::Rare), 2000.0);
        assert_eq!(costs.get(Rarity::Epic), 10000.0);
    }

    #[test]
    fn can_buy_machine_threshold() {
        let b = Balance::default();
        assert!(b.can_buy_machine(10.0));
        assert!(!b.can_buy_machine(9.99));
    }

    #[test]
    fn max_offline_is_eight_hours() {
        assert_eq!(Balance::default().max_offline_ms(), 8 * 3_600_000);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let b: Balance = serde_json::from_str(r#"{"disaster_chance": 0.5}"#).unwrap();
        assert_eq!(b.disaster_chance, 0.5);
        assert_eq!(b.base_machine_cost, 10.0);
        assert_eq!(b.row_module_costs, RarityCosts::default());
    }
}
