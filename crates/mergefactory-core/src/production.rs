//! Production and earnings: live rate, per-tick earnings, offline catch-up.

use serde::{Deserialize, Serialize};

use crate::balance::Balance;
use crate::machine::Machine;
use crate::row_module::{RowModule, row_production_bonus};
use crate::sim::Timestamp;

/// Total currency per second for the roster.
///
/// Zero during a power outage. Disabled machines never contribute. Each
/// enabled machine's base rate is multiplied by `1 + row bonus` for its row.
pub fn production_rate(
    machines: &[Machine],
    is_power_outage: bool,
    modules: &[RowModule],
    balance: &Balance,
) -> f64 {
    if is_power_outage {
        return 0.0;
    }
    machines
        .iter()
        .filter(|m| m.is_enabled())
        .map(|m| {
            balance.production_rate(m.level) * (1.0 + row_production_bonus(modules, m.row()))
        })
        .sum()
}

/// Rate with no row bonuses, as used for offline catch-up.
pub fn base_production_rate(machines: &[Machine], balance: &Balance) -> f64 {
    machines
        .iter()
        .filter(|m| m.is_enabled())
        .map(|m| balance.production_rate(m.level))
        .sum()
}

/// Currency earned over `delta_ms`.
pub fn earnings(
    machines: &[Machine],
    is_power_outage: bool,
    delta_ms: f64,
    modules: &[RowModule],
    balance: &Balance,
) -> f64 {
    production_rate(machines, is_power_outage, modules, balance) * delta_ms / 1000.0
}

// ---------------------------------------------------------------------------
// Offline catch-up
// ---------------------------------------------------------------------------

/// Catch-up computed for a returning player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfflineEarnings {
    /// Whole currency units to credit.
    pub earnings: f64,
    /// Capped time away in milliseconds.
    pub time_away_ms: u64,
}

impl OfflineEarnings {
    /// Whether the absence is worth surfacing: something was earned and the
    /// player was gone longer than the notice threshold.
    pub fn worth_reporting(&self, balance: &Balance) -> bool {
        self.earnings > 0.0 && self.time_away_ms > balance.offline_notice_threshold_ms
    }
}

/// Offline earnings since `last_tick_time`.
///
/// Row bonuses are not applied and disaster state is not replayed. The
/// result is floored after the efficiency penalty.
pub fn offline_earnings(
    machines: &[Machine],
    last_tick_time: Timestamp,
    now: Timestamp,
    balance: &Balance,
) -> OfflineEarnings {
    let time_away_ms = now
        .saturating_sub(last_tick_time)
        .min(balance.max_offline_ms());
    let rate = base_production_rate(machines, balance);
    let earnings = (rate * time_away_ms as f64 * balance.offline_efficiency / 1000.0).floor();
    OfflineEarnings {
        earnings,
        time_away_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::MachineId;
    use crate::row_module::{BonusKind, Rarity, RowBonus};

    fn m(slot: u8, level: u32) -> Machine {
        Machine::new(MachineId::from(format!("m{slot}").as_str()), level, slot)
    }

    fn production_module(row: u8, value: f64) -> RowModule {
        RowModule {
            row_index: row,
            rarity: Rarity::Common,
            bonuses: vec![RowBonus {
                kind: BonusKind::ProductionPercent,
                value,
                locked: false,
            }],
        }
    }

    #[test]
    fn rate_sums_enabled_machines() {
        let b = Balance::default();
        let roster = vec![m(0, 1), m(1, 2)];
        assert_eq!(production_rate(&roster, false, &[], &b), 3.5);
    }

    #[test]
    fn disabled_machines_contribute_nothing() {
        let b = Balance::default();
        let mut roster = vec![m(0, 1), m(1, 2)];
        roster[1].disabled = true;
        assert_eq!(production_rate(&roster, false, &[], &b), 1.0);
    }

    #[test]
    fn outage_zeroes_rate_and_expiry_restores_it() {
        let b = Balance::default();
        let roster = vec![m(0, 3), m(4, 1)];
        let before = production_rate(&roster, false, &[], &b);
        assert_eq!(production_rate(&roster, true, &[], &b), 0.0);
        assert_eq!(production_rate(&roster, false, &[], &b), before);
    }

    #[test]
    fn row_bonus_applies_only_to_its_row() {
        let b = Balance::default();
        let roster = vec![m(0, 1), m(3, 1)];
        let modules = vec![production_module(0, 50.0)];
        assert_eq!(production_rate(&roster, false, &modules, &b), 2.5);
    }

    #[test]
    fn earnings_scale_with_delta() {
        let b = Balance::default();
        let roster = vec![m(0, 1)];
        assert_eq!(earnings(&roster, false, 100.0, &[], &b), 0.1);
        assert_eq!(earnings(&roster, true, 100.0, &[], &b), 0.0);
    }

    #[test]
    fn offline_is_halved_floored_and_ignores_bonuses() {
        let b = Balance::default();
        let roster = vec![m(0, 2)];
        // 2.5/s * 61s * 0.5 = 76.25
        let off = offline_earnings(&roster, 1_000, 62_000, &b);
        assert_eq!(off.earnings, 76.0);
        assert_eq!(off.time_away_ms, 61_000);
        assert!(off.worth_reporting(&b));
    }

    #[test]
    fn offline_caps_at_eight_hours() {
        let b = Balance::default();
        let off = offline_earnings(&[m(0, 1)], 0, 100 * 3_600_000, &b);
        assert_eq!(off.time_away_ms, 8 * 3_600_000);
        assert_eq!(off.earnings, 14_400.0);
    }

    #[test]
    fn offline_clock_skew_yields_nothing() {
        let b = Balance::default();
        let off = offline_earnings(&[m(0, 1)], 10_000, 5_000, &b);
        assert_eq!(off.time_away_ms, 0);
        assert_eq!(off.earnings, 0.0);
        assert!(!off.worth_reporting(&b));
    }

    #[test]
    fn short_absence_not_reported() {
        let b = Balance::default();
        let off = offline_earnings(&[m(0, 5)], 0, 60_000, &b);
        assert!(off.earnings > 0.0);
        assert!(!off.worth_reporting(&b));
    }
}
