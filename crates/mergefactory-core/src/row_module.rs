//! Row modules: per-row upgrade slots that roll percentage bonuses.
//!
//! # Rarity
//!
//! A module starts at [`Rarity::Common`] and can be upgraded one tier at a
//! time up to [`Rarity::Epic`]. The rarity fixes how many bonuses the module
//! carries (1 to 4) and the value range each bonus kind may roll in.
//!
//! # Upgrading
//!
//! On upgrade every existing bonus keeps its relative position inside its
//! kind's range: a roll at 40% of the Common range lands at 40% of the
//! Uncommon range. New bonuses are then appended until the module holds the
//! new tier's slot count.
//!
//! # Rerolling and locking
//!
//! A reroll replaces a bonus value (single-slot reroll keeps the kind;
//! whole-row reroll draws fresh kinds too). Locked bonuses are never touched.
//!
//! Only [`BonusKind::ProductionPercent`] and
//! [`BonusKind::DisasterDurationReduction`] feed into the simulation today;
//! the other six kinds are rolled, stored and shown but have no effect.

use serde::{Deserialize, Serialize};

use crate::balance::Balance;
use crate::rng::SimRng;

// ---------------------------------------------------------------------------
// Rarity
// ---------------------------------------------------------------------------

/// Module tier. Strictly ordered Common < Uncommon < Rare < Epic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
    ];

    /// The following tier, or `None` at Epic.
    pub fn next(self) -> Option<Rarity> {
        match self {
            Rarity::Common => Some(Rarity::Uncommon),
            Rarity::Uncommon => Some(Rarity::Rare),
            Rarity::Rare => Some(Rarity::Epic),
            Rarity::Epic => None,
        }
    }

    /// Number of bonuses a module of this tier carries.
    pub fn bonus_slots(self) -> usize {
        match self {
            Rarity::Common => 1,
            Rarity::Uncommon => 2,
            Rarity::Rare => 3,
            Rarity::Epic => 4,
        }
    }

    pub fn is_max(self) -> bool {
        self.next().is_none()
    }

    pub fn name(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Bonus kinds
// ---------------------------------------------------------------------------

/// The eight effect categories a bonus can roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BonusKind {
    /// +production % for machines in the row. Applied.
    ProductionPercent,
    ProductionAfterMerge,
    /// -power outage duration %, summed over all rows. Applied.
    DisasterDurationReduction,
    DisasterChanceIncrease,
    DisasterResolutionReward,
    UpgradeCostReduction,
    AutomationSpeed,
    OfflineEarningsPercent,
}

/// `[min, max]` percentage per kind, indexed by rarity (Common..Epic).
type RangeTable = [(f64, f64); 4];

impl BonusKind {
    pub const ALL: [BonusKind; 8] = [
        BonusKind::ProductionPercent,
        BonusKind::ProductionAfterMerge,
        BonusKind::DisasterDurationReduction,
        BonusKind::DisasterChanceIncrease,
        BonusKind::DisasterResolutionReward,
        BonusKind::UpgradeCostReduction,
        BonusKind::AutomationSpeed,
        BonusKind::OfflineEarningsPercent,
    ];

    fn ranges(self) -> RangeTable {
        match self {
            BonusKind::ProductionPercent => [(5.0, 10.0), (10.0, 20.0), (20.0, 35.0), (35.0, 50.0)],
            BonusKind::ProductionAfterMerge => [(3.0, 8.0), (8.0, 15.0), (15.0, 25.0), (25.0, 40.0)],
            BonusKind::DisasterDurationReduction => {
                [(5.0, 10.0), (10.0, 20.0), (20.0, 30.0), (30.0, 50.0)]
            }
            BonusKind::DisasterChanceIncrease => [(2.0, 5.0), (5.0, 10.0), (10.0, 18.0), (18.0, 30.0)],
            BonusKind::DisasterResolutionReward => {
                [(10.0, 20.0), (20.0, 40.0), (40.0, 70.0), (70.0, 100.0)]
            }
            BonusKind::UpgradeCostReduction => [(3.0, 6.0), (6.0, 12.0), (12.0, 20.0), (20.0, 30.0)],
            BonusKind::AutomationSpeed => [(5.0, 10.0), (10.0, 20.0), (20.0, 35.0), (35.0, 50.0)],
            BonusKind::OfflineEarningsPercent => [(5.0, 10.0), (10.0, 20.0), (20.0, 35.0), (35.0, 50.0)],
        }
    }

    /// Inclusive value range (percent) this kind rolls in at `rarity`.
    pub fn range(self, rarity: Rarity) -> (f64, f64) {
        self.ranges()[rarity.index()]
    }

    /// Whether the simulation reads this kind. The rest are placeholders.
    pub fn is_applied(self) -> bool {
        matches!(
            self,
            BonusKind::ProductionPercent | BonusKind::DisasterDurationReduction
        )
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BonusKind::ProductionPercent => "+Production",
            BonusKind::ProductionAfterMerge => "+Post-Merge Production",
            BonusKind::DisasterDurationReduction => "-Disaster Duration",
            BonusKind::DisasterChanceIncrease => "+Disaster Chance",
            BonusKind::DisasterResolutionReward => "+Disaster Reward",
            BonusKind::UpgradeCostReduction => "-Upgrade Cost",
            BonusKind::AutomationSpeed => "+Automation Speed",
            BonusKind::OfflineEarningsPercent => "+Offline Earnings",
        }
    }

    fn random(rng: &mut SimRng) -> BonusKind {
        BonusKind::ALL[rng.index(BonusKind::ALL.len())]
    }
}

// ---------------------------------------------------------------------------
// RowBonus
// ---------------------------------------------------------------------------

/// One rolled bonus. `value` is the realized percentage, never a raw roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowBonus {
    pub kind: BonusKind,
    pub value: f64,
    #[serde(default)]
    pub locked: bool,
}

impl RowBonus {
    /// Build a bonus from a normalized roll in `[0, 1]` (clamped).
    pub fn from_roll(kind: BonusKind, rarity: Rarity, roll: f64) -> Self {
        let (min, max) = kind.range(rarity);
        Self {
            kind,
            value: min + roll.clamp(0.0, 1.0) * (max - min),
            locked: false,
        }
    }

    /// Position of `value` within its kind's range at `rarity`, clamped to
    /// `[0, 1]`. A zero-width range yields 0.
    pub fn roll_position(&self, rarity: Rarity) -> f64 {
        let (min, max) = self.kind.range(rarity);
        if max == min {
            return 0.0;
        }
        ((self.value - min) / (max - min)).clamp(0.0, 1.0)
    }

    /// Same kind and relative position, mapped into `to`'s range.
    fn rescaled(&self, from: Rarity, to: Rarity) -> Self {
        let (min, max) = self.kind.range(to);
        Self {
            value: min + self.roll_position(from) * (max - min),
            ..self.clone()
        }
    }
}

/// Uniformly random kind with a uniformly random value in that kind's range.
pub fn generate_bonus(rarity: Rarity, rng: &mut SimRng) -> RowBonus {
    let kind = BonusKind::random(rng);
    generate_bonus_of_kind(kind, rarity, rng)
}

/// Fresh value for a fixed kind.
pub fn generate_bonus_of_kind(kind: BonusKind, rarity: Rarity, rng: &mut SimRng) -> RowBonus {
    let (min, max) = kind.range(rarity);
    RowBonus {
        kind,
        value: rng.range_f64(min, max),
        locked: false,
    }
}

// ---------------------------------------------------------------------------
// RowModule
// ---------------------------------------------------------------------------

/// The upgrade module attached to one grid row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowModule {
    /// 0 = top row, 2 = bottom row.
    pub row_index: u8,
    pub rarity: Rarity,
    pub bonuses: Vec<RowBonus>,
}

impl RowModule {
    /// A new Common module with one generated bonus.
    pub fn new(row_index: u8, rng: &mut SimRng) -> Self {
        Self {
            row_index,
            rarity: Rarity::Common,
            bonuses: vec![generate_bonus(Rarity::Common, rng)],
        }
    }

    /// Advance one tier, rescaling existing bonuses and filling new slots.
    /// Returns `None` at max rarity.
    pub fn upgraded(&self, rng: &mut SimRng) -> Option<RowModule> {
        let next = self.rarity.next()?;
        let mut bonuses: Vec<RowBonus> = self
            .bonuses
            .iter()
            .map(|b| b.rescaled(self.rarity, next))
            .collect();
        while bonuses.len() < next.bonus_slots() {
            bonuses.push(generate_bonus(next, rng));
        }
        Some(RowModule {
            row_index: self.row_index,
            rarity: next,
            bonuses,
        })
    }

    /// Re-draw the value of the bonus at `index`, keeping its kind.
    /// Locked or out-of-range indices leave the module unchanged.
    pub fn with_rerolled_bonus(&self, index: usize, rng: &mut SimRng) -> RowModule {
        let mut next = self.clone();
        if let Some(bonus) = next.bonuses.get_mut(index)
            && !bonus.locked
        {
            *bonus = generate_bonus_of_kind(bonus.kind, self.rarity, rng);
        }
        next
    }

    /// Replace every unlocked bonus with a freshly generated one (new kind
    /// and value).
    pub fn with_unlocked_rerolled(&self, rng: &mut SimRng) -> RowModule {
        let bonuses = self
            .bonuses
            .iter()
            .map(|b| {
                if b.locked {
                    b.clone()
                } else {
                    generate_bonus(self.rarity, rng)
                }
            })
            .collect();
        RowModule {
            bonuses,
            ..self.clone()
        }
    }

    /// Flip the lock on the bonus at `index`. Out of range is a no-op.
    pub fn with_lock_toggled(&self, index: usize) -> RowModule {
        let mut next = self.clone();
        if let Some(bonus) = next.bonuses.get_mut(index) {
            bonus.locked = !bonus.locked;
        }
        next
    }

    /// Sum of this module's values for `kind`, as a fraction (45% -> 0.45).
    pub fn total_fraction(&self, kind: BonusKind) -> f64 {
        self.bonuses
            .iter()
            .filter(|b| b.kind == kind)
            .map(|b| b.value)
            .sum::<f64>()
            / 100.0
    }
}

// ---------------------------------------------------------------------------
// Costs
// ---------------------------------------------------------------------------

/// Price of the next upgrade: the Common tier for an absent module, the next
/// tier otherwise, `None` when the module is already Epic.
pub fn upgrade_cost(module: Option<&RowModule>, balance: &Balance) -> Option<f64> {
    let target = match module {
        None => Rarity::Common,
        Some(m) => m.rarity.next()?,
    };
    Some(balance.row_module_costs.get(target))
}

/// Reroll price for a row. Row 0 is cheapest.
pub fn reroll_cost(row_index: u8, balance: &Balance) -> f64 {
    balance.reroll_base_cost * (row_index as f64 + 1.0)
}

// ---------------------------------------------------------------------------
// Aggregation across rows
// ---------------------------------------------------------------------------

/// The module installed on `row`, if unlocked.
pub fn module_for_row(modules: &[RowModule], row: u8) -> Option<&RowModule> {
    modules.iter().find(|m| m.row_index == row)
}

/// Production multiplier addend for machines in `row` (0.45 for +45%).
pub fn row_production_bonus(modules: &[RowModule], row: u8) -> f64 {
    module_for_row(modules, row)
        .map(|m| m.total_fraction(BonusKind::ProductionPercent))
        .unwrap_or(0.0)
}

/// Disaster-duration reduction contributed by `row`, as a fraction.
pub fn row_disaster_reduction(modules: &[RowModule], row: u8) -> f64 {
    module_for_row(modules, row)
        .map(|m| m.total_fraction(BonusKind::DisasterDurationReduction))
        .unwrap_or(0.0)
}

/// Summed reduction across all rows, capped at `balance.max_duration_reduction`.
pub fn global_disaster_reduction(modules: &[RowModule], balance: &Balance) -> f64 {
    let total: f64 = (0..crate::id::ROW_COUNT)
        .map(|row| row_disaster_reduction(modules, row))
        .sum();
    total.min(balance.max_duration_reduction)
}

// ===========================================================================
// Tests
// ===========================================================================
