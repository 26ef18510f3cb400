//! Disaster generation and resolution.
//!
//! At most one disaster is active at a time. A [`DisasterKind::Fire`] burns a
//! single machine and stays until that machine is repaired or scrapped. A
//! [`DisasterKind::PowerOutage`] zeroes all production and expires on its
//! own once its (reduced) duration has elapsed.

use serde::{Deserialize, Serialize};

use crate::balance::Balance;
use crate::machine::Machine;
use crate::rng::SimRng;
use crate::row_module::{RowModule, global_disaster_reduction};
use crate::sim::Timestamp;

/// Duration stamped on every fire. Effectively permanent: no elapsed-time
/// comparison in a play session reaches it, and fires are never expiry-checked.
pub const FIRE_DURATION_MS: f64 = 999_999_999.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisasterKind {
    Fire,
    PowerOutage,
}

impl DisasterKind {
    pub fn name(self) -> &'static str {
        match self {
            DisasterKind::Fire => "Fire",
            DisasterKind::PowerOutage => "Power Outage",
        }
    }
}

/// The active disaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disaster {
    #[serde(rename = "type")]
    pub kind: DisasterKind,
    /// Burning slot. Present for fires only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_slot: Option<u8>,
    pub start_time: Timestamp,
    /// Milliseconds.
    pub duration: f64,
}

impl Disaster {
    pub fn fire(target_slot: u8, start_time: Timestamp) -> Self {
        Self {
            kind: DisasterKind::Fire,
            target_slot: Some(target_slot),
            start_time,
            duration: FIRE_DURATION_MS,
        }
    }

    pub fn power_outage(start_time: Timestamp, duration: f64) -> Self {
        Self {
            kind: DisasterKind::PowerOutage,
            target_slot: None,
            start_time,
            duration,
        }
    }

    pub fn is_power_outage(&self) -> bool {
        self.kind == DisasterKind::PowerOutage
    }

    /// Whether a power outage has run its course at `now`. Fires never expire.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.is_power_outage() && now.saturating_sub(self.start_time) as f64 >= self.duration
    }

    /// Whether this is a fire burning `slot`.
    pub fn targets(&self, slot: u8) -> bool {
        self.kind == DisasterKind::Fire && self.target_slot == Some(slot)
    }

    /// Milliseconds left before expiry, `None` for fires.
    pub fn remaining_ms(&self, now: Timestamp) -> Option<f64> {
        if !self.is_power_outage() {
            return None;
        }
        let elapsed = now.saturating_sub(self.start_time) as f64;
        Some((self.duration - elapsed).max(0.0))
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Gate for a disaster check: nothing active and at least one machine.
pub fn should_check(active: Option<&Disaster>, machines: &[Machine]) -> bool {
    active.is_none() && !machines.is_empty()
}

/// Final outage length: `base * (1 - reduction)`, floored at the balance
/// minimum.
pub fn outage_duration(base_ms: f64, reduction: f64, balance: &Balance) -> f64 {
    (base_ms * (1.0 - reduction)).max(balance.min_disaster_duration_ms)
}

/// Pick fire or outage 50/50 and build it. A fire with no enabled machine to
/// burn yields `None`.
pub fn generate_disaster(
    machines: &[Machine],
    modules: &[RowModule],
    now: Timestamp,
    rng: &mut SimRng,
    balance: &Balance,
) -> Option<Disaster> {
    if rng.chance(0.5) {
        let candidates: Vec<&Machine> = machines.iter().filter(|m| m.is_enabled()).collect();
        if candidates.is_empty() {
            return None;
        }
        let target = candidates[rng.index(candidates.len())];
        Some(Disaster::fire(target.slot_index, now))
    } else {
        let base = rng.range_inclusive(balance.power_outage_min_ms, balance.power_outage_max_ms);
        let reduction = global_disaster_reduction(modules, balance);
        Some(Disaster::power_outage(
            now,
            outage_duration(base as f64, reduction, balance),
        ))
    }
}

/// One full disaster check: gate, chance roll, then generation.
pub fn roll_disaster(
    active: Option<&Disaster>,
    machines: &[Machine],
    modules: &[RowModule],
    now: Timestamp,
    rng: &mut SimRng,
    balance: &Balance,
) -> Option<Disaster> {
    if !should_check(active, machines) || !rng.chance(balance.disaster_chance) {
        return None;
    }
    generate_disaster(machines, modules, now, rng, balance)
}
