//! The game aggregate.

use serde::{Deserialize, Serialize};

use crate::balance::Balance;
use crate::disaster::Disaster;
use crate::id::MachineId;
use crate::machine::Machine;
use crate::row_module::{RowModule, module_for_row};
use crate::sim::{StateHash, Timestamp};

/// Current save schema version. See [`crate::migration`].
pub const SAVE_VERSION: u32 = 2;

/// Lifetime counters. Never reset except by a full game reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub lifetime_currency_earned: f64,
    pub lifetime_machines_bought: u64,
    pub lifetime_merges: u64,
    pub highest_machine_level: u32,
}

/// Everything a save contains.
///
/// Owned and replaced only by the transition function in [`crate::reducer`].
/// Invariants: no two machines share a slot, no two modules share a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub currency: f64,
    pub machines: Vec<Machine>,
    pub active_disaster: Option<Disaster>,
    pub selected_machine_id: Option<MachineId>,
    pub last_tick_time: Timestamp,
    /// Accumulated milliseconds of ticked play.
    pub total_play_time: f64,
    #[serde(default)]
    pub row_modules: Vec<RowModule>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub save_version: u32,
}

impl GameState {
    /// The initial aggregate: starting currency, empty grid, no modules.
    pub fn new(now: Timestamp, balance: &Balance) -> Self {
        Self {
            currency: balance.starting_currency,
            machines: Vec::new(),
            active_disaster: None,
            selected_machine_id: None,
            last_tick_time: now,
            total_play_time: 0.0,
            row_modules: Vec::new(),
            stats: Stats::default(),
            save_version: SAVE_VERSION,
        }
    }

    pub fn machine(&self, id: &MachineId) -> Option<&Machine> {
        self.machines.iter().find(|m| &m.id == id)
    }

    pub fn machine_at(&self, slot: u8) -> Option<&Machine> {
        self.machines.iter().find(|m| m.slot_index == slot)
    }

    pub fn is_slot_occupied(&self, slot: u8) -> bool {
        self.machine_at(slot).is_some()
    }

    pub fn module_for_row(&self, row: u8) -> Option<&RowModule> {
        module_for_row(&self.row_modules, row)
    }

    pub fn is_power_outage(&self) -> bool {
        self.active_disaster
            .as_ref()
            .is_some_and(Disaster::is_power_outage)
    }

    pub fn selected_machine(&self) -> Option<&Machine> {
        self.selected_machine_id
            .as_ref()
            .and_then(|id| self.machine(id))
    }

    /// Deterministic hash over every field, for replay checks.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_f64(self.currency);
        h.write_u32(self.machines.len() as u32);
        for m in &self.machines {
            h.write_str(m.id.as_str());
            h.write_u32(m.level);
            h.write(&[m.slot_index, m.disabled as u8]);
        }
        match &self.active_disaster {
            None => h.write(&[0]),
            Some(d) => {
                h.write(&[1, d.kind as u8, d.target_slot.unwrap_or(u8::MAX)]);
                h.write_u64(d.start_time);
                h.write_f64(d.duration);
            }
        }
        match &self.selected_machine_id {
            None => h.write(&[0]),
            Some(id) => {
                h.write(&[1]);
                h.write_str(id.as_str());
            }
        }
        h.write_u64(self.last_tick_time);
        h.write_f64(self.total_play_time);
        h.write_u32(self.row_modules.len() as u32);
        for module in &self.row_modules {
            h.write(&[module.row_index, module.rarity as u8]);
            h.write_u32(module.bonuses.len() as u32);
            for b in &module.bonuses {
                h.write(&[b.kind as u8, b.locked as u8]);
                h.write_f64(b.value);
            }
        }
        h.write_f64(self.stats.lifetime_currency_earned);
        h.write_u64(self.stats.lifetime_machines_bought);
        h.write_u64(self.stats.lifetime_merges);
        h.write_u32(self.stats.highest_machine_level);
        h.write_u32(self.save_version);
        h.finish()
    }
}
