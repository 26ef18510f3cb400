//! Everything that can happen to a [`GameState`].
//!
//! `Tick` is the time signal from the driver; `StartDisaster` comes from the
//! disaster check; the rest are player intents. Serialized with a `type` tag
//! so an action log can be written next to a save and replayed.

use serde::{Deserialize, Serialize};

use crate::disaster::Disaster;
use crate::id::MachineId;
use crate::state::GameState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Action {
    Tick {
        delta_ms: f64,
    },
    BuyMachine {
        slot_index: u8,
    },
    SelectMachine {
        machine_id: Option<MachineId>,
    },
    MergeMachines {
        source_id: MachineId,
        target_id: MachineId,
    },
    MoveMachine {
        machine_id: MachineId,
        target_slot: u8,
    },
    ScrapMachine {
        machine_id: MachineId,
    },
    RepairMachine {
        machine_id: MachineId,
    },
    StartDisaster {
        disaster: Disaster,
    },
    EndDisaster,
    CollectOffline {
        earnings: f64,
    },
    UpgradeRow {
        row_index: u8,
    },
    RerollBonus {
        row_index: u8,
        bonus_index: usize,
    },
    /// Reroll every unlocked bonus of a row, drawing fresh kinds.
    RerollRow {
        row_index: u8,
    },
    ToggleBonusLock {
        row_index: u8,
        bonus_index: usize,
    },
    /// Replace the aggregate with an already-migrated state.
    LoadGame {
        state: Box<GameState>,
    },
    ResetGame,
}

impl Action {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Tick { .. } => "tick",
            Action::BuyMachine { .. } => "buy_machine",
            Action::SelectMachine { .. } => "select_machine",
            Action::MergeMachines { .. } => "merge_machines",
            Action::MoveMachine { .. } => "move_machine",
            Action::ScrapMachine { .. } => "scrap_machine",
            Action::RepairMachine { .. } => "repair_machine",
            Action::StartDisaster { .. } => "start_disaster",
            Action::EndDisaster => "end_disaster",
            Action::CollectOffline { .. } => "collect_offline",
            Action::UpgradeRow { .. } => "upgrade_row",
            Action::RerollBonus { .. } => "reroll_bonus",
            Action::RerollRow { .. } => "reroll_row",
            Action::ToggleBonusLock { .. } => "toggle_bonus_lock",
            Action::LoadGame { .. } => "load_game",
            Action::ResetGame => "reset_game",
        }
    }
}
