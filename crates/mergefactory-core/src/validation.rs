//! Structural checks on a decoded [`GameState`].
//!
//! The transition function never produces an invalid state, so these checks
//! only guard the boundary where saves and imports enter the system.

use std::collections::HashSet;

use crate::disaster::DisasterKind;
use crate::id::{MachineId, is_valid_row, is_valid_slot};
use crate::state::GameState;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("machine {id} sits in slot {slot}, outside the grid")]
    SlotOutOfRange { id: MachineId, slot: u8 },
    #[error("machine {id} has level 0")]
    ZeroLevel { id: MachineId },
    #[error("slot {0} holds more than one machine")]
    DuplicateSlot(u8),
    #[error("machine id {0} appears more than once")]
    DuplicateMachineId(MachineId),
    #[error("row module for row {0} does not exist on the grid")]
    RowOutOfRange(u8),
    #[error("row {0} has more than one module")]
    DuplicateRow(u8),
    #[error("row {row} holds {count} bonuses, more than its rarity allows")]
    TooManyBonuses { row: u8, count: usize },
    #[error("fire disaster has no target slot")]
    FireWithoutTarget,
    #[error("currency is not a finite number")]
    NonFiniteCurrency,
}

/// Check every aggregate invariant, returning the first violation.
pub fn validate(state: &GameState) -> Result<(), ValidationError> {
    if !state.currency.is_finite() {
        return Err(ValidationError::NonFiniteCurrency);
    }

    let mut slots = HashSet::new();
    let mut ids = HashSet::new();
    for m in &state.machines {
        if !is_valid_slot(m.slot_index) {
            return Err(ValidationError::SlotOutOfRange {
                id: m.id.clone(),
                slot: m.slot_index,
            });
        }
        if m.level == 0 {
            return Err(ValidationError::ZeroLevel { id: m.id.clone() });
        }
        if !slots.insert(m.slot_index) {
            return Err(ValidationError::DuplicateSlot(m.slot_index));
        }
        if !ids.insert(&m.id) {
            return Err(ValidationError::DuplicateMachineId(m.id.clone()));
        }
    }

    let mut rows = HashSet::new();
    for module in &state.row_modules {
        if !is_valid_row(module.row_index) {
            return Err(ValidationError::RowOutOfRange(module.row_index));
        }
        if !rows.insert(module.row_index) {
            return Err(ValidationError::DuplicateRow(module.row_index));
        }
        if module.bonuses.len() > module.rarity.bonus_slots() {
            return Err(ValidationError::TooManyBonuses {
                row: module.row_index,
                count: module.bonuses.len(),
            });
        }
    }

    if let Some(d) = &state.active_disaster
        && d.kind == DisasterKind::Fire
        && d.target_slot.is_none()
    {
        return Err(ValidationError::FireWithoutTarget);
    }

    Ok(())
}
