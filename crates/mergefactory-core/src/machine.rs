//! Machines on the grid and the rules for merging them.

use serde::{Deserialize, Serialize};

use crate::id::{GRID_SIZE, MachineId, row_for_slot};

/// A machine occupying one grid slot.
///
/// `disabled` is set while a fire burns the machine; a disabled machine
/// cannot move, merge, or produce until repaired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: MachineId,
    /// Starts at 1 and only ever increases through merging. No upper cap.
    pub level: u32,
    pub slot_index: u8,
    #[serde(default)]
    pub disabled: bool,
}

impl Machine {
    /// A fresh, enabled machine.
    pub fn new(id: MachineId, level: u32, slot_index: u8) -> Self {
        Self {
            id,
            level,
            slot_index,
            disabled: false,
        }
    }

    /// Grid row this machine sits in.
    pub fn row(&self) -> u8 {
        row_for_slot(self.slot_index)
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }
}

/// Whether `a` and `b` may be merged: distinct, same level, both enabled.
pub fn can_merge(a: &Machine, b: &Machine) -> bool {
    a.id != b.id && a.level == b.level && !a.disabled && !b.disabled
}

/// Level produced by merging two machines of `level`.
pub fn merged_level(level: u32) -> u32 {
    level.saturating_add(1)
}

/// Lowest-numbered slot with no machine, if any.
pub fn find_empty_slot(machines: &[Machine]) -> Option<u8> {
    (0..GRID_SIZE).find(|slot| !machines.iter().any(|m| m.slot_index == *slot))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: &str, level: u32, slot: u8) -> Machine {
        Machine::new(MachineId::from(id), level, slot)
    }

    #[test]
    fn same_level_enabled_machines_merge() {
        assert!(can_merge(&m("a", 2, 0), &m("b", 2, 1)));
    }

    #[test]
    fn merge_rejects_level_mismatch() {
        assert!(!can_merge(&m("a", 1, 0), &m("b", 2, 1)));
    }

    #[test]
    fn merge_rejects_same_id() {
        let a = m("a", 1, 0);
        assert!(!can_merge(&a, &a));
    }

    #[test]
    fn merge_rejects_disabled() {
        let mut burning = m("a", 1, 0);
        burning.disabled = true;
        let fine = m("b", 1, 1);
        assert!(!can_merge(&burning, &fine));
        assert!(!can_merge(&fine, &burning));
    }

    #[test]
    fn merged_level_has_no_cap() {
        assert_eq!(merged_level(1), 2);
        assert_eq!(merged_level(99), 100);
    }

    #[test]
    fn empty_slot_search() {
        assert_eq!(find_empty_slot(&[]), Some(0));
        assert_eq!(find_empty_slot(&[m("a", 1, 0), m("b", 1, 2)]), Some(1));
        let full: Vec<Machine> = (0..GRID_SIZE).map(|s| m(&format!("m{s}"), 1, s)).collect();
        assert_eq!(find_empty_slot(&full), None);
    }

    #[test]
    fn json_shape_is_camel_case() {
        let json = serde_json::to_value(m("x", 3, 4)).unwrap();
        assert_eq!(json["slotIndex"], 4);
        assert_eq!(json["disabled"], false);
        assert_eq!(json["id"], "x");
    }
}
