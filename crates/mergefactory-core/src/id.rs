use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rng::SimRng;
use crate::sim::Timestamp;

/// Number of machine slots on the grid (3 x 3).
pub const GRID_SIZE: u8 = 9;

/// Slots per grid row.
pub const ROW_WIDTH: u8 = 3;

/// Number of grid rows, and therefore of row-module positions.
pub const ROW_COUNT: u8 = GRID_SIZE / ROW_WIDTH;

/// Opaque unique token identifying a machine. Serialized as a bare string so
/// saves stay readable and ids from older saves load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(pub String);

impl MachineId {
    /// Mint a fresh id of the form `m_<timestamp>_<7 base-36 chars>`.
    pub fn generate(now: Timestamp, rng: &mut SimRng) -> Self {
        const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut bits = rng.next_u64();
        let mut suffix = String::with_capacity(7);
        for _ in 0..7 {
            suffix.push(ALPHABET[(bits % 36) as usize] as char);
            bits /= 36;
        }
        Self(format!("m_{now}_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MachineId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Row a slot belongs to: slots 0-2 are row 0, 3-5 row 1, 6-8 row 2.
#[inline]
pub fn row_for_slot(slot: u8) -> u8 {
    slot / ROW_WIDTH
}

#[inline]
pub fn is_valid_slot(slot: u8) -> bool {
    slot < GRID_SIZE
}

#[inline]
pub fn is_valid_row(row: u8) -> bool {
    row < ROW_COUNT
}
