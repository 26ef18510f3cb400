//! Transition outcomes.
//!
//! Every call to [`crate::reducer::apply`] returns the successor state plus
//! the events it produced. A rejected action yields the unchanged state and
//! exactly one [`GameEvent::Rejected`] carrying the reason.

use crate::disaster::{Disaster, DisasterKind};
use crate::id::MachineId;
use crate::row_module::Rarity;
use crate::state::GameState;

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why an action left the state untouched. Not an error: ordinary game-rule
/// refusals.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: f64, available: f64 },
    #[error("slot {slot} is occupied")]
    SlotOccupied { slot: u8 },
    #[error("slot {slot} is outside the grid")]
    SlotOutOfRange { slot: u8 },
    #[error("no machine {id}")]
    UnknownMachine { id: MachineId },
    #[error("cannot merge a machine with itself")]
    SameMachine,
    #[error("level mismatch: {source_level} vs {target_level}")]
    LevelMismatch { source_level: u32, target_level: u32 },
    #[error("machine {id} is disabled")]
    MachineDisabled { id: MachineId },
    #[error("machine {id} is not disabled")]
    MachineNotDisabled { id: MachineId },
    #[error("a disaster is already active")]
    DisasterActive,
    #[error("no machine to burn at {slot:?}")]
    NoFireTarget { slot: Option<u8> },
    #[error("row {row} has no module")]
    NoRowModule { row: u8 },
    #[error("row {row} has no bonus {index}")]
    BonusIndexOutOfRange { row: u8, index: usize },
    #[error("row {row} is already at max rarity")]
    MaxRarity { row: u8 },
    #[error("row {row} does not exist")]
    InvalidRow { row: u8 },
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Produced {
        amount: f64,
    },
    MachineBought {
        id: MachineId,
        slot: u8,
        cost: f64,
    },
    MachineSelected {
        id: Option<MachineId>,
    },
    MachinesMerged {
        source: MachineId,
        target: MachineId,
        result: MachineId,
        level: u32,
    },
    MachineMoved {
        id: MachineId,
        from: u8,
        to: u8,
    },
    MachineScrapped {
        id: MachineId,
        refund: f64,
    },
    MachineRepaired {
        id: MachineId,
        cost: f64,
    },
    DisasterStarted {
        disaster: Disaster,
    },
    DisasterResolved {
        kind: DisasterKind,
    },
    OfflineCollected {
        amount: f64,
    },
    RowUpgraded {
        row: u8,
        rarity: Rarity,
        cost: f64,
    },
    BonusRerolled {
        row: u8,
        index: usize,
        cost: f64,
    },
    RowRerolled {
        row: u8,
        cost: f64,
    },
    BonusLockToggled {
        row: u8,
        index: usize,
        locked: bool,
    },
    GameLoaded,
    GameReset,
    Rejected(Rejection),
}

/// Successor state and what happened on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: GameState,
    pub events: Vec<GameEvent>,
}

impl Transition {
    /// The rejection reason, if the action was refused.
    pub fn rejection(&self) -> Option<&Rejection> {
        self.events.iter().find_map(|e| match e {
            GameEvent::Rejected(r) => Some(r),
            _ => None,
        })
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection().is_some()
    }
}
