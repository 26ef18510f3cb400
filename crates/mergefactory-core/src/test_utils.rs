//! Shared test helpers for unit tests, property tests and the integration
//! test crate.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::action::Action;
use crate::balance::Balance;
use crate::event::Transition;
use crate::id::MachineId;
use crate::machine::Machine;
use crate::reducer::{StepContext, apply};
use crate::rng::SimRng;
use crate::row_module::{BonusKind, Rarity, RowBonus, RowModule};
use crate::sim::Timestamp;
use crate::state::GameState;

/// Fixed wall-clock origin for tests.
pub const TEST_NOW: Timestamp = 1_700_000_000_000;

pub const TEST_SEED: u64 = 42;

// ===========================================================================
// Builders
// ===========================================================================

pub fn machine(id: &str, level: u32, slot: u8) -> Machine {
    Machine::new(MachineId::from(id), level, slot)
}

pub fn id(s: &str) -> MachineId {
    MachineId::from(s)
}

pub fn bonus(kind: BonusKind, value: f64) -> RowBonus {
    RowBonus {
        kind,
        value,
        locked: false,
    }
}

pub fn module(row: u8, rarity: Rarity, bonuses: &[(BonusKind, f64)]) -> RowModule {
    RowModule {
        row_index: row,
        rarity,
        bonuses: bonuses.iter().map(|&(k, v)| bonus(k, v)).collect(),
    }
}

/// Initial state at [`TEST_NOW`] with default balance.
pub fn fresh_state() -> GameState {
    GameState::new(TEST_NOW, &Balance::default())
}

pub fn state_with_machines(machines: Vec<Machine>) -> GameState {
    GameState {
        machines,
        ..fresh_state()
    }
}

pub fn state_with(currency: f64, machines: Vec<Machine>, modules: Vec<RowModule>) -> GameState {
    GameState {
        currency,
        machines,
        row_modules: modules,
        ..fresh_state()
    }
}

// ===========================================================================
// TestEnv
// ===========================================================================

/// Seeded RNG, default balance and a hand-driven clock.
pub struct TestEnv {
    pub rng: SimRng,
    pub balance: Balance,
    pub now: Timestamp,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_seed(TEST_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SimRng::new(seed),
            balance: Balance::default(),
            now: TEST_NOW,
        }
    }

    pub fn ctx(&mut self) -> StepContext<'_> {
        StepContext {
            now: self.now,
            rng: &mut self.rng,
            balance: &self.balance,
        }
    }

    pub fn apply(&mut self, state: &GameState, action: Action) -> Transition {
        let mut ctx = self.ctx();
        apply(state, &action, &mut ctx)
    }

    /// Apply and keep only the successor state.
    pub fn reduce(&mut self, state: &GameState, action: Action) -> GameState {
        self.apply(state, action).state
    }

    /// Move the clock forward and tick by the same amount.
    pub fn tick(&mut self, state: &GameState, delta_ms: u64) -> GameState {
        self.now += delta_ms;
        self.reduce(
            state,
            Action::Tick {
                delta_ms: delta_ms as f64,
            },
        )
    }
}
