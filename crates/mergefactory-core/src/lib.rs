//! Merge Factory Core -- the simulation engine for an idle merge game.
//!
//! Players place machines on a 3x3 grid, merge equal-level machines into
//! stronger ones, earn currency passively, survive random disasters and buy
//! per-row upgrade modules that roll percentage bonuses.
//!
//! # Architecture
//!
//! All mutation goes through one pure transition function,
//! [`reducer::apply`], which maps `(state, action, context)` to a successor
//! state plus events. Everything else is either a pure calculator it calls
//! into or the [`session::Session`] driver that feeds it:
//!
//! - [`balance`] -- tuning constants and level curves.
//! - [`row_module`] -- rarity tiers, bonus rolls, upgrade/reroll/lock.
//! - [`production`] -- live rate, tick earnings, offline catch-up.
//! - [`disaster`] -- fire/outage generation and expiry.
//! - [`migration`] / [`serialize`] -- versioned saves, import and export.
//! - [`session`] -- frame accumulator, disaster cadence, autosave.
//!
//! # Determinism
//!
//! Randomness comes from [`rng::SimRng`] and time from the caller, both via
//! [`reducer::StepContext`]. The same seed, actions and timestamps replay to
//! the same [`state::GameState::state_hash`].
//!
//! ```rust
//! use mergefactory_core::action::Action;
//! use mergefactory_core::balance::Balance;
//! use mergefactory_core::reducer::{StepContext, reduce};
//! use mergefactory_core::rng::SimRng;
//! use mergefactory_core::state::GameState;
//!
//! let balance = Balance::default();
//! let mut rng = SimRng::new(1);
//! let state = GameState::new(0, &balance);
//! let mut ctx = StepContext { now: 0, rng: &mut rng, balance: &balance };
//! let state = reduce(&state, &Action::BuyMachine { slot_index: 0 }, &mut ctx);
//! assert_eq!(state.currency, 40.0);
//! ```

pub mod action;
pub mod balance;
pub mod command_queue;
pub mod disaster;
pub mod event;
pub mod format;
pub mod id;
pub mod machine;
pub mod migration;
pub mod production;
pub mod reducer;
pub mod rng;
pub mod row_module;
pub mod serialize;
pub mod session;
pub mod sim;
pub mod state;
pub mod storage;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
