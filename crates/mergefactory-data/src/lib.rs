//! Balance data loading for the merge factory.
//!
//! Reads tuning files in RON, TOML or JSON into
//! [`mergefactory_core::balance::Balance`]. The shipped defaults live in
//! `data/balance.ron`; `data/presets/` holds partial overrides.

pub mod balance;
pub mod loader;

pub use balance::{load_balance, load_balance_from_dir, parse_balance};
pub use loader::{DataLoadError, Format};
