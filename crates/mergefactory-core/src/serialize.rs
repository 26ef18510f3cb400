//! Save blobs, export and import.
//!
//! A save is the whole [`GameState`] as a compact JSON object. Export writes
//! exactly the current schema; import and load both go through
//! [`migrate_save`] so older and hand-edited saves are accepted when they can
//! be made sense of.

use serde_json::Value;

use crate::balance::Balance;
use crate::migration::{MigrationError, migrate_save};
use crate::sim::Timestamp;
use crate::state::GameState;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to encode save: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Import failures. The display strings are meant to be shown to the player.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Paste a save first.")]
    Empty,
    #[error("Invalid JSON. Please double-check the save text.")]
    InvalidJson(#[source] serde_json::Error),
    #[error("That does not look like a valid save.")]
    InvalidSave(#[source] MigrationError),
    #[error("The game session has ended.")]
    SessionStopped,
}

/// The state as save text, unchanged.
pub fn export_save(state: &GameState) -> Result<String, ExportError> {
    Ok(serde_json::to_string(state)?)
}

/// Save text for persisting at `now`: `lastTickTime` is stamped with the
/// save moment so the next load measures time away from here.
pub fn save_blob(state: &GameState, now: Timestamp) -> Result<String, ExportError> {
    let stamped = GameState {
        last_tick_time: now,
        ..state.clone()
    };
    export_save(&stamped)
}

/// Parse and migrate a stored blob.
pub fn decode_save(
    blob: &str,
    now: Timestamp,
    balance: &Balance,
) -> Result<GameState, MigrationError> {
    let raw: Value = serde_json::from_str(blob)?;
    migrate_save(raw, now, balance)
}

/// Parse player-supplied save text. Never touches the current state; the
/// caller dispatches `LoadGame` with the result.
pub fn import_save(
    text: &str,
    now: Timestamp,
    balance: &Balance,
) -> Result<GameState, ImportError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ImportError::Empty);
    }
    let raw: Value = serde_json::from_str(trimmed).map_err(ImportError::InvalidJson)?;
    migrate_save(raw, now, balance).map_err(|e| {
        log::warn!("rejected imported save: {e}");
        ImportError::InvalidSave(e)
    })
}
