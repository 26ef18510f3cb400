//! Save-format migration.
//!
//! Saves are JSON objects carrying a `saveVersion`. Loading one runs three
//! passes before the data becomes a [`GameState`]:
//!
//! 1. **Chain** -- registered per-version steps bring the object up to
//!    [`SAVE_VERSION`]. Version 0 is the unversioned legacy format.
//! 2. **Normalize** -- mistyped top-level fields fall back to the initial
//!    state's values and every row bonus is coerced into the current
//!    `{kind, value, locked}` shape.
//! 3. **Decode and validate** -- the object is deserialized and checked by
//!    [`crate::validation::validate`].
//!
//! # Version history
//!
//! | Version | Change                                                   |
//! |---------|----------------------------------------------------------|
//! | 0       | unversioned; may lack `rowModules` and `stats`           |
//! | 1       | `rowModules` and `stats` always present                  |
//! | 2       | bonuses store a realized `value` instead of `{type, roll}` |

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::balance::Balance;
use crate::row_module::{BonusKind, Rarity, RowBonus};
use crate::sim::Timestamp;
use crate::state::{GameState, SAVE_VERSION};
use crate::validation::{ValidationError, validate};

/// Errors that can occur while turning a save blob into a [`GameState`].
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("save is not a JSON object")]
    NotAnObject,
    #[error("save version {found} is newer than supported version {supported}")]
    FutureVersion { found: u32, supported: u32 },
    #[error("no migration path from version {from} to version {to}")]
    NoMigrationPath { from: u32, to: u32 },
    #[error("migration from version {from} to version {to} failed: {reason}")]
    MigrationFailed { from: u32, to: u32, reason: String },
    #[error("save could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("save is inconsistent: {0}")]
    Invalid(#[from] ValidationError),
}

/// A step that transforms a save object from one version to the next.
pub type MigrationFn = fn(Value) -> Result<Value, MigrationError>;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Migration steps keyed by source version. Each registered step migrates
/// `N` to `N + 1`; the registry chains them.
pub struct MigrationRegistry {
    migrations: BTreeMap<u32, MigrationFn>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self {
            migrations: BTreeMap::new(),
        }
    }

    /// Registry with every step needed to reach [`SAVE_VERSION`].
    pub fn standard() -> Self {
        let mut reg = Self::new();
        reg.register(0, backfill_collections);
        reg.register(1, realize_bonus_values);
        reg
    }

    /// Register a migration from `from_version` to `from_version + 1`.
    pub fn register(&mut self, from_version: u32, migrate: MigrationFn) {
        self.migrations.insert(from_version, migrate);
    }

    /// Whether a complete path exists from `from` to `to`.
    pub fn can_migrate(&self, from: u32, to: u32) -> bool {
        if from >= to {
            return from == to;
        }
        (from..to).all(|v| self.migrations.contains_key(&v))
    }

    /// Run every step from `from` up to `to`. Returns `data` unchanged when
    /// the versions match.
    pub fn migrate(&self, data: Value, from: u32, to: u32) -> Result<Value, MigrationError> {
        if from == to {
            return Ok(data);
        }
        if from > to {
            return Err(MigrationError::NoMigrationPath { from, to });
        }

        let mut current = data;
        for version in from..to {
            let step = self
                .migrations
                .get(&version)
                .ok_or(MigrationError::NoMigrationPath { from, to })?;
            current = step(current)?;
        }
        Ok(current)
    }

    pub fn step_count(&self) -> usize {
        self.migrations.len()
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// The save version recorded in `raw`. Missing or non-integer means legacy.
pub fn detect_version(raw: &Value) -> u32 {
    raw.get("saveVersion")
        .and_then(Value::as_u64)
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Turn any supported save object into a validated current-schema state.
///
/// `now` and `balance` supply the initial-state defaults that replace
/// missing or mistyped fields.
pub fn migrate_save(
    raw: Value,
    now: Timestamp,
    balance: &Balance,
) -> Result<GameState, MigrationError> {
    if !raw.is_object() {
        return Err(MigrationError::NotAnObject);
    }
    let version = detect_version(&raw);
    if version > SAVE_VERSION {
        return Err(MigrationError::FutureVersion {
            found: version,
            supported: SAVE_VERSION,
        });
    }

    let migrated = MigrationRegistry::standard().migrate(raw, version, SAVE_VERSION)?;
    let normalized = normalize(migrated, now, balance)?;
    let state: GameState = serde_json::from_value(normalized)?;
    validate(&state)?;
    Ok(state)
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

fn object_mut(data: &mut Value, from: u32) -> Result<&mut Map<String, Value>, MigrationError> {
    data.as_object_mut()
        .ok_or_else(|| MigrationError::MigrationFailed {
            from,
            to: from + 1,
            reason: "save is not an object".into(),
        })
}

/// v0 -> v1: guarantee `rowModules` and `stats` exist.
fn backfill_collections(mut data: Value) -> Result<Value, MigrationError> {
    let obj = object_mut(&mut data, 0)?;
    if !obj.get("rowModules").is_some_and(Value::is_array) {
        obj.insert("rowModules".into(), Value::Array(Vec::new()));
    }
    if !obj.get("stats").is_some_and(Value::is_object) {
        obj.insert("stats".into(), Value::Object(Map::new()));
    }
    obj.insert("saveVersion".into(), Value::from(1));
    Ok(data)
}

/// v1 -> v2: convert `{type, roll}` bonuses to `{kind, value, locked}`.
fn realize_bonus_values(mut data: Value) -> Result<Value, MigrationError> {
    let obj = object_mut(&mut data, 1)?;
    if let Some(modules) = obj.get_mut("rowModules").and_then(Value::as_array_mut) {
        normalize_modules(modules);
    }
    obj.insert("saveVersion".into(), Value::from(2));
    Ok(data)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn parse_kind(v: Option<&Value>) -> Option<BonusKind> {
    v.filter(|v| v.is_string())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Coerce one bonus into the current shape.
///
/// - `kind` present: keep it; `value` defaults to 0 and `locked` to false.
/// - legacy `type` present: scale `roll` into the kind's range at `rarity`.
/// - neither: a zero-valued production bonus.
pub fn normalize_bonus(bonus: &Value, rarity: Rarity) -> RowBonus {
    if let Some(kind) = parse_kind(bonus.get("kind")) {
        return RowBonus {
            kind,
            value: bonus.get("value").and_then(Value::as_f64).unwrap_or(0.0),
            locked: bonus.get("locked").and_then(Value::as_bool).unwrap_or(false),
        };
    }
    if let Some(kind) = parse_kind(bonus.get("type")) {
        let roll = bonus.get("roll").and_then(Value::as_f64).unwrap_or(0.0);
        return RowBonus::from_roll(kind, rarity, roll);
    }
    RowBonus {
        kind: BonusKind::ProductionPercent,
        value: 0.0,
        locked: false,
    }
}

fn normalize_modules(modules: &mut [Value]) {
    for module in modules.iter_mut() {
        let Some(rarity) = module
            .get("rarity")
            .and_then(|r| serde_json::from_value::<Rarity>(r.clone()).ok())
        else {
            // Left for the decoder to reject.
            continue;
        };
        let Some(bonuses) = module.get_mut("bonuses").and_then(Value::as_array_mut) else {
            continue;
        };
        for bonus in bonuses.iter_mut() {
            let normalized = normalize_bonus(bonus, rarity);
            if let Ok(v) = serde_json::to_value(normalized) {
                *bonus = v;
            }
        }
    }
}

/// Replace mistyped top-level fields with initial-state values, merge
/// `stats` over the defaults and stamp the current version.
fn normalize(data: Value, now: Timestamp, balance: &Balance) -> Result<Value, MigrationError> {
    let Value::Object(mut obj) = data else {
        return Err(MigrationError::NotAnObject);
    };
    let Value::Object(mut base) = serde_json::to_value(GameState::new(now, balance))? else {
        return Err(MigrationError::NotAnObject);
    };

    let checks: [(&str, fn(&Value) -> bool); 7] = [
        ("currency", |v| v.as_f64().is_some_and(f64::is_finite)),
        ("machines", Value::is_array),
        ("rowModules", Value::is_array),
        ("activeDisaster", |v| v.is_object() || v.is_null()),
        ("selectedMachineId", |v| v.is_string() || v.is_null()),
        ("lastTickTime", |v| v.as_u64().is_some()),
        ("totalPlayTime", |v| v.as_f64().is_some()),
    ];
    for (key, is_well_typed) in checks {
        if !obj.get(key).is_some_and(is_well_typed)
            && let Some(default) = base.remove(key)
        {
            obj.insert(key.into(), default);
        }
    }

    let mut stats = match base.remove("stats") {
        Some(Value::Object(s)) => s,
        _ => Map::new(),
    };
    if let Some(Value::Object(saved)) = obj.get("stats") {
        for (key, value) in saved {
            if stats.contains_key(key) && value.is_number() {
                stats.insert(key.clone(), value.clone());
            }
        }
    }
    obj.insert("stats".into(), Value::Object(stats));
    obj.insert("saveVersion".into(), Value::from(SAVE_VERSION));

    if let Some(modules) = obj.get_mut("rowModules").and_then(Value::as_array_mut) {
        normalize_modules(modules);
    }
    Ok(Value::Object(obj))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;

    fn now() -> Timestamp {
        TEST_NOW
    }

    fn migrate(raw: Value) -> Result<GameState, MigrationError> {
        migrate_save(raw, now(), &Balance::default())
    }

    fn failing_step(_data: Value) -> Result<Value, MigrationError> {
        Err(MigrationError::MigrationFailed {
            from: 0,
            to: 1,
            reason: "test failure".into(),
        })
    }

    fn tag_step(mut data: Value) -> Result<Value, MigrationError> {
        data["tagged"] = Value::Bool(true);
        Ok(data)
    }

    // -----------------------------------------------------------------------
    // Test 1: registry chaining
    // -----------------------------------------------------------------------
    #[test]
    fn registry_chains_and_detects_gaps() {
        let mut reg = MigrationRegistry::new();
        assert_eq!(reg.step_count(), 0);
        assert!(reg.can_migrate(3, 3));
        reg.register(0, tag_step);
        reg.register(2, tag_step);
        assert!(reg.can_migrate(0, 1));
        assert!(!reg.can_migrate(0, 3));
        assert!(!reg.can_migrate(2, 1));

        let out = reg.migrate(json!({}), 0, 1).unwrap();
        assert_eq!(out["tagged"], true);
        assert!(matches!(
            reg.migrate(json!({}), 0, 3),
            Err(MigrationError::NoMigrationPath { from: 0, to: 3 })
        ));
    }

    // -----------------------------------------------------------------------
    // Test 2: failing step propagates
    // -----------------------------------------------------------------------
    #[test]
    fn failing_step_propagates() {
        let mut reg = MigrationRegistry::new();
        reg.register(0, failing_step);
        assert!(matches!(
            reg.migrate(json!({}), 0, 1),
            Err(MigrationError::MigrationFailed { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Test 3: standard registry covers every version
    // -----------------------------------------------------------------------
    #[test]
    fn standard_registry_reaches_current() {
        assert!(MigrationRegistry::standard().can_migrate(0, SAVE_VERSION));
    }

    // -----------------------------------------------------------------------
    // Test 4: bonus shapes
    // -----------------------------------------------------------------------
    #[test]
    fn legacy_roll_scales_into_range() {
        let b = normalize_bonus(&json!({"type": "productionPercent", "roll": 0.5}), Rarity::Rare);
        assert_eq!(b.kind, BonusKind::ProductionPercent);
        assert!((b.value - 27.5).abs() < 1e-12);
        assert!(!b.locked);
    }

    #[test]
    fn current_shape_fills_missing_fields() {
        let b = normalize_bonus(&json!({"kind": "automationSpeed"}), Rarity::Common);
        assert_eq!(b.kind, BonusKind::AutomationSpeed);
        assert_eq!(b.value, 0.0);
        assert!(!b.locked);

        let b = normalize_bonus(
            &json!({"kind": "automationSpeed", "value": 7.5, "locked": true}),
            Rarity::Common,
        );
        assert_eq!(b.value, 7.5);
        assert!(b.locked);
    }

    #[test]
    fn unrecognizable_bonus_defaults() {
        for raw in [json!({}), json!({"kind": 3}), json!({"type": "nonsense"}), json!(null)] {
            let b = normalize_bonus(&raw, Rarity::Epic);
            assert_eq!(b.kind, BonusKind::ProductionPercent);
            assert_eq!(b.value, 0.0);
        }
    }

    // -----------------------------------------------------------------------
    // Test 5: full legacy save
    // -----------------------------------------------------------------------
    #[test]
    fn unversioned_save_is_backfilled() {
        let raw = json!({
            "currency": 120,
            "machines": [{"id": "m1", "level": 2, "slotIndex": 0, "disabled": false}],
            "activeDisaster": null,
            "selectedMachineId": null,
            "lastTickTime": 1000,
            "totalPlayTime": 5000
        });
        let s = migrate(raw).unwrap();
        assert_eq!(s.currency, 120.0);
        assert_eq!(s.machines.len(), 1);
        assert!(s.row_modules.is_empty());
        assert_eq!(s.stats.lifetime_merges, 0);
        assert_eq!(s.save_version, SAVE_VERSION);
        assert_eq!(s.last_tick_time, 1000);
    }

    #[test]
    fn version_one_bonuses_are_converted() {
        let raw = json!({
            "currency": 0,
            "machines": [],
            "activeDisaster": null,
            "selectedMachineId": null,
            "lastTickTime": 1,
            "totalPlayTime": 0,
            "rowModules": [{
                "rowIndex": 1,
                "rarity": "uncommon",
                "bonuses": [
                    {"type": "disasterDurationReduction", "roll": 1.0},
                    {"garbage": true}
                ]
            }],
            "stats": {"lifetimeMerges": 4},
            "saveVersion": 1
        });
        let s = migrate(raw).unwrap();
        let m = s.module_for_row(1).unwrap();
        assert_eq!(m.bonuses[0].kind, BonusKind::DisasterDurationReduction);
        assert_eq!(m.bonuses[0].value, 20.0);
        assert_eq!(m.bonuses[1].kind, BonusKind::ProductionPercent);
        assert_eq!(s.stats.lifetime_merges, 4);
    }

    // -----------------------------------------------------------------------
    // Test 6: mistyped fields fall back to defaults
    // -----------------------------------------------------------------------
    #[test]
    fn mistyped_fields_use_defaults() {
        let raw = json!({
            "currency": "lots",
            "machines": {"not": "a list"},
            "selectedMachineId": 12,
            "lastTickTime": "yesterday",
            "totalPlayTime": null,
            "stats": {"lifetimeMerges": "many", "highestMachineLevel": 6, "bogus": 1},
            "saveVersion": 2
        });
        let s = migrate(raw).unwrap();
        assert_eq!(s.currency, 50.0);
        assert!(s.machines.is_empty());
        assert!(s.selected_machine_id.is_none());
        assert_eq!(s.last_tick_time, now());
        assert_eq!(s.total_play_time, 0.0);
        assert_eq!(s.stats.lifetime_merges, 0);
        assert_eq!(s.stats.highest_machine_level, 6);
    }

    // -----------------------------------------------------------------------
    // Test 7: rejections
    // -----------------------------------------------------------------------
    #[test]
    fn non_object_rejected() {
        assert!(matches!(migrate(json!([1, 2])), Err(MigrationError::NotAnObject)));
        assert!(matches!(migrate(json!("save")), Err(MigrationError::NotAnObject)));
    }

    #[test]
    fn future_version_rejected() {
        assert!(matches!(
            migrate(json!({"saveVersion": 99})),
            Err(MigrationError::FutureVersion { found: 99, .. })
        ));
    }

    #[test]
    fn invariant_violation_rejected() {
        let raw = json!({
            "machines": [
                {"id": "a", "level": 1, "slotIndex": 4},
                {"id": "b", "level": 1, "slotIndex": 4}
            ],
            "saveVersion": 2
        });
        assert!(matches!(
            migrate(raw),
            Err(MigrationError::Invalid(ValidationError::DuplicateSlot(4)))
        ));
    }

    #[test]
    fn undecodable_machine_rejected() {
        let raw = json!({"machines": [{"level": 1}], "saveVersion": 2});
        assert!(matches!(migrate(raw), Err(MigrationError::Decode(_))));
    }

    // -----------------------------------------------------------------------
    // Test 8: current state passes through unchanged
    // -----------------------------------------------------------------------
    #[test]
    fn current_state_is_fixed_point() {
        let s = state_with(
            321.5,
            vec![machine("a", 3, 1), machine("b", 1, 7)],
            vec![module(2, Rarity::Rare, &[
                (BonusKind::ProductionPercent, 22.25),
                (BonusKind::OfflineEarningsPercent, 30.0),
            ])],
        );
        let migrated = migrate(serde_json::to_value(&s).unwrap()).unwrap();
        assert_eq!(migrated, s);
    }
}
