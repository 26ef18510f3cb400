//! Loading a [`Balance`] from a RON, TOML or JSON file.
//!
//! Every key is optional; anything the file omits keeps its default.

use std::path::Path;

use mergefactory_core::balance::Balance;

use crate::loader::{DataLoadError, Format, deserialize_file, deserialize_str, find_data_file};

/// Base name probed by [`load_balance_from_dir`].
pub const BALANCE_FILE: &str = "balance";

/// Read and check a balance file, format detected from its extension.
pub fn load_balance(path: &Path) -> Result<Balance, DataLoadError> {
    let balance: Balance = deserialize_file(path)?;
    check_balance(&balance, path)?;
    log::debug!("loaded balance from {}", path.display());
    Ok(balance)
}

/// Parse balance text that did not come from a file.
pub fn parse_balance(content: &str, format: Format) -> Result<Balance, DataLoadError> {
    let label = Path::new("<inline>");
    let balance: Balance = deserialize_str(content, format, label)?;
    check_balance(&balance, label)?;
    Ok(balance)
}

/// Load `balance.{ron,toml,json}` from `dir`, or the defaults when absent.
pub fn load_balance_from_dir(dir: &Path) -> Result<Balance, DataLoadError> {
    match find_data_file(dir, BALANCE_FILE)? {
        Some(path) => load_balance(&path),
        None => {
            log::info!("no balance file in {}, using defaults", dir.display());
            Ok(Balance::default())
        }
    }
}

/// Reject values that would make the economy or the timers degenerate.
pub fn check_balance(balance: &Balance, file: &Path) -> Result<(), DataLoadError> {
    let invalid = |field: &'static str, detail: String| DataLoadError::Invalid {
        file: file.to_path_buf(),
        field,
        detail,
    };

    let non_negative = [
        ("base_production_per_second", balance.base_production_per_second),
        ("base_machine_cost", balance.base_machine_cost),
        ("scrap_refund_multiplier", balance.scrap_refund_multiplier),
        ("repair_cost_multiplier", balance.repair_cost_multiplier),
        ("min_disaster_duration_ms", balance.min_disaster_duration_ms),
        ("max_offline_hours", balance.max_offline_hours),
        ("starting_currency", balance.starting_currency),
        ("reroll_base_cost", balance.reroll_base_cost),
    ];
    for (field, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(field, format!("{value} must be a finite, non-negative number")));
        }
    }

    for (field, value) in [
        ("production_growth", balance.production_growth),
        ("value_growth", balance.value_growth),
        ("tick_interval_ms", balance.tick_interval_ms),
        ("max_frame_delta_ms", balance.max_frame_delta_ms),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(field, format!("{value} must be positive")));
        }
    }

    for (field, value) in [
        ("disaster_chance", balance.disaster_chance),
        ("max_duration_reduction", balance.max_duration_reduction),
        ("offline_efficiency", balance.offline_efficiency),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid(field, format!("{value} is outside [0, 1]")));
        }
    }

    if balance.power_outage_min_ms > balance.power_outage_max_ms {
        return Err(invalid(
            "power_outage_min_ms",
            format!(
                "{} exceeds power_outage_max_ms {}",
                balance.power_outage_min_ms, balance.power_outage_max_ms
            ),
        ));
    }

    let costs = &balance.row_module_costs;
    if !(costs.common <= costs.uncommon && costs.uncommon <= costs.rare && costs.rare <= costs.epic)
    {
        return Err(invalid(
            "row_module_costs",
            "tier costs must not decrease with rarity".to_string(),
        ));
    }

    Ok(())
}
