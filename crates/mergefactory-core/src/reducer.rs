//! The game state machine.
//!
//! [`apply`] is the only place a [`GameState`] changes. Each call computes a
//! complete successor from a clone of the input; a rejected action returns
//! the input unchanged plus a [`GameEvent::Rejected`] reason. Nothing is ever
//! partially applied.
//!
//! Randomness (machine ids, bonus rolls) and the wall clock come in through
//! [`StepContext`], so the same state, action, seed and timestamp always
//! yield the same result.

use crate::action::Action;
use crate::balance::Balance;
use crate::disaster::{Disaster, DisasterKind};
use crate::event::{GameEvent, Rejection, Transition};
use crate::id::{MachineId, is_valid_row, is_valid_slot};
use crate::machine::{Machine, merged_level};
use crate::production::earnings;
use crate::rng::SimRng;
use crate::row_module::{RowModule, reroll_cost, upgrade_cost};
use crate::sim::Timestamp;
use crate::state::GameState;

/// Per-call inputs that are not part of the aggregate.
pub struct StepContext<'a> {
    pub now: Timestamp,
    pub rng: &'a mut SimRng,
    pub balance: &'a Balance,
}

type Step = Result<(GameState, Vec<GameEvent>), Rejection>;

/// Apply one action, returning the successor state and its events.
pub fn apply(state: &GameState, action: &Action, ctx: &mut StepContext<'_>) -> Transition {
    let result = match action {
        Action::Tick { delta_ms } => tick(state, *delta_ms, ctx),
        Action::BuyMachine { slot_index } => buy_machine(state, *slot_index, ctx),
        Action::SelectMachine { machine_id } => Ok(select_machine(state, machine_id.clone())),
        Action::MergeMachines {
            source_id,
            target_id,
        } => merge_machines(state, source_id, target_id, ctx),
        Action::MoveMachine {
            machine_id,
            target_slot,
        } => move_machine(state, machine_id, *target_slot),
        Action::ScrapMachine { machine_id } => scrap_machine(state, machine_id, ctx.balance),
        Action::RepairMachine { machine_id } => repair_machine(state, machine_id, ctx.balance),
        Action::StartDisaster { disaster } => start_disaster(state, disaster),
        Action::EndDisaster => Ok(end_disaster(state)),
        Action::CollectOffline { earnings } => Ok(collect_offline(state, *earnings)),
        Action::UpgradeRow { row_index } => upgrade_row(state, *row_index, ctx),
        Action::RerollBonus {
            row_index,
            bonus_index,
        } => reroll_bonus(state, *row_index, *bonus_index, ctx),
        Action::RerollRow { row_index } => reroll_row(state, *row_index, ctx),
        Action::ToggleBonusLock {
            row_index,
            bonus_index,
        } => toggle_bonus_lock(state, *row_index, *bonus_index),
        Action::LoadGame { state: loaded } => Ok(load_game(loaded, ctx.now)),
        Action::ResetGame => Ok((
            GameState::new(ctx.now, ctx.balance),
            vec![GameEvent::GameReset],
        )),
    };

    match result {
        Ok((state, events)) => Transition { state, events },
        Err(rejection) => {
            log::debug!("{} rejected: {rejection}", action.name());
            Transition {
                state: state.clone(),
                events: vec![GameEvent::Rejected(rejection)],
            }
        }
    }
}

/// [`apply`] without the events.
pub fn reduce(state: &GameState, action: &Action, ctx: &mut StepContext<'_>) -> GameState {
    apply(state, action, ctx).state
}

// ---------------------------------------------------------------------------
// Shared checks
// ---------------------------------------------------------------------------

fn ensure_funds(state: &GameState, cost: f64) -> Result<(), Rejection> {
    if state.currency < cost {
        return Err(Rejection::InsufficientFunds {
            needed: cost,
            available: state.currency,
        });
    }
    Ok(())
}

fn find_machine<'s>(state: &'s GameState, id: &MachineId) -> Result<&'s Machine, Rejection> {
    state
        .machine(id)
        .ok_or_else(|| Rejection::UnknownMachine { id: id.clone() })
}

fn find_module(state: &GameState, row: u8) -> Result<&RowModule, Rejection> {
    if !is_valid_row(row) {
        return Err(Rejection::InvalidRow { row });
    }
    state
        .module_for_row(row)
        .ok_or(Rejection::NoRowModule { row })
}

fn check_bonus_index(module: &RowModule, index: usize) -> Result<(), Rejection> {
    if index >= module.bonuses.len() {
        return Err(Rejection::BonusIndexOutOfRange {
            row: module.row_index,
            index,
        });
    }
    Ok(())
}

/// Insert or replace the module for its row, keeping rows ordered.
fn put_module(modules: &mut Vec<RowModule>, module: RowModule) {
    match modules.iter_mut().find(|m| m.row_index == module.row_index) {
        Some(slot) => *slot = module,
        None => {
            modules.push(module);
            modules.sort_by_key(|m| m.row_index);
        }
    }
}

/// Clear the active disaster if it is a fire burning `slot`.
fn extinguish(next: &mut GameState, slot: u8, events: &mut Vec<GameEvent>) {
    if next.active_disaster.as_ref().is_some_and(|d| d.targets(slot)) {
        next.active_disaster = None;
        events.push(GameEvent::DisasterResolved {
            kind: DisasterKind::Fire,
        });
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

fn tick(state: &GameState, delta_ms: f64, ctx: &StepContext<'_>) -> Step {
    let delta_ms = delta_ms.max(0.0);
    let mut next = state.clone();
    let mut events = Vec::new();

    let earned = earnings(
        &state.machines,
        state.is_power_outage(),
        delta_ms,
        &state.row_modules,
        ctx.balance,
    );
    if earned > 0.0 {
        next.currency += earned;
        next.stats.lifetime_currency_earned += earned;
        events.push(GameEvent::Produced { amount: earned });
    }

    if let Some(d) = &state.active_disaster
        && d.is_expired(ctx.now)
    {
        next.active_disaster = None;
        events.push(GameEvent::DisasterResolved { kind: d.kind });
    }

    next.last_tick_time = ctx.now;
    next.total_play_time += delta_ms;
    Ok((next, events))
}

// ---------------------------------------------------------------------------
// Machines
// ---------------------------------------------------------------------------

fn buy_machine(state: &GameState, slot: u8, ctx: &mut StepContext<'_>) -> Step {
    if !is_valid_slot(slot) {
        return Err(Rejection::SlotOutOfRange { slot });
    }
    if state.is_slot_occupied(slot) {
        return Err(Rejection::SlotOccupied { slot });
    }
    let cost = ctx.balance.base_machine_cost;
    ensure_funds(state, cost)?;

    let id = MachineId::generate(ctx.now, ctx.rng);
    let mut next = state.clone();
    next.currency -= cost;
    next.machines.push(Machine::new(id.clone(), 1, slot));
    next.stats.lifetime_machines_bought += 1;
    next.stats.highest_machine_level = next.stats.highest_machine_level.max(1);
    Ok((next, vec![GameEvent::MachineBought { id, slot, cost }]))
}

fn select_machine(state: &GameState, id: Option<MachineId>) -> (GameState, Vec<GameEvent>) {
    let next = GameState {
        selected_machine_id: id.clone(),
        ..state.clone()
    };
    (next, vec![GameEvent::MachineSelected { id }])
}

fn merge_machines(
    state: &GameState,
    source_id: &MachineId,
    target_id: &MachineId,
    ctx: &mut StepContext<'_>,
) -> Step {
    let source = find_machine(state, source_id)?;
    let target = find_machine(state, target_id)?;
    if source.id == target.id {
        return Err(Rejection::SameMachine);
    }
    for m in [source, target] {
        if m.disabled {
            return Err(Rejection::MachineDisabled { id: m.id.clone() });
        }
    }
    if source.level != target.level {
        return Err(Rejection::LevelMismatch {
            source_level: source.level,
            target_level: target.level,
        });
    }

    let level = merged_level(source.level);
    let result = MachineId::generate(ctx.now, ctx.rng);
    let mut next = state.clone();
    next.machines.retain(|m| m.id != *source_id && m.id != *target_id);
    next.machines.push(Machine::new(result.clone(), level, target.slot_index));
    next.selected_machine_id = None;
    next.stats.lifetime_merges += 1;
    next.stats.highest_machine_level = next.stats.highest_machine_level.max(level);
    Ok((
        next,
        vec![GameEvent::MachinesMerged {
            source: source_id.clone(),
            target: target_id.clone(),
            result,
            level,
        }],
    ))
}

fn move_machine(state: &GameState, id: &MachineId, target_slot: u8) -> Step {
    let machine = find_machine(state, id)?;
    if machine.disabled {
        return Err(Rejection::MachineDisabled { id: id.clone() });
    }
    if !is_valid_slot(target_slot) {
        return Err(Rejection::SlotOutOfRange { slot: target_slot });
    }
    if state.is_slot_occupied(target_slot) {
        return Err(Rejection::SlotOccupied { slot: target_slot });
    }

    let from = machine.slot_index;
    let mut next = state.clone();
    for m in next.machines.iter_mut().filter(|m| m.id == *id) {
        m.slot_index = target_slot;
    }
    next.selected_machine_id = None;
    Ok((
        next,
        vec![GameEvent::MachineMoved {
            id: id.clone(),
            from,
            to: target_slot,
        }],
    ))
}

fn scrap_machine(state: &GameState, id: &MachineId, balance: &Balance) -> Step {
    let machine = find_machine(state, id)?;
    let refund = balance.scrap_refund(machine.level);
    let slot = machine.slot_index;

    let mut next = state.clone();
    next.currency += refund;
    next.machines.retain(|m| m.id != *id);
    next.selected_machine_id = None;
    let mut events = vec![GameEvent::MachineScrapped {
        id: id.clone(),
        refund,
    }];
    extinguish(&mut next, slot, &mut events);
    Ok((next, events))
}

fn repair_machine(state: &GameState, id: &MachineId, balance: &Balance) -> Step {
    let machine = find_machine(state, id)?;
    if !machine.disabled {
        return Err(Rejection::MachineNotDisabled { id: id.clone() });
    }
    let cost = balance.repair_cost(machine.level);
    ensure_funds(state, cost)?;
    let slot = machine.slot_index;

    let mut next = state.clone();
    next.currency -= cost;
    for m in next.machines.iter_mut().filter(|m| m.id == *id) {
        m.disabled = false;
    }
    let mut events = vec![GameEvent::MachineRepaired {
        id: id.clone(),
        cost,
    }];
    extinguish(&mut next, slot, &mut events);
    Ok((next, events))
}

// ---------------------------------------------------------------------------
// Disasters
// ---------------------------------------------------------------------------

fn start_disaster(state: &GameState, disaster: &Disaster) -> Step {
    if state.active_disaster.is_some() {
        return Err(Rejection::DisasterActive);
    }
    let mut next = state.clone();
    if disaster.kind == DisasterKind::Fire {
        let slot = disaster
            .target_slot
            .filter(|s| state.is_slot_occupied(*s))
            .ok_or(Rejection::NoFireTarget {
                slot: disaster.target_slot,
            })?;
        for m in next.machines.iter_mut().filter(|m| m.slot_index == slot) {
            m.disabled = true;
        }
    }
    next.active_disaster = Some(disaster.clone());
    Ok((
        next,
        vec![GameEvent::DisasterStarted {
            disaster: disaster.clone(),
        }],
    ))
}

fn end_disaster(state: &GameState) -> (GameState, Vec<GameEvent>) {
    let events = state
        .active_disaster
        .iter()
        .map(|d| GameEvent::DisasterResolved { kind: d.kind })
        .collect();
    let next = GameState {
        active_disaster: None,
        ..state.clone()
    };
    (next, events)
}

fn collect_offline(state: &GameState, amount: f64) -> (GameState, Vec<GameEvent>) {
    let mut next = state.clone();
    next.currency += amount;
    next.stats.lifetime_currency_earned += amount;
    (next, vec![GameEvent::OfflineCollected { amount }])
}

// ---------------------------------------------------------------------------
// Row modules
// ---------------------------------------------------------------------------

fn upgrade_row(state: &GameState, row: u8, ctx: &mut StepContext<'_>) -> Step {
    if !is_valid_row(row) {
        return Err(Rejection::InvalidRow { row });
    }
    let current = state.module_for_row(row);
    let cost = upgrade_cost(current, ctx.balance).ok_or(Rejection::MaxRarity { row })?;
    ensure_funds(state, cost)?;

    let module = match current {
        None => RowModule::new(row, ctx.rng),
        Some(m) => m.upgraded(ctx.rng).ok_or(Rejection::MaxRarity { row })?,
    };
    let rarity = module.rarity;
    let mut next = state.clone();
    next.currency -= cost;
    put_module(&mut next.row_modules, module);
    Ok((next, vec![GameEvent::RowUpgraded { row, rarity, cost }]))
}

fn reroll_bonus(state: &GameState, row: u8, index: usize, ctx: &mut StepContext<'_>) -> Step {
    let module = find_module(state, row)?;
    check_bonus_index(module, index)?;
    let cost = reroll_cost(row, ctx.balance);
    ensure_funds(state, cost)?;

    // A locked bonus is left as is; the cost is still charged.
    let rerolled = module.with_rerolled_bonus(index, ctx.rng);
    let mut next = state.clone();
    next.currency -= cost;
    put_module(&mut next.row_modules, rerolled);
    Ok((next, vec![GameEvent::BonusRerolled { row, index, cost }]))
}

fn reroll_row(state: &GameState, row: u8, ctx: &mut StepContext<'_>) -> Step {
    let module = find_module(state, row)?;
    let cost = reroll_cost(row, ctx.balance);
    ensure_funds(state, cost)?;

    let rerolled = module.with_unlocked_rerolled(ctx.rng);
    let mut next = state.clone();
    next.currency -= cost;
    put_module(&mut next.row_modules, rerolled);
    Ok((next, vec![GameEvent::RowRerolled { row, cost }]))
}

fn toggle_bonus_lock(state: &GameState, row: u8, index: usize) -> Step {
    let module = find_module(state, row)?;
    check_bonus_index(module, index)?;

    let toggled = module.with_lock_toggled(index);
    let locked = toggled.bonuses[index].locked;
    let mut next = state.clone();
    put_module(&mut next.row_modules, toggled);
    Ok((
        next,
        vec![GameEvent::BonusLockToggled { row, index, locked }],
    ))
}

// ---------------------------------------------------------------------------
// Whole-state replacement
// ---------------------------------------------------------------------------

fn load_game(loaded: &GameState, now: Timestamp) -> (GameState, Vec<GameEvent>) {
    let next = GameState {
        last_tick_time: now,
        ..loaded.clone()
    };
    (next, vec![GameEvent::GameLoaded])
}

// ===========================================================================
// Tests
// ===========================================================================
