//! Headless sessions: the frame loop, disaster cadence, autosave and
//! balance loaded from the shipped data files.

use std::path::PathBuf;

use mergefactory_core::action::Action;
use mergefactory_core::balance::Balance;
use mergefactory_core::disaster::DisasterKind;
use mergefactory_core::event::GameEvent;
use mergefactory_core::machine::find_empty_slot;
use mergefactory_core::session::Session;
use mergefactory_core::storage::MemoryStore;
use mergefactory_core::test_utils::*;
use mergefactory_core::validation::validate;
use mergefactory_data::{load_balance, load_balance_from_dir};

const FRAME_MS: u64 = 16;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../mergefactory-data/data")
}

/// Run `frames` frames, buying into the first empty slot whenever
/// affordable. Returns the clock after the last frame.
fn play(session: &mut Session<MemoryStore>, start: u64, frames: u64) -> u64 {
    let mut now = start;
    for _ in 0..frames {
        now += FRAME_MS;
        let state = session.state();
        if session.balance().can_buy_machine(state.currency)
            && let Some(slot) = find_empty_slot(&state.machines)
        {
            session.submit(Action::BuyMachine { slot_index: slot });
        }
        session.advance(FRAME_MS as f64, now);
    }
    now
}

// ===========================================================================
// Test 1: Balance data files
// ===========================================================================

#[test]
fn shipped_balance_matches_defaults() {
    let balance = load_balance(&data_dir().join("balance.ron")).unwrap();
    assert_eq!(balance, Balance::default());
    assert_eq!(load_balance_from_dir(&data_dir()).unwrap(), Balance::default());
}

#[test]
fn presets_override_only_what_they_list() {
    let hard = load_balance(&data_dir().join("presets/hardcore.toml")).unwrap();
    assert_eq!(hard.disaster_chance, 0.35);
    assert_eq!(hard.row_module_costs.epic, 15_000.0);
    assert_eq!(hard.base_machine_cost, 10.0);

    let sandbox = load_balance(&data_dir().join("presets/sandbox.json")).unwrap();
    assert_eq!(sandbox.starting_currency, 1_000_000.0);
    assert_eq!(sandbox.disaster_chance, 0.0);
    assert_eq!(sandbox.production_growth, 2.5);
}

#[test]
fn sandbox_session_never_sees_a_disaster() {
    let sandbox = load_balance(&data_dir().join("presets/sandbox.json")).unwrap();
    let mut session = Session::start(MemoryStore::new(), sandbox, TEST_SEED, TEST_NOW);
    // Five minutes of play.
    play(&mut session, TEST_NOW, 5 * 60 * 1000 / FRAME_MS);
    let events = session.take_events();
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, GameEvent::DisasterStarted { .. }))
    );
    assert_eq!(session.state().machines.len(), 9);
}

// ===========================================================================
// Test 2: Frame loop
// ===========================================================================

#[test]
fn long_run_keeps_invariants() {
    let mut session = Session::start(MemoryStore::new(), Balance::default(), 99, TEST_NOW);
    let end = play(&mut session, TEST_NOW, 20 * 60 * 1000 / FRAME_MS);
    assert_eq!(validate(session.state()), Ok(()));
    assert!(session.state().stats.lifetime_currency_earned > 0.0);
    // Play time trails wall time by at most one unflushed tick.
    let wall = (end - TEST_NOW) as f64;
    let played = session.state().total_play_time + session.accumulated_ms();
    assert!((wall - played).abs() < 1e-6);
}

#[test]
fn same_seed_same_game() {
    let run = |seed| {
        let balance = Balance {
            disaster_chance: 0.5,
            ..Balance::default()
        };
        let mut session = Session::start(MemoryStore::new(), balance, seed, TEST_NOW);
        play(&mut session, TEST_NOW, 3 * 60 * 1000 / FRAME_MS);
        session.state().state_hash()
    };
    assert_eq!(run(7), run(7));
}

#[test]
fn outages_come_and_go_on_their_own() {
    let balance = Balance {
        disaster_chance: 1.0,
        ..Balance::default()
    };
    let mut session = Session::with_state(
        state_with_machines(vec![machine("a", 1, 0)]),
        MemoryStore::new(),
        balance,
        TEST_SEED,
        TEST_NOW,
    );
    let mut now = TEST_NOW;
    let mut outages = 0;
    let mut resolved = 0;
    // Ten minutes without ever repairing: fires stick, outages expire.
    for _ in 0..(10 * 60 * 1000 / FRAME_MS) {
        now += FRAME_MS;
        let started = session.advance(FRAME_MS as f64, now).disaster_started;
        if started == Some(DisasterKind::PowerOutage) {
            outages += 1;
        }
        resolved += session
            .take_events()
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    GameEvent::DisasterResolved {
                        kind: DisasterKind::PowerOutage
                    }
                )
            })
            .count();
    }
    let still_active = usize::from(
        session
            .state()
            .active_disaster
            .as_ref()
            .is_some_and(|d| d.is_power_outage()),
    );
    assert_eq!(outages, resolved + still_active);
}

// ===========================================================================
// Test 3: Autosave
// ===========================================================================

#[test]
fn autosaves_every_ten_seconds() {
    let mut session = Session::start(MemoryStore::new(), Balance::default(), TEST_SEED, TEST_NOW);
    let mut now = TEST_NOW;
    for _ in 0..(60_000 / FRAME_MS) {
        now += FRAME_MS;
        session.advance(FRAME_MS as f64, now);
    }
    assert_eq!(now, TEST_NOW + 60_000);
    assert_eq!(session.store().writes(), 6);
    session.stop(now);
    assert_eq!(session.store().writes(), 7);
}

#[test]
fn reset_clears_store_and_queue() {
    let mut session = Session::start(MemoryStore::new(), Balance::default(), TEST_SEED, TEST_NOW);
    session.dispatch(Action::BuyMachine { slot_index: 0 }, TEST_NOW);
    session.save_now(TEST_NOW);
    session.submit(Action::BuyMachine { slot_index: 1 });
    session.reset(TEST_NOW + 10);
    assert_eq!(session.pending_actions(), 0);
    assert!(session.store().blob().is_none());
    assert!(session.state().machines.is_empty());
    assert_eq!(session.state().currency, 50.0);
}
