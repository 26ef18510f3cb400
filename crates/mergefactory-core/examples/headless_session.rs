//! Plays a short scripted game with no front-end.
//!
//! Run with `cargo run -p mergefactory-core --example headless_session`.

use mergefactory_core::action::Action;
use mergefactory_core::balance::Balance;
use mergefactory_core::format::{format_currency, format_duration, format_rate};
use mergefactory_core::id::MachineId;
use mergefactory_core::machine::{can_merge, find_empty_slot};
use mergefactory_core::production::production_rate;
use mergefactory_core::session::Session;
use mergefactory_core::sim::now_millis;
use mergefactory_core::storage::MemoryStore;

const FRAME_MS: u64 = 16;

fn main() {
    let mut now = now_millis();
    let mut session = Session::start(MemoryStore::new(), Balance::default(), 7, now);

    // Ten simulated minutes at ~60 fps, buying and merging greedily.
    for _ in 0..(10 * 60 * 1000 / FRAME_MS) {
        now += FRAME_MS;
        let state = session.state();
        if session.balance().can_buy_machine(state.currency)
            && let Some(slot) = find_empty_slot(&state.machines)
        {
            session.submit(Action::BuyMachine { slot_index: slot });
        }
        if let Some((a, b)) = mergeable_pair(&session) {
            session.submit(Action::MergeMachines {
                source_id: a,
                target_id: b,
            });
        }
        let result = session.advance(FRAME_MS as f64, now);
        if let Some(kind) = result.disaster_started {
            println!(
                "[{}] {} hit the factory",
                format_duration(session.state().total_play_time),
                kind.name()
            );
        }
        repair_or_wait(&mut session, now);
    }
    session.stop(now);

    let state = session.state();
    let rate = production_rate(
        &state.machines,
        state.is_power_outage(),
        &state.row_modules,
        session.balance(),
    );
    println!("played {}", format_duration(state.total_play_time));
    println!("currency {}", format_currency(state.currency));
    println!("rate {}", format_rate(rate));
    println!("highest level {}", state.stats.highest_machine_level);
    println!("merges {}", state.stats.lifetime_merges);
}

fn mergeable_pair(session: &Session<MemoryStore>) -> Option<(MachineId, MachineId)> {
    let machines = &session.state().machines;
    machines.iter().enumerate().find_map(|(i, a)| {
        machines[i + 1..]
            .iter()
            .find(|b| can_merge(a, b))
            .map(|b| (a.id.clone(), b.id.clone()))
    })
}

fn repair_or_wait(session: &mut Session<MemoryStore>, now: u64) {
    let burning = session
        .state()
        .machines
        .iter()
        .find(|m| m.disabled)
        .map(|m| (m.id.clone(), m.level));
    if let Some((id, level)) = burning
        && session.state().currency >= session.balance().repair_cost(level)
    {
        session.dispatch(Action::RepairMachine { machine_id: id }, now);
    }
}
