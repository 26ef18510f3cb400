//! The session driver: the one actor that owns a [`GameState`].
//!
//! An embedder calls [`Session::advance`] once per frame with the frame's
//! wall-clock delta. Each advance runs, in order:
//!
//! 1. **Intents** -- drain queued player actions in submission order.
//! 2. **Disaster check** -- every `disaster_check_interval_ms` of wall time,
//!    possibly start a disaster.
//! 3. **Production** -- once the clamped frame deltas accumulate past
//!    `tick_interval_ms`, flush the whole accumulator as one `Tick`.
//! 4. **Autosave** -- every `autosave_interval_ms`, persist the snapshot.
//!
//! Storage failures are logged and never interrupt play. After
//! [`Session::stop`] every call is a no-op.

use crate::action::Action;
use crate::balance::Balance;
use crate::command_queue::CommandQueue;
use crate::disaster::{DisasterKind, roll_disaster};
use crate::event::GameEvent;
use crate::production::{OfflineEarnings, offline_earnings};
use crate::reducer::{StepContext, apply};
use crate::rng::SimRng;
use crate::serialize::{ExportError, ImportError, decode_save, export_save, import_save, save_blob};
use crate::sim::{AdvanceResult, Timestamp};
use crate::state::GameState;
use crate::storage::SaveStore;

pub struct Session<S: SaveStore> {
    state: GameState,
    rng: SimRng,
    balance: Balance,
    store: S,
    queue: CommandQueue,
    accumulated_ms: f64,
    last_disaster_check: Timestamp,
    last_autosave: Timestamp,
    pending_offline: Option<OfflineEarnings>,
    events: Vec<GameEvent>,
    stopped: bool,
}

impl<S: SaveStore> Session<S> {
    /// Start a session, loading whatever `store` holds.
    ///
    /// A corrupt or unreadable save falls back to a fresh game. A good save
    /// is loaded and, if the player was away long enough to earn something,
    /// an offline offer is left in [`Session::pending_offline`].
    pub fn start(store: S, balance: Balance, seed: u64, now: Timestamp) -> Self {
        let loaded = match store.load() {
            Ok(Some(blob)) => match decode_save(&blob, now, &balance) {
                Ok(state) => Some(state),
                Err(e) => {
                    log::warn!("discarding unreadable save, starting fresh: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("could not read save, starting fresh: {e}");
                None
            }
        };

        let fresh = GameState::new(now, &balance);
        let mut session = Self::with_state(fresh, store, balance, seed, now);
        if let Some(saved) = loaded {
            let offer =
                offline_earnings(&saved.machines, saved.last_tick_time, now, &session.balance);
            log::info!(
                "loaded save: {} machines, {:.0} currency, {}s away",
                saved.machines.len(),
                saved.currency,
                offer.time_away_ms / 1000
            );
            if offer.worth_reporting(&session.balance) {
                session.pending_offline = Some(offer);
            }
            session.run(
                Action::LoadGame {
                    state: Box::new(saved),
                },
                now,
            );
        } else {
            log::info!("starting a new game");
        }
        session
    }

    /// A session around an existing state, without touching the store.
    pub fn with_state(
        state: GameState,
        store: S,
        balance: Balance,
        seed: u64,
        now: Timestamp,
    ) -> Self {
        Self {
            state,
            rng: SimRng::new(seed),
            balance,
            store,
            queue: CommandQueue::new(),
            accumulated_ms: 0.0,
            last_disaster_check: now,
            last_autosave: now,
            pending_offline: None,
            events: Vec::new(),
            stopped: false,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Milliseconds accumulated toward the next production tick.
    pub fn accumulated_ms(&self) -> f64 {
        self.accumulated_ms
    }

    pub fn pending_actions(&self) -> usize {
        self.queue.pending_count()
    }

    pub fn pending_offline(&self) -> Option<&OfflineEarnings> {
        self.pending_offline.as_ref()
    }

    /// Events produced since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    /// Queue a player intent for the next [`Session::advance`].
    pub fn submit(&mut self, action: Action) {
        if !self.stopped {
            self.queue.push(action);
        }
    }

    /// Apply an action right away, returning its events.
    pub fn dispatch(&mut self, action: Action, now: Timestamp) -> Vec<GameEvent> {
        if self.stopped {
            return Vec::new();
        }
        self.run(action, now)
    }

    /// One frame of the driving loop.
    pub fn advance(&mut self, frame_delta_ms: f64, now: Timestamp) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        if self.stopped {
            return result;
        }

        self.accumulated_ms += frame_delta_ms.clamp(0.0, self.balance.max_frame_delta_ms);

        for action in self.queue.drain() {
            self.run(action, now);
            result.actions_applied += 1;
        }

        if now.saturating_sub(self.last_disaster_check) >= self.balance.disaster_check_interval_ms {
            self.last_disaster_check = now;
            result.disaster_started = self.check_disaster(now);
        }

        if self.accumulated_ms >= self.balance.tick_interval_ms {
            let delta_ms = std::mem::take(&mut self.accumulated_ms);
            self.run(Action::Tick { delta_ms }, now);
            result.ticks_run = 1;
        }

        if now.saturating_sub(self.last_autosave) >= self.balance.autosave_interval_ms {
            self.last_autosave = now;
            self.persist(now);
            result.autosaved = true;
        }

        result
    }

    fn check_disaster(&mut self, now: Timestamp) -> Option<DisasterKind> {
        log::debug!("disaster check at {now}");
        let disaster = roll_disaster(
            self.state.active_disaster.as_ref(),
            &self.state.machines,
            &self.state.row_modules,
            now,
            &mut self.rng,
            &self.balance,
        )?;
        let kind = disaster.kind;
        let events = self.run(Action::StartDisaster { disaster }, now);
        events
            .iter()
            .any(|e| matches!(e, GameEvent::DisasterStarted { .. }))
            .then_some(kind)
    }

    fn run(&mut self, action: Action, now: Timestamp) -> Vec<GameEvent> {
        let mut ctx = StepContext {
            now,
            rng: &mut self.rng,
            balance: &self.balance,
        };
        let transition = apply(&self.state, &action, &mut ctx);
        for event in &transition.events {
            match event {
                GameEvent::DisasterStarted { disaster } => match disaster.target_slot {
                    Some(slot) => log::info!("{} started at slot {slot}", disaster.kind.name()),
                    None => log::info!(
                        "{} started for {:.0}ms",
                        disaster.kind.name(),
                        disaster.duration
                    ),
                },
                GameEvent::DisasterResolved { kind } => log::info!("{} resolved", kind.name()),
                GameEvent::GameReset => log::info!("game reset"),
                _ => {}
            }
        }
        self.state = transition.state;
        self.events.extend(transition.events.iter().cloned());
        transition.events
    }

    // -----------------------------------------------------------------------
    // Offline offer
    // -----------------------------------------------------------------------

    /// Credit the pending offline earnings, if any. Returns the amount.
    pub fn collect_offline(&mut self, now: Timestamp) -> Option<f64> {
        if self.stopped {
            return None;
        }
        let offer = self.pending_offline.take()?;
        self.run(
            Action::CollectOffline {
                earnings: offer.earnings,
            },
            now,
        );
        Some(offer.earnings)
    }

    /// Drop the offer without collecting it.
    pub fn dismiss_offline(&mut self) {
        self.pending_offline = None;
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write the current snapshot, stamped with `now`. Failures are logged.
    pub fn save_now(&mut self, now: Timestamp) -> bool {
        if self.stopped {
            return false;
        }
        self.persist(now)
    }

    fn persist(&mut self, now: Timestamp) -> bool {
        let blob = match save_blob(&self.state, now) {
            Ok(blob) => blob,
            Err(e) => {
                log::warn!("failed to encode save: {e}");
                return false;
            }
        };
        match self.store.save(&blob) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("failed to save game: {e}");
                false
            }
        }
    }

    pub fn export(&self) -> Result<String, ExportError> {
        export_save(&self.state)
    }

    /// Replace the game with player-supplied save text. On error, or once the
    /// session is stopped, the current game is untouched.
    pub fn import(&mut self, text: &str, now: Timestamp) -> Result<(), ImportError> {
        if self.stopped {
            return Err(ImportError::SessionStopped);
        }
        let imported = import_save(text, now, &self.balance)?;
        self.run(
            Action::LoadGame {
                state: Box::new(imported),
            },
            now,
        );
        Ok(())
    }

    /// Delete the persisted save and start over.
    pub fn reset(&mut self, now: Timestamp) {
        if self.stopped {
            return;
        }
        if let Err(e) = self.store.delete() {
            log::warn!("failed to delete save: {e}");
        }
        self.queue.clear();
        self.accumulated_ms = 0.0;
        self.pending_offline = None;
        self.run(Action::ResetGame, now);
    }

    /// End the session: save once more and refuse all further work.
    pub fn stop(&mut self, now: Timestamp) {
        if self.stopped {
            return;
        }
        self.persist(now);
        self.queue.clear();
        self.stopped = true;
    }
}
