//! Main application state and logic

use crate::config::Config;
use crate::input::{Token, TokenEvent};
use crate::store::{CounterStore, RoleMap};
use crate::trigger::{BackgroundState, Role, TriggerEngine};
use crate::utils::format_elapsed;
use log::{info, warn};
use std::collections::HashSet;
use std::sync::mpsc::Receiver;
use std::time::Instant;

/// Application running state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Quitting,
}

impl AppState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Quitting => "QUITTING",
        }
    }
}

/// Main application
pub struct App {
    /// Application state
    pub state: AppState,
    /// Configuration
    pub config: Config,
    /// Trigger counting
    engine: TriggerEngine,
    /// Where counts are persisted
    store: CounterStore,
    /// What the panel background shows
    background: BackgroundState,
    /// Application start time
    pub start_time: Instant,
    /// Total events processed
    pub total_events: u64,
    /// Last status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
}

impl App {
    /// Load the counter state from `store` and build the engine around it
    pub fn new(config: Config, store: CounterStore) -> Self {
        let state = store.load(&config.counter_defaults());
        info!(
            "loaded counters from {}: {} = {}, {} = {}",
            store.path().display(),
            state.keys[0],
            state.counts.key1,
            state.keys[1],
            state.counts.key2
        );

        Self {
            state: AppState::Running,
            config,
            engine: TriggerEngine::new(state),
            store,
            background: BackgroundState::Idle,
            start_time: Instant::now(),
            total_events: 0,
            status_message: None,
            status_time: None,
        }
    }

    /// Feed one aggregated input event through the trigger engine
    pub fn process_event(&mut self, event: &TokenEvent) {
        if self.state != AppState::Running {
            return;
        }
        self.apply_event(event);
    }

    /// Process whatever the input thread queued before it stopped.
    ///
    /// Runs even after `quit`, so presses observed just before exit are
    /// still counted by the final save. Returns the number of events taken.
    pub fn drain_pending(&mut self, rx: &Receiver<TokenEvent>) -> usize {
        let mut drained = 0;
        while let Ok(event) = rx.try_recv() {
            self.apply_event(&event);
            drained += 1;
        }
        drained
    }

    fn apply_event(&mut self, event: &TokenEvent) {
        self.total_events += 1;
        let reaction = self.engine.process_event(event);

        if let Some(background) = reaction.background {
            self.set_background_state(background);
        }

        if reaction.fired() {
            for role in &reaction.fired {
                info!(
                    "{} ({}) -> {}",
                    role,
                    self.engine.combo(*role),
                    self.engine.count(*role)
                );
            }
            self.persist();
        }
    }

    /// Write the counter state, reporting failures on the status bar
    pub fn persist(&mut self) -> bool {
        match self.store.save(self.engine.state()) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to save counters to {}: {}", self.store.path().display(), e);
                self.set_status(format!("Save failed: {}", e));
                false
            }
        }
    }

    pub fn set_background_state(&mut self, background: BackgroundState) {
        self.background = background;
    }

    pub fn background(&self) -> BackgroundState {
        self.background
    }

    pub fn counts(&self) -> RoleMap<u64> {
        self.engine.state().counts
    }

    pub fn delays(&self) -> RoleMap<f64> {
        self.engine.state().delay
    }

    /// Trigger specs as stored, in role order
    pub fn keys(&self) -> [&str; 2] {
        Role::ALL.map(|role| self.engine.state().key(role))
    }

    /// Tokens the input aggregator has to report
    pub fn watch_set(&self) -> HashSet<Token> {
        self.engine.watch_set()
    }

    pub fn engine(&self) -> &TriggerEngine {
        &self.engine
    }

    pub fn store(&self) -> &CounterStore {
        &self.store
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.state = AppState::Quitting;
    }

    /// Final save before exit
    pub fn shutdown(&mut self) {
        self.quit();
        if self.persist() {
            info!("counters saved to {}", self.store.path().display());
        }
    }

    /// Set a status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_time = Some(Instant::now());
    }

    /// Get status message if still valid (within 3 seconds)
    pub fn get_status(&self) -> Option<&str> {
        match (&self.status_message, self.status_time) {
            (Some(msg), Some(time)) if time.elapsed().as_secs() < 3 => Some(msg),
            _ => None,
        }
    }

    /// Get elapsed time formatted
    pub fn elapsed_formatted(&self) -> String {
        format_elapsed(self.start_time.elapsed())
    }

    /// One-line summary printed after the terminal is restored
    pub fn summary(&self) -> String {
        let [key1, key2] = self.keys();
        let counts = self.counts();
        format!(
            "{}: {}  {}: {}  ({} events in {})",
            key1,
            counts.key1,
            key2,
            counts.key2,
            self.total_events,
            self.elapsed_formatted()
        )
    }
}
