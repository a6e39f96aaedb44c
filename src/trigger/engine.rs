//! Held-set tracking, latching and cooldown for the two trigger roles

use super::{BackgroundState, Role};
use crate::input::{Combo, InputEventType, Token, TokenEvent};
use crate::store::CounterState;
use crate::utils::secs_to_duration;
use log::debug;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Outcome of feeding one event to the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reaction {
    /// Roles whose count went up, in evaluation order
    pub fired: Vec<Role>,
    /// New background, if the event changed it
    pub background: Option<BackgroundState>,
}

impl Reaction {
    pub fn fired(&self) -> bool {
        !self.fired.is_empty()
    }
}

#[derive(Debug, Clone)]
struct RoleState {
    combo: Combo,
    cooldown: Duration,
    latched: bool,
    /// `None` until the first accepted trigger
    last_accept: Option<Instant>,
}

impl RoleState {
    fn cooled_down(&self, now: Instant) -> bool {
        match self.last_accept {
            Some(last) => now.saturating_duration_since(last) >= self.cooldown,
            None => true,
        }
    }
}

/// Counts trigger combos once per hold, at most once per cooldown window
#[derive(Debug, Clone)]
pub struct TriggerEngine {
    state: CounterState,
    roles: [RoleState; 2],
    held: HashSet<Token>,
}

impl TriggerEngine {
    /// Build an engine from a validated counter state
    pub fn new(state: CounterState) -> Self {
        let roles = Role::ALL.map(|role| RoleState {
            combo: Combo::parse(state.key(role)),
            cooldown: secs_to_duration(*state.delay.get(role)),
            latched: false,
            last_accept: None,
        });
        Self {
            state,
            roles,
            held: HashSet::new(),
        }
    }

    pub fn process_event(&mut self, event: &TokenEvent) -> Reaction {
        match event.event_type {
            InputEventType::Press => self.on_press(event.token.clone(), event.timestamp),
            InputEventType::Release => self.on_release(&event.token),
        }
    }

    /// Mark `token` held and fire every role it completes
    pub fn on_press(&mut self, token: Token, now: Instant) -> Reaction {
        self.held.insert(token);
        let mut reaction = Reaction::default();

        for role in Role::ALL {
            let slot = &mut self.roles[role.index()];
            if slot.latched || !slot.combo.is_satisfied_by(&self.held) {
                continue;
            }

            // Latch even when the cooldown rejects the hit
            slot.latched = true;
            if !slot.cooled_down(now) {
                debug!("{} held during cooldown, ignored", role);
                continue;
            }

            slot.last_accept = Some(now);
            let count = self.state.counts.get_mut(role);
            *count = count.saturating_add(1);
            reaction.fired.push(role);
            reaction.background = Some(BackgroundState::Flash(role));
        }

        reaction
    }

    /// Drop `token` from the held set and unlatch every role it breaks
    pub fn on_release(&mut self, token: &Token) -> Reaction {
        self.held.remove(token);
        let mut unlatched = false;

        for slot in &mut self.roles {
            if slot.latched && !slot.combo.is_satisfied_by(&self.held) {
                slot.latched = false;
                unlatched = true;
            }
        }

        Reaction {
            fired: Vec::new(),
            background: unlatched.then_some(BackgroundState::Idle),
        }
    }

    /// Union of both combos
    pub fn watch_set(&self) -> HashSet<Token> {
        self.roles
            .iter()
            .flat_map(|slot| slot.combo.tokens().cloned())
            .collect()
    }

    pub fn combo(&self, role: Role) -> &Combo {
        &self.roles[role.index()].combo
    }

    pub fn count(&self, role: Role) -> u64 {
        *self.state.counts.get(role)
    }

    pub fn delay(&self, role: Role) -> Duration {
        self.roles[role.index()].cooldown
    }

    pub fn is_latched(&self, role: Role) -> bool {
        self.roles[role.index()].latched
    }

    pub fn held(&self) -> &HashSet<Token> {
        &self.held
    }

    /// The counter state to persist
    pub fn state(&self) -> &CounterState {
        &self.state
    }
}
