//! Shared test utilities for engine tests
//!
//! Provides builders for token events on a controlled timeline.

use crate::input::{InputEventType, Token, TokenEvent};
use crate::store::{CounterState, RoleMap};
use std::time::{Duration, Instant};

/// Builds a token, panicking on names that normalize to nothing.
pub fn token(name: &str) -> Token {
    Token::from_name(name).expect("test token name")
}

/// Instant `secs` seconds after `base`.
pub fn at(base: Instant, secs: f64) -> Instant {
    base + Duration::from_secs_f64(secs)
}

/// Creates a press event for `name` at a specific timestamp.
pub fn press_at(name: &str, timestamp: Instant) -> TokenEvent {
    TokenEvent::new(token(name), InputEventType::Press, timestamp)
}

/// Creates a release event for `name` at a specific timestamp.
pub fn release_at(name: &str, timestamp: Instant) -> TokenEvent {
    TokenEvent::new(token(name), InputEventType::Release, timestamp)
}

/// Counter state with the given combos, zero counts and one delay for both roles.
pub fn state_with(key1: &str, key2: &str, delay_secs: f64) -> CounterState {
    CounterState {
        keys: [key1.to_string(), key2.to_string()],
        counts: RoleMap::new(0, 0),
        delay: RoleMap::new(delay_secs, delay_secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_at_uses_provided_timestamp() {
        let ts = Instant::now();
        let event = press_at("Q", ts);
        assert_eq!(event.timestamp, ts);
        assert_eq!(event.token.as_str(), "q");
        assert!(event.is_press());
    }

    #[test]
    fn at_offsets_base() {
        let base = Instant::now();
        assert_eq!(at(base, 2.5) - base, Duration::from_millis(2500));
    }
}
