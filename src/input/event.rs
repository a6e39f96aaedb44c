//! Raw and normalized input event types

use super::Token;
use std::time::Instant;

/// Type of input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEventType {
    /// Key or button went down
    Press,
    /// Key or button went up
    Release,
}

/// Mouse buttons a backend can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// First side button (usually "back")
    X1,
    /// Second side button (usually "forward")
    X2,
    /// Any other button, by backend index
    Other(u8),
}

/// Identifier of a physical input, tagged by how the reporting backend knows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    /// A printable character
    Char(char),
    /// A named key such as `ctrl_l` or `escape`
    Named(String),
    /// A Windows virtual-key code
    Code(u32),
    /// A mouse button
    Mouse(MouseButton),
}

impl RawInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

/// A press or release as reported by a single backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub input: RawInput,
    pub event_type: InputEventType,
}

impl RawEvent {
    pub fn press(input: RawInput) -> Self {
        Self {
            input,
            event_type: InputEventType::Press,
        }
    }

    pub fn release(input: RawInput) -> Self {
        Self {
            input,
            event_type: InputEventType::Release,
        }
    }
}

/// A deduplicated press or release of a watched token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEvent {
    /// The normalized input
    pub token: Token,
    /// Type of event (press/release)
    pub event_type: InputEventType,
    /// When the aggregator observed the change
    pub timestamp: Instant,
}

impl TokenEvent {
    pub fn new(token: Token, event_type: InputEventType, timestamp: Instant) -> Self {
        Self {
            token,
            event_type,
            timestamp,
        }
    }

    pub fn is_press(&self) -> bool {
        self.event_type == InputEventType::Press
    }
}
