//! Trigger roles, background state and the counting engine

mod engine;

#[cfg(test)]
mod test_helpers;

pub use engine::{Reaction, TriggerEngine};

use std::fmt;

/// One of the two counted triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Key1,
    Key2,
}

impl Role {
    /// Both roles, in the order they are evaluated
    pub const ALL: [Role; 2] = [Role::Key1, Role::Key2];

    /// Position in the persisted `keys` array
    pub fn index(self) -> usize {
        match self {
            Role::Key1 => 0,
            Role::Key2 => 1,
        }
    }

    /// Field name used in the counter file
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Key1 => "key1",
            Role::Key2 => "key2",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the panel background should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundState {
    #[default]
    Idle,
    /// A trigger of this role was just accepted and is still held
    Flash(Role),
}
