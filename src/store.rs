//! Persisted counter state: trigger keys, counts and cooldowns
//!
//! The file is hand-editable JSON. Anything malformed is repaired on load
//! and the repaired record is written straight back.

use crate::trigger::Role;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One value per trigger role
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleMap<T> {
    pub key1: T,
    pub key2: T,
}

impl<T> RoleMap<T> {
    pub fn new(key1: T, key2: T) -> Self {
        Self { key1, key2 }
    }

    pub fn from_fn(mut f: impl FnMut(Role) -> T) -> Self {
        Self {
            key1: f(Role::Key1),
            key2: f(Role::Key2),
        }
    }

    pub fn get(&self, role: Role) -> &T {
        match role {
            Role::Key1 => &self.key1,
            Role::Key2 => &self.key2,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut T {
        match role {
            Role::Key1 => &mut self.key1,
            Role::Key2 => &mut self.key2,
        }
    }
}

/// Fallback values used when the stored record is missing or invalid
#[derive(Debug, Clone, PartialEq)]
pub struct CounterDefaults {
    pub keys: [String; 2],
    pub delay_secs: f64,
}

impl Default for CounterDefaults {
    fn default() -> Self {
        Self {
            keys: ["q".to_string(), "e".to_string()],
            delay_secs: 2.5,
        }
    }
}

impl CounterDefaults {
    /// Apply the same rules as the stored record, falling back to the
    /// built-in values for anything unusable
    pub fn sanitized(self) -> Self {
        let builtin = Self::default();
        let keys = match clean_keys(&self.keys) {
            Some(keys) => keys,
            None => {
                warn!("invalid default keys {:?}, using built-in", self.keys);
                builtin.keys
            }
        };
        let delay_secs = if valid_delay(self.delay_secs) {
            self.delay_secs
        } else {
            warn!("invalid default delay {}, using built-in", self.delay_secs);
            builtin.delay_secs
        };
        Self { keys, delay_secs }
    }
}

/// The record stored in the counter file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterState {
    pub keys: [String; 2],
    pub counts: RoleMap<u64>,
    pub delay: RoleMap<f64>,
}

impl CounterState {
    pub fn from_defaults(defaults: &CounterDefaults) -> Self {
        Self {
            keys: defaults.keys.clone(),
            counts: RoleMap::new(0, 0),
            delay: RoleMap::new(defaults.delay_secs, defaults.delay_secs),
        }
    }

    /// Trigger spec of a role
    pub fn key(&self, role: Role) -> &str {
        &self.keys[role.index()]
    }

    /// Build a valid state from an arbitrary JSON object.
    ///
    /// Returns the state and whether anything had to be fixed. Fails only
    /// when the root is not an object.
    pub fn validate(
        value: &Value,
        defaults: &CounterDefaults,
    ) -> Result<(Self, bool), StoreError> {
        let root = value.as_object().ok_or(StoreError::NotAnObject)?;
        let mut repaired = false;

        let keys = validate_keys(root.get("keys"), defaults, &mut repaired);
        let counts = validate_counts(root.get("counts"), &keys, &mut repaired);
        let delay = validate_delay(root.get("delay"), defaults, &mut repaired);

        Ok((Self { keys, counts, delay }, repaired))
    }

    /// Parse and validate the contents of a counter file
    pub fn from_json(
        text: &str,
        defaults: &CounterDefaults,
    ) -> Result<(Self, bool), StoreError> {
        let value: Value = serde_json::from_str(text)?;
        Self::validate(&value, defaults)
    }
}

/// Errors from reading or writing the counter file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("counter file I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("counter file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("counter file root is not a JSON object")]
    NotAnObject,
}

fn valid_delay(secs: f64) -> bool {
    secs.is_finite() && secs >= 0.0
}

/// Trim and lowercase two trigger specs; `None` if either is empty or they match
fn clean_keys<S: AsRef<str>>(raw: &[S]) -> Option<[String; 2]> {
    let [first, second] = raw else {
        return None;
    };
    let first = first.as_ref().trim().to_lowercase();
    let second = second.as_ref().trim().to_lowercase();
    if first.is_empty() || second.is_empty() || first == second {
        return None;
    }
    Some([first, second])
}

fn validate_keys(
    value: Option<&Value>,
    defaults: &CounterDefaults,
    repaired: &mut bool,
) -> [String; 2] {
    let stored = value.and_then(Value::as_array);
    let usable: Vec<&str> = stored
        .map(|items| items.iter().take(2).filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let keys = clean_keys(&usable).unwrap_or_else(|| defaults.keys.clone());

    let unchanged = stored.is_some_and(|items| {
        items.len() == 2
            && items
                .iter()
                .zip(&keys)
                .all(|(item, key)| item.as_str() == Some(key.as_str()))
    });
    if !unchanged {
        *repaired = true;
    }
    keys
}

/// Read a count, accepting non-negative whole numbers and truncating floats
fn count_value(value: Option<&Value>, repaired: &mut bool) -> u64 {
    let Some(value) = value else {
        *repaired = true;
        return 0;
    };
    if let Some(n) = value.as_u64() {
        return n;
    }
    *repaired = true;
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 => f as u64,
        _ => 0,
    }
}

fn validate_counts(
    value: Option<&Value>,
    keys: &[String; 2],
    repaired: &mut bool,
) -> RoleMap<u64> {
    let empty = Map::new();
    let counts = match value.and_then(Value::as_object) {
        Some(map) => map,
        None => {
            *repaired = true;
            &empty
        }
    };

    if counts.contains_key("key1") && counts.contains_key("key2") {
        return RoleMap::from_fn(|role| count_value(counts.get(role.as_str()), repaired));
    }

    // Older files keyed counts by the trigger spec itself
    if !counts.is_empty() {
        info!("migrating counts keyed by trigger spec");
    }
    *repaired = true;
    RoleMap::from_fn(|role| match counts.get(&keys[role.index()]) {
        Some(v) => count_value(Some(v), repaired),
        None => 0,
    })
}

fn validate_delay(
    value: Option<&Value>,
    defaults: &CounterDefaults,
    repaired: &mut bool,
) -> RoleMap<f64> {
    let Some(delay) = value.and_then(Value::as_object) else {
        *repaired = true;
        return RoleMap::new(defaults.delay_secs, defaults.delay_secs);
    };
    RoleMap::from_fn(|role| match delay.get(role.as_str()).and_then(Value::as_f64) {
        Some(secs) if valid_delay(secs) => secs,
        _ => {
            *repaired = true;
            defaults.delay_secs
        }
    })
}

/// Loads and saves the counter file
#[derive(Debug, Clone)]
pub struct CounterStore {
    path: PathBuf,
}

impl CounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored state, repairing and rewriting it as needed. Never fails.
    pub fn load(&self, defaults: &CounterDefaults) -> CounterState {
        let (state, write_back) = match fs::read_to_string(&self.path) {
            Ok(text) => match CounterState::from_json(&text, defaults) {
                Ok((state, repaired)) => {
                    if repaired {
                        info!("repaired counter file {}", self.path.display());
                    }
                    (state, repaired)
                }
                Err(e) => {
                    warn!(
                        "resetting unreadable counter file {}: {}",
                        self.path.display(),
                        e
                    );
                    (CounterState::from_defaults(defaults), true)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("creating counter file {}", self.path.display());
                (CounterState::from_defaults(defaults), true)
            }
            Err(e) => {
                warn!("cannot read counter file {}: {}", self.path.display(), e);
                (CounterState::from_defaults(defaults), true)
            }
        };

        if write_back {
            if let Err(e) = self.save(&state) {
                warn!("failed to write counter file {}: {}", self.path.display(), e);
            }
        }
        state
    }

    /// Write the state as pretty JSON, creating parent directories
    pub fn save(&self, state: &CounterState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
