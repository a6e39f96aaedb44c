//! Input backends: sources of raw press/release events
//!
//! Backends are polled from the aggregator thread. Each one only reports its
//! own view of the hardware; merging and deduplication happen in the
//! [`Aggregator`](super::Aggregator).

use super::{keymap, BackendFactory, RawEvent, RawInput};
use crate::config::InputConfig;
use device_query::{DeviceQuery, DeviceState, Keycode};
use std::io;
use thiserror::Error;

/// Error type for backend start-up and polling
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend cannot run on this machine
    #[error("{backend} backend unavailable: {reason}")]
    Unavailable {
        backend: &'static str,
        reason: String,
    },
    /// Reading from the device failed
    #[error("{backend} backend failed: {source}")]
    Io {
        backend: &'static str,
        #[source]
        source: io::Error,
    },
}

/// A source of raw press/release events
pub trait InputBackend {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Append every state change since the previous poll to `out`
    fn poll(&mut self, out: &mut Vec<RawEvent>) -> Result<(), BackendError>;

    /// Release whatever the backend holds. Called once when the aggregator exits.
    fn stop(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Keyboard backend that diffs device_query key state between polls
pub struct KeyboardBackend {
    device_state: DeviceState,
    last_keys: Vec<Keycode>,
}

impl KeyboardBackend {
    pub fn new() -> Self {
        Self {
            device_state: DeviceState::new(),
            last_keys: Vec::new(),
        }
    }
}

impl Default for KeyboardBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBackend for KeyboardBackend {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn poll(&mut self, out: &mut Vec<RawEvent>) -> Result<(), BackendError> {
        let current_keys = self.device_state.get_keys();

        // New key presses
        for key in &current_keys {
            if !self.last_keys.contains(key) {
                if let Some(input) = keymap::from_device_query(*key) {
                    out.push(RawEvent::press(input));
                }
            }
        }

        // Key releases
        for key in &self.last_keys {
            if !current_keys.contains(key) {
                if let Some(input) = keymap::from_device_query(*key) {
                    out.push(RawEvent::release(input));
                }
            }
        }

        self.last_keys = current_keys;
        Ok(())
    }
}

/// Mouse button backend that diffs device_query button state between polls
pub struct MouseBackend {
    device_state: DeviceState,
    last_buttons: Vec<bool>,
}

impl MouseBackend {
    pub fn new() -> Self {
        Self {
            device_state: DeviceState::new(),
            last_buttons: Vec::new(),
        }
    }
}

impl Default for MouseBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBackend for MouseBackend {
    fn name(&self) -> &'static str {
        "mouse"
    }

    fn poll(&mut self, out: &mut Vec<RawEvent>) -> Result<(), BackendError> {
        let buttons = self.device_state.get_mouse().button_pressed;
        button_changes(&self.last_buttons, &buttons, out);
        self.last_buttons = buttons;
        Ok(())
    }
}

/// Emit press/release events for every button whose state differs
fn button_changes(previous: &[bool], current: &[bool], out: &mut Vec<RawEvent>) {
    let len = previous.len().max(current.len());
    for index in 0..len {
        let was = previous.get(index).copied().unwrap_or(false);
        let is = current.get(index).copied().unwrap_or(false);
        if was == is {
            continue;
        }
        let Some(button) = keymap::from_mouse_index(index) else {
            continue;
        };
        let input = RawInput::Mouse(button);
        out.push(if is {
            RawEvent::press(input)
        } else {
            RawEvent::release(input)
        });
    }
}

/// Build the backend factories enabled by the input configuration.
///
/// The keyboard backend is always present. Factories run on the aggregator
/// thread, so backends never have to cross threads.
pub fn backend_factories(config: &InputConfig) -> Vec<BackendFactory> {
    let mut factories: Vec<BackendFactory> = vec![Box::new(|| {
        Ok(Box::new(KeyboardBackend::new()) as Box<dyn InputBackend>)
    })];

    if config.mouse {
        factories.push(Box::new(|| {
            Ok(Box::new(MouseBackend::new()) as Box<dyn InputBackend>)
        }));
    }

    #[cfg(target_os = "linux")]
    {
        if config.evdev {
            factories.push(Box::new(|| -> Result<Box<dyn InputBackend>, BackendError> {
                let listener = super::EvdevListener::new()?;
                log::debug!("evdev: {} input device(s) open", listener.device_count());
                Ok(Box::new(listener) as Box<dyn InputBackend>)
            }));
        }
    }

    factories
}
