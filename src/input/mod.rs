//! Global input capture, normalization and deduplication

mod aggregator;
mod backend;
mod combo;
mod event;
pub mod keymap;
mod token;

#[cfg(target_os = "linux")]
mod evdev_listener;

pub use aggregator::{Aggregator, BackendFactory, InputThread, DEFAULT_STOP_TIMEOUT};
pub use backend::{backend_factories, BackendError, InputBackend, KeyboardBackend, MouseBackend};
pub use combo::Combo;
pub use event::{InputEventType, MouseButton, RawEvent, RawInput, TokenEvent};
pub use token::{normalize, Token};

#[cfg(target_os = "linux")]
pub use evdev_listener::{evdev_status, EvdevError, EvdevListener};
