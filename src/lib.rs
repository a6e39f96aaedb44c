//! Key Counter - two-trigger skill counter driven by global input
//!
//! Global key and mouse input is normalized into tokens, deduplicated across
//! backends, matched against two trigger combos and counted with a per-trigger
//! cooldown. Counts persist to a JSON file between sessions.

pub mod config;
pub mod input;
pub mod store;
pub mod trigger;
pub mod ui;
pub mod utils;

pub use config::Config;
