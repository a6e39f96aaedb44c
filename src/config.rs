//! Configuration management for Key Counter
//!
//! Settings are read once at startup from a platform-specific TOML file and
//! passed around by reference. The counter state itself lives in a separate
//! JSON file (see [`crate::store`]).
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/key-counter/config.toml` |
//! | macOS | `~/Library/Application Support/key-counter/config.toml` |
//! | Windows | `%APPDATA%\key-counter\config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use key_counter::Config;
//!
//! // Load existing config or use defaults
//! let mut config = Config::load().unwrap_or_default();
//!
//! // Modify settings
//! config.counter.default_delay_secs = 2.1;
//!
//! // Save to disk
//! config.save().expect("Failed to save config");
//! ```

use crate::store::CounterDefaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Directory name under the platform config dir
pub const APP_DIR: &str = "key-counter";

/// File name of the counter state
pub const STATE_FILE_NAME: &str = "counter_config.json";

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Returns the application directory, creating it if it doesn't exist.
pub fn app_dir() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    let app_dir = config_dir.join(APP_DIR);

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir)
}

/// Returns the path to the config file.
///
/// # Platform-specific paths
///
/// - Linux: `~/.config/key-counter/config.toml`
/// - macOS: `~/Library/Application Support/key-counter/config.toml`
/// - Windows: `%APPDATA%\key-counter\config.toml`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dir()?.join("config.toml"))
}

/// Returns the path of the log file
pub fn log_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dir()?.join("key-counter.log"))
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Input backend settings
    #[serde(default)]
    pub input: InputConfig,
    /// Counter defaults and state file location
    #[serde(default)]
    pub counter: CounterConfig,
    /// UI settings
    #[serde(default)]
    pub ui: UiConfig,
}

/// Input backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Delay between backend polls (in milliseconds)
    pub poll_interval_ms: u64,
    /// Watch mouse buttons
    pub mouse: bool,
    /// Also read keyboards through evdev (Linux only)
    pub evdev: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 4,
            mouse: true,
            evdev: true,
        }
    }
}

/// Counter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CounterConfig {
    /// Override for the counter state file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
    /// Trigger specs used when the state file has none
    pub default_keys: [String; 2],
    /// Cooldown used when the state file has none (in seconds)
    pub default_delay_secs: f64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        let defaults = CounterDefaults::default();
        Self {
            state_file: None,
            default_keys: defaults.keys,
            default_delay_secs: defaults.delay_secs,
        }
    }
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Refresh rate for UI updates (in Hz)
    pub refresh_rate_hz: u32,
    /// Color theme (dark/light)
    pub theme: Theme,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_hz: 30,
            theme: Theme::Dark,
        }
    }
}

/// Color theme options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the backend poll interval as Duration (at least 1 ms)
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.input.poll_interval_ms.max(1))
    }

    /// Get UI refresh interval as Duration
    pub fn refresh_interval(&self) -> Duration {
        let hz = self.ui.refresh_rate_hz.max(1);
        Duration::from_micros(1_000_000 / hz as u64)
    }

    /// Counter defaults with invalid values replaced by the built-in ones
    pub fn counter_defaults(&self) -> CounterDefaults {
        CounterDefaults {
            keys: self.counter.default_keys.clone(),
            delay_secs: self.counter.default_delay_secs,
        }
        .sanitized()
    }

    /// Location of the counter state file
    pub fn state_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.counter.state_file {
            Some(path) => Ok(path.clone()),
            None => Ok(app_dir()?.join(STATE_FILE_NAME)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_config_path() -> PathBuf {
        env::temp_dir().join(format!("key-counter-test-{}.toml", std::process::id()))
    }

    #[test]
    fn config_default_values() {
        let config = Config::default();
        assert_eq!(config.input.poll_interval_ms, 4);
        assert!(config.input.mouse);
        assert!(config.input.evdev);
        assert_eq!(config.counter.state_file, None);
        assert_eq!(config.counter.default_keys, ["q".to_string(), "e".to_string()]);
        assert_eq!(config.counter.default_delay_secs, 2.5);
        assert_eq!(config.ui.refresh_rate_hz, 30);
        assert_eq!(config.ui.theme, Theme::Dark);
    }

    #[test]
    fn config_refresh_interval() {
        let config = Config::default();
        // 30 Hz = 33333 microseconds per frame
        assert_eq!(config.refresh_interval().as_micros(), 33333);
    }

    #[test]
    fn zero_rates_do_not_divide_by_zero() {
        let mut config = Config::default();
        config.ui.refresh_rate_hz = 0;
        config.input.poll_interval_ms = 0;
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn config_save_and_load_roundtrip() {
        let path = temp_config_path();

        let mut config = Config::default();
        config.input.mouse = false;
        config.counter.state_file = Some(PathBuf::from("/tmp/counts.json"));
        config.counter.default_delay_secs = 2.1;
        config.ui.theme = Theme::Light;

        config.save_to(&path).expect("Failed to save config");
        let loaded = Config::load_from(&path).expect("Failed to load config");
        assert_eq!(loaded, config);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn config_load_missing_file_is_error() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn config_serializes_to_toml() {
        let toml_str = toml::to_string_pretty(&Config::default()).expect("Failed to serialize");

        assert!(toml_str.contains("[input]"));
        assert!(toml_str.contains("[counter]"));
        assert!(toml_str.contains("[ui]"));
        assert!(toml_str.contains("poll_interval_ms = 4"));
        assert!(!toml_str.contains("state_file"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[counter]
default_keys = ["ctrl+q", "mouse4"]

[ui]
theme = "Light"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");

        assert_eq!(config.input, InputConfig::default());
        assert_eq!(
            config.counter.default_keys,
            ["ctrl+q".to_string(), "mouse4".to_string()]
        );
        assert_eq!(config.counter.default_delay_secs, 2.5);
        assert_eq!(config.ui.refresh_rate_hz, 30);
        assert_eq!(config.ui.theme, Theme::Light);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let path = env::temp_dir().join(format!("key-counter-bad-{}.toml", std::process::id()));
        fs::write(&path, "[input\npoll_interval_ms = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn counter_defaults_are_sanitized() {
        let mut config = Config::default();
        config.counter.default_keys = ["Q".to_string(), "q".to_string()];
        config.counter.default_delay_secs = -2.0;
        assert_eq!(config.counter_defaults(), CounterDefaults::default());
    }

    #[test]
    fn state_path_override() {
        let mut config = Config::default();
        config.counter.state_file = Some(PathBuf::from("/tmp/elsewhere.json"));
        assert_eq!(
            config.state_path().unwrap(),
            PathBuf::from("/tmp/elsewhere.json")
        );
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::NoConfigDir;
        assert_eq!(err.to_string(), "Could not determine config directory");

        let io_err = ConfigError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(io_err.to_string().contains("IO error"));
    }
}
