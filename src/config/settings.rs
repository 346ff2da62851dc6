//! Editor settings that can be changed during application execution
//!
//! These settings control save and polling behavior, separate from the
//! session state in [`AppState`](crate::config::AppState). They are stored
//! as TOML so a user can also adjust them with a text editor between runs.
//!
//! # Settings
//!
//! - **Autosave**: Whether edits are saved automatically, and how long the
//!   editor waits after the last edit before doing so
//! - **Runtime polling**: How often the monitor refreshes runtime status
//! - **Monitor log buffer**: How many runtime log lines are kept on screen

use crate::config::ensure_app_data_dir;
use crate::error::{FlowStudioError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings filename inside the app data directory
pub const SETTINGS_FILE: &str = "settings.toml";

/// Autosave delay bounds in seconds
pub const AUTOSAVE_DELAY_RANGE: (f32, f32) = (0.5, 60.0);

/// Runtime poll interval bounds in seconds
pub const POLL_INTERVAL_RANGE: (f32, f32) = (0.5, 30.0);

/// Editor settings persisted as `settings.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Save automatically after a pause in editing
    #[serde(default = "default_true")]
    pub autosave_enabled: bool,

    /// Seconds of editing silence before an autosave fires
    #[serde(default = "default_autosave_delay")]
    pub autosave_delay_secs: f32,

    /// Seconds between runtime status polls
    #[serde(default = "default_poll_interval")]
    pub runtime_poll_interval_secs: f32,

    /// Runtime log lines kept in the monitor view
    #[serde(default = "default_max_log_lines")]
    pub max_log_lines: usize,
}

fn default_true() -> bool {
    true
}

fn default_autosave_delay() -> f32 {
    3.0
}

fn default_poll_interval() -> f32 {
    2.0
}

fn default_max_log_lines() -> usize {
    200
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            autosave_enabled: true,
            autosave_delay_secs: 3.0,
            runtime_poll_interval_secs: 2.0,
            max_log_lines: 200,
        }
    }
}

impl EditorSettings {
    /// Autosave delay as a [`Duration`]
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_secs_f32(self.autosave_delay_secs.max(0.0))
    }

    /// Clamp all values into their allowed ranges
    pub fn sanitize(&mut self) {
        self.autosave_delay_secs = self
            .autosave_delay_secs
            .clamp(AUTOSAVE_DELAY_RANGE.0, AUTOSAVE_DELAY_RANGE.1);
        self.runtime_poll_interval_secs = self
            .runtime_poll_interval_secs
            .clamp(POLL_INTERVAL_RANGE.0, POLL_INTERVAL_RANGE.1);
        self.max_log_lines = self.max_log_lines.clamp(50, 5_000);
    }

    /// Load settings from the default location
    pub fn load() -> Result<Self> {
        let path = settings_path().ok_or_else(|| {
            FlowStudioError::Config("Could not determine settings path".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| FlowStudioError::Config(format!("Failed to read settings: {}", e)))?;

        let mut settings: Self = toml::from_str(&content)
            .map_err(|e| FlowStudioError::Config(format!("Failed to parse settings: {}", e)))?;
        settings.sanitize();
        Ok(settings)
    }

    /// Load settings, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        let path = dir.join(SETTINGS_FILE);

        let content = toml::to_string_pretty(self)
            .map_err(|e| FlowStudioError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(&path, content)
            .map_err(|e| FlowStudioError::Config(format!("Failed to write settings: {}", e)))
    }
}

/// Get the path to the settings file
pub fn settings_path() -> Option<PathBuf> {
    crate::config::app_data_dir().map(|p| p.join(SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = EditorSettings::default();
        assert!(settings.autosave_enabled);
        assert_eq!(settings.autosave_delay_secs, 3.0);
        assert_eq!(settings.autosave_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_settings_toml_round_trip() {
        let settings = EditorSettings {
            autosave_enabled: false,
            autosave_delay_secs: 7.5,
            runtime_poll_interval_secs: 1.0,
            max_log_lines: 500,
        };

        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: EditorSettings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: EditorSettings = toml::from_str("autosave_enabled = false\n").unwrap();
        assert!(!parsed.autosave_enabled);
        assert_eq!(parsed.autosave_delay_secs, 3.0);
        assert_eq!(parsed.max_log_lines, 200);
    }

    #[test]
    fn test_sanitize_clamps_out_of_range_values() {
        let mut settings = EditorSettings {
            autosave_enabled: true,
            autosave_delay_secs: 0.0,
            runtime_poll_interval_secs: 300.0,
            max_log_lines: 1,
        };
        settings.sanitize();

        assert_eq!(settings.autosave_delay_secs, AUTOSAVE_DELAY_RANGE.0);
        assert_eq!(settings.runtime_poll_interval_secs, POLL_INTERVAL_RANGE.1);
        assert_eq!(settings.max_log_lines, 50);
    }
}
