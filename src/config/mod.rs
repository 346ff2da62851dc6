//! Configuration module for Flow Studio
//!
//! This module handles application configuration including:
//! - Application state persistence (recent flows, last session, backend URL)
//! - Editor settings that the user can change at runtime
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.flowstudio.flowstudio-rs/`
//! - **macOS**: `~/Library/Application Support/dev.flowstudio.flowstudio-rs/`
//! - **Windows**: `%APPDATA%\dev.flowstudio.flowstudio-rs\`
//!
//! # Files
//!
//! - `app_state.json` - Recent flows, last session info, UI preferences
//! - `settings.toml` - Editor settings (autosave, polling cadence)
//! - `logs/` - Rolling log files
//!
//! # Example
//!
//! ```ignore
//! use flowstudio_rs::config::{AppState, EditorSettings};
//!
//! // Load or create app state
//! let mut state = AppState::load_or_default();
//!
//! // Reopen the flow from the last session
//! if let Some(flow_id) = state.last_flow_id.clone() {
//!     open_flow(&flow_id);
//! }
//!
//! state.add_recent_flow("flow-42", "Sensor Fanout");
//! state.save()?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{FlowStudioError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.flowstudio.flowstudio-rs";

/// App state filename
pub const APP_STATE_FILE: &str = "app_state.json";

/// Maximum number of recent flows to remember
pub const MAX_RECENT_FLOWS: usize = 10;

/// Backend reached when nothing is configured
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8420";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        FlowStudioError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            FlowStudioError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the app state file
pub fn app_state_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(APP_STATE_FILE))
}

// ==================== Recent Flow Entry ====================

/// Information about a recently opened flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentFlow {
    /// Backend identifier of the flow
    pub id: String,

    /// Display name at the time it was opened
    pub name: String,

    /// Last opened timestamp (Unix seconds)
    pub last_opened: u64,
}

impl RecentFlow {
    /// Create a new recent flow entry
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            last_opened: unix_now(),
        }
    }

    /// Update the last opened timestamp
    pub fn touch(&mut self) {
        self.last_opened = unix_now();
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ==================== App State ====================

/// Persistent application state
///
/// This stores user history and session info that persists across runs,
/// separate from the editor settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    /// Version for future migration support
    #[serde(default = "default_app_state_version")]
    pub version: u32,

    /// Recently opened flows, most recent first
    #[serde(default)]
    pub recent_flows: Vec<RecentFlow>,

    /// Flow that was open when the app last exited (for session restore)
    #[serde(default)]
    pub last_flow_id: Option<String>,

    /// Base URL of the flow backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// UI preferences that persist across flows
    #[serde(default)]
    pub ui_preferences: UiPreferences,
}

fn default_app_state_version() -> u32 {
    1
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: 1,
            recent_flows: Vec::new(),
            last_flow_id: None,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            ui_preferences: UiPreferences::default(),
        }
    }
}

impl AppState {
    /// Load app state from the default location
    pub fn load() -> Result<Self> {
        let path = app_state_path().ok_or_else(|| {
            FlowStudioError::Config("Could not determine app state path".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| FlowStudioError::Config(format!("Failed to read app state: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| FlowStudioError::Config(format!("Failed to parse app state: {}", e)))
    }

    /// Load app state, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load app state, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save app state to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        let path = dir.join(APP_STATE_FILE);

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| FlowStudioError::Config(format!("Failed to serialize app state: {}", e)))?;

        std::fs::write(&path, content)
            .map_err(|e| FlowStudioError::Config(format!("Failed to write app state: {}", e)))
    }

    /// Add or update a recent flow
    pub fn add_recent_flow(&mut self, id: &str, name: &str) {
        self.recent_flows.retain(|f| f.id != id);
        self.recent_flows.insert(0, RecentFlow::new(id, name));
        self.recent_flows.truncate(MAX_RECENT_FLOWS);
        self.last_flow_id = Some(id.to_string());
    }

    /// Remove a flow from recents (e.g. after the backend deleted it)
    pub fn remove_recent_flow(&mut self, id: &str) {
        self.recent_flows.retain(|f| f.id != id);
        if self.last_flow_id.as_deref() == Some(id) {
            self.last_flow_id = None;
        }
    }
}

/// UI preferences that persist across all flows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiPreferences {
    /// Enable dark mode
    #[serde(default = "default_true")]
    pub dark_mode: bool,

    /// Font scale factor
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,

    /// Remember window position and size
    #[serde(default = "default_true")]
    pub remember_window_state: bool,

    /// Draw the background grid on the canvas
    #[serde(default = "default_true")]
    pub show_canvas_grid: bool,
}

fn default_true() -> bool {
    true
}

fn default_font_scale() -> f32 {
    1.0
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            font_scale: 1.0,
            remember_window_state: true,
            show_canvas_grid: true,
        }
    }
}
