//! Shared state types for the editor
//!
//! This module defines the shared state container and action types used by
//! the page-based architecture. Pages receive `SharedState` via borrowing
//! and return `AppAction`s instead of mutating the document directly.

use std::collections::HashMap;

use crate::client::ServiceHandle;
use crate::config::{AppState, EditorSettings};
use crate::editor::save::SaveState;
use crate::editor::Route;
use crate::flow::{
    CanvasPos, ComponentSchema, ComponentType, ConnectionId, FlowGraph, NodeId, ValidationResult,
};
use crate::types::{BackendStatus, LogEntry, MetricsSample, RuntimeAction, RuntimeStateInfo};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Shared state accessible by all pages (borrowed, not owned).
///
/// Read-mostly: pages mutate only UI-level state (selection, settings)
/// directly. Document edits and backend traffic go through [`AppAction`]s
/// so the save status and the service worker stay in sync.
pub struct SharedState<'a> {
    // Communication
    pub service: &'a ServiceHandle,

    // The open document and what the backend knows about it
    pub document: &'a FlowGraph,
    pub catalog: &'a [ComponentType],
    /// Fetched schemas by type id; `None` means the type has no schema
    pub schemas: &'a HashMap<String, Option<ComponentSchema>>,
    /// Local structural lint, recomputed after every edit
    pub lint: &'a ValidationResult,
    /// Verdict from the last completed save, if any
    pub server_validation: Option<&'a ValidationResult>,

    // Status
    pub save: SaveState,
    pub backend_status: BackendStatus,
    pub runtime: Option<&'a RuntimeStateInfo>,
    pub metrics: &'a [MetricsSample],
    pub runtime_logs: &'a [LogEntry],

    // Configuration (read-write by pages)
    pub settings: &'a mut EditorSettings,
    pub app_state: &'a mut AppState,

    // UI state shared across pages
    pub selected_node: &'a mut Option<NodeId>,
    pub last_error: &'a mut Option<String>,
}

impl SharedState<'_> {
    /// Component descriptor for a node's type, when the catalog has it
    pub fn component_for(&self, type_name: &str) -> Option<&ComponentType> {
        self.catalog.iter().find(|c| c.type_name == type_name)
    }

    /// True when the local lint and the last server verdict agree the
    /// flow has no errors. Gates the Deploy action.
    pub fn is_flow_valid(&self) -> bool {
        !self.lint.has_errors() && !self.server_validation.is_some_and(|v| v.has_errors())
    }
}

/// Actions that any page can emit
///
/// Pages return `Vec<AppAction>` instead of mutating state directly.
/// This enables:
/// - Testable page logic
/// - Clear separation between UI and business logic
/// - Centralized action handling
#[derive(Debug, Clone)]
pub enum AppAction {
    // Document edits
    /// Place a new instance of a component type on the canvas
    AddNode { type_id: String, position: CanvasPos },
    /// Move a node to a new canvas position
    MoveNode { id: NodeId, position: CanvasPos },
    /// Remove a node and its connections
    RemoveNode(NodeId),
    /// Rename a node
    RenameNode { id: NodeId, name: String },
    /// Rename the flow itself
    RenameFlow(String),
    /// Wire an output port to an input port
    Connect {
        from: NodeId,
        from_port: String,
        to: NodeId,
        to_port: String,
    },
    /// Remove a connection
    Disconnect(ConnectionId),
    /// Set one config value on a node
    SetConfigValue {
        id: NodeId,
        key: String,
        value: Value,
    },
    /// Replace a node's whole config (raw JSON editor apply)
    ApplyRawConfig {
        id: NodeId,
        config: BTreeMap<String, Value>,
    },

    // Persistence
    /// Save the open flow to the backend
    Save,
    /// Load a flow by id
    LoadFlow(String),
    /// Write the open flow to a local JSON file
    ExportFlow(PathBuf),
    /// Replace the open flow with one read from a local JSON file
    ImportFlow(PathBuf),

    // Backend commands
    /// Refetch the component type catalog
    RefreshCatalog,
    /// Fetch one component type's config schema
    FetchSchema(String),
    /// Request a runtime lifecycle transition for the open flow
    Control(RuntimeAction),
    /// Point the service at a different backend and persist the choice
    SetBackendUrl(String),
    /// Change the runtime polling cadence
    SetPollInterval(f32),

    // Navigation
    /// Navigate to a page (goes through the unsaved-changes guard)
    Navigate(Route),
    /// Return to the previously visited page
    NavigateBack,
    /// Select a node and jump to the editor page
    FocusNode(NodeId),

    // Dialogs
    /// Open a dialog
    OpenDialog(DialogId),
}

/// Dialog identifiers
///
/// Used with `AppAction::OpenDialog` to specify which dialog to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogId {
    /// Unsaved changes prompt; the blocked destination lives in the guard
    UnsavedChanges,
    /// Validation findings from the last save
    ValidationResults,
}
