//! # Flow Studio
//!
//! A visual editor for dataflow pipelines. Flows are directed graphs of
//! typed component nodes; the editor talks to a flow runtime backend over
//! HTTP to load and save flow documents, fetch component catalogs and
//! config schemas, drive the deploy/start/stop lifecycle, and poll
//! runtime status.
//!
//! ## Architecture
//!
//! - **Client**: HTTP requests run on a service worker thread so the UI
//!   never blocks on the network
//! - **Editor**: eframe/egui pages (canvas, monitor, settings) with
//!   egui_plot for throughput charts
//! - **Flow**: The document model - nodes, connections, structural lint
//! - **Communication**: Crossbeam channels between the worker and the UI
//!
//! Unsaved work is tracked by a save state machine
//! ([`editor::SaveCoordinator`]) and navigation away from a dirty
//! document is intercepted by [`editor::NavigationGuard`].
//!
//! ## Configuration
//!
//! Application state (recent flows, preferences) is stored in the
//! platform-appropriate data directory under `dev.flowstudio.flowstudio-rs`:
//!
//! - **Linux**: `~/.local/share/dev.flowstudio.flowstudio-rs/`
//! - **macOS**: `~/Library/Application Support/dev.flowstudio.flowstudio-rs/`
//! - **Windows**: `%APPDATA%\dev.flowstudio.flowstudio-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use flowstudio_rs::{
//!     client::{FlowService, HttpFlowApi},
//!     config::{AppState, EditorSettings},
//!     editor::FlowStudioApp,
//! };
//!
//! fn main() -> eframe::Result<()> {
//!     let app_state = AppState::load_or_default();
//!     let mut settings = EditorSettings::load_or_default();
//!     settings.sanitize();
//!
//!     let api = HttpFlowApi::new(&app_state.backend_url)
//!         .expect("Failed to build the HTTP client");
//!     let (service, handle) = FlowService::new(Box::new(api));
//!     std::thread::spawn(move || service.run());
//!
//!     let native_options = eframe::NativeOptions::default();
//!     eframe::run_native(
//!         "Flow Studio",
//!         native_options,
//!         Box::new(|cc| {
//!             Ok(Box::new(FlowStudioApp::new(cc, handle, app_state, settings)))
//!         }),
//!     )
//! }
//! ```

pub mod app;
pub mod client;
pub mod config;
pub mod editor;
pub mod error;
pub mod flow;
pub mod types;

// Re-export commonly used types
pub use app::FlowStudioApp;
pub use client::{FlowApi, FlowService, HttpFlowApi, ServiceEvent, ServiceHandle};
pub use config::{AppState, EditorSettings};
pub use error::{FlowStudioError, Result};
pub use flow::{ComponentType, Connection, FlowGraph, FlowNode};
