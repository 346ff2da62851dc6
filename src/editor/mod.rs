//! The egui editor application.
//!
//! The UI is page-based: a menu bar and a status bar frame one of three
//! pages (canvas editor, runtime monitor, settings). Pages receive a
//! borrowed [`SharedState`] and return [`AppAction`]s; the app applies
//! them centrally so every document edit passes through the
//! [`SaveCoordinator`] and every route change through the
//! [`NavigationGuard`].
//!
//! # Main Types
//!
//! - [`FlowStudioApp`] - Application state implementing [`eframe::App`]
//! - [`Route`] - The top-level pages (plus window close as a destination)
//! - [`SaveCoordinator`] - Save status state machine for the open flow
//! - [`NavigationGuard`] - Blocks navigation while unsaved work exists
//!
//! # Submodules
//!
//! - `canvas` - Node graph editing surface
//! - `palette` - Component catalog sidebar
//! - `inspector` - Schema-driven config form for the selected node
//! - `monitor` - Runtime state, throughput chart and logs
//! - `settings_page` - Editor, backend and appearance settings
//! - `dialogs` - Modal dialogs (unsaved changes, validation results)

pub mod canvas;
pub mod dialogs;
pub mod guard;
pub mod inspector;
pub mod monitor;
pub mod palette;
pub mod save;
pub mod settings_page;
pub mod state;
mod status_bar;

pub use guard::{GuardDecision, NavigationGuard};
pub use save::{SaveCoordinator, SaveOutcome, SaveState, SaveStatus, SaveTicket};
pub use state::{AppAction, DialogId, SharedState};

use dialogs::{
    show_dialog, UnsavedChangesContext, UnsavedChangesDialog, UnsavedChangesState,
    ValidationResultsAction, ValidationResultsContext, ValidationResultsDialog,
    ValidationResultsState,
};

use crate::client::{ServiceErrorKind, ServiceEvent, ServiceHandle};
use crate::config::{AppState, EditorSettings};
use crate::flow::{lint_graph, ComponentSchema, ComponentType, FlowGraph, NodeId, ValidationResult};
use crate::types::{BackendStatus, LogEntry, MetricsSample, RuntimeAction, RuntimeStateInfo};
use canvas::CanvasState;
use egui::Color32;
use inspector::InspectorState;
use monitor::MonitorState;
use palette::PaletteState;
use settings_page::SettingsPageState;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Throughput samples retained for the monitor chart
const MAX_METRICS_SAMPLES: usize = 600;

/// Top-level navigation destinations
///
/// `Exit` is not a page: it models closing the window, so the navigation
/// guard can treat quit attempts like any other route change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Editor,
    Monitor,
    Settings,
    Exit,
}

impl Route {
    pub fn label(&self) -> &'static str {
        match self {
            Route::Editor => "Editor",
            Route::Monitor => "Monitor",
            Route::Settings => "Settings",
            Route::Exit => "Exit",
        }
    }
}

/// A document open parked behind the unsaved-changes prompt
#[derive(Debug, Clone)]
enum PendingOpen {
    /// Fetch a flow from the backend by id
    Backend(String),
    /// Import a flow file from disk
    File(PathBuf),
}

/// Main application state for the flow editor
pub struct FlowStudioApp {
    // === Communication ===
    service: ServiceHandle,

    // === Document ===
    document: FlowGraph,
    catalog: Vec<ComponentType>,
    /// Fetched schemas by type id; `None` marks types without one
    schemas: HashMap<String, Option<ComponentSchema>>,
    lint: ValidationResult,

    // === Save & navigation ===
    coordinator: SaveCoordinator,
    pending_ticket: Option<SaveTicket>,
    /// Continue the blocked navigation once the in-flight save succeeds
    save_and_leave: bool,
    guard: NavigationGuard,
    /// Document open waiting until unsaved work is resolved
    pending_open: Option<PendingOpen>,
    route: Route,
    previous_route: Option<Route>,

    // === Runtime status ===
    backend_status: BackendStatus,
    runtime: Option<RuntimeStateInfo>,
    metrics: Vec<MetricsSample>,
    runtime_logs: Vec<LogEntry>,

    // === Configuration ===
    settings: EditorSettings,
    app_state: AppState,

    // === UI state ===
    selected_node: Option<NodeId>,
    last_error: Option<String>,
    flow_name_edit: String,
    canvas_state: CanvasState,
    palette_state: PaletteState,
    inspector_state: InspectorState,
    monitor_state: MonitorState,
    settings_page_state: SettingsPageState,

    // === Dialogs ===
    unsaved_open: bool,
    unsaved_state: UnsavedChangesState,
    validation_open: bool,
    validation_state: ValidationResultsState,
}

impl FlowStudioApp {
    /// Create a new application instance
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        service: ServiceHandle,
        app_state: AppState,
        settings: EditorSettings,
    ) -> Self {
        let prefs = &app_state.ui_preferences;
        cc.egui_ctx.set_visuals(if prefs.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
        let mut style = (*cc.egui_ctx.style()).clone();
        style.visuals.window_shadow.offset = [0, 0];
        cc.egui_ctx.set_style(style);
        if (prefs.font_scale - 1.0).abs() > 0.01 {
            cc.egui_ctx.set_zoom_factor(prefs.font_scale);
        }

        // Status transitions can happen while the window is idle; wake the
        // UI so they become visible without user input
        let mut coordinator = SaveCoordinator::new();
        let repaint = cc.egui_ctx.clone();
        coordinator.subscribe(move |_| repaint.request_repaint());

        let mut guard = NavigationGuard::new();
        let repaint = cc.egui_ctx.clone();
        guard.on_allowed(move |_| repaint.request_repaint());

        service.fetch_component_types();
        service.set_poll_interval(settings.runtime_poll_interval_secs);
        if let Some(flow_id) = app_state.last_flow_id.clone() {
            tracing::info!(%flow_id, "Restoring last open flow");
            service.fetch_flow(flow_id);
        }

        let document = FlowGraph::new("untitled", "Untitled Flow");
        let flow_name_edit = document.name.clone();

        Self {
            service,
            document,
            catalog: Vec::new(),
            schemas: HashMap::new(),
            lint: ValidationResult::default(),
            coordinator,
            pending_ticket: None,
            save_and_leave: false,
            guard,
            pending_open: None,
            route: Route::Editor,
            previous_route: None,
            backend_status: BackendStatus::default(),
            runtime: None,
            metrics: Vec::new(),
            runtime_logs: Vec::new(),
            settings,
            app_state,
            selected_node: None,
            last_error: None,
            flow_name_edit,
            canvas_state: CanvasState::default(),
            palette_state: PaletteState::default(),
            inspector_state: InspectorState::default(),
            monitor_state: MonitorState::default(),
            settings_page_state: SettingsPageState::default(),
            unsaved_open: false,
            unsaved_state: UnsavedChangesState,
            validation_open: false,
            validation_state: ValidationResultsState,
        }
    }

    fn process_service_events(&mut self, ctx: &egui::Context) -> bool {
        let events = self.service.drain();
        let had_events = !events.is_empty();

        for event in events {
            match event {
                ServiceEvent::BackendStatus(status) => {
                    self.backend_status = status;
                    if status == BackendStatus::Connected {
                        self.last_error = None;
                    }
                }
                ServiceEvent::ComponentTypes(types) => {
                    tracing::info!("Received {} component types", types.len());
                    self.catalog = types;
                }
                ServiceEvent::ComponentTypesFailed(err) => {
                    self.last_error = Some(format!("Failed to load component catalog: {err}"));
                }
                ServiceEvent::ComponentSchema { type_id, schema } => {
                    self.schemas.insert(type_id, schema);
                }
                ServiceEvent::ComponentSchemaFailed { type_id, error } => {
                    tracing::warn!(%type_id, %error, "Schema fetch failed");
                    // The inspector falls back to the raw JSON editor
                    self.schemas.insert(type_id, None);
                    self.last_error = Some(format!("Schema fetch failed: {error}"));
                }
                ServiceEvent::FlowLoaded(flow) => {
                    self.open_flow(flow);
                }
                ServiceEvent::FlowLoadFailed { flow_id, error } => {
                    tracing::warn!(%flow_id, %error, "Flow load failed");
                    if error.kind == ServiceErrorKind::Api {
                        self.app_state.remove_recent_flow(&flow_id);
                    }
                    self.last_error = Some(format!("Failed to load {flow_id}: {error}"));
                }
                ServiceEvent::SaveFinished { result } => {
                    let outcome = match result {
                        Ok(ack) => SaveOutcome::Success {
                            saved_at: ack.saved_at,
                            validation: ack.validation,
                        },
                        Err(err) => SaveOutcome::Failure {
                            message: err.message,
                        },
                    };
                    if let Some(ticket) = self.pending_ticket.take() {
                        let succeeded = matches!(outcome, SaveOutcome::Success { .. });
                        self.coordinator.complete_save(ticket, outcome);
                        if succeeded {
                            // The backend has the document now; poll it and
                            // put it in the recents list (imported flows
                            // start with neither)
                            self.service.set_polled_flow(Some(self.document.id.clone()));
                            self.app_state
                                .add_recent_flow(&self.document.id, &self.document.name);
                        }
                    }
                    if self.save_and_leave {
                        self.save_and_leave = false;
                        match self.coordinator.status() {
                            // The document is persisted; continue to where
                            // the user was headed
                            SaveStatus::Clean | SaveStatus::Draft => {
                                self.resume_blocked_intents(ctx);
                            }
                            // Failed, or new edits arrived mid-save: stay
                            _ => {
                                self.guard.cancel_navigation();
                                self.pending_open = None;
                            }
                        }
                    }
                }
                ServiceEvent::ControlFinished { action, result } => match result {
                    Ok(()) => {
                        tracing::info!(%action, "Runtime control acknowledged");
                        self.service.fetch_runtime_status(self.document.id.clone());
                    }
                    Err(err) => {
                        self.last_error = Some(format!("{} failed: {err}", action.label()));
                    }
                },
                ServiceEvent::RuntimeStatus(report) => {
                    self.runtime = Some(report.info);
                    for sample in report.metrics {
                        let newer = self
                            .metrics
                            .last()
                            .map_or(true, |last| last.timestamp < sample.timestamp);
                        if newer {
                            self.metrics.push(sample);
                        }
                    }
                    if self.metrics.len() > MAX_METRICS_SAMPLES {
                        let excess = self.metrics.len() - MAX_METRICS_SAMPLES;
                        self.metrics.drain(..excess);
                    }
                    self.runtime_logs = report.recent_logs;
                    if self.runtime_logs.len() > self.settings.max_log_lines {
                        let excess = self.runtime_logs.len() - self.settings.max_log_lines;
                        self.runtime_logs.drain(..excess);
                    }
                }
                ServiceEvent::RuntimeStatusFailed(err) => {
                    tracing::debug!(%err, "Runtime status poll failed");
                }
                ServiceEvent::Shutdown => {
                    tracing::info!("Service worker shut down");
                }
            }
        }

        had_events
    }

    /// Replace the open document and reset everything tracking the old one
    fn adopt_document(&mut self, flow: FlowGraph) {
        self.flow_name_edit = flow.name.clone();
        self.document = flow;
        self.lint = lint_graph(&self.document);
        self.selected_node = None;
        self.canvas_state.reset_interaction();
        self.inspector_state = InspectorState::default();
        self.coordinator.reset();
        self.pending_ticket = None;
        self.pending_open = None;
        self.runtime = None;
        self.metrics.clear();
        self.runtime_logs.clear();
    }

    /// A flow arrived from the backend
    fn open_flow(&mut self, flow: FlowGraph) {
        tracing::info!(flow_id = %flow.id, name = %flow.name, "Flow loaded");
        self.service.set_polled_flow(Some(flow.id.clone()));
        self.app_state.add_recent_flow(&flow.id, &flow.name);
        if let Err(e) = self.app_state.save() {
            tracing::warn!("Failed to save app state: {e}");
        }
        self.adopt_document(flow);
    }

    /// Replace the document with one read from disk
    ///
    /// The backend has not seen the imported document: it opens dirty,
    /// runtime polling stays off, and the first successful save arms both.
    fn import_flow_file(&mut self, path: &Path) {
        match FlowGraph::import_from_file(path) {
            Ok(flow) => {
                tracing::info!(path = %path.display(), flow_id = %flow.id, "Flow imported");
                self.service.set_polled_flow(None);
                self.adopt_document(flow);
                self.after_edit();
            }
            Err(e) => {
                tracing::warn!("Flow import failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Bookkeeping after every successful document mutation
    fn after_edit(&mut self) {
        self.coordinator.mark_dirty();
        self.lint = lint_graph(&self.document);
    }

    fn flow_valid(&self) -> bool {
        !self.lint.has_errors()
            && !self
                .coordinator
                .validation()
                .is_some_and(|v| v.has_errors())
    }

    fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::AddNode { type_id, position } => {
                let Some(component) = self.catalog.iter().find(|c| c.type_name == type_id)
                else {
                    self.last_error = Some(format!("Unknown component type {type_id}"));
                    return;
                };
                let id = self.document.add_node(component, position);
                self.selected_node = Some(id);
                self.after_edit();
            }
            AppAction::MoveNode { id, position } => {
                if self.document.move_node(id, position).is_ok() {
                    self.after_edit();
                }
            }
            AppAction::RemoveNode(id) => match self.document.remove_node(id) {
                Ok(node) => {
                    tracing::debug!(node = %node.name, "Node removed");
                    if self.selected_node == Some(id) {
                        self.selected_node = None;
                    }
                    let document = &self.document;
                    self.inspector_state
                        .prune(|node_id| document.node(node_id).is_some());
                    self.after_edit();
                }
                Err(e) => self.last_error = Some(e.to_string()),
            },
            AppAction::RenameNode { id, name } => match self.document.rename_node(id, name) {
                Ok(()) => self.after_edit(),
                Err(e) => self.last_error = Some(e.to_string()),
            },
            AppAction::RenameFlow(name) => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    self.last_error = Some("flow name cannot be empty".to_string());
                    self.flow_name_edit = self.document.name.clone();
                } else if trimmed != self.document.name {
                    self.document.name = trimmed.to_string();
                    self.flow_name_edit = self.document.name.clone();
                    self.after_edit();
                }
            }
            AppAction::Connect {
                from,
                from_port,
                to,
                to_port,
            } => match self.document.connect(from, from_port, to, to_port) {
                Ok(_) => self.after_edit(),
                Err(e) => self.last_error = Some(e.to_string()),
            },
            AppAction::Disconnect(id) => match self.document.disconnect(id) {
                Ok(_) => {
                    if self.canvas_state.selected_connection == Some(id) {
                        self.canvas_state.selected_connection = None;
                    }
                    self.after_edit();
                }
                Err(e) => self.last_error = Some(e.to_string()),
            },
            AppAction::SetConfigValue { id, key, value } => {
                match self.document.set_node_config_value(id, key, value) {
                    Ok(()) => self.after_edit(),
                    Err(e) => self.last_error = Some(e.to_string()),
                }
            }
            AppAction::ApplyRawConfig { id, config } => {
                match self.document.set_node_config(id, config) {
                    Ok(()) => self.after_edit(),
                    Err(e) => self.last_error = Some(e.to_string()),
                }
            }
            AppAction::Save => {
                if let Some(ticket) = self.coordinator.begin_save() {
                    self.pending_ticket = Some(ticket);
                    self.service.save_flow(self.document.clone());
                }
            }
            AppAction::LoadFlow(flow_id) => {
                if self.coordinator.is_dirty() {
                    // Same prompt as route changes; the load is parked
                    // until the user decides
                    self.pending_open = Some(PendingOpen::Backend(flow_id));
                    self.unsaved_open = true;
                } else {
                    self.service.fetch_flow(flow_id);
                }
            }
            AppAction::ExportFlow(path) => match self.document.export_to_file(&path) {
                Ok(()) => tracing::info!(path = %path.display(), "Flow exported"),
                Err(e) => self.last_error = Some(e.to_string()),
            },
            AppAction::ImportFlow(path) => {
                if self.coordinator.is_dirty() {
                    self.pending_open = Some(PendingOpen::File(path));
                    self.unsaved_open = true;
                } else {
                    self.import_flow_file(&path);
                }
            }
            AppAction::RefreshCatalog => {
                self.service.fetch_component_types();
                self.inspector_state.clear_requested();
            }
            AppAction::FetchSchema(type_id) => {
                self.service.fetch_component_schema(type_id);
            }
            AppAction::Control(action) => {
                if action == RuntimeAction::Deploy && !self.flow_valid() {
                    return;
                }
                self.service.control(self.document.id.clone(), action);
            }
            AppAction::SetBackendUrl(base_url) => {
                tracing::info!(%base_url, "Backend URL changed");
                self.service.set_base_url(base_url.clone());
                self.app_state.backend_url = base_url;
                if let Err(e) = self.app_state.save() {
                    tracing::warn!("Failed to save app state: {e}");
                }
                // Everything cached came from the old backend
                self.schemas.clear();
                self.inspector_state.clear_requested();
                self.service.fetch_component_types();
            }
            AppAction::SetPollInterval(seconds) => {
                self.service.set_poll_interval(seconds);
            }
            AppAction::Navigate(route) => self.try_navigate(route),
            AppAction::NavigateBack => {
                if let Some(previous) = self.previous_route {
                    self.try_navigate(previous);
                }
            }
            AppAction::FocusNode(id) => {
                self.selected_node = Some(id);
                self.try_navigate(Route::Editor);
            }
            AppAction::OpenDialog(dialog_id) => match dialog_id {
                DialogId::UnsavedChanges => self.unsaved_open = true,
                DialogId::ValidationResults => self.validation_open = true,
            },
        }
    }

    /// Route a navigation attempt through the guard
    fn try_navigate(&mut self, destination: Route) {
        if destination == self.route {
            return;
        }
        match self
            .guard
            .intercept(Some(&destination), self.coordinator.status())
        {
            GuardDecision::Proceed => {
                self.previous_route = Some(self.route);
                self.route = destination;
            }
            GuardDecision::Blocked => {
                self.unsaved_open = true;
            }
        }
    }

    /// Release whatever was parked behind the unsaved-changes prompt
    fn resume_blocked_intents(&mut self, ctx: &egui::Context) {
        if let Some(destination) = self.guard.allow_navigation() {
            match destination {
                // Re-issue the close; the armed latch lets it through
                Route::Exit => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
                other => self.try_navigate(other),
            }
        }
        match self.pending_open.take() {
            Some(PendingOpen::Backend(flow_id)) => self.service.fetch_flow(flow_id),
            Some(PendingOpen::File(path)) => self.import_flow_file(&path),
            None => {}
        }
    }

    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        use egui::Key;

        let mut save = false;
        ctx.input(|i| {
            if i.key_pressed(Key::S) && i.modifiers.command_only() {
                save = true;
            }
        });

        if save {
            self.handle_action(AppAction::Save);
        }
    }

    fn render_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Save").clicked() {
                        self.handle_action(AppAction::Save);
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Export Flow...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .set_title("Export Flow")
                            .set_file_name(format!("{}.json", self.document.id))
                            .add_filter("Flow JSON", &["json"])
                            .save_file()
                        {
                            self.handle_action(AppAction::ExportFlow(path));
                        }
                        ui.close();
                    }
                    if ui.button("Import Flow...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .set_title("Import Flow")
                            .add_filter("Flow JSON", &["json"])
                            .pick_file()
                        {
                            self.handle_action(AppAction::ImportFlow(path));
                        }
                        ui.close();
                    }
                    ui.separator();
                    let recents: Vec<(String, String)> = self
                        .app_state
                        .recent_flows
                        .iter()
                        .map(|f| (f.id.clone(), f.name.clone()))
                        .collect();
                    if recents.is_empty() {
                        ui.add_enabled(false, egui::Button::new("No recent flows"));
                    }
                    for (id, name) in recents {
                        if ui.button(name).clicked() {
                            self.handle_action(AppAction::LoadFlow(id));
                            ui.close();
                        }
                    }
                });

                ui.menu_button("View", |ui| {
                    for route in [Route::Editor, Route::Monitor, Route::Settings] {
                        if ui.button(route.label()).clicked() {
                            self.handle_action(AppAction::Navigate(route));
                            ui.close();
                        }
                    }
                });

                ui.separator();

                // Flow name, editable in place
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.flow_name_edit).desired_width(180.0),
                );
                if response.lost_focus() && self.flow_name_edit != self.document.name {
                    let name = self.flow_name_edit.clone();
                    self.handle_action(AppAction::RenameFlow(name));
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let (color, text) = match self.backend_status {
                        BackendStatus::Connected => (Color32::GREEN, "Connected"),
                        BackendStatus::Connecting => (Color32::YELLOW, "Connecting..."),
                        BackendStatus::Disconnected => (Color32::GRAY, "Disconnected"),
                        BackendStatus::Error => (Color32::RED, "Error"),
                    };
                    ui.colored_label(color, text);
                });
            });
        });
    }

    fn render_unsaved_dialog(&mut self, ctx: &egui::Context) {
        let dialog_ctx = UnsavedChangesContext {
            destination: self.guard.pending(),
            can_save: self.backend_status == BackendStatus::Connected,
        };

        if let Some(action) = show_dialog::<UnsavedChangesDialog>(
            ctx,
            &mut self.unsaved_open,
            &mut self.unsaved_state,
            dialog_ctx,
        ) {
            use dialogs::UnsavedChangesAction;
            match action {
                UnsavedChangesAction::SaveThenLeave => {
                    self.save_and_leave = true;
                    self.handle_action(AppAction::Save);
                }
                UnsavedChangesAction::DiscardAndLeave => {
                    self.resume_blocked_intents(ctx);
                }
                UnsavedChangesAction::Stay => {
                    self.guard.cancel_navigation();
                    self.pending_open = None;
                }
            }
        }

        // With no dialog on screen and no save-then-leave in flight, a
        // parked navigation has no way to resolve; drop it
        if !self.unsaved_open && !self.save_and_leave {
            if self.guard.is_blocking() {
                self.guard.cancel_navigation();
            }
            self.pending_open = None;
        }
    }

    fn render_validation_dialog(&mut self, ctx: &egui::Context) {
        let dialog_ctx = ValidationResultsContext {
            server_validation: self.coordinator.validation(),
            lint: &self.lint,
        };

        if let Some(action) = show_dialog::<ValidationResultsDialog>(
            ctx,
            &mut self.validation_open,
            &mut self.validation_state,
            dialog_ctx,
        ) {
            match action {
                ValidationResultsAction::FocusComponent(name) => {
                    let id = self
                        .document
                        .nodes()
                        .iter()
                        .find(|n| n.name == name)
                        .map(|n| n.id);
                    if let Some(id) = id {
                        self.handle_action(AppAction::FocusNode(id));
                    }
                }
            }
        }
    }
}

impl eframe::App for FlowStudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let had_events = self.process_service_events(ctx);
        self.handle_keyboard_shortcuts(ctx);

        if had_events {
            ctx.request_repaint();
        }
        // Keep draining worker events and ticking the autosave delay while
        // anything is pending
        if self.backend_status == BackendStatus::Connected
            || self.coordinator.is_dirty()
            || self.pending_ticket.is_some()
        {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        if self.settings.autosave_enabled
            && self
                .coordinator
                .autosave_due(Instant::now(), self.settings.autosave_delay())
        {
            tracing::debug!("Autosave triggered");
            self.handle_action(AppAction::Save);
        }

        self.render_menu_bar(ctx);

        let save_state = self.coordinator.snapshot();
        let mut actions: Vec<AppAction> = Vec::new();

        {
            let mut shared = SharedState {
                service: &self.service,
                document: &self.document,
                catalog: &self.catalog,
                schemas: &self.schemas,
                lint: &self.lint,
                server_validation: self.coordinator.validation(),
                save: save_state,
                backend_status: self.backend_status,
                runtime: self.runtime.as_ref(),
                metrics: &self.metrics,
                runtime_logs: &self.runtime_logs,
                settings: &mut self.settings,
                app_state: &mut self.app_state,
                selected_node: &mut self.selected_node,
                last_error: &mut self.last_error,
            };

            egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
                actions.extend(status_bar::render_status_bar(ui, &shared));
            });

            match self.route {
                Route::Editor => {
                    egui::SidePanel::left("component_palette")
                        .resizable(true)
                        .default_width(220.0)
                        .show(ctx, |ui| {
                            actions.extend(palette::render(
                                &mut self.palette_state,
                                &mut shared,
                                ui,
                            ));
                        });
                    egui::SidePanel::right("node_inspector")
                        .resizable(true)
                        .default_width(300.0)
                        .show(ctx, |ui| {
                            actions.extend(inspector::render(
                                &mut self.inspector_state,
                                &mut shared,
                                ui,
                            ));
                        });
                    egui::CentralPanel::default().show(ctx, |ui| {
                        actions.extend(canvas::render(&mut self.canvas_state, &mut shared, ui));
                    });
                }
                Route::Monitor => {
                    egui::CentralPanel::default().show(ctx, |ui| {
                        actions.extend(monitor::render(&mut self.monitor_state, &mut shared, ui));
                    });
                }
                Route::Settings => {
                    egui::CentralPanel::default().show(ctx, |ui| {
                        actions.extend(settings_page::render(
                            &mut self.settings_page_state,
                            &mut shared,
                            ui,
                        ));
                    });
                }
                // Not a page; the guard resolves it into a window close
                Route::Exit => {}
            }
        }

        for action in actions {
            self.handle_action(action);
        }

        self.render_unsaved_dialog(ctx);
        self.render_validation_dialog(ctx);

        // Window close goes through the same guard as route changes
        if ctx.input(|i| i.viewport().close_requested()) {
            match self
                .guard
                .intercept(Some(&Route::Exit), self.coordinator.status())
            {
                GuardDecision::Proceed => {}
                GuardDecision::Blocked => {
                    ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                    self.unsaved_open = true;
                }
            }
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.service.shutdown();

        if let Err(e) = self.app_state.save() {
            tracing::warn!("Failed to save app state: {e}");
        }
        if let Err(e) = self.settings.save() {
            tracing::warn!("Failed to save settings: {e}");
        }
    }
}
