//! Settings page — editor behavior, backend connection and appearance.
//!
//! Edits apply immediately; both files are written back on exit.

use egui::{Color32, RichText, Ui};

use crate::config::settings::{AUTOSAVE_DELAY_RANGE, POLL_INTERVAL_RANGE};
use crate::editor::state::{AppAction, SharedState};

/// State for the settings page.
#[derive(Default)]
pub struct SettingsPageState {
    /// Edit buffer for the backend URL, applied with the button.
    pub backend_url: String,
    synced: bool,
}

impl SettingsPageState {
    /// Refresh the URL buffer from app state, e.g. after an external change
    pub fn resync(&mut self) {
        self.synced = false;
    }
}

/// Render the settings page.
pub fn render(
    state: &mut SettingsPageState,
    shared: &mut SharedState<'_>,
    ui: &mut Ui,
) -> Vec<AppAction> {
    let mut actions = Vec::new();

    if !state.synced {
        state.backend_url = shared.app_state.backend_url.clone();
        state.synced = true;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.heading("Editor");
        ui.separator();
        egui::Grid::new("settings_editor")
            .num_columns(2)
            .spacing([10.0, 8.0])
            .show(ui, |ui| {
                ui.label("Autosave:");
                ui.checkbox(&mut shared.settings.autosave_enabled, "Save after edits pause");
                ui.end_row();

                ui.label("Autosave delay:");
                ui.add_enabled(
                    shared.settings.autosave_enabled,
                    egui::DragValue::new(&mut shared.settings.autosave_delay_secs)
                        .range(AUTOSAVE_DELAY_RANGE.0..=AUTOSAVE_DELAY_RANGE.1)
                        .speed(0.1)
                        .suffix(" s"),
                );
                ui.end_row();

                ui.label("Log lines kept:");
                ui.add(
                    egui::DragValue::new(&mut shared.settings.max_log_lines)
                        .range(50..=2000)
                        .speed(10),
                );
                ui.end_row();
            });

        ui.add_space(16.0);
        ui.heading("Backend");
        ui.separator();
        egui::Grid::new("settings_backend")
            .num_columns(2)
            .spacing([10.0, 8.0])
            .show(ui, |ui| {
                ui.label("Base URL:");
                ui.horizontal(|ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut state.backend_url).desired_width(240.0),
                    );
                    let changed = state.backend_url != shared.app_state.backend_url;
                    if ui.add_enabled(changed, egui::Button::new("Apply")).clicked() {
                        actions.push(AppAction::SetBackendUrl(state.backend_url.clone()));
                    }
                });
                ui.end_row();

                ui.label("Status poll interval:");
                let response = ui.add(
                    egui::DragValue::new(&mut shared.settings.runtime_poll_interval_secs)
                        .range(POLL_INTERVAL_RANGE.0..=POLL_INTERVAL_RANGE.1)
                        .speed(0.1)
                        .suffix(" s"),
                );
                if response.changed() {
                    actions.push(AppAction::SetPollInterval(
                        shared.settings.runtime_poll_interval_secs,
                    ));
                }
                ui.end_row();
            });

        ui.add_space(16.0);
        ui.heading("Appearance");
        ui.separator();
        egui::Grid::new("settings_appearance")
            .num_columns(2)
            .spacing([10.0, 8.0])
            .show(ui, |ui| {
                let prefs = &mut shared.app_state.ui_preferences;

                ui.label("Theme:");
                if ui.checkbox(&mut prefs.dark_mode, "Dark mode").changed() {
                    ui.ctx().set_visuals(if prefs.dark_mode {
                        egui::Visuals::dark()
                    } else {
                        egui::Visuals::light()
                    });
                }
                ui.end_row();

                ui.label("UI scale:");
                let response = ui.add(
                    egui::DragValue::new(&mut prefs.font_scale)
                        .range(0.5..=2.0)
                        .speed(0.05),
                );
                if response.changed() {
                    ui.ctx().set_zoom_factor(prefs.font_scale);
                }
                ui.end_row();

                ui.label("Canvas grid:");
                ui.checkbox(&mut prefs.show_canvas_grid, "Show background grid");
                ui.end_row();

                ui.label("Window:");
                ui.checkbox(&mut prefs.remember_window_state, "Remember size and position");
                ui.end_row();
            });

        ui.add_space(16.0);
        ui.heading("Recent Flows");
        ui.separator();
        render_recent_flows(shared, ui, &mut actions);
    });

    actions
}

fn render_recent_flows(shared: &mut SharedState<'_>, ui: &mut Ui, actions: &mut Vec<AppAction>) {
    if shared.app_state.recent_flows.is_empty() {
        ui.label(RichText::new("No flows opened yet").color(Color32::GRAY));
        return;
    }

    let mut remove_id = None;
    for flow in &shared.app_state.recent_flows {
        ui.horizontal(|ui| {
            if ui.link(&flow.name).clicked() {
                actions.push(AppAction::LoadFlow(flow.id.clone()));
            }
            if let Some(opened) = chrono::DateTime::from_timestamp(flow.last_opened as i64, 0) {
                ui.label(
                    RichText::new(
                        opened
                            .with_timezone(&chrono::Local)
                            .format("%Y-%m-%d %H:%M")
                            .to_string(),
                    )
                    .small()
                    .color(Color32::GRAY),
                );
            }
            if ui
                .small_button("✖")
                .on_hover_text("Remove from recents")
                .clicked()
            {
                remove_id = Some(flow.id.clone());
            }
        });
    }
    if let Some(id) = remove_id {
        shared.app_state.remove_recent_flow(&id);
    }
}
