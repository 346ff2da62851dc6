//! Status bar panel — bottom bar showing save status, runtime state, and
//! backend connectivity.
//!
//! Sits below the active page. The single runtime lifecycle button lives
//! here so it stays visible regardless of the current page.

use egui::{Color32, RichText, Ui};

use crate::editor::save::SaveStatus;
use crate::editor::state::{AppAction, DialogId};
use crate::editor::SharedState;
use crate::types::{available_runtime_action, BackendStatus, RuntimeState};

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, shared: &SharedState<'_>) -> Vec<AppAction> {
    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        // === Save status dot + text ===
        let (save_color, save_text) = match shared.save.status {
            SaveStatus::Clean => (Color32::GREEN, "Saved"),
            SaveStatus::Dirty => (Color32::YELLOW, "Unsaved changes"),
            SaveStatus::Draft => (Color32::from_rgb(230, 160, 60), "Draft"),
            SaveStatus::Saving => (Color32::LIGHT_BLUE, "Saving..."),
            SaveStatus::Error => (Color32::RED, "Save failed"),
        };
        ui.colored_label(save_color, "●");
        ui.label(RichText::new(save_text).small());
        if let Some(saved_at) = shared.save.last_saved {
            let local = saved_at.with_timezone(&chrono::Local);
            ui.label(
                RichText::new(format!("at {}", local.format("%H:%M:%S")))
                    .small()
                    .color(Color32::GRAY),
            );
        }

        ui.separator();

        // === Validation issues badge ===
        let issue_count = shared
            .server_validation
            .map(|v| v.issue_count())
            .unwrap_or(0)
            + shared.lint.issue_count();
        if issue_count > 0 {
            let badge_color = if !shared.is_flow_valid() {
                Color32::LIGHT_RED
            } else {
                Color32::from_rgb(230, 180, 60)
            };
            let badge = ui.add(
                egui::Button::new(
                    RichText::new(format!("⚠ {issue_count} issue(s)"))
                        .small()
                        .color(badge_color),
                )
                .small(),
            );
            if badge.on_hover_text("Show validation results").clicked() {
                actions.push(AppAction::OpenDialog(DialogId::ValidationResults));
            }
        } else {
            ui.label(RichText::new("No issues").small().color(Color32::GRAY));
        }

        ui.separator();

        // === Runtime state + lifecycle button ===
        let state = shared.runtime.map(|r| r.state).unwrap_or_default();
        let state_color = match state {
            RuntimeState::Running => Color32::GREEN,
            RuntimeState::DeployedStopped => Color32::YELLOW,
            RuntimeState::NotDeployed => Color32::GRAY,
            RuntimeState::Error => Color32::RED,
        };
        ui.colored_label(state_color, "●");
        ui.label(RichText::new(state.to_string()).small());

        if let Some((action, enabled)) = available_runtime_action(state, shared.is_flow_valid()) {
            let button = ui.add_enabled(enabled, egui::Button::new(action.label()).small());
            let button = if enabled {
                button
            } else {
                button.on_disabled_hover_text("Fix validation errors before deploying")
            };
            if button.clicked() {
                actions.push(AppAction::Control(action));
            }
        }

        ui.separator();

        // === Backend connectivity ===
        let backend_color = match shared.backend_status {
            BackendStatus::Connected => Color32::GREEN,
            BackendStatus::Connecting => Color32::YELLOW,
            BackendStatus::Disconnected => Color32::GRAY,
            BackendStatus::Error => Color32::RED,
        };
        ui.colored_label(backend_color, "●");
        ui.label(RichText::new(shared.backend_status.to_string()).small());

        // === Error message (right-aligned) ===
        let error_text = shared
            .save
            .error
            .as_deref()
            .or(shared.last_error.as_deref());
        if let Some(error) = error_text {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.colored_label(Color32::RED, RichText::new(error).small());
            });
        }
    });

    actions
}
