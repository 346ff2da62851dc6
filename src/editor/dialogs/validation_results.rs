//! Validation results dialog
//!
//! Lists the findings from the last save alongside the local structural
//! lint. Clicking a finding jumps to the offending node on the canvas.

use super::{Dialog, DialogAction, DialogState, DialogWindowConfig};
use crate::flow::{IssueSeverity, ValidationIssue, ValidationResult};
use egui::{Color32, RichText, Ui};

/// State for the validation results dialog (nothing to carry between frames)
#[derive(Debug, Default)]
pub struct ValidationResultsState;

impl DialogState for ValidationResultsState {}

/// Action from the validation results dialog
#[derive(Debug, Clone)]
pub enum ValidationResultsAction {
    /// Select the named component and jump to the editor page
    FocusComponent(String),
}

/// Context for rendering the dialog
pub struct ValidationResultsContext<'a> {
    /// Verdict from the last completed save, if any
    pub server_validation: Option<&'a ValidationResult>,
    /// Local structural lint
    pub lint: &'a ValidationResult,
}

/// The validation results dialog
pub struct ValidationResultsDialog;

impl Dialog for ValidationResultsDialog {
    type State = ValidationResultsState;
    type Action = ValidationResultsAction;
    type Context<'a> = ValidationResultsContext<'a>;

    fn title(_state: &Self::State) -> &'static str {
        "Validation Results"
    }

    fn window_config() -> DialogWindowConfig {
        DialogWindowConfig::scrollable(460.0, 380.0)
    }

    fn render(
        _state: &mut Self::State,
        ctx: Self::Context<'_>,
        ui: &mut Ui,
    ) -> DialogAction<Self::Action> {
        let mut result = DialogAction::None;

        match ctx.server_validation {
            Some(validation) if !validation.is_clean() => {
                ui.label(format!(
                    "The backend reported {} error(s) and {} warning(s) on the last save.",
                    validation.errors.len(),
                    validation.warnings.len()
                ));
            }
            Some(_) => {
                ui.colored_label(Color32::from_rgb(100, 200, 100), "The last save was clean.");
            }
            None => {
                ui.label("The flow has not been saved yet; only local checks are shown.");
            }
        }

        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            if let Some(validation) = ctx.server_validation {
                for issue in validation.iter() {
                    if let Some(action) = render_issue(ui, issue) {
                        result = DialogAction::CloseWithAction(action);
                    }
                }
            }

            if !ctx.lint.is_clean() {
                ui.add_space(6.0);
                ui.label(RichText::new("Local checks").small().color(Color32::GRAY));
                for issue in ctx.lint.iter() {
                    if let Some(action) = render_issue(ui, issue) {
                        result = DialogAction::CloseWithAction(action);
                    }
                }
            }
        });

        ui.separator();
        if ui.button("Close").clicked() {
            result = DialogAction::Close;
        }

        result
    }
}

/// Render one finding; returns a focus action when its component link is clicked
fn render_issue(ui: &mut Ui, issue: &ValidationIssue) -> Option<ValidationResultsAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        let (icon, color) = match issue.severity {
            IssueSeverity::Error => ("✖", Color32::from_rgb(220, 80, 80)),
            IssueSeverity::Warning => ("⚠", Color32::from_rgb(230, 180, 60)),
        };
        ui.colored_label(color, icon);

        if ui.link(&issue.component_name).clicked() {
            action = Some(ValidationResultsAction::FocusComponent(
                issue.component_name.clone(),
            ));
        }
        if let Some(port) = &issue.port_name {
            ui.label(RichText::new(format!("[{port}]")).small().color(Color32::GRAY));
        }
        ui.label(&issue.message);
    });

    if !issue.suggestions.is_empty() {
        ui.indent((&issue.component_name, &issue.kind), |ui| {
            for suggestion in &issue.suggestions {
                ui.label(RichText::new(format!("→ {suggestion}")).small().italics());
            }
        });
    }

    action
}
