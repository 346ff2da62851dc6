//! Unsaved changes confirmation dialog
//!
//! Shown when navigation away from the editor is blocked by unsaved work.
//! The blocked destination is parked in the navigation guard; this dialog
//! only decides what happens to the pending edits.

use super::{Dialog, DialogAction, DialogState, DialogWindowConfig};
use crate::editor::Route;
use egui::{Color32, Ui};

/// State for the unsaved changes dialog (nothing to carry between frames)
#[derive(Debug, Default)]
pub struct UnsavedChangesState;

impl DialogState for UnsavedChangesState {}

/// Action from the unsaved changes dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedChangesAction {
    /// Save first, then continue to the blocked destination once the
    /// backend confirms
    SaveThenLeave,
    /// Leave without saving; the edits stay in memory but are not persisted
    DiscardAndLeave,
    /// Stay on the editor and drop the pending navigation
    Stay,
}

/// Context for rendering the dialog
pub struct UnsavedChangesContext<'a> {
    /// Where the user was headed
    pub destination: Option<&'a Route>,
    /// Whether the backend is currently reachable; saving is pointless
    /// while it is not
    pub can_save: bool,
}

/// The unsaved changes dialog
pub struct UnsavedChangesDialog;

impl Dialog for UnsavedChangesDialog {
    type State = UnsavedChangesState;
    type Action = UnsavedChangesAction;
    type Context<'a> = UnsavedChangesContext<'a>;

    fn title(_state: &Self::State) -> &'static str {
        "Unsaved Changes"
    }

    fn window_config() -> DialogWindowConfig {
        DialogWindowConfig::prompt(380.0)
    }

    fn render(
        _state: &mut Self::State,
        ctx: Self::Context<'_>,
        ui: &mut Ui,
    ) -> DialogAction<Self::Action> {
        match ctx.destination {
            Some(Route::Exit) => {
                ui.label("This flow has unsaved changes.");
                ui.label("Save before closing Flow Studio?");
            }
            Some(route) => {
                ui.label("This flow has unsaved changes.");
                ui.label(format!("Save before leaving for {}?", route.label()));
            }
            None => {
                ui.label("This flow has unsaved changes.");
            }
        }

        if !ctx.can_save {
            ui.add_space(4.0);
            ui.colored_label(
                Color32::from_rgb(230, 160, 60),
                "The backend is unreachable; saving will likely fail.",
            );
        }

        ui.separator();

        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                return DialogAction::CloseWithAction(UnsavedChangesAction::SaveThenLeave);
            }
            if ui.button("Discard").clicked() {
                return DialogAction::CloseWithAction(UnsavedChangesAction::DiscardAndLeave);
            }
            if ui.button("Cancel").clicked() {
                return DialogAction::CloseWithAction(UnsavedChangesAction::Stay);
            }
            DialogAction::None
        })
        .inner
    }
}
