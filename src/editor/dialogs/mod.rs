//! Dialog machinery shared by the editor's modal prompts.
//!
//! A dialog is a stateless-or-nearly-stateless window that interrupts the
//! page flow: it renders from borrowed context, returns a verdict, and is
//! torn down by [`show_dialog`] when that verdict says to close. Dialogs
//! never mutate the app directly; the caller maps the returned action onto
//! [`AppAction`](crate::editor::AppAction) handling.

use egui::{Align2, Context, Ui};

/// Verdict a dialog returns from one frame of rendering
#[derive(Debug, Clone)]
pub enum DialogAction<A> {
    /// Nothing happened; keep the dialog open
    None,
    /// Close without doing anything
    Close,
    /// Close and hand the action to the caller
    CloseWithAction(A),
    /// Hand the action to the caller but stay open
    Action(A),
}

impl<A> DialogAction<A> {
    pub fn should_close(&self) -> bool {
        matches!(self, DialogAction::Close | DialogAction::CloseWithAction(_))
    }

    pub fn into_action(self) -> Option<A> {
        match self {
            DialogAction::CloseWithAction(a) | DialogAction::Action(a) => Some(a),
            _ => None,
        }
    }
}

/// Per-dialog state kept between frames
///
/// [`show_dialog`] resets the state whenever the dialog closes, so a fresh
/// open never sees leftovers from the previous one.
pub trait DialogState: Default {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// How a dialog's window is laid out
#[derive(Debug, Clone, Copy)]
pub struct DialogWindowConfig {
    pub width: f32,
    /// `None` sizes the window to its content
    pub height: Option<f32>,
    pub resizable: bool,
    /// Anchor to the screen center instead of floating free
    pub centered: bool,
}

impl DialogWindowConfig {
    /// A small fixed prompt, centered; for yes/no style decisions
    pub fn prompt(width: f32) -> Self {
        Self {
            width,
            height: None,
            resizable: false,
            centered: true,
        }
    }

    /// A resizable window for scrollable content
    pub fn scrollable(width: f32, height: f32) -> Self {
        Self {
            width,
            height: Some(height),
            resizable: true,
            centered: false,
        }
    }
}

/// One dialog: its state, the action it can produce, and the context it
/// renders from
///
/// ```ignore
/// struct ConfirmRemoveDialog;
///
/// impl Dialog for ConfirmRemoveDialog {
///     type State = ConfirmRemoveState;
///     type Action = ConfirmRemoveAction;
///     type Context<'a> = &'a FlowNode;
///
///     fn title(_state: &Self::State) -> &'static str {
///         "Remove Node"
///     }
///
///     fn window_config() -> DialogWindowConfig {
///         DialogWindowConfig::prompt(320.0)
///     }
///
///     fn render(state: &mut Self::State, node: &FlowNode, ui: &mut Ui)
///         -> DialogAction<Self::Action> {
///         // buttons return DialogAction::CloseWithAction(..)
///         DialogAction::None
///     }
/// }
/// ```
pub trait Dialog {
    type State: DialogState;
    type Action;
    type Context<'a>;

    fn title(state: &Self::State) -> &'static str;

    fn window_config() -> DialogWindowConfig;

    fn render(
        state: &mut Self::State,
        ctx: Self::Context<'_>,
        ui: &mut Ui,
    ) -> DialogAction<Self::Action>;
}

/// Drive one dialog for one frame
///
/// Renders nothing unless `is_open`. When the dialog's verdict closes it,
/// `is_open` is cleared and the state reset; any carried action is handed
/// back to the caller either way.
pub fn show_dialog<D: Dialog>(
    ctx: &Context,
    is_open: &mut bool,
    state: &mut D::State,
    dialog_ctx: D::Context<'_>,
) -> Option<D::Action> {
    if !*is_open {
        return None;
    }

    let config = D::window_config();
    let mut window = egui::Window::new(D::title(state))
        .collapsible(false)
        .resizable(config.resizable)
        .default_width(config.width);
    if let Some(height) = config.height {
        window = window.default_height(height);
    }
    if config.centered {
        window = window.anchor(Align2::CENTER_CENTER, [0.0, 0.0]);
    }

    let verdict = window
        .show(ctx, |ui| D::render(state, dialog_ctx, ui))
        .and_then(|response| response.inner)
        .unwrap_or(DialogAction::None);

    if verdict.should_close() {
        *is_open = false;
        state.reset();
    }
    verdict.into_action()
}

pub mod unsaved_changes;
pub mod validation_results;

pub use unsaved_changes::{
    UnsavedChangesAction, UnsavedChangesContext, UnsavedChangesDialog, UnsavedChangesState,
};
pub use validation_results::{
    ValidationResultsAction, ValidationResultsContext, ValidationResultsDialog,
    ValidationResultsState,
};
