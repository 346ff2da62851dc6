//! Component palette — left side panel listing the component catalog.
//!
//! Components are grouped by category in palette order (sources first,
//! sinks last). Clicking an entry places a new node on the canvas.

use egui::Ui;

use crate::editor::state::{AppAction, SharedState};
use crate::flow::{CanvasPos, ComponentCategory};

/// State for the component palette.
#[derive(Default)]
pub struct PaletteState {
    /// Filter text; matches name and registry key, case-insensitive.
    pub search: String,
}

/// Render the component palette.
pub fn render(
    state: &mut PaletteState,
    shared: &mut SharedState<'_>,
    ui: &mut Ui,
) -> Vec<AppAction> {
    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        ui.heading("Components");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.small_button("⟳").on_hover_text("Refresh catalog").clicked() {
                actions.push(AppAction::RefreshCatalog);
            }
        });
    });

    ui.add(
        egui::TextEdit::singleline(&mut state.search)
            .hint_text("Search...")
            .desired_width(f32::INFINITY),
    );
    ui.separator();

    if shared.catalog.is_empty() {
        ui.label("Waiting for the component catalog...");
        return actions;
    }

    let query = state.search.to_lowercase();

    egui::ScrollArea::vertical().show(ui, |ui| {
        for category in ComponentCategory::ALL {
            let entries: Vec<_> = shared
                .catalog
                .iter()
                .filter(|c| c.category == category)
                .filter(|c| {
                    query.is_empty()
                        || c.name.to_lowercase().contains(&query)
                        || c.type_name.to_lowercase().contains(&query)
                })
                .collect();
            if entries.is_empty() {
                continue;
            }

            egui::CollapsingHeader::new(category.label())
                .default_open(true)
                .show(ui, |ui| {
                    for component in entries {
                        let button = ui.add(
                            egui::Button::new(&component.name)
                                .min_size(egui::Vec2::new(ui.available_width(), 0.0)),
                        );
                        let button = if component.description.is_empty() {
                            button
                        } else {
                            button.on_hover_text(format!(
                                "{}\n({} v{})",
                                component.description, component.type_name, component.version
                            ))
                        };
                        if button.clicked() {
                            actions.push(AppAction::AddNode {
                                type_id: component.type_name.clone(),
                                position: next_free_position(shared),
                            });
                        }
                    }
                });
        }
    });

    actions
}

/// Cascading placement for newly added nodes
///
/// Documents carry their layout, so only fresh nodes need a position.
/// Stepping diagonally keeps consecutive additions from stacking.
fn next_free_position(shared: &SharedState<'_>) -> CanvasPos {
    let n = shared.document.node_count() as f32;
    CanvasPos::new(80.0 + 36.0 * n, 80.0 + 28.0 * n)
}
