//! Inspector panel — schema-driven configuration form for the selected node.
//!
//! The form is generated from the component's property schema: each
//! property kind maps to exactly one widget, properties are grouped into
//! sections, and schema defaults fill in for values the node has not set.
//! Types without a schema (and descriptors that fail to parse) fall back
//! to a raw JSON editor over the node's whole config map.

use std::collections::{BTreeMap, HashMap, HashSet};

use egui::{Color32, RichText, Ui};
use serde_json::{json, Value};

use crate::editor::state::{AppAction, SharedState};
use crate::flow::{ComponentSchema, FlowNode, NodeId, PropertyKind, PropertySpec};

/// State for the inspector panel.
#[derive(Default)]
pub struct InspectorState {
    /// Rename buffer per node (applied on Enter or focus loss).
    pub rename_buffers: HashMap<NodeId, String>,
    /// Raw JSON buffer per node, for the schema-less fallback editor.
    pub raw_buffers: HashMap<NodeId, String>,
    /// Whether the raw buffer differs from the node config.
    pub raw_dirty: HashMap<NodeId, bool>,
    /// Parse error from the last raw apply attempt.
    pub raw_error: Option<String>,
    /// Schema requests already sent, to avoid refetching every frame.
    requested_schemas: HashSet<String>,
}

impl InspectorState {
    /// Drop per-node buffers that no longer have a node
    pub fn prune(&mut self, exists: impl Fn(NodeId) -> bool) {
        self.rename_buffers.retain(|id, _| exists(*id));
        self.raw_buffers.retain(|id, _| exists(*id));
        self.raw_dirty.retain(|id, _| exists(*id));
    }

    /// Forget which schemas were requested, e.g. after a catalog refresh
    pub fn clear_requested(&mut self) {
        self.requested_schemas.clear();
    }
}

/// Render the inspector panel.
pub fn render(
    state: &mut InspectorState,
    shared: &mut SharedState<'_>,
    ui: &mut Ui,
) -> Vec<AppAction> {
    let mut actions = Vec::new();

    ui.heading("Inspector");
    ui.separator();

    let Some(node_id) = *shared.selected_node else {
        ui.label("Select a node to edit its configuration.");
        return actions;
    };
    let Some(node) = shared.document.node(node_id) else {
        ui.label("Select a node to edit its configuration.");
        return actions;
    };

    // Header: component identity
    if let Some(component) = shared.component_for(&node.type_name) {
        ui.label(RichText::new(&component.name).strong());
        ui.label(
            RichText::new(format!(
                "{} v{} · {}",
                component.type_name,
                component.version,
                component.category.label()
            ))
            .small()
            .color(Color32::GRAY),
        );
        if !component.description.is_empty() {
            ui.label(RichText::new(&component.description).small());
        }
    } else {
        ui.label(RichText::new(&node.type_name).strong());
        ui.label(
            RichText::new("Type not present in the catalog")
                .small()
                .color(Color32::from_rgb(230, 160, 60)),
        );
    }
    ui.add_space(4.0);

    // Rename field, applied when the edit loses focus
    let rename_buffer = state
        .rename_buffers
        .entry(node_id)
        .or_insert_with(|| node.name.clone());
    ui.horizontal(|ui| {
        ui.label("Name:");
        let response = ui.text_edit_singleline(rename_buffer);
        if response.lost_focus() && *rename_buffer != node.name {
            actions.push(AppAction::RenameNode {
                id: node_id,
                name: rename_buffer.clone(),
            });
        }
    });
    ui.separator();

    // Schema lookup; fetch lazily on first selection
    match shared.schemas.get(&node.type_name) {
        None => {
            if state.requested_schemas.insert(node.type_name.clone()) {
                actions.push(AppAction::FetchSchema(node.type_name.clone()));
            }
            ui.label("Loading schema...");
        }
        Some(Some(schema)) => {
            egui::ScrollArea::vertical().show(ui, |ui| {
                render_schema_form(node, schema, ui, &mut actions);
            });
        }
        Some(None) => {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.label(
                    RichText::new("This component type has no schema; edit the raw config.")
                        .small()
                        .color(Color32::GRAY),
                );
                render_raw_editor(state, node, ui, &mut actions);
            });
        }
    }

    ui.separator();
    if ui.button("Remove Node").clicked() {
        actions.push(AppAction::RemoveNode(node_id));
    }

    actions
}

/// Render the grouped, schema-driven property form
fn render_schema_form(
    node: &FlowNode,
    schema: &ComponentSchema,
    ui: &mut Ui,
    actions: &mut Vec<AppAction>,
) {
    for (section, properties) in schema.grouped_properties() {
        egui::CollapsingHeader::new(section)
            .default_open(true)
            .show(ui, |ui| {
                egui::Grid::new(("inspector_section", node.id, section))
                    .num_columns(2)
                    .spacing([10.0, 8.0])
                    .show(ui, |ui| {
                        for (name, spec) in &properties {
                            render_property(node, name, spec, ui, actions);
                            ui.end_row();
                        }
                    });
            });
    }
}

/// Render one property row: label plus the widget for its kind
fn render_property(
    node: &FlowNode,
    name: &str,
    spec: &PropertySpec,
    ui: &mut Ui,
    actions: &mut Vec<AppAction>,
) {
    let label = ui.label(format!("{name}:"));
    if let Some(description) = &spec.description {
        label.on_hover_text(description);
    }

    // Effective value: the node's config entry, else the schema default
    let current = node
        .config
        .get(name)
        .cloned()
        .or_else(|| spec.default.clone());

    match spec.kind {
        PropertyKind::String => {
            let mut text = current.as_ref().and_then(value_as_text).unwrap_or_default();
            if ui
                .add(egui::TextEdit::singleline(&mut text).desired_width(f32::INFINITY))
                .changed()
            {
                actions.push(AppAction::SetConfigValue {
                    id: node.id,
                    key: name.to_string(),
                    value: Value::String(text),
                });
            }
        }
        PropertyKind::Number => {
            let mut value = current.as_ref().and_then(Value::as_f64).unwrap_or(0.0);
            let mut drag = egui::DragValue::new(&mut value).speed(0.1);
            if let (Some(min), Some(max)) = (spec.minimum, spec.maximum) {
                drag = drag.range(min..=max);
            }
            if ui.add(drag).changed() {
                actions.push(AppAction::SetConfigValue {
                    id: node.id,
                    key: name.to_string(),
                    value: json!(value),
                });
            }
        }
        PropertyKind::Integer => {
            let mut value = current.as_ref().and_then(Value::as_i64).unwrap_or(0);
            let mut drag = egui::DragValue::new(&mut value).speed(1);
            if let (Some(min), Some(max)) = (spec.minimum, spec.maximum) {
                drag = drag.range(min as i64..=max as i64);
            }
            if ui.add(drag).changed() {
                actions.push(AppAction::SetConfigValue {
                    id: node.id,
                    key: name.to_string(),
                    value: json!(value),
                });
            }
        }
        PropertyKind::Boolean => {
            let mut value = current.as_ref().and_then(Value::as_bool).unwrap_or(false);
            if ui.checkbox(&mut value, "").changed() {
                actions.push(AppAction::SetConfigValue {
                    id: node.id,
                    key: name.to_string(),
                    value: Value::Bool(value),
                });
            }
        }
        PropertyKind::Enum => {
            let selected = current
                .as_ref()
                .and_then(value_as_text)
                .unwrap_or_else(|| "(unset)".to_string());
            egui::ComboBox::from_id_salt(("inspector_enum", node.id, name))
                .selected_text(selected.clone())
                .show_ui(ui, |ui| {
                    for option in spec.enum_values.iter().flatten() {
                        if ui
                            .selectable_label(selected == *option, option)
                            .clicked()
                        {
                            actions.push(AppAction::SetConfigValue {
                                id: node.id,
                                key: name.to_string(),
                                value: Value::String(option.clone()),
                            });
                        }
                    }
                });
        }
        PropertyKind::Ports => {
            ui.vertical(|ui| {
                for field in spec.port_fields.iter().flatten() {
                    render_port_list(node, field, ui, actions);
                }
            });
        }
        PropertyKind::Object => {
            // Nested objects are edited as pretty-printed JSON
            let text = current
                .as_ref()
                .map(|v| serde_json::to_string_pretty(v).unwrap_or_default())
                .unwrap_or_else(|| "{}".to_string());
            let mut edited = text.clone();
            let response = ui.add(
                egui::TextEdit::multiline(&mut edited)
                    .code_editor()
                    .desired_rows(3)
                    .desired_width(f32::INFINITY)
                    .font(egui::TextStyle::Monospace),
            );
            if response.lost_focus() && edited != text {
                if let Ok(value) = serde_json::from_str::<Value>(&edited) {
                    actions.push(AppAction::SetConfigValue {
                        id: node.id,
                        key: name.to_string(),
                        value,
                    });
                }
            }
        }
    }
}

/// Editable list of port names stored under one config field
fn render_port_list(node: &FlowNode, field: &str, ui: &mut Ui, actions: &mut Vec<AppAction>) {
    let mut ports: Vec<String> = node
        .config
        .get(field)
        .and_then(|v| v.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| e.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    ui.label(RichText::new(field).small().color(Color32::GRAY));
    let mut changed = false;
    let mut remove_index = None;

    for (i, port) in ports.iter_mut().enumerate() {
        ui.horizontal(|ui| {
            if ui.text_edit_singleline(port).lost_focus() {
                changed = true;
            }
            if ui.small_button("✖").on_hover_text("Remove port").clicked() {
                remove_index = Some(i);
            }
        });
    }

    if let Some(i) = remove_index {
        ports.remove(i);
        changed = true;
    }
    if ui.small_button("+ Add port").clicked() {
        ports.push(format!("port_{}", ports.len() + 1));
        changed = true;
    }

    if changed {
        actions.push(AppAction::SetConfigValue {
            id: node.id,
            key: field.to_string(),
            value: json!(ports),
        });
    }
}

/// Raw JSON editor over the whole config map, for schema-less types
fn render_raw_editor(
    state: &mut InspectorState,
    node: &FlowNode,
    ui: &mut Ui,
    actions: &mut Vec<AppAction>,
) {
    let node_id = node.id;
    let buffer = state
        .raw_buffers
        .entry(node_id)
        .or_insert_with(|| pretty_config(node));

    let response = ui.add(
        egui::TextEdit::multiline(buffer)
            .code_editor()
            .desired_rows(10)
            .desired_width(f32::INFINITY)
            .font(egui::TextStyle::Monospace),
    );
    if response.changed() {
        state.raw_dirty.insert(node_id, true);
        state.raw_error = None;
    }

    let dirty = state.raw_dirty.get(&node_id).copied().unwrap_or(false);
    let mut apply = false;
    let mut revert = false;
    ui.horizontal(|ui| {
        apply = ui.button("Apply").clicked();
        revert = ui.button("Revert").clicked();
        if dirty {
            ui.label(RichText::new("(unapplied changes)").small());
        }
    });

    if apply {
        let text = state
            .raw_buffers
            .get(&node_id)
            .map(String::as_str)
            .unwrap_or("{}");
        match serde_json::from_str::<BTreeMap<String, Value>>(text) {
            Ok(config) => {
                actions.push(AppAction::ApplyRawConfig {
                    id: node_id,
                    config,
                });
                state.raw_dirty.insert(node_id, false);
                state.raw_error = None;
            }
            Err(e) => {
                // Invalid JSON never reaches the document
                state.raw_error = Some(format!("Invalid JSON: {e}"));
            }
        }
    }
    if revert {
        state.raw_buffers.insert(node_id, pretty_config(node));
        state.raw_dirty.insert(node_id, false);
        state.raw_error = None;
    }

    if let Some(error) = &state.raw_error {
        ui.colored_label(Color32::LIGHT_RED, error);
    }
}

fn pretty_config(node: &FlowNode) -> String {
    serde_json::to_string_pretty(&node.config).unwrap_or_else(|_| "{}".to_string())
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
