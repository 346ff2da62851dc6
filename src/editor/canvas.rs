//! Canvas page — visual display and editing of the flow graph.
//!
//! Renders the flow topology as a node graph using custom egui painting.
//! Supports:
//! - Viewing nodes and connections with pan/zoom
//! - Adding, moving, and removing nodes
//! - Wiring ports by clicking an output port and then an input port
//!
//! Node positions live in the document, so a flow reopens with its layout
//! intact. The canvas itself only keeps view state (pan, zoom, in-progress
//! drags).

use egui::{Color32, Pos2, Rect, Stroke, Ui, Vec2};

use crate::editor::state::{AppAction, SharedState};
use crate::flow::{CanvasPos, ComponentCategory, ConnectionId, FlowNode, NodeId};

const NODE_WIDTH: f32 = 150.0;
const NODE_HEIGHT: f32 = 54.0;
const PORT_RADIUS: f32 = 6.0;
const GRID_STEP: f32 = 32.0;

/// An output port click waiting for its input-port counterpart
#[derive(Debug, Clone)]
struct PendingConnection {
    from: NodeId,
    from_port: String,
    /// Screen position of the source port, for the rubber band
    start: Pos2,
}

/// View state for the canvas page.
pub struct CanvasState {
    /// Pan offset for the canvas.
    pub pan_offset: Vec2,
    /// Zoom level.
    pub zoom: f32,
    /// Selected connection (for deletion).
    pub selected_connection: Option<ConnectionId>,
    /// Output port clicked, waiting for an input port.
    pending_connection: Option<PendingConnection>,
    /// Node being dragged (node id, offset from pointer to node pos in world coords).
    dragging_node: Option<(NodeId, Vec2)>,
    /// Currently hovered node (for the lint tooltip).
    hovered_node: Option<NodeId>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            pan_offset: Vec2::ZERO,
            zoom: 1.0,
            selected_connection: None,
            pending_connection: None,
            dragging_node: None,
            hovered_node: None,
        }
    }
}

impl CanvasState {
    /// Forget in-progress interactions, e.g. when a different flow loads
    pub fn reset_interaction(&mut self) {
        self.pending_connection = None;
        self.dragging_node = None;
        self.selected_connection = None;
        self.hovered_node = None;
    }
}

/// Render the canvas page.
pub fn render(
    state: &mut CanvasState,
    shared: &mut SharedState<'_>,
    ui: &mut Ui,
) -> Vec<AppAction> {
    let mut actions = Vec::new();

    let available = ui.available_rect_before_wrap();
    let (response, painter) =
        ui.allocate_painter(available.size(), egui::Sense::click_and_drag());
    let canvas_rect = response.rect;

    painter.rect_filled(canvas_rect, 0.0, Color32::from_gray(30));

    // Handle pan (middle mouse or shift+drag)
    if response.dragged_by(egui::PointerButton::Middle)
        || (response.dragged_by(egui::PointerButton::Primary)
            && ui.input(|i| i.modifiers.shift)
            && state.dragging_node.is_none())
    {
        state.pan_offset += response.drag_delta();
    }

    // Handle zoom (scroll)
    if response.hovered() {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta != 0.0 {
            let factor = 1.0 + scroll_delta * 0.002;
            state.zoom = (state.zoom * factor).clamp(0.25, 4.0);
        }
    }

    let origin = canvas_rect.min.to_vec2() + state.pan_offset;

    if shared.app_state.ui_preferences.show_canvas_grid {
        draw_grid(&painter, canvas_rect, origin, state.zoom);
    }

    if shared.document.is_empty() {
        painter.text(
            canvas_rect.center(),
            egui::Align2::CENTER_CENTER,
            "Add components from the palette to start building the flow",
            egui::FontId::proportional(14.0),
            Color32::from_gray(120),
        );
    }

    state.hovered_node = None;

    // Draw connections first (behind nodes), remembering their sampled
    // points for click hit-testing
    let mut connection_paths: Vec<(ConnectionId, Vec<Pos2>)> = Vec::new();
    for connection in shared.document.connections() {
        let Some(from_node) = shared.document.node(connection.from_node) else {
            continue;
        };
        let Some(to_node) = shared.document.node(connection.to_node) else {
            continue;
        };

        let from_screen = port_screen_pos(
            shared,
            from_node,
            &connection.from_port,
            PortSide::Output,
            origin,
            state.zoom,
        );
        let to_screen = port_screen_pos(
            shared,
            to_node,
            &connection.to_port,
            PortSide::Input,
            origin,
            state.zoom,
        );

        let mid_x = (from_screen.x + to_screen.x) * 0.5;
        let cp1 = Pos2::new(mid_x, from_screen.y);
        let cp2 = Pos2::new(mid_x, to_screen.y);
        let points = bezier_points(from_screen, cp1, cp2, to_screen, 32);

        let selected = state.selected_connection == Some(connection.id);
        let stroke = if selected {
            Stroke::new(3.0 * state.zoom, Color32::from_rgb(120, 180, 255))
        } else {
            Stroke::new(2.0 * state.zoom, Color32::from_gray(150))
        };
        painter.add(egui::Shape::line(points.clone(), stroke));
        connection_paths.push((connection.id, points));
    }

    // Rubber band while a connection is pending
    if let Some(pending) = &state.pending_connection {
        if let Some(pointer_pos) = response.hover_pos() {
            painter.line_segment(
                [pending.start, pointer_pos],
                Stroke::new(2.0 * state.zoom, Color32::YELLOW),
            );
        }
    }

    let port_radius = PORT_RADIUS * state.zoom;
    let mut clicked_output_port: Option<(NodeId, String, Pos2)> = None;
    let mut clicked_input_port: Option<(NodeId, String)> = None;
    let mut clicked_node: Option<NodeId> = None;
    let mut drag_started_on_node: Option<(NodeId, Vec2)> = None;

    // Draw nodes
    for node in shared.document.nodes() {
        let screen_pos = Pos2::new(
            node.position.x * state.zoom + origin.x,
            node.position.y * state.zoom + origin.y,
        );
        let node_size = Vec2::new(NODE_WIDTH * state.zoom, NODE_HEIGHT * state.zoom);
        let node_rect = Rect::from_min_size(screen_pos, node_size);

        let color = category_color(node.category);
        let is_selected = *shared.selected_node == Some(node.id);
        let has_findings = node_has_findings(shared, node);
        let stroke_color = if is_selected {
            Color32::WHITE
        } else if has_findings {
            Color32::from_rgb(230, 160, 60)
        } else {
            Color32::from_gray(80)
        };
        let stroke_width = if is_selected { 3.0 } else { 1.0 };

        painter.rect_filled(node_rect, 6.0 * state.zoom, color);
        painter.rect_stroke(
            node_rect,
            6.0 * state.zoom,
            Stroke::new(stroke_width * state.zoom, stroke_color),
            egui::StrokeKind::Outside,
        );

        painter.text(
            Pos2::new(node_rect.center().x, node_rect.top() + 14.0 * state.zoom),
            egui::Align2::CENTER_CENTER,
            &node.name,
            egui::FontId::proportional(12.0 * state.zoom),
            Color32::WHITE,
        );
        painter.text(
            Pos2::new(node_rect.center().x, node_rect.bottom() - 12.0 * state.zoom),
            egui::Align2::CENTER_CENTER,
            &node.type_name,
            egui::FontId::proportional(9.0 * state.zoom),
            Color32::from_gray(210),
        );
        if has_findings {
            painter.text(
                Pos2::new(node_rect.right() - 8.0 * state.zoom, node_rect.top() + 8.0 * state.zoom),
                egui::Align2::CENTER_CENTER,
                "⚠",
                egui::FontId::proportional(11.0 * state.zoom),
                Color32::from_rgb(230, 160, 60),
            );
        }

        let (input_ports, output_ports) = node_ports(shared, node);
        let pointer = response.hover_pos();

        // Port circles along the node edges
        let mut input_positions: Vec<(String, Pos2)> = Vec::new();
        for (i, port) in input_ports.iter().enumerate() {
            let pos = port_pos_on_edge(node_rect, i, input_ports.len(), PortSide::Input);
            let hovered = pointer
                .map(|p| (p - pos).length() < port_radius * 1.5)
                .unwrap_or(false);
            let port_color = if hovered && state.pending_connection.is_some() {
                Color32::LIGHT_GREEN
            } else {
                Color32::from_gray(200)
            };
            painter.circle_filled(pos, port_radius, port_color);
            if hovered {
                painter.text(
                    pos + Vec2::new(port_radius + 4.0, 0.0),
                    egui::Align2::LEFT_CENTER,
                    port,
                    egui::FontId::proportional(10.0 * state.zoom),
                    Color32::WHITE,
                );
            }
            input_positions.push((port.clone(), pos));
        }

        let mut output_positions: Vec<(String, Pos2)> = Vec::new();
        for (i, port) in output_ports.iter().enumerate() {
            let pos = port_pos_on_edge(node_rect, i, output_ports.len(), PortSide::Output);
            let hovered = pointer
                .map(|p| (p - pos).length() < port_radius * 1.5)
                .unwrap_or(false);
            let port_color = if hovered {
                Color32::LIGHT_BLUE
            } else {
                Color32::from_gray(200)
            };
            painter.circle_filled(pos, port_radius, port_color);
            if hovered {
                painter.text(
                    pos - Vec2::new(port_radius + 4.0, 0.0),
                    egui::Align2::RIGHT_CENTER,
                    port,
                    egui::FontId::proportional(10.0 * state.zoom),
                    Color32::WHITE,
                );
            }
            output_positions.push((port.clone(), pos));
        }

        // Check for hover (for the findings tooltip)
        if let Some(hover_pos) = pointer {
            if node_rect.contains(hover_pos) {
                state.hovered_node = Some(node.id);
            }
        }

        // Check for clicks and drag start
        if let Some(pointer_pos) = response.interact_pointer_pos() {
            let on_output = output_positions
                .iter()
                .find(|(_, pos)| (pointer_pos - *pos).length() < port_radius * 2.0);
            let on_input = input_positions
                .iter()
                .find(|(_, pos)| (pointer_pos - *pos).length() < port_radius * 2.0);
            let on_node_body =
                node_rect.contains(pointer_pos) && on_output.is_none() && on_input.is_none();

            if response.clicked() {
                if let Some((port, pos)) = on_output {
                    clicked_output_port = Some((node.id, port.clone(), *pos));
                } else if let Some((port, _)) = on_input {
                    clicked_input_port = Some((node.id, port.clone()));
                } else if on_node_body {
                    clicked_node = Some(node.id);
                }
            }

            if response.drag_started_by(egui::PointerButton::Primary)
                && on_node_body
                && state.dragging_node.is_none()
                && !ui.input(|i| i.modifiers.shift)
            {
                let world_pos = Pos2::new(
                    (pointer_pos.x - origin.x) / state.zoom,
                    (pointer_pos.y - origin.y) / state.zoom,
                );
                let offset = Vec2::new(
                    node.position.x - world_pos.x,
                    node.position.y - world_pos.y,
                );
                drag_started_on_node = Some((node.id, offset));
            }
        }
    }

    // Handle node dragging (repositioning)
    if let Some((node_id, offset)) = drag_started_on_node {
        state.dragging_node = Some((node_id, offset));
        *shared.selected_node = Some(node_id);
    }

    if let Some((node_id, offset)) = state.dragging_node {
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pointer_pos) = response.interact_pointer_pos() {
                let world = CanvasPos::new(
                    (pointer_pos.x - origin.x) / state.zoom + offset.x,
                    (pointer_pos.y - origin.y) / state.zoom + offset.y,
                );
                let moved = shared
                    .document
                    .node(node_id)
                    .map(|n| n.position != world)
                    .unwrap_or(false);
                if moved {
                    actions.push(AppAction::MoveNode {
                        id: node_id,
                        position: world,
                    });
                }
            }
        }

        if response.drag_stopped() {
            state.dragging_node = None;
        }
    }

    // Handle port, node, and empty-space clicks (only if not dragging)
    if state.dragging_node.is_none() {
        if let Some((from, from_port, start)) = clicked_output_port {
            state.pending_connection = Some(PendingConnection {
                from,
                from_port,
                start,
            });
            state.selected_connection = None;
        } else if let Some((to, to_port)) = clicked_input_port {
            if let Some(pending) = state.pending_connection.take() {
                if pending.from != to {
                    actions.push(AppAction::Connect {
                        from: pending.from,
                        from_port: pending.from_port,
                        to,
                        to_port,
                    });
                }
            }
        } else if let Some(node_id) = clicked_node {
            *shared.selected_node = Some(node_id);
            state.pending_connection = None;
            state.selected_connection = None;
        } else if response.clicked() {
            // Clicked empty space: try connection hit-test, else deselect
            let hit = response.interact_pointer_pos().and_then(|pos| {
                connection_paths
                    .iter()
                    .find(|(_, points)| distance_to_path(pos, points) < 6.0)
                    .map(|(id, _)| *id)
            });
            state.selected_connection = hit;
            if hit.is_none() {
                *shared.selected_node = None;
            }
            state.pending_connection = None;
        }
    }

    // Delete removes the selected node or connection. Skipped while a text
    // field has focus so Backspace keeps editing text.
    if !ui.ctx().wants_keyboard_input()
        && ui.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace))
    {
        if let Some(connection_id) = state.selected_connection.take() {
            actions.push(AppAction::Disconnect(connection_id));
        } else if let Some(node_id) = shared.selected_node.take() {
            actions.push(AppAction::RemoveNode(node_id));
        }
    }

    // Findings tooltip for the hovered node
    if let Some(hovered_id) = state.hovered_node {
        if let Some(node) = shared.document.node(hovered_id) {
            let findings = node_findings(shared, node);
            if !findings.is_empty() {
                egui::show_tooltip(
                    ui.ctx(),
                    ui.layer_id(),
                    egui::Id::new("canvas_node_findings"),
                    |ui| {
                        ui.set_max_width(300.0);
                        for finding in findings {
                            ui.label(finding);
                        }
                    },
                );
            }
        }
    }

    actions
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortSide {
    Input,
    Output,
}

/// Port circle position on the node border, evenly spaced
fn port_pos_on_edge(node_rect: Rect, index: usize, count: usize, side: PortSide) -> Pos2 {
    let x = match side {
        PortSide::Input => node_rect.left(),
        PortSide::Output => node_rect.right(),
    };
    let fraction = (index + 1) as f32 / (count + 1) as f32;
    Pos2::new(x, node_rect.top() + node_rect.height() * fraction)
}

/// Screen position of a named port on a node
fn port_screen_pos(
    shared: &SharedState<'_>,
    node: &FlowNode,
    port: &str,
    side: PortSide,
    origin: Vec2,
    zoom: f32,
) -> Pos2 {
    let screen_pos = Pos2::new(
        node.position.x * zoom + origin.x,
        node.position.y * zoom + origin.y,
    );
    let node_rect = Rect::from_min_size(
        screen_pos,
        Vec2::new(NODE_WIDTH * zoom, NODE_HEIGHT * zoom),
    );

    let (inputs, outputs) = node_ports(shared, node);
    let ports = match side {
        PortSide::Input => inputs,
        PortSide::Output => outputs,
    };
    let index = ports.iter().position(|p| p == port).unwrap_or(0);
    port_pos_on_edge(node_rect, index, ports.len().max(1), side)
}

/// Port names for a node, from the descriptor when the catalog has it
fn node_ports(shared: &SharedState<'_>, node: &FlowNode) -> (Vec<String>, Vec<String>) {
    if let Some(component) = shared.component_for(&node.type_name) {
        return (component.input_ports(), component.output_ports());
    }
    // Unknown type: fall back to the category defaults
    let inputs = match node.category {
        ComponentCategory::Input => Vec::new(),
        _ => vec!["in".to_string()],
    };
    let outputs = match node.category {
        ComponentCategory::Output | ComponentCategory::Storage => Vec::new(),
        _ => vec!["out".to_string()],
    };
    (inputs, outputs)
}

fn node_has_findings(shared: &SharedState<'_>, node: &FlowNode) -> bool {
    shared.lint.iter().any(|i| i.component_name == node.name)
        || shared
            .server_validation
            .is_some_and(|v| v.iter().any(|i| i.component_name == node.name))
}

fn node_findings(shared: &SharedState<'_>, node: &FlowNode) -> Vec<String> {
    let mut findings: Vec<String> = Vec::new();
    if let Some(validation) = shared.server_validation {
        findings.extend(
            validation
                .iter()
                .filter(|i| i.component_name == node.name)
                .map(|i| i.message.clone()),
        );
    }
    findings.extend(
        shared
            .lint
            .iter()
            .filter(|i| i.component_name == node.name)
            .map(|i| i.message.clone()),
    );
    findings
}

/// Determine node color based on its category.
fn category_color(category: ComponentCategory) -> Color32 {
    match category {
        ComponentCategory::Input => Color32::from_rgb(60, 140, 60),
        ComponentCategory::Processor => Color32::from_rgb(60, 100, 180),
        ComponentCategory::Output => Color32::from_rgb(200, 120, 40),
        ComponentCategory::Storage => Color32::from_rgb(130, 80, 170),
    }
}

fn draw_grid(painter: &egui::Painter, canvas_rect: Rect, origin: Vec2, zoom: f32) {
    let step = GRID_STEP * zoom;
    if step < 6.0 {
        return;
    }
    let stroke = Stroke::new(1.0, Color32::from_gray(38));

    let mut x = origin.x % step;
    if x < canvas_rect.left() {
        x += ((canvas_rect.left() - x) / step).ceil() * step;
    }
    while x < canvas_rect.right() {
        painter.line_segment(
            [
                Pos2::new(x, canvas_rect.top()),
                Pos2::new(x, canvas_rect.bottom()),
            ],
            stroke,
        );
        x += step;
    }

    let mut y = origin.y % step;
    if y < canvas_rect.top() {
        y += ((canvas_rect.top() - y) / step).ceil() * step;
    }
    while y < canvas_rect.bottom() {
        painter.line_segment(
            [
                Pos2::new(canvas_rect.left(), y),
                Pos2::new(canvas_rect.right(), y),
            ],
            stroke,
        );
        y += step;
    }
}

/// Compute points along a cubic bezier curve.
fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    (0..=segments)
        .map(|i| {
            let t = i as f32 / segments as f32;
            let u = 1.0 - t;
            let tt = t * t;
            let uu = u * u;
            let uuu = uu * u;
            let ttt = tt * t;
            Pos2::new(
                uuu * p0.x + 3.0 * uu * t * p1.x + 3.0 * u * tt * p2.x + ttt * p3.x,
                uuu * p0.y + 3.0 * uu * t * p1.y + 3.0 * u * tt * p2.y + ttt * p3.y,
            )
        })
        .collect()
}

/// Minimum distance from a point to a polyline
fn distance_to_path(point: Pos2, path: &[Pos2]) -> f32 {
    path.windows(2)
        .map(|pair| distance_to_segment(point, pair[0], pair[1]))
        .fold(f32::INFINITY, f32::min)
}

fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq == 0.0 {
        return (point - a).length();
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (point - (a + ab * t)).length()
}
