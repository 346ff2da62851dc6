//! Monitor page — runtime state, throughput chart and the runtime log.
//!
//! Everything shown here comes from the status reports the service worker
//! polls in the background; the page itself never talks to the backend.

use egui::{Color32, RichText, Ui};

use crate::editor::state::{AppAction, SharedState};
use crate::types::{available_runtime_action, LogLevel, RuntimeState};

/// State for the monitor page.
pub struct MonitorState {
    /// Also plot bytes/s next to messages/s.
    pub show_bytes: bool,
    /// Minimum level a log line needs to be shown.
    pub min_level: LogLevel,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            show_bytes: false,
            min_level: LogLevel::Info,
        }
    }
}

/// Render the monitor page.
pub fn render(
    state: &mut MonitorState,
    shared: &mut SharedState<'_>,
    ui: &mut Ui,
) -> Vec<AppAction> {
    let mut actions = Vec::new();

    ui.heading("Runtime Monitor");
    ui.separator();

    render_runtime_header(shared, ui, &mut actions);

    ui.add_space(16.0);
    ui.heading("Throughput");
    ui.separator();
    render_stats_row(state, shared, ui);
    render_throughput_plot(state, shared, ui);

    ui.add_space(16.0);
    ui.heading("Runtime Log");
    ui.separator();
    render_log(state, shared, ui);

    actions
}

/// Current state, last transition and the one lifecycle action that applies
fn render_runtime_header(shared: &mut SharedState<'_>, ui: &mut Ui, actions: &mut Vec<AppAction>) {
    let Some(runtime) = shared.runtime else {
        ui.label("No runtime status yet. Status is polled once a flow is open.");
        return;
    };

    ui.horizontal(|ui| {
        ui.label(RichText::new("●").color(runtime_color(runtime.state)));
        ui.label(RichText::new(runtime.state.to_string()).strong());
        if let Some(transition) = runtime.last_transition {
            ui.label(
                RichText::new(format!(
                    "since {}",
                    transition.with_timezone(&chrono::Local).format("%H:%M:%S")
                ))
                .small()
                .color(Color32::GRAY),
            );
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if let Some((action, enabled)) =
                available_runtime_action(runtime.state, shared.is_flow_valid())
            {
                let button = ui.add_enabled(enabled, egui::Button::new(action.label()));
                if button
                    .on_disabled_hover_text("Fix validation errors before deploying")
                    .clicked()
                {
                    actions.push(AppAction::Control(action));
                }
            }
        });
    });

    if let Some(message) = &runtime.message {
        let color = if runtime.state == RuntimeState::Error {
            Color32::LIGHT_RED
        } else {
            Color32::GRAY
        };
        ui.colored_label(color, message);
    }
}

fn render_stats_row(state: &mut MonitorState, shared: &SharedState<'_>, ui: &mut Ui) {
    ui.horizontal(|ui| {
        if let Some(sample) = shared.metrics.last() {
            ui.label(RichText::new(format!("{:.1} msg/s", sample.messages_per_second)).strong());
            ui.label(RichText::new(format_rate(sample.bytes_per_second)).strong());
            ui.label(
                RichText::new(format!("{} samples", shared.metrics.len()))
                    .small()
                    .color(Color32::GRAY),
            );
        } else {
            ui.label(RichText::new("No samples yet").color(Color32::GRAY));
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.checkbox(&mut state.show_bytes, "Show bytes/s");
        });
    });
}

fn render_throughput_plot(state: &MonitorState, shared: &SharedState<'_>, ui: &mut Ui) {
    use egui_plot::{Legend, Line, Plot, PlotPoints};

    if shared.metrics.is_empty() {
        return;
    }

    // X axis is seconds since the oldest retained sample
    let t0 = shared.metrics[0].timestamp;
    let message_points: Vec<[f64; 2]> = shared
        .metrics
        .iter()
        .map(|s| {
            let x = (s.timestamp - t0).num_milliseconds() as f64 / 1000.0;
            [x, s.messages_per_second]
        })
        .collect();

    let plot = Plot::new("runtime_throughput")
        .legend(Legend::default())
        .x_axis_label("Time (s)")
        .y_axis_label("Rate")
        .include_y(0.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .height(200.0);

    plot.show(ui, |plot_ui| {
        let line = Line::new("messages/s", PlotPoints::from(message_points))
            .color(Color32::from_rgb(100, 200, 120))
            .width(1.5);
        plot_ui.line(line);

        if state.show_bytes {
            let byte_points: Vec<[f64; 2]> = shared
                .metrics
                .iter()
                .map(|s| {
                    let x = (s.timestamp - t0).num_milliseconds() as f64 / 1000.0;
                    [x, s.bytes_per_second]
                })
                .collect();
            let line = Line::new("bytes/s", PlotPoints::from(byte_points))
                .color(Color32::from_rgb(120, 160, 230))
                .width(1.5);
            plot_ui.line(line);
        }
    });
}

fn render_log(state: &mut MonitorState, shared: &SharedState<'_>, ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.label("Minimum level:");
        egui::ComboBox::from_id_salt("monitor_log_level")
            .selected_text(state.min_level.to_string())
            .show_ui(ui, |ui| {
                for level in [
                    LogLevel::Debug,
                    LogLevel::Info,
                    LogLevel::Warn,
                    LogLevel::Error,
                ] {
                    ui.selectable_value(&mut state.min_level, level, level.to_string());
                }
            });
    });

    let visible: Vec<_> = shared
        .runtime_logs
        .iter()
        .filter(|entry| entry.level >= state.min_level)
        .collect();
    if visible.is_empty() {
        ui.label(RichText::new("No log lines").color(Color32::GRAY));
        return;
    }

    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for entry in visible {
                let time = entry.timestamp.with_timezone(&chrono::Local);
                let component = entry.component.as_deref().unwrap_or("runtime");
                ui.label(
                    RichText::new(format!(
                        "[{}] {:5} {} {}",
                        time.format("%H:%M:%S"),
                        entry.level.to_string(),
                        component,
                        entry.message
                    ))
                    .monospace()
                    .color(level_color(entry.level)),
                );
            }
        });
}

fn runtime_color(state: RuntimeState) -> Color32 {
    match state {
        RuntimeState::NotDeployed => Color32::GRAY,
        RuntimeState::DeployedStopped => Color32::YELLOW,
        RuntimeState::Running => Color32::GREEN,
        RuntimeState::Error => Color32::RED,
    }
}

fn level_color(level: LogLevel) -> Color32 {
    match level {
        LogLevel::Debug => Color32::DARK_GRAY,
        LogLevel::Info => Color32::LIGHT_GRAY,
        LogLevel::Warn => Color32::from_rgb(230, 160, 60),
        LogLevel::Error => Color32::LIGHT_RED,
    }
}

fn format_rate(bytes_per_second: f64) -> String {
    if bytes_per_second >= 1024.0 * 1024.0 {
        format!("{:.1} MiB/s", bytes_per_second / (1024.0 * 1024.0))
    } else if bytes_per_second >= 1024.0 {
        format!("{:.1} KiB/s", bytes_per_second / 1024.0)
    } else {
        format!("{bytes_per_second:.0} B/s")
    }
}
