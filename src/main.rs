//! Flow Studio - Main Entry Point
//!
//! Visual editor for dataflow pipelines. Connects to a flow runtime
//! backend over HTTP; all requests run on a worker thread.

use anyhow::Context;
use flowstudio_rs::{
    client::{FlowService, HttpFlowApi},
    config::{self, AppState, EditorSettings},
    editor::FlowStudioApp,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize logging; a rolling file in the app data dir keeps a
    // record of sessions started outside a terminal
    let file_layer = config::app_data_dir().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir.join("logs"), "flowstudio.log");
        tracing_subscriber::fmt::layer()
            .with_writer(appender)
            .with_ansi(false)
    });
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,flowstudio_rs=trace")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    tracing::info!("Starting Flow Studio");

    // Load application state (recent flows, backend URL, preferences)
    let app_state = AppState::load_or_default();
    let mut settings = EditorSettings::load_or_default();
    settings.sanitize();

    // Spawn the service worker; the UI talks to it through the handle
    let api =
        HttpFlowApi::new(&app_state.backend_url).context("Failed to build the HTTP client")?;
    let (service, handle) = FlowService::new(Box::new(api));
    let worker_handle = std::thread::spawn(move || service.run());

    // Configure eframe options
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("Flow Studio"),
        persist_window: app_state.ui_preferences.remember_window_state,
        ..Default::default()
    };

    // Run the eframe application
    eframe::run_native(
        "Flow Studio",
        native_options,
        Box::new(|cc| Ok(Box::new(FlowStudioApp::new(cc, handle, app_state, settings)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run the editor window: {e}"))?;

    // The app's exit hook already asked the worker to stop
    tracing::info!("Shutting down...");
    drop(worker_handle);

    Ok(())
}
