//! Service worker thread implementation
//!
//! Owns the [`FlowApi`] implementation and executes every backend request
//! off the UI thread. The loop alternates between draining the command
//! channel and polling the active flow's runtime status on a fixed cadence.

use crate::client::api::FlowApi;
use crate::client::{SaveAck, ServiceCommand, ServiceError, ServiceEvent};
use crate::error::FlowStudioError;
use crate::types::{BackendStatus, RuntimeAction};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default cadence for runtime status polling
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Floor for the configurable polling cadence
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Idle sleep between loop iterations
const LOOP_SLEEP: Duration = Duration::from_millis(50);

/// The worker that processes commands and talks to the backend
pub struct ServiceWorker {
    api: Box<dyn FlowApi>,
    command_receiver: Receiver<ServiceCommand>,
    event_sender: Sender<ServiceEvent>,
    running: Arc<AtomicBool>,

    /// Flow whose runtime status is polled continuously
    poll_flow: Option<String>,
    poll_interval: Duration,
    last_poll: Instant,

    /// Last reachability reported to the UI; used to dedup status events
    reported_status: Option<BackendStatus>,
}

impl ServiceWorker {
    pub fn new(
        api: Box<dyn FlowApi>,
        command_receiver: Receiver<ServiceCommand>,
        event_sender: Sender<ServiceEvent>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            api,
            command_receiver,
            event_sender,
            running,
            poll_flow: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            // Fire the first poll immediately once a flow is selected
            last_poll: Instant::now() - DEFAULT_POLL_INTERVAL,
            reported_status: None,
        }
    }

    /// Main worker loop
    pub fn run(&mut self) {
        info!("Service worker started");

        while self.running.load(Ordering::SeqCst) {
            self.process_commands();
            self.maybe_poll_runtime();
            std::thread::sleep(LOOP_SLEEP);
        }

        info!("Service worker stopped");
        let _ = self.event_sender.send(ServiceEvent::Shutdown);
    }

    /// Process all pending commands
    fn process_commands(&mut self) {
        loop {
            match self.command_receiver.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("Command channel disconnected, stopping worker");
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    fn handle_command(&mut self, cmd: ServiceCommand) {
        match cmd {
            ServiceCommand::FetchComponentTypes => self.fetch_component_types(),
            ServiceCommand::FetchComponentSchema { type_id } => {
                self.fetch_component_schema(type_id)
            }
            ServiceCommand::FetchFlow { flow_id } => self.fetch_flow(flow_id),
            ServiceCommand::SaveFlow { flow } => self.save_flow(flow),
            ServiceCommand::Control { flow_id, action } => self.control(flow_id, action),
            ServiceCommand::FetchRuntimeStatus { flow_id } => {
                self.fetch_runtime_status(&flow_id);
            }
            ServiceCommand::SetPolledFlow { flow_id } => {
                debug!(?flow_id, "Polled flow changed");
                self.poll_flow = flow_id;
                // Next loop iteration polls right away
                self.last_poll = Instant::now() - self.poll_interval;
            }
            ServiceCommand::SetPollInterval { seconds } => {
                let interval = Duration::from_secs_f32(seconds.max(0.0));
                self.poll_interval = interval.max(MIN_POLL_INTERVAL);
                debug!(interval_ms = self.poll_interval.as_millis() as u64, "Poll interval changed");
            }
            ServiceCommand::SetBaseUrl { base_url } => {
                info!(%base_url, "Switching backend");
                self.api.set_base_url(&base_url);
                self.report_status(BackendStatus::Connecting);
            }
            ServiceCommand::Shutdown => {
                info!("Shutdown command received");
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Poll the selected flow's runtime status when the cadence elapsed
    fn maybe_poll_runtime(&mut self) {
        if self.poll_flow.is_none() {
            return;
        }
        if self.last_poll.elapsed() < self.poll_interval {
            return;
        }
        self.last_poll = Instant::now();
        if let Some(flow_id) = self.poll_flow.clone() {
            self.fetch_runtime_status(&flow_id);
        }
    }

    fn fetch_component_types(&mut self) {
        debug!("Fetching component types");
        match self.api.component_types() {
            Ok(types) => {
                info!(count = types.len(), "Component catalog loaded");
                self.note_success();
                self.send(ServiceEvent::ComponentTypes(types));
            }
            Err(err) => {
                warn!("Component catalog fetch failed: {err}");
                self.note_failure(&err);
                self.send(ServiceEvent::ComponentTypesFailed(ServiceError::from(&err)));
            }
        }
    }

    fn fetch_component_schema(&mut self, type_id: String) {
        debug!(%type_id, "Fetching component schema");
        match self.api.component_schema(&type_id) {
            Ok(schema) => {
                self.note_success();
                self.send(ServiceEvent::ComponentSchema { type_id, schema });
            }
            Err(err) => {
                warn!(%type_id, "Schema fetch failed: {err}");
                self.note_failure(&err);
                self.send(ServiceEvent::ComponentSchemaFailed {
                    type_id,
                    error: ServiceError::from(&err),
                });
            }
        }
    }

    fn fetch_flow(&mut self, flow_id: String) {
        debug!(%flow_id, "Fetching flow");
        match self.api.fetch_flow(&flow_id) {
            Ok(flow) => {
                info!(%flow_id, nodes = flow.node_count(), "Flow loaded");
                self.note_success();
                self.send(ServiceEvent::FlowLoaded(flow));
            }
            Err(err) => {
                warn!(%flow_id, "Flow load failed: {err}");
                self.note_failure(&err);
                self.send(ServiceEvent::FlowLoadFailed {
                    flow_id,
                    error: ServiceError::from(&err),
                });
            }
        }
    }

    fn save_flow(&mut self, flow: crate::flow::FlowGraph) {
        debug!(flow_id = %flow.id, "Saving flow");
        match self.api.save_flow(&flow) {
            Ok(validation) => {
                info!(flow_id = %flow.id, "Flow saved");
                self.note_success();
                self.send(ServiceEvent::SaveFinished {
                    result: Ok(SaveAck {
                        saved_at: chrono::Utc::now(),
                        validation,
                    }),
                });
            }
            Err(err) => {
                warn!(flow_id = %flow.id, "Save failed: {err}");
                self.note_failure(&err);
                self.send(ServiceEvent::SaveFinished {
                    result: Err(ServiceError::from(&err)),
                });
            }
        }
    }

    fn control(&mut self, flow_id: String, action: RuntimeAction) {
        info!(%flow_id, %action, "Runtime control");
        let result = self.api.control(&flow_id, action);
        match &result {
            Ok(()) => self.note_success(),
            Err(err) => {
                warn!(%flow_id, %action, "Control failed: {err}");
                self.note_failure(err);
            }
        }
        self.send(ServiceEvent::ControlFinished {
            action,
            result: result.map_err(|err| ServiceError::from(&err)),
        });
        // A lifecycle change makes the polled status stale; refresh now
        if self.poll_flow.as_deref() == Some(flow_id.as_str()) {
            self.last_poll = Instant::now() - self.poll_interval;
        }
    }

    fn fetch_runtime_status(&mut self, flow_id: &str) {
        match self.api.runtime_status(flow_id) {
            Ok(report) => {
                self.note_success();
                self.send(ServiceEvent::RuntimeStatus(report));
            }
            Err(err) => {
                debug!(%flow_id, "Runtime status fetch failed: {err}");
                self.note_failure(&err);
                self.send(ServiceEvent::RuntimeStatusFailed(ServiceError::from(&err)));
            }
        }
    }

    fn note_success(&mut self) {
        self.report_status(BackendStatus::Connected);
    }

    /// Map a request error onto backend reachability
    fn note_failure(&mut self, err: &FlowStudioError) {
        let status = match err.root_cause() {
            FlowStudioError::Connectivity(_) | FlowStudioError::Timeout(_) => {
                BackendStatus::Disconnected
            }
            // The backend answered, just not helpfully
            _ => BackendStatus::Error,
        };
        self.report_status(status);
    }

    fn report_status(&mut self, status: BackendStatus) {
        if self.reported_status == Some(status) {
            return;
        }
        info!(%status, "Backend status changed");
        self.reported_status = Some(status);
        self.send(ServiceEvent::BackendStatus(status));
    }

    fn send(&self, event: ServiceEvent) {
        let _ = self.event_sender.send(event);
    }
}

/// Convenience for spawning the worker from tests and binaries
pub fn spawn_worker(
    api: Box<dyn FlowApi>,
    command_receiver: Receiver<ServiceCommand>,
    event_sender: Sender<ServiceEvent>,
    running: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("flow-service".into())
        .spawn(move || {
            let mut worker = ServiceWorker::new(api, command_receiver, event_sender, running);
            worker.run();
        })
        .unwrap_or_else(|err| panic!("failed to spawn service worker thread: {err}"))
}

#[allow(dead_code)]
fn _assert_send(api: Box<dyn FlowApi>) -> impl Send {
    api
}
