//! Service client for the flow backend
//!
//! All backend traffic runs on a separate thread to keep the UI
//! responsive. It uses crossbeam channels for thread-safe communication
//! with the editor:
//!
//! - [`ServiceCommand`] - Messages sent from UI to the worker (fetch, save, control)
//! - [`ServiceEvent`] - Messages sent from the worker to the UI (results, status)
//! - [`ServiceHandle`] - UI-side handle for sending commands and receiving events
//! - [`FlowService`] - Entry point that owns the channels and runs the worker
//!
//! # Example
//!
//! ```ignore
//! use flowstudio_rs::client::{FlowService, ServiceEvent};
//! use flowstudio_rs::client::http::HttpFlowApi;
//!
//! let api = HttpFlowApi::new("http://localhost:8420")?;
//! let (service, handle) = FlowService::new(Box::new(api));
//! std::thread::spawn(move || service.run());
//!
//! handle.fetch_component_types();
//! for event in handle.drain() {
//!     match event {
//!         ServiceEvent::ComponentTypes(types) => { /* fill the palette */ }
//!         _ => {}
//!     }
//! }
//! ```

pub mod api;
pub mod http;
#[cfg(feature = "mock-backend")]
pub mod mock_api;
pub mod worker;

pub use api::FlowApi;
pub use http::HttpFlowApi;
#[cfg(feature = "mock-backend")]
pub use mock_api::ScriptedFlowApi;
pub use worker::ServiceWorker;

use crate::error::FlowStudioError;
use crate::flow::{ComponentSchema, ComponentType, FlowGraph, ValidationResult};
use crate::types::{BackendStatus, RuntimeAction, RuntimeStatusReport};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Message sent from the UI to the service worker
#[derive(Debug, Clone)]
pub enum ServiceCommand {
    /// Fetch the component type catalog
    FetchComponentTypes,
    /// Fetch one component type's config schema
    FetchComponentSchema { type_id: String },
    /// Load a flow document by id
    FetchFlow { flow_id: String },
    /// Persist the given flow document
    SaveFlow { flow: FlowGraph },
    /// Request a runtime lifecycle transition
    Control {
        flow_id: String,
        action: RuntimeAction,
    },
    /// Fetch runtime status once, outside the polling cadence
    FetchRuntimeStatus { flow_id: String },
    /// Choose which flow's runtime to poll continuously (None disables)
    SetPolledFlow { flow_id: Option<String> },
    /// Change the polling cadence
    SetPollInterval { seconds: f32 },
    /// Point the client at a different backend
    SetBaseUrl { base_url: String },
    /// Shut down the worker thread
    Shutdown,
}

/// Error forwarded over the event channel
///
/// [`FlowStudioError`] is not `Clone`, so the worker flattens errors into
/// a kind plus display text before sending them to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// The backend was unreachable
    Connectivity,
    /// The request hit its deadline
    Timeout,
    /// The backend answered with an error status
    Api,
    /// Everything else (serialization, IO, internal)
    Other,
}

impl From<&FlowStudioError> for ServiceError {
    fn from(err: &FlowStudioError) -> Self {
        let kind = match err.root_cause() {
            FlowStudioError::Connectivity(_) => ServiceErrorKind::Connectivity,
            FlowStudioError::Timeout(_) => ServiceErrorKind::Timeout,
            FlowStudioError::Api { .. } => ServiceErrorKind::Api,
            _ => ServiceErrorKind::Other,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Successful save acknowledgement
#[derive(Debug, Clone, PartialEq)]
pub struct SaveAck {
    /// When the worker observed the success
    pub saved_at: DateTime<Utc>,
    /// The backend's validation verdict, when it sent one
    pub validation: Option<ValidationResult>,
}

/// Message sent from the service worker to the UI
#[derive(Debug, Clone)]
pub enum ServiceEvent {
    /// Backend reachability changed
    BackendStatus(BackendStatus),
    /// Component catalog arrived
    ComponentTypes(Vec<ComponentType>),
    /// Component catalog fetch failed
    ComponentTypesFailed(ServiceError),
    /// Schema lookup finished; `None` means no schema exists for the type
    ComponentSchema {
        type_id: String,
        schema: Option<ComponentSchema>,
    },
    /// Schema lookup failed
    ComponentSchemaFailed {
        type_id: String,
        error: ServiceError,
    },
    /// Flow document arrived
    FlowLoaded(FlowGraph),
    /// Flow load failed
    FlowLoadFailed {
        flow_id: String,
        error: ServiceError,
    },
    /// A save attempt resolved
    SaveFinished {
        result: Result<SaveAck, ServiceError>,
    },
    /// A lifecycle control request resolved
    ControlFinished {
        action: RuntimeAction,
        result: Result<(), ServiceError>,
    },
    /// Fresh runtime status (polled or requested)
    RuntimeStatus(RuntimeStatusReport),
    /// Runtime status fetch failed
    RuntimeStatusFailed(ServiceError),
    /// The worker is shutting down
    Shutdown,
}

/// UI-side handle for the service worker
pub struct ServiceHandle {
    /// Receiver for worker events
    pub receiver: Receiver<ServiceEvent>,
    /// Sender for commands to the worker
    pub command_sender: Sender<ServiceCommand>,
}

impl ServiceHandle {
    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<ServiceEvent> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending events
    pub fn drain(&self) -> Vec<ServiceEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Send a command to the worker
    pub fn send_command(&self, cmd: ServiceCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    pub fn fetch_component_types(&self) {
        let _ = self.command_sender.send(ServiceCommand::FetchComponentTypes);
    }

    pub fn fetch_component_schema(&self, type_id: impl Into<String>) {
        let _ = self.command_sender.send(ServiceCommand::FetchComponentSchema {
            type_id: type_id.into(),
        });
    }

    pub fn fetch_flow(&self, flow_id: impl Into<String>) {
        let _ = self.command_sender.send(ServiceCommand::FetchFlow {
            flow_id: flow_id.into(),
        });
    }

    pub fn save_flow(&self, flow: FlowGraph) {
        let _ = self.command_sender.send(ServiceCommand::SaveFlow { flow });
    }

    pub fn control(&self, flow_id: impl Into<String>, action: RuntimeAction) {
        let _ = self.command_sender.send(ServiceCommand::Control {
            flow_id: flow_id.into(),
            action,
        });
    }

    pub fn fetch_runtime_status(&self, flow_id: impl Into<String>) {
        let _ = self.command_sender.send(ServiceCommand::FetchRuntimeStatus {
            flow_id: flow_id.into(),
        });
    }

    pub fn set_polled_flow(&self, flow_id: Option<String>) {
        let _ = self
            .command_sender
            .send(ServiceCommand::SetPolledFlow { flow_id });
    }

    pub fn set_poll_interval(&self, seconds: f32) {
        let _ = self
            .command_sender
            .send(ServiceCommand::SetPollInterval { seconds });
    }

    pub fn set_base_url(&self, base_url: impl Into<String>) {
        let _ = self.command_sender.send(ServiceCommand::SetBaseUrl {
            base_url: base_url.into(),
        });
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(ServiceCommand::Shutdown);
    }
}

/// The service client that runs in a separate thread
pub struct FlowService {
    /// Backend implementation the worker will own
    api: Box<dyn FlowApi>,
    /// Receiver for commands from the UI
    command_receiver: Receiver<ServiceCommand>,
    /// Sender for events to the UI
    event_sender: Sender<ServiceEvent>,
    /// Running flag
    running: Arc<AtomicBool>,
}

impl FlowService {
    /// Create a new service with communication channels
    pub fn new(api: Box<dyn FlowApi>) -> (Self, ServiceHandle) {
        let (cmd_tx, cmd_rx) = bounded(256);
        // Bounded for backpressure; polling plus bursts of fetches stay far
        // below this, so sends never block in practice
        let (event_tx, event_rx) = bounded(10_000);

        let service = Self {
            api,
            command_receiver: cmd_rx,
            event_sender: event_tx,
            running: Arc::new(AtomicBool::new(true)),
        };

        let handle = ServiceHandle {
            receiver: event_rx,
            command_sender: cmd_tx,
        };

        (service, handle)
    }

    /// Run the worker loop on the current thread
    pub fn run(self) {
        let mut worker = ServiceWorker::new(
            self.api,
            self.command_receiver,
            self.event_sender,
            self.running,
        );
        worker.run();
    }

    /// Get a handle to stop the service
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}
