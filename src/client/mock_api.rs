//! Scripted Backend Implementation for Testing
//!
//! This module provides a scripted flow backend that can be used for testing
//! the application without a running backend process. It keeps flows, the
//! component catalog, and runtime state in memory and applies real lifecycle
//! transitions.
//!
//! # Features
//!
//! - **In-memory flow store**: Saves land in a map the test can inspect
//! - **Lifecycle simulation**: Deploy/start/stop transitions with 409 on
//!   illegal requests, exactly like the real backend
//! - **Scripted faults**: Flip the backend offline or fail the next N saves
//! - **Synthetic metrics**: Running flows report a deterministic throughput
//!   wave so monitor plots have something to draw
//!
//! The [`ScriptedFlowApi`] keeps its state behind an [`Arc`], so tests hold a
//! [`ScriptedBackendHandle`] to reconfigure faults and inspect saves after the
//! service worker has taken ownership of the boxed API.
//!
//! # Example
//!
//! ```ignore
//! use flowstudio_rs::client::mock_api::ScriptedFlowApi;
//! use flowstudio_rs::client::FlowService;
//!
//! let api = ScriptedFlowApi::new().with_flow(my_flow);
//! let controls = api.controls();
//! let (service, handle) = FlowService::new(Box::new(api));
//! std::thread::spawn(move || service.run());
//!
//! controls.fail_next_saves(1);
//! handle.save_flow(flow); // resolves as an error event
//! ```
//!
//! # Enabling
//!
//! The scripted backend is only available when the `mock-backend` feature is
//! enabled:
//!
//! ```bash
//! cargo test --features mock-backend
//! ```

use crate::client::api::FlowApi;
use crate::error::{FlowStudioError, Result};
use crate::flow::{
    ComponentCategory, ComponentSchema, ComponentType, FlowGraph, PropertyKind, PropertySpec,
    ValidationResult,
};
use crate::types::{
    LogEntry, LogLevel, MetricsSample, RuntimeAction, RuntimeState, RuntimeStateInfo,
    RuntimeStatusReport,
};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Shared scripted state, owned jointly by the API and test handles
struct ScriptedState {
    base_url: String,
    catalog: Vec<ComponentType>,
    flows: HashMap<String, FlowGraph>,
    runtime: HashMap<String, RuntimeStateInfo>,
    logs: HashMap<String, VecDeque<LogEntry>>,
    /// Verdicts to return from upcoming saves, oldest first
    validation_script: VecDeque<Option<ValidationResult>>,
    /// When true, every request fails with a connectivity error
    offline: bool,
    /// Fail this many upcoming saves with a 500
    failing_saves: u32,
    save_count: u32,
    started: Instant,
}

impl ScriptedState {
    fn runtime_info(&mut self, flow_id: &str) -> &mut RuntimeStateInfo {
        self.runtime
            .entry(flow_id.to_string())
            .or_insert_with(|| RuntimeStateInfo {
                state: RuntimeState::NotDeployed,
                message: None,
                last_transition: None,
            })
    }

    fn push_log(&mut self, flow_id: &str, level: LogLevel, message: impl Into<String>) {
        let entries = self.logs.entry(flow_id.to_string()).or_default();
        entries.push_back(LogEntry {
            timestamp: chrono::Utc::now(),
            level,
            component: None,
            message: message.into(),
        });
        while entries.len() > 50 {
            entries.pop_front();
        }
    }
}

/// Handle for reconfiguring and inspecting a [`ScriptedFlowApi`] from tests
#[derive(Clone)]
pub struct ScriptedBackendHandle {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedBackendHandle {
    /// Make every request fail with a connectivity error
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Fail the next `count` saves with a 500 response
    pub fn fail_next_saves(&self, count: u32) {
        self.lock().failing_saves = count;
    }

    /// Queue a validation verdict for an upcoming save
    pub fn script_save_validation(&self, validation: Option<ValidationResult>) {
        self.lock().validation_script.push_back(validation);
    }

    /// Number of saves the backend accepted
    pub fn save_count(&self) -> u32 {
        self.lock().save_count
    }

    /// The most recently saved copy of a flow
    pub fn saved_flow(&self, flow_id: &str) -> Option<FlowGraph> {
        self.lock().flows.get(flow_id).cloned()
    }

    /// Current runtime state of a flow
    pub fn runtime_state(&self, flow_id: &str) -> RuntimeState {
        self.lock().runtime_info(flow_id).state
    }

    /// Force a runtime state, bypassing transition rules
    pub fn set_runtime_state(&self, flow_id: &str, state: RuntimeState) {
        let mut guard = self.lock();
        let info = guard.runtime_info(flow_id);
        info.state = state;
        info.last_transition = Some(chrono::Utc::now());
    }

    /// Base URL the API was last pointed at
    pub fn base_url(&self) -> String {
        self.lock().base_url.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Scripted flow backend for testing without a backend process
pub struct ScriptedFlowApi {
    state: Arc<Mutex<ScriptedState>>,
    /// Simulated request latency
    latency: Duration,
}

impl ScriptedFlowApi {
    /// Create a scripted backend with the default component catalog
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptedState {
                base_url: "http://mock.invalid".to_string(),
                catalog: default_catalog(),
                flows: HashMap::new(),
                runtime: HashMap::new(),
                logs: HashMap::new(),
                validation_script: VecDeque::new(),
                offline: false,
                failing_saves: 0,
                save_count: 0,
                started: Instant::now(),
            })),
            latency: Duration::ZERO,
        }
    }

    /// Replace the component catalog
    pub fn with_component_types(self, catalog: Vec<ComponentType>) -> Self {
        self.handle().lock().catalog = catalog;
        self
    }

    /// Pre-load a flow document
    pub fn with_flow(self, flow: FlowGraph) -> Self {
        self.handle().lock().flows.insert(flow.id.clone(), flow);
        self
    }

    /// Simulate request latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Get a handle for scripting faults and inspecting state
    pub fn controls(&self) -> ScriptedBackendHandle {
        self.handle()
    }

    fn handle(&self) -> ScriptedBackendHandle {
        ScriptedBackendHandle {
            state: self.state.clone(),
        }
    }

    fn begin_request(&self) -> Result<std::sync::MutexGuard<'_, ScriptedState>> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        let guard = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if guard.offline {
            return Err(FlowStudioError::Connectivity(
                "scripted backend is offline".to_string(),
            ));
        }
        Ok(guard)
    }
}

impl Default for ScriptedFlowApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowApi for ScriptedFlowApi {
    fn set_base_url(&mut self, base_url: &str) {
        self.handle().lock().base_url = base_url.to_string();
    }

    fn component_types(&self) -> Result<Vec<ComponentType>> {
        let guard = self.begin_request()?;
        Ok(guard.catalog.clone())
    }

    fn component_schema(&self, type_id: &str) -> Result<Option<ComponentSchema>> {
        let guard = self.begin_request()?;
        Ok(guard
            .catalog
            .iter()
            .find(|c| c.id == type_id)
            .and_then(|c| c.schema.clone()))
    }

    fn fetch_flow(&self, flow_id: &str) -> Result<FlowGraph> {
        let guard = self.begin_request()?;
        guard
            .flows
            .get(flow_id)
            .cloned()
            .ok_or_else(|| FlowStudioError::Api {
                status: 404,
                message: format!("flow '{flow_id}' not found"),
            })
    }

    fn save_flow(&self, flow: &FlowGraph) -> Result<Option<ValidationResult>> {
        let mut guard = self.begin_request()?;
        if guard.failing_saves > 0 {
            guard.failing_saves -= 1;
            return Err(FlowStudioError::Api {
                status: 500,
                message: "scripted save failure".to_string(),
            });
        }
        guard.flows.insert(flow.id.clone(), flow.clone());
        guard.save_count += 1;
        Ok(guard.validation_script.pop_front().flatten())
    }

    fn control(&self, flow_id: &str, action: RuntimeAction) -> Result<()> {
        let mut guard = self.begin_request()?;
        let state = guard.runtime_info(flow_id).state;
        let next = match (state, action) {
            (RuntimeState::NotDeployed, RuntimeAction::Deploy)
            | (RuntimeState::DeployedStopped, RuntimeAction::Deploy) => {
                RuntimeState::DeployedStopped
            }
            (RuntimeState::DeployedStopped, RuntimeAction::Start) => RuntimeState::Running,
            (RuntimeState::Running, RuntimeAction::Stop) => RuntimeState::DeployedStopped,
            _ => {
                return Err(FlowStudioError::Api {
                    status: 409,
                    message: format!("cannot {action} a flow in state {state}"),
                })
            }
        };

        let info = guard.runtime_info(flow_id);
        info.state = next;
        info.message = None;
        info.last_transition = Some(chrono::Utc::now());
        guard.push_log(flow_id, LogLevel::Info, format!("{action} accepted"));
        tracing::info!(%flow_id, %action, %next, "Scripted runtime transition");
        Ok(())
    }

    fn runtime_status(&self, flow_id: &str) -> Result<RuntimeStatusReport> {
        let mut guard = self.begin_request()?;
        let elapsed = guard.started.elapsed().as_secs_f64();
        let info = guard.runtime_info(flow_id).clone();

        // Running flows report a slow throughput wave so plots move
        let metrics = if info.state == RuntimeState::Running {
            let rate = 120.0 + 40.0 * (elapsed * 0.5).sin();
            vec![MetricsSample {
                timestamp: chrono::Utc::now(),
                messages_per_second: rate,
                bytes_per_second: rate * 96.0,
            }]
        } else {
            Vec::new()
        };

        let recent_logs = guard
            .logs
            .get(flow_id)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default();

        Ok(RuntimeStatusReport {
            info,
            metrics,
            recent_logs,
        })
    }
}

/// Catalog served when a test does not supply its own
fn default_catalog() -> Vec<ComponentType> {
    let mut udp_schema = ComponentSchema::default();
    udp_schema.properties.insert(
        "port".to_string(),
        PropertySpec::new(PropertyKind::Integer)
            .with_default(json!(5005))
            .with_range(1.0, 65535.0),
    );
    udp_schema.properties.insert(
        "bind_address".to_string(),
        PropertySpec::new(PropertyKind::String).with_default(json!("0.0.0.0")),
    );

    let mut transform_schema = ComponentSchema::default();
    transform_schema.properties.insert(
        "expression".to_string(),
        PropertySpec::new(PropertyKind::String).with_default(json!("$")),
    );
    transform_schema.properties.insert(
        "drop_invalid".to_string(),
        PropertySpec::new(PropertyKind::Boolean).with_default(json!(true)),
    );

    let mut file_schema = ComponentSchema::default();
    file_schema.properties.insert(
        "path".to_string(),
        PropertySpec::new(PropertyKind::String).with_default(json!("/var/log/flow/out.jsonl")),
    );

    vec![
        ComponentType {
            id: "udp_input".to_string(),
            name: "UDP Input".to_string(),
            type_name: "udp_input".to_string(),
            protocol: Some("udp".to_string()),
            category: ComponentCategory::Input,
            description: "Receives datagrams on a local port".to_string(),
            version: "1.0.0".to_string(),
            schema: Some(udp_schema),
            ports: None,
        },
        ComponentType {
            id: "json_transform".to_string(),
            name: "JSON Transform".to_string(),
            type_name: "json_transform".to_string(),
            protocol: None,
            category: ComponentCategory::Processor,
            description: "Reshapes messages with a JSONPath expression".to_string(),
            version: "1.0.0".to_string(),
            schema: Some(transform_schema),
            ports: None,
        },
        ComponentType {
            id: "file_writer".to_string(),
            name: "File Writer".to_string(),
            type_name: "file_writer".to_string(),
            protocol: None,
            category: ComponentCategory::Output,
            description: "Appends messages to a local file".to_string(),
            version: "1.0.0".to_string(),
            schema: Some(file_schema),
            ports: None,
        },
        // No schema on purpose; exercises the raw JSON fallback path
        ComponentType {
            id: "legacy_sink".to_string(),
            name: "Legacy Sink".to_string(),
            type_name: "legacy_sink".to_string(),
            protocol: None,
            category: ComponentCategory::Storage,
            description: "Storage adapter without a published schema".to_string(),
            version: "0.9.2".to_string(),
            schema: None,
            ports: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_catalog_and_schema_lookup() {
        let api = ScriptedFlowApi::new();
        let types = api.component_types().unwrap();
        assert_eq!(types.len(), 4);

        let schema = api.component_schema("udp_input").unwrap();
        assert!(schema.is_some());

        // Schema-less type resolves to None, not an error
        assert!(api.component_schema("legacy_sink").unwrap().is_none());
        assert!(api.component_schema("no_such_type").unwrap().is_none());
    }

    #[test]
    fn test_scripted_save_and_fetch_round_trip() {
        let api = ScriptedFlowApi::new();
        let flow = FlowGraph::new("flow-9", "Telemetry");

        assert!(api.save_flow(&flow).unwrap().is_none());
        let loaded = api.fetch_flow("flow-9").unwrap();
        assert_eq!(loaded.name, "Telemetry");

        let missing = api.fetch_flow("flow-404");
        assert!(matches!(
            missing,
            Err(FlowStudioError::Api { status: 404, .. })
        ));
    }

    #[test]
    fn test_lifecycle_transitions_and_conflict() {
        let api = ScriptedFlowApi::new();
        let controls = api.controls();

        api.control("flow-1", RuntimeAction::Deploy).unwrap();
        assert_eq!(
            controls.runtime_state("flow-1"),
            RuntimeState::DeployedStopped
        );

        api.control("flow-1", RuntimeAction::Start).unwrap();
        assert_eq!(controls.runtime_state("flow-1"), RuntimeState::Running);

        // Starting a running flow is a conflict
        let err = api.control("flow-1", RuntimeAction::Start).unwrap_err();
        assert!(matches!(err, FlowStudioError::Api { status: 409, .. }));

        api.control("flow-1", RuntimeAction::Stop).unwrap();
        assert_eq!(
            controls.runtime_state("flow-1"),
            RuntimeState::DeployedStopped
        );
    }

    #[test]
    fn test_offline_and_save_faults() {
        let api = ScriptedFlowApi::new();
        let controls = api.controls();
        let flow = FlowGraph::new("flow-2", "Faulty");

        controls.fail_next_saves(1);
        assert!(matches!(
            api.save_flow(&flow),
            Err(FlowStudioError::Api { status: 500, .. })
        ));
        assert!(api.save_flow(&flow).is_ok());
        assert_eq!(controls.save_count(), 1);

        controls.set_offline(true);
        assert!(matches!(
            api.component_types(),
            Err(FlowStudioError::Connectivity(_))
        ));
        controls.set_offline(false);
        assert!(api.component_types().is_ok());
    }

    #[test]
    fn test_running_flow_reports_metrics() {
        let api = ScriptedFlowApi::new();
        api.control("flow-3", RuntimeAction::Deploy).unwrap();

        let stopped = api.runtime_status("flow-3").unwrap();
        assert!(stopped.metrics.is_empty());

        api.control("flow-3", RuntimeAction::Start).unwrap();
        let running = api.runtime_status("flow-3").unwrap();
        assert_eq!(running.info.state, RuntimeState::Running);
        assert!(!running.metrics.is_empty());
        assert!(running.metrics[0].messages_per_second > 0.0);
        assert!(!running.recent_logs.is_empty());
    }
}
