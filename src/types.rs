//! Core data types shared between the editor and the service client
//!
//! This module defines the runtime lifecycle model, backend connectivity
//! status, and the monitor sample types. Editing-side types (graph, nodes,
//! schemas) live in [`crate::flow`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reachability of the backend service, shown in the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendStatus {
    /// No request has succeeded yet
    #[default]
    Disconnected,
    /// A request is in flight after a period of no contact
    Connecting,
    /// The last request succeeded
    Connected,
    /// The last request failed
    Error,
}

impl std::fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendStatus::Disconnected => write!(f, "Disconnected"),
            BackendStatus::Connecting => write!(f, "Connecting..."),
            BackendStatus::Connected => write!(f, "Connected"),
            BackendStatus::Error => write!(f, "Error"),
        }
    }
}

/// Deployment lifecycle of a flow, as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeState {
    /// The flow has never been deployed (or was undeployed)
    #[default]
    NotDeployed,
    /// Deployed to the runtime but not processing
    DeployedStopped,
    /// Actively processing data
    Running,
    /// The runtime reported a failure
    Error,
}

impl std::fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeState::NotDeployed => write!(f, "Not deployed"),
            RuntimeState::DeployedStopped => write!(f, "Stopped"),
            RuntimeState::Running => write!(f, "Running"),
            RuntimeState::Error => write!(f, "Error"),
        }
    }
}

/// Runtime state snapshot from the backend
///
/// `message` is populated only when `state` is [`RuntimeState::Error`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStateInfo {
    pub state: RuntimeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition: Option<DateTime<Utc>>,
}

/// Lifecycle control actions the editor can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeAction {
    Deploy,
    Start,
    Stop,
}

impl RuntimeAction {
    /// Button label for the status bar
    pub fn label(&self) -> &'static str {
        match self {
            RuntimeAction::Deploy => "Deploy",
            RuntimeAction::Start => "Start",
            RuntimeAction::Stop => "Stop",
        }
    }

    /// Path segment of the control endpoint
    pub fn endpoint(&self) -> &'static str {
        match self {
            RuntimeAction::Deploy => "deploy",
            RuntimeAction::Start => "start",
            RuntimeAction::Stop => "stop",
        }
    }
}

impl std::fmt::Display for RuntimeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which single lifecycle action the UI may offer for a runtime state
///
/// Returns the action to show and whether it is enabled. Exactly one action
/// exists per state except `Error`, which offers none until the backend
/// recovers. Deploy is the only action gated on flow validity.
pub fn available_runtime_action(
    state: RuntimeState,
    is_flow_valid: bool,
) -> Option<(RuntimeAction, bool)> {
    match state {
        RuntimeState::NotDeployed => Some((RuntimeAction::Deploy, is_flow_valid)),
        RuntimeState::DeployedStopped => Some((RuntimeAction::Start, true)),
        RuntimeState::Running => Some((RuntimeAction::Stop, true)),
        RuntimeState::Error => None,
    }
}

/// One throughput measurement from the runtime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSample {
    pub timestamp: DateTime<Utc>,
    pub messages_per_second: f64,
    #[serde(default)]
    pub bytes_per_second: f64,
}

/// Severity of a runtime log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// One log line emitted by a running flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    /// Name of the component that produced the line, when attributable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub message: String,
}

/// Full runtime status payload returned by the status endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStatusReport {
    #[serde(flatten)]
    pub info: RuntimeStateInfo,
    #[serde(default)]
    pub metrics: Vec<MetricsSample>,
    #[serde(default)]
    pub recent_logs: Vec<LogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_offers_only_stop() {
        let action = available_runtime_action(RuntimeState::Running, true);
        assert_eq!(action, Some((RuntimeAction::Stop, true)));
        // Validity must not affect states other than NotDeployed
        let action = available_runtime_action(RuntimeState::Running, false);
        assert_eq!(action, Some((RuntimeAction::Stop, true)));
    }

    #[test]
    fn test_deploy_gated_on_validity() {
        assert_eq!(
            available_runtime_action(RuntimeState::NotDeployed, true),
            Some((RuntimeAction::Deploy, true))
        );
        assert_eq!(
            available_runtime_action(RuntimeState::NotDeployed, false),
            Some((RuntimeAction::Deploy, false))
        );
    }

    #[test]
    fn test_stopped_offers_start_unconditionally() {
        assert_eq!(
            available_runtime_action(RuntimeState::DeployedStopped, false),
            Some((RuntimeAction::Start, true))
        );
    }

    #[test]
    fn test_error_offers_no_action() {
        assert_eq!(available_runtime_action(RuntimeState::Error, true), None);
        assert_eq!(available_runtime_action(RuntimeState::Error, false), None);
    }

    #[test]
    fn test_runtime_state_wire_names() {
        let json = serde_json::to_string(&RuntimeState::NotDeployed).unwrap();
        assert_eq!(json, "\"not_deployed\"");
        let state: RuntimeState = serde_json::from_str("\"deployed_stopped\"").unwrap();
        assert_eq!(state, RuntimeState::DeployedStopped);
    }

    #[test]
    fn test_runtime_report_parses_minimal_payload() {
        let report: RuntimeStatusReport =
            serde_json::from_str(r#"{"state": "running"}"#).unwrap();
        assert_eq!(report.info.state, RuntimeState::Running);
        assert!(report.info.message.is_none());
        assert!(report.metrics.is_empty());
        assert!(report.recent_logs.is_empty());
    }
}
