//! Validation results and the local structural lint.
//!
//! The backend is the authority on flow validity; its findings arrive with
//! save responses as a [`ValidationResult`]. The lint here runs locally on
//! every edit so the canvas can flag obviously broken wiring without a save
//! round-trip.

use crate::flow::component::ComponentCategory;
use crate::flow::graph::FlowGraph;
use serde::{Deserialize, Serialize};

/// Severity of a validation finding
///
/// Errors demote a successful save to draft; warnings do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
}

/// One finding about a flow, from the backend or the local lint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Machine-readable category, e.g. `missing_property` or `no_upstream`
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: IssueSeverity,
    pub component_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_name: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ValidationIssue {
    pub fn new(
        kind: impl Into<String>,
        severity: IssueSeverity,
        component_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            severity,
            component_name: component_name.into(),
            port_name: None,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }
}

/// Outcome of validating a flow, split by severity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(default)]
    pub errors: Vec<ValidationIssue>,
    #[serde(default)]
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }

    /// File an issue under the list matching its severity
    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            IssueSeverity::Error => self.errors.push(issue),
            IssueSeverity::Warning => self.warnings.push(issue),
        }
    }

    /// Iterate errors then warnings
    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

/// Structural checks cheap enough to run on every edit
///
/// Flags nodes that cannot participate in data flow: inputs nothing reads
/// from, sinks nothing feeds, and processors missing either side. All
/// findings are warnings; only the backend can produce errors.
pub fn lint_graph(graph: &FlowGraph) -> ValidationResult {
    let mut result = ValidationResult::default();

    for node in graph.nodes() {
        let incoming = graph.incoming_count(node.id);
        let outgoing = graph.outgoing_count(node.id);

        match node.category {
            ComponentCategory::Input => {
                if outgoing == 0 {
                    result.push(ValidationIssue::new(
                        "no_downstream",
                        IssueSeverity::Warning,
                        &node.name,
                        "input is not connected to anything; its data goes nowhere",
                    ));
                }
            }
            ComponentCategory::Output | ComponentCategory::Storage => {
                if incoming == 0 {
                    result.push(ValidationIssue::new(
                        "no_upstream",
                        IssueSeverity::Warning,
                        &node.name,
                        "nothing is connected to this sink; it will never receive data",
                    ));
                }
            }
            ComponentCategory::Processor => {
                if incoming == 0 {
                    result.push(ValidationIssue::new(
                        "no_upstream",
                        IssueSeverity::Warning,
                        &node.name,
                        "processor has no incoming connection",
                    ));
                }
                if outgoing == 0 {
                    result.push(ValidationIssue::new(
                        "no_downstream",
                        IssueSeverity::Warning,
                        &node.name,
                        "processor output is not consumed",
                    ));
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::component::ComponentType;
    use crate::flow::node::CanvasPos;

    fn component(type_name: &str, name: &str, category: ComponentCategory) -> ComponentType {
        ComponentType {
            id: type_name.to_string(),
            name: name.to_string(),
            type_name: type_name.to_string(),
            protocol: None,
            category,
            description: String::new(),
            version: "1.0.0".to_string(),
            schema: None,
            ports: None,
        }
    }

    #[test]
    fn test_connected_chain_lints_clean() {
        let mut graph = FlowGraph::new("flow-1", "Chain");
        let a = graph.add_node(
            &component("udp_input", "UDP Input", ComponentCategory::Input),
            CanvasPos::default(),
        );
        let b = graph.add_node(
            &component("json_transform", "Transform", ComponentCategory::Processor),
            CanvasPos::default(),
        );
        let c = graph.add_node(
            &component("file_writer", "File Writer", ComponentCategory::Storage),
            CanvasPos::default(),
        );
        graph.connect(a, "out", b, "in").unwrap();
        graph.connect(b, "out", c, "in").unwrap();

        assert!(lint_graph(&graph).is_clean());
    }

    #[test]
    fn test_dangling_processor_gets_both_warnings() {
        let mut graph = FlowGraph::new("flow-1", "Dangling");
        graph.add_node(
            &component("json_transform", "Transform", ComponentCategory::Processor),
            CanvasPos::default(),
        );

        let result = lint_graph(&graph);
        assert_eq!(result.warnings.len(), 2);
        assert!(!result.has_errors());
        let kinds: Vec<&str> = result.warnings.iter().map(|i| i.kind.as_str()).collect();
        assert!(kinds.contains(&"no_upstream"));
        assert!(kinds.contains(&"no_downstream"));
    }

    #[test]
    fn test_empty_graph_is_clean() {
        let graph = FlowGraph::new("flow-1", "Empty");
        assert!(lint_graph(&graph).is_clean());
    }

    #[test]
    fn test_issue_wire_format_uses_backend_field_names() {
        let json = r#"{
            "type": "missing_property",
            "severity": "error",
            "component_name": "UDP Input",
            "port_name": "out",
            "message": "port is required",
            "suggestions": ["set port to a value between 1 and 65535"]
        }"#;
        let issue: ValidationIssue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.kind, "missing_property");
        assert_eq!(issue.severity, IssueSeverity::Error);
        assert_eq!(issue.port_name.as_deref(), Some("out"));
        assert_eq!(issue.suggestions.len(), 1);
    }

    #[test]
    fn test_push_routes_by_severity() {
        let mut result = ValidationResult::default();
        result.push(ValidationIssue::new(
            "x",
            IssueSeverity::Error,
            "A",
            "broken",
        ));
        result.push(ValidationIssue::new(
            "y",
            IssueSeverity::Warning,
            "B",
            "odd",
        ));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.issue_count(), 2);
        assert!(result.has_errors());
    }
}
