//! The flow document: nodes, connections, and the mutation API.
//!
//! `FlowGraph` is what the editor edits and what the save endpoint
//! receives. Node and connection storage is private so every structural
//! change goes through methods that keep the wiring consistent (no dangling
//! endpoints, no duplicate links, no reused IDs).

use crate::error::{FlowStudioError, Result, ResultExt};
use crate::flow::component::ComponentType;
use crate::flow::id::{ConnectionId, NodeId};
use crate::flow::node::{CanvasPos, FlowNode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// A directed link between an output port and an input port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub from_node: NodeId,
    pub from_port: String,
    pub to_node: NodeId,
    pub to_port: String,
}

/// The editable flow document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowGraph {
    pub id: String,
    pub name: String,
    nodes: Vec<FlowNode>,
    connections: Vec<Connection>,
    // Counters survive serialization; the allocation floor below guards
    // documents saved by clients that did not record them.
    #[serde(default)]
    next_node_id: u32,
    #[serde(default)]
    next_connection_id: u32,
}

impl FlowGraph {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
            next_node_id: 0,
            next_connection_id: 0,
        }
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node(&self, id: NodeId) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of connections arriving at `id`
    pub fn incoming_count(&self, id: NodeId) -> usize {
        self.connections.iter().filter(|c| c.to_node == id).count()
    }

    /// Number of connections leaving `id`
    pub fn outgoing_count(&self, id: NodeId) -> usize {
        self.connections
            .iter()
            .filter(|c| c.from_node == id)
            .count()
    }

    /// Place a new instance of `component` on the canvas
    ///
    /// The node gets a unique display name derived from the component name
    /// and a config seeded from the schema defaults.
    pub fn add_node(&mut self, component: &ComponentType, position: CanvasPos) -> NodeId {
        let id = self.alloc_node_id();
        let name = self.unique_name(&component.name);
        let config = component
            .schema
            .as_ref()
            .map(|schema| schema.initial_config(&BTreeMap::new()))
            .unwrap_or_default();

        self.nodes.push(FlowNode {
            id,
            name,
            type_name: component.type_name.clone(),
            category: component.category,
            position,
            config,
        });
        id
    }

    /// Remove a node and every connection attached to it
    pub fn remove_node(&mut self, id: NodeId) -> Result<FlowNode> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| FlowStudioError::Flow(format!("{id} does not exist")))?;
        self.connections
            .retain(|c| c.from_node != id && c.to_node != id);
        Ok(self.nodes.remove(index))
    }

    pub fn move_node(&mut self, id: NodeId, position: CanvasPos) -> Result<()> {
        self.node_mut(id)?.position = position;
        Ok(())
    }

    /// Rename a node; names must be non-empty and unique within the flow
    pub fn rename_node(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(FlowStudioError::Flow("node name cannot be empty".into()));
        }
        if self.nodes.iter().any(|n| n.id != id && n.name == trimmed) {
            return Err(FlowStudioError::Flow(format!(
                "a node named '{trimmed}' already exists"
            )));
        }
        self.node_mut(id)?.name = trimmed.to_string();
        Ok(())
    }

    pub fn set_node_config(&mut self, id: NodeId, config: BTreeMap<String, Value>) -> Result<()> {
        self.node_mut(id)?.set_config(config);
        Ok(())
    }

    pub fn set_node_config_value(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        self.node_mut(id)?.set_config_value(key, value);
        Ok(())
    }

    /// Wire an output port to an input port
    ///
    /// Fan-in and fan-out are both allowed; rejected are self-loops,
    /// unknown endpoints, and exact duplicate links.
    pub fn connect(
        &mut self,
        from: NodeId,
        from_port: impl Into<String>,
        to: NodeId,
        to_port: impl Into<String>,
    ) -> Result<ConnectionId> {
        let from_port = from_port.into();
        let to_port = to_port.into();

        if from == to {
            return Err(FlowStudioError::Flow(
                "cannot connect a node to itself".into(),
            ));
        }
        if self.node(from).is_none() {
            return Err(FlowStudioError::Flow(format!("{from} does not exist")));
        }
        if self.node(to).is_none() {
            return Err(FlowStudioError::Flow(format!("{to} does not exist")));
        }
        if self.connections.iter().any(|c| {
            c.from_node == from
                && c.to_node == to
                && c.from_port == from_port
                && c.to_port == to_port
        }) {
            return Err(FlowStudioError::Flow(
                "these ports are already connected".into(),
            ));
        }

        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;
        self.connections.push(Connection {
            id,
            from_node: from,
            from_port,
            to_node: to,
            to_port,
        });
        Ok(id)
    }

    pub fn disconnect(&mut self, id: ConnectionId) -> Result<Connection> {
        let index = self
            .connections
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| FlowStudioError::Flow(format!("{id} does not exist")))?;
        Ok(self.connections.remove(index))
    }

    /// Write the document to disk as pretty-printed JSON
    ///
    /// Uses the same wire format the save endpoint receives, so an exported
    /// file can be imported against any backend.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| FlowStudioError::Serialization(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(FlowStudioError::Io)
            .with_context(|| format!("Failed to write flow file {}", path.display()))
    }

    /// Read a document written by [`FlowGraph::export_to_file`]
    pub fn import_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(FlowStudioError::Io)
            .with_context(|| format!("Failed to read flow file {}", path.display()))?;
        serde_json::from_str(&content).map_err(|e| {
            FlowStudioError::Serialization(format!(
                "{} is not a valid flow file: {e}",
                path.display()
            ))
        })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut FlowNode> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| FlowStudioError::Flow(format!("{id} does not exist")))
    }

    fn alloc_node_id(&mut self) -> NodeId {
        let floor = self.nodes.iter().map(|n| n.id.0 + 1).max().unwrap_or(0);
        let id = self.next_node_id.max(floor);
        self.next_node_id = id + 1;
        NodeId(id)
    }

    /// Derive a display name not yet used by any node
    fn unique_name(&self, base: &str) -> String {
        if !self.nodes.iter().any(|n| n.name == base) {
            return base.to_string();
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{base} {counter}");
            if !self.nodes.iter().any(|n| n.name == candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::component::{ComponentCategory, ComponentSchema, PropertyKind, PropertySpec};
    use serde_json::json;

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

    fn udp_input() -> ComponentType {
        let mut schema = ComponentSchema::default();
        schema.properties.insert(
            "port".to_string(),
            PropertySpec::new(PropertyKind::Integer).with_default(json!(5005)),
        );
        let mut component = component("udp_input", "UDP Input", ComponentCategory::Input);
        component.schema = Some(schema);
        component
    }

    #[test]
    fn test_add_node_seeds_defaults_and_unique_names() {
        let mut graph = FlowGraph::new("flow-1", "Test Flow");
        let a = graph.add_node(&udp_input(), CanvasPos::new(0.0, 0.0));
        let b = graph.add_node(&udp_input(), CanvasPos::new(100.0, 0.0));

        assert_eq!(graph.node(a).unwrap().name, "UDP Input");
        assert_eq!(graph.node(b).unwrap().name, "UDP Input 2");
        assert_eq!(graph.node(a).unwrap().config["port"], json!(5005));
    }

    #[test]
    fn test_remove_node_drops_attached_connections() {
        let mut graph = FlowGraph::new("flow-1", "Test Flow");
        let input = graph.add_node(&udp_input(), CanvasPos::default());
        let transform = graph.add_node(
            &component("json_transform", "JSON Transform", ComponentCategory::Processor),
            CanvasPos::default(),
        );
        let output = graph.add_node(
            &component("http_output", "HTTP Output", ComponentCategory::Output),
            CanvasPos::default(),
        );
        graph.connect(input, "out", transform, "in").unwrap();
        graph.connect(transform, "out", output, "in").unwrap();

        graph.remove_node(transform).unwrap();
        assert_eq!(graph.connection_count(), 0);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_connect_rejects_self_loop_and_duplicates() {
        let mut graph = FlowGraph::new("flow-1", "Test Flow");
        let a = graph.add_node(&udp_input(), CanvasPos::default());
        let b = graph.add_node(
            &component("log_output", "Log Output", ComponentCategory::Output),
            CanvasPos::default(),
        );

        assert!(graph.connect(a, "out", a, "in").is_err());
        graph.connect(a, "out", b, "in").unwrap();
        assert!(graph.connect(a, "out", b, "in").is_err());
        // A different port pair on the same nodes is fine
        graph.connect(a, "out", b, "errors").unwrap();
    }

    #[test]
    fn test_connect_rejects_unknown_endpoints() {
        let mut graph = FlowGraph::new("flow-1", "Test Flow");
        let a = graph.add_node(&udp_input(), CanvasPos::default());
        let err = graph.connect(a, "out", NodeId(99), "in");
        assert!(err.is_err());
    }

    #[test]
    fn test_node_ids_not_reused_after_removal() {
        let mut graph = FlowGraph::new("flow-1", "Test Flow");
        let a = graph.add_node(&udp_input(), CanvasPos::default());
        graph.remove_node(a).unwrap();
        let b = graph.add_node(&udp_input(), CanvasPos::default());
        assert_ne!(a, b);
    }

    #[test]
    fn test_rename_rejects_duplicates() {
        let mut graph = FlowGraph::new("flow-1", "Test Flow");
        let a = graph.add_node(&udp_input(), CanvasPos::default());
        let b = graph.add_node(&udp_input(), CanvasPos::default());
        assert!(graph.rename_node(b, "UDP Input").is_err());
        assert!(graph.rename_node(b, "  ").is_err());
        assert!(graph.rename_node(a, "Primary Input").is_ok());
    }

    #[test]
    fn test_document_round_trip_preserves_config_types() {
        let mut graph = FlowGraph::new("flow-1", "Test Flow");
        let a = graph.add_node(&udp_input(), CanvasPos::new(10.0, 20.0));
        graph
            .set_node_config_value(a, "enabled", json!(true))
            .unwrap();

        let json = serde_json::to_string(&graph).unwrap();
        let restored: FlowGraph = serde_json::from_str(&json).unwrap();

        let node = restored.node(a).unwrap();
        assert!(node.config["port"].is_i64());
        assert!(node.config["enabled"].is_boolean());
        assert_eq!(node.position.x, 10.0);
    }

    #[test]
    fn test_export_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.json");

        let mut graph = FlowGraph::new("flow-1", "Exported");
        let a = graph.add_node(&udp_input(), CanvasPos::new(10.0, 20.0));
        let b = graph.add_node(
            &component("file_writer", "File Writer", ComponentCategory::Storage),
            CanvasPos::default(),
        );
        graph.connect(a, "out", b, "in").unwrap();

        graph.export_to_file(&path).unwrap();
        let restored = FlowGraph::import_from_file(&path).unwrap();
        assert_eq!(restored.name, "Exported");
        assert_eq!(restored.node_count(), 2);
        assert_eq!(restored.connection_count(), 1);
        assert!(restored.node(a).unwrap().config["port"].is_i64());
    }

    #[test]
    fn test_import_rejects_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FlowGraph::import_from_file(dir.path().join("missing.json")).is_err());

        let path = dir.path().join("not_a_flow.json");
        std::fs::write(&path, r#"{"nope": true}"#).unwrap();
        assert!(FlowGraph::import_from_file(&path).is_err());
    }

    #[test]
    fn test_loaded_document_without_counters_allocates_fresh_ids() {
        let json = r#"{
            "id": "flow-1",
            "name": "Imported",
            "nodes": [{
                "id": 4,
                "name": "UDP Input",
                "type": "udp_input",
                "category": "input",
                "position": {"x": 0.0, "y": 0.0},
                "config": {}
            }],
            "connections": []
        }"#;
        let mut graph: FlowGraph = serde_json::from_str(json).unwrap();
        let fresh = graph.add_node(&udp_input(), CanvasPos::default());
        assert_eq!(fresh, NodeId(5));
    }
}
