//! Document nodes: placed component instances with their configuration.
//!
//! Unlike the component descriptors (backend-owned), nodes belong to the
//! flow document and travel with it through save and export. Positions are
//! part of the document so a flow reopens with its layout intact.

use crate::flow::component::ComponentCategory;
use crate::flow::id::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Node position in canvas (world) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasPos {
    pub x: f32,
    pub y: f32,
}

impl CanvasPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A component instance placed on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: NodeId,
    /// Display name, unique within the flow
    pub name: String,
    /// Registry key of the component type this node instantiates
    #[serde(rename = "type")]
    pub type_name: String,
    pub category: ComponentCategory,
    pub position: CanvasPos,
    /// Configuration values keyed by property name, kept as raw JSON so
    /// schema defaults and user edits serialize with their types intact
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
}

impl FlowNode {
    /// Replace this node's configuration wholesale
    pub fn set_config(&mut self, config: BTreeMap<String, Value>) {
        self.config = config;
    }

    /// Set a single configuration value
    pub fn set_config_value(&mut self, key: impl Into<String>, value: Value) {
        self.config.insert(key.into(), value);
    }
}
