//! Component type descriptors and configuration schemas.
//!
//! The backend owns the component registry; the editor only consumes the
//! descriptors it serves. Property defaults are kept as raw
//! [`serde_json::Value`]s so a schema default round-trips into the save
//! payload with its JSON type intact (numbers stay numbers, booleans stay
//! booleans).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Form section used for properties that declare no `category`
pub const DEFAULT_PROPERTY_SECTION: &str = "General";

/// Broad role of a component in a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentCategory {
    Input,
    #[default]
    Processor,
    Output,
    Storage,
}

impl ComponentCategory {
    /// Palette ordering: sources first, sinks last
    pub const ALL: [ComponentCategory; 4] = [
        ComponentCategory::Input,
        ComponentCategory::Processor,
        ComponentCategory::Output,
        ComponentCategory::Storage,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ComponentCategory::Input => "Inputs",
            ComponentCategory::Processor => "Processors",
            ComponentCategory::Output => "Outputs",
            ComponentCategory::Storage => "Storage",
        }
    }
}

/// Value kinds a property schema can declare
///
/// Each kind maps to exactly one form widget; anything the backend sends
/// outside this set fails descriptor parsing and the node falls back to the
/// raw JSON editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    String,
    Number,
    Integer,
    Boolean,
    Enum,
    Ports,
    Object,
}

/// Schema for a single configuration property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Form section this property is grouped under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// For `ports` properties: which node fields hold the port list
    #[serde(default, rename = "portFields", skip_serializing_if = "Option::is_none")]
    pub port_fields: Option<Vec<String>>,
}

impl PropertySpec {
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            description: None,
            default: None,
            minimum: None,
            maximum: None,
            enum_values: None,
            category: None,
            port_fields: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn section(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_PROPERTY_SECTION)
    }
}

/// Property map for a component type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentSchema {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySpec>,
}

impl ComponentSchema {
    /// Seed a node's config from schema defaults
    ///
    /// Defaults fill only keys absent from `existing`; values the user (or a
    /// loaded flow) already set always win. Cloned verbatim, so the JSON type
    /// of each default is preserved end to end.
    pub fn initial_config(&self, existing: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        let mut config = existing.clone();
        for (name, spec) in &self.properties {
            if !config.contains_key(name) {
                if let Some(default) = &spec.default {
                    config.insert(name.clone(), default.clone());
                }
            }
        }
        config
    }

    /// Properties grouped by form section, in stable order
    ///
    /// Sections appear in the order their first property appears in the
    /// (alphabetically keyed) property map, with the default section first.
    pub fn grouped_properties(&self) -> Vec<(&str, Vec<(&String, &PropertySpec)>)> {
        let mut sections: Vec<(&str, Vec<(&String, &PropertySpec)>)> = Vec::new();
        for (name, spec) in &self.properties {
            let section = spec.section();
            match sections.iter_mut().find(|(s, _)| *s == section) {
                Some((_, props)) => props.push((name, spec)),
                None => sections.push((section, vec![(name, spec)])),
            }
        }
        sections.sort_by_key(|(s, _)| *s != DEFAULT_PROPERTY_SECTION);
        sections
    }
}

/// Named input/output ports a component exposes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentPorts {
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// Descriptor for a component type known to the backend registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentType {
    pub id: String,
    pub name: String,
    /// Registry key, e.g. `udp_input` or `json_transform`
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default)]
    pub category: ComponentCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    /// Older backends send `configSchema`, newer ones `schema`
    #[serde(default, alias = "configSchema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<ComponentSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<ComponentPorts>,
}

impl ComponentType {
    /// Input port names, defaulting by category when the descriptor omits them
    pub fn input_ports(&self) -> Vec<String> {
        match &self.ports {
            Some(ports) => ports.inputs.clone(),
            None => match self.category {
                ComponentCategory::Input => Vec::new(),
                _ => vec!["in".to_string()],
            },
        }
    }

    /// Output port names, defaulting by category when the descriptor omits them
    pub fn output_ports(&self) -> Vec<String> {
        match &self.ports {
            Some(ports) => ports.outputs.clone(),
            None => match self.category {
                ComponentCategory::Output | ComponentCategory::Storage => Vec::new(),
                _ => vec!["out".to_string()],
            },
        }
    }
}
