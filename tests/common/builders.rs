//! Test data builders for creating test objects

use flowstudio_rs::flow::{
    CanvasPos, ComponentCategory, ComponentSchema, ComponentType, FlowGraph, NodeId, PropertyKind,
    PropertySpec,
};
use serde_json::json;

/// Builder for creating test ComponentTypes
pub struct ComponentTypeBuilder {
    type_name: String,
    name: String,
    category: ComponentCategory,
    schema: Option<ComponentSchema>,
}

impl ComponentTypeBuilder {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            name: type_name.to_string(),
            category: ComponentCategory::Processor,
            schema: None,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn category(mut self, category: ComponentCategory) -> Self {
        self.category = category;
        self
    }

    pub fn schema(mut self, schema: ComponentSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn build(self) -> ComponentType {
        ComponentType {
            id: self.type_name.clone(),
            name: self.name,
            type_name: self.type_name,
            protocol: None,
            category: self.category,
            description: String::new(),
            version: "1.0.0".to_string(),
            schema: self.schema,
            ports: None,
        }
    }
}

/// Schema with one string property carrying a default
pub fn schema_with_default(property: &str, default: serde_json::Value) -> ComponentSchema {
    let mut schema = ComponentSchema::default();
    schema.properties.insert(
        property.to_string(),
        PropertySpec::new(PropertyKind::String).with_default(default),
    );
    schema
}

/// A three-node input -> processor -> output flow, fully wired
pub fn linear_flow(id: &str) -> (FlowGraph, [NodeId; 3]) {
    let input = ComponentTypeBuilder::new("udp_input")
        .name("UDP Input")
        .category(ComponentCategory::Input)
        .schema(schema_with_default("bind_address", json!("0.0.0.0")))
        .build();
    let transform = ComponentTypeBuilder::new("json_transform")
        .name("JSON Transform")
        .build();
    let output = ComponentTypeBuilder::new("file_writer")
        .name("File Writer")
        .category(ComponentCategory::Output)
        .build();

    let mut flow = FlowGraph::new(id, "Test Flow");
    let a = flow.add_node(&input, CanvasPos::new(0.0, 0.0));
    let b = flow.add_node(&transform, CanvasPos::new(200.0, 0.0));
    let c = flow.add_node(&output, CanvasPos::new(400.0, 0.0));
    flow.connect(a, "out", b, "in").expect("input -> transform");
    flow.connect(b, "out", c, "in").expect("transform -> output");
    (flow, [a, b, c])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_type_builder() {
        let component = ComponentTypeBuilder::new("udp_input")
            .name("UDP Input")
            .category(ComponentCategory::Input)
            .build();

        assert_eq!(component.type_name, "udp_input");
        assert_eq!(component.name, "UDP Input");
        assert_eq!(component.category, ComponentCategory::Input);
        assert!(component.schema.is_none());
    }

    #[test]
    fn test_linear_flow_builder() {
        let (flow, [a, _, c]) = linear_flow("flow-1");
        assert_eq!(flow.node_count(), 3);
        assert_eq!(flow.connection_count(), 2);
        assert!(flow.node(a).is_some());
        assert!(flow.node(c).is_some());
    }
}
