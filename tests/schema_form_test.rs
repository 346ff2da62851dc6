//! Integration tests for the schema-driven document workflow
//!
//! These tests validate how component schemas shape node configuration:
//! - Placing a node seeds its config from schema defaults
//! - Loaded values survive re-seeding
//! - Property grouping for the inspector form
//! - Document edits keep the wire format the backend expects

mod common;

use common::builders::{linear_flow, schema_with_default, ComponentTypeBuilder};
use flowstudio_rs::flow::{
    lint_graph, CanvasPos, ComponentCategory, ComponentSchema, FlowGraph, PropertyKind,
    PropertySpec, DEFAULT_PROPERTY_SECTION,
};
use serde_json::json;
use std::collections::BTreeMap;

#[test]
fn test_add_node_seeds_schema_defaults() {
    let mut schema = ComponentSchema::default();
    schema.properties.insert(
        "port".to_string(),
        PropertySpec::new(PropertyKind::Integer)
            .with_default(json!(5005))
            .with_range(1.0, 65535.0),
    );
    schema.properties.insert(
        "bind_address".to_string(),
        PropertySpec::new(PropertyKind::String).with_default(json!("0.0.0.0")),
    );
    // No default; must not appear in the seeded config
    schema.properties.insert(
        "multicast_group".to_string(),
        PropertySpec::new(PropertyKind::String),
    );

    let component = ComponentTypeBuilder::new("udp_input")
        .name("UDP Input")
        .category(ComponentCategory::Input)
        .schema(schema)
        .build();

    let mut flow = FlowGraph::new("flow-1", "Seeding");
    let id = flow.add_node(&component, CanvasPos::new(10.0, 20.0));

    let node = flow.node(id).unwrap();
    assert_eq!(node.config.get("port"), Some(&json!(5005)));
    assert_eq!(node.config.get("bind_address"), Some(&json!("0.0.0.0")));
    assert!(!node.config.contains_key("multicast_group"));

    // The JSON type of the default carries through untouched
    assert!(node.config.get("port").unwrap().is_i64());
}

#[test]
fn test_existing_values_win_over_defaults() {
    let schema = schema_with_default("path", json!("/var/log/flow/out.jsonl"));

    let mut existing = BTreeMap::new();
    existing.insert("path".to_string(), json!("/tmp/custom.jsonl"));
    existing.insert("extra".to_string(), json!(true));

    let seeded = schema.initial_config(&existing);
    assert_eq!(seeded.get("path"), Some(&json!("/tmp/custom.jsonl")));
    // Keys the schema does not know about are preserved
    assert_eq!(seeded.get("extra"), Some(&json!(true)));
}

#[test]
fn test_grouped_properties_put_general_section_first() {
    let mut schema = ComponentSchema::default();
    let mut advanced = PropertySpec::new(PropertyKind::Number);
    advanced.category = Some("Advanced".to_string());
    schema.properties.insert("timeout".to_string(), advanced);
    schema.properties.insert(
        "address".to_string(),
        PropertySpec::new(PropertyKind::String),
    );

    let sections = schema.grouped_properties();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].0, DEFAULT_PROPERTY_SECTION);
    assert_eq!(sections[1].0, "Advanced");
    assert_eq!(sections[0].1[0].0, "address");
}

#[test]
fn test_repeated_components_get_numbered_names() {
    let component = ComponentTypeBuilder::new("json_transform")
        .name("JSON Transform")
        .build();

    let mut flow = FlowGraph::new("flow-2", "Names");
    let a = flow.add_node(&component, CanvasPos::default());
    let b = flow.add_node(&component, CanvasPos::default());
    let c = flow.add_node(&component, CanvasPos::default());

    assert_eq!(flow.node(a).unwrap().name, "JSON Transform");
    assert_eq!(flow.node(b).unwrap().name, "JSON Transform 2");
    assert_eq!(flow.node(c).unwrap().name, "JSON Transform 3");

    // Renames collide with live names only
    assert!(flow.rename_node(c, "JSON Transform 2").is_err());
    flow.remove_node(b).unwrap();
    assert!(flow.rename_node(c, "JSON Transform 2").is_ok());
}

#[test]
fn test_removing_node_detaches_connections_and_lint_notices() {
    let (mut flow, [a, b, c]) = linear_flow("flow-3");
    assert!(lint_graph(&flow).is_clean());

    flow.remove_node(b).unwrap();
    assert_eq!(flow.connection_count(), 0);

    // Input and sink both dangle now
    let result = lint_graph(&flow);
    assert_eq!(result.warnings.len(), 2);
    let names: Vec<&str> = result
        .warnings
        .iter()
        .map(|i| i.component_name.as_str())
        .collect();
    assert!(names.contains(&flow.node(a).unwrap().name.as_str()));
    assert!(names.contains(&flow.node(c).unwrap().name.as_str()));
}

#[test]
fn test_config_edits_land_in_the_wire_format() {
    let (mut flow, [a, _, _]) = linear_flow("flow-4");

    flow.set_node_config_value(a, "bind_address", json!("127.0.0.1"))
        .unwrap();

    let wire = serde_json::to_value(&flow).unwrap();
    assert_eq!(wire["id"], json!("flow-4"));
    assert_eq!(wire["name"], json!("Test Flow"));

    // Nodes carry `type` and typed config values
    let node = &wire["nodes"][0];
    assert_eq!(node["type"], json!("udp_input"));
    assert_eq!(node["config"]["bind_address"], json!("127.0.0.1"));

    // Connections use camelCase endpoint names
    let connection = &wire["connections"][0];
    assert!(connection["fromNode"].is_number());
    assert!(connection["toNode"].is_number());
    assert_eq!(connection["fromPort"], json!("out"));
    assert_eq!(connection["toPort"], json!("in"));
}

#[test]
fn test_loaded_flow_survives_edit_round_trip() {
    let (flow, _) = linear_flow("flow-5");
    let wire = serde_json::to_string(&flow).unwrap();

    let mut loaded: FlowGraph = serde_json::from_str(&wire).unwrap();
    assert_eq!(loaded.node_count(), 3);

    // New nodes after a load must not reuse existing IDs
    let component = ComponentTypeBuilder::new("file_writer")
        .name("File Writer")
        .category(ComponentCategory::Output)
        .build();
    let new_id = loaded.add_node(&component, CanvasPos::default());
    let ids: Vec<_> = loaded.nodes().iter().map(|n| n.id).collect();
    assert_eq!(
        ids.iter().filter(|id| **id == new_id).count(),
        1,
        "New node ID should be unique"
    );
}
