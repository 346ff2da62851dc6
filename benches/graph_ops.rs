//! Benchmarks for flow document operations
//!
//! Run with: cargo bench

#![allow(dead_code)] // Benchmark helpers may not all be used in every group

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flowstudio_rs::flow::{
    lint_graph, CanvasPos, ComponentCategory, ComponentSchema, ComponentType, FlowGraph, NodeId,
    PropertyKind, PropertySpec,
};
use serde_json::json;

fn component(type_name: &str, category: ComponentCategory) -> ComponentType {
    let mut schema = ComponentSchema::default();
    schema.properties.insert(
        "address".to_string(),
        PropertySpec::new(PropertyKind::String).with_default(json!("0.0.0.0")),
    );
    schema.properties.insert(
        "port".to_string(),
        PropertySpec::new(PropertyKind::Integer)
            .with_default(json!(5005))
            .with_range(1.0, 65535.0),
    );

    ComponentType {
        id: type_name.to_string(),
        name: type_name.to_string(),
        type_name: type_name.to_string(),
        protocol: None,
        category,
        description: String::new(),
        version: "1.0.0".to_string(),
        schema: Some(schema),
        ports: None,
    }
}

/// An input feeding a chain of processors into one sink
fn linear_flow(nodes: usize) -> (FlowGraph, Vec<NodeId>) {
    let input = component("udp_input", ComponentCategory::Input);
    let processor = component("json_transform", ComponentCategory::Processor);
    let output = component("file_writer", ComponentCategory::Output);

    let mut flow = FlowGraph::new("bench", "Bench Flow");
    let mut ids = Vec::with_capacity(nodes);

    for i in 0..nodes {
        let kind = if i == 0 {
            &input
        } else if i + 1 == nodes {
            &output
        } else {
            &processor
        };
        let id = flow.add_node(kind, CanvasPos::new((i as f32) * 180.0, 0.0));
        if let Some(previous) = ids.last().copied() {
            flow.connect(previous, "out", id, "in").unwrap();
        }
        ids.push(id);
    }
    (flow, ids)
}

fn bench_node_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_insertion");
    let processor = component("json_transform", ComponentCategory::Processor);

    for size in [100, 500, 2000].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("add_node", size), size, |b, &size| {
            // Insert into a pre-populated flow; the unique-name scan is the
            // interesting cost
            let (flow, _) = linear_flow(size);
            b.iter_batched(
                || flow.clone(),
                |mut flow| {
                    let id = flow.add_node(black_box(&processor), CanvasPos::default());
                    black_box(id)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_connect(c: &mut Criterion) {
    let mut group = c.benchmark_group("connect");

    for size in [100, 1000].iter() {
        let (flow, ids) = linear_flow(*size);
        group.bench_with_input(BenchmarkId::new("duplicate_scan", size), size, |b, _| {
            let from = ids[0];
            let to = ids[ids.len() / 2];
            b.iter_batched(
                || flow.clone(),
                |mut flow| {
                    // A second edge between distant nodes; scans the full
                    // connection list for duplicates
                    black_box(flow.connect(from, "side", to, "side").unwrap())
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_lint(c: &mut Criterion) {
    let mut group = c.benchmark_group("lint");

    for size in [100, 1000, 5000].iter() {
        let (flow, _) = linear_flow(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("lint_graph", size), &flow, |b, flow| {
            b.iter(|| black_box(lint_graph(flow)));
        });
    }

    group.finish();
}

fn bench_wire_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire_serialization");

    for size in [100, 1000].iter() {
        let (flow, _) = linear_flow(*size);
        let wire = serde_json::to_string(&flow).unwrap();
        group.throughput(Throughput::Bytes(wire.len() as u64));

        group.bench_with_input(BenchmarkId::new("serialize", size), &flow, |b, flow| {
            b.iter(|| black_box(serde_json::to_string(flow).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("deserialize", size), &wire, |b, wire| {
            b.iter(|| black_box(serde_json::from_str::<FlowGraph>(wire).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_node_insertion,
    bench_connect,
    bench_lint,
    bench_wire_serialization,
);

criterion_main!(benches);
