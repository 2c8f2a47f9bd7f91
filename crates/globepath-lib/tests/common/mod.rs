//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use globepath_lib::{
    build_graph, load_feature_collection, GraphBuildOptions, GraphStore, GraphStrategy,
    Projection,
};

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

pub fn europe_path() -> PathBuf {
    fixtures_dir().join("europe.geojson")
}

/// The European fixture built with the given strategy on the default sphere.
pub fn europe_graph(strategy: GraphStrategy) -> GraphStore {
    let features = load_feature_collection(&europe_path()).expect("fixture loads");
    build_graph(
        &features,
        &GraphBuildOptions {
            strategy,
            ..GraphBuildOptions::default()
        },
    )
}

/// Planar triangle where the two-hop route A-B-C (2.0) beats the direct A-C (5.0).
pub fn triangle() -> GraphStore {
    let mut graph = GraphStore::new(Projection::Planar);
    let a = graph.add_node("A", [0.0, 0.0]);
    let b = graph.add_node("B", [1.0, 0.0]);
    let c = graph.add_node("C", [2.0, 0.0]);
    graph
        .add_edge(a, b, 1.0, Some("a-b".to_string()))
        .expect("valid weight");
    graph
        .add_edge(b, c, 1.0, Some("b-c".to_string()))
        .expect("valid weight");
    graph
        .add_edge(a, c, 5.0, Some("a-c".to_string()))
        .expect("valid weight");
    graph
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
