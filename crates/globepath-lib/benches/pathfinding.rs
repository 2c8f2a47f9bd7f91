use criterion::{criterion_group, criterion_main, Criterion};
use globepath_lib::{
    build_graph, compute_path, find_path, load_feature_collection, EngineOptions, FeatureSet,
    GraphBuildOptions, GraphStore, GraphStrategy, NoopNotifier, PathRequest, PointRecord,
};
use once_cell::sync::Lazy;
use std::hint::black_box;
use std::path::PathBuf;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures/europe.geojson")
}

static EUROPE: Lazy<GraphStore> = Lazy::new(|| {
    let features = load_feature_collection(&fixture_path()).expect("fixture loads");
    build_graph(&features, &GraphBuildOptions::default())
});

/// A 20x20 lattice of cities spread over the globe.
static LATTICE: Lazy<FeatureSet> = Lazy::new(|| {
    let points = (0..400)
        .map(|i| PointRecord {
            name: format!("city-{i}"),
            coordinate: [
                -170.0 + (i % 20) as f64 * 17.0,
                -80.0 + (i / 20) as f64 * 8.0,
            ],
        })
        .collect();
    FeatureSet {
        points,
        ..FeatureSet::default()
    }
});

static LATTICE_NEAREST: Lazy<GraphStore> = Lazy::new(|| {
    build_graph(
        &LATTICE,
        &GraphBuildOptions {
            strategy: GraphStrategy::NearestNeighbor { k: 4 },
            ..GraphBuildOptions::default()
        },
    )
});

fn benchmark_pathfinding(c: &mut Criterion) {
    c.bench_function("dijkstra_madrid_vienna", |b| {
        let graph = &*EUROPE;
        b.iter(|| {
            let outcome = find_path(graph, "Madrid", "Vienna").expect("cities resolve");
            black_box(outcome.path().map(|path| path.total_cost))
        });
    });

    c.bench_function("dijkstra_lattice_corner_to_corner", |b| {
        let graph = &*LATTICE_NEAREST;
        let request = PathRequest::validate(graph, Some(0), Some(graph.len() - 1))
            .expect("lattice is populated");
        let options = EngineOptions::immediate();
        b.iter(|| {
            let outcome = compute_path(graph, request, &NoopNotifier, &options);
            black_box(outcome.state())
        });
    });

    c.bench_function("build_nearest_neighbor_lattice", |b| {
        let options = GraphBuildOptions {
            strategy: GraphStrategy::NearestNeighbor { k: 4 },
            ..GraphBuildOptions::default()
        };
        b.iter(|| black_box(build_graph(&LATTICE, &options).edge_count()));
    });

    c.bench_function("build_threshold_lattice", |b| {
        let options = GraphBuildOptions {
            strategy: GraphStrategy::Threshold { max_distance: 2.0 },
            ..GraphBuildOptions::default()
        };
        b.iter(|| black_box(build_graph(&LATTICE, &options).edge_count()));
    });
}

criterion_group!(benches, benchmark_pathfinding);
criterion_main!(benches);
