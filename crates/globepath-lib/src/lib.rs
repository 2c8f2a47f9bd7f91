//! globepath library entry points.
//!
//! This crate turns a GeoJSON feature collection of cities and connections into
//! a weighted undirected graph, and runs Dijkstra over it either to completion
//! or one externally paced step at a time. Higher-level consumers (the CLI, a
//! renderer) should only depend on the items exported here and observe progress
//! through [`PathNotifier`].
//!

#![deny(warnings)]

pub mod engine;
pub mod error;
pub mod geojson;
pub mod graph;
pub mod notify;
pub mod session;
pub mod sphere;

pub use engine::{
    compute_path, find_path, DijkstraState, EngineOptions, EngineState, PathOutcome,
    PathRequest, PathResult, SteppedRun,
};
pub use error::{ConfigurationError, Error, Result};
pub use geojson::{
    load_feature_collection, parse_feature_collection, Coordinate, FeatureIssue, FeatureSet,
    PointRecord, SegmentRecord,
};
pub use graph::{
    build_graph, EdgeId, EdgeInsert, EdgeRecord, GraphBuildOptions, GraphStore, GraphStrategy,
    Node, NodeId,
};
pub use notify::{
    NoopNotifier, PathEvent, PathNotifier, RecordingNotifier, TracingNotifier, VisualState,
};
pub use session::{NodeState, PathSession};
pub use sphere::{Position, Projection, Sphere};
