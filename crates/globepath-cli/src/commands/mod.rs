//! Subcommand handlers.
//!
//! `main.rs` parses arguments and dispatches here; graph loading is shared by
//! every command.

pub mod graph;
pub mod route;

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use tracing::debug;

use globepath_lib::engine::DEFAULT_VISIT_DELAY;
use globepath_lib::graph::{DEFAULT_MAX_DISTANCE, DEFAULT_NEIGHBORS};
use globepath_lib::sphere::DEFAULT_RADIUS;
use globepath_lib::{
    build_graph, load_feature_collection, FeatureSet, GraphBuildOptions, GraphStore,
    GraphStrategy, Projection, Sphere,
};

/// How source coordinates are placed in space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProjectionKind {
    /// `[lon, lat]` degrees on a sphere; distances are arc lengths.
    Sphere,
    /// Flat `[x, y]` map units; distances are Euclidean.
    Planar,
}

/// Where edges come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Line segments present in the input.
    Explicit,
    /// Each city connects to its k closest cities.
    Nearest,
    /// Every pair of cities within --max-distance.
    Threshold,
}

/// Graph construction options shared by all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    /// Coordinate projection.
    #[arg(long, value_enum, global = true, default_value_t = ProjectionKind::Sphere)]
    pub projection: ProjectionKind,

    /// Sphere radius used for positions and arc distances.
    #[arg(long, global = true, default_value_t = DEFAULT_RADIUS)]
    pub radius: f64,

    /// Edge generation strategy.
    #[arg(long, value_enum, global = true, default_value_t = StrategyKind::Explicit)]
    pub strategy: StrategyKind,

    /// Neighbours per city for the nearest strategy.
    #[arg(short = 'k', long = "neighbors", global = true, default_value_t = DEFAULT_NEIGHBORS)]
    pub neighbors: usize,

    /// Maximum pair distance for the threshold strategy.
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DISTANCE)]
    pub max_distance: f64,
}

impl GraphArgs {
    pub fn build_options(&self) -> Result<GraphBuildOptions> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            bail!("--radius must be a positive number, got {}", self.radius);
        }
        if !(self.max_distance.is_finite() && self.max_distance >= 0.0) {
            bail!(
                "--max-distance must be a non-negative number, got {}",
                self.max_distance
            );
        }

        let projection = match self.projection {
            ProjectionKind::Sphere => Projection::Sphere(Sphere::new(self.radius)),
            ProjectionKind::Planar => Projection::Planar,
        };
        let strategy = match self.strategy {
            StrategyKind::Explicit => GraphStrategy::Explicit,
            StrategyKind::Nearest => GraphStrategy::NearestNeighbor { k: self.neighbors },
            StrategyKind::Threshold => GraphStrategy::Threshold {
                max_distance: self.max_distance,
            },
        };
        Ok(GraphBuildOptions {
            strategy,
            projection,
        })
    }
}

/// Default pause between visiting and visited in stepped mode, in milliseconds.
pub fn default_visit_delay_ms() -> u64 {
    u64::try_from(DEFAULT_VISIT_DELAY.as_millis()).unwrap_or(u64::MAX)
}

/// Read the input file and build the graph it describes.
pub fn load_graph(
    input: Option<&Path>,
    args: &GraphArgs,
) -> Result<(FeatureSet, GraphStore, GraphBuildOptions)> {
    let path = input.context("no input file; pass --input or set GLOBEPATH_INPUT")?;
    let options = args.build_options()?;
    let features = load_feature_collection(path)
        .with_context(|| format!("failed to load features from {}", path.display()))?;
    debug!(
        path = %path.display(),
        records = features.record_count(),
        issues = features.issues.len(),
        "features loaded"
    );
    let graph = build_graph(&features, &options);
    Ok((features, graph, options))
}
