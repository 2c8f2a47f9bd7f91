use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geojson::{Coordinate, FeatureSet};
use crate::sphere::{Position, Projection};

/// Dense identifier for a city, assigned in insertion order.
pub type NodeId = usize;

/// Dense identifier for an undirected edge, assigned in insertion order.
pub type EdgeId = usize;

/// Default fan-out for nearest-neighbour construction.
pub const DEFAULT_NEIGHBORS: usize = 3;

/// Default maximum arc distance for threshold meshes.
pub const DEFAULT_MAX_DISTANCE: f64 = 300.0;

/// Coordinates are matched after rounding to three decimal places.
const COORDINATE_SCALE: f64 = 1_000.0;

/// Rounded coordinate used to look cities up by their source coordinate.
///
/// Stored and queried coordinates go through the same rounding, so float
/// noise below the quantum does not break endpoint resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey([i64; 2]);

impl CoordinateKey {
    pub fn new(coordinate: Coordinate) -> Self {
        Self([quantize(coordinate[0]), quantize(coordinate[1])])
    }
}

fn quantize(value: f64) -> i64 {
    (value * COORDINATE_SCALE).round() as i64
}

/// City registered in the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub coordinate: Coordinate,
    pub position: Position,
}

/// Undirected weighted connection between two cities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub a: NodeId,
    pub b: NodeId,
    pub weight: f64,
    /// Identity of the visual line this edge is drawn with, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
}

impl EdgeRecord {
    /// Whether this edge joins `x` and `y`, in either order.
    pub fn connects(&self, x: NodeId, y: NodeId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    /// The endpoint opposite `node`.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.a == node {
            Some(self.b)
        } else if self.b == node {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Outgoing entry in a city's adjacency list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjacency {
    pub target: NodeId,
    pub weight: f64,
    pub edge: EdgeId,
}

/// Result of an edge insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Inserted(EdgeId),
    /// The pair was already connected; the stored weight was kept.
    Existing(EdgeId),
}

impl EdgeInsert {
    pub fn edge(self) -> EdgeId {
        match self {
            EdgeInsert::Inserted(edge) | EdgeInsert::Existing(edge) => edge,
        }
    }
}

/// Edge-generation strategy used when building a graph from features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphStrategy {
    /// Use the line segments present in the source data.
    Explicit,
    /// Connect every city to its `k` closest cities.
    NearestNeighbor { k: usize },
    /// Connect every pair of cities closer than `max_distance`.
    Threshold { max_distance: f64 },
}

impl fmt::Display for GraphStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphStrategy::Explicit => f.write_str("explicit"),
            GraphStrategy::NearestNeighbor { k } => write!(f, "nearest (k={k})"),
            GraphStrategy::Threshold { max_distance } => {
                write!(f, "threshold (max={max_distance})")
            }
        }
    }
}

/// Options controlling [`build_graph`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphBuildOptions {
    pub strategy: GraphStrategy,
    pub projection: Projection,
}

impl Default for GraphBuildOptions {
    fn default() -> Self {
        Self {
            strategy: GraphStrategy::Explicit,
            projection: Projection::default(),
        }
    }
}

/// Cities and their symmetric weighted adjacency.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    projection: Projection,
    nodes: Vec<Node>,
    name_to_id: HashMap<String, NodeId>,
    coordinate_index: HashMap<CoordinateKey, NodeId>,
    adjacency: Vec<Vec<Adjacency>>,
    edges: Vec<EdgeRecord>,
    edge_index: HashMap<(NodeId, NodeId), EdgeId>,
    coordinate_aliases: Vec<(NodeId, NodeId)>,
    dropped_edges: usize,
}

impl GraphStore {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            ..Self::default()
        }
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Number of cities.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Explicit edges dropped during [`build_graph`] because an endpoint did not resolve.
    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }

    /// Cities whose rounded coordinate was already taken, as `(city, owner)`.
    ///
    /// Such a city cannot be the endpoint of an explicit edge; segments
    /// pointing at its coordinate resolve to the owner.
    pub fn coordinate_aliases(&self) -> &[(NodeId, NodeId)] {
        &self.coordinate_aliases
    }

    /// Cities in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&EdgeRecord> {
        self.edges.get(id)
    }

    /// Lookup a city identifier by its case-sensitive name.
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.name_to_id.get(name).copied()
    }

    /// Lookup the city registered at `coordinate`, after rounding.
    pub fn node_at(&self, coordinate: Coordinate) -> Option<NodeId> {
        self.coordinate_index
            .get(&CoordinateKey::new(coordinate))
            .copied()
    }

    /// Name of a city, or `<unknown>` for foreign identifiers.
    pub fn name(&self, id: NodeId) -> &str {
        self.nodes
            .get(id)
            .map(|node| node.name.as_str())
            .unwrap_or("<unknown>")
    }

    /// Return the neighbours for a given city in insertion order.
    pub fn neighbours(&self, id: NodeId) -> &[Adjacency] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Weight of the edge between `a` and `b`, if connected.
    pub fn weight(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.edge_between(a, b).map(|edge| edge.weight)
    }

    /// Edge record joining `a` and `b`, in either order.
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<&EdgeRecord> {
        self.edge_index
            .get(&pair_key(a, b))
            .and_then(|&id| self.edges.get(id))
    }

    /// Distance between two cities under this graph's projection.
    pub fn distance(&self, a: NodeId, b: NodeId) -> Option<f64> {
        let (a, b) = (self.nodes.get(a)?, self.nodes.get(b)?);
        Some(self.projection.distance(&a.position, &b.position))
    }

    /// Register a city. A name that already exists keeps its original record.
    pub fn add_node(&mut self, name: impl Into<String>, coordinate: Coordinate) -> NodeId {
        let name = name.into();
        if let Some(&existing) = self.name_to_id.get(&name) {
            debug!(%name, "city already registered");
            return existing;
        }

        let id = self.nodes.len();
        let position = self.projection.position(coordinate);
        match self.coordinate_index.entry(CoordinateKey::new(coordinate)) {
            Entry::Vacant(entry) => {
                entry.insert(id);
            }
            Entry::Occupied(entry) => {
                let owner = *entry.get();
                warn!(
                    city = %name,
                    owner = %self.nodes[owner].name,
                    "city shares a rounded coordinate with an earlier city; explicit edges will attach to the earlier one"
                );
                self.coordinate_aliases.push((id, owner));
            }
        }
        self.name_to_id.insert(name.clone(), id);
        self.nodes.push(Node {
            id,
            name,
            coordinate,
            position,
        });
        self.adjacency.push(Vec::new());
        id
    }

    /// Insert a symmetric edge between two registered cities.
    ///
    /// A pair that is already connected, in either direction, keeps its first
    /// weight. Self-loops and unknown identifiers insert nothing and return `None`.
    pub fn add_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        weight: f64,
        line: Option<String>,
    ) -> Result<Option<EdgeInsert>> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidWeight { weight });
        }
        if a >= self.nodes.len() || b >= self.nodes.len() || a == b {
            return Ok(None);
        }

        let key = pair_key(a, b);
        if let Some(&existing) = self.edge_index.get(&key) {
            return Ok(Some(EdgeInsert::Existing(existing)));
        }

        let id = self.edges.len();
        self.edges.push(EdgeRecord {
            id,
            a,
            b,
            weight,
            line,
        });
        self.edge_index.insert(key, id);
        self.adjacency[a].push(Adjacency {
            target: b,
            weight,
            edge: id,
        });
        self.adjacency[b].push(Adjacency {
            target: a,
            weight,
            edge: id,
        });
        Ok(Some(EdgeInsert::Inserted(id)))
    }

    /// Insert an edge whose endpoints are given as source coordinates.
    ///
    /// When `weight` is `None` the projected distance between the resolved
    /// cities is used.
    pub fn add_edge_explicit(
        &mut self,
        coordinate_a: Coordinate,
        coordinate_b: Coordinate,
        weight: Option<f64>,
        line: Option<String>,
    ) -> Result<Option<EdgeInsert>> {
        let a = self
            .node_at(coordinate_a)
            .ok_or(Error::UnresolvedCoordinate {
                coordinate: coordinate_a,
            })?;
        let b = self
            .node_at(coordinate_b)
            .ok_or(Error::UnresolvedCoordinate {
                coordinate: coordinate_b,
            })?;
        let weight = match weight {
            Some(weight) => weight,
            None => self.distance(a, b).unwrap_or_default(),
        };
        self.add_edge(a, b, weight, line)
    }

    /// Connect every city to its `k` closest cities under `distance_fn`.
    ///
    /// Candidates are stable-sorted by distance, so ties go to the city
    /// registered first. A pair picked from both sides yields one edge.
    /// Returns the number of edges added.
    pub fn build_nearest_neighbor<F>(&mut self, k: usize, distance_fn: F) -> usize
    where
        F: Fn(&Node, &Node) -> f64,
    {
        let mut picks: Vec<(NodeId, NodeId, f64)> = Vec::new();
        for node in &self.nodes {
            let mut candidates: Vec<(NodeId, f64)> = self
                .nodes
                .iter()
                .filter(|other| other.id != node.id)
                .map(|other| (other.id, distance_fn(node, other)))
                .collect();
            candidates.sort_by(|x, y| compare_distance(x.1, y.1));
            picks.extend(
                candidates
                    .into_iter()
                    .take(k)
                    .map(|(target, distance)| (node.id, target, distance)),
            );
        }
        self.insert_generated(picks)
    }

    /// Connect every unordered pair of cities within `max_distance`.
    ///
    /// Returns the number of edges added.
    pub fn build_threshold_mesh<F>(&mut self, max_distance: f64, distance_fn: F) -> usize
    where
        F: Fn(&Node, &Node) -> f64,
    {
        let mut picks: Vec<(NodeId, NodeId, f64)> = Vec::new();
        for (i, a) in self.nodes.iter().enumerate() {
            for b in &self.nodes[i + 1..] {
                let distance = distance_fn(a, b);
                if distance <= max_distance {
                    picks.push((a.id, b.id, distance));
                }
            }
        }
        self.insert_generated(picks)
    }

    fn insert_generated(&mut self, picks: Vec<(NodeId, NodeId, f64)>) -> usize {
        let mut added = 0;
        for (a, b, distance) in picks {
            let line = Some(format!("{}-{}", self.name(a), self.name(b)));
            match self.add_edge(a, b, distance, line) {
                Ok(Some(EdgeInsert::Inserted(_))) => added += 1,
                Ok(_) => {}
                Err(err) => warn!(error = %err, from = a, to = b, "skipping generated edge"),
            }
        }
        added
    }

    /// Return up to `limit` city names that resemble `name`, best match first.
    pub fn fuzzy_matches(&self, name: &str, limit: usize) -> Vec<String> {
        let needle = name.to_lowercase();
        let mut scored: Vec<(f64, &str)> = self
            .nodes
            .iter()
            .map(|node| {
                let score = strsim::jaro_winkler(&needle, &node.name.to_lowercase());
                (score, node.name.as_str())
            })
            .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
            .collect();
        scored.sort_by(|x, y| y.0.partial_cmp(&x.0).unwrap_or(Ordering::Equal));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Resolve a city name, suggesting close matches when it is unknown.
    pub fn resolve(&self, name: &str) -> Result<NodeId> {
        self.node_by_name(name).ok_or_else(|| Error::UnknownCity {
            name: name.to_string(),
            suggestions: self.fuzzy_matches(name, 3),
        })
    }
}

const FUZZY_THRESHOLD: f64 = 0.8;

/// Build a graph from parsed features using the configured strategy.
///
/// Every point becomes a city first. Edges then come either from the source
/// segments or from one of the synthesized strategies. Segments whose endpoints
/// do not resolve to a registered city are dropped with a warning.
pub fn build_graph(features: &FeatureSet, options: &GraphBuildOptions) -> GraphStore {
    let mut graph = GraphStore::new(options.projection);
    for point in &features.points {
        if graph.node_by_name(&point.name).is_some() {
            warn!(name = %point.name, "duplicate city name ignored");
            continue;
        }
        graph.add_node(point.name.clone(), point.coordinate);
    }

    let projection = options.projection;
    let distance = |a: &Node, b: &Node| projection.distance(&a.position, &b.position);

    match options.strategy {
        GraphStrategy::Explicit => {
            for segment in &features.segments {
                let result = graph.add_edge_explicit(
                    segment.start,
                    segment.end,
                    segment.weight,
                    segment.id.clone(),
                );
                match result {
                    Ok(Some(EdgeInsert::Existing(_))) => {
                        debug!(line = ?segment.id, "connection already present");
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, line = ?segment.id, "dropping connection");
                        graph.dropped_edges += 1;
                    }
                }
            }
        }
        GraphStrategy::NearestNeighbor { k } => {
            graph.build_nearest_neighbor(k, distance);
        }
        GraphStrategy::Threshold { max_distance } => {
            graph.build_threshold_mesh(max_distance, distance);
        }
    }

    info!(
        strategy = %options.strategy,
        cities = graph.len(),
        edges = graph.edge_count(),
        dropped = graph.dropped_edges,
        "graph built"
    );
    graph
}

fn pair_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn compare_distance(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Greater)
}
