//! Dijkstra shortest-path engine.
//!
//! Both execution modes share [`DijkstraState`]:
//!
//! - [`compute_path`] runs the search to completion in one call.
//! - [`SteppedRun`] runs it as a tokio task that waits for an external advance
//!   signal before every frontier selection and reports each visit through the
//!   [`PathNotifier`].
//!
//! Frontier selection is a linear scan in insertion order. The first city with
//! the smallest tentative distance wins, which keeps both modes deterministic
//! and identical in their results.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ConfigurationError, Error, Result};
use crate::graph::{EdgeId, GraphStore, NodeId};
use crate::notify::{NoopNotifier, PathNotifier};

/// Visual pause between marking a city "visiting" and "visited" in stepped mode.
pub const DEFAULT_VISIT_DELAY: Duration = Duration::from_millis(250);

/// Lifecycle of a path computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    #[default]
    Idle,
    Running,
    Completed,
    Unreachable,
    Cancelled,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EngineState::Idle => "idle",
            EngineState::Running => "running",
            EngineState::Completed => "completed",
            EngineState::Unreachable => "unreachable",
            EngineState::Cancelled => "cancelled",
        };
        f.write_str(value)
    }
}

/// Tunables for a path computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Pause between the "visiting" and "visited" notifications in stepped mode.
    pub visit_delay: Duration,
    /// Emit the live distance and predecessor tables at debug level every iteration.
    pub trace: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            visit_delay: DEFAULT_VISIT_DELAY,
            trace: false,
        }
    }
}

impl EngineOptions {
    /// Options without any visual pause.
    pub fn immediate() -> Self {
        Self {
            visit_delay: Duration::ZERO,
            trace: false,
        }
    }
}

/// Validated pair of endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRequest {
    pub start: NodeId,
    pub end: NodeId,
}

impl PathRequest {
    /// Check that the graph is usable and both endpoints are set and present.
    pub fn validate(
        graph: &GraphStore,
        start: Option<NodeId>,
        end: Option<NodeId>,
    ) -> std::result::Result<Self, ConfigurationError> {
        if graph.is_empty() {
            return Err(ConfigurationError::EmptyGraph);
        }
        let start = start.ok_or(ConfigurationError::StartUnset)?;
        let end = end.ok_or(ConfigurationError::EndUnset)?;
        for id in [start, end] {
            if graph.node(id).is_none() {
                return Err(ConfigurationError::NotInGraph { id });
            }
        }
        Ok(Self { start, end })
    }
}

/// Shortest path from start to end, inclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    pub nodes: Vec<NodeId>,
    pub names: Vec<String>,
    pub total_cost: f64,
}

impl PathResult {
    /// Number of edges in the path.
    pub fn hop_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

/// How a computation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    Completed(PathResult),
    Unreachable { start: NodeId, end: NodeId },
    Cancelled,
}

impl PathOutcome {
    pub fn state(&self) -> EngineState {
        match self {
            PathOutcome::Completed(_) => EngineState::Completed,
            PathOutcome::Unreachable { .. } => EngineState::Unreachable,
            PathOutcome::Cancelled => EngineState::Cancelled,
        }
    }

    pub fn path(&self) -> Option<&PathResult> {
        match self {
            PathOutcome::Completed(path) => Some(path),
            _ => None,
        }
    }
}

/// Per-computation Dijkstra bookkeeping.
#[derive(Debug, Clone)]
pub struct DijkstraState<'g> {
    graph: &'g GraphStore,
    request: PathRequest,
    distances: Vec<f64>,
    predecessors: Vec<Option<NodeId>>,
    frontier: Vec<bool>,
    remaining: usize,
}

impl<'g> DijkstraState<'g> {
    pub fn new(graph: &'g GraphStore, request: PathRequest) -> Self {
        let len = graph.len();
        let mut distances = vec![f64::INFINITY; len];
        if let Some(distance) = distances.get_mut(request.start) {
            *distance = 0.0;
        }
        Self {
            graph,
            request,
            distances,
            predecessors: vec![None; len],
            frontier: vec![true; len],
            remaining: len,
        }
    }

    pub fn distance(&self, node: NodeId) -> f64 {
        self.distances.get(node).copied().unwrap_or(f64::INFINITY)
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        self.predecessors.get(node).copied().flatten()
    }

    /// Whether `node` is still waiting to be finalized.
    pub fn in_frontier(&self, node: NodeId) -> bool {
        self.frontier.get(node).copied().unwrap_or(false)
    }

    pub fn frontier_len(&self) -> usize {
        self.remaining
    }

    /// Remove and return the frontier city with the smallest finite distance.
    ///
    /// Returns `None` once the frontier is empty or only holds unreachable
    /// cities.
    pub fn select_next(&mut self) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for (node, &in_frontier) in self.frontier.iter().enumerate() {
            let distance = self.distances[node];
            if !in_frontier || !distance.is_finite() {
                continue;
            }
            match best {
                Some((_, min)) if distance >= min => {}
                _ => best = Some((node, distance)),
            }
        }
        let (node, _) = best?;
        self.frontier[node] = false;
        self.remaining -= 1;
        Some(node)
    }

    /// Relax every edge leaving `current`.
    ///
    /// Only strict improvements are applied, so ties keep the earlier
    /// predecessor. Returns the improved targets with the edge used.
    pub fn relax(&mut self, current: NodeId) -> Vec<(NodeId, EdgeId)> {
        let base = self.distance(current);
        let mut improved = Vec::new();
        for adjacency in self.graph.neighbours(current) {
            let candidate = base + adjacency.weight;
            if candidate < self.distances[adjacency.target] {
                self.distances[adjacency.target] = candidate;
                self.predecessors[adjacency.target] = Some(current);
                improved.push((adjacency.target, adjacency.edge));
            }
        }
        improved
    }

    /// Walk predecessors back from the end and build the outcome.
    ///
    /// A chain that never reaches the start means the end is unreachable; no
    /// partial path is produced.
    pub fn finish(&self) -> PathOutcome {
        let PathRequest { start, end } = self.request;
        let unreachable = PathOutcome::Unreachable { start, end };

        let mut nodes = vec![end];
        let mut current = end;
        while current != start {
            let Some(previous) = self.predecessor(current) else {
                return unreachable;
            };
            nodes.push(previous);
            current = previous;
            if nodes.len() > self.graph.len() {
                return unreachable;
            }
        }
        nodes.reverse();

        let names = nodes
            .iter()
            .map(|&node| self.graph.name(node).to_string())
            .collect();
        PathOutcome::Completed(PathResult {
            nodes,
            names,
            total_cost: self.distance(end),
        })
    }

    fn trace(&self, current: NodeId) {
        let distances = self
            .graph
            .nodes()
            .iter()
            .map(|node| format!("{}={}", node.name, self.distances[node.id]))
            .collect::<Vec<_>>()
            .join(", ");
        let predecessors = self
            .graph
            .nodes()
            .iter()
            .filter_map(|node| {
                self.predecessor(node.id)
                    .map(|previous| format!("{}<-{}", node.name, self.graph.name(previous)))
            })
            .collect::<Vec<_>>()
            .join(", ");
        debug!(
            current = %self.graph.name(current),
            %distances,
            %predecessors,
            "dijkstra iteration"
        );
    }
}

/// Run Dijkstra to completion and report the result to `notifier`.
pub fn compute_path(
    graph: &GraphStore,
    request: PathRequest,
    notifier: &dyn PathNotifier,
    options: &EngineOptions,
) -> PathOutcome {
    let mut state = DijkstraState::new(graph, request);
    while let Some(current) = state.select_next() {
        if options.trace {
            state.trace(current);
        }
        if current == request.end {
            break;
        }
        state.relax(current);
    }

    let outcome = state.finish();
    report_outcome(graph, &outcome, notifier);
    outcome
}

/// Resolve two city names and compute the path between them without notifications.
pub fn find_path(graph: &GraphStore, from: &str, to: &str) -> Result<PathOutcome> {
    let start = graph.resolve(from)?;
    let end = graph.resolve(to)?;
    let request = PathRequest::validate(graph, Some(start), Some(end))?;
    Ok(compute_path(
        graph,
        request,
        &NoopNotifier,
        &EngineOptions::immediate(),
    ))
}

fn report_outcome(graph: &GraphStore, outcome: &PathOutcome, notifier: &dyn PathNotifier) {
    match outcome {
        PathOutcome::Completed(path) => {
            info!(
                path = %path.names.join(" -> "),
                cost = path.total_cost,
                "path found"
            );
            for pair in path.nodes.windows(2) {
                let edge = graph.edge_between(pair[0], pair[1]);
                if edge.is_none() {
                    warn!(
                        from = %graph.name(pair[0]),
                        to = %graph.name(pair[1]),
                        "no edge record between path cities"
                    );
                }
                notifier.on_path_edge(edge);
            }
            let interior = path.nodes.len().saturating_sub(1);
            for &node in path.nodes.iter().take(interior).skip(1) {
                if let Some(node) = graph.node(node) {
                    notifier.on_path_node(node);
                }
            }
            notifier.on_path_found(path);
        }
        PathOutcome::Unreachable { start, end } => {
            warn!(
                start = %graph.name(*start),
                end = %graph.name(*end),
                "no path found"
            );
            if let (Some(start), Some(end)) = (graph.node(*start), graph.node(*end)) {
                notifier.on_unreachable(start, end);
            }
        }
        PathOutcome::Cancelled => notifier.on_reset(),
    }
}

/// Handle to a stepped computation running on the tokio runtime.
///
/// The task waits for [`SteppedRun::advance`] before each frontier selection.
/// Advance signals do not queue: while one is pending, further signals are
/// dropped, so each consumed signal performs exactly one iteration.
#[derive(Debug)]
pub struct SteppedRun {
    advance: mpsc::Sender<()>,
    stop: watch::Sender<bool>,
    state: watch::Receiver<EngineState>,
    handle: JoinHandle<PathOutcome>,
}

impl SteppedRun {
    /// Spawn a stepped computation. Must be called from within a tokio runtime.
    pub fn spawn(
        graph: Arc<GraphStore>,
        request: PathRequest,
        notifier: Arc<dyn PathNotifier>,
        options: EngineOptions,
    ) -> Self {
        let (advance, advance_rx) = mpsc::channel(1);
        let (stop, stop_rx) = watch::channel(false);
        let (state_tx, state) = watch::channel(EngineState::Running);

        let handle = tokio::spawn(run_stepped(
            graph, request, notifier, options, advance_rx, stop_rx, state_tx,
        ));
        debug!(start = request.start, end = request.end, "stepped run spawned");

        Self {
            advance,
            stop,
            state,
            handle,
        }
    }

    /// Signal the task to perform one iteration.
    ///
    /// Returns `false` when a signal is already pending or the run has ended.
    pub fn advance(&self) -> bool {
        self.advance.try_send(()).is_ok()
    }

    /// Wait until the pending signal, if any, has been consumed, then send one.
    ///
    /// Returns `false` once the run has ended.
    pub async fn advance_when_ready(&self) -> bool {
        match self.advance.reserve().await {
            Ok(permit) => {
                permit.send(());
                true
            }
            Err(_) => false,
        }
    }

    /// Request cancellation. The task resets the notifier and ends as `Cancelled`.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Receiver that observes state changes of this run.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run to end and return its outcome.
    pub async fn join(self) -> Result<PathOutcome> {
        self.handle.await.map_err(|err| Error::StepTask {
            message: err.to_string(),
        })
    }

    /// Stop the run and wait for it to wind down.
    pub async fn cancel(self) -> Result<PathOutcome> {
        self.stop();
        self.join().await
    }
}

async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    // A dropped handle counts as a stop request.
    let _ = stop.wait_for(|stopped| *stopped).await;
}

async fn run_stepped(
    graph: Arc<GraphStore>,
    request: PathRequest,
    notifier: Arc<dyn PathNotifier>,
    options: EngineOptions,
    mut advance: mpsc::Receiver<()>,
    mut stop: watch::Receiver<bool>,
    state_tx: watch::Sender<EngineState>,
) -> PathOutcome {
    let mut state = DijkstraState::new(&graph, request);

    let outcome = 'run: loop {
        tokio::select! {
            biased;
            _ = stop_requested(&mut stop) => break 'run PathOutcome::Cancelled,
            signal = advance.recv() => {
                if signal.is_none() {
                    break 'run PathOutcome::Cancelled;
                }
            }
        }

        let Some(current) = state.select_next() else {
            break 'run state.finish();
        };
        let Some(node) = graph.node(current) else {
            break 'run state.finish();
        };

        notifier.on_visiting(node);
        if !options.visit_delay.is_zero() {
            tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => break 'run PathOutcome::Cancelled,
                _ = tokio::time::sleep(options.visit_delay) => {}
            }
        }
        notifier.on_visited(node);

        if options.trace {
            state.trace(current);
        }
        if current == request.end {
            break 'run state.finish();
        }

        for (_, edge) in state.relax(current) {
            notifier.on_edge_relaxed(graph.edge(edge));
        }
    };

    if matches!(outcome, PathOutcome::Cancelled) {
        debug!("stepped run cancelled");
    }
    report_outcome(&graph, &outcome, notifier.as_ref());
    let _ = state_tx.send(outcome.state());
    outcome
}
