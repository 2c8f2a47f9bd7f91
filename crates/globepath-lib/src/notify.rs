//! Presentation callbacks emitted by the path engine.
//!
//! The engine never talks to a renderer directly. It reports progress through
//! [`PathNotifier`], and the outcome of a computation does not depend on what
//! the notifier does with the calls.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::PathResult;
use crate::graph::{EdgeId, EdgeRecord, Node, NodeId};

/// Receiver of visual state changes requested by the engine.
///
/// Every method defaults to a no-op so implementations only override what
/// they display.
pub trait PathNotifier: Send + Sync {
    /// A city was selected from the frontier.
    fn on_visiting(&self, _node: &Node) {}

    /// A city was finalized.
    fn on_visited(&self, _node: &Node) {}

    /// An edge improved its target's tentative distance.
    fn on_edge_relaxed(&self, _edge: Option<&EdgeRecord>) {}

    /// An interior city of the final path. Start and end keep their own marking.
    fn on_path_node(&self, _node: &Node) {}

    /// An edge of the final path. `None` when no edge record joins the pair.
    fn on_path_edge(&self, _edge: Option<&EdgeRecord>) {}

    fn on_path_found(&self, _path: &PathResult) {}

    fn on_unreachable(&self, _start: &Node, _end: &Node) {}

    /// Return every city and edge to its neutral look.
    fn on_reset(&self) {}
}

/// Notifier that ignores every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl PathNotifier for NoopNotifier {}

/// Notifier that logs every call through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl PathNotifier for TracingNotifier {
    fn on_visiting(&self, node: &Node) {
        debug!(city = %node.name, "visiting");
    }

    fn on_visited(&self, node: &Node) {
        debug!(city = %node.name, "visited");
    }

    fn on_edge_relaxed(&self, edge: Option<&EdgeRecord>) {
        if let Some(edge) = edge {
            debug!(edge = edge.id, line = ?edge.line, weight = edge.weight, "edge relaxed");
        }
    }

    fn on_path_found(&self, path: &PathResult) {
        info!(path = %path.names.join(" -> "), cost = path.total_cost, "route ready");
    }

    fn on_unreachable(&self, start: &Node, end: &Node) {
        info!(start = %start.name, end = %end.name, "route unavailable");
    }

    fn on_reset(&self) {
        debug!("visual state reset");
    }
}

/// One notifier call, in a serializable form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PathEvent {
    Visiting {
        node: NodeId,
        name: String,
    },
    Visited {
        node: NodeId,
        name: String,
    },
    EdgeRelaxed {
        edge: Option<EdgeId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<String>,
    },
    PathNode {
        node: NodeId,
        name: String,
    },
    PathEdge {
        edge: Option<EdgeId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<String>,
    },
    PathFound {
        path: Vec<String>,
        cost: f64,
    },
    Unreachable {
        start: String,
        end: String,
    },
    Reset,
}

/// Display state of a city or edge as the presentation layer would show it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualState {
    #[default]
    Neutral,
    Visiting,
    Visited,
    OnPath,
}

#[derive(Debug, Default)]
struct Recording {
    events: Vec<PathEvent>,
    nodes: HashMap<NodeId, VisualState>,
    edges: HashMap<EdgeId, VisualState>,
}

/// Notifier that keeps every event and the resulting visual state.
///
/// Useful headless: tests and the CLI inspect what a renderer would show.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    inner: Mutex<Recording>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first.
    pub fn events(&self) -> Vec<PathEvent> {
        self.inner.lock().events.clone()
    }

    /// Remove and return the events received so far.
    pub fn drain_events(&self) -> Vec<PathEvent> {
        std::mem::take(&mut self.inner.lock().events)
    }

    pub fn node_state(&self, node: NodeId) -> VisualState {
        self.inner
            .lock()
            .nodes
            .get(&node)
            .copied()
            .unwrap_or_default()
    }

    pub fn edge_state(&self, edge: EdgeId) -> VisualState {
        self.inner
            .lock()
            .edges
            .get(&edge)
            .copied()
            .unwrap_or_default()
    }

    /// Whether every city and edge currently looks neutral.
    pub fn is_neutral(&self) -> bool {
        let inner = self.inner.lock();
        inner
            .nodes
            .values()
            .chain(inner.edges.values())
            .all(|state| *state == VisualState::Neutral)
    }

    fn record(&self, event: PathEvent) {
        self.inner.lock().events.push(event);
    }

    fn mark_node(&self, node: &Node, state: VisualState, event: PathEvent) {
        let mut inner = self.inner.lock();
        inner.nodes.insert(node.id, state);
        inner.events.push(event);
    }

    fn mark_edge(&self, edge: Option<&EdgeRecord>, state: VisualState, event: PathEvent) {
        let mut inner = self.inner.lock();
        if let Some(edge) = edge {
            inner.edges.insert(edge.id, state);
        }
        inner.events.push(event);
    }
}

impl PathNotifier for RecordingNotifier {
    fn on_visiting(&self, node: &Node) {
        self.mark_node(
            node,
            VisualState::Visiting,
            PathEvent::Visiting {
                node: node.id,
                name: node.name.clone(),
            },
        );
    }

    fn on_visited(&self, node: &Node) {
        self.mark_node(
            node,
            VisualState::Visited,
            PathEvent::Visited {
                node: node.id,
                name: node.name.clone(),
            },
        );
    }

    fn on_edge_relaxed(&self, edge: Option<&EdgeRecord>) {
        self.mark_edge(
            edge,
            VisualState::Visiting,
            PathEvent::EdgeRelaxed {
                edge: edge.map(|edge| edge.id),
                line: edge.and_then(|edge| edge.line.clone()),
            },
        );
    }

    fn on_path_node(&self, node: &Node) {
        self.mark_node(
            node,
            VisualState::OnPath,
            PathEvent::PathNode {
                node: node.id,
                name: node.name.clone(),
            },
        );
    }

    fn on_path_edge(&self, edge: Option<&EdgeRecord>) {
        self.mark_edge(
            edge,
            VisualState::OnPath,
            PathEvent::PathEdge {
                edge: edge.map(|edge| edge.id),
                line: edge.and_then(|edge| edge.line.clone()),
            },
        );
    }

    fn on_path_found(&self, path: &PathResult) {
        self.record(PathEvent::PathFound {
            path: path.names.clone(),
            cost: path.total_cost,
        });
    }

    fn on_unreachable(&self, start: &Node, end: &Node) {
        self.record(PathEvent::Unreachable {
            start: start.name.clone(),
            end: end.name.clone(),
        });
    }

    fn on_reset(&self) {
        let mut inner = self.inner.lock();
        inner.nodes.clear();
        inner.edges.clear();
        inner.events.push(PathEvent::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::Position;

    fn city(id: NodeId, name: &str) -> Node {
        Node {
            id,
            name: name.to_string(),
            coordinate: [0.0, 0.0],
            position: Position::ORIGIN,
        }
    }

    #[test]
    fn recording_tracks_visual_state() {
        let notifier = RecordingNotifier::new();
        let a = city(0, "A");
        let edge = EdgeRecord {
            id: 4,
            a: 0,
            b: 1,
            weight: 1.0,
            line: Some("a-b".to_string()),
        };

        notifier.on_visiting(&a);
        assert_eq!(notifier.node_state(0), VisualState::Visiting);
        notifier.on_visited(&a);
        notifier.on_edge_relaxed(Some(&edge));
        assert_eq!(notifier.node_state(0), VisualState::Visited);
        assert_eq!(notifier.edge_state(4), VisualState::Visiting);
        assert!(!notifier.is_neutral());

        notifier.on_reset();
        assert!(notifier.is_neutral());
        assert_eq!(notifier.events().len(), 4);
        assert_eq!(notifier.events()[3], PathEvent::Reset);
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = PathEvent::PathFound {
            path: vec!["A".to_string(), "B".to_string()],
            cost: 1.5,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"path_found","path":["A","B"],"cost":1.5}"#);

        let json = serde_json::to_string(&PathEvent::Reset).unwrap();
        assert_eq!(json, r#"{"event":"reset"}"#);
    }
}
