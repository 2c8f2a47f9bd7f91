//! Output formatting for graph summaries and routes.

use clap::ValueEnum;
use serde::Serialize;

use globepath_lib::{
    EngineState, FeatureSet, GraphStore, GraphStrategy, PathEvent, PathOutcome, Projection,
};

use crate::terminal::ColorPalette;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON documents; stepped events are emitted as JSON lines.
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct CitySummary {
    pub id: usize,
    pub name: String,
    pub coordinate: [f64; 2],
    pub degree: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeSummary {
    pub from: String,
    pub to: String,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
}

/// Everything the `graph` command reports.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSummary {
    pub strategy: String,
    pub projection: String,
    pub cities: Vec<CitySummary>,
    pub edges: Vec<EdgeSummary>,
    pub dropped_edges: usize,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coordinate_aliases: Vec<String>,
}

impl GraphSummary {
    pub fn new(graph: &GraphStore, features: &FeatureSet, strategy: GraphStrategy) -> Self {
        let cities = graph
            .nodes()
            .iter()
            .map(|node| CitySummary {
                id: node.id,
                name: node.name.clone(),
                coordinate: node.coordinate,
                degree: graph.neighbours(node.id).len(),
            })
            .collect();
        let edges = graph
            .edges()
            .iter()
            .map(|edge| EdgeSummary {
                from: graph.name(edge.a).to_string(),
                to: graph.name(edge.b).to_string(),
                weight: edge.weight,
                line: edge.line.clone(),
            })
            .collect();

        Self {
            strategy: strategy.to_string(),
            projection: projection_label(graph.projection()),
            cities,
            edges,
            dropped_edges: graph.dropped_edges(),
            issues: features.issues.iter().map(ToString::to_string).collect(),
            coordinate_aliases: graph
                .coordinate_aliases()
                .iter()
                .map(|&(city, owner)| {
                    format!("{} shares a coordinate with {}", graph.name(city), graph.name(owner))
                })
                .collect(),
        }
    }
}

pub fn projection_label(projection: Projection) -> String {
    match projection {
        Projection::Sphere(sphere) => format!("sphere (radius {})", sphere.radius),
        Projection::Planar => "planar".to_string(),
    }
}

/// Render a graph summary as text.
pub fn render_graph_text(summary: &GraphSummary, palette: &ColorPalette) -> String {
    let mut out = format!(
        "Graph: {} cities, {} edges ({}, {})\n",
        summary.cities.len(),
        summary.edges.len(),
        summary.strategy,
        summary.projection
    );
    if summary.dropped_edges > 0 {
        out.push_str(&format!(
            "{}Dropped connections: {}{}\n",
            palette.red, summary.dropped_edges, palette.reset
        ));
    }
    if !summary.issues.is_empty() {
        out.push_str("Issues:\n");
        for issue in &summary.issues {
            out.push_str(&format!("  - {issue}\n"));
        }
    }

    for alias in &summary.coordinate_aliases {
        out.push_str(&format!("{}Alias: {alias}{}\n", palette.red, palette.reset));
    }

    let isolated: Vec<&str> = summary
        .cities
        .iter()
        .filter(|city| city.degree == 0)
        .map(|city| city.name.as_str())
        .collect();
    if !isolated.is_empty() {
        out.push_str(&format!("Isolated: {}\n", isolated.join(", ")));
    }

    out.push_str("Edges:\n");
    for edge in &summary.edges {
        out.push_str(&format!(
            "  {}{}{} - {}{}{}  {}{:.3}{}",
            palette.white_bold,
            edge.from,
            palette.reset,
            palette.white_bold,
            edge.to,
            palette.reset,
            palette.green,
            edge.weight,
            palette.reset
        ));
        if let Some(line) = &edge.line {
            out.push_str(&format!(" {}({line}){}", palette.gray, palette.reset));
        }
        out.push('\n');
    }
    out
}

/// One city along a route with the cost accumulated on arrival.
#[derive(Debug, Clone, Serialize)]
pub struct RouteLeg {
    pub name: String,
    pub cost: f64,
}

/// Everything the `route` command reports.
#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub from: String,
    pub to: String,
    pub state: EngineState,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub legs: Vec<RouteLeg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hops: Option<usize>,
}

impl RouteReport {
    pub fn new(graph: &GraphStore, from: &str, to: &str, outcome: &PathOutcome) -> Self {
        let mut report = Self {
            from: from.to_string(),
            to: to.to_string(),
            state: outcome.state(),
            legs: Vec::new(),
            total_cost: None,
            hops: None,
        };
        let Some(path) = outcome.path() else {
            return report;
        };

        let mut cost = 0.0;
        let mut previous = None;
        for &node in &path.nodes {
            if let Some(previous) = previous {
                cost += graph.weight(previous, node).unwrap_or_default();
            }
            report.legs.push(RouteLeg {
                name: graph.name(node).to_string(),
                cost,
            });
            previous = Some(node);
        }
        report.total_cost = Some(path.total_cost);
        report.hops = Some(path.hop_count());
        report
    }
}

/// Render a route report as text.
pub fn render_route_text(report: &RouteReport, palette: &ColorPalette) -> String {
    match report.state {
        EngineState::Completed => {}
        EngineState::Unreachable => {
            return format!(
                "{}No route between {} and {}{}\n",
                palette.red, report.from, report.to, palette.reset
            );
        }
        EngineState::Cancelled => {
            return format!(
                "{}Route from {} to {} cancelled{}\n",
                palette.red, report.from, report.to, palette.reset
            );
        }
        EngineState::Idle | EngineState::Running => {
            return format!("Route from {} to {}: {}\n", report.from, report.to, report.state);
        }
    }

    let hops = report.hops.unwrap_or_default();
    let mut out = format!(
        "Route from {} to {} ({} {}):\n",
        report.from,
        report.to,
        hops,
        if hops == 1 { "hop" } else { "hops" }
    );
    let last = report.legs.len().saturating_sub(1);
    for (index, leg) in report.legs.iter().enumerate() {
        let tag = if index == 0 {
            format!("{}STRT{}", palette.tag_start, palette.reset)
        } else if index == last {
            format!("{}GOAL{}", palette.tag_end, palette.reset)
        } else {
            "    ".to_string()
        };
        out.push_str(&format!(
            "  {tag} {}{}{} {}{:.3}{}\n",
            palette.white_bold, leg.name, palette.reset, palette.gray, leg.cost, palette.reset
        ));
    }
    out.push_str(&format!(
        "Total cost: {}{:.3}{}\n",
        palette.green,
        report.total_cost.unwrap_or_default(),
        palette.reset
    ));
    out
}

/// Render one engine event as a single text line.
pub fn render_event_text(event: &PathEvent, palette: &ColorPalette) -> String {
    match event {
        PathEvent::Visiting { name, .. } => {
            format!("{}visiting{} {name}", palette.cyan, palette.reset)
        }
        PathEvent::Visited { name, .. } => format!("visited {name}"),
        PathEvent::EdgeRelaxed { edge, line } => {
            format!("relaxed {}", edge_label(*edge, line.as_deref()))
        }
        PathEvent::PathNode { name, .. } => format!("on path {name}"),
        PathEvent::PathEdge { edge, line } => {
            format!("path edge {}", edge_label(*edge, line.as_deref()))
        }
        PathEvent::PathFound { path, cost } => format!(
            "{}path found{} {} ({cost:.3})",
            palette.green,
            palette.reset,
            path.join(" -> ")
        ),
        PathEvent::Unreachable { start, end } => {
            format!("{}unreachable{} {start} -> {end}", palette.red, palette.reset)
        }
        PathEvent::Reset => "reset".to_string(),
    }
}

fn edge_label(edge: Option<usize>, line: Option<&str>) -> String {
    match (line, edge) {
        (Some(line), _) => line.to_string(),
        (None, Some(edge)) => format!("#{edge}"),
        (None, None) => "<unlinked>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globepath_lib::find_path;

    fn line_graph() -> GraphStore {
        let mut graph = GraphStore::new(Projection::Planar);
        let a = graph.add_node("A", [0.0, 0.0]);
        let b = graph.add_node("B", [1.0, 0.0]);
        let c = graph.add_node("C", [3.0, 0.0]);
        graph.add_node("D", [9.0, 0.0]);
        graph.add_edge(a, b, 1.0, Some("a-b".to_string())).unwrap();
        graph.add_edge(b, c, 2.5, None).unwrap();
        graph
    }

    #[test]
    fn route_report_accumulates_costs() {
        let graph = line_graph();
        let outcome = find_path(&graph, "A", "C").unwrap();
        let report = RouteReport::new(&graph, "A", "C", &outcome);

        assert_eq!(report.state, EngineState::Completed);
        assert_eq!(report.hops, Some(2));
        let costs: Vec<f64> = report.legs.iter().map(|leg| leg.cost).collect();
        assert_eq!(costs, vec![0.0, 1.0, 3.5]);

        let text = render_route_text(&report, &ColorPalette::plain());
        assert!(text.contains("Route from A to C (2 hops):"));
        assert!(text.contains("STRT A 0.000"));
        assert!(text.contains("GOAL C 3.500"));
        assert!(text.contains("Total cost: 3.500"));
    }

    #[test]
    fn unreachable_report_has_no_legs() {
        let graph = line_graph();
        let outcome = find_path(&graph, "A", "D").unwrap();
        let report = RouteReport::new(&graph, "A", "D", &outcome);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state"], "unreachable");
        assert!(json.get("legs").is_none());
        assert!(render_route_text(&report, &ColorPalette::plain()).contains("No route between A and D"));
    }

    #[test]
    fn graph_summary_lists_isolated_cities() {
        let graph = line_graph();
        let summary = GraphSummary::new(&graph, &FeatureSet::default(), GraphStrategy::Explicit);
        let text = render_graph_text(&summary, &ColorPalette::plain());

        assert!(text.starts_with("Graph: 4 cities, 2 edges (explicit, planar)"));
        assert!(text.contains("Isolated: D"));
        assert!(text.contains("A - B  1.000 (a-b)"));
        assert!(text.contains("B - C  2.500\n"));
    }

    #[test]
    fn graph_summary_reports_coordinate_aliases() {
        let mut graph = line_graph();
        graph.add_node("A2", [0.0001, 0.0]);
        let summary = GraphSummary::new(&graph, &FeatureSet::default(), GraphStrategy::Explicit);

        assert_eq!(summary.coordinate_aliases, vec!["A2 shares a coordinate with A"]);
        let text = render_graph_text(&summary, &ColorPalette::plain());
        assert!(text.contains("Alias: A2 shares a coordinate with A\n"));
    }

    #[test]
    fn events_render_as_single_lines() {
        let palette = ColorPalette::plain();
        let relaxed = PathEvent::EdgeRelaxed {
            edge: Some(3),
            line: None,
        };
        assert_eq!(render_event_text(&relaxed, &palette), "relaxed #3");

        let found = PathEvent::PathFound {
            path: vec!["A".to_string(), "B".to_string()],
            cost: 1.0,
        };
        assert_eq!(render_event_text(&found, &palette), "path found A -> B (1.000)");
    }
}
