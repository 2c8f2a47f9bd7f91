//! Notifier that prints engine events to stdout as they happen.

use globepath_lib::{EdgeRecord, Node, PathEvent, PathNotifier, PathResult};

use crate::output::{render_event_text, OutputFormat};
use crate::terminal::ColorPalette;

/// Prints every engine event, as text lines or JSON lines.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    format: OutputFormat,
    palette: ColorPalette,
}

impl ConsoleNotifier {
    pub fn new(format: OutputFormat, palette: ColorPalette) -> Self {
        Self { format, palette }
    }

    /// Format one event the way [`ConsoleNotifier`] prints it.
    pub fn format_event(&self, event: &PathEvent) -> String {
        match self.format {
            OutputFormat::Text => render_event_text(event, &self.palette),
            OutputFormat::Json => serde_json::to_string(event)
                .unwrap_or_else(|err| format!(r#"{{"event":"error","message":"{err}"}}"#)),
        }
    }

    fn emit(&self, event: PathEvent) {
        println!("{}", self.format_event(&event));
    }
}

impl PathNotifier for ConsoleNotifier {
    fn on_visiting(&self, node: &Node) {
        self.emit(PathEvent::Visiting {
            node: node.id,
            name: node.name.clone(),
        });
    }

    fn on_visited(&self, node: &Node) {
        self.emit(PathEvent::Visited {
            node: node.id,
            name: node.name.clone(),
        });
    }

    fn on_edge_relaxed(&self, edge: Option<&EdgeRecord>) {
        self.emit(PathEvent::EdgeRelaxed {
            edge: edge.map(|edge| edge.id),
            line: edge.and_then(|edge| edge.line.clone()),
        });
    }

    fn on_path_node(&self, node: &Node) {
        self.emit(PathEvent::PathNode {
            node: node.id,
            name: node.name.clone(),
        });
    }

    fn on_path_edge(&self, edge: Option<&EdgeRecord>) {
        self.emit(PathEvent::PathEdge {
            edge: edge.map(|edge| edge.id),
            line: edge.and_then(|edge| edge.line.clone()),
        });
    }

    fn on_path_found(&self, path: &PathResult) {
        self.emit(PathEvent::PathFound {
            path: path.names.clone(),
            cost: path.total_cost,
        });
    }

    fn on_unreachable(&self, start: &Node, end: &Node) {
        self.emit(PathEvent::Unreachable {
            start: start.name.clone(),
            end: end.name.clone(),
        });
    }

    fn on_reset(&self) {
        self.emit(PathEvent::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_events_are_single_lines() {
        let notifier = ConsoleNotifier::new(OutputFormat::Json, ColorPalette::plain());
        let line = notifier.format_event(&PathEvent::Visiting {
            node: 2,
            name: "Rome".to_string(),
        });
        assert_eq!(line, r#"{"event":"visiting","node":2,"name":"Rome"}"#);
    }

    #[test]
    fn text_events_use_the_palette() {
        let notifier = ConsoleNotifier::new(OutputFormat::Text, ColorPalette::plain());
        let line = notifier.format_event(&PathEvent::Visited {
            node: 0,
            name: "Paris".to_string(),
        });
        assert_eq!(line, "visited Paris");
    }
}
