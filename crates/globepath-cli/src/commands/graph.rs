//! `graph` command handler.

use std::path::Path;

use anyhow::Result;

use globepath_cli::output::{render_graph_text, GraphSummary, OutputFormat};
use globepath_cli::terminal::ColorPalette;

use super::{load_graph, GraphArgs};

pub fn handle_graph(input: Option<&Path>, args: &GraphArgs, format: OutputFormat) -> Result<()> {
    let (features, graph, options) = load_graph(input, args)?;
    let summary = GraphSummary::new(&graph, &features, options.strategy);

    match format {
        OutputFormat::Text => print!("{}", render_graph_text(&summary, &ColorPalette::detect())),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}
