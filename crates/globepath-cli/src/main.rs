use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use globepath_cli::output::OutputFormat;

mod commands;

use commands::route::RouteArgs;
use commands::GraphArgs;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Build city graphs from GeoJSON and trace shortest paths"
)]
struct Cli {
    /// GeoJSON FeatureCollection with city points and connecting lines.
    #[arg(long, global = true, env = "GLOBEPATH_INPUT")]
    input: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(flatten)]
    graph: GraphArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the graph and report its cities, edges and input issues.
    Graph,
    /// Compute the shortest route between two cities.
    Route(RouteArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let trace = matches!(&cli.command, Command::Route(args) if args.trace);
    init_tracing(trace);

    let input = cli.input.as_deref();
    match &cli.command {
        Command::Graph => commands::graph::handle_graph(input, &cli.graph, cli.format),
        Command::Route(args) => {
            commands::route::handle_route(input, &cli.graph, args, cli.format).await
        }
    }
}

fn init_tracing(trace: bool) {
    let default = if trace {
        "info,globepath_lib=debug"
    } else {
        "info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
