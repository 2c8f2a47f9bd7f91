//! `route` command handler.
//!
//! Without `--stepped` the route is computed in one call. With it, the engine
//! waits for an advance signal per iteration, read from stdin: an empty line
//! or `n` advances, `q` stops. Once stdin closes the run finishes on its own.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use globepath_cli::console::ConsoleNotifier;
use globepath_cli::output::{render_route_text, OutputFormat, RouteReport};
use globepath_cli::terminal::ColorPalette;
use globepath_lib::{
    EngineOptions, EngineState, PathNotifier, PathOutcome, PathSession, TracingNotifier,
};

use super::{default_visit_delay_ms, load_graph, GraphArgs};

#[derive(Args, Debug, Clone)]
pub struct RouteArgs {
    /// Starting city name.
    #[arg(long = "from")]
    pub from: String,

    /// Destination city name.
    #[arg(long = "to")]
    pub to: String,

    /// Advance one iteration per line read from stdin.
    #[arg(long)]
    pub stepped: bool,

    /// Pause between marking a city visiting and visited, in milliseconds.
    #[arg(long, default_value_t = default_visit_delay_ms())]
    pub visit_delay_ms: u64,

    /// Log the distance and predecessor tables after every iteration.
    #[arg(long)]
    pub trace: bool,
}

/// Line commands accepted while a stepped route runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepCommand {
    Advance,
    Quit,
}

impl StepCommand {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "" | "n" | "next" => Some(StepCommand::Advance),
            "q" | "quit" => Some(StepCommand::Quit),
            _ => None,
        }
    }
}

pub async fn handle_route(
    input: Option<&Path>,
    graph_args: &GraphArgs,
    args: &RouteArgs,
    format: OutputFormat,
) -> Result<()> {
    let (_, graph, _) = load_graph(input, graph_args)?;
    let graph = Arc::new(graph);
    let palette = ColorPalette::detect();

    let notifier: Arc<dyn PathNotifier> = if args.stepped {
        Arc::new(ConsoleNotifier::new(format, palette))
    } else {
        Arc::new(TracingNotifier)
    };
    let options = EngineOptions {
        visit_delay: Duration::from_millis(args.visit_delay_ms),
        trace: args.trace,
    };

    let mut session = PathSession::new(Arc::clone(&graph), notifier, options);
    session.set_start(&args.from)?;
    session.set_end(&args.to)?;

    let outcome = if args.stepped {
        drive_stepped(&mut session).await?
    } else {
        session.compute_path().await?
    };

    let report = RouteReport::new(&graph, &args.from, &args.to, &outcome);
    match (format, args.stepped) {
        (OutputFormat::Text, _) => print!("{}", render_route_text(&report, &palette)),
        (OutputFormat::Json, false) => println!("{}", serde_json::to_string_pretty(&report)?),
        (OutputFormat::Json, true) => println!("{}", serde_json::to_string(&report)?),
    }

    if matches!(outcome, PathOutcome::Unreachable { .. }) {
        bail!("no route between {} and {}", args.from, args.to);
    }
    Ok(())
}

/// Read stdin lines on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn drive_stepped(session: &mut PathSession) -> Result<PathOutcome> {
    session.compute_path_stepped().await?;
    let mut state = session
        .watch_state()
        .context("stepped computation did not start")?;
    let mut lines = spawn_stdin_reader();

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() || *state.borrow() != EngineState::Running {
                    break;
                }
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    debug!("stdin closed, finishing stepped run");
                    let outcome = session.run_stepped_to_end().await?;
                    return outcome.context("stepped computation ended early");
                };
                let line = line.context("failed to read stdin")?;
                match StepCommand::parse(&line) {
                    Some(StepCommand::Advance) => {
                        if !session.advance_step() {
                            debug!("advance already pending");
                        }
                    }
                    Some(StepCommand::Quit) => {
                        session.stop().await?;
                        return Ok(PathOutcome::Cancelled);
                    }
                    None => warn!(input = %line.trim(), "unknown command; use enter or n to advance, q to stop"),
                }
            }
        }
    }

    let outcome = session.finish().await?;
    outcome.context("stepped computation ended early")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_commands_parse() {
        assert_eq!(StepCommand::parse(""), Some(StepCommand::Advance));
        assert_eq!(StepCommand::parse(" n \n"), Some(StepCommand::Advance));
        assert_eq!(StepCommand::parse("q"), Some(StepCommand::Quit));
        assert_eq!(StepCommand::parse("jump"), None);
    }
}
