//! Command surface used by the presentation layer.
//!
//! A [`PathSession`] owns the start/end selection and at most one in-flight
//! stepped computation. Every command that starts a computation, and `stop`,
//! first cancels and awaits whatever stepped run is still active.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::engine::{
    compute_path, EngineOptions, EngineState, PathOutcome, PathRequest, SteppedRun,
};
use crate::error::Result;
use crate::graph::{GraphStore, NodeId};
use crate::notify::PathNotifier;

/// Selection tag of a city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    #[default]
    Neutral,
    Start,
    End,
}

pub struct PathSession {
    graph: Arc<GraphStore>,
    notifier: Arc<dyn PathNotifier>,
    options: EngineOptions,
    start: Option<NodeId>,
    end: Option<NodeId>,
    state: EngineState,
    stepped: Option<SteppedRun>,
}

impl PathSession {
    pub fn new(
        graph: Arc<GraphStore>,
        notifier: Arc<dyn PathNotifier>,
        options: EngineOptions,
    ) -> Self {
        Self {
            graph,
            notifier,
            options,
            start: None,
            end: None,
            state: EngineState::Idle,
            stepped: None,
        }
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn start(&self) -> Option<NodeId> {
        self.start
    }

    pub fn end(&self) -> Option<NodeId> {
        self.end
    }

    /// Select the start city by name. The previous start returns to neutral.
    pub fn set_start(&mut self, name: &str) -> Result<NodeId> {
        let id = self.graph.resolve(name)?;
        debug!(city = name, "start selected");
        self.start = Some(id);
        Ok(id)
    }

    /// Select the end city by name. The previous end returns to neutral.
    pub fn set_end(&mut self, name: &str) -> Result<NodeId> {
        let id = self.graph.resolve(name)?;
        debug!(city = name, "end selected");
        self.end = Some(id);
        Ok(id)
    }

    /// Selection tag of a city. A city chosen as both endpoints shows as start.
    pub fn node_state(&self, node: NodeId) -> NodeState {
        if self.start == Some(node) {
            NodeState::Start
        } else if self.end == Some(node) {
            NodeState::End
        } else {
            NodeState::Neutral
        }
    }

    pub fn state(&self) -> EngineState {
        match &self.stepped {
            Some(run) => run.state(),
            None => self.state,
        }
    }

    /// Receiver that follows the state of the in-flight stepped run.
    pub fn watch_state(&self) -> Option<watch::Receiver<EngineState>> {
        self.stepped.as_ref().map(SteppedRun::subscribe)
    }

    fn request(&self) -> Result<PathRequest> {
        Ok(PathRequest::validate(&self.graph, self.start, self.end)?)
    }

    /// Compute the path between the selected cities in one call.
    pub async fn compute_path(&mut self) -> Result<PathOutcome> {
        self.stop().await?;
        let request = self.request()?;

        self.state = EngineState::Running;
        let outcome = compute_path(&self.graph, request, self.notifier.as_ref(), &self.options);
        self.state = outcome.state();
        info!(state = %self.state, "path computation finished");
        Ok(outcome)
    }

    /// Start a stepped computation paced by [`PathSession::advance_step`].
    pub async fn compute_path_stepped(&mut self) -> Result<()> {
        self.stop().await?;
        let request = self.request()?;

        self.stepped = Some(SteppedRun::spawn(
            Arc::clone(&self.graph),
            request,
            Arc::clone(&self.notifier),
            self.options,
        ));
        self.state = EngineState::Running;
        info!(
            start = %self.graph.name(request.start),
            end = %self.graph.name(request.end),
            "stepped computation started"
        );
        Ok(())
    }

    /// Let the stepped computation perform one iteration.
    ///
    /// Returns `false` when nothing is running or a signal is already pending.
    pub fn advance_step(&self) -> bool {
        self.stepped.as_ref().is_some_and(SteppedRun::advance)
    }

    /// Cancel any in-flight stepped computation and reset the visual state.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(run) = self.stepped.take() else {
            self.notifier.on_reset();
            self.state = EngineState::Idle;
            return Ok(());
        };

        let outcome = run.cancel().await?;
        if !matches!(outcome, PathOutcome::Cancelled) {
            // The run ended on its own before the stop request landed.
            self.notifier.on_reset();
        }
        self.state = outcome.state();
        debug!("stepped computation stopped");
        Ok(())
    }

    /// Wait for the stepped computation to end.
    ///
    /// Something else must keep advancing it; see
    /// [`PathSession::run_stepped_to_end`] for a self-driving variant.
    pub async fn finish(&mut self) -> Result<Option<PathOutcome>> {
        let Some(run) = self.stepped.take() else {
            return Ok(None);
        };
        let outcome = run.join().await?;
        self.state = outcome.state();
        Ok(Some(outcome))
    }

    /// Keep sending advance signals until the stepped computation ends.
    ///
    /// A new signal is only sent once the previous one was consumed, so the
    /// visit delay is waited out rather than polled.
    pub async fn run_stepped_to_end(&mut self) -> Result<Option<PathOutcome>> {
        if let Some(run) = &self.stepped {
            while run.advance_when_ready().await {}
        }
        self.finish().await
    }
}
