use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use trellis_core::error::{Result, TrellisError};
use trellis_core::{Goal, RunState};

use crate::node::{NodeContext, NodeHandler, NodeResult};
use crate::registry::NodeRegistry;
use crate::spec::GraphSpec;
use crate::tracker::{AttemptOutcome, NoopTracker, RunId, RunTracker};

/// How long a single tracker hook call may block the run.
const HOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// How many times one node may be visited before the run is terminated.
const MAX_NODE_VISITS: usize = 5;

/// The run's final outcome.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Whether the run completed without exhausting any retry budget.
    pub success: bool,
    /// The shared state as of completion or last attempt.
    pub output: HashMap<String, serde_json::Value>,
    /// Failure text, present only on failure. Formatted as
    /// `failed after {max_retries} attempts: {last error}`.
    pub error: Option<String>,
}

/// Drives one run of a declared graph.
///
/// The executor owns the id → handler registry and a run tracker. A run
/// validates the graph up front (collecting every violation, not just the
/// first), then walks node by node from the entry node: per attempt it
/// notifies the tracker, invokes the handler, records the outcome, and
/// either merges the output and advances along the first declared edge or
/// retries until the node's budget is exhausted.
pub struct GraphExecutor {
    registry: NodeRegistry,
    tracker: Arc<dyn RunTracker>,
}

impl GraphExecutor {
    /// Create an executor reporting to the given run tracker.
    pub fn new(tracker: Arc<dyn RunTracker>) -> Self {
        Self {
            registry: NodeRegistry::new(),
            tracker,
        }
    }

    /// Create an executor that records nothing.
    pub fn untracked() -> Self {
        Self::new(Arc::new(NoopTracker))
    }

    /// Bind a node id to a handler implementation.
    ///
    /// Must be called for every id that appears in a graph passed to
    /// [`execute`](Self::execute); validation rejects graphs with
    /// unregistered nodes.
    pub fn register(&mut self, node_id: impl Into<String>, handler: Arc<dyn NodeHandler>) {
        self.registry.register(node_id, handler);
    }

    /// Execute one run without external cancellation.
    pub async fn execute(
        &self,
        graph: &GraphSpec,
        goal: &Goal,
        initial_state: HashMap<String, serde_json::Value>,
    ) -> Result<ExecutionResult> {
        self.execute_with_cancellation(graph, goal, initial_state, CancellationToken::new())
            .await
    }

    /// Execute one run, observing the given cancellation token.
    ///
    /// The token is checked before each attempt and is threaded into every
    /// [`NodeContext`] so long-running handlers can observe it. When it
    /// fires, the engine stops retrying and traversing and returns
    /// [`TrellisError::Cancelled`].
    pub async fn execute_with_cancellation(
        &self,
        graph: &GraphSpec,
        goal: &Goal,
        initial_state: HashMap<String, serde_json::Value>,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult> {
        self.validate(graph)?;

        let run = match self.hook("start_run", self.tracker.start_run(goal)).await {
            Some(id) => id,
            // Tracking is best-effort: run untracked under a local id.
            None => RunId::new(),
        };
        info!(run_id = %run, graph = %graph.name, goal_id = %goal.id, "Starting run");

        let mut state = RunState::from_map(initial_state);
        let mut current = graph.entry_node.clone();
        let mut visited: Vec<String> = Vec::new();

        loop {
            // Prevent infinite loops: edges may form cycles, and a run whose
            // handlers never suspend could not otherwise be preempted.
            if visited.iter().filter(|id| **id == current).count() > MAX_NODE_VISITS {
                warn!(
                    run_id = %run,
                    node_id = %current,
                    "Node visited more than {} times, terminating run", MAX_NODE_VISITS
                );
                let message = format!(
                    "node '{}' visited more than {} times, terminating run",
                    current, MAX_NODE_VISITS
                );
                self.hook(
                    "report_problem",
                    self.tracker.report_problem(&run, &current, &message),
                )
                .await;
                self.hook("end_run", self.tracker.end_run(&run, false)).await;
                return Ok(ExecutionResult {
                    success: false,
                    output: state.into_map(),
                    error: Some(message),
                });
            }
            visited.push(current.clone());

            // Both lookups were checked during validation.
            let spec = graph.node(&current).ok_or_else(|| {
                TrellisError::InvalidGraph(format!("node '{}' is not a declared node", current))
            })?;
            let handler = self.registry.get(&spec.id).ok_or_else(|| {
                TrellisError::InvalidGraph(format!(
                    "no handler registered for node '{}'",
                    spec.id
                ))
            })?;

            self.hook("set_node", self.tracker.set_node(&run, &spec.id))
                .await;

            let inputs = match state.restrict(&spec.input_keys) {
                Ok(inputs) => inputs,
                Err(key) => {
                    // An absent input key means the graph is wired wrong,
                    // not that the node should retry.
                    let err = TrellisError::MissingInput {
                        node: spec.id.clone(),
                        key,
                    };
                    error!(run_id = %run, node_id = %spec.id, error = %err, "Aborting run");
                    self.hook(
                        "report_problem",
                        self.tracker.report_problem(&run, &spec.id, &err.to_string()),
                    )
                    .await;
                    self.hook("end_run", self.tracker.end_run(&run, false)).await;
                    return Err(err);
                }
            };

            let limit = spec.max_retries + 1;
            let mut success_output = None;
            let mut last_error = String::new();

            for attempt in 1..=limit {
                if cancel.is_cancelled() {
                    info!(run_id = %run, node_id = %spec.id, "Run cancelled");
                    self.hook("end_run", self.tracker.end_run(&run, false)).await;
                    return Err(TrellisError::Cancelled);
                }

                let decision = self
                    .hook("decide", self.tracker.decide(&run, &spec.id, attempt))
                    .await
                    .unwrap_or_default();

                let ctx = NodeContext {
                    node_id: spec.id.clone(),
                    attempt,
                    inputs: inputs.clone(),
                    goal: goal.clone(),
                    cancel: cancel.clone(),
                };

                debug!(node_id = %spec.id, attempt, limit, "Executing node attempt");
                let result = handler.execute(ctx).await;

                let outcome = AttemptOutcome {
                    node_id: spec.id.clone(),
                    attempt,
                    success: result.is_success(),
                    error: result.error().map(str::to_string),
                };
                self.hook(
                    "record_outcome",
                    self.tracker.record_outcome(&run, &decision, &outcome),
                )
                .await;

                match result {
                    NodeResult::Success { output } => {
                        debug!(node_id = %spec.id, attempt, "Node attempt succeeded");
                        success_output = Some(output);
                        break;
                    }
                    NodeResult::Failure { error } => {
                        warn!(node_id = %spec.id, attempt, error = %error, "Node attempt failed");
                        last_error = error;
                    }
                }
            }

            let output = match success_output {
                Some(output) => output,
                None => {
                    // The user-visible count is the retry budget, not the
                    // total attempt count, and the last error is verbatim.
                    let message =
                        format!("failed after {} attempts: {}", spec.max_retries, last_error);
                    error!(run_id = %run, node_id = %spec.id, "Node exhausted its retry budget");
                    self.hook(
                        "report_problem",
                        self.tracker.report_problem(&run, &spec.id, &message),
                    )
                    .await;
                    self.hook("end_run", self.tracker.end_run(&run, false)).await;
                    return Ok(ExecutionResult {
                        success: false,
                        output: state.into_map(),
                        error: Some(message),
                    });
                }
            };

            // Only a successful attempt's output reaches shared state, and
            // only under the node's declared output keys.
            let mut delta = HashMap::with_capacity(spec.output_keys.len());
            for key in &spec.output_keys {
                if let Some(value) = output.get(key) {
                    delta.insert(key.clone(), value.clone());
                }
            }
            state.merge(delta);

            match graph.next_edge(&current) {
                Some(edge) => {
                    debug!(from = %edge.from, to = %edge.to, "Following edge");
                    current = edge.to.clone();
                }
                None => {
                    if !graph.is_terminal(&current) {
                        debug!(node_id = %current, "No outgoing edges, ending run");
                    }
                    info!(run_id = %run, "Run complete");
                    self.hook("end_run", self.tracker.end_run(&run, true)).await;
                    return Ok(ExecutionResult {
                        success: true,
                        output: state.into_map(),
                        error: None,
                    });
                }
            }
        }
    }

    /// Check the graph's wiring and registration, collecting every
    /// violation into one configuration error.
    fn validate(&self, graph: &GraphSpec) -> Result<()> {
        let mut violations = graph.violations();
        for node in &graph.nodes {
            if !self.registry.contains(&node.id) {
                violations.push(format!("no handler registered for node '{}'", node.id));
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(TrellisError::InvalidGraph(violations.join("\n")))
        }
    }

    /// Await a tracker hook, bounding its latency and swallowing errors.
    async fn hook<T, F>(&self, name: &'static str, fut: F) -> Option<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        match tokio::time::timeout(HOOK_TIMEOUT, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(hook = name, error = %e, "Run tracker call failed");
                None
            }
            Err(_) => {
                warn!(hook = name, "Run tracker call timed out");
                None
            }
        }
    }
}
