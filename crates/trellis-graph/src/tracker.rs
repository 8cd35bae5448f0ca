use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trellis_core::error::Result;
use trellis_core::Goal;

/// Unique run identifier, issued by the tracking backend or generated
/// locally when the backend is unreachable.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for one recorded decision point (one attempt).
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct DecisionId(pub String);

impl DecisionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DecisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened on one attempt, as reported to the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptOutcome {
    /// Which node ran.
    pub node_id: String,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// The failure text, present only on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run-tracking collaborator — external observability backend.
///
/// The engine calls these hooks in a fixed order: `start_run` once,
/// `set_node` per node, then per attempt `decide` → node execution →
/// `record_outcome`, and finally `report_problem` (on failure) and
/// `end_run`. Every call is best-effort: errors returned here are logged
/// by the engine and never change the run's outcome. Implementations
/// should bound their own latency so telemetry cannot starve execution.
pub trait RunTracker: Send + Sync + 'static {
    /// Begin a run for a goal, returning the run identifier used for all
    /// subsequent hook calls.
    fn start_run(&self, goal: &Goal) -> BoxFuture<'_, Result<RunId>>;

    /// Record a decision point before an attempt executes.
    fn decide(&self, run: &RunId, node_id: &str, attempt: u32)
        -> BoxFuture<'_, Result<DecisionId>>;

    /// Record an attempt's outcome against its decision point.
    fn record_outcome(
        &self,
        run: &RunId,
        decision: &DecisionId,
        outcome: &AttemptOutcome,
    ) -> BoxFuture<'_, Result<()>>;

    /// Mark which node is currently executing.
    fn set_node(&self, run: &RunId, node_id: &str) -> BoxFuture<'_, Result<()>>;

    /// Report an unrecoverable problem.
    fn report_problem(&self, run: &RunId, node_id: &str, problem: &str)
        -> BoxFuture<'_, Result<()>>;

    /// End the run with its final success flag.
    fn end_run(&self, run: &RunId, success: bool) -> BoxFuture<'_, Result<()>>;
}

/// Tracker that records nothing. For untracked runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracker;

impl RunTracker for NoopTracker {
    fn start_run(&self, _goal: &Goal) -> BoxFuture<'_, Result<RunId>> {
        Box::pin(async { Ok(RunId::new()) })
    }

    fn decide(
        &self,
        _run: &RunId,
        _node_id: &str,
        _attempt: u32,
    ) -> BoxFuture<'_, Result<DecisionId>> {
        Box::pin(async { Ok(DecisionId::new()) })
    }

    fn record_outcome(
        &self,
        _run: &RunId,
        _decision: &DecisionId,
        _outcome: &AttemptOutcome,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn set_node(&self, _run: &RunId, _node_id: &str) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn report_problem(
        &self,
        _run: &RunId,
        _node_id: &str,
        _problem: &str,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn end_run(&self, _run: &RunId, _success: bool) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}
