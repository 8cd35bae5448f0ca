//! Graph Execution Engine — declarative multi-step workflow orchestration.
//!
//! A workflow is a [`GraphSpec`]: a directed graph of [`NodeSpec`]s connected
//! by [`Edge`]s, with one entry node and a set of terminal nodes. Every node
//! id is bound to a [`NodeHandler`] implementation through a [`NodeRegistry`]
//! before the run starts.
//!
//! The [`GraphExecutor`] walks the graph from the entry node, invoking each
//! node with a per-attempt [`NodeContext`] and retrying failed attempts up to
//! the node's `max_retries` budget. Successful output is merged into the
//! run-scoped shared state under the node's declared output keys, and the
//! first declared outgoing edge is followed to the next node.
//!
//! Observability goes through the [`RunTracker`] hook trait. Every tracker
//! call is best-effort: a failing tracker can never change a run's outcome.

pub mod executor;
pub mod node;
pub mod registry;
pub mod spec;
pub mod tracker;

pub use executor::{ExecutionResult, GraphExecutor};
pub use node::{NodeContext, NodeHandler, NodeResult};
pub use registry::NodeRegistry;
pub use spec::{Edge, GraphSpec, NodeSpec};
pub use tracker::{AttemptOutcome, DecisionId, NoopTracker, RunId, RunTracker};
