use std::collections::HashMap;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use trellis_core::Goal;

/// Immutable snapshot handed to a node for one attempt.
#[derive(Debug, Clone)]
pub struct NodeContext {
    /// Id of the node being executed.
    pub node_id: String,
    /// 1-based attempt number; increments on each retry.
    pub attempt: u32,
    /// Shared-state values restricted to the node's declared input keys.
    pub inputs: HashMap<String, serde_json::Value>,
    /// The run's goal. Opaque context, not a control signal.
    pub goal: Goal,
    /// Cooperative cancellation signal. Long-running nodes should observe
    /// it and return early when it fires.
    pub cancel: CancellationToken,
}

impl NodeContext {
    /// Get an input value by key.
    pub fn input(&self, key: &str) -> Option<&serde_json::Value> {
        self.inputs.get(key)
    }

    /// Get an input value as a string, if it's a string.
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).and_then(|v| v.as_str())
    }
}

/// The outcome of a single attempt.
///
/// Failure here is a value, not an error: a failed attempt is expected
/// control flow that the engine retries up to the node's budget. Error
/// signaling is reserved for configuration problems.
#[derive(Debug, Clone)]
pub enum NodeResult {
    Success {
        /// Output delta to merge into shared state under the node's
        /// declared output keys.
        output: HashMap<String, serde_json::Value>,
    },
    Failure {
        /// What went wrong, in the node's own words. Reported verbatim
        /// when the retry budget is exhausted.
        error: String,
    },
}

impl NodeResult {
    /// A successful attempt with the given output delta.
    pub fn ok(output: HashMap<String, serde_json::Value>) -> Self {
        Self::Success { output }
    }

    /// A successful attempt that produced nothing.
    pub fn ok_empty() -> Self {
        Self::Success {
            output: HashMap::new(),
        }
    }

    /// A failed attempt.
    pub fn fail(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The failure text, if this attempt failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure { error } => Some(error),
            Self::Success { .. } => None,
        }
    }
}

/// A unit of work bound to a node id.
///
/// Implementations may perform arbitrary external work and suspend while
/// doing so. The engine re-invokes the same handler with an incremented
/// attempt counter on retry; idempotency across attempts is the
/// implementer's responsibility.
pub trait NodeHandler: Send + Sync + 'static {
    /// Execute a single attempt.
    fn execute(&self, ctx: NodeContext) -> BoxFuture<'_, NodeResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_result_constructors() {
        let mut output = HashMap::new();
        output.insert("result".to_string(), serde_json::json!("done"));

        let ok = NodeResult::ok(output);
        assert!(ok.is_success());
        assert!(ok.error().is_none());

        let fail = NodeResult::fail("boom");
        assert!(!fail.is_success());
        assert_eq!(fail.error(), Some("boom"));
    }

    #[test]
    fn test_context_input_accessors() {
        let mut inputs = HashMap::new();
        inputs.insert("topic".to_string(), serde_json::json!("Rust"));
        inputs.insert("count".to_string(), serde_json::json!(3));

        let ctx = NodeContext {
            node_id: "n1".to_string(),
            attempt: 1,
            inputs,
            goal: Goal::new("g", "Goal", ""),
            cancel: CancellationToken::new(),
        };

        assert_eq!(ctx.input_str("topic"), Some("Rust"));
        assert_eq!(ctx.input("count"), Some(&serde_json::json!(3)));
        assert!(ctx.input("missing").is_none());
        assert!(ctx.input_str("count").is_none());
    }
}
