use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::node::NodeHandler;

/// Binds declared node ids to concrete handler implementations.
///
/// Every id that appears in a graph passed to the executor must be
/// registered first; an unregistered id is a configuration error caught
/// during validation, before any node runs.
#[derive(Default)]
pub struct NodeRegistry {
    handlers: HashMap<String, Arc<dyn NodeHandler>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a node id to a handler. Re-registering an id replaces the
    /// previous binding.
    pub fn register(&mut self, node_id: impl Into<String>, handler: Arc<dyn NodeHandler>) {
        let node_id = node_id.into();
        debug!(node_id = %node_id, "Registering node handler");
        self.handlers.insert(node_id, handler);
    }

    /// Look up the handler for a node id.
    pub fn get(&self, node_id: &str) -> Option<Arc<dyn NodeHandler>> {
        self.handlers.get(node_id).cloned()
    }

    /// Whether a handler is registered for this id.
    pub fn contains(&self, node_id: &str) -> bool {
        self.handlers.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeContext, NodeResult};
    use futures::future::BoxFuture;

    struct EchoNode;

    impl NodeHandler for EchoNode {
        fn execute(&self, _ctx: NodeContext) -> BoxFuture<'_, NodeResult> {
            Box::pin(async { NodeResult::ok_empty() })
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = NodeRegistry::new();
        assert!(registry.is_empty());

        registry.register("echo", Arc::new(EchoNode));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("echo"));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_reregistering_replaces() {
        let mut registry = NodeRegistry::new();
        registry.register("echo", Arc::new(EchoNode));
        registry.register("echo", Arc::new(EchoNode));
        assert_eq!(registry.len(), 1);
    }
}
