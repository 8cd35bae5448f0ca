use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One step's declaration in a graph.
///
/// A NodeSpec describes the shape of a step — what it reads, what it
/// writes, and how many times it may be retried — without saying anything
/// about how the work is done. The matching behavior is registered
/// separately under the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Unique identifier within a graph.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Category tag used only for external tool and credential resolution.
    /// The engine never branches on it.
    #[serde(default)]
    pub node_type: String,
    /// Tool identifiers this node requires. Opaque to the engine.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Additional attempts allowed after the first one fails.
    /// Total attempts per run = `max_retries + 1`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Keys this node reads from shared state.
    #[serde(default)]
    pub input_keys: Vec<String>,
    /// Keys this node writes into shared state.
    #[serde(default)]
    pub output_keys: Vec<String>,
}

fn default_max_retries() -> u32 {
    3
}

impl NodeSpec {
    /// Create a new node spec with minimal configuration.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: String::new(),
            tools: vec![],
            max_retries: default_max_retries(),
            input_keys: vec![],
            output_keys: vec![],
        }
    }

    /// Set the node type tag.
    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = node_type.into();
        self
    }

    /// Set the required tools.
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the retry budget (additional attempts after the first).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the input keys.
    pub fn with_inputs(mut self, keys: Vec<String>) -> Self {
        self.input_keys = keys;
        self
    }

    /// Set the output keys.
    pub fn with_outputs(mut self, keys: Vec<String>) -> Self {
        self.output_keys = keys;
        self
    }
}

/// A directed transition between two nodes.
///
/// An edge is taken only after its source node completes successfully.
/// When a node has several outgoing edges, the first declared one wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// The declarative shape of one run.
///
/// Built once before a run and never mutated during it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSpec {
    /// Human-readable name for this graph.
    pub name: String,
    /// Id of the node execution starts from.
    pub entry_node: String,
    /// All declared nodes. Ids must be unique.
    pub nodes: Vec<NodeSpec>,
    /// Directed transitions, taken on the source node's success.
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Ids at which a run may legitimately end.
    #[serde(default)]
    pub terminal_nodes: Vec<String>,
}

impl GraphSpec {
    pub fn new(name: impl Into<String>, entry_node: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_node: entry_node.into(),
            nodes: vec![],
            edges: vec![],
            terminal_nodes: vec![],
        }
    }

    /// Add a node declaration.
    pub fn with_node(mut self, node: NodeSpec) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add an edge.
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Mark a node id as terminal.
    pub fn with_terminal(mut self, id: impl Into<String>) -> Self {
        self.terminal_nodes.push(id.into());
        self
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Whether the id is declared terminal.
    pub fn is_terminal(&self, id: &str) -> bool {
        self.terminal_nodes.iter().any(|t| t == id)
    }

    /// Outgoing edges from a node, in declaration order.
    pub fn outgoing<'a>(&'a self, from: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.from == from)
    }

    /// The edge the engine will take after `from` succeeds: the first
    /// declared outgoing edge, if any.
    pub fn next_edge(&self, from: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.from == from)
    }

    /// Structural wiring violations, all of them.
    ///
    /// Registration checks live in the executor; this covers everything
    /// knowable from the spec alone: duplicate ids, a dangling entry node,
    /// dangling edge endpoints, and dangling terminal declarations.
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                violations.push(format!("duplicate node id '{}'", node.id));
            }
        }

        if !seen.contains(self.entry_node.as_str()) {
            violations.push(format!(
                "entry node '{}' is not a declared node",
                self.entry_node
            ));
        }

        for edge in &self.edges {
            if !seen.contains(edge.from.as_str()) {
                violations.push(format!(
                    "edge source '{}' is not a declared node",
                    edge.from
                ));
            }
            if !seen.contains(edge.to.as_str()) {
                violations.push(format!("edge target '{}' is not a declared node", edge.to));
            }
        }

        for terminal in &self.terminal_nodes {
            if !seen.contains(terminal.as_str()) {
                violations.push(format!(
                    "terminal node '{}' is not a declared node",
                    terminal
                ));
            }
        }

        violations
    }
}
