use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// One credential's declaration in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSpec {
    /// Environment variable this credential is surfaced through.
    pub env_var: String,
    /// Storage id, when it differs from the catalog name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    /// Tool identifiers that require this credential.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Node types that require this credential.
    #[serde(default)]
    pub node_types: Vec<String>,
    /// Where to obtain the credential.
    #[serde(default)]
    pub help_url: String,
}

impl CredentialSpec {
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
            credential_id: None,
            tools: vec![],
            node_types: vec![],
            help_url: String::new(),
        }
    }

    pub fn with_credential_id(mut self, id: impl Into<String>) -> Self {
        self.credential_id = Some(id.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_node_types(mut self, node_types: Vec<String>) -> Self {
        self.node_types = node_types;
        self
    }

    pub fn with_help_url(mut self, url: impl Into<String>) -> Self {
        self.help_url = url.into();
        self
    }
}

/// Catalog of known credentials, keyed by name.
///
/// This is the possibly-absent companion collaborator of the preflight:
/// without a catalog there is nothing to resolve tools and node types
/// against, and validation becomes a no-op by contract.
///
/// A `BTreeMap` keeps iteration deterministic, which keeps preflight
/// reports stable across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialCatalog {
    specs: BTreeMap<String, CredentialSpec>,
}

impl CredentialCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential declaration under a name.
    pub fn with_credential(mut self, name: impl Into<String>, spec: CredentialSpec) -> Self {
        self.specs.insert(name.into(), spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CredentialSpec> {
        self.specs.get(name)
    }

    /// The storage id for a named credential: its explicit `credential_id`
    /// when set, otherwise the catalog name itself.
    pub fn credential_id<'a>(&self, name: &'a str, spec: &'a CredentialSpec) -> &'a str {
        spec.credential_id.as_deref().unwrap_or(name)
    }

    /// Name of the credential a tool depends on, if any.
    pub fn credential_for_tool(&self, tool: &str) -> Option<&str> {
        self.specs
            .iter()
            .find(|(_, spec)| spec.tools.iter().any(|t| t == tool))
            .map(|(name, _)| name.as_str())
    }

    /// Name of the credential a node type depends on, if any.
    pub fn credential_for_node_type(&self, node_type: &str) -> Option<&str> {
        self.specs
            .iter()
            .find(|(_, spec)| spec.node_types.iter().any(|nt| nt == node_type))
            .map(|(name, _)| name.as_str())
    }

    /// Credential id → env var mapping for an [`EnvVarStorage`].
    ///
    /// [`EnvVarStorage`]: crate::storage::EnvVarStorage
    pub fn env_mapping(&self) -> HashMap<String, String> {
        self.specs
            .iter()
            .map(|(name, spec)| {
                (
                    self.credential_id(name, spec).to_string(),
                    spec.env_var.clone(),
                )
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
