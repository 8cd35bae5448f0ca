use std::collections::BTreeSet;

use tracing::debug;

use trellis_core::error::{Result, TrellisError};
use trellis_graph::NodeSpec;

use crate::catalog::CredentialCatalog;
use crate::storage::{CompositeStorage, EnvVarStorage};

/// Result of checking a single credential.
struct CredentialCheck {
    env_var: String,
    source: Option<String>,
    used_by: String,
    available: bool,
    help_url: String,
}

/// Pre-run credential availability check.
///
/// Derives the set of required credentials from a graph's node specs
/// (their required tools and node types), resolves each against the
/// backing stores, and fails with one aggregate error naming every
/// missing credential. Read-only with respect to the graph; must run
/// strictly before the engine's `execute`, never inside it.
///
/// The catalog is optional: without one there is nothing to resolve
/// requirements against, and `validate` is a no-op by contract.
pub struct CredentialPreflight {
    catalog: Option<CredentialCatalog>,
    storage: CompositeStorage,
}

impl CredentialPreflight {
    pub fn new(catalog: Option<CredentialCatalog>, storage: CompositeStorage) -> Self {
        Self { catalog, storage }
    }

    /// Build a preflight whose only backing store is the process
    /// environment, mapped through the catalog.
    pub fn from_catalog(catalog: CredentialCatalog) -> Self {
        let storage =
            CompositeStorage::single(Box::new(EnvVarStorage::new(catalog.env_mapping())));
        Self {
            catalog: Some(catalog),
            storage,
        }
    }

    /// Check that every credential the given nodes require is available.
    ///
    /// Unless `quiet`, prints one human-readable block per distinct
    /// required credential: availability marker, environment variable,
    /// and either the resolved source or the set of dependents it is
    /// missing for.
    pub fn validate(&self, nodes: &[NodeSpec], quiet: bool) -> Result<()> {
        let Some(catalog) = &self.catalog else {
            debug!("No credential catalog configured, skipping preflight");
            return Ok(());
        };

        let required_tools: BTreeSet<&str> = nodes
            .iter()
            .flat_map(|n| n.tools.iter().map(String::as_str))
            .collect();
        let node_types: BTreeSet<&str> = nodes
            .iter()
            .map(|n| n.node_type.as_str())
            .filter(|nt| !nt.is_empty())
            .collect();

        // Deduplicated, tools first, each in sorted order.
        let mut checks: Vec<CredentialCheck> = Vec::new();
        let mut checked: BTreeSet<&str> = BTreeSet::new();

        for tool in &required_tools {
            let Some(name) = catalog.credential_for_tool(tool) else {
                continue;
            };
            if !checked.insert(name) {
                continue;
            }
            let spec = match catalog.get(name) {
                Some(spec) => spec,
                None => continue,
            };
            let affected = required_tools
                .iter()
                .filter(|t| spec.tools.iter().any(|s| s == **t))
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            checks.push(self.check(catalog, name, affected));
        }

        for nt in &node_types {
            let Some(name) = catalog.credential_for_node_type(nt) else {
                continue;
            };
            if !checked.insert(name) {
                continue;
            }
            let spec = match catalog.get(name) {
                Some(spec) => spec,
                None => continue,
            };
            let affected = node_types
                .iter()
                .filter(|t| spec.node_types.iter().any(|s| s == **t))
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            checks.push(self.check(catalog, name, format!("{} nodes", affected)));
        }

        if !quiet && !checks.is_empty() {
            println!("\nCredential Status:");
            println!("{}", "-".repeat(60));
            for c in &checks {
                let status = if c.available { "✓" } else { "✗" };
                let suffix = if c.available { "" } else { " (MISSING)" };
                println!("  {} {}{}", status, c.env_var, suffix);
                match &c.source {
                    Some(source) if c.available => {
                        println!("      Source: {}", source);
                        println!("      Used by: {}", c.used_by);
                    }
                    _ => println!("      Required by: {}", c.used_by),
                }
            }
            println!("{}", "-".repeat(60));
        }

        let missing: Vec<&CredentialCheck> = checks.iter().filter(|c| !c.available).collect();
        if missing.is_empty() {
            return Ok(());
        }

        let mut lines = vec!["Missing required credentials:\n".to_string()];
        for c in &missing {
            lines.push(format!("  {} for {}", c.env_var, c.used_by));
            if !c.help_url.is_empty() {
                lines.push(format!("    Get it at: {}", c.help_url));
            }
        }
        lines.push(
            "\nTo fix: add each credential to the encrypted store or export \
             its environment variable.\nIf you've already set up credentials, \
             restart your terminal to load them."
                .to_string(),
        );
        Err(TrellisError::Credential(lines.join("\n")))
    }

    fn check(
        &self,
        catalog: &CredentialCatalog,
        name: &str,
        used_by: String,
    ) -> CredentialCheck {
        // The catalog resolved this name moments ago; an absent spec only
        // means an empty placeholder check.
        let Some(spec) = catalog.get(name) else {
            return CredentialCheck {
                env_var: String::new(),
                source: None,
                used_by,
                available: false,
                help_url: String::new(),
            };
        };
        let credential_id = catalog.credential_id(name, spec);
        let source = self.storage.source(credential_id).map(str::to_string);
        CredentialCheck {
            env_var: spec.env_var.clone(),
            available: source.is_some(),
            source,
            used_by,
            help_url: spec.help_url.clone(),
        }
    }
}
