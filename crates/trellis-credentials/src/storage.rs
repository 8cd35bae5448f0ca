use std::collections::HashMap;

/// Read-only credential backing store.
///
/// A store answers one question: does a credential with this id exist
/// here? The preflight never reads credential values, only presence.
pub trait CredentialStorage: Send + Sync {
    /// Whether a credential with this id is present.
    fn exists(&self, credential_id: &str) -> bool;

    /// Human-readable source label, e.g. "encrypted store".
    fn label(&self) -> &str;
}

/// Store backed by process environment variables.
///
/// Holds a credential id → environment variable mapping; a credential
/// exists when its mapped variable is set and non-empty.
pub struct EnvVarStorage {
    env_mapping: HashMap<String, String>,
}

impl EnvVarStorage {
    pub fn new(env_mapping: HashMap<String, String>) -> Self {
        Self { env_mapping }
    }
}

impl CredentialStorage for EnvVarStorage {
    fn exists(&self, credential_id: &str) -> bool {
        let Some(var) = self.env_mapping.get(credential_id) else {
            return false;
        };
        std::env::var(var).map(|v| !v.is_empty()).unwrap_or(false)
    }

    fn label(&self) -> &str {
        "environment variable"
    }
}

/// Checks a primary store first, then fallbacks in declaration order.
pub struct CompositeStorage {
    primary: Box<dyn CredentialStorage>,
    fallbacks: Vec<Box<dyn CredentialStorage>>,
}

impl CompositeStorage {
    pub fn new(primary: Box<dyn CredentialStorage>, fallbacks: Vec<Box<dyn CredentialStorage>>) -> Self {
        Self { primary, fallbacks }
    }

    /// Wrap a single store with no fallbacks.
    pub fn single(store: Box<dyn CredentialStorage>) -> Self {
        Self {
            primary: store,
            fallbacks: vec![],
        }
    }

    /// Whether any store holds this credential.
    pub fn exists(&self, credential_id: &str) -> bool {
        self.source(credential_id).is_some()
    }

    /// The label of the highest-priority store holding this credential.
    pub fn source(&self, credential_id: &str) -> Option<&str> {
        if self.primary.exists(credential_id) {
            return Some(self.primary.label());
        }
        self.fallbacks
            .iter()
            .find(|s| s.exists(credential_id))
            .map(|s| s.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStore {
        label: String,
        ids: Vec<String>,
    }

    impl FixedStore {
        fn holding(label: &str, ids: &[&str]) -> Box<dyn CredentialStorage> {
            Box::new(Self {
                label: label.to_string(),
                ids: ids.iter().map(|s| s.to_string()).collect(),
            })
        }
    }

    impl CredentialStorage for FixedStore {
        fn exists(&self, credential_id: &str) -> bool {
            self.ids.iter().any(|id| id == credential_id)
        }

        fn label(&self) -> &str {
            &self.label
        }
    }

    #[test]
    fn test_env_var_storage_checks_mapped_variable() {
        let mut mapping = HashMap::new();
        mapping.insert(
            "svc_alpha".to_string(),
            "TRELLIS_TEST_STORAGE_ALPHA".to_string(),
        );
        let storage = EnvVarStorage::new(mapping);

        std::env::remove_var("TRELLIS_TEST_STORAGE_ALPHA");
        assert!(!storage.exists("svc_alpha"));
        assert!(!storage.exists("unmapped"));

        std::env::set_var("TRELLIS_TEST_STORAGE_ALPHA", "secret");
        assert!(storage.exists("svc_alpha"));
        std::env::remove_var("TRELLIS_TEST_STORAGE_ALPHA");
    }

    #[test]
    fn test_empty_env_value_is_absent() {
        let mut mapping = HashMap::new();
        mapping.insert(
            "svc_beta".to_string(),
            "TRELLIS_TEST_STORAGE_BETA".to_string(),
        );
        let storage = EnvVarStorage::new(mapping);

        std::env::set_var("TRELLIS_TEST_STORAGE_BETA", "");
        assert!(!storage.exists("svc_beta"));
        std::env::remove_var("TRELLIS_TEST_STORAGE_BETA");
    }

    #[test]
    fn test_composite_prefers_primary_source() {
        let storage = CompositeStorage::new(
            FixedStore::holding("encrypted store", &["both", "only_primary"]),
            vec![FixedStore::holding(
                "environment variable",
                &["both", "only_fallback"],
            )],
        );

        assert_eq!(storage.source("both"), Some("encrypted store"));
        assert_eq!(storage.source("only_primary"), Some("encrypted store"));
        assert_eq!(storage.source("only_fallback"), Some("environment variable"));
        assert_eq!(storage.source("nowhere"), None);
        assert!(storage.exists("both"));
        assert!(!storage.exists("nowhere"));
    }
}
