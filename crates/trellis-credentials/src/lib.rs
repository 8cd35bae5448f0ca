//! Credential preflight for trellis runs.
//!
//! Before a graph executes, the caller may verify that every credential its
//! nodes require is actually available — in an encrypted store, or falling
//! back to environment variables — and get one aggregate report of
//! everything that is missing, with remediation guidance. The preflight is
//! read-only with respect to the graph and runs strictly before the engine;
//! the engine itself never touches credentials.
//!
//! [`ensure_credential_key_env`] is the one-shot bootstrap that loads the
//! store's decryption key from the user's shell configuration when the
//! process environment lacks it.

pub mod bootstrap;
pub mod catalog;
pub mod preflight;
pub mod storage;

pub use bootstrap::{ensure_credential_key_env, CREDENTIAL_KEY_ENV};
pub use catalog::{CredentialCatalog, CredentialSpec};
pub use preflight::CredentialPreflight;
pub use storage::{CompositeStorage, CredentialStorage, EnvVarStorage};
