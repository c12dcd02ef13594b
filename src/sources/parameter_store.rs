//! Collaborator traits for the remote parameter store and exports registry.

use crate::error::Result;
use async_trait::async_trait;

/// A single named value returned by a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Fully qualified name, e.g. `/production/mysql/host`.
    pub name: String,
    /// The (decrypted) value.
    pub value: String,
}

impl Parameter {
    /// Create a new parameter.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One response page from the parameter store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParametersPage {
    /// Parameters that were found.
    pub parameters: Vec<Parameter>,
    /// Requested names the store does not know about.
    pub invalid_parameters: Vec<String>,
    /// Continuation token for the next page, if any.
    pub next_token: Option<String>,
}

/// Query for [`ParameterStore::get_parameters_by_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    /// Path prefix to list under.
    pub path: String,
    /// Whether to descend into nested paths.
    pub recursive: bool,
    /// Whether to return decrypted values.
    pub with_decryption: bool,
    /// Continuation token from the previous page.
    pub next_token: Option<String>,
}

/// Remote parameter store.
///
/// Implement this trait to resolve configuration from a store other than
/// AWS Systems Manager.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch up to ten parameters by fully qualified name.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` on transport or service errors. Unknown names
    /// are reported through [`ParametersPage::invalid_parameters`], not as errors.
    async fn get_parameters(&self, names: &[String], with_decryption: bool)
    -> Result<ParametersPage>;

    /// Fetch one page of parameters under a path prefix.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` on transport or service errors.
    async fn get_parameters_by_path(&self, query: &PathQuery) -> Result<ParametersPage>;

    /// Get a human-readable name for this store (for logging/debugging).
    fn name(&self) -> String;
}

/// One response page from the exports registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportsPage {
    /// Exports on this page.
    pub exports: Vec<Parameter>,
    /// Continuation token for the next page, if any.
    pub next_token: Option<String>,
}

/// Registry of named exports (e.g. CloudFormation stack outputs).
#[async_trait]
pub trait ExportsRegistry: Send + Sync {
    /// List one page of exports.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` on transport or service errors.
    async fn list_exports(&self, next_token: Option<&str>) -> Result<ExportsPage>;

    /// Get a human-readable name for this registry (for logging/debugging).
    fn name(&self) -> String;
}
