//! Resolution of templates against a registry of named exports.

use crate::core::request::FlatValues;
use crate::core::template::{ConfigTree, Template};
use crate::error::{ConfigError, Result};
use crate::sources::ExportsRegistry;
use std::sync::Arc;
use tracing::{debug, error};

/// Resolves template leaves as export names.
///
/// Each leaf `name` is looked up as `{name}-{namespace}`; every requested
/// export must exist.
pub struct ExportResolver {
    registry: Arc<dyn ExportsRegistry>,
}

impl ExportResolver {
    /// Create a resolver over the given registry.
    pub fn new(registry: Arc<dyn ExportsRegistry>) -> Self {
        Self { registry }
    }

    /// List every export, following continuation tokens.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if any page fails to load.
    pub async fn list_all(&self) -> Result<FlatValues> {
        let mut exports = FlatValues::new();
        let mut next_token: Option<String> = None;
        loop {
            let page = self.registry.list_exports(next_token.as_deref()).await?;
            exports.extend(page.exports.into_iter().map(|e| (e.name, e.value)));
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }
        debug!(registry = %self.registry.name(), count = exports.len(), "listed exports");
        Ok(exports)
    }

    /// Populate `template` with export values for `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `MissingExport` naming the first export that does not exist,
    /// or `RemoteFailure` if the listing fails.
    pub async fn resolve(&self, template: &Template, namespace: &str) -> Result<ConfigTree> {
        let exports = self.list_all().await?;

        let mut values = FlatValues::new();
        for name in template.leaves() {
            let full_name = format!("{}-{}", name, namespace);
            match exports.get(&full_name) {
                Some(value) => {
                    values.insert(name.clone(), value.clone());
                }
                None => {
                    error!(export = %full_name, "export not found");
                    return Err(ConfigError::MissingExport(full_name));
                }
            }
        }

        Ok(template.populate(&values))
    }
}
