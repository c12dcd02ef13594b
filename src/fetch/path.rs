//! Paginated retrieval of every parameter under a path prefix.

use crate::core::FlatValues;
use crate::error::{ConfigError, Result};
use crate::sources::{ParameterStore, PathQuery};
use std::sync::Arc;
use tracing::{debug, error};

/// Fetches all parameters below a path, following continuation tokens.
///
/// Pages are requested one after another, since each request needs the
/// previous page's token.
pub struct PathFetcher {
    store: Arc<dyn ParameterStore>,
}

impl PathFetcher {
    /// Create a fetcher for the given store.
    pub fn new(store: Arc<dyn ParameterStore>) -> Self {
        Self { store }
    }

    /// Fetch every parameter under `path`, recursively and decrypted.
    ///
    /// Returned names have `path` and the following `/` removed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an empty path, `RemoteFailure` for store
    /// errors and `InvalidParameters` as soon as a page reports any.
    pub async fn fetch(&self, path: &str) -> Result<FlatValues> {
        if path.is_empty() {
            return Err(ConfigError::InvalidRequest(
                "path must not be empty".to_string(),
            ));
        }

        let mut values = FlatValues::new();
        let mut next_token = None;
        let mut pages = 0usize;
        loop {
            let query = PathQuery {
                path: path.to_string(),
                recursive: true,
                with_decryption: true,
                next_token: next_token.take(),
            };
            let page = self.store.get_parameters_by_path(&query).await?;
            pages += 1;

            if !page.invalid_parameters.is_empty() {
                error!(path, invalid = ?page.invalid_parameters, "invalid requested params");
                return Err(ConfigError::InvalidParameters(page.invalid_parameters));
            }

            for parameter in page.parameters {
                values.insert(strip_path(path, &parameter.name), parameter.value);
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        debug!(path, pages, count = values.len(), "fetched parameters by path");
        Ok(values)
    }
}

fn strip_path(path: &str, name: &str) -> String {
    match name.strip_prefix(path) {
        Some(rest) => rest.strip_prefix('/').unwrap_or(rest).to_string(),
        None => name.to_string(),
    }
}
