//! In-process parameter store and exports registry.
//!
//! These behave like their remote counterparts (unknown names are reported
//! as invalid, listings are paginated) and record every call, which makes
//! them suitable for tests and local tooling.

use super::{ExportsPage, ExportsRegistry, Parameter, ParameterStore, ParametersPage, PathQuery};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A call received by an [`InMemoryParameterStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `get_parameters` with the requested names.
    GetParameters(Vec<String>),
    /// `get_parameters_by_path` with the query.
    GetParametersByPath(PathQuery),
}

/// Parameter store backed by an in-memory map.
///
/// # Examples
///
/// ```rust
/// use paramstore_config::sources::{InMemoryParameterStore, ParameterStore};
///
/// # async fn example() -> paramstore_config::error::Result<()> {
/// let store = InMemoryParameterStore::new().with_parameter("/test/db/host", "db.local");
///
/// let page = store.get_parameters(&["/test/db/host".to_string()], true).await?;
/// assert_eq!(page.parameters[0].value, "db.local");
/// # Ok(())
/// # }
/// ```
pub struct InMemoryParameterStore {
    parameters: Mutex<BTreeMap<String, String>>,
    page_size: usize,
    latency: Option<Duration>,
    failure: Mutex<Option<String>>,
    failing_names: Mutex<BTreeMap<String, String>>,
    calls: Mutex<Vec<StoreCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryParameterStore {
    /// Create an empty store. By-path listings return pages of ten.
    pub fn new() -> Self {
        Self {
            parameters: Mutex::new(BTreeMap::new()),
            page_size: 10,
            latency: None,
            failure: Mutex::new(None),
            failing_names: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Add a parameter by fully qualified name.
    pub fn with_parameter(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set the by-path page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Delay every call by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Insert or replace a parameter.
    pub fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.lock().insert(name.into(), value.into());
    }

    /// Make every subsequent call fail with `RemoteFailure(message)`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    /// Make `get_parameters` calls that include `name` fail with `RemoteFailure(message)`.
    ///
    /// Calls for other names keep succeeding.
    pub fn fail_on(&self, name: impl Into<String>, message: impl Into<String>) {
        self.failing_names.lock().insert(name.into(), message.into());
    }

    /// Stop injecting failures.
    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
        self.failing_names.lock().clear();
    }

    /// All calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    /// Highest number of calls that were in progress at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: StoreCall) -> Result<InFlight<'_>> {
        self.calls.lock().push(call);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(message) = self.failure.lock().clone() {
            return Err(ConfigError::RemoteFailure(message));
        }
        Ok(guard)
    }
}

impl Default for InMemoryParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn get_parameters(
        &self,
        names: &[String],
        _with_decryption: bool,
    ) -> Result<ParametersPage> {
        let _guard = self.enter(StoreCall::GetParameters(names.to_vec())).await?;

        let failing = names
            .iter()
            .find_map(|name| self.failing_names.lock().get(name).cloned());
        if let Some(message) = failing {
            return Err(ConfigError::RemoteFailure(message));
        }

        let parameters = self.parameters.lock();
        let mut page = ParametersPage::default();
        for name in names {
            match parameters.get(name) {
                Some(value) => page.parameters.push(Parameter::new(name.clone(), value.clone())),
                None => page.invalid_parameters.push(name.clone()),
            }
        }
        Ok(page)
    }

    async fn get_parameters_by_path(&self, query: &PathQuery) -> Result<ParametersPage> {
        let _guard = self
            .enter(StoreCall::GetParametersByPath(query.clone()))
            .await?;

        let offset = match &query.next_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                ConfigError::RemoteFailure(format!("Invalid continuation token: {token}"))
            })?,
            None => 0,
        };

        let base = format!("{}/", query.path.trim_end_matches('/'));
        let parameters = self.parameters.lock();
        let matching: Vec<Parameter> = parameters
            .iter()
            .filter(|(name, _)| match name.strip_prefix(&base) {
                Some(rest) => query.recursive || !rest.contains('/'),
                None => false,
            })
            .map(|(name, value)| Parameter::new(name.clone(), value.clone()))
            .collect();

        let end = (offset + self.page_size).min(matching.len());
        let next_token = (end < matching.len()).then(|| end.to_string());
        Ok(ParametersPage {
            parameters: matching.get(offset..end).map(<[_]>::to_vec).unwrap_or_default(),
            invalid_parameters: Vec::new(),
            next_token,
        })
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}

/// Exports registry backed by an in-memory map.
pub struct InMemoryExportsRegistry {
    exports: BTreeMap<String, String>,
    page_size: usize,
    failure: Option<String>,
    list_calls: AtomicUsize,
}

impl InMemoryExportsRegistry {
    /// Create an empty registry. Listings return pages of ten.
    pub fn new() -> Self {
        Self {
            exports: BTreeMap::new(),
            page_size: 10,
            failure: None,
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Add an export.
    pub fn with_export(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.exports.insert(name.into(), value.into());
        self
    }

    /// Set the listing page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make every listing fail with `RemoteFailure(message)`.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Number of pages listed so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryExportsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExportsRegistry for InMemoryExportsRegistry {
    async fn list_exports(&self, next_token: Option<&str>) -> Result<ExportsPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(ConfigError::RemoteFailure(message.clone()));
        }

        let offset = match next_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                ConfigError::RemoteFailure(format!("Invalid continuation token: {token}"))
            })?,
            None => 0,
        };

        let exports: Vec<Parameter> = self
            .exports
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|(name, value)| Parameter::new(name.clone(), value.clone()))
            .collect();
        let end = offset + exports.len();
        Ok(ExportsPage {
            exports,
            next_token: (end < self.exports.len()).then(|| end.to_string()),
        })
    }

    fn name(&self) -> String {
        "memory-exports".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_query(path: &str, token: Option<&str>) -> PathQuery {
        PathQuery {
            path: path.to_string(),
            recursive: true,
            with_decryption: true,
            next_token: token.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_unknown_names_are_invalid() {
        let store = InMemoryParameterStore::new().with_parameter("/test/a", "1");
        let page = store
            .get_parameters(&["/test/a".to_string(), "/test/b".to_string()], true)
            .await
            .unwrap();

        assert_eq!(page.parameters, vec![Parameter::new("/test/a", "1")]);
        assert_eq!(page.invalid_parameters, vec!["/test/b"]);
    }

    #[tokio::test]
    async fn test_by_path_paginates() {
        let store = InMemoryParameterStore::new().with_page_size(2);
        for i in 0..5 {
            store.insert(format!("/svc/key{i}"), i.to_string());
        }
        store.insert("/other/key", "x");

        let first = store.get_parameters_by_path(&path_query("/svc", None)).await.unwrap();
        assert_eq!(first.parameters.len(), 2);
        assert_eq!(first.next_token.as_deref(), Some("2"));

        let last = store
            .get_parameters_by_path(&path_query("/svc", Some("4")))
            .await
            .unwrap();
        assert_eq!(last.parameters, vec![Parameter::new("/svc/key4", "4")]);
        assert!(last.next_token.is_none());
    }

    #[tokio::test]
    async fn test_by_path_non_recursive() {
        let store = InMemoryParameterStore::new()
            .with_parameter("/svc/a", "1")
            .with_parameter("/svc/nested/b", "2");

        let mut query = path_query("/svc", None);
        query.recursive = false;
        let page = store.get_parameters_by_path(&query).await.unwrap();
        assert_eq!(page.parameters, vec![Parameter::new("/svc/a", "1")]);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryParameterStore::new();
        store.fail_with("some remote error");

        let err = store.get_parameters(&["/x".to_string()], true).await.unwrap_err();
        assert!(err.to_string().contains("some remote error"));
        assert_eq!(store.call_count(), 1);

        store.clear_failure();
        assert!(store.get_parameters(&["/x".to_string()], true).await.is_ok());
    }

    #[tokio::test]
    async fn test_failure_on_single_name() {
        let store = InMemoryParameterStore::new()
            .with_parameter("/test/a", "1")
            .with_parameter("/test/b", "2");
        store.fail_on("/test/b", "throttled");

        let ok = store.get_parameters(&["/test/a".to_string()], true).await.unwrap();
        assert_eq!(ok.parameters, vec![Parameter::new("/test/a", "1")]);

        let err = store
            .get_parameters(&["/test/a".to_string(), "/test/b".to_string()], true)
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::RemoteFailure(ref m) if m == "throttled"));

        store.clear_failure();
        assert!(store.get_parameters(&["/test/b".to_string()], true).await.is_ok());
    }

    #[tokio::test]
    async fn test_exports_pagination() {
        let registry = InMemoryExportsRegistry::new()
            .with_page_size(1)
            .with_export("a", "1")
            .with_export("b", "2");

        let first = registry.list_exports(None).await.unwrap();
        assert_eq!(first.exports, vec![Parameter::new("a", "1")]);
        let second = registry.list_exports(first.next_token.as_deref()).await.unwrap();
        assert_eq!(second.exports, vec![Parameter::new("b", "2")]);
        assert!(second.next_token.is_none());
        assert_eq!(registry.list_calls(), 2);
    }
}
