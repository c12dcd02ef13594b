//! The configuration resolver tying normalization, caching and fetching together.

use crate::core::builder::ConfigResolverBuilder;
use crate::core::cache::ParameterCache;
use crate::core::exports::ExportResolver;
use crate::core::request::{ConfigRequest, FlatValues, NormalizedRequest, Resolved};
use crate::core::template::ConfigTree;
use crate::error::{ConfigError, Result};
use crate::fetch::{BatchFetcher, PathFetcher};
use crate::settings::ResolverSettings;
use crate::sources::{ExportsRegistry, LocalSource, ParameterStore};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

#[cfg(feature = "metrics")]
use crate::metrics::ResolverMetrics;

/// Resolves configuration values from a parameter store.
///
/// Requests may be a single key, a list of keys, or a nested template.
/// Fetched values are merged into a shared [`ParameterCache`]; cached
/// lookups skip the store only when every requested key is already cached.
///
/// ```text
/// String    resolver.get("host")                   {host: value}
/// List      resolver.get(["host", "username"])     {host: value, username: value}
/// Template  resolver.get(template)                 {db: {host: value}}
/// ```
///
/// # Examples
///
/// ```rust,no_run
/// use paramstore_config::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let resolver = ConfigResolver::builder()
///     .with_environment("production")
///     .build()
///     .await?;
///
/// let values = resolver.get(["mysql/host", "mysql/user"]).await?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigResolver {
    settings: ResolverSettings,
    store: Option<Arc<dyn ParameterStore>>,
    exports: Option<Arc<dyn ExportsRegistry>>,
    local: LocalSource,
    cache: Arc<ParameterCache>,
    #[cfg(feature = "metrics")]
    metrics: Option<ResolverMetrics>,
}

impl ConfigResolver {
    /// Create a new builder.
    pub fn builder() -> ConfigResolverBuilder {
        ConfigResolverBuilder::new()
    }

    pub(crate) fn from_parts(
        settings: ResolverSettings,
        store: Option<Arc<dyn ParameterStore>>,
        exports: Option<Arc<dyn ExportsRegistry>>,
        local: LocalSource,
        cache: Arc<ParameterCache>,
        #[cfg(feature = "metrics")] metrics: Option<ResolverMetrics>,
    ) -> Self {
        Self {
            settings,
            store,
            exports,
            local,
            cache,
            #[cfg(feature = "metrics")]
            metrics,
        }
    }

    /// The settings this resolver was built with.
    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// The cache shared by this resolver.
    pub fn cache(&self) -> &Arc<ParameterCache> {
        &self.cache
    }

    /// Resolve a request, serving it from the cache when every key is cached.
    ///
    /// # Errors
    ///
    /// See [`ConfigResolver::get_with_cache`].
    pub async fn get(&self, request: impl Into<ConfigRequest>) -> Result<Resolved> {
        self.get_with_cache(request, true).await
    }

    /// Resolve a request.
    ///
    /// With `use_cache` the cache is consulted first and a full hit skips the
    /// store. Without it the store is always queried. Fetched values are
    /// merged into the cache either way.
    ///
    /// In the `local` environment the whole document served by the local
    /// development server is returned instead, untouched.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError` if no environment namespace (or no store) is configured
    /// - `InvalidRequest` if the request holds no keys
    /// - `InvalidParameters` if the store does not know some keys
    /// - `RemoteFailure` if any store call fails
    pub async fn get_with_cache(
        &self,
        request: impl Into<ConfigRequest>,
        use_cache: bool,
    ) -> Result<Resolved> {
        let request = request.into();
        let namespace = self.settings.namespace()?;

        if self.settings.is_local() {
            debug!(url = self.local.url(), "resolving from local development server");
            return self.local.fetch().await.map(Resolved::Document);
        }

        let normalized = request.normalize()?;

        #[cfg(feature = "metrics")]
        let timer = self.metrics.as_ref().map(|m| m.start_resolve());

        let result = self.resolve(namespace, normalized, use_cache).await;

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            match &result {
                Ok(_) => metrics.record_resolve_success(timer),
                Err(_) => metrics.record_resolve_failure(timer),
            }
        }

        result
    }

    async fn resolve(
        &self,
        namespace: &str,
        normalized: NormalizedRequest,
        use_cache: bool,
    ) -> Result<Resolved> {
        let NormalizedRequest { keys, template } = normalized;

        let values = match self.lookup_cache(&keys, use_cache) {
            CacheLookup::Hit(values) => {
                debug!(keys = keys.len(), "cache hit");
                #[cfg(feature = "metrics")]
                if let Some(metrics) = &self.metrics {
                    metrics.record_cache_hit();
                }
                values
            }
            #[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
            lookup => {
                debug!(keys = keys.len(), use_cache, "fetching from parameter store");
                #[cfg(feature = "metrics")]
                if let Some(metrics) = &self.metrics {
                    if lookup == CacheLookup::Miss {
                        metrics.record_cache_miss();
                    }
                    metrics.record_remote_calls(
                        keys.len().div_ceil(crate::fetch::MAX_BATCH_SIZE) as u64,
                    );
                }
                let fetched = BatchFetcher::new(self.store()?, namespace)
                    .fetch(&keys)
                    .await?;
                self.cache.merge(&fetched);
                fetched
            }
        };

        Ok(match template {
            Some(template) => Resolved::Tree(template.populate(&values)),
            None => Resolved::Values(values),
        })
    }

    /// Resolve a request and deserialize the result into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigResolver::get`], plus `DeserializationError`.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        request: impl Into<ConfigRequest>,
    ) -> Result<T> {
        self.get(request).await?.deserialize()
    }

    /// Fetch every parameter under `path`, with `path/` stripped from the keys.
    ///
    /// Bypasses the cache.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if `path` is empty
    /// - `InvalidParameters` if a page reports invalid parameters
    /// - `RemoteFailure` if any page fails to load
    pub async fn get_by_path(&self, path: &str) -> Result<FlatValues> {
        PathFetcher::new(self.store()?).fetch(path).await
    }

    /// Resolve a template whose leaves are export names.
    ///
    /// Each leaf `name` is looked up as `{name}-{environment}` in the exports
    /// registry.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if the request is not a template
    /// - `ConfigurationError` if no environment or registry is configured
    /// - `MissingExport` if a requested export does not exist
    /// - `RemoteFailure` if the listing fails
    pub async fn get_exports(&self, request: impl Into<ConfigRequest>) -> Result<ConfigTree> {
        let request = request.into();
        let template = request.as_template().ok_or_else(|| {
            ConfigError::InvalidRequest("params must be an object".to_string())
        })?;
        let namespace = self.settings.namespace()?;

        let registry = self.exports.clone().ok_or_else(|| {
            ConfigError::ConfigurationError("no exports registry configured".to_string())
        })?;
        ExportResolver::new(registry).resolve(template, namespace).await
    }

    fn lookup_cache(&self, keys: &[String], use_cache: bool) -> CacheLookup {
        if !use_cache {
            return CacheLookup::Bypassed;
        }
        match self.cache.lookup(keys) {
            Some(values) => CacheLookup::Hit(values),
            None => CacheLookup::Miss,
        }
    }

    fn store(&self) -> Result<Arc<dyn ParameterStore>> {
        self.store.clone().ok_or_else(|| {
            ConfigError::ConfigurationError("no parameter store configured".to_string())
        })
    }
}

/// Outcome of consulting the cache before a fetch.
#[derive(Debug, PartialEq, Eq)]
enum CacheLookup {
    Hit(FlatValues),
    Miss,
    Bypassed,
}
