//! Builder for constructing ConfigResolver instances.

use crate::core::{ConfigResolver, ParameterCache};
use crate::error::Result;
use crate::settings::ResolverSettings;
use crate::sources::{ExportsRegistry, LocalSource, ParameterStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[cfg(feature = "metrics")]
use crate::metrics::ResolverMetrics;

/// Builder for constructing a [`ConfigResolver`].
///
/// # Examples
///
/// ```rust,no_run
/// use paramstore_config::prelude::*;
/// use paramstore_config::sources::InMemoryParameterStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<()> {
/// let store = Arc::new(InMemoryParameterStore::new().with_parameter("/test/db/host", "db.local"));
///
/// let resolver = ConfigResolver::builder()
///     .with_environment("test")
///     .with_parameter_store(store)
///     .with_cache(Arc::new(ParameterCache::new()))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigResolverBuilder {
    settings: ResolverSettings,
    env_prefix: Option<String>,
    store: Option<Arc<dyn ParameterStore>>,
    exports: Option<Arc<dyn ExportsRegistry>>,
    cache: Option<Arc<ParameterCache>>,
    local_timeout: Duration,
    #[cfg(feature = "metrics")]
    metrics: Option<ResolverMetrics>,
}

impl ConfigResolverBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            settings: ResolverSettings::default(),
            env_prefix: None,
            store: None,
            exports: None,
            cache: None,
            local_timeout: Duration::from_secs(10),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Replace all settings at once.
    pub fn with_settings(mut self, settings: ResolverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the environment namespace (e.g. `production`, or `local`).
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.settings.environment = Some(environment.into());
        self
    }

    /// Set the port of the local development server.
    pub fn with_local_port(mut self, port: u16) -> Self {
        self.settings.local_port = port;
        self
    }

    /// Set the full URL of the local development server.
    pub fn with_local_url(mut self, url: impl Into<String>) -> Self {
        self.settings.local_url = Some(url.into());
        self
    }

    /// Set the timeout for requests to the local development server.
    ///
    /// Default is 10 seconds.
    pub fn with_local_timeout(mut self, timeout: Duration) -> Self {
        self.local_timeout = timeout;
        self
    }

    /// Overlay settings from environment variables with the given prefix at build time.
    ///
    /// Variables that are set take precedence over values given to the builder.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use paramstore_config::prelude::*;
    ///
    /// # async fn example() -> Result<()> {
    /// // PARAMSTORE_ENVIRONMENT=production
    /// let resolver = ConfigResolver::builder()
    ///     .with_env_overrides("PARAMSTORE")
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_env_overrides(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Use the given parameter store.
    pub fn with_parameter_store(mut self, store: Arc<dyn ParameterStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use the given exports registry.
    pub fn with_exports_registry(mut self, registry: Arc<dyn ExportsRegistry>) -> Self {
        self.exports = Some(registry);
        self
    }

    /// Use the given cache instead of the process-wide one.
    pub fn with_cache(mut self, cache: Arc<ParameterCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Record resolution metrics on `meter`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(ResolverMetrics::new(meter));
        self
    }

    /// Build the resolver.
    ///
    /// With the `aws` feature, a missing parameter store or exports registry
    /// defaults to the AWS implementation configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if environment overrides cannot be parsed or the local
    /// HTTP client cannot be constructed.
    pub async fn build(self) -> Result<ConfigResolver> {
        let mut settings = self.settings;
        if let Some(prefix) = &self.env_prefix {
            settings.apply_env(prefix)?;
        }

        let mut local = LocalSource::builder()
            .with_port(settings.local_port)
            .with_timeout(self.local_timeout);
        if let Some(url) = &settings.local_url {
            local = local.with_url(url.clone());
        }
        let local = local.build()?;

        #[cfg(feature = "aws")]
        let (store, exports) = {
            let mut store = self.store;
            let mut exports = self.exports;
            if store.is_none() || exports.is_none() {
                let sdk_config = crate::sources::aws::load_sdk_config().await;
                if store.is_none() {
                    let ssm: Arc<dyn ParameterStore> = Arc::new(
                        crate::sources::SsmParameterStore::new(aws_sdk_ssm::Client::new(&sdk_config)),
                    );
                    store = Some(ssm);
                }
                if exports.is_none() {
                    let cloudformation: Arc<dyn ExportsRegistry> =
                        Arc::new(crate::sources::CloudFormationExports::new(
                            aws_sdk_cloudformation::Client::new(&sdk_config),
                        ));
                    exports = Some(cloudformation);
                }
            }
            (store, exports)
        };
        #[cfg(not(feature = "aws"))]
        let (store, exports) = (self.store, self.exports);

        let cache = self.cache.unwrap_or_else(ParameterCache::global);

        debug!(
            environment = ?settings.environment,
            store = ?store.as_ref().map(|s| s.name()),
            "built config resolver"
        );

        Ok(ConfigResolver::from_parts(
            settings,
            store,
            exports,
            local,
            cache,
            #[cfg(feature = "metrics")]
            self.metrics,
        ))
    }
}

impl Default for ConfigResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{InMemoryExportsRegistry, InMemoryParameterStore};

    fn in_memory() -> ConfigResolverBuilder {
        ConfigResolverBuilder::new()
            .with_parameter_store(Arc::new(InMemoryParameterStore::new()))
            .with_exports_registry(Arc::new(InMemoryExportsRegistry::new()))
    }

    #[tokio::test]
    async fn test_builder_settings() {
        let resolver = in_memory()
            .with_environment("staging")
            .with_local_port(9999)
            .build()
            .await
            .unwrap();

        assert_eq!(resolver.settings().namespace().unwrap(), "staging");
        assert_eq!(resolver.settings().local_port, 9999);
    }

    #[tokio::test]
    async fn test_builder_defaults_to_global_cache() {
        let resolver = in_memory().build().await.unwrap();
        assert!(Arc::ptr_eq(resolver.cache(), &ParameterCache::global()));
    }

    #[tokio::test]
    async fn test_builder_injected_cache() {
        let cache = Arc::new(ParameterCache::new());
        let resolver = in_memory().with_cache(cache.clone()).build().await.unwrap();
        assert!(Arc::ptr_eq(resolver.cache(), &cache));
    }

    #[tokio::test]
    async fn test_with_settings() {
        let resolver = in_memory()
            .with_settings(ResolverSettings::for_environment("local"))
            .build()
            .await
            .unwrap();
        assert!(resolver.settings().is_local());
    }
}
