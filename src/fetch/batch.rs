//! Chunked, concurrent retrieval of named parameters.

use crate::core::FlatValues;
use crate::error::{ConfigError, Result};
use crate::sources::ParameterStore;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Largest number of names the parameter store accepts in one batch call.
pub const MAX_BATCH_SIZE: usize = 10;

/// Split `keys` into contiguous chunks of at most [`MAX_BATCH_SIZE`].
pub fn chunk_keys(keys: &[String]) -> Vec<Vec<String>> {
    keys.chunks(MAX_BATCH_SIZE).map(<[String]>::to_vec).collect()
}

/// Fetches named parameters under an environment namespace.
///
/// Keys are qualified as `/{namespace}/{key}` on the way out and stripped
/// back to `key` on the way in. Each chunk is one remote call; all chunk
/// calls run concurrently and the batch succeeds only if every chunk does.
///
/// # Examples
///
/// ```rust
/// use paramstore_config::fetch::BatchFetcher;
/// use paramstore_config::sources::InMemoryParameterStore;
/// use std::sync::Arc;
///
/// # async fn example() -> paramstore_config::error::Result<()> {
/// let store = Arc::new(InMemoryParameterStore::new().with_parameter("/test/db/host", "db.local"));
/// let fetcher = BatchFetcher::new(store, "test");
///
/// let values = fetcher.fetch(&["db/host".to_string()]).await?;
/// assert_eq!(values["db/host"], "db.local");
/// # Ok(())
/// # }
/// ```
pub struct BatchFetcher {
    store: Arc<dyn ParameterStore>,
    prefix: String,
}

impl BatchFetcher {
    /// Create a fetcher for the given store and environment namespace.
    pub fn new(store: Arc<dyn ParameterStore>, namespace: impl AsRef<str>) -> Self {
        Self {
            store,
            prefix: format!("/{}/", namespace.as_ref()),
        }
    }

    fn qualify(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn strip(&self, name: &str) -> String {
        name.strip_prefix(&self.prefix).unwrap_or(name).to_string()
    }

    /// Fetch every key, one concurrent remote call per chunk.
    ///
    /// A remote error from any chunk fails the whole batch immediately and
    /// the remaining chunk calls are cancelled. Invalid-parameter reports are
    /// gathered from every chunk and surfaced as one `InvalidParameters` error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an empty key list, `RemoteFailure` for
    /// store errors and `InvalidParameters` if any name is unknown.
    pub async fn fetch(&self, keys: &[String]) -> Result<FlatValues> {
        if keys.is_empty() {
            return Err(ConfigError::InvalidRequest(
                "params must not be empty".to_string(),
            ));
        }

        let chunks = chunk_keys(keys);
        debug!(
            store = %self.store.name(),
            keys = keys.len(),
            chunks = chunks.len(),
            "fetching parameters"
        );

        let mut tasks = JoinSet::new();
        for chunk in chunks {
            let store = Arc::clone(&self.store);
            let names: Vec<String> = chunk.iter().map(|key| self.qualify(key)).collect();
            tasks.spawn(async move { store.get_parameters(&names, true).await });
        }

        let mut values = FlatValues::with_capacity(keys.len());
        let mut invalid = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let page = joined
                .map_err(|e| ConfigError::Other(format!("Parameter fetch task failed: {}", e)))?
                .inspect_err(|e| error!(error = %e, "parameter store request failed"))?;

            invalid.extend(page.invalid_parameters.iter().map(|name| self.strip(name)));
            for parameter in page.parameters {
                values.insert(self.strip(&parameter.name), parameter.value);
            }
        }

        if !invalid.is_empty() {
            invalid.sort();
            error!(invalid = ?invalid, "invalid requested params");
            return Err(ConfigError::InvalidParameters(invalid));
        }

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{InMemoryParameterStore, StoreCall};
    use proptest::prelude::*;
    use std::time::Duration;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("key{i:02}")).collect()
    }

    fn store_with(keys: &[String]) -> Arc<InMemoryParameterStore> {
        let store = InMemoryParameterStore::new();
        for key in keys {
            store.insert(format!("/test/{key}"), format!("value-{key}"));
        }
        Arc::new(store)
    }

    fn call_sizes(store: &InMemoryParameterStore) -> Vec<usize> {
        let mut sizes: Vec<usize> = store
            .calls()
            .into_iter()
            .map(|call| match call {
                StoreCall::GetParameters(names) => names.len(),
                StoreCall::GetParametersByPath(_) => 0,
            })
            .collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }

    #[test]
    fn test_chunk_keys() {
        let chunks = chunk_keys(&keys(25));
        assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), vec![10, 10, 5]);
        assert_eq!(chunks[2][0], "key20");
    }

    #[tokio::test]
    async fn test_single_chunk() {
        let requested = vec!["mysql.host".to_string()];
        let store = store_with(&requested);
        let fetcher = BatchFetcher::new(store.clone(), "test");

        let values = fetcher.fetch(&requested).await.unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values["mysql.host"], "value-mysql.host");
        assert_eq!(
            store.calls(),
            vec![StoreCall::GetParameters(vec!["/test/mysql.host".to_string()])]
        );
    }

    #[tokio::test]
    async fn test_eleven_keys_two_calls() {
        let requested = keys(11);
        let store = store_with(&requested);
        let fetcher = BatchFetcher::new(store.clone(), "test");

        let values = fetcher.fetch(&requested).await.unwrap();
        assert_eq!(values.len(), 11);
        assert_eq!(call_sizes(&store), vec![10, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunks_run_concurrently() {
        let requested = keys(30);
        let store = InMemoryParameterStore::new().with_latency(Duration::from_millis(100));
        for key in &requested {
            store.insert(format!("/test/{key}"), "v");
        }
        let store = Arc::new(store);
        let fetcher = BatchFetcher::new(store.clone(), "test");

        let started = tokio::time::Instant::now();
        fetcher.fetch(&requested).await.unwrap();

        assert_eq!(store.max_in_flight(), 3);
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_invalid_parameters_across_chunks() {
        let requested = keys(12);
        let store = store_with(&requested[1..11]);
        let fetcher = BatchFetcher::new(store, "test");

        let err = fetcher.fetch(&requested).await.unwrap_err();
        match err {
            ConfigError::InvalidParameters(names) => {
                assert_eq!(names, vec!["key00", "key11"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_remote_failure() {
        let store = Arc::new(InMemoryParameterStore::new());
        store.fail_with("some remote error");
        let fetcher = BatchFetcher::new(store, "test");

        let err = fetcher.fetch(&keys(15)).await.unwrap_err();
        assert!(matches!(err, ConfigError::RemoteFailure(ref m) if m == "some remote error"));
    }

    #[tokio::test]
    async fn test_one_failing_chunk_fails_batch() {
        let requested = keys(15);
        let store = store_with(&requested);
        store.fail_on("/test/key12", "chunk failed");
        let fetcher = BatchFetcher::new(store, "test");

        let err = fetcher.fetch(&requested).await.unwrap_err();
        assert!(matches!(err, ConfigError::RemoteFailure(ref m) if m == "chunk failed"));
    }

    #[tokio::test]
    async fn test_empty_keys_rejected() {
        let fetcher = BatchFetcher::new(Arc::new(InMemoryParameterStore::new()), "test");
        assert!(matches!(
            fetcher.fetch(&[]).await,
            Err(ConfigError::InvalidRequest(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_chunks_cover_keys_in_order(n in 1usize..60) {
            let requested = keys(n);
            let chunks = chunk_keys(&requested);

            prop_assert_eq!(chunks.len(), n.div_ceil(MAX_BATCH_SIZE));
            prop_assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= MAX_BATCH_SIZE));
            prop_assert_eq!(chunks.concat(), requested);
        }
    }
}
