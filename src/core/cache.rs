//! Process-wide cache of resolved parameter values.

use crate::core::request::FlatValues;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

static GLOBAL: OnceLock<Arc<ParameterCache>> = OnceLock::new();

/// Additive cache from parameter key to its last resolved value.
///
/// Entries are never evicted and never expire. Reads take a lock-free
/// snapshot; merges swap in a new map, so concurrent merges of the same keys
/// simply overwrite each other with equivalent values.
///
/// # Examples
///
/// ```rust
/// use paramstore_config::core::ParameterCache;
/// use std::collections::HashMap;
///
/// let cache = ParameterCache::new();
/// cache.merge(&HashMap::from([("db/host".to_string(), "db.local".to_string())]));
///
/// assert!(cache.lookup(&["db/host".to_string()]).is_some());
/// assert!(cache.lookup(&["db/host".to_string(), "db/port".to_string()]).is_none());
/// ```
pub struct ParameterCache {
    entries: ArcSwap<HashMap<String, String>>,
}

impl ParameterCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// The shared, process-wide cache instance.
    pub fn global() -> Arc<ParameterCache> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ParameterCache::new())))
    }

    /// Return the cached values for `keys`, only if every key is present.
    ///
    /// A single missing key is a miss for the whole set.
    pub fn lookup(&self, keys: &[String]) -> Option<FlatValues> {
        let entries = self.entries.load();
        keys.iter()
            .map(|key| entries.get(key).map(|value| (key.clone(), value.clone())))
            .collect()
    }

    /// Overwrite the entries for the given keys. Nothing is removed.
    pub fn merge(&self, values: &FlatValues) {
        if values.is_empty() {
            return;
        }
        self.entries.rcu(|current| {
            let mut next: HashMap<String, String> = (**current).clone();
            next.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
            next
        });
    }

    /// Get a single cached value.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.load().get(key).cloned()
    }

    /// Whether `key` is cached.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.load().contains_key(key)
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    /// Drop every entry. Intended for test harnesses.
    pub fn reset(&self) {
        self.entries.store(Arc::new(HashMap::new()));
    }
}

impl Default for ParameterCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParameterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterCache")
            .field("len", &self.len())
            .finish()
    }
}
