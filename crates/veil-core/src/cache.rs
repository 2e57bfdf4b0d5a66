//! Discovery cache
//!
//! The [`DiscoveryCache`] stores field sets by class identity and options so
//! constructing many views over instances of one class discovers only once.
//!
//! Entries are never evicted: class shapes are assumed static for the life
//! of the process.

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tracing::trace;

use crate::discovery::FieldSet;
use crate::options::ViewOptions;

static GLOBAL_CACHE: LazyLock<DiscoveryCache> = LazyLock::new(DiscoveryCache::new);

/// Cache key: class identity plus canonical options
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    type_identity: String,
    options: String,
}

impl CacheKey {
    fn new(type_identity: &str, options: &ViewOptions) -> Self {
        Self {
            type_identity: type_identity.to_string(),
            options: options.canonical(),
        }
    }
}

/// Concurrent map of discovered field sets
#[derive(Debug, Default)]
pub struct DiscoveryCache {
    entries: DashMap<CacheKey, Arc<FieldSet>>,
}

impl DiscoveryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache, created on first use
    pub fn global() -> &'static DiscoveryCache {
        &GLOBAL_CACHE
    }

    /// Return the cached field set for `type_identity` and `options`, running
    /// `compute` on a miss
    ///
    /// Nothing is stored when `options.disable_cache` is set or the type has
    /// no identity. Two threads missing the same key may both compute; the
    /// first insert wins and both receive the stored set.
    pub fn get_or_compute<F>(
        &self,
        type_identity: Option<&str>,
        options: &ViewOptions,
        compute: F,
    ) -> Arc<FieldSet>
    where
        F: FnOnce() -> FieldSet,
    {
        let identity = match type_identity {
            Some(identity) if !options.disable_cache => identity,
            _ => return Arc::new(compute()),
        };

        let key = CacheKey::new(identity, options);
        if let Some(hit) = self.entries.get(&key) {
            return Arc::clone(hit.value());
        }

        trace!(type_identity = identity, "Discovery cache miss");
        let computed = Arc::new(compute());
        let stored = self.entries.entry(key).or_insert(computed);
        Arc::clone(stored.value())
    }

    /// Whether a field set is stored for `type_identity` and `options`
    pub fn contains(&self, type_identity: &str, options: &ViewOptions) -> bool {
        self.entries
            .contains_key(&CacheKey::new(type_identity, options))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fields(names: &[&str]) -> FieldSet {
        names.iter().copied().collect()
    }

    #[test]
    fn test_computes_once_per_key() {
        let cache = DiscoveryCache::new();
        let calls = AtomicUsize::new(0);
        let options = ViewOptions::default();

        for _ in 0..3 {
            let set = cache.get_or_compute(Some("Point#1"), &options, || {
                calls.fetch_add(1, Ordering::SeqCst);
                fields(&["x", "y"])
            });
            assert_eq!(set.len(), 2);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("Point#1", &options));
    }

    #[test]
    fn test_options_keyed_independently() {
        let cache = DiscoveryCache::new();
        let open = ViewOptions::default().with_allow_protected_field(true);

        cache.get_or_compute(Some("T#1"), &ViewOptions::default(), || fields(&["a"]));
        let set = cache.get_or_compute(Some("T#1"), &open, || fields(&["a", "_b"]));

        assert_eq!(set.len(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_disable_cache_bypasses() {
        let cache = DiscoveryCache::new();
        let calls = AtomicUsize::new(0);
        let options = ViewOptions::default().with_disable_cache(true);

        for _ in 0..2 {
            cache.get_or_compute(Some("T#2"), &options, || {
                calls.fetch_add(1, Ordering::SeqCst);
                FieldSet::new()
            });
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_missing_identity_bypasses() {
        let cache = DiscoveryCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            cache.get_or_compute(None, &ViewOptions::default(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                FieldSet::new()
            });
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(DiscoveryCache::global(), DiscoveryCache::global()));
    }
}
