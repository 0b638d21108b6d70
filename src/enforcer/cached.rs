//! Cached enforcer (§4.8): wraps a [`SyncedEnforcer`] with a bounded LRU map
//! from request-key to decision. Any mutation clears the cache entirely —
//! simpler than selective invalidation, and the only thing §4.8 actually
//! requires ("the cache never returns a stale decision"). Grounded in the
//! donor's `AuthzCache` (`src/cache.rs`): `lru::LruCache` behind a
//! `tokio::sync::Mutex`, keyed by a `blake3` hash of the joined request
//! tuple, in preference to the donor's other, approximate `retain()`-based
//! cache.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;

use crate::error::EnforceError;
use crate::model::Model;
use crate::policy::Rule;
use crate::value::Value;

use super::{EnforcerOptions, SyncedEnforcer};

type CacheKey = [u8; 32];

#[derive(Clone)]
pub struct CachedEnforcer {
    inner: SyncedEnforcer,
    cache: Arc<Mutex<LruCache<CacheKey, bool>>>,
}

impl CachedEnforcer {
    pub fn new(model: Model) -> Self {
        let options = EnforcerOptions::default();
        let capacity = options.cache_capacity;
        Self::with_capacity(SyncedEnforcer::with_options(model, options), capacity)
    }

    pub fn wrap(inner: SyncedEnforcer, capacity: usize) -> Self {
        Self::with_capacity(inner, capacity)
    }

    fn with_capacity(inner: SyncedEnforcer, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(10_000).unwrap());
        Self {
            inner,
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    fn cache_key(request: &[Value]) -> CacheKey {
        let mut hasher = blake3::Hasher::new();
        for value in request {
            hasher.update(value.as_display_string().as_bytes());
            hasher.update(&[0u8]); // separator, so ("ab","c") != ("a","bc")
        }
        *hasher.finalize().as_bytes()
    }

    pub async fn enforce(&self, request: &[Value]) -> Result<bool, EnforceError> {
        let key = Self::cache_key(request);
        if let Some(hit) = self.cache.lock().await.get(&key).copied() {
            return Ok(hit);
        }
        let decision = self.inner.enforce(request).await?;
        self.cache.lock().await.put(key, decision);
        Ok(decision)
    }

    pub async fn enforce_ex(&self, request: &[Value]) -> Result<(bool, Vec<Rule>), EnforceError> {
        // Explain-mode results aren't cached — only the plain boolean
        // decision is, since that is the only thing the cache's staleness
        // invariant is about.
        self.inner.enforce_ex(request).await
    }

    pub async fn batch_enforce(&self, requests: &[Vec<Value>]) -> Result<Vec<bool>, EnforceError> {
        let mut out = Vec::with_capacity(requests.len());
        for r in requests {
            out.push(self.enforce(r).await?);
        }
        Ok(out)
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn invalidate(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn set_enabled(&self, enabled: bool) {
        self.inner.set_enabled(enabled).await;
        self.invalidate().await;
    }

    pub async fn add_policy(&self, rule: Rule) -> bool {
        let added = self.inner.add_policy(rule).await;
        self.invalidate().await;
        added
    }

    pub async fn remove_policy(&self, rule: &[String]) -> bool {
        let removed = self.inner.remove_policy(rule).await;
        self.invalidate().await;
        removed
    }

    pub async fn remove_filtered_policy(&self, field_index: usize, field_values: &[String]) -> Vec<Rule> {
        let removed = self.inner.remove_filtered_policy(field_index, field_values).await;
        self.invalidate().await;
        removed
    }

    pub async fn add_grouping_policy(&self, rule: Rule) -> bool {
        let added = self.inner.add_grouping_policy(rule).await;
        self.invalidate().await;
        added
    }

    pub async fn remove_grouping_policy(&self, rule: &[String]) -> bool {
        let removed = self.inner.remove_grouping_policy(rule).await;
        self.invalidate().await;
        removed
    }

    pub async fn build_role_links(&self) {
        self.inner.build_role_links().await;
        self.invalidate().await;
    }
}
