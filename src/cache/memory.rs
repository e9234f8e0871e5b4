//! In-process cache backend.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{Cache, CacheOption};
use crate::context::TraceContext;
use crate::observability::metrics;
use crate::outcome::{BoxError, BoxResult, Code};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// A concurrent in-memory cache with lazy expiry and an entry cap.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Arc<DashMap<String, Entry>>,
    namespace: String,
    max_entries: usize,
}

impl MemoryCache {
    pub const DISCRIMINATOR: &'static str = "memory";

    pub fn new(option: &CacheOption) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            namespace: option.namespace.clone(),
            max_entries: option.max_entries.max(1),
        }
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn count(&self) -> usize {
        self.inner.len()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.len();
        self.inner.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.inner.len());
        metrics::record_cache_size(self.inner.len());
        removed
    }

    fn key(&self, key: &str) -> String {
        if self.namespace.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.namespace, key)
        }
    }

    fn store(&self, ctx: &TraceContext, key: &str, entry: Entry) -> BoxResult<()> {
        let key = self.key(key);
        if !self.inner.contains_key(&key) && self.inner.len() >= self.max_entries {
            let removed = self.purge_expired();
            tracing::debug!(trace = %ctx, removed, "Cache full, purged expired entries");
            if self.inner.len() >= self.max_entries {
                tracing::warn!(trace = %ctx, max_entries = self.max_entries, "Cache entry limit reached");
                return Err(BoxError::new(Code::LIMIT_ERROR, "cache entry limit reached"));
            }
        }
        self.inner.insert(key, entry);
        metrics::record_cache_size(self.inner.len());
        Ok(())
    }

    fn live(&self, key: &str) -> Option<String> {
        let key = self.key(key);
        let now = Instant::now();
        let expired = match self.inner.get(&key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.inner.remove_if(&key, |_, entry| entry.is_expired(now));
        }
        None
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, _ctx: &TraceContext, key: &str) -> BoxResult<Option<String>> {
        Ok(self.live(key))
    }

    async fn set(&self, ctx: &TraceContext, key: &str, value: &str) -> BoxResult<()> {
        self.store(
            ctx,
            key,
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        )
    }

    async fn set_ex(&self, ctx: &TraceContext, key: &str, value: &str, ttl_secs: u64) -> BoxResult<()> {
        if ttl_secs == 0 {
            return Err(BoxError::param_invalid("expire time must be > 0"));
        }
        self.store(
            ctx,
            key,
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)),
            },
        )
    }

    async fn overdue(&self, _ctx: &TraceContext, key: &str) -> bool {
        self.live(key).is_none()
    }

    async fn delete(&self, _ctx: &TraceContext, key: &str) -> BoxResult<bool> {
        let removed = self.inner.remove(&self.key(key)).is_some();
        metrics::record_cache_size(self.inner.len());
        Ok(removed)
    }
}
