//! Cache facade.
//!
//! # Data Flow
//! ```text
//! CacheOption (validated)
//!     → BackendFactory ("memory" default; network stores register here too)
//!     → Arc<dyn Cache> on the application's slot
//!     → get / set / set_ex / overdue / delete with a TraceContext
//! ```
//!
//! # Design Decisions
//! - Values are strings; callers own their encoding
//! - A missing key is `Ok(None)`, not an error
//! - Expiry is checked lazily on access

pub mod memory;

pub use memory::MemoryCache;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::TraceContext;
use crate::factory::BackendFactory;
use crate::outcome::BoxResult;
use crate::validate::{Field, Validate};

/// Key-value store with optional expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, ctx: &TraceContext, key: &str) -> BoxResult<Option<String>>;

    async fn set(&self, ctx: &TraceContext, key: &str, value: &str) -> BoxResult<()>;

    /// Store a value that expires after `ttl_secs` seconds.
    async fn set_ex(&self, ctx: &TraceContext, key: &str, value: &str, ttl_secs: u64) -> BoxResult<()>;

    /// True when the key is missing or expired.
    async fn overdue(&self, ctx: &TraceContext, key: &str) -> bool;

    /// Remove a key. Returns whether it existed.
    async fn delete(&self, ctx: &TraceContext, key: &str) -> BoxResult<bool>;
}

/// Options of the cache facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOption {
    /// Store address for network backends (`host:port`).
    pub host: String,
    pub username: String,
    pub password: String,
    /// Logical database index.
    pub database: u8,
    /// Prefix applied to every key.
    pub namespace: String,
    /// Upper bound on stored entries.
    pub max_entries: usize,
}

impl Default for CacheOption {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            database: 0,
            namespace: String::new(),
            max_entries: 100_000,
        }
    }
}

impl Validate for CacheOption {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("host", "cache host", &self.host, "omitempty,contains=:"),
            Field::new("database", "database index", self.database, "lte=15"),
            Field::new("namespace", "key namespace", &self.namespace, "omitempty,max=64"),
            Field::new("max_entries", "entry limit", self.max_entries, "gte=1"),
        ]
    }
}

/// Constructor table for the cache facade.
pub fn factory() -> BackendFactory<dyn Cache, CacheOption> {
    let mut factory = BackendFactory::<dyn Cache, CacheOption>::new("cache");
    factory.register(MemoryCache::DISCRIMINATOR, |_, option: &CacheOption| {
        Ok(Arc::new(MemoryCache::new(option)) as Arc<dyn Cache>)
    });
    factory
}
