//! Discriminator → constructor table.
//!
//! # Invariants
//!
//! - Each discriminator maps to exactly one constructor
//! - The first registered constructor is the default unless one is chosen
//! - Unknown discriminators use the default constructor

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::TraceContext;
use crate::outcome::{BoxError, BoxResult, Code};

/// Builds a backend handle from its option struct.
pub type Constructor<T, O> =
    Box<dyn Fn(&TraceContext, &O) -> BoxResult<Arc<T>> + Send + Sync>;

/// Constructors for one facade, keyed by discriminator.
///
/// # Example
///
/// ```ignore
/// let mut factory = BackendFactory::new("cache");
/// factory.register("memory", |_, opt| Ok(Arc::new(MemoryCache::new(opt)) as Arc<dyn Cache>));
/// let cache = factory.build(&ctx, "redis", &option)?; // falls back to "memory"
/// ```
pub struct BackendFactory<T: ?Sized, O> {
    subsystem: &'static str,
    constructors: HashMap<String, Constructor<T, O>>,
    default: Option<String>,
}

impl<T: ?Sized, O> BackendFactory<T, O> {
    pub fn new(subsystem: &'static str) -> Self {
        Self {
            subsystem,
            constructors: HashMap::new(),
            default: None,
        }
    }

    pub fn subsystem(&self) -> &'static str {
        self.subsystem
    }

    /// Register a constructor under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&TraceContext, &O) -> BoxResult<Arc<T>> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(subsystem = self.subsystem, backend = %name, "Registered backend constructor");
        if self.default.is_none() {
            self.default = Some(name.clone());
        }
        self.constructors.insert(name, Box::new(constructor));
        self
    }

    /// Choose the constructor used for unknown discriminators.
    pub fn set_default(&mut self, name: impl Into<String>) -> &mut Self {
        self.default = Some(name.into());
        self
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn has(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.constructors.len()
    }

    /// Resolve a discriminator to the name that will actually be built.
    pub fn resolve<'a>(&'a self, discriminator: &'a str) -> Option<&'a str> {
        if self.has(discriminator) {
            return Some(discriminator);
        }
        self.default
            .as_deref()
            .filter(|name| self.constructors.contains_key(*name))
    }

    /// Construct the backend for `discriminator`.
    pub fn build(&self, ctx: &TraceContext, discriminator: &str, options: &O) -> BoxResult<Arc<T>> {
        let name = self.resolve(discriminator).ok_or_else(|| {
            BoxError::new(
                Code::INTERRUPT,
                format!("no {} backend registered", self.subsystem),
            )
        })?;
        if name != discriminator {
            warn!(
                trace = %ctx,
                subsystem = self.subsystem,
                requested = %discriminator,
                fallback = %name,
                "Unknown backend, using default"
            );
        }
        let constructor = self.constructors.get(name).ok_or_else(|| {
            BoxError::new(Code::INTERRUPT, format!("no {} backend registered", self.subsystem))
        })?;
        constructor(ctx, options)
    }
}
