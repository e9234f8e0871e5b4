//! Startup orchestration.
//!
//! # Responsibilities
//! - Own one backend slot per facade
//! - Initialize them in dependency order from a validated `BoxConfig`
//! - Hand the server its instrumentation
//!
//! # Design Decisions
//! - Fail fast: the first facade error stops startup
//! - Validation first, logger second; everything after may log
//! - Slots are owned here and passed by reference, never global

use serde_json::Value;
use std::sync::Arc;

use crate::cache::{self, Cache, CacheOption};
use crate::config::{BoxConfig, ConfigBinding, ConfigOption};
use crate::context::TraceContext;
use crate::factory::BackendSlot;
use crate::http::{HttpServer, Instrumentation, ServerOption};
use crate::logger::{Logger, LoggerOption};
use crate::outcome::{BoxResult, CodeRegistry};
use crate::request::{self, HttpClient, RequestOption};
use crate::validate::{Validator, ValidatorOption};

/// Every facade slot of an application.
pub struct Facades {
    pub validation: BackendSlot<Validator, ValidatorOption>,
    pub logger: BackendSlot<Logger, LoggerOption>,
    pub cache: BackendSlot<dyn Cache, CacheOption>,
    pub request: BackendSlot<dyn HttpClient, RequestOption>,
    pub server: BackendSlot<HttpServer, ServerOption>,
    pub binding: BackendSlot<ConfigBinding<Value>, ConfigOption>,
    pub registry: Arc<CodeRegistry>,
}

impl Facades {
    /// Empty slots whose option checks render messages with `validator`.
    pub fn new(validator: Validator) -> Self {
        Self {
            validation: BackendSlot::with_validator(Validator::factory(), validator),
            logger: BackendSlot::with_validator(Logger::factory(), validator),
            cache: BackendSlot::with_validator(cache::factory(), validator),
            request: BackendSlot::with_validator(request::factory(), validator),
            server: BackendSlot::with_validator(HttpServer::factory(), validator),
            binding: BackendSlot::with_validator(ConfigBinding::factory(), validator),
            registry: Arc::new(CodeRegistry::default()),
        }
    }

    /// Initialize every facade from `config`.
    pub fn start(&self, ctx: &TraceContext, config: &BoxConfig) -> BoxResult<()> {
        let backends = &config.backends;

        let validator = self
            .validation
            .initialize(ctx, &backends.validation, config.validation)?;
        let logger = self.logger.initialize(ctx, &backends.logger, config.logger.clone())?;
        self.cache.initialize(ctx, &backends.cache, config.cache.clone())?;
        self.request.initialize(ctx, &backends.request, config.request.clone())?;
        if let Some(binding) = &config.binding {
            self.binding.initialize(ctx, &backends.binding, binding.clone())?;
        }

        let server = self.server.initialize(ctx, &backends.server, config.server.clone())?;
        let instrumentation = Instrumentation::new(logger, self.registry.clone(), *validator)
            .with_trace_label(config.instrument.trace_label.clone())
            .with_capture_limit(config.instrument.capture_limit_bytes);
        if !server.attach(instrumentation) {
            tracing::debug!(trace = %ctx, "Server already instrumented");
        }

        tracing::info!(
            trace = %ctx,
            application = %config.logger.application,
            env = %config.logger.env,
            "Facades initialized"
        );
        Ok(())
    }
}
