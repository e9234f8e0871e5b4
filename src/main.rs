//! boxkit demo service.
//!
//! Loads `BoxConfig` from the file named by `BOXKIT_CONFIG` (defaults when
//! unset), initializes every facade, mounts a small pet registry and serves
//! until SIGINT/SIGTERM.
//!
//! ```text
//! GET  /ping         plain, no instrumentation
//! GET  /pets/{id}    instrumented (normal)
//! POST /pets         instrumented (verbose)
//! ```

use axum::extract::Path;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use boxkit::cache::Cache;
use boxkit::config::{load_config, BoxConfig};
use boxkit::http::{InstrumentMode, RouteMethod, RoutePayload};
use boxkit::lifecycle::signals;
use boxkit::observability::{logging, metrics};
use boxkit::validate::{Field, Validate, Validator};
use boxkit::{Code, Envelope, Facades, Shutdown, TraceContext};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Pet {
    #[serde(default)]
    name: String,
    #[serde(default)]
    kind: String,
}

impl Validate for Pet {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("name", "pet name", &self.name, "required,max=32"),
            Field::new("kind", "pet kind", &self.kind, "required,oneof=cat dog bird"),
        ]
    }
}

async fn find_pet(cache: Arc<dyn Cache>, ctx: TraceContext, id: String) -> Envelope {
    match cache.get(&ctx, &format!("pet:{id}")).await {
        Ok(Some(raw)) => match serde_json::from_str::<Pet>(&raw) {
            Ok(pet) => Envelope::success(&ctx, "found", pet),
            Err(_) => Envelope::failure(&ctx, Code::CODEC_ERROR, "stored pet is unreadable"),
        },
        Ok(None) => Envelope::failure(&ctx, Code::CHECK, "resource not found"),
        Err(err) => Envelope::failure(&ctx, err.code, err.label),
    }
}

async fn create_pet(cache: Arc<dyn Cache>, validator: Validator, ctx: TraceContext, pet: Pet) -> Envelope {
    if let Err(err) = validator.validate(&pet) {
        return Envelope::failure(&ctx, Code::PARAM_INVALID, err.message());
    }
    let id = uuid::Uuid::new_v4().simple().to_string();
    let raw = match serde_json::to_string(&pet) {
        Ok(raw) => raw,
        Err(_) => return Envelope::failure(&ctx, Code::CODEC_ERROR, "pet could not be encoded"),
    };
    match cache.set_ex(&ctx, &format!("pet:{id}"), &raw, 3600).await {
        Ok(()) => Envelope::success(&ctx, "created", serde_json::json!({ "id": id })),
        Err(err) => Envelope::failure(&ctx, err.code, err.label),
    }
}

fn load() -> Result<BoxConfig, Box<dyn std::error::Error>> {
    match std::env::var_os("BOXKIT_CONFIG") {
        Some(path) => Ok(load_config(&PathBuf::from(path))?),
        None => Ok(BoxConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load()?;
    logging::init(&config.observability.log_level, config.observability.log_format);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "boxkit starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let ctx = TraceContext::detached("startup");
    let facades = Facades::new(Validator::new(config.validation.locale));
    facades.start(&ctx, &config)?;

    let server = facades.server.handle()?;
    let cache = facades.cache.handle()?;
    let validator = *facades.validation.handle()?;
    let mode = config.instrument.mode;

    server.add_route(RoutePayload::new(RouteMethod::Get, "/ping", "ping"), || async { "pong" })?;

    let lookup = cache.clone();
    server.add_route(
        RoutePayload::new(RouteMethod::Get, "/pets/{id}", "find pet").instrumented(mode),
        move |ctx: TraceContext, Path(id): Path<String>| find_pet(lookup.clone(), ctx, id),
    )?;
    server.add_route(
        RoutePayload::new(RouteMethod::Post, "/pets", "create pet").instrumented(InstrumentMode::Verbose),
        move |ctx: TraceContext, Json(pet): Json<Pet>| create_pet(cache.clone(), validator, ctx, pet),
    )?;

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    server.serve(shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
