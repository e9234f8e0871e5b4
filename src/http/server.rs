//! HTTP server facade.
//!
//! # Responsibilities
//! - Collect routes (optionally instrumented) into an axum Router
//! - Wire up server-wide middleware (CORS, panic recovery, timeout, tracing)
//! - Bind and serve with graceful shutdown

use axum::handler::Handler;
use axum::routing::{on, MethodFilter};
use axum::Router;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::factory::BackendFactory;
use crate::http::instrument::{instrument, InstrumentMode, Instrumentation};
use crate::outcome::{BoxError, BoxResult, Code};
use crate::validate::{Field, Validate, Validator};

/// Options of the server facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerOption {
    /// Listen host; empty listens on all interfaces.
    pub host: String,
    pub port: u16,
    pub disable_cors: bool,
    pub disable_recover: bool,
    /// Upper bound on a single request.
    pub request_timeout_secs: u64,
}

impl Default for ServerOption {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 8080,
            disable_cors: false,
            disable_recover: false,
            request_timeout_secs: 30,
        }
    }
}

impl Validate for ServerOption {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("port", "port", self.port, "required,min=3000,max=10000"),
            Field::new("request_timeout_secs", "request timeout", self.request_timeout_secs, "gte=1"),
        ]
    }
}

impl ServerOption {
    pub fn bind_address(&self) -> String {
        let host = if self.host.is_empty() { "0.0.0.0" } else { self.host.as_str() };
        format!("{}:{}", host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl RouteMethod {
    /// Unknown methods mount as GET.
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            _ => Self::Get,
        }
    }

    fn filter(self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
            Self::Put => MethodFilter::PUT,
            Self::Delete => MethodFilter::DELETE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// One route to mount.
#[derive(Debug, Clone)]
pub struct RoutePayload {
    pub method: RouteMethod,
    pub path: String,
    pub label: String,
    /// `None` mounts the handler without instrumentation.
    pub mode: Option<InstrumentMode>,
}

impl RoutePayload {
    pub fn new(method: RouteMethod, path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            label: label.into(),
            mode: None,
        }
    }

    pub fn instrumented(mut self, mode: InstrumentMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

impl Validate for RoutePayload {
    fn fields(&self) -> Vec<Field> {
        vec![Field::new("path", "route path", &self.path, "required,startswith=/")]
    }
}

/// axum-backed server.
pub struct HttpServer {
    option: ServerOption,
    routes: Mutex<Router>,
    instrumentation: OnceCell<Instrumentation>,
}

impl HttpServer {
    pub const DISCRIMINATOR: &'static str = "axum";

    pub fn new(option: ServerOption) -> Self {
        Self {
            option,
            routes: Mutex::new(Router::new()),
            instrumentation: OnceCell::new(),
        }
    }

    /// Constructor table for the server facade.
    pub fn factory() -> BackendFactory<HttpServer, ServerOption> {
        let mut factory = BackendFactory::new("server");
        factory.register(Self::DISCRIMINATOR, |_, option: &ServerOption| {
            Ok(Arc::new(HttpServer::new(option.clone())))
        });
        factory
    }

    pub fn option(&self) -> &ServerOption {
        &self.option
    }

    /// Attach the instrumentation used by instrumented routes.
    ///
    /// Returns false if one is already attached; the first one stays.
    pub fn attach(&self, instrumentation: Instrumentation) -> bool {
        self.instrumentation.set(instrumentation).is_ok()
    }

    /// Mount a handler.
    pub fn add_route<H, T>(&self, route: RoutePayload, handler: H) -> BoxResult<()>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Validator::default().validate(&route).map_err(BoxError::from)?;

        let mut method_router = on(route.method.filter(), handler);
        if let Some(mode) = route.mode {
            let instrumentation = self.instrumentation.get().ok_or_else(|| {
                BoxError::new(Code::RUNTIME_PARAM_ERROR, "instrumentation is not attached")
            })?;
            method_router = method_router
                .route_layer(axum::middleware::from_fn_with_state(instrumentation.mode(mode), instrument));
        }

        let mut routes = self.routes.lock().expect("route table lock poisoned");
        *routes = std::mem::take(&mut *routes).route(&route.path, method_router);

        tracing::info!(
            method = route.method.as_str(),
            path = %route.path,
            label = %route.label,
            instrumented = route.mode.is_some(),
            "Route added"
        );
        Ok(())
    }

    /// The mounted routes with the server-wide middleware applied.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let mut router = self.routes.lock().expect("route table lock poisoned").clone();

        router = router.layer(TimeoutLayer::new(Duration::from_secs(self.option.request_timeout_secs)));
        if !self.option.disable_recover {
            router = router.layer(CatchPanicLayer::new());
        }
        if !self.option.disable_cors {
            router = router.layer(CorsLayer::permissive());
        }
        router.layer(TraceLayer::new_for_http())
    }

    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind(self.option.bind_address()).await
    }

    /// Serve until the shutdown channel fires, then drain in-flight requests.
    pub async fn run(&self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Bind the configured address and serve.
    pub async fn serve(&self, shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let listener = self.bind().await?;
        self.run(listener, shutdown).await
    }
}
