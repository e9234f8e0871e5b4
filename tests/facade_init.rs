//! Facade initialization and a full server round trip.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use boxkit::cache::{self, Cache, CacheOption};
use boxkit::config::parse_config;
use boxkit::factory::{BackendFactory, BackendSlot};
use boxkit::http::{Envelope, HttpServer, InstrumentMode, RouteMethod, RoutePayload, ServerOption};
use boxkit::outcome::{BoxError, Code};
use boxkit::validate::Validator;
use boxkit::{Facades, Shutdown, TraceContext};

mod common;
use common::TRACE;

#[test]
fn test_concurrent_initialization_shares_one_handle() {
    let built = Arc::new(AtomicUsize::new(0));
    let mut factory = cache::factory();
    let counter = built.clone();
    factory.register("counting", move |_, option: &CacheOption| {
        counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        Ok(Arc::new(cache::MemoryCache::new(option)) as Arc<dyn Cache>)
    });
    let slot = Arc::new(BackendSlot::new(factory));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let slot = slot.clone();
            std::thread::spawn(move || {
                let ctx = TraceContext::new(format!("init-thread-{i:08}"), "init");
                slot.initialize(&ctx, "counting", CacheOption::default()).unwrap()
            })
        })
        .collect();
    let caches: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert!(caches.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

#[tokio::test]
async fn test_reinitialization_is_a_no_op() {
    let slot = BackendSlot::new(cache::factory());
    let ctx = TraceContext::new(TRACE, "init");

    let first = slot.initialize(&ctx, "memory", CacheOption::default()).unwrap();
    first.set(&ctx, "k", "v").await.unwrap();

    let second = slot
        .initialize(
            &ctx,
            "memory",
            CacheOption {
                namespace: "other".into(),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.get(&ctx, "k").await.unwrap().as_deref(), Some("v"));
}

#[test]
fn test_failed_construction_is_sticky() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let mut factory: BackendFactory<dyn Cache, CacheOption> = BackendFactory::new("cache");
    factory.register("broken", move |_, _: &CacheOption| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(BoxError::new(Code::CALL_ERROR, "store unreachable"))
    });
    let slot = BackendSlot::new(factory);
    let ctx = TraceContext::new(TRACE, "init");

    for _ in 0..3 {
        let err = slot.initialize(&ctx, "broken", CacheOption::default()).err().unwrap();
        assert_eq!(err.code, Code::INTERRUPT);
        assert!(err.label.contains("initialization failed"));
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(slot.handle().is_err());
}

#[tokio::test]
async fn test_served_over_socket_with_graceful_shutdown() {
    let config = parse_config(
        r#"
[logger]
application = "pets"
env = "test"
label = "api"

[server]
port = 5050

[observability]
metrics_enabled = false
"#,
    )
    .unwrap();

    let facades = Facades::new(Validator::default());
    let ctx = TraceContext::detached("startup");
    facades.start(&ctx, &config).unwrap();

    let server: Arc<HttpServer> = facades.server.handle().unwrap();
    assert_eq!(server.option().port, 5050);
    let cache = facades.cache.handle().unwrap();
    server
        .add_route(
            RoutePayload::new(RouteMethod::Get, "/count", "count").instrumented(InstrumentMode::Normal),
            move |ctx: TraceContext| {
                let cache = cache.clone();
                async move {
                    let hits = cache.get(&ctx, "hits").await.ok().flatten();
                    let next = hits.and_then(|h| h.parse::<u64>().ok()).unwrap_or(0) + 1;
                    let _ = cache.set(&ctx, "hits", &next.to_string()).await;
                    Envelope::success(&ctx, "counted", next)
                }
            },
        )
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let running = {
        let server = server.clone();
        let rx = shutdown.subscribe();
        tokio::spawn(async move { server.run(listener, rx).await })
    };

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    for expected in 1..=2u64 {
        let response = client
            .get(format!("http://{addr}/count"))
            .header("X-REQUEST-ID", TRACE)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let envelope: Envelope = response.json().await.unwrap();
        assert_eq!(envelope.code, Code::SUCCESS);
        assert_eq!(envelope.trace, TRACE);
        assert_eq!(envelope.result, serde_json::json!(expected));
    }

    let rejected: Envelope = client
        .get(format!("http://{addr}/count"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rejected.code, Code::PARAM_INVALID);

    drop(client);
    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), running).await;
    assert!(result.unwrap().unwrap().is_ok());
}

#[test]
fn test_server_option_rejected_before_construction() {
    let slot = BackendSlot::new(HttpServer::factory());
    let ctx = TraceContext::new(TRACE, "init");
    let err = slot
        .initialize(
            &ctx,
            "axum",
            ServerOption {
                port: 10001,
                ..Default::default()
            },
        )
        .err()
        .unwrap();
    assert_eq!(err.code, Code::PARAM_INVALID);
    assert_eq!(err.label, "port length must be ≤ 10000");
    assert!(!slot.is_initialized());
}
