//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use boxkit::http::Instrumentation;
use boxkit::logger::{Logger, LoggerOption, MemorySink};
use boxkit::outcome::CodeRegistry;
use boxkit::validate::Validator;

/// A trace id that passes header validation.
pub const TRACE: &str = "19619c9e08f0ed4cc147e211efa8c3f0";

/// Raw request as seen by a mock backend.
#[derive(Debug, Clone, Default)]
pub struct SeenRequest {
    pub head: String,
    pub body: String,
}

impl SeenRequest {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }
}

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` sees each request and returns the status and body to send back.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(SeenRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let seen = read_request(&mut socket).await;
                        let (status, body) = f(seen).await;
                        let status_text = match status {
                            200 => "200 OK",
                            201 => "201 Created",
                            202 => "202 Accepted",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut TcpStream) -> SeenRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return SeenRequest::default(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut seen = SeenRequest {
        head,
        body: String::new(),
    };
    let length: usize = seen
        .header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
        }
    }
    seen.body = String::from_utf8_lossy(&body).into_owned();
    seen
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Logger writing into a memory sink.
pub fn memory_logger() -> (Arc<MemorySink>, Arc<Logger>) {
    let sink = Arc::new(MemorySink::new());
    let option = LoggerOption {
        application: "pets".into(),
        env: "test".into(),
        label: "http".into(),
        ..Default::default()
    };
    let logger = Arc::new(Logger::with_sink(sink.clone(), &option));
    (sink, logger)
}

/// Instrumentation recording into a memory sink.
pub fn memory_instrumentation() -> (Arc<MemorySink>, Instrumentation) {
    let (sink, logger) = memory_logger();
    let instrumentation = Instrumentation::new(logger, Arc::new(CodeRegistry::default()), Validator::default());
    (sink, instrumentation)
}

/// Poll until `sink` holds `n` records or a second passes.
pub async fn wait_for_records(sink: &MemorySink, n: usize) {
    for _ in 0..100 {
        if sink.len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
