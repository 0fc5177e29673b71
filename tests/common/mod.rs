//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use retina_gateway::config::GatewayConfig;
use retina_gateway::resilience::RetryPolicy;

/// What the mock saw of one request.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

/// Start a programmable mock upstream on an ephemeral port and return its base URL.
///
/// The handler decides status and body; it may sleep to simulate slow responses.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> String
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
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
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let response = format!(
                            "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    format!("http://{}", addr)
}

/// Hit counters for a mock inference service.
#[derive(Debug, Default)]
pub struct Hits {
    pub info: AtomicU32,
    pub predict: AtomicU32,
}

impl Hits {
    pub fn info(&self) -> u32 {
        self.info.load(Ordering::SeqCst)
    }

    pub fn predict(&self) -> u32 {
        self.predict.load(Ordering::SeqCst)
    }
}

/// Mock inference service: `GET /` answers `info`, `POST /predict` answers
/// whatever `predict` returns for the 0-based call number.
pub async fn start_inference_service<P>(info: (u16, &'static str), predict: P) -> (String, Arc<Hits>)
where
    P: Fn(u32) -> (u16, String) + Send + Sync + 'static,
{
    let hits = Arc::new(Hits::default());
    let counters = hits.clone();
    let predict = Arc::new(predict);

    let url = start_programmable_upstream(move |req| {
        let counters = counters.clone();
        let predict = predict.clone();
        async move {
            if req.path.starts_with("/predict") {
                let n = counters.predict.fetch_add(1, Ordering::SeqCst);
                predict(n)
            } else {
                counters.info.fetch_add(1, Ordering::SeqCst);
                (info.0, info.1.to_string())
            }
        }
    })
    .await;

    (url, hits)
}

/// A URL nothing listens on (connection refused).
pub fn dead_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        base_delay_ms: 10,
        cold_start_delay_ms: 50,
        request_timeout_ms: 2_000,
    }
}

/// Config with short delays suitable for tests.
pub fn test_config(endpoints: Vec<String>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.endpoints = endpoints;
    config.upstream.connect_timeout_ms = 1_000;
    config.health_check.retry = fast_policy();
    config.prediction.retry = fast_policy();
    config.simulator.seed = Some(7);
    config
}

pub const INFO_OK: (u16, &str) = (200, r#"{"status":"online","model_name":"retina-v2","classes":5}"#);

pub fn jpeg() -> retina_gateway::ImagePayload {
    retina_gateway::ImagePayload::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3], "image/jpeg")
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let mut content_length = 0usize;
    let mut chunked = false;
    for line in lines {
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        } else if lower.starts_with("transfer-encoding:") && lower.contains("chunked") {
            chunked = true;
        }
    }

    let mut body = buf[header_end..].to_vec();
    loop {
        let complete = if chunked {
            body.ends_with(b"0\r\n\r\n")
        } else {
            body.len() >= content_length
        };
        if complete {
            break;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(MockRequest { method, path, body })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
