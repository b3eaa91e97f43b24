//! Shared utilities for the gateway integration tests.
#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use bytes::Bytes;
use fanout_gateway::{
    FileSystemAdapter, GatewayHandler, HttpClientAdapter, config::GatewayConfig, router,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

/// A scripted upstream listening on an ephemeral port.
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<(String, HeaderMap, Bytes)>>>,
}

impl MockUpstream {
    /// `host:port` as used in a route's destination list.
    pub fn destination(&self) -> String {
        self.addr.to_string()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Requests seen so far as (request target, headers, body).
    pub fn received(&self) -> Vec<(String, HeaderMap, Bytes)> {
        self.received.lock().unwrap().clone()
    }
}

/// Start an upstream that answers every request with `status` and `body` after `delay`.
/// Responses carry a `server` header and an `x-upstream` header naming the upstream.
pub async fn start_upstream(
    name: &'static str,
    status: u16,
    body: &'static str,
    delay: Duration,
) -> MockUpstream {
    let hits = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(Mutex::new(Vec::new()));

    let app = {
        let hits = hits.clone();
        let received = received.clone();
        Router::new().fallback(
            move |uri: axum::http::Uri, headers: HeaderMap, payload: Bytes| {
                let hits = hits.clone();
                let received = received.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    received
                        .lock()
                        .unwrap()
                        .push((uri.to_string(), headers, payload));
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }

                    let mut response =
                        (StatusCode::from_u16(status).unwrap(), body).into_response();
                    let headers = response.headers_mut();
                    headers.insert("server", HeaderValue::from_static("mock-upstream/1.0"));
                    headers.insert("x-upstream", HeaderValue::from_static(name));
                    response
                }
            },
        )
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream {
        addr,
        hits,
        received,
    }
}

/// Start the gateway with real adapters on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig, upstream_timeout: Duration) -> SocketAddr {
    let store = Arc::new(FileSystemAdapter::new(config.output_dir.clone()));
    let client = Arc::new(HttpClientAdapter::with_timeout(upstream_timeout));
    let handler = Arc::new(GatewayHandler::from_config(&config, client, store));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(handler)).await.unwrap();
    });
    addr
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Send a hand written HTTP/1.1 request and return the raw response text.
/// The request should carry `Connection: close` so the read terminates.
pub async fn raw_request(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// Status code from the first line of a raw HTTP response.
pub fn status_of(raw_response: &str) -> u16 {
    raw_response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0)
}
