use std::{error::Error as StdError, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{
    HeaderMap, Method, Request, Uri, Version,
    header::{self, HeaderValue},
};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tokio::time::timeout;
use tracing::Instrument;

use crate::{
    ports::http_client::{HttpClient, HttpClientError, HttpClientResult, UpstreamResponse},
    tracing_setup::create_backend_span,
};

/// Time limit for one upstream round-trip: connect, response head and full body.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(55);

/// HTTP client adapter using the hyper-util pooled client over plain HTTP/1.1.
///
/// Responsibilities:
/// * Rebuilds the request target as `http://{destination}{path}`
/// * Copies caller headers verbatim, recomputing `Content-Length`
/// * Buffers the whole upstream response under a single timeout
///
/// There are no retries; each call is exactly one attempt.
pub struct HttpClientAdapter {
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter with the default upstream timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_UPSTREAM_TIMEOUT)
    }

    /// Create a client whose round-trips are bounded by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let mut http_connector = HttpConnector::new();
        http_connector.set_connect_timeout(Some(timeout));
        http_connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(http_connector);

        tracing::debug!("Created upstream HTTP client with {:?} timeout", timeout);
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build_request(
        destination: &str,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> HttpClientResult<Request<Full<Bytes>>> {
        let uri: Uri = format!("http://{destination}{path_and_query}")
            .parse()
            .map_err(|e| {
                HttpClientError::InvalidRequest(format!(
                    "Cannot build upstream URI for '{destination}{path_and_query}': {e}"
                ))
            })?;

        if uri.host().is_none() {
            return Err(HttpClientError::InvalidRequest(format!(
                "Upstream URI has no host: {uri}"
            )));
        }

        let content_length = HeaderValue::from(body.len());
        let mut req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .version(Version::HTTP_11)
            .body(Full::new(body))
            .map_err(|e| HttpClientError::InvalidRequest(e.to_string()))?;

        let outgoing = req.headers_mut();
        for (name, value) in headers {
            // The body is sent whole, so framing headers are ours to set.
            if name == header::CONTENT_LENGTH || name == header::TRANSFER_ENCODING {
                continue;
            }
            outgoing.append(name.clone(), value.clone());
        }
        outgoing.insert(header::CONTENT_LENGTH, content_length);

        Ok(req)
    }

    async fn round_trip(&self, req: Request<Full<Bytes>>) -> HttpClientResult<UpstreamResponse> {
        let uri = req.uri().clone();

        let response = self.client.request(req).await.map_err(|e| {
            let detail = error_chain(&e);
            if e.is_connect() {
                HttpClientError::ConnectionError(format!("Request to POST {uri} failed: {detail}"))
            } else {
                HttpClientError::MalformedResponse(format!(
                    "Request to POST {uri} failed: {detail}"
                ))
            }
        })?;

        let (mut parts, body) = response.into_parts();

        // The body is buffered below, so the upstream's chunking no longer applies.
        parts.headers.remove(header::TRANSFER_ENCODING);

        let body = body
            .collect()
            .await
            .map_err(|e| {
                HttpClientError::MalformedResponse(format!(
                    "Failed reading response body from {uri}: {}",
                    error_chain(&e)
                ))
            })?
            .to_bytes();

        Ok(UpstreamResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

impl Default for HttpClientAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn post(
        &self,
        destination: &str,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> HttpClientResult<UpstreamResponse> {
        let span = create_backend_span(destination, "POST", path_and_query);

        async {
            let req = Self::build_request(destination, path_and_query, headers, body)?;

            tracing::debug!("Sending request: POST {}", req.uri());
            tracing::trace!("Outgoing request headers: {:?}", req.headers());

            let result = match timeout(self.timeout, self.round_trip(req)).await {
                Ok(result) => result,
                Err(_) => Err(HttpClientError::Timeout(self.timeout)),
            };

            if let Ok(response) = &result {
                tracing::Span::current().record("http.status_code", response.status.as_u16());
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Render an error and all of its sources on one line.
fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
