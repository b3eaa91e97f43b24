use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use hyper::{HeaderMap, StatusCode};
use thiserror::Error;

/// Custom error type for HTTP client operations.
///
/// Every variant is a transport level failure: the upstream never produced a usable
/// response. A response with an error status is not an error here.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpClientError {
    /// Error when connection to the upstream fails
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error when the round-trip exceeds the per-call time limit
    #[error("Timeout error after {0:?}")]
    Timeout(Duration),

    /// Error when the outgoing request cannot be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Error when the upstream response (or its body) cannot be read
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Result type alias for HTTP client operations
pub type HttpClientResult<T> = Result<T, HttpClientError>;

/// A fully buffered upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// HttpClient defines the port (interface) for sending a payload to one upstream
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// POST `body` to `http://{destination}{path_and_query}`.
    ///
    /// # Arguments
    /// * `destination` - Upstream `host[:port]`
    /// * `path_and_query` - Request target, starting with `/`
    /// * `headers` - Headers to send verbatim (framing headers are recomputed)
    /// * `body` - Raw payload
    ///
    /// # Returns
    /// The buffered upstream response, whatever its status, or a transport error
    async fn post(
        &self,
        destination: &str,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> HttpClientResult<UpstreamResponse>;
}
