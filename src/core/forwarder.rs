//! One forward attempt to one upstream, with the audit copy of its answer.
use std::sync::Arc;

use bytes::Bytes;
use hyper::{HeaderMap, StatusCode};

use crate::ports::{
    file_system::PayloadStore,
    http_client::{HttpClient, HttpClientResult, UpstreamResponse},
};

/// Result of one forward attempt to one destination.
#[derive(Debug)]
pub struct ForwardOutcome {
    pub destination: String,
    /// `Ok` whenever the upstream answered, regardless of status.
    pub result: HttpClientResult<UpstreamResponse>,
}

impl ForwardOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.result.as_ref().ok().map(|response| response.status)
    }

    pub fn error_message(&self) -> Option<String> {
        self.result.as_ref().err().map(ToString::to_string)
    }
}

/// Audit key for an upstream response: `/<destination>_<path with '/' as '_'>--<status>`.
pub fn response_audit_key(destination: &str, path: &str, status: StatusCode) -> String {
    format!(
        "/{destination}_{}--{}",
        path.replace('/', "_"),
        status.as_u16()
    )
}

/// Sends one payload to one upstream and records the raw answer.
#[derive(Clone)]
pub struct UpstreamForwarder {
    client: Arc<dyn HttpClient>,
    store: Arc<dyn PayloadStore>,
}

impl UpstreamForwarder {
    pub fn new(client: Arc<dyn HttpClient>, store: Arc<dyn PayloadStore>) -> Self {
        Self { client, store }
    }

    /// Forward `body` and `headers` to `destination`. Never fails: transport problems are
    /// folded into the returned outcome.
    pub async fn forward(
        &self,
        destination: &str,
        path: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> ForwardOutcome {
        tracing::debug!("Sending to {}", destination);

        let result = self.client.post(destination, path, headers, body).await;

        match &result {
            Ok(response) => {
                self.store
                    .persist(
                        &response_audit_key(destination, path, response.status),
                        &response.body,
                    )
                    .await;

                if response.status.is_success() {
                    tracing::info!("Forwarded {} to {} successfully", path, destination);
                } else {
                    tracing::error!(
                        "Upstream {} answered {} when forwarding {}",
                        destination,
                        response.status,
                        path
                    );
                }
            }
            Err(e) => {
                tracing::error!("Error forwarding {} to {}: {}", path, destination, e);
            }
        }

        ForwardOutcome {
            destination: destination.to_string(),
            result,
        }
    }
}
