use std::{sync::Arc, time::Instant};

use axum::{
    Router,
    body::Body as AxumBody,
    http::{Method, StatusCode, header},
};
use hyper::{Request, Response};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    config::GatewayConfig,
    core::{AggregationResult, PathRouter, ResponseAggregator, UpstreamForwarder},
    ports::{file_system::PayloadStore, http_client::HttpClient},
    tracing_setup::create_request_span,
};

/// Entry point for every inbound request.
///
/// Holds only read-only state, so a single instance is shared by all connection tasks.
pub struct GatewayHandler {
    router: Arc<PathRouter>,
    aggregator: ResponseAggregator,
    store: Arc<dyn PayloadStore>,
    max_body_bytes: usize,
}

impl GatewayHandler {
    pub fn new(
        router: Arc<PathRouter>,
        aggregator: ResponseAggregator,
        store: Arc<dyn PayloadStore>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            router,
            aggregator,
            store,
            max_body_bytes,
        }
    }

    /// Wire the core together from configuration and the two I/O adapters.
    pub fn from_config(
        config: &GatewayConfig,
        http_client: Arc<dyn HttpClient>,
        store: Arc<dyn PayloadStore>,
    ) -> Self {
        let forwarder = UpstreamForwarder::new(http_client, store.clone());
        Self::new(
            Arc::new(PathRouter::from_config(config)),
            ResponseAggregator::new(forwarder),
            store,
            config.max_body_bytes,
        )
    }

    pub fn path_router(&self) -> &PathRouter {
        &self.router
    }

    /// Handle one inbound request. Every failure is answered with a status code; nothing
    /// here can take the server down.
    pub async fn handle_request(&self, req: Request<AxumBody>) -> Response<AxumBody> {
        let request_id = Uuid::new_v4().to_string();
        let span = create_request_span(req.method().as_str(), req.uri().path(), &request_id);
        let started = Instant::now();

        async move {
            let response = self.dispatch(req).await;

            let current = tracing::Span::current();
            current.record("http.status_code", response.status().as_u16());
            current.record("duration_ms", started.elapsed().as_millis() as u64);

            response
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, req: Request<AxumBody>) -> Response<AxumBody> {
        let path = req.uri().path().to_string();

        if req.method() != Method::POST {
            tracing::error!(
                "Received a {} request at path {} - unsupported",
                req.method(),
                path
            );
            return empty_response(StatusCode::NOT_IMPLEMENTED);
        }

        let Some(declared) = req.headers().get(header::CONTENT_LENGTH) else {
            tracing::error!(
                "content-length header not found in POST, aborting. (path: {})",
                path
            );
            return empty_response(StatusCode::PRECONDITION_REQUIRED);
        };

        let Some(length) = declared
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
        else {
            tracing::error!("Unparsable content-length {:?} (path: {})", declared, path);
            return empty_response(StatusCode::BAD_REQUEST);
        };

        if length > self.max_body_bytes {
            tracing::error!(
                "POST to {} declares {} bytes, above the {} byte limit",
                path,
                length,
                self.max_body_bytes
            );
            return empty_response(StatusCode::PAYLOAD_TOO_LARGE);
        }

        let (parts, body) = req.into_parts();
        let body = match axum::body::to_bytes(body, length).await {
            Ok(body) if body.len() == length => body,
            Ok(body) => {
                tracing::error!(
                    "POST to {} declared {} bytes but carried {}",
                    path,
                    length,
                    body.len()
                );
                return empty_response(StatusCode::BAD_REQUEST);
            }
            Err(e) => {
                tracing::error!("Failed reading POST body for {}: {}", path, e);
                return empty_response(StatusCode::BAD_REQUEST);
            }
        };

        tracing::debug!("POST received: {} ({} bytes)", path, length);

        self.store.persist(&path, &body).await;

        let Some(destinations) = self.router.resolve(&path) else {
            tracing::warn!(
                "Path '{}' received, but no configured action available",
                path
            );
            return empty_response(StatusCode::NOT_FOUND);
        };

        tracing::info!(
            "Path '{}' received, {} servers to forward to: {}",
            path,
            destinations.len(),
            destinations.join(", ")
        );

        // Routing looks at the path only; upstreams get the full target, query included.
        let target = parts
            .uri
            .path_and_query()
            .map_or(path.as_str(), |pq| pq.as_str());

        let result = self
            .aggregator
            .aggregate(target, destinations, &parts.headers, body)
            .await;

        relay_response(&result)
    }
}

/// Turn an aggregation into the response for the original caller.
///
/// Upstream `Server` and `Date` headers are dropped: the local HTTP stack supplies its own.
pub fn relay_response(result: &AggregationResult) -> Response<AxumBody> {
    let Some((destination, upstream)) = result.select() else {
        tracing::error!(
            "No upstream answered ({} failed), responding with a server error",
            result.failed().len()
        );
        return empty_response(StatusCode::INTERNAL_SERVER_ERROR);
    };

    tracing::debug!("Relaying {} from {}", upstream.status, destination);

    let mut response = Response::new(AxumBody::from(upstream.body.clone()));
    *response.status_mut() = upstream.status;

    let headers = response.headers_mut();
    for (name, value) in &upstream.headers {
        if name == header::SERVER || name == header::DATE {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    response
}

fn empty_response(status: StatusCode) -> Response<AxumBody> {
    let mut response = Response::new(AxumBody::empty());
    *response.status_mut() = status;
    response
}

/// Build the axum application: every request goes to `handler`.
///
/// Registered as the fallback so targets without a path (`CONNECT host:port`) reach
/// the handler too.
pub fn router(handler: Arc<GatewayHandler>) -> Router {
    Router::new().fallback(move |req: Request<AxumBody>| {
        let handler = handler.clone();
        async move { handler.handle_request(req).await }
    })
}
