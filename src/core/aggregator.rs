//! Fan-out / fan-in of one inbound payload and the response selection policy.
//!
//! Every destination of a route gets exactly one concurrent forward attempt, each with its
//! own full timeout. Aggregation waits for all of them: the policy needs every outcome, so
//! a fast answer never cancels a slow sibling.
//!
//! Selection is deterministic:
//! 1. no upstream answered: nothing to relay
//! 2. any upstream answered 200: the 200 group
//! 3. otherwise: the lowest numeric status code observed
//!
//! and within the chosen group the destination that sorts first by name.
use std::collections::BTreeMap;

use bytes::Bytes;
use futures_util::future::join_all;
use hyper::{HeaderMap, StatusCode};

use crate::{
    core::forwarder::{ForwardOutcome, UpstreamForwarder},
    ports::http_client::UpstreamResponse,
};

/// Successful outcomes of one fan-out, grouped by status code then destination.
#[derive(Debug, Default)]
pub struct AggregationResult {
    by_status_code: BTreeMap<u16, BTreeMap<String, UpstreamResponse>>,
    failed: Vec<String>,
}

impl AggregationResult {
    /// Group outcomes. Failed outcomes are only remembered by destination.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = ForwardOutcome>) -> Self {
        let mut result = Self::default();
        for outcome in outcomes {
            match outcome.result {
                Ok(response) => {
                    result
                        .by_status_code
                        .entry(response.status.as_u16())
                        .or_default()
                        .insert(outcome.destination, response);
                }
                Err(_) => result.failed.push(outcome.destination),
            }
        }
        result
    }

    pub fn by_status_code(&self) -> &BTreeMap<u16, BTreeMap<String, UpstreamResponse>> {
        &self.by_status_code
    }

    /// Destinations that failed at the transport level, in configured order.
    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    /// Number of destinations that produced an HTTP response.
    pub fn responded(&self) -> usize {
        self.by_status_code.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_status_code.is_empty()
    }

    /// Status codes observed, lowest first.
    pub fn status_codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.by_status_code.keys().copied()
    }

    /// Apply the selection policy, returning the destination whose response is relayed.
    pub fn select(&self) -> Option<(&str, &UpstreamResponse)> {
        let group = self
            .by_status_code
            .get(&StatusCode::OK.as_u16())
            .or_else(|| self.by_status_code.values().next())?;

        group
            .iter()
            .next()
            .map(|(destination, response)| (destination.as_str(), response))
    }
}

/// Fans one payload out to every destination of a route.
#[derive(Clone)]
pub struct ResponseAggregator {
    forwarder: UpstreamForwarder,
}

impl ResponseAggregator {
    pub fn new(forwarder: UpstreamForwarder) -> Self {
        Self { forwarder }
    }

    /// Forward to all `destinations` concurrently and group the answers.
    pub async fn aggregate(
        &self,
        path: &str,
        destinations: &[String],
        headers: &HeaderMap,
        body: Bytes,
    ) -> AggregationResult {
        let forwards = destinations.iter().map(|destination| {
            self.forwarder
                .forward(destination, path, headers, body.clone())
        });

        let result = AggregationResult::from_outcomes(join_all(forwards).await);

        tracing::debug!(
            "Results for {}: {} responded (status codes {:?}), {} failed {:?}",
            path,
            result.responded(),
            result.status_codes().collect::<Vec<_>>(),
            result.failed().len(),
            result.failed()
        );

        result
    }
}
