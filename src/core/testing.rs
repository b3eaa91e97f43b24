//! In-memory fakes of the ports, shared by the unit tests of `core` and `adapters`.
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use hyper::{
    HeaderMap, StatusCode,
    header::{HeaderName, HeaderValue},
};

use crate::{
    adapters::http_client::DEFAULT_UPSTREAM_TIMEOUT,
    ports::{
        file_system::{FileSystemResult, PayloadStore, WriteOutcome},
        http_client::{HttpClient, HttpClientError, HttpClientResult, UpstreamResponse},
    },
};

/// Scripted behaviour of one fake destination.
#[derive(Debug, Clone)]
pub enum FakeUpstream {
    Respond {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        delay: Duration,
    },
    Timeout,
    Refused,
}

impl FakeUpstream {
    pub fn respond(status: u16, body: &'static str) -> Self {
        FakeUpstream::Respond {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
            delay: Duration::ZERO,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        if let FakeUpstream::Respond { headers, .. } = &mut self {
            headers.append(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        self
    }

    pub fn with_delay(mut self, after: Duration) -> Self {
        if let FakeUpstream::Respond { delay, .. } = &mut self {
            *delay = after;
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub destination: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Fake `HttpClient` answering from a script and recording every call.
/// Unknown destinations behave as refused connections.
#[derive(Default)]
pub struct StubClient {
    upstreams: HashMap<String, FakeUpstream>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubClient {
    pub fn new<I, S>(upstreams: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (S, FakeUpstream)>,
        S: Into<String>,
    {
        Arc::new(Self {
            upstreams: upstreams
                .into_iter()
                .map(|(destination, upstream)| (destination.into(), upstream))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, destination: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.destination == destination)
            .count()
    }

    pub fn bodies_sent_to(&self, destination: &str) -> Vec<Bytes> {
        self.calls()
            .into_iter()
            .filter(|call| call.destination == destination)
            .map(|call| call.body)
            .collect()
    }
}

#[async_trait]
impl HttpClient for StubClient {
    async fn post(
        &self,
        destination: &str,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> HttpClientResult<UpstreamResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            destination: destination.to_string(),
            path: path_and_query.to_string(),
            headers: headers.clone(),
            body,
        });

        match self.upstreams.get(destination).cloned() {
            Some(FakeUpstream::Respond {
                status,
                headers,
                body,
                delay,
            }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(UpstreamResponse {
                    status,
                    headers,
                    body,
                })
            }
            Some(FakeUpstream::Timeout) => Err(HttpClientError::Timeout(DEFAULT_UPSTREAM_TIMEOUT)),
            Some(FakeUpstream::Refused) | None => Err(HttpClientError::ConnectionError(format!(
                "connection refused by {destination}"
            ))),
        }
    }
}

/// Fake `PayloadStore` keeping artifacts in memory, keyed by their logical key.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.files.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl PayloadStore for MemoryStore {
    async fn write(&self, key: &str, data: &[u8]) -> FileSystemResult<WriteOutcome> {
        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::copy_from_slice(data));
        Ok(WriteOutcome::Written(key.into()))
    }
}
