//! fanout-gateway - an HTTP replication gateway.
//!
//! Every inbound `POST` on a configured path is copied, body and headers untouched, to each
//! upstream destination of that path. All answers are collected and exactly one of them is
//! relayed back to the caller. Inbound payloads and every upstream answer can optionally be
//! written to disk as audit artifacts.
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use fanout_gateway::{FileSystemAdapter, GatewayHandler, HttpClientAdapter, config::GatewayConfig};
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let config = GatewayConfig::builder()
//!     .route("/dl_update_cdd.php", ["10.0.0.1:8080", "10.0.0.2:8080"])
//!     .output_dir("/var/lib/fanout")
//!     .build();
//!
//! let store = Arc::new(FileSystemAdapter::new(config.output_dir.clone()));
//! let handler = GatewayHandler::from_config(&config, Arc::new(HttpClientAdapter::new()), store);
//!
//! let listener = tokio::net::TcpListener::bind(config.listen_addr()?).await?;
//! axum::serve(listener, fanout_gateway::router(Arc::new(handler))).await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations) while keeping
//! the routing, fan-out and selection logic inside `core`:
//! * [`core::PathRouter`] - exact path to ordered destinations
//! * [`core::UpstreamForwarder`] - one attempt against one destination
//! * [`core::ResponseAggregator`] - concurrent fan-out and the selection policy
//! * [`adapters::GatewayHandler`] - request validation and the reply to the caller
//! * [`adapters::FileSystemAdapter`] - audit artifacts confined to the output root
//!
//! # Selection policy
//! A 200 from any destination wins. Without one, the lowest status code observed wins.
//! Ties inside a status code go to the destination that sorts first by name. If no
//! destination answered at all the caller gets a bare 500.
//!
//! # Error Handling
//! Ports expose `thiserror` enums; startup code returns `eyre::Result<T>` with context
//! attached through `WrapErr`. No per-request failure is fatal to the process.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{FileSystemAdapter, GatewayHandler, HttpClientAdapter, router},
    core::{PathRouter, ResponseAggregator, UpstreamForwarder},
    ports::{file_system::PayloadStore, http_client::HttpClient},
    utils::GracefulShutdown,
};
