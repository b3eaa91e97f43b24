pub mod aggregator;
pub mod forwarder;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::{AggregationResult, ResponseAggregator};
pub use forwarder::{ForwardOutcome, UpstreamForwarder, response_audit_key};
pub use router::PathRouter;
