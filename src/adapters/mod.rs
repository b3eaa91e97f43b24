pub mod file_system;
pub mod http_client;
pub mod http_handler;

/// Re-export commonly used types from adapters
pub use file_system::FileSystemAdapter;
pub use http_client::{DEFAULT_UPSTREAM_TIMEOUT, HttpClientAdapter};
pub use http_handler::{GatewayHandler, relay_response, router};
