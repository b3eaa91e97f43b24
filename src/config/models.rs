//! Configuration data structures for the gateway.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files. Every field has a
//! default so an empty file, or no file at all, yields the compiled-in routing table.
use std::{
    collections::BTreeMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

/// Default TCP port the gateway listens on.
pub const DEFAULT_PORT: u16 = 8080;

/// Default upper bound on an inbound request body (16 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const UPGRADE_SERVERS: &[&str] = &["151.22.100.235"];

const PORTAL_SERVERS: &[&str] = &[
    "63.236.63.180",  // ABB AuroraVision
    "220.128.69.225", // BenQ Solar
];

/// The routing table shipped with the binary, used when no configuration overrides `routes`.
pub fn builtin_routes() -> BTreeMap<String, Vec<String>> {
    let to_vec = |servers: &[&str]| servers.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    BTreeMap::from([
        ("/dl_update_cdd.php".to_string(), to_vec(UPGRADE_SERVERS)),
        ("/dl_update_file_cdd.php".to_string(), to_vec(UPGRADE_SERVERS)),
        ("/dl_parameters_file.php".to_string(), to_vec(PORTAL_SERVERS)),
    ])
}

/// Top level gateway configuration.
///
/// Shared read-only (behind an `Arc`) by every request task once the process has started.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// IP address to bind to. `None` listens on all interfaces.
    pub bind_ip: Option<String>,
    /// TCP port to listen on.
    pub port: u16,
    /// Root directory for audit artifacts. `None` disables persistence entirely.
    pub output_dir: Option<PathBuf>,
    /// Emit debug level log events.
    pub debug: bool,
    /// Emit logs as JSON instead of human readable lines.
    pub json_logs: bool,
    /// Largest inbound body accepted, in bytes.
    pub max_body_bytes: usize,
    /// Exact inbound path -> ordered upstream destinations (`host[:port]`).
    pub routes: BTreeMap<String, Vec<String>>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_ip: None,
            port: DEFAULT_PORT,
            output_dir: None,
            debug: false,
            json_logs: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            routes: builtin_routes(),
        }
    }
}

impl GatewayConfig {
    /// Create a new configuration builder
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// Socket address the listener binds to.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip = match &self.bind_ip {
            Some(ip) => ip
                .parse::<IpAddr>()
                .wrap_err_with(|| format!("Invalid bind address: {ip}"))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Builder for `GatewayConfig`. Starts from an empty routing table rather than the
/// compiled-in one so embedders and tests state exactly the routes they need.
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl Default for GatewayConfigBuilder {
    fn default() -> Self {
        Self {
            config: GatewayConfig {
                routes: BTreeMap::new(),
                ..GatewayConfig::default()
            },
        }
    }
}

impl GatewayConfigBuilder {
    /// Set the bind IP
    pub fn bind_ip(mut self, ip: impl Into<String>) -> Self {
        self.config.bind_ip = Some(ip.into());
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the audit output root
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.config.max_body_bytes = limit;
        self
    }

    /// Add a route mapping `path` to the given ordered destinations
    pub fn route<I, S>(mut self, path: impl Into<String>, destinations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.routes.insert(
            path.into(),
            destinations.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn build(self) -> GatewayConfig {
        self.config
    }
}
