use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::GatewayConfig;

/// Prefix for environment overrides, e.g. `FANOUT__PORT=9000`.
pub const ENV_PREFIX: &str = "FANOUT";

/// Load configuration from an optional file, then apply environment overrides.
/// Supports multiple formats: YAML, JSON, TOML, etc.
pub async fn load_config(config_path: Option<&str>) -> Result<GatewayConfig> {
    load_config_sync(config_path)
}

/// Load configuration synchronously
pub fn load_config_sync(config_path: Option<&str>) -> Result<GatewayConfig> {
    let mut builder = Config::builder();

    if let Some(config_path) = config_path {
        let path = Path::new(config_path);
        builder = builder.add_source(File::new(config_path, file_format(path)));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| match config_path {
            Some(p) => format!("Failed to build config from {p}"),
            None => "Failed to build config from environment".to_string(),
        })?;

    // Missing fields fall back to `GatewayConfig::default()`, so a file that sets
    // `routes` replaces the compiled-in table instead of merging with it.
    let gateway_config: GatewayConfig = settings
        .try_deserialize()
        .context("Failed to deserialize gateway configuration")?;

    Ok(gateway_config)
}

fn file_format(path: &Path) -> FileFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Toml,
    }
}
