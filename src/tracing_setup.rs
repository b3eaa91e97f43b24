use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for the given debug toggle.
pub fn default_level(debug_enabled: bool) -> &'static str {
    if debug_enabled { "debug" } else { "info" }
}

/// Build the event filter. `RUST_LOG` wins over the debug toggle when it is set.
pub fn build_env_filter(debug_enabled: bool) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => {
            let level = default_level(debug_enabled);
            EnvFilter::try_new(level).wrap_err_with(|| format!("Invalid log level: {level}"))
        }
    }
}

/// Initialize logging for the gateway.
///
/// Console output is timestamped and leveled; `json_format` switches to one JSON object per
/// event for log shippers.
pub fn init_tracing(debug_enabled: bool, json_format: bool) -> Result<()> {
    let env_filter = build_env_filter(debug_enabled)?;

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    if json_format {
        Registry::default()
            .with(env_filter)
            .with(
                fmt_layer
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
            .wrap_err("Failed to install JSON tracing subscriber")?;
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.with_ansi(true))
            .try_init()
            .wrap_err("Failed to install console tracing subscriber")?;
    }

    tracing::debug!(
        "Logging initialized (debug: {}, json: {})",
        debug_enabled,
        json_format
    );
    Ok(())
}

/// Create a request-scoped tracing span
pub fn create_request_span(method: &str, path: &str, request_id: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        http.method = method,
        http.path = path,
        request.id = request_id,
        http.status_code = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

/// Create an upstream request span
pub fn create_backend_span(destination: &str, method: &str, path: &str) -> tracing::Span {
    tracing::info_span!(
        "backend_request",
        backend.destination = destination,
        http.method = method,
        http.path = path,
        http.status_code = tracing::field::Empty,
    )
}
