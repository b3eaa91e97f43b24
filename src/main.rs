use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use fanout_gateway::{
    FileSystemAdapter, GatewayHandler, HttpClientAdapter, HttpClient, PayloadStore,
    config::{GatewayConfig, GatewayConfigValidator, builtin_routes, load_config},
    router, tracing_setup,
    utils::GracefulShutdown,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(flatten)]
    serve: ServeArgs,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Start the gateway (default)
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
struct ServeArgs {
    /// Configuration file; the compiled-in routes are used when omitted
    #[clap(short, long)]
    config: Option<String>,

    /// Output debugging messages
    #[clap(short, long)]
    debug: bool,

    /// Bind to a specific IP address (all interfaces by default)
    #[clap(short, long)]
    bind_ip: Option<String>,

    /// TCP port number to listen on
    #[clap(short, long)]
    port: Option<u16>,

    /// Directory to write inbound and upstream payloads to
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Emit logs as JSON
    #[clap(long)]
    json_logs: bool,
}

impl ServeArgs {
    /// Command line flags override file and environment settings.
    fn apply(&self, config: &mut GatewayConfig) {
        if self.debug {
            config.debug = true;
        }
        if self.json_logs {
            config.json_logs = true;
        }
        if let Some(ip) = &self.bind_ip {
            config.bind_ip = Some(ip.clone());
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(output) = &self.output {
            config.output_dir = Some(output.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Serve(serve_args)) => serve(serve_args).await,
        None => serve(args.serve).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())
        .await
        .wrap_err("Failed to load configuration")?;
    args.apply(&mut config);

    tracing_setup::init_tracing(config.debug, config.json_logs)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;

    GatewayConfigValidator::validate(&config).wrap_err("Invalid configuration")?;

    let addr = config.listen_addr()?;

    match &config.output_dir {
        Some(dir) => tracing::info!("Writing audit artifacts under {}", dir.display()),
        None => tracing::info!("No output directory configured, audit artifacts disabled"),
    }

    let store: Arc<dyn PayloadStore> = Arc::new(FileSystemAdapter::new(config.output_dir.clone()));
    let http_client: Arc<dyn HttpClient> = Arc::new(HttpClientAdapter::new());
    let handler = Arc::new(GatewayHandler::from_config(&config, http_client, store));

    for (path, destinations) in handler.path_router().routes() {
        tracing::info!("Configured route: {} -> {}", path, destinations.join(", "));
    }

    let graceful_shutdown = GracefulShutdown::new();
    let signal_handler_shutdown = graceful_shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal_handler_shutdown.run_signal_handler().await {
            tracing::error!("Signal handler error: {}", e);
        }
    });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!(
        "Gateway listening on {} ({} routes)",
        addr,
        handler.path_router().len()
    );

    axum::serve(listener, router(handler))
        .with_graceful_shutdown(async move {
            let reason = graceful_shutdown.wait_for_shutdown_signal().await;
            tracing::info!("Shutdown signal received: {:?}", reason);
        })
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown completed");
    Ok(())
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !std::path::Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(Some(config_path)).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    match GatewayConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!(
                "   • Listen Address: {}",
                config
                    .listen_addr()
                    .map_or_else(|e| e.to_string(), |a| a.to_string())
            );
            println!(
                "   • Output Directory: {}",
                config
                    .output_dir
                    .as_ref()
                    .map_or("disabled".to_string(), |d| d.display().to_string())
            );
            println!("   • Routes: {}", config.routes.len());
            for (path, destinations) in &config.routes {
                println!("     {path} -> {}", destinations.join(", "));
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Destinations are host[:port], without http:// or a path");
            println!("   • Route paths start with '/' and match exactly");
            println!("   • bind_ip is an IP address, not a host name");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = std::path::Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    tokio::fs::write(path, default_config_template())
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'fanout-gateway serve --config {config_path}' to start the gateway");
    Ok(())
}

fn default_config_template() -> String {
    let mut template = String::from(
        r#"# fanout-gateway configuration

# IP address to bind to; omit to listen on all interfaces
# bind_ip = "127.0.0.1"
port = 8080

# Directory for audit copies of inbound and upstream payloads; omit to disable
# output_dir = "/var/lib/fanout-gateway"

debug = false

# Every POST to a path below is sent to all of its destinations (host[:port]).
# A 200 from any destination is relayed; otherwise the lowest status code wins.
[routes]
"#,
    );

    for (path, destinations) in builtin_routes() {
        let list = destinations
            .iter()
            .map(|d| format!("\"{d}\""))
            .collect::<Vec<_>>()
            .join(", ");
        template.push_str(&format!("\"{path}\" = [{list}]\n"));
    }

    template
}
