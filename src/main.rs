//! Fallback redirect service.
//!
//! Converts origin 404 responses into 302 redirects to the location configured
//! in the triggering distribution's `FallbackLocation` tag.
//!
//! # Architecture Overview
//!
//! ```text
//!   edge event ──▶ event ──▶ redirect::pipeline ──(404?)──▶ redirect::cache ──▶ metadata
//!                                   │                            │              resolver
//!                                   │◀──── template ◀────────────┘
//!                                   ▼
//!                      response (302 Found or untouched)
//!
//!   Cross-cutting: config · observability · lifecycle · admin
//! ```

use clap::{Parser, Subcommand};
use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use fallback_redirect::config::{load_or_default, ServiceConfig};
use fallback_redirect::event::{handle_event, EdgeEvent, InvocationContext};
use fallback_redirect::http::HttpServer;
use fallback_redirect::lifecycle::{build_pipeline, spawn_signal_listener, Shutdown};
use fallback_redirect::observability::logging;

#[derive(Parser)]
#[command(name = "fallback-redirect")]
#[command(about = "Turns origin 404s into redirects to a per-distribution fallback location", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "FALLBACK_REDIRECT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the invocation endpoint over HTTP
    Serve,
    /// Handle a single event and print the resulting response
    Invoke {
        /// Event JSON file, or `-` for stdin.
        #[arg(short, long, default_value = "-")]
        event: String,

        /// ARN of the invoked function; defaults to `invocation.function_arn`.
        #[arg(long)]
        function_arn: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "fallback-redirect starting");

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Invoke { event, function_arn } => invoke(config, &event, function_arn).await,
    }
}

async fn serve(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.server.bind_address,
        deadline_ms = config.redirect.timeout_ms,
        metadata_source = ?config.metadata.source,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        fallback_redirect::observability::metrics::init_metrics(addr);
    }

    let pipeline = build_pipeline(&config)?;
    let listener = TcpListener::bind(&config.server.bind_address).await?;

    let shutdown = Shutdown::new();
    spawn_signal_listener(&shutdown);

    let server = HttpServer::new(config, pipeline);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn invoke(
    config: ServiceConfig,
    event_path: &str,
    function_arn: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = if event_path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(event_path)?
    };
    let event: EdgeEvent = serde_json::from_str(&raw)?;

    let function_arn = function_arn
        .or_else(|| config.invocation.function_arn.clone())
        .ok_or("no --function-arn given and no invocation.function_arn configured")?;
    let context = InvocationContext::new(function_arn);

    let pipeline = build_pipeline(&config)?;
    let response = handle_event(&pipeline, event, &context).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
