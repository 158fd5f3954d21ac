//! reglex-analysis - Document compliance analysis service
//!
//! Accepts documents over HTTP, drives each through the remote analysis
//! service (or the offline fallback) and streams session progress over SSE.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reglex_analysis::config::{resolve_service_url, AnalysisSettings};
use reglex_analysis::registry::spawn_session_sweeper;
use reglex_analysis::{AnalysisRegistry, AppState};

/// Command-line arguments for reglex-analysis
#[derive(Parser, Debug)]
#[command(name = "reglex-analysis")]
#[command(about = "Document compliance analysis service")]
#[command(version)]
struct Args {
    /// Configuration file (default: platform config dir)
    #[arg(short, long, env = "REGLEX_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "REGLEX_PORT")]
    port: Option<u16>,

    /// Remote analysis service base URL (overrides REGLEX_SERVICE_URL and the config file)
    #[arg(long)]
    service_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => reglex_common::config::default_config_path()?,
    };
    let toml_config = reglex_common::config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "reglex_analysis={level},reglex_common={level},tower_http=info",
                    level = toml_config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting reglex-analysis (Document Analysis) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Config: {}", config_path.display());

    let service_url = resolve_service_url(args.service_url.as_deref(), &toml_config)?;
    let settings = AnalysisSettings::from_config(&toml_config, &service_url)?;
    let (services, monitor) = settings.build_services()?;

    let registry = AnalysisRegistry::new(services);
    let shutdown = CancellationToken::new();
    let sweeper = spawn_session_sweeper(
        registry.clone(),
        settings.sweep_interval,
        settings.session_ttl,
        shutdown.clone(),
    );

    let app = reglex_analysis::build_router(AppState::new(registry, monitor));

    let host: std::net::IpAddr = toml_config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server host '{}'", toml_config.server.host))?;
    let addr = SocketAddr::new(host, args.port.unwrap_or(toml_config.server.port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Remote analysis service: {}", settings.service_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        warn!("Session sweeper ended abnormally: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
