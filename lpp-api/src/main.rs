//! lpp-api - Laptop price inference service
//!
//! Loads the artifact bundle written by `lpp-train` and serves predictions
//! over HTTP. The service refuses to start without a complete bundle.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lpp_api::{build_router, AppState};
use lpp_common::{load_config, ArtifactBundle};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for lpp-api
#[derive(Parser, Debug)]
#[command(name = "lpp-api")]
#[command(about = "Laptop price prediction service")]
#[command(version)]
struct Args {
    /// Config file (default: LPP_CONFIG, ./lpp.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Artifacts directory holding the trained model and encodings
    #[arg(short, long, env = "LPP_ARTIFACTS_DIR")]
    artifacts: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "LPP_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "LPP_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| loaded.config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before anything that can fail
    info!(
        "Starting lpp-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    loaded.log_source();
    let config = loaded.config;

    let artifacts_dir = args.artifacts.unwrap_or(config.artifacts_dir);
    let bundle = ArtifactBundle::load(&artifacts_dir)
        .with_context(|| {
            format!("Failed to load model artifacts from {}", artifacts_dir.display())
        })?;
    info!(
        "Loaded model {} (run {}, trained {})",
        bundle.model_version(),
        bundle.run_id(),
        bundle.trained_at()
    );
    for (field, encoding) in bundle.encodings().iter() {
        info!("Encoder {}: {} categories", field, encoding.len());
    }

    let state = AppState::new(bundle, config.defaults, artifacts_dir);
    let app = build_router(state);

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", host, port))?;
    let addr: SocketAddr = listener.local_addr().context("Listener has no local address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install terminate handler: {}", e);
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
